//! Building blocks shared by client and supplier orders.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use comptoir_core::{ArticleId, ExpeditionId};

use super::expedition::NewExpedition;
use super::money;

/// Most lines a single order may carry.
pub const MAX_LINES: usize = 500;
/// Largest quantity a single line may carry.
pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

/// How an order names its expedition.
///
/// A bare integer refers to an existing expedition; an object with `name` and
/// `cost` creates a new one in the same transaction as the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpeditionRef {
    Existing(ExpeditionId),
    Inline(NewExpedition),
}

/// Validates an inline expedition; an ID is checked against the database later.
pub(crate) fn valid_expedition(expedition: &ExpeditionRef) -> Result<(), ValidationError> {
    match expedition {
        ExpeditionRef::Existing(_) => Ok(()),
        ExpeditionRef::Inline(new) => new.validate().map_err(|_| {
            let mut err = ValidationError::new("expedition");
            err.message = Some(Cow::from(
                "inline expedition needs a non-blank name and a valid cost",
            ));
            err
        }),
    }
}

/// A client order line as submitted. The unit price comes from the article.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClientLineInput {
    pub article_id: ArticleId,
    pub quantity: i32,
}

/// A supplier order line as submitted, with the negotiated unit cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SupplierLineInput {
    pub article_id: ArticleId,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// Anything that moves stock for one article.
pub trait StockLine {
    fn article_id(&self) -> ArticleId;
    fn quantity(&self) -> i32;
}

impl StockLine for ClientLineInput {
    fn article_id(&self) -> ArticleId {
        self.article_id
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

impl StockLine for SupplierLineInput {
    fn article_id(&self) -> ArticleId {
        self.article_id
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

fn line_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

/// Checks line count and per-line quantity bounds.
pub(crate) fn valid_lines<L: StockLine>(lines: &[L]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(line_error(
            "empty",
            "an order needs at least one line".to_owned(),
        ));
    }
    if lines.len() > MAX_LINES {
        return Err(line_error(
            "too_many",
            format!("an order may have at most {MAX_LINES} lines"),
        ));
    }
    for (index, line) in lines.iter().enumerate() {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity()) {
            return Err(line_error(
                "quantity",
                format!("line {index}: quantity must be between 1 and {MAX_LINE_QUANTITY}"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn valid_client_lines(lines: &[ClientLineInput]) -> Result<(), ValidationError> {
    valid_lines(lines)
}

pub(crate) fn valid_supplier_lines(lines: &[SupplierLineInput]) -> Result<(), ValidationError> {
    valid_lines(lines)?;
    for (index, line) in lines.iter().enumerate() {
        if let Err(err) = money(&line.unit_cost) {
            let reason = err.message.unwrap_or_default();
            return Err(line_error(
                "unit_cost",
                format!("line {index}: unit cost {reason}"),
            ));
        }
    }
    Ok(())
}

/// Total quantity per article, with duplicate lines merged.
///
/// Iteration follows article ID order, which is also the order stock rows
/// are locked in.
#[must_use]
pub fn merge_quantities<'a, L, I>(lines: I) -> BTreeMap<ArticleId, i32>
where
    L: StockLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let mut merged = BTreeMap::new();
    for line in lines {
        *merged.entry(line.article_id()).or_insert(0) += line.quantity();
    }
    merged
}
