//! Decimal money arithmetic for prices, discounts and order totals.
//!
//! All amounts are `rust_decimal::Decimal` in the store's single currency and
//! are rounded to cents, halves away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Discount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// The percentage is outside 0-100.
    #[error("discount must be between 0 and 100 percent, got {0}")]
    OutOfRange(Decimal),
}

/// Largest amount a price, cost, line or total may reach (`NUMERIC(12, 2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Errors raised by order arithmetic.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// A line amount or order total exceeds [`MAX_AMOUNT`].
    #[error("amount exceeds the maximum of {}", MAX_AMOUNT)]
    Overflow,
}

/// Whether `amount` is a storable money value: between zero and
/// [`MAX_AMOUNT`] with at most two decimal places.
#[must_use]
pub fn is_valid_amount(amount: Decimal) -> bool {
    (amount.is_zero() || amount.is_sign_positive())
        && amount <= MAX_AMOUNT
        && amount.normalize().scale() <= 2
}

/// A percentage discount applied to an article's list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Discount(Decimal);

impl Discount {
    /// Build a discount from a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::OutOfRange`] unless `0 <= percent <= 100`.
    pub fn new(percent: Decimal) -> Result<Self, DiscountError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(DiscountError::OutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// The percentage value (e.g. `15` for 15 %).
    #[must_use]
    pub const fn percent(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Discount {
    type Error = DiscountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Discount> for Decimal {
    fn from(discount: Discount) -> Self {
        discount.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Discount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Discount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let percent = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(percent)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Discount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Unit price after applying an optional discount, rounded to cents.
///
/// ```
/// use comptoir_core::{Discount, discounted_price};
/// use rust_decimal::Decimal;
///
/// let price = Decimal::new(1999, 2);
/// let ten_percent = Discount::new(Decimal::TEN).unwrap();
/// assert_eq!(discounted_price(price, Some(ten_percent)), Decimal::new(1799, 2));
/// assert_eq!(discounted_price(price, None), price);
/// ```
#[must_use]
pub fn discounted_price(price: Decimal, discount: Option<Discount>) -> Decimal {
    match discount {
        Some(d) if !d.percent().is_zero() => {
            let factor = (Decimal::ONE_HUNDRED - d.percent()) / Decimal::ONE_HUNDRED;
            round_cents(price * factor)
        }
        _ => round_cents(price),
    }
}

fn bounded(amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount > MAX_AMOUNT {
        return Err(MoneyError::Overflow);
    }
    Ok(amount)
}

/// Amount for one order or invoice line.
///
/// # Errors
///
/// Returns [`MoneyError::Overflow`] if the amount exceeds [`MAX_AMOUNT`].
pub fn line_amount(quantity: i32, unit_price: Decimal) -> Result<Decimal, MoneyError> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(round_cents)
        .ok_or(MoneyError::Overflow)
        .and_then(bounded)
}

/// Order total: the sum of line amounts plus shipping.
///
/// Shipping is left out when `free_shipping` is set.
///
/// # Errors
///
/// Returns [`MoneyError::Overflow`] if a line or the total exceeds
/// [`MAX_AMOUNT`].
pub fn order_total<I>(
    lines: I,
    shipping_cost: Decimal,
    free_shipping: bool,
) -> Result<Decimal, MoneyError>
where
    I: IntoIterator<Item = (i32, Decimal)>,
{
    let shipping = if free_shipping {
        Decimal::ZERO
    } else {
        round_cents(shipping_cost)
    };

    lines
        .into_iter()
        .try_fold(shipping, |total, (quantity, unit_price)| {
            let amount = line_amount(quantity, unit_price)?;
            total.checked_add(amount).ok_or(MoneyError::Overflow)
        })
        .and_then(bounded)
}
