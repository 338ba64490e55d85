//! Comptoir Admin library.
//!
//! The back-office REST API as a library, so the router can be tested and
//! reused by the binary.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`db`] - `PostgreSQL` repositories and stock movements
//! - [`routes`] - Axum handlers under `/api`
//! - [`extract`] - Extractors that reject bad input as JSON errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
