//! # Vault Ledger
//!
//! Shared household expense tracking.
//!
//! A vault is a shared ledger. Users join vaults by invitation and get a
//! role (owner, admin, member) that decides what they can do. Members record
//! expenses against a fixed category catalog, optionally starting from a
//! reusable template, and the owner or admins set budgets whose progress is
//! tracked per recurring period.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP (axum) ──► api::* handlers ──► Ledger (ledger::*) ──► LedgerStore
//!                                         │                     │
//!                   budget / statistics ◄─┘                     └─► ledger.json
//! ```
//!
//! ## Modules
//! - `api`: Router, auth middleware and JSON handlers
//! - `ledger`: Permission-checked operations over the stored data
//! - `budget`: Budget model, period windows and progress calculation
//! - `statistics`: Spending breakdowns by template, category and member
//! - `store`: In-memory data with snapshot persistence

pub mod api;
pub mod audit;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expense;
pub mod ledger;
pub mod statistics;
pub mod store;
pub mod validation;
pub mod vault;

pub use config::Config;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Actor, Ledger, LedgerSettings};
pub use store::LedgerStore;
