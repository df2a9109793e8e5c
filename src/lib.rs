//! pricedb-updater Library
//!
//! Fetches market quotes and appends base-currency prices to a plain-text
//! ledger price database.

pub mod cli;
pub mod commodities;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod oracle;
pub mod persistence;
pub mod resolver;
pub mod types;
pub mod updater;
