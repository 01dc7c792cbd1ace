//! `kyber-core`: shared types for the market-data poller.
//!
//! Holds the configuration model, the [`types::DataKind`] enum that names every
//! polled value, the value types themselves and the [`freshness::FreshnessStore`]
//! shared between jobs and the persistence layer.

pub mod config;
pub mod error;
pub mod freshness;
pub mod types;

pub use error::{KyberError, Result};
pub use freshness::FreshnessStore;
pub use types::DataKind;
