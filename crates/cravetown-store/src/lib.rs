//! File-backed persistence and editing sessions for Cravetown craving data.
//!
//! This crate owns all I/O around the pure model in `cravetown-logic`:
//! locating documents for a data version, reading and writing them as JSON,
//! and holding an editing session in which every stored vector is kept
//! sized to the current dimension registry.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Data directory, active version, truncation policy, env overrides |
//! | [`error`] | `StoreError` for everything crossing the persistence boundary |
//! | [`store`] | Load/save of the craving documents |
//! | [`session`] | Normalized in-memory documents, editing ops, all-or-nothing save |

pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use config::{validate_config, ConfigError, DocumentKind, StoreConfig};
pub use error::StoreError;
pub use session::{EditingSession, ItemRef};
pub use store::CravingStore;
