//! Client library for the Strata statement API.
//!
//! Provides the typed result model shared by every Strata client
//! ([`StatementResultField`], [`StatementResultRow`], [`ProcessedStatement`]),
//! the [`Store`] capability the interactive result engine is written against,
//! and [`StrataLinkClient`], an HTTP implementation of that capability.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod store;
pub mod timeouts;

pub use auth::AuthProvider;
pub use client::{StrataLinkClient, StrataLinkClientBuilder};
pub use error::{Result, StatementError, StrataLinkError, UNAUTHORIZED_STATUS};
pub use models::{
    ColumnSchema, ColumnType, FieldType, MapEntry, ProcessedStatement, RowFieldType,
    StatementPhase, StatementResultField, StatementResultOperation, StatementResultRow,
    StatementResults, StatementTraits,
};
pub use store::{Store, StoreResult};
pub use timeouts::StrataLinkTimeouts;
