//! Keyword search over a performer/title catalog, gated by an access policy.
//!
//! The catalog is read once from a spreadsheet workbook and cached for the
//! life of the process. Each query goes through an [`AccessPolicy`] that
//! looks at the caller's [`SessionState`] and either permits the search
//! (returning the next session) or refuses it.
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod interactive;
pub mod matcher;
pub mod output;
pub mod policy;
pub mod service;
pub mod session;

pub use crate::catalog::{load, Catalog, CatalogCache, Record};
pub use crate::error::{AccessError, AuthFailure, KaraokeError, LoadError, Result};
pub use crate::matcher::{search, MatchMode, Matcher};
pub use crate::policy::{
    AccessMode, AccessPolicy, AccessState, CredentialStore, QuotaSettings, StaticCredentials,
};
pub use crate::service::{QueryOutcome, SearchService};
pub use crate::session::SessionState;
