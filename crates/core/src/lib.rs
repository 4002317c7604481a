//! Core types and shared functionality for stackpager.
//!
//! This crate provides:
//! - Filter keys and their normalization from raw query parameters
//! - The per-caller page store
//! - Session persistence with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod filter;
pub mod pages;
pub mod session;
pub mod sites;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use filter::{FilterKey, FilterParams, QueryIdentity};
pub use pages::{CachedPage, PageStore, Row};
pub use session::{SessionContext, SessionDb};
pub use sites::{Site, SiteCatalog};
