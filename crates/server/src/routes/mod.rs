//! HTTP route handlers.
//!
//! This module contains the two endpoints exposed by the stackpager server.

pub mod fetch;
pub mod sites;

pub use fetch::fetch_handler;
pub use sites::sites_handler;
