//! Site catalog endpoint.
//!
//! Returns the data the page-render template is populated with.

use axum::{Json, extract::State};
use serde::Serialize;
use stackpager_core::Site;

use crate::handler::AppState;

#[derive(Debug, Serialize)]
pub struct SitesOutput {
    pub site_names: Vec<Site>,
}

pub async fn sites_handler(State(state): State<AppState>) -> Json<SitesOutput> {
    Json(SitesOutput { site_names: state.catalog.sites().to_vec() })
}
