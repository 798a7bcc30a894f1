//! Path-addressed HTTP pub/sub relay.
//!
//! A POST uploads a byte stream to a path; zero or more concurrent GETs on
//! that same path receive the bytes in near-real time. Optional on-disk
//! archival and catalog-page advertisement are layered on top of the core
//! fan-out engine.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod mime;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod state;

use std::sync::Arc;

use config::Config;
use registry::Hub;
use state::AppState;

/// Assemble the full router from a parsed [`Config`], wiring up the shared
/// hub and template renderer. Exposed separately from `main` so integration
/// tests can drive the real HTTP surface in-process.
pub fn build_app(config: Config) -> errors::AppResult<axum::Router> {
    let renderer = catalog::build_renderer()?;
    let state = AppState {
        hub: Arc::new(Hub::new()),
        config: Arc::new(config),
        renderer: Arc::new(renderer),
    };
    Ok(routes::build_router(state))
}
