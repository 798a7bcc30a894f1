//! Shared application state, constructed once in `main` and handed to every
//! handler via axum's `State` extractor.

use std::sync::Arc;

use handlebars::Handlebars;

use crate::config::Config;
use crate::registry::Hub;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub config: Arc<Config>,
    pub renderer: Arc<Handlebars<'static>>,
}
