//! The index/catalog page: advertised paths plus the archive listing,
//! rendered through a template engine. The component's contract is
//! only to assemble this data tuple and hand it to the renderer.

use handlebars::Handlebars;
use rand::Rng;
use serde::Serialize;

use crate::archive::ArchivedFile;
use crate::errors::AppResult;

const TEMPLATE_NAME: &str = "index";
const TEMPLATE_SOURCE: &str = include_str!("../templates/index.hbs");

/// One archived file as handed to the template: a display name, a servable
/// href under the archive route, and a human-readable timestamp.
#[derive(Debug, Serialize)]
pub struct ArchivedView {
    pub filename: String,
    pub full_filename: String,
    pub created: String,
}

impl ArchivedView {
    fn from_record(folder_url: &str, record: &ArchivedFile) -> Self {
        Self {
            filename: record.short_name.clone(),
            full_filename: format!("/{folder_url}/{}", record.short_name),
            created: record.created_time.to_rfc2822(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub title: &'static str,
    pub items: Vec<String>,
    pub rand: u32,
    pub archived: Vec<ArchivedView>,
}

/// Builds the one `Handlebars` registry the server keeps alive for the
/// lifetime of the process. Failing to parse the template is a fatal
/// startup error.
pub fn build_renderer() -> AppResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_template_string(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
    Ok(handlebars)
}

pub fn render(
    handlebars: &Handlebars<'static>,
    folder_url: &str,
    items: Vec<String>,
    archived: &[ArchivedFile],
) -> AppResult<String> {
    let view = CatalogView {
        title: "relay",
        items,
        rand: rand::rng().random(),
        archived: archived.iter().map(|r| ArchivedView::from_record(folder_url, r)).collect(),
    };
    Ok(handlebars.render(TEMPLATE_NAME, &view)?)
}
