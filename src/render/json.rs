//! JSON renderer — structured output for tooling integration.
//!
//! Serializes the page view directly; `manifest.json` carries the namespace
//! groups and the full unit list.

use crate::error::{DocError, Result};
use crate::layout::Navigation;
use crate::render::*;
use serde::Serialize;

pub struct JsonRenderer;

fn pretty<T: Serialize>(path: &str, value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).map_err(|e| DocError::Serialize {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    out.push('\n');
    Ok(out)
}

impl Renderer for JsonRenderer {
    fn format(&self) -> Format {
        Format::Json
    }

    fn render_page(&self, page: &PageView) -> Result<String> {
        pretty(&page.path, page)
    }

    fn render_manifest(&self, navigation: &Navigation) -> Result<OutputUnit> {
        Ok(OutputUnit {
            path: self.format().manifest_path().to_string(),
            content: pretty(self.format().manifest_path(), navigation)?.into_bytes(),
        })
    }
}
