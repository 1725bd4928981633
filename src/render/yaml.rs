//! YAML renderer — the page view serialized with `serde_yaml`, plus a
//! `toc.yml` navigation tree.

use crate::error::{DocError, Result};
use crate::layout::Navigation;
use crate::render::*;
use serde::Serialize;

pub struct YamlRenderer;

#[derive(Serialize)]
struct TocItem<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    items: Vec<TocItem<'a>>,
}

fn serialize_error(path: &str, e: serde_yaml::Error) -> DocError {
    DocError::Serialize {
        path: path.to_string(),
        reason: e.to_string(),
    }
}

impl Renderer for YamlRenderer {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn render_page(&self, page: &PageView) -> Result<String> {
        serde_yaml::to_string(page).map_err(|e| serialize_error(&page.path, e))
    }

    fn render_manifest(&self, navigation: &Navigation) -> Result<OutputUnit> {
        let toc: Vec<TocItem<'_>> = navigation
            .groups
            .iter()
            .map(|group| TocItem {
                name: group_label(&group.namespace),
                href: group.index.as_deref(),
                items: group
                    .entries
                    .iter()
                    .map(|entry| TocItem {
                        name: &entry.title,
                        href: Some(&entry.path),
                        items: Vec::new(),
                    })
                    .collect(),
            })
            .collect();
        let content = serde_yaml::to_string(&toc).map_err(|e| serialize_error(self.format().manifest_path(), e))?;
        Ok(OutputUnit {
            path: self.format().manifest_path().to_string(),
            content: content.into_bytes(),
        })
    }
}
