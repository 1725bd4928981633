//! Renderer pipeline — trait-based format dispatch.
//!
//! Every format renders from the same [`PageView`]s, built from the frozen
//! model through the resolver and the layout. Renderers only choose markup:
//! section template, generic syntax, callouts and the manifest shape.

pub mod json;
pub mod markdown;
pub mod mintlify;
pub mod view;
pub mod yaml;

pub use view::{
    DocsView, ExceptionView, LinkStyle, LinkView, ListingEntry, MemberGroupView, MemberView, NamespaceView,
    PageKind, PageView, ParamView, RefKind, RefView, TypeView,
};

use crate::error::{DocError, Result};
use crate::layout::{Navigation, UnitPlan};
use crate::resolve::Resolver;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use view::ViewBuilder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Markdown,
    Mintlify,
    Yaml,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Mintlify => "mdx",
            Format::Yaml => "yml",
            Format::Json => "json",
        }
    }

    /// Root-relative path of the navigation manifest.
    pub fn manifest_path(self) -> &'static str {
        match self {
            Format::Markdown => "SUMMARY.md",
            Format::Mintlify => "docs.json",
            Format::Yaml => "toc.yml",
            Format::Json => "manifest.json",
        }
    }
}

/// One rendered artifact, path relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub path: String,
    pub content: Vec<u8>,
}

/// Trait for rendering pages of a specific output format.
pub trait Renderer: Sync {
    fn format(&self) -> Format;

    fn file_extension(&self) -> &str {
        self.format().extension()
    }

    fn link_style(&self) -> LinkStyle {
        LinkStyle::Relative
    }

    fn render_page(&self, page: &PageView) -> Result<String>;

    fn render_manifest(&self, navigation: &Navigation) -> Result<OutputUnit>;
}

pub fn create_renderer(format: Format) -> Box<dyn Renderer> {
    match format {
        Format::Markdown => Box::new(markdown::MarkdownRenderer),
        Format::Mintlify => Box::new(mintlify::MintlifyRenderer),
        Format::Yaml => Box::new(yaml::YamlRenderer),
        Format::Json => Box::new(json::JsonRenderer),
    }
}

/// Build the view of one planned unit.
pub fn page_view(resolver: &Resolver<'_>, plan: &UnitPlan, links: LinkStyle) -> PageView {
    ViewBuilder::new(resolver, &plan.path, links).page(plan)
}

/// Render every unit of the resolver's layout plus the navigation manifest.
///
/// Units render in parallel and are returned in layout order. `cancel` is
/// checked before each unit starts; a cancelled run yields
/// [`DocError::Cancelled`] and no units.
pub fn render(resolver: &Resolver<'_>, renderer: &dyn Renderer, cancel: Option<&AtomicBool>) -> Result<Vec<OutputUnit>> {
    let layout = resolver.layout();
    if layout.options().extension != renderer.file_extension() {
        return Err(DocError::Config {
            reason: format!(
                "layout uses '.{}' but the {:?} renderer writes '.{}'",
                layout.options().extension,
                renderer.format(),
                renderer.file_extension()
            ),
        });
    }
    let manifest_path = renderer.format().manifest_path();
    if !layout.options().is_reserved(manifest_path) {
        return Err(DocError::Config {
            reason: format!("layout does not reserve the manifest path '{}'", manifest_path),
        });
    }

    resolver.warm();
    let cancelled = || cancel.is_some_and(|c| c.load(Ordering::Relaxed));

    let rendered: Vec<Option<OutputUnit>> = layout
        .units()
        .par_iter()
        .map(|plan| -> Result<Option<OutputUnit>> {
            if cancelled() {
                return Ok(None);
            }
            let page = page_view(resolver, plan, renderer.link_style());
            let content = renderer.render_page(&page)?;
            debug!(path = %plan.path, bytes = content.len(), "rendered unit");
            Ok(Some(OutputUnit {
                path: plan.path.clone(),
                content: content.into_bytes(),
            }))
        })
        .collect::<Result<_>>()?;

    let mut units: Vec<OutputUnit> = rendered.into_iter().collect::<Option<_>>().ok_or(DocError::Cancelled)?;

    units.push(renderer.render_manifest(layout.navigation())?);

    info!(units = units.len(), format = ?renderer.format(), "rendering complete");
    Ok(units)
}

// -- Shared helpers -----------------------------------------------------------

/// One row of a parameter list: declared parameters first, then any
/// documented name the signature lacks.
pub(crate) struct ParamRow<'v> {
    pub name: &'v str,
    pub ty: Option<&'v RefView>,
    pub description: Option<&'v str>,
}

pub(crate) fn parameter_rows<'v>(params: &'v [ParamView], docs: &'v DocsView) -> Vec<ParamRow<'v>> {
    let mut rows: Vec<ParamRow<'v>> = params
        .iter()
        .map(|p| ParamRow {
            name: &p.name,
            ty: Some(&p.ty),
            description: docs.parameter(&p.name),
        })
        .collect();
    for doc in &docs.parameters {
        if !params.iter().any(|p| p.name == doc.name) {
            rows.push(ParamRow {
                name: &doc.name,
                ty: None,
                description: Some(&doc.description),
            });
        }
    }
    rows
}

/// Label of a navigation group.
pub(crate) fn group_label(namespace: &str) -> &str {
    if namespace.is_empty() {
        "Global"
    } else {
        namespace
    }
}

/// Whether a member's return type deserves a section (`void` does not).
pub(crate) fn meaningful_return(member: &MemberView) -> Option<&RefView> {
    member
        .return_type
        .as_ref()
        .filter(|r| !(r.name == "Void" && r.args.is_empty() && r.suffix.is_empty()))
}
