//! asmdoc — API reference generation from assembly metadata.
//!
//! The pipeline is one linear pass:
//!
//! 1. [`builder`] merges per-assembly [`facts`] into a frozen [`model::DocModel`];
//! 2. [`layout`] assigns every type and member an output location;
//! 3. [`resolve`] links type references to those locations or to external
//!    documentation;
//! 4. [`render`] turns each planned unit into bytes for one [`render::Format`];
//! 5. [`write`] persists the units with bounded concurrency.

pub mod builder;
pub mod config;
pub mod error;
pub mod facts;
pub mod layout;
pub mod model;
pub mod render;
pub mod resolve;
pub mod signature;
pub mod write;
pub mod xmldoc;

use config::Settings;
use error::{Result, Warning};
use facts::AssemblyFacts;
use layout::Layout;
use render::OutputUnit;
use resolve::Resolver;
use std::sync::atomic::AtomicBool;
use tracing::info;
use write::{WriteOptions, WriteReport};

/// Rendered output of a run, not yet written.
#[derive(Debug)]
pub struct Rendered {
    pub units: Vec<OutputUnit>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug)]
pub struct Generated {
    pub units: usize,
    pub warnings: Vec<Warning>,
    pub report: WriteReport,
}

/// Build, lay out, resolve and render. Fails before producing anything on
/// invalid facts or a path collision.
pub fn render_facts(facts: &[AssemblyFacts], settings: &Settings, cancel: Option<&AtomicBool>) -> Result<Rendered> {
    let (model, warnings) = builder::build(facts)?;
    let layout = Layout::build(&model, &settings.layout)?;
    info!(
        types = model.type_count(),
        units = layout.units().len(),
        mode = ?settings.layout.mode,
        "layout planned"
    );

    let resolver = Resolver::new(&model, &layout, settings.external.clone());
    let renderer = render::create_renderer(settings.format);
    let units = render::render(&resolver, renderer.as_ref(), cancel)?;
    Ok(Rendered { units, warnings })
}

/// [`render_facts`], then write every unit under `settings.output`.
pub fn generate(facts: &[AssemblyFacts], settings: &Settings, cancel: Option<&AtomicBool>) -> Result<Generated> {
    let Rendered { units, warnings } = render_facts(facts, settings, cancel)?;
    let report = write::write_units(
        &settings.output,
        &units,
        &WriteOptions {
            concurrency: settings.concurrency,
            cancel,
        },
    )?;
    Ok(Generated {
        units: units.len(),
        warnings,
        report,
    })
}
