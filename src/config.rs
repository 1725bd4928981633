//! Run configuration: an optional TOML file, overridden by command-line
//! flags, on top of built-in defaults.
//!
//! ```toml
//! format = "mintlify"
//! mode = "flat"
//! flat_scope = "namespace"
//! output = "site/api"
//! concurrency = 8
//! namespace_pages = false
//!
//! [external]
//! "Newtonsoft" = "https://www.newtonsoft.com/json/help/html/T_{namespace}_{name}.htm"
//! ```

use crate::error::{DocError, Result};
use crate::layout::{FlatScope, LayoutMode, LayoutOptions};
use crate::render::Format;
use crate::resolve::ExternalMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "docs";

/// Partial configuration. Every field is optional so a file and the CLI can
/// each supply a subset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: Option<Format>,
    pub mode: Option<LayoutMode>,
    pub flat_scope: Option<FlatScope>,
    pub output: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub namespace_pages: Option<bool>,
    pub external: ExternalMap,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub format: Format,
    pub layout: LayoutOptions,
    pub output: PathBuf,
    pub concurrency: usize,
    pub external: ExternalMap,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|e| DocError::Config {
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| DocError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml(&text)
    }

    /// Layer `overrides` on top of `self`. External mappings are merged,
    /// with the override winning per prefix.
    pub fn merge(mut self, overrides: Config) -> Config {
        self.format = overrides.format.or(self.format);
        self.mode = overrides.mode.or(self.mode);
        self.flat_scope = overrides.flat_scope.or(self.flat_scope);
        self.output = overrides.output.or(self.output);
        self.concurrency = overrides.concurrency.or(self.concurrency);
        self.namespace_pages = overrides.namespace_pages.or(self.namespace_pages);
        self.external.extend(&overrides.external);
        self
    }

    pub fn settings(&self) -> Settings {
        let format = self.format.unwrap_or_default();
        let mut external = ExternalMap::with_defaults();
        external.extend(&self.external);
        Settings {
            format,
            layout: LayoutOptions {
                mode: self.mode.unwrap_or_default(),
                flat_scope: self.flat_scope.unwrap_or_default(),
                extension: format.extension().to_string(),
                namespace_pages: self.namespace_pages.unwrap_or(true),
                reserved: vec![format.manifest_path().to_string()],
            },
            output: self.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            concurrency: self.concurrency.unwrap_or(0),
            external,
        }
    }
}

/// Parse a `PREFIX=TEMPLATE` command-line mapping.
pub fn parse_external(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((prefix, template)) if !template.is_empty() => Ok((prefix.trim().to_string(), template.to_string())),
        _ => Err(DocError::Config {
            reason: format!("expected PREFIX=TEMPLATE, got '{}'", arg),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::typeref::TypeReference;

    #[test]
    fn defaults() {
        let settings = Config::default().settings();
        assert_eq!(settings.format, Format::Markdown);
        assert_eq!(settings.layout.mode, LayoutMode::Hierarchical);
        assert_eq!(settings.layout.flat_scope, FlatScope::Assembly);
        assert_eq!(settings.layout.extension, "md");
        assert!(settings.layout.namespace_pages);
        assert_eq!(settings.output, PathBuf::from("docs"));
        assert_eq!(
            settings.external.url_for(&TypeReference::new("System", "String")).as_deref(),
            Some("https://learn.microsoft.com/dotnet/api/system.string")
        );
    }

    #[test]
    fn parses_toml() {
        let config = Config::from_toml(
            r#"
format = "mintlify"
mode = "flat"
flat_scope = "namespace"
concurrency = 4
namespace_pages = false

[external]
"Vendor" = "https://vendor.example/{name}"
"#,
        )
        .unwrap();
        let settings = config.settings();
        assert_eq!(settings.format, Format::Mintlify);
        assert_eq!(settings.layout.extension, "mdx");
        assert_eq!(settings.layout.mode, LayoutMode::Flat);
        assert_eq!(settings.layout.flat_scope, FlatScope::Namespace);
        assert_eq!(settings.concurrency, 4);
        assert!(!settings.layout.namespace_pages);
        assert_eq!(
            settings.external.url_for(&TypeReference::new("Vendor.Blobs", "Blob")).as_deref(),
            Some("https://vendor.example/Blob")
        );
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = Config::from_toml("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, DocError::Config { .. }));
    }

    #[test]
    fn cli_overrides_file() {
        let file = Config {
            format: Some(Format::Yaml),
            concurrency: Some(2),
            ..Default::default()
        };
        let mut cli = Config {
            format: Some(Format::Json),
            ..Default::default()
        };
        cli.external.insert("System", "https://mirror.example/{uid}");
        let merged = file.merge(cli);
        assert_eq!(merged.format, Some(Format::Json));
        assert_eq!(merged.concurrency, Some(2));
        let settings = merged.settings();
        assert_eq!(
            settings.external.url_for(&TypeReference::new("System", "Int32")).as_deref(),
            Some("https://mirror.example/system.int32")
        );
    }

    #[test]
    fn external_argument() {
        assert_eq!(
            parse_external("Vendor=https://v.example/{name}").unwrap(),
            ("Vendor".to_string(), "https://v.example/{name}".to_string())
        );
        assert!(parse_external("Vendor").is_err());
    }
}
