//! Input contract: symbol facts as supplied by the metadata provider.
//!
//! One [`AssemblyFacts`] per compiled assembly. Types and members are flat
//! lists; members and nested types point at their owner by index into the
//! same assembly's `types`.

use crate::model::comment::DocSections;
use crate::model::typeref::TypeReference;
use crate::model::{Accessibility, MemberKind, Modifiers, Opaque, ParamModifier, TypeKind};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyFacts {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub namespaces: Vec<NamespaceFacts>,
    #[serde(default)]
    pub types: Vec<TypeFacts>,
    #[serde(default)]
    pub members: Vec<MemberFacts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceFacts {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeFacts {
    pub kind: TypeKind,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Index of the declaring type for nested types.
    #[serde(default)]
    pub declaring_type: Option<usize>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub base_type: Option<TypeReference>,
    #[serde(default)]
    pub interfaces: Vec<TypeReference>,
    /// Type-forward stub pointing at another assembly's definition.
    #[serde(default)]
    pub forwarded: bool,
    #[serde(default)]
    pub documentation: Option<CommentFacts>,
    #[serde(default)]
    pub provider_symbol: Opaque,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberFacts {
    /// Index of the owning type in the assembly's `types`.
    pub owner: usize,
    pub kind: MemberKind,
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub return_type: Option<TypeReference>,
    #[serde(default)]
    pub parameters: Vec<ParameterFacts>,
    #[serde(default)]
    pub documentation: Option<CommentFacts>,
    #[serde(default)]
    pub provider_symbol: Opaque,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterFacts {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub modifier: ParamModifier,
}

/// Documentation as handed over by the provider: already split into
/// sections, or the raw XML fragment for [`crate::xmldoc`] to parse.
///
/// Deserialization never fails on a badly shaped comment. It yields
/// [`CommentFacts::Unreadable`] instead, which the builder reports and
/// renders as undocumented.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommentFacts {
    Xml { xml: String },
    Sections(DocSections),
    Unreadable { reason: String },
}

impl CommentFacts {
    fn from_value(value: &serde_json::Value) -> CommentFacts {
        let parsed = match value.get("xml") {
            Some(xml) => String::deserialize(xml).map(|xml| CommentFacts::Xml { xml }),
            None => DocSections::deserialize(value).map(CommentFacts::Sections),
        };
        parsed.unwrap_or_else(|e| CommentFacts::Unreadable { reason: e.to_string() })
    }
}

impl<'de> Deserialize<'de> for CommentFacts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(|value| CommentFacts::from_value(&value))
    }
}

impl AssemblyFacts {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}
