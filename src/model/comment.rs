//! Parsed documentation-comment sections, format-agnostic.

use crate::model::typeref::TypeReference;
use serde::{Deserialize, Serialize};

/// All sections a documentation comment can carry. Every field is optional
/// so an undocumented node is simply `DocSections::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocSections {
    pub summary: Option<String>,
    /// One entry per paragraph.
    pub remarks: Vec<String>,
    pub parameters: Vec<ParamDoc>,
    pub type_parameters: Vec<ParamDoc>,
    pub returns: Option<String>,
    pub exceptions: Vec<ExceptionDoc>,
    pub examples: Vec<ExampleDoc>,
    pub see_also: Vec<SeeAlso>,
}

/// `<param name="x">description</param>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    pub description: String,
}

/// `<exception cref="T:X">condition</exception>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDoc {
    #[serde(rename = "type")]
    pub ty: TypeReference,
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleDoc {
    /// Prose preceding the code blocks.
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub blocks: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub language: Option<String>,
    pub code: String,
}

/// A see-also entry: either a type (optionally naming one of its members)
/// or a raw URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeeAlso {
    Type {
        reference: TypeReference,
        #[serde(default)]
        member: Option<String>,
    },
    Url {
        url: String,
        #[serde(default)]
        text: Option<String>,
    },
}

impl DocSections {
    pub fn is_empty(&self) -> bool {
        *self == DocSections::default()
    }
}
