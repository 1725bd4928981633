//! Merged documentation graph.
//!
//! Storage is arena-style: every node lives in one `Vec` on [`DocModel`] and
//! refers to its relatives through typed indices. Namespaces shared between
//! assemblies are a single node keyed by their fully-qualified name.
//! The graph is only mutated by [`crate::builder`]; everything downstream
//! reads it through `&DocModel`.

pub mod comment;
pub mod typeref;

use comment::DocSections;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use typeref::{TypeReference, TypeSegment};

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(AssemblyId);
arena_id!(NamespaceId);
arena_id!(TypeId);
arena_id!(MemberId);

// -- Kinds --------------------------------------------------------------------

/// Closed set of type kinds; renderers match on it exhaustively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl TypeKind {
    pub const ALL: [TypeKind; 5] = [
        TypeKind::Class,
        TypeKind::Interface,
        TypeKind::Struct,
        TypeKind::Enum,
        TypeKind::Delegate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TypeKind::Class => "Class",
            TypeKind::Interface => "Interface",
            TypeKind::Struct => "Struct",
            TypeKind::Enum => "Enum",
            TypeKind::Delegate => "Delegate",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            TypeKind::Class => "Classes",
            TypeKind::Interface => "Interfaces",
            TypeKind::Struct => "Structs",
            TypeKind::Enum => "Enums",
            TypeKind::Delegate => "Delegates",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Constructor,
    Property,
    Method,
    Event,
    Field,
}

impl MemberKind {
    /// Rendering order of member sections.
    pub const ALL: [MemberKind; 5] = [
        MemberKind::Constructor,
        MemberKind::Property,
        MemberKind::Method,
        MemberKind::Event,
        MemberKind::Field,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MemberKind::Constructor => "Constructor",
            MemberKind::Property => "Property",
            MemberKind::Method => "Method",
            MemberKind::Event => "Event",
            MemberKind::Field => "Field",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            MemberKind::Constructor => "Constructors",
            MemberKind::Property => "Properties",
            MemberKind::Method => "Methods",
            MemberKind::Event => "Events",
            MemberKind::Field => "Fields",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Internal,
    ProtectedInternal,
    PrivateProtected,
    Private,
}

impl Accessibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Accessibility::Public => "public",
            Accessibility::Protected => "protected",
            Accessibility::Internal => "internal",
            Accessibility::ProtectedInternal => "protected internal",
            Accessibility::PrivateProtected => "private protected",
            Accessibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(rename = "override")]
    pub is_override: bool,
    #[serde(rename = "sealed")]
    pub is_sealed: bool,
    #[serde(rename = "readonly")]
    pub is_readonly: bool,
    #[serde(rename = "const")]
    pub is_const: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamModifier {
    #[default]
    None,
    Ref,
    Out,
    In,
    Params,
}

/// Provider-internal payload carried through the model untouched.
///
/// Always serializes as `null`: emitting a document must never depend on
/// whether the provider's object is representable.
#[derive(Debug, Clone, Default)]
pub struct Opaque(pub Option<serde_json::Value>);

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_none()
    }
}

impl<'de> Deserialize<'de> for Opaque {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<serde_json::Value>::deserialize(deserializer).map(Opaque)
    }
}

// -- Keys ---------------------------------------------------------------------

/// Identity of a type across the merged graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub namespace: String,
    /// Declaring types then the type itself, each with its own arity.
    /// Never empty.
    pub path: Vec<TypeSegment>,
}

impl TypeKey {
    pub fn new(namespace: impl Into<String>, path: Vec<TypeSegment>) -> Self {
        Self {
            namespace: namespace.into(),
            path,
        }
    }

    pub fn of_reference(r: &TypeReference) -> TypeKey {
        let mut path = r.outer.clone();
        path.push(TypeSegment::new(r.name.clone(), r.arity()));
        TypeKey::new(r.namespace.clone(), path)
    }

    /// The type's own generic arity.
    pub fn arity(&self) -> usize {
        self.path.last().map_or(0, |s| s.arity)
    }
}

/// Metadata name: `Acme.Cache`1.Node`.
impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}.", self.namespace)?;
        }
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

// -- Nodes --------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AssemblyDoc {
    pub name: String,
    pub version: Option<String>,
    /// Namespaces this assembly contributed types to, in first-seen order.
    pub namespaces: Vec<NamespaceId>,
}

#[derive(Debug, Clone)]
pub struct NamespaceDoc {
    pub name: String,
    pub summary: Option<String>,
    /// Top-level types in insertion order. Nested types hang off their
    /// declaring type instead.
    pub types: Vec<TypeId>,
    pub assemblies: Vec<AssemblyId>,
}

/// Member ids partitioned by kind, each list in declaration order.
#[derive(Debug, Clone, Default)]
pub struct MemberLists {
    pub constructors: Vec<MemberId>,
    pub properties: Vec<MemberId>,
    pub methods: Vec<MemberId>,
    pub events: Vec<MemberId>,
    pub fields: Vec<MemberId>,
}

impl MemberLists {
    pub fn of(&self, kind: MemberKind) -> &[MemberId] {
        match kind {
            MemberKind::Constructor => &self.constructors,
            MemberKind::Property => &self.properties,
            MemberKind::Method => &self.methods,
            MemberKind::Event => &self.events,
            MemberKind::Field => &self.fields,
        }
    }

    pub(crate) fn push(&mut self, kind: MemberKind, id: MemberId) {
        match kind {
            MemberKind::Constructor => self.constructors.push(id),
            MemberKind::Property => self.properties.push(id),
            MemberKind::Method => self.methods.push(id),
            MemberKind::Event => self.events.push(id),
            MemberKind::Field => self.fields.push(id),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = MemberId> + '_ {
        MemberKind::ALL
            .into_iter()
            .flat_map(move |k| self.of(k).iter().copied())
    }

    pub fn len(&self) -> usize {
        MemberKind::ALL.iter().map(|k| self.of(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct TypeDoc {
    pub key: TypeKey,
    pub kind: TypeKind,
    pub name: String,
    pub namespace: NamespaceId,
    /// Assembly whose definition survived the merge.
    pub assembly: AssemblyId,
    pub accessibility: Accessibility,
    pub modifiers: Modifiers,
    pub generic_parameters: Vec<String>,
    pub base_type: Option<TypeReference>,
    pub interfaces: Vec<TypeReference>,
    pub members: MemberLists,
    pub docs: DocSections,
    pub declaring_type: Option<TypeId>,
    pub nested_types: Vec<TypeId>,
    pub provider_symbol: Opaque,
}

impl TypeDoc {
    /// `Cache<TKey, TValue>`
    pub fn display_name(&self) -> String {
        with_generics(&self.name, &self.generic_parameters)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeReference,
    pub optional: bool,
    pub default_value: Option<String>,
    pub modifier: ParamModifier,
}

#[derive(Debug, Clone)]
pub struct MemberDoc {
    pub kind: MemberKind,
    pub name: String,
    /// Back-reference; the owner lists this member in its `members`.
    pub owner: TypeId,
    pub accessibility: Accessibility,
    pub modifiers: Modifiers,
    pub generic_parameters: Vec<String>,
    pub return_type: Option<TypeReference>,
    pub parameters: Vec<Parameter>,
    pub docs: DocSections,
    pub provider_symbol: Opaque,
}

impl MemberDoc {
    /// `Get<T>(String, Int32)` for methods and constructors, bare name
    /// otherwise.
    pub fn display_name(&self) -> String {
        let name = with_generics(&self.name, &self.generic_parameters);
        match self.kind {
            MemberKind::Method | MemberKind::Constructor => {
                let params: Vec<String> = self.parameters.iter().map(|p| p.ty.to_string()).collect();
                format!("{}({})", name, params.join(", "))
            }
            _ => name,
        }
    }
}

fn with_generics(name: &str, params: &[String]) -> String {
    if params.is_empty() {
        name.to_string()
    } else {
        format!("{}<{}>", name, params.join(", "))
    }
}

// -- Model --------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DocModel {
    pub(crate) assemblies: Vec<AssemblyDoc>,
    pub(crate) namespaces: Vec<NamespaceDoc>,
    pub(crate) types: Vec<TypeDoc>,
    pub(crate) members: Vec<MemberDoc>,
    pub(crate) namespace_index: HashMap<String, NamespaceId>,
    pub(crate) type_index: HashMap<TypeKey, TypeId>,
    /// Metadata name → type, for references that cannot tell a namespace
    /// segment from a non-generic declaring type (crefs).
    pub(crate) qualified_index: HashMap<String, TypeId>,
}

impl DocModel {
    pub fn assemblies(&self) -> impl Iterator<Item = (AssemblyId, &AssemblyDoc)> {
        self.assemblies.iter().enumerate().map(|(i, a)| (AssemblyId(i), a))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (NamespaceId, &NamespaceDoc)> {
        self.namespaces.iter().enumerate().map(|(i, n)| (NamespaceId(i), n))
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeDoc)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    pub fn members(&self) -> impl Iterator<Item = (MemberId, &MemberDoc)> {
        self.members.iter().enumerate().map(|(i, m)| (MemberId(i), m))
    }

    pub fn assembly(&self, id: AssemblyId) -> &AssemblyDoc {
        &self.assemblies[id.0]
    }

    pub fn namespace(&self, id: NamespaceId) -> &NamespaceDoc {
        &self.namespaces[id.0]
    }

    pub fn ty(&self, id: TypeId) -> &TypeDoc {
        &self.types[id.0]
    }

    pub fn member(&self, id: MemberId) -> &MemberDoc {
        &self.members[id.0]
    }

    pub fn namespace_by_name(&self, name: &str) -> Option<NamespaceId> {
        self.namespace_index.get(name).copied()
    }

    pub fn type_by_key(&self, key: &TypeKey) -> Option<TypeId> {
        self.type_index.get(key).copied()
    }

    /// Find the documented type a reference targets. Array rank and
    /// qualifier are ignored; type parameters never match.
    pub fn find_type(&self, r: &TypeReference) -> Option<TypeId> {
        if r.generic_parameter {
            return None;
        }
        let key = TypeKey::of_reference(r);
        self.type_by_key(&key)
            .or_else(|| self.qualified_index.get(&key.to_string()).copied())
    }

    /// `Outer.Inner<T>`: display name including declaring types.
    pub fn type_display_path(&self, id: TypeId) -> String {
        let ty = self.ty(id);
        match ty.declaring_type {
            Some(parent) => format!("{}.{}", self.type_display_path(parent), ty.display_name()),
            None => ty.display_name(),
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
