//! Structured type references.
//!
//! A [`TypeReference`] is what the metadata provider hands us wherever one
//! documented entity mentions a type: return types, parameters, base types,
//! exception types, see-also entries. It is never a raw string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Nullability / by-ref wrapper applied to a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    #[default]
    None,
    Nullable,
    ByRef,
}

/// Where a reference points once it has been matched against the model.
///
/// Not part of structural identity: two references that differ only in
/// origin are equal and resolve identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefOrigin {
    #[default]
    Unknown,
    Internal,
    External,
}

/// One step of a declaring chain: simple name plus generic arity, so
/// `Cache.Node` and `Cache<T>.Node` stay distinct.
///
/// Deserializes from `{"name": "Cache", "arity": 1}` or the metadata
/// spelling `"Cache`1"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "SegmentRepr")]
pub struct TypeSegment {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub arity: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Text(String),
    Full {
        name: String,
        #[serde(default)]
        arity: usize,
    },
}

impl From<SegmentRepr> for TypeSegment {
    fn from(repr: SegmentRepr) -> Self {
        match repr {
            SegmentRepr::Text(text) => TypeSegment::parse(&text),
            SegmentRepr::Full { name, arity } => TypeSegment { name, arity },
        }
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl TypeSegment {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    /// `Cache`1` → (`Cache`, 1).
    pub fn parse(text: &str) -> Self {
        let (name, arity) = strip_arity(text);
        Self::new(name, arity)
    }

    /// Source spelling of an unbound declaring type: `Cache<>`, `Map<,>`.
    pub fn unbound(&self) -> String {
        if self.arity == 0 {
            self.name.clone()
        } else {
            format!("{}<{}>", self.name, ",".repeat(self.arity - 1))
        }
    }
}

/// Metadata spelling: `Cache`1`.
impl fmt::Display for TypeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeReference {
    /// Simple name without arity suffix, e.g. `List`.
    pub name: String,
    /// Containing namespace, empty for the global namespace.
    #[serde(default)]
    pub namespace: String,
    /// Declaring types, outermost first, for nested types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outer: Vec<TypeSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_args: Vec<TypeReference>,
    #[serde(default)]
    pub array_rank: u8,
    #[serde(default)]
    pub qualifier: Qualifier,
    /// `T` in `List<T>`: a type parameter, never a lookup target.
    #[serde(default)]
    pub generic_parameter: bool,
    #[serde(skip)]
    pub origin: RefOrigin,
}

impl PartialEq for TypeReference {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.outer == other.outer
            && self.generic_args == other.generic_args
            && self.array_rank == other.array_rank
            && self.qualifier == other.qualifier
            && self.generic_parameter == other.generic_parameter
    }
}

impl Eq for TypeReference {}

impl Hash for TypeReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.namespace.hash(state);
        self.outer.hash(state);
        self.generic_args.hash(state);
        self.array_rank.hash(state);
        self.qualifier.hash(state);
        self.generic_parameter.hash(state);
    }
}

impl TypeReference {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// A reference to a generic type parameter such as `T`.
    pub fn type_parameter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_parameter: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<TypeReference>) -> Self {
        self.generic_args = args;
        self
    }

    #[must_use]
    pub fn nested_in(mut self, outer: Vec<TypeSegment>) -> Self {
        self.outer = outer;
        self
    }

    #[must_use]
    pub fn array(mut self, rank: u8) -> Self {
        self.array_rank = rank;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.qualifier = Qualifier::Nullable;
        self
    }

    #[must_use]
    pub fn by_ref(mut self) -> Self {
        self.qualifier = Qualifier::ByRef;
        self
    }

    pub fn arity(&self) -> usize {
        self.generic_args.len()
    }

    /// Declaring types and simple name in source spelling:
    /// `Cache<>.Node`.
    pub fn nested_name(&self) -> String {
        let mut name = String::new();
        for outer in &self.outer {
            name.push_str(&outer.unbound());
            name.push('.');
        }
        name.push_str(&self.name);
        name
    }

    /// Parse a documentation-comment cref (`T:Acme.Cache`1`,
    /// `M:Acme.Cache`1.Get(System.String)`).
    pub fn from_cref(cref: &str) -> Option<CrefTarget> {
        let cref = cref.trim();
        if cref.is_empty() {
            return None;
        }
        let (prefix, body) = match cref.split_once(':') {
            Some((p, b)) if p.len() == 1 => (p.chars().next(), b),
            _ => (None, cref),
        };
        // Parameter lists never contain the member name, drop them.
        let body = body.split('(').next().unwrap_or(body);
        let segments: Vec<&str> = body.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return None;
        }

        let (type_segments, member) = match prefix {
            Some('M' | 'P' | 'F' | 'E') if segments.len() > 1 => {
                let member = strip_arity(segments[segments.len() - 1]).0;
                let member = if member == "#ctor" { "ctor" } else { member };
                (&segments[..segments.len() - 1], Some(member.to_string()))
            }
            _ => (&segments[..], None),
        };

        let (last, leading) = type_segments.split_last()?;
        let (name, arity) = strip_arity(last);
        // Namespaces never carry an arity, so the first generic segment
        // starts the declaring chain. Non-generic declaring types stay in
        // the namespace and are matched by metadata name.
        let split = leading
            .iter()
            .position(|s| strip_arity(s).1 > 0)
            .unwrap_or(leading.len());
        let namespace = leading[..split].join(".");
        let outer = leading[split..].iter().map(|s| TypeSegment::parse(s)).collect();

        Some(CrefTarget {
            reference: TypeReference::new(namespace, name)
                .nested_in(outer)
                .with_args(placeholder_args(arity)),
            member,
        })
    }
}

/// A parsed cref: the type it names plus, for member crefs, the member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrefTarget {
    pub reference: TypeReference,
    pub member: Option<String>,
}

/// `List`1` → (`List`, 1); `List` → (`List`, 0).
fn strip_arity(segment: &str) -> (&str, usize) {
    match segment.split_once('`') {
        Some((name, n)) => (name, n.trim_start_matches('`').parse().unwrap_or(0)),
        None => (segment, 0),
    }
}

fn placeholder_args(arity: usize) -> Vec<TypeReference> {
    match arity {
        0 => Vec::new(),
        1 => vec![TypeReference::type_parameter("T")],
        n => (1..=n)
            .map(|i| TypeReference::type_parameter(format!("T{}", i)))
            .collect(),
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nested_name())?;
        if !self.generic_args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        if self.array_rank > 0 {
            write!(f, "[{}]", ",".repeat(usize::from(self.array_rank) - 1))?;
        }
        match self.qualifier {
            Qualifier::None => Ok(()),
            Qualifier::Nullable => f.write_str("?"),
            Qualifier::ByRef => f.write_str("&"),
        }
    }
}
