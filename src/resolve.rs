//! Cross-reference resolution.
//!
//! Lookup order for a [`TypeReference`]:
//!
//! 1. a type documented in the merged model → [`Resolution::InternalAnchor`]
//!    at that type's layout location (nested types resolve to a fragment of
//!    their outer type's unit);
//! 2. a namespace covered by the [`ExternalMap`] → [`Resolution::ExternalUrl`]
//!    built from the prefix's URL template;
//! 3. otherwise [`Resolution::Unresolved`], rendered as plain text.
//!
//! Generic arguments resolve independently and recursively. Resolution is a
//! pure function of the reference's structure plus the frozen model and
//! layout, so results are memoized by structural equality.

use crate::layout::{Layout, Location};
use crate::model::typeref::{Qualifier, TypeReference};
use crate::model::{DocModel, MemberKind, TypeKey};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub const LEARN_DOTNET_TEMPLATE: &str = "https://learn.microsoft.com/dotnet/api/{uid}";

/// Namespace prefix → URL template for types documented elsewhere.
///
/// Templates may use `{namespace}`, `{name}`, `{arity}`, `{fullname}`
/// (`Namespace.Outer`1.Name`2`) and `{uid}` (`namespace.outer-1.name-2`,
/// lower-cased).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalMap {
    templates: BTreeMap<String, String>,
}

impl ExternalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `System` and `Microsoft` mapped to learn.microsoft.com.
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.insert("System", LEARN_DOTNET_TEMPLATE);
        map.insert("Microsoft", LEARN_DOTNET_TEMPLATE);
        map
    }

    pub fn insert(&mut self, prefix: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(prefix.into(), template.into());
    }

    pub fn extend(&mut self, other: &ExternalMap) {
        for (prefix, template) in &other.templates {
            self.templates.insert(prefix.clone(), template.clone());
        }
    }

    /// Longest matching prefix wins. A prefix matches its own namespace and
    /// any namespace below it; the empty prefix matches everything.
    pub fn template_for(&self, namespace: &str) -> Option<&str> {
        self.templates
            .iter()
            .filter(|(prefix, _)| {
                prefix.is_empty()
                    || namespace == prefix.as_str()
                    || namespace
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, template)| template.as_str())
    }

    pub fn url_for(&self, r: &TypeReference) -> Option<String> {
        self.template_for(&r.namespace).map(|t| expand(t, r))
    }
}

fn expand(template: &str, r: &TypeReference) -> String {
    let key = TypeKey::of_reference(r);
    let mut uid: Vec<String> = Vec::with_capacity(key.path.len() + 1);
    if !key.namespace.is_empty() {
        uid.push(key.namespace.to_lowercase());
    }
    uid.extend(key.path.iter().map(|s| match s.arity {
        0 => s.name.to_lowercase(),
        n => format!("{}-{}", s.name.to_lowercase(), n),
    }));
    template
        .replace("{namespace}", &r.namespace)
        .replace("{name}", &r.name)
        .replace("{arity}", &r.arity().to_string())
        .replace("{fullname}", &key.to_string())
        .replace("{uid}", &uid.join("."))
}

/// Display form of a resolved reference. Generic arguments carry their own
/// resolutions; renderers pick the generic syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    /// Simple name, with declaring types for nested references.
    pub name: String,
    pub args: Vec<Resolution>,
    pub array_rank: u8,
    pub qualifier: Qualifier,
}

impl DisplayName {
    /// Render with the given generic delimiters, e.g. `("<", ">")` or
    /// `("[", "]")`. Array and qualifier suffixes use C# notation.
    pub fn render(&self, open: &str, close: &str) -> String {
        let mut out = self.name.clone();
        if !self.args.is_empty() {
            out.push_str(open);
            let args: Vec<String> = self.args.iter().map(|a| a.display().render(open, close)).collect();
            out.push_str(&args.join(", "));
            out.push_str(close);
        }
        out.push_str(&self.suffix());
        out
    }

    /// `[]`, `[,]`, `?`, `&` as applicable.
    pub fn suffix(&self) -> String {
        let mut out = String::new();
        if self.array_rank > 0 {
            out.push('[');
            out.push_str(&",".repeat(usize::from(self.array_rank) - 1));
            out.push(']');
        }
        match self.qualifier {
            Qualifier::None => {}
            Qualifier::Nullable => out.push('?'),
            Qualifier::ByRef => out.push('&'),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    InternalAnchor { target: Location, display: DisplayName },
    ExternalUrl { url: String, display: DisplayName },
    Unresolved { display: DisplayName },
}

impl Resolution {
    pub fn display(&self) -> &DisplayName {
        match self {
            Resolution::InternalAnchor { display, .. }
            | Resolution::ExternalUrl { display, .. }
            | Resolution::Unresolved { display } => display,
        }
    }
}

pub struct Resolver<'a> {
    model: &'a DocModel,
    layout: &'a Layout,
    external: ExternalMap,
    memo: DashMap<TypeReference, Resolution>,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a DocModel, layout: &'a Layout, external: ExternalMap) -> Self {
        Self {
            model,
            layout,
            external,
            memo: DashMap::new(),
        }
    }

    pub fn model(&self) -> &DocModel {
        self.model
    }

    pub fn layout(&self) -> &Layout {
        self.layout
    }

    pub fn resolve(&self, r: &TypeReference) -> Resolution {
        if let Some(hit) = self.memo.get(r) {
            return hit.clone();
        }
        // No shard lock is held here: argument resolution recurses.
        let resolved = self.compute(r);
        self.memo.insert(r.clone(), resolved.clone());
        resolved
    }

    fn compute(&self, r: &TypeReference) -> Resolution {
        let display = DisplayName {
            name: r.nested_name(),
            args: r.generic_args.iter().map(|a| self.resolve(a)).collect(),
            array_rank: r.array_rank,
            qualifier: r.qualifier,
        };

        if r.generic_parameter {
            return Resolution::Unresolved { display };
        }
        if let Some(target) = self
            .model
            .find_type(r)
            .and_then(|id| self.layout.location(id))
        {
            return Resolution::InternalAnchor {
                target: target.clone(),
                display,
            };
        }
        if let Some(url) = self.external.url_for(r) {
            return Resolution::ExternalUrl { url, display };
        }
        trace!(reference = %r, "unresolved type reference");
        Resolution::Unresolved { display }
    }

    /// Resolve a member of a referenced type (see-also `M:`/`P:` crefs).
    /// Points at the member's anchor when the owner is documented and has a
    /// member of that name, at the owner otherwise.
    pub fn resolve_member(&self, r: &TypeReference, member: &str) -> Resolution {
        let owner = self.resolve(r);
        let mut display = owner.display().clone();
        display.name = format!("{}.{}", display.render("<", ">"), member);
        display.args = Vec::new();
        display.array_rank = 0;
        display.qualifier = Qualifier::None;

        let target = self.model.find_type(r).and_then(|id| {
            self.model
                .ty(id)
                .members
                .iter()
                .find(|m| {
                    let doc = self.model.member(*m);
                    doc.name == member || (member == "ctor" && doc.kind == MemberKind::Constructor)
                })
                .and_then(|m| self.layout.member_location(m))
        });

        match (owner, target) {
            (_, Some(target)) => Resolution::InternalAnchor {
                target: target.clone(),
                display,
            },
            (Resolution::InternalAnchor { target, .. }, None) => {
                Resolution::InternalAnchor { target, display }
            }
            (Resolution::ExternalUrl { url, .. }, None) => Resolution::ExternalUrl { url, display },
            (Resolution::Unresolved { .. }, None) => Resolution::Unresolved { display },
        }
    }

    /// Resolve every reference the model mentions so concurrent renderers
    /// only ever read the memo.
    pub fn warm(&self) {
        for (_, ty) in self.model.types() {
            ty.base_type.iter().chain(&ty.interfaces).for_each(|r| {
                self.resolve(r);
            });
            ty.docs.exceptions.iter().for_each(|e| {
                self.resolve(&e.ty);
            });
        }
        for (_, member) in self.model.members() {
            member.return_type.iter().for_each(|r| {
                self.resolve(r);
            });
            member.parameters.iter().for_each(|p| {
                self.resolve(&p.ty);
            });
            member.docs.exceptions.iter().for_each(|e| {
                self.resolve(&e.ty);
            });
        }
        debug!(entries = self.memo.len(), "resolution memo warmed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::facts::{AssemblyFacts, TypeFacts};
    use crate::layout::LayoutOptions;
    use crate::model::typeref::TypeSegment;

    fn fixture() -> DocModel {
        let outer = TypeFacts {
            namespace: "Acme.Widgets".to_string(),
            name: "Gadget".to_string(),
            ..Default::default()
        };
        let inner = TypeFacts {
            name: "Part".to_string(),
            declaring_type: Some(0),
            ..Default::default()
        };
        let cache = TypeFacts {
            namespace: "Acme".to_string(),
            name: "Cache".to_string(),
            generic_parameters: vec!["T".to_string()],
            ..Default::default()
        };
        build(&[AssemblyFacts {
            name: "Acme".to_string(),
            types: vec![outer, inner, cache],
            ..Default::default()
        }])
        .unwrap()
        .0
    }

    #[test]
    fn external_by_prefix() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::with_defaults());

        match resolver.resolve(&TypeReference::new("System", "String")) {
            Resolution::ExternalUrl { url, display } => {
                assert_eq!(url, "https://learn.microsoft.com/dotnet/api/system.string");
                assert_eq!(display.name, "String");
            }
            other => panic!("expected external, got {:?}", other),
        }
    }

    #[test]
    fn internal_points_at_layout_path() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::with_defaults());

        match resolver.resolve(&TypeReference::new("Acme.Widgets", "Gadget")) {
            Resolution::InternalAnchor { target, .. } => {
                assert_eq!(target.href(), "Acme/Widgets/Gadget.md")
            }
            other => panic!("expected internal, got {:?}", other),
        }
    }

    #[test]
    fn nested_resolves_to_fragment() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::new());
        let r = TypeReference::new("Acme.Widgets", "Part").nested_in(vec![TypeSegment::new("Gadget", 0)]);
        match resolver.resolve(&r) {
            Resolution::InternalAnchor { target, display } => {
                assert_eq!(target.href(), "Acme/Widgets/Gadget.md#gadget+part");
                assert_eq!(display.name, "Gadget.Part");
            }
            other => panic!("expected internal, got {:?}", other),
        }
    }

    #[test]
    fn generic_arguments_resolve_independently() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::with_defaults());

        let r = TypeReference::new("System.Collections.Generic", "Dictionary")
            .with_args(vec![
                TypeReference::new("System", "String"),
                TypeReference::new("Acme", "Cache").with_args(vec![TypeReference::new("Vendor", "Blob")]),
            ])
            .array(1);
        let resolved = resolver.resolve(&r);
        let Resolution::ExternalUrl { url, display } = &resolved else {
            panic!("expected external, got {:?}", resolved);
        };
        assert_eq!(url, "https://learn.microsoft.com/dotnet/api/system.collections.generic.dictionary-2");
        assert!(matches!(display.args[0], Resolution::ExternalUrl { .. }));
        assert!(matches!(display.args[1], Resolution::InternalAnchor { .. }));
        assert!(matches!(display.args[1].display().args[0], Resolution::Unresolved { .. }));
        assert_eq!(display.render("<", ">"), "Dictionary<String, Cache<Blob>>[]");
        assert_eq!(display.render("[", "]"), "Dictionary[String, Cache[Blob]][]");
    }

    #[test]
    fn structurally_equal_references_resolve_equal() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::with_defaults());

        let a = TypeReference::new("Acme", "Cache").with_args(vec![TypeReference::new("System", "Int32")]);
        let mut b = a.clone();
        b.origin = crate::model::typeref::RefOrigin::External;
        assert_eq!(resolver.resolve(&a), resolver.resolve(&b));
        assert_eq!(resolver.resolve(&a), resolver.resolve(&a));
    }

    #[test]
    fn array_and_nullable_do_not_change_target() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::new());
        let plain = TypeReference::new("Acme.Widgets", "Gadget");
        let wrapped = plain.clone().array(2).nullable();
        match (resolver.resolve(&plain), resolver.resolve(&wrapped)) {
            (
                Resolution::InternalAnchor { target: a, .. },
                Resolution::InternalAnchor { target: b, display },
            ) => {
                assert_eq!(a, b);
                assert_eq!(display.render("<", ">"), "Gadget[,]?");
            }
            other => panic!("expected internal anchors, got {:?}", other),
        }
    }

    #[test]
    fn unknown_is_unresolved() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::with_defaults());
        assert!(matches!(
            resolver.resolve(&TypeReference::new("Vendor.Lib", "Blob")),
            Resolution::Unresolved { .. }
        ));
        assert!(matches!(
            resolver.resolve(&TypeReference::type_parameter("T")),
            Resolution::Unresolved { .. }
        ));
    }

    #[test]
    fn longest_prefix_wins() {
        let mut map = ExternalMap::new();
        map.insert("System", "https://a/{name}");
        map.insert("System.Text", "https://b/{fullname}");
        map.insert("Sys", "https://wrong/{name}");
        assert_eq!(
            map.url_for(&TypeReference::new("System.Text", "StringBuilder")).as_deref(),
            Some("https://b/System.Text.StringBuilder")
        );
        assert_eq!(
            map.url_for(&TypeReference::new("System.IO", "Stream")).as_deref(),
            Some("https://a/Stream")
        );
        assert_eq!(map.url_for(&TypeReference::new("Systemic", "X")), None);
    }

    #[test]
    fn template_placeholders() {
        let r = TypeReference::new("System.Collections.Generic", "List")
            .with_args(vec![TypeReference::type_parameter("T")]);
        assert_eq!(
            expand("{namespace}|{name}|{arity}|{fullname}|{uid}", &r),
            "System.Collections.Generic|List|1|System.Collections.Generic.List`1|system.collections.generic.list-1"
        );
        let nested = TypeReference::new("System.Collections.Generic", "KeyCollection")
            .nested_in(vec![TypeSegment::new("Dictionary", 2)]);
        assert_eq!(
            expand("{fullname}|{uid}", &nested),
            "System.Collections.Generic.Dictionary`2.KeyCollection|system.collections.generic.dictionary-2.keycollection"
        );
    }

    #[test]
    fn member_reference_points_at_member_anchor_or_owner() {
        let model = fixture();
        let layout = Layout::build(&model, &LayoutOptions::default()).unwrap();
        let resolver = Resolver::new(&model, &layout, ExternalMap::with_defaults());
        match resolver.resolve_member(&TypeReference::new("Acme.Widgets", "Gadget"), "Spin") {
            Resolution::InternalAnchor { target, display } => {
                assert_eq!(target.href(), "Acme/Widgets/Gadget.md");
                assert_eq!(display.name, "Gadget.Spin");
            }
            other => panic!("expected internal, got {:?}", other),
        }
        assert!(matches!(
            resolver.resolve_member(&TypeReference::new("System", "String"), "Join"),
            Resolution::ExternalUrl { .. }
        ));
    }
}
