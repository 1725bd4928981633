//! Format-neutral page content.
//!
//! A [`PageView`] is built once per output unit from the model, the resolver
//! and the layout. Every renderer reads the same view, so paths, links and
//! documentation sections cannot drift between formats.

use crate::layout::{display_title, relative_href, sorted_types, Location, Node, UnitContent, UnitPlan};
use crate::model::comment::{DocSections, ExampleDoc, ParamDoc, SeeAlso};
use crate::model::typeref::TypeReference;
use crate::model::*;
use crate::resolve::{Resolution, Resolver};
use crate::signature;
use serde::{Deserialize, Serialize};

/// How links to other units are spelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkStyle {
    /// Relative to the linking unit, with file extension.
    #[default]
    Relative,
    /// Root-relative route without extension (`/Acme/Gadget#anchor`).
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Type,
    Namespace,
    Flat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub path: String,
    pub title: String,
    pub kind: PageKind,
    pub namespaces: Vec<NamespaceView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceView {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Overview rows (namespace pages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listing: Vec<ListingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingEntry {
    pub kind: TypeKind,
    pub name: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeView {
    /// Stable identity, e.g. ``Acme.Cache`1``.
    pub uid: String,
    /// `Outer.Inner<T>`
    pub name: String,
    pub title: String,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub namespace: String,
    pub assembly: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<RefView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<RefView>,
    #[serde(default)]
    pub docs: DocsView,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberGroupView>,
    #[serde(default)]
    pub provider_symbol: Opaque,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberGroupView {
    pub kind: MemberKind,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<RefView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamView>,
    #[serde(default)]
    pub docs: DocsView,
    #[serde(default)]
    pub provider_symbol: Opaque,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamView {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RefView,
    #[serde(default)]
    pub modifier: ParamModifier,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Documentation sections with every type reference resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remarks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<ParamDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<ExceptionView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ExampleDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<LinkView>,
}

impl DocsView {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.description.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionView {
    #[serde(rename = "type")]
    pub ty: RefView,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkView {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Internal,
    External,
    Unresolved,
}

/// A resolved type reference. `display` is the full C#-style text; `name`,
/// `args` and `suffix` let markup formats link each part on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefView {
    pub display: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub resolution: RefKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<RefView>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,
}

impl RefView {
    /// Rebuild the display text with another generic syntax, mapping each
    /// part through `part` (e.g. to wrap it in a link).
    pub fn compose(&self, open: &str, close: &str, part: &dyn Fn(&RefView) -> String) -> String {
        let mut out = part(self);
        if !self.args.is_empty() {
            out.push_str(open);
            let args: Vec<String> = self.args.iter().map(|a| a.compose(open, close, part)).collect();
            out.push_str(&args.join(", "));
            out.push_str(close);
        }
        out.push_str(&self.suffix);
        out
    }
}

/// Route form of a location: root-relative, extension stripped.
pub fn route(location: &Location) -> String {
    let stem = location
        .path
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&location.path);
    match &location.anchor {
        Some(anchor) => format!("/{}#{}", stem, anchor),
        None => format!("/{}", stem),
    }
}

// -- Construction -------------------------------------------------------------

pub(crate) struct ViewBuilder<'r, 'a> {
    resolver: &'r Resolver<'a>,
    page: &'r str,
    links: LinkStyle,
}

impl<'r, 'a> ViewBuilder<'r, 'a> {
    pub(crate) fn new(resolver: &'r Resolver<'a>, page: &'r str, links: LinkStyle) -> Self {
        Self { resolver, page, links }
    }

    pub(crate) fn page(&self, plan: &UnitPlan) -> PageView {
        let model = self.resolver.model();
        let (kind, namespaces) = match &plan.content {
            UnitContent::Type(id) => {
                let ty = model.ty(*id);
                let namespace = NamespaceView {
                    name: model.namespace(ty.namespace).name.clone(),
                    summary: None,
                    listing: Vec::new(),
                    types: self.type_tree(*id),
                };
                (PageKind::Type, vec![namespace])
            }
            UnitContent::Namespace(ns_id) => {
                let ns = model.namespace(*ns_id);
                let listing = sorted_types(model, &ns.types)
                    .into_iter()
                    .map(|t| {
                        let ty = model.ty(t);
                        ListingEntry {
                            kind: ty.kind,
                            name: ty.display_name(),
                            href: self
                                .resolver
                                .layout()
                                .location(t)
                                .map(|l| self.href(l))
                                .unwrap_or_default(),
                            summary: ty.docs.summary.clone(),
                        }
                    })
                    .collect();
                let namespace = NamespaceView {
                    name: ns.name.clone(),
                    summary: ns.summary.clone(),
                    listing,
                    types: Vec::new(),
                };
                (PageKind::Namespace, vec![namespace])
            }
            UnitContent::Flat { sections, .. } => {
                let namespaces = sections
                    .iter()
                    .map(|(ns_id, types)| {
                        let ns = model.namespace(*ns_id);
                        NamespaceView {
                            name: ns.name.clone(),
                            summary: ns.summary.clone(),
                            listing: Vec::new(),
                            types: types.iter().flat_map(|t| self.type_tree(*t)).collect(),
                        }
                    })
                    .collect();
                (PageKind::Flat, namespaces)
            }
        };
        PageView {
            path: plan.path.clone(),
            title: plan.title.clone(),
            kind,
            namespaces,
        }
    }

    fn href(&self, location: &Location) -> String {
        match self.links {
            LinkStyle::Relative => relative_href(self.page, location),
            LinkStyle::Route => route(location),
        }
    }

    /// A type followed by its nested types, depth first.
    fn type_tree(&self, id: TypeId) -> Vec<TypeView> {
        let mut out = vec![self.type_view(id)];
        for &nested in &self.resolver.model().ty(id).nested_types {
            out.extend(self.type_tree(nested));
        }
        out
    }

    fn type_view(&self, id: TypeId) -> TypeView {
        let model = self.resolver.model();
        let ty = model.ty(id);
        let members = MemberKind::ALL
            .into_iter()
            .filter(|k| !ty.members.of(*k).is_empty())
            .map(|kind| MemberGroupView {
                kind,
                members: ty.members.of(kind).iter().map(|m| self.member_view(*m)).collect(),
            })
            .collect();
        TypeView {
            uid: ty.key.to_string(),
            name: model.type_display_path(id),
            title: display_title(model, Node::Type(id)),
            kind: ty.kind,
            anchor: self.resolver.layout().location(id).and_then(|l| l.anchor.clone()),
            namespace: model.namespace(ty.namespace).name.clone(),
            assembly: model.assembly(ty.assembly).name.clone(),
            signature: signature::type_signature(model, id),
            base_type: ty.base_type.as_ref().map(|r| self.reference(r)),
            interfaces: ty.interfaces.iter().map(|r| self.reference(r)).collect(),
            docs: self.docs(&ty.docs),
            members,
            provider_symbol: ty.provider_symbol.clone(),
        }
    }

    fn member_view(&self, id: MemberId) -> MemberView {
        let model = self.resolver.model();
        let member = model.member(id);
        let name = if member.kind == MemberKind::Constructor {
            let params: Vec<String> = member.parameters.iter().map(|p| p.ty.to_string()).collect();
            format!("{}({})", model.ty(member.owner).name, params.join(", "))
        } else {
            member.display_name()
        };
        MemberView {
            name,
            kind: member.kind,
            anchor: self.resolver.layout().member_location(id).and_then(|l| l.anchor.clone()),
            signature: signature::member_signature(model, id),
            return_type: member.return_type.as_ref().map(|r| self.reference(r)),
            parameters: member
                .parameters
                .iter()
                .map(|p| ParamView {
                    name: p.name.clone(),
                    ty: self.reference(&p.ty),
                    modifier: p.modifier,
                    optional: p.optional,
                    default_value: p.default_value.clone(),
                })
                .collect(),
            docs: self.docs(&member.docs),
            provider_symbol: member.provider_symbol.clone(),
        }
    }

    fn docs(&self, docs: &DocSections) -> DocsView {
        DocsView {
            summary: docs.summary.clone(),
            remarks: docs.remarks.clone(),
            type_parameters: docs.type_parameters.clone(),
            parameters: docs.parameters.clone(),
            returns: docs.returns.clone(),
            exceptions: docs
                .exceptions
                .iter()
                .map(|e| ExceptionView {
                    ty: self.reference(&e.ty),
                    condition: e.condition.clone(),
                })
                .collect(),
            examples: docs.examples.clone(),
            see_also: docs.see_also.iter().map(|s| self.see_also(s)).collect(),
        }
    }

    fn see_also(&self, entry: &SeeAlso) -> LinkView {
        match entry {
            SeeAlso::Type { reference, member } => {
                let resolution = match member {
                    Some(member) => self.resolver.resolve_member(reference, member),
                    None => self.resolver.resolve(reference),
                };
                LinkView {
                    text: resolution.display().render("<", ">"),
                    href: self.target(&resolution),
                }
            }
            SeeAlso::Url { url, text } => LinkView {
                text: text.clone().unwrap_or_else(|| url.clone()),
                href: Some(url.clone()),
            },
        }
    }

    fn reference(&self, r: &TypeReference) -> RefView {
        self.ref_view(&self.resolver.resolve(r))
    }

    fn target(&self, resolution: &Resolution) -> Option<String> {
        match resolution {
            Resolution::InternalAnchor { target, .. } => Some(self.href(target)),
            Resolution::ExternalUrl { url, .. } => Some(url.clone()),
            Resolution::Unresolved { .. } => None,
        }
    }

    fn ref_view(&self, resolution: &Resolution) -> RefView {
        let display = resolution.display();
        RefView {
            display: display.render("<", ">"),
            name: display.name.clone(),
            href: self.target(resolution),
            resolution: match resolution {
                Resolution::InternalAnchor { .. } => RefKind::Internal,
                Resolution::ExternalUrl { .. } => RefKind::External,
                Resolution::Unresolved { .. } => RefKind::Unresolved,
            },
            args: display.args.iter().map(|a| self.ref_view(a)).collect(),
            suffix: display.suffix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_strips_extension() {
        let loc = Location {
            path: "Acme/Widgets/Gadget.mdx".to_string(),
            anchor: Some("gadget--spin".to_string()),
        };
        assert_eq!(route(&loc), "/Acme/Widgets/Gadget#gadget--spin");
        let flat = Location {
            path: "Acme.Widgets.mdx".to_string(),
            anchor: None,
        };
        assert_eq!(route(&flat), "/Acme.Widgets");
    }

    #[test]
    fn compose_links_each_part() {
        let arg = RefView {
            display: "Blob".to_string(),
            name: "Blob".to_string(),
            href: None,
            resolution: RefKind::Unresolved,
            args: Vec::new(),
            suffix: String::new(),
        };
        let outer = RefView {
            display: "Cache<Blob>[]".to_string(),
            name: "Cache".to_string(),
            href: Some("Cache-1.md".to_string()),
            resolution: RefKind::Internal,
            args: vec![arg],
            suffix: "[]".to_string(),
        };
        let text = outer.compose("[", "]", &|r| match &r.href {
            Some(href) => format!("({}→{})", r.name, href),
            None => r.name.clone(),
        });
        assert_eq!(text, "(Cache→Cache-1.md)[Blob][]");
    }
}
