//! Path and naming strategy.
//!
//! Maps every type of a frozen [`DocModel`] to an output location and every
//! member to an anchor, under one of two layouts:
//!
//! - **hierarchical**: one unit per top-level type at `A/B/C/Name.ext`
//!   (namespace segments become directories), plus optional `_index.ext`
//!   namespace overviews;
//! - **flat**: one unit per assembly (or per namespace) holding all of its
//!   types behind anchors.
//!
//! Nested types never get a unit of their own; they live inside their
//! outermost declaring type's unit behind a fragment.
//!
//! Anchors are spelled from the structured [`TypeKey`], never from display
//! names: `+` joins a declaring chain, `-N` carries a generic arity, `.`
//! joins namespace segments in flat units and `--` introduces a member.
//! None of those can come out of an identifier, so distinct keys get
//! distinct anchors.
//!
//! Paths the navigation manifest or namespace pages claim are reserved.
//! A unit that would land on one is renamed with a `-type`, `-assembly` or
//! `-namespace` suffix.
//!
//! The mapping is a pure function of the model. Two nodes landing on the same
//! location (compared case-insensitively) is a [`DocError::PathCollision`],
//! raised before anything is rendered.

use crate::error::{DocError, Result};
use crate::model::typeref::TypeSegment;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Stem of hierarchical namespace overview units.
pub const INDEX_STEM: &str = "_index";
/// Stem of the global namespace's unit in flat-by-namespace layouts.
pub const GLOBAL_STEM: &str = "global";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Flat,
    #[default]
    Hierarchical,
}

/// Granularity of a flat layout's units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlatScope {
    #[default]
    Assembly,
    Namespace,
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub mode: LayoutMode,
    pub flat_scope: FlatScope,
    /// File extension of every unit, without the dot.
    pub extension: String,
    /// Emit `_index` overview units per namespace (hierarchical only).
    pub namespace_pages: bool,
    /// Root-relative paths no unit may take, e.g. the navigation manifest.
    pub reserved: Vec<String>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Hierarchical,
            flat_scope: FlatScope::Assembly,
            extension: "md".to_string(),
            namespace_pages: true,
            reserved: vec!["SUMMARY.md".to_string()],
        }
    }
}

impl LayoutOptions {
    /// Whether `path` is reserved, compared case-insensitively.
    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved.iter().any(|r| r.eq_ignore_ascii_case(path))
    }
}

/// Where a node lives: a unit path relative to the output root, plus an
/// optional fragment inside that unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub path: String,
    pub anchor: Option<String>,
}

impl Location {
    /// `path#anchor`, relative to the output root.
    pub fn href(&self) -> String {
        match &self.anchor {
            Some(anchor) => format!("{}#{}", self.path, anchor),
            None => self.path.clone(),
        }
    }
}

/// What a unit renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitContent {
    /// A single top-level type (and its nested types).
    Type(TypeId),
    /// Overview of one namespace.
    Namespace(NamespaceId),
    /// Several types grouped by namespace, each behind its own anchor.
    Flat {
        assembly: Option<AssemblyId>,
        sections: Vec<(NamespaceId, Vec<TypeId>)>,
    },
}

#[derive(Debug, Clone)]
pub struct UnitPlan {
    pub path: String,
    pub title: String,
    pub content: UnitContent,
}

/// Any node that can be given a display title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Assembly(AssemblyId),
    Namespace(NamespaceId),
    Type(TypeId),
    Member(MemberId),
}

// -- Navigation ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub groups: Vec<NavGroup>,
    /// Every unit of the run, sorted by path.
    pub units: Vec<NavUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavGroup {
    pub namespace: String,
    /// Namespace overview unit, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub entries: Vec<NavEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub title: String,
    pub path: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavUnit {
    pub path: String,
    pub title: String,
}

// -- Layout -------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Layout {
    options: LayoutOptions,
    units: Vec<UnitPlan>,
    types: HashMap<TypeId, Location>,
    members: HashMap<MemberId, Location>,
    namespaces: HashMap<NamespaceId, Location>,
    navigation: Navigation,
}

impl Layout {
    pub fn build(model: &DocModel, options: &LayoutOptions) -> Result<Layout> {
        let mut layout = Layout {
            options: options.clone(),
            units: Vec::new(),
            types: HashMap::new(),
            members: HashMap::new(),
            namespaces: HashMap::new(),
            navigation: Navigation {
                groups: Vec::new(),
                units: Vec::new(),
            },
        };

        match options.mode {
            LayoutMode::Hierarchical => layout.plan_hierarchical(model),
            LayoutMode::Flat => layout.plan_flat(model),
        }
        layout.place_members(model);
        layout.units.sort_by(|a, b| a.path.cmp(&b.path));
        layout.check_collisions(model)?;
        layout.navigation = layout.build_navigation(model);
        Ok(layout)
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn units(&self) -> &[UnitPlan] {
        &self.units
    }

    pub fn location(&self, id: TypeId) -> Option<&Location> {
        self.types.get(&id)
    }

    pub fn member_location(&self, id: MemberId) -> Option<&Location> {
        self.members.get(&id)
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    /// Type → href mapping, ordered by type key, for inspection and tests.
    pub fn type_paths(&self, model: &DocModel) -> BTreeMap<String, String> {
        self.types
            .iter()
            .map(|(id, loc)| (model.ty(*id).key.to_string(), loc.href()))
            .collect()
    }

    fn file(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.options.extension)
    }

    /// `dir/stem.ext`, or `dir/stem-escape.ext` when that path is reserved
    /// or the stem is one of `taken`.
    fn unit_path(&self, dir: &str, stem: &str, escape: &str, taken: &[&str]) -> String {
        let path = join(dir, &self.file(stem));
        if self.options.is_reserved(&path) || taken.iter().any(|t| t.eq_ignore_ascii_case(stem)) {
            join(dir, &self.file(&format!("{}-{}", stem, escape)))
        } else {
            path
        }
    }

    fn anchor_for(&self, key: &TypeKey) -> String {
        match self.options.mode {
            LayoutMode::Hierarchical => type_anchor(key),
            LayoutMode::Flat => flat_anchor(key),
        }
    }

    fn plan_hierarchical(&mut self, model: &DocModel) {
        for (ns_id, ns) in model.namespaces() {
            let dir = namespace_dir(&ns.name);

            // Simple names shared by several types get an arity suffix.
            let mut by_name: HashMap<&str, usize> = HashMap::new();
            for t in &ns.types {
                *by_name.entry(model.ty(*t).name.as_str()).or_default() += 1;
            }

            for &t in &ns.types {
                let ty = model.ty(t);
                let stem = if by_name[ty.name.as_str()] > 1 && ty.key.arity() > 0 {
                    format!("{}-{}", sanitize(&ty.name), ty.key.arity())
                } else {
                    sanitize(&ty.name)
                };
                let path = self.unit_path(&dir, &stem, "type", &[INDEX_STEM]);
                self.types.insert(
                    t,
                    Location {
                        path: path.clone(),
                        anchor: None,
                    },
                );
                self.place_nested(model, t, &path);
                self.units.push(UnitPlan {
                    path,
                    title: display_title(model, Node::Type(t)),
                    content: UnitContent::Type(t),
                });
            }

            if self.options.namespace_pages && !ns.types.is_empty() {
                let path = join(&dir, &self.file(INDEX_STEM));
                self.namespaces.insert(
                    ns_id,
                    Location {
                        path: path.clone(),
                        anchor: None,
                    },
                );
                self.units.push(UnitPlan {
                    path,
                    title: display_title(model, Node::Namespace(ns_id)),
                    content: UnitContent::Namespace(ns_id),
                });
            }
        }
    }

    fn plan_flat(&mut self, model: &DocModel) {
        let mut namespaces: Vec<(NamespaceId, &NamespaceDoc)> = model.namespaces().collect();
        namespaces.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        match self.options.flat_scope {
            FlatScope::Assembly => {
                for (asm_id, asm) in model.assemblies() {
                    let sections: Vec<(NamespaceId, Vec<TypeId>)> = namespaces
                        .iter()
                        .filter_map(|(ns_id, ns)| {
                            let types: Vec<TypeId> = sorted_types(model, &ns.types)
                                .into_iter()
                                .filter(|t| model.ty(*t).assembly == asm_id)
                                .collect();
                            (!types.is_empty()).then_some((*ns_id, types))
                        })
                        .collect();
                    if sections.is_empty() {
                        continue;
                    }
                    let path = self.unit_path("", &sanitize(&asm.name), "assembly", &[]);
                    self.place_flat(model, &path, &sections);
                    self.units.push(UnitPlan {
                        path,
                        title: display_title(model, Node::Assembly(asm_id)),
                        content: UnitContent::Flat {
                            assembly: Some(asm_id),
                            sections,
                        },
                    });
                }
            }
            FlatScope::Namespace => {
                for (ns_id, ns) in namespaces {
                    if ns.types.is_empty() {
                        continue;
                    }
                    let path = if ns.name.is_empty() {
                        self.unit_path("", GLOBAL_STEM, "namespace", &[])
                    } else {
                        self.unit_path("", &sanitize(&ns.name), "namespace", &[GLOBAL_STEM])
                    };
                    let sections = vec![(ns_id, sorted_types(model, &ns.types))];
                    self.namespaces.insert(
                        ns_id,
                        Location {
                            path: path.clone(),
                            anchor: None,
                        },
                    );
                    self.place_flat(model, &path, &sections);
                    self.units.push(UnitPlan {
                        path,
                        title: display_title(model, Node::Namespace(ns_id)),
                        content: UnitContent::Flat {
                            assembly: None,
                            sections,
                        },
                    });
                }
            }
        }
    }

    fn place_flat(&mut self, model: &DocModel, path: &str, sections: &[(NamespaceId, Vec<TypeId>)]) {
        for (_, types) in sections {
            for &t in types {
                self.types.insert(
                    t,
                    Location {
                        path: path.to_string(),
                        anchor: Some(flat_anchor(&model.ty(t).key)),
                    },
                );
                self.place_nested(model, t, path);
            }
        }
    }

    /// Nested types share the outer unit, each behind its own key's anchor.
    fn place_nested(&mut self, model: &DocModel, outer: TypeId, path: &str) {
        for &nested in &model.ty(outer).nested_types {
            self.types.insert(
                nested,
                Location {
                    path: path.to_string(),
                    anchor: Some(self.anchor_for(&model.ty(nested).key)),
                },
            );
            self.place_nested(model, nested, path);
        }
    }

    /// Member anchors: `{type}--{name}`, widened with parameter types for
    /// overloads, then with the first free ordinal if that still collides.
    fn place_members(&mut self, model: &DocModel) {
        let placed: Vec<(TypeId, Location)> = self.types.iter().map(|(id, loc)| (*id, loc.clone())).collect();
        for (type_id, loc) in placed {
            let ty = model.ty(type_id);
            let type_slug = loc.anchor.clone().unwrap_or_else(|| type_anchor(&ty.key));

            let mut name_counts: HashMap<&str, usize> = HashMap::new();
            for m in ty.members.iter() {
                *name_counts.entry(model.member(m).name.as_str()).or_default() += 1;
            }

            let mut taken: HashSet<String> = HashSet::new();
            for m in ty.members.iter() {
                let member = model.member(m);
                let mut base = slug(&member.name);
                if name_counts[member.name.as_str()] > 1 {
                    let params: Vec<String> = member.parameters.iter().map(|p| slug(&p.ty.name)).collect();
                    if !params.is_empty() {
                        base = format!("{}-{}", base, params.join("-"));
                    }
                }
                let mut part = base.clone();
                let mut ordinal = 1;
                while taken.contains(&part) {
                    ordinal += 1;
                    part = format!("{}-{}", base, ordinal);
                }
                taken.insert(part.clone());
                self.members.insert(
                    m,
                    Location {
                        path: loc.path.clone(),
                        anchor: Some(format!("{}--{}", type_slug, part)),
                    },
                );
            }
        }
    }

    fn check_collisions(&self, model: &DocModel) -> Result<()> {
        let mut seen: HashMap<(String, Option<String>), String> = self
            .options
            .reserved
            .iter()
            .map(|path| ((path.to_lowercase(), None), "navigation manifest".to_string()))
            .collect();
        let mut claim = |loc: &Location, owner: String| -> Result<()> {
            let key = (loc.path.to_lowercase(), loc.anchor.as_ref().map(|a| a.to_lowercase()));
            if let Some(first) = seen.get(&key) {
                return Err(DocError::PathCollision {
                    path: loc.href(),
                    first: first.clone(),
                    second: owner,
                });
            }
            seen.insert(key, owner);
            Ok(())
        };

        for unit in &self.units {
            let owner = match &unit.content {
                UnitContent::Type(t) => model.ty(*t).key.to_string(),
                UnitContent::Namespace(ns) => format!("namespace {}", model.namespace(*ns).name),
                UnitContent::Flat { .. } => unit.title.clone(),
            };
            claim(
                &Location {
                    path: unit.path.clone(),
                    anchor: None,
                },
                owner,
            )?;
        }

        let mut anchored: Vec<(&TypeId, &Location)> =
            self.types.iter().filter(|(_, l)| l.anchor.is_some()).collect();
        anchored.sort_by_key(|(id, _)| **id);
        for (id, loc) in anchored {
            claim(loc, model.ty(*id).key.to_string())?;
        }

        let mut members: Vec<(&MemberId, &Location)> = self.members.iter().collect();
        members.sort_by_key(|(id, _)| **id);
        for (id, loc) in members {
            let member = model.member(*id);
            claim(loc, format!("{}.{}", model.ty(member.owner).key, member.display_name()))?;
        }
        Ok(())
    }

    fn build_navigation(&self, model: &DocModel) -> Navigation {
        let mut namespaces: Vec<(NamespaceId, &NamespaceDoc)> =
            model.namespaces().filter(|(_, ns)| !ns.types.is_empty()).collect();
        namespaces.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        let groups = namespaces
            .into_iter()
            .map(|(ns_id, ns)| NavGroup {
                namespace: ns.name.clone(),
                index: self
                    .namespaces
                    .get(&ns_id)
                    .filter(|_| self.options.mode == LayoutMode::Hierarchical)
                    .map(|l| l.path.clone()),
                entries: sorted_types(model, &ns.types)
                    .into_iter()
                    .filter_map(|t| {
                        self.types.get(&t).map(|loc| NavEntry {
                            title: display_title(model, Node::Type(t)),
                            path: loc.href(),
                            kind: model.ty(t).kind,
                        })
                    })
                    .collect(),
            })
            .collect();

        let units = self
            .units
            .iter()
            .map(|u| NavUnit {
                path: u.path.clone(),
                title: u.title.clone(),
            })
            .collect();

        Navigation { groups, units }
    }
}

/// Types ordered by kind, then name, then arity. Independent of the order
/// assemblies were supplied in.
pub fn sorted_types(model: &DocModel, types: &[TypeId]) -> Vec<TypeId> {
    let mut sorted = types.to_vec();
    sorted.sort_by(|a, b| {
        let (ta, tb) = (model.ty(*a), model.ty(*b));
        (ta.kind, &ta.name, ta.key.arity(), &ta.key).cmp(&(tb.kind, &tb.name, tb.key.arity(), &tb.key))
    });
    sorted
}

/// Human-readable title for any node.
pub fn display_title(model: &DocModel, node: Node) -> String {
    match node {
        Node::Assembly(id) => {
            let asm = model.assembly(id);
            match &asm.version {
                Some(v) => format!("{} {}", asm.name, v),
                None => asm.name.clone(),
            }
        }
        Node::Namespace(id) => {
            let name = &model.namespace(id).name;
            if name.is_empty() {
                "Global Namespace".to_string()
            } else {
                format!("{} Namespace", name)
            }
        }
        Node::Type(id) => format!("{} {}", model.type_display_path(id), model.ty(id).kind.label()),
        Node::Member(id) => {
            let member = model.member(id);
            format!(
                "{}.{} {}",
                model.type_display_path(member.owner),
                member.display_name(),
                member.kind.label()
            )
        }
    }
}

/// Link from one unit to a location, relative to the linking unit.
pub fn relative_href(from: &str, to: &Location) -> String {
    if from == to.path {
        return match &to.anchor {
            Some(anchor) => format!("#{}", anchor),
            None => to.path.rsplit('/').next().unwrap_or(&to.path).to_string(),
        };
    }
    let from_dirs: Vec<&str> = from.split('/').collect();
    let from_dirs = &from_dirs[..from_dirs.len().saturating_sub(1)];
    let target: Vec<&str> = to.path.split('/').collect();
    let (target_dirs, file) = target.split_at(target.len().saturating_sub(1));

    let common = from_dirs
        .iter()
        .zip(target_dirs)
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = vec![".."; from_dirs.len() - common];
    parts.extend(&target_dirs[common..]);
    parts.extend(file);

    let mut href = parts.join("/");
    if let Some(anchor) = &to.anchor {
        href.push('#');
        href.push_str(anchor);
    }
    href
}

fn namespace_dir(namespace: &str) -> String {
    namespace
        .split('.')
        .filter(|s| !s.is_empty())
        .map(sanitize)
        .collect::<Vec<_>>()
        .join("/")
}

fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// Keep a path segment filesystem-safe.
fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// One identifier in anchor form: lowercase, anything outside
/// alphanumerics and `_` becomes `_`, so anchor separators stay free.
fn ident_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn segment_anchor(segment: &TypeSegment) -> String {
    match segment.arity {
        0 => ident_slug(&segment.name),
        n => format!("{}-{}", ident_slug(&segment.name), n),
    }
}

/// Anchor of a type within a unit that holds a single top-level type:
/// `cache-1+node`.
pub fn type_anchor(key: &TypeKey) -> String {
    key.path.iter().map(segment_anchor).collect::<Vec<_>>().join("+")
}

/// Anchor of a type within a unit holding several namespaces:
/// `acme.widgets.cache-1+node`, or just the type part for the global
/// namespace.
pub fn flat_anchor(key: &TypeKey) -> String {
    let mut parts: Vec<String> = key
        .namespace
        .split('.')
        .filter(|s| !s.is_empty())
        .map(ident_slug)
        .collect();
    parts.push(type_anchor(key));
    parts.join(".")
}

/// Member-name slug: lowercase alphanumerics, everything else collapses to
/// `-`.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}
