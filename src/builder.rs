//! Documentation model builder: merge N assemblies' facts into one graph.
//!
//! Two passes. Staging walks the assemblies in the order supplied and
//! decides, per type key, which definition survives ([`MergeOutcome`]).
//! Materialization then allocates arena ids for the survivors, attaches
//! members and nested types, and marks base/interface references whose
//! target is documented.

use crate::error::{DocError, Result, Warning};
use crate::facts::{AssemblyFacts, CommentFacts, TypeFacts};
use crate::model::comment::DocSections;
use crate::model::typeref::{RefOrigin, TypeReference, TypeSegment};
use crate::model::*;
use crate::xmldoc;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What happened to an incoming type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First definition of this key.
    Inserted,
    /// Incoming definition is a type-forward; the existing one stays.
    Kept,
    /// Existing definition was a type-forward and has been replaced.
    Replaced,
    /// Two real definitions; the incoming one wins and a warning is recorded.
    ReplacedWithWarning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRecord {
    pub key: TypeKey,
    pub assembly: String,
    pub outcome: MergeOutcome,
}

/// Everything recoverable the build observed.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub warnings: Vec<Warning>,
    pub merges: Vec<MergeRecord>,
}

/// Merge assemblies in the order supplied.
pub fn build(assemblies: &[AssemblyFacts]) -> Result<(DocModel, Vec<Warning>)> {
    let (model, report) = build_with_report(assemblies)?;
    Ok((model, report.warnings))
}

/// Like [`build`] but also returns the per-type merge log.
pub fn build_with_report(assemblies: &[AssemblyFacts]) -> Result<(DocModel, BuildReport)> {
    for facts in assemblies {
        validate(facts)?;
    }

    let mut report = BuildReport::default();
    let staging = stage(assemblies, &mut report);
    let model = materialize(assemblies, staging, &mut report);

    info!(
        assemblies = assemblies.len(),
        namespaces = model.namespaces.len(),
        types = model.types.len(),
        members = model.members.len(),
        warnings = report.warnings.len(),
        "documentation model built"
    );
    Ok((model, report))
}

// -- Validation ---------------------------------------------------------------

fn invalid(facts: &AssemblyFacts, reason: String) -> DocError {
    DocError::InvalidFacts {
        assembly: facts.name.clone(),
        reason,
    }
}

fn validate(facts: &AssemblyFacts) -> Result<()> {
    let count = facts.types.len();
    for (i, ty) in facts.types.iter().enumerate() {
        if ty.name.trim().is_empty() {
            return Err(invalid(facts, format!("type #{} has an empty name", i)));
        }
        // Walk the declaring chain: indices must exist and never loop back.
        let mut current = ty.declaring_type;
        let mut steps = 0;
        while let Some(parent) = current {
            if parent >= count {
                return Err(invalid(
                    facts,
                    format!(
                        "type '{}' declares nonexistent declaring type #{}",
                        ty.name, parent
                    ),
                ));
            }
            steps += 1;
            if parent == i || steps > count {
                return Err(invalid(
                    facts,
                    format!("type '{}' is nested inside itself", ty.name),
                ));
            }
            current = facts.types[parent].declaring_type;
        }
    }
    for member in &facts.members {
        if member.owner >= count {
            return Err(invalid(
                facts,
                format!(
                    "member '{}' references nonexistent owning type #{}",
                    member.name, member.owner
                ),
            ));
        }
    }
    Ok(())
}

// -- Staging ------------------------------------------------------------------

/// Surviving definition for one type key.
struct Slot {
    key: TypeKey,
    parent: Option<TypeKey>,
    namespace: String,
    assembly: usize,
    index: usize,
}

#[derive(Default)]
struct Staging {
    slots: Vec<Slot>,
    by_key: HashMap<TypeKey, usize>,
    namespace_order: Vec<String>,
    /// Top-level slots per namespace, first-seen order.
    namespace_types: HashMap<String, Vec<usize>>,
    namespace_summaries: HashMap<String, String>,
    /// Namespaces each assembly touched, first-seen order.
    assembly_namespaces: Vec<Vec<String>>,
}

impl Staging {
    fn touch_namespace(&mut self, assembly: usize, name: &str) {
        if !self.namespace_types.contains_key(name) {
            self.namespace_order.push(name.to_string());
            self.namespace_types.insert(name.to_string(), Vec::new());
        }
        let touched = &mut self.assembly_namespaces[assembly];
        if !touched.iter().any(|n| n == name) {
            touched.push(name.to_string());
        }
    }
}

fn segment(ty: &TypeFacts) -> TypeSegment {
    TypeSegment::new(ty.name.clone(), ty.generic_parameters.len())
}

/// Key of a type in its assembly: namespace of the outermost declaring
/// type, then name and arity of every type down the declaring chain.
fn key_of(facts: &AssemblyFacts, index: usize) -> TypeKey {
    let ty = &facts.types[index];
    let mut path = vec![segment(ty)];
    let mut root = ty;
    while let Some(parent) = root.declaring_type {
        root = &facts.types[parent];
        path.push(segment(root));
    }
    path.reverse();
    TypeKey::new(root.namespace.clone(), path)
}

fn stage(assemblies: &[AssemblyFacts], report: &mut BuildReport) -> Staging {
    let mut staging = Staging {
        assembly_namespaces: vec![Vec::new(); assemblies.len()],
        ..Default::default()
    };

    for (a, facts) in assemblies.iter().enumerate() {
        for ns in &facts.namespaces {
            staging.touch_namespace(a, &ns.name);
            if let Some(summary) = ns.summary.as_ref().filter(|s| !s.trim().is_empty()) {
                staging
                    .namespace_summaries
                    .entry(ns.name.clone())
                    .or_insert_with(|| summary.clone());
            }
        }

        for (t, ty) in facts.types.iter().enumerate() {
            let key = key_of(facts, t);
            let parent = ty.declaring_type.map(|p| key_of(facts, p));
            let outcome = match staging.by_key.get(&key).copied() {
                None => {
                    let slot = staging.slots.len();
                    staging.touch_namespace(a, &key.namespace);
                    if parent.is_none() {
                        if let Some(list) = staging.namespace_types.get_mut(&key.namespace) {
                            list.push(slot);
                        }
                    }
                    staging.slots.push(Slot {
                        key: key.clone(),
                        parent,
                        namespace: key.namespace.clone(),
                        assembly: a,
                        index: t,
                    });
                    staging.by_key.insert(key.clone(), slot);
                    MergeOutcome::Inserted
                }
                Some(slot) => {
                    let existing = &assemblies[staging.slots[slot].assembly].types
                        [staging.slots[slot].index];
                    let outcome = merge_outcome(existing, ty);
                    if outcome == MergeOutcome::ReplacedWithWarning {
                        let previous = assemblies[staging.slots[slot].assembly].name.clone();
                        warn!(
                            key = %key,
                            previous = %previous,
                            incoming = %facts.name,
                            "type redefined across assemblies, keeping the later definition"
                        );
                        report.warnings.push(Warning::MergeConflict {
                            key: key.to_string(),
                            previous,
                            incoming: facts.name.clone(),
                        });
                    }
                    if outcome != MergeOutcome::Kept {
                        staging.touch_namespace(a, &key.namespace);
                        let entry = &mut staging.slots[slot];
                        entry.assembly = a;
                        entry.index = t;
                    }
                    outcome
                }
            };
            debug!(key = %key, assembly = %facts.name, ?outcome, "merged type");
            report.merges.push(MergeRecord {
                key,
                assembly: facts.name.clone(),
                outcome,
            });
        }
    }
    staging
}

fn merge_outcome(existing: &TypeFacts, incoming: &TypeFacts) -> MergeOutcome {
    match (existing.forwarded, incoming.forwarded) {
        (_, true) => MergeOutcome::Kept,
        (true, false) => MergeOutcome::Replaced,
        (false, false) => MergeOutcome::ReplacedWithWarning,
    }
}

// -- Materialization ----------------------------------------------------------

fn materialize(assemblies: &[AssemblyFacts], staging: Staging, report: &mut BuildReport) -> DocModel {
    let mut model = DocModel::default();

    for name in &staging.namespace_order {
        let id = NamespaceId(model.namespaces.len());
        model.namespaces.push(NamespaceDoc {
            name: name.clone(),
            summary: staging.namespace_summaries.get(name).cloned(),
            types: Vec::new(),
            assemblies: Vec::new(),
        });
        model.namespace_index.insert(name.clone(), id);
    }

    for (a, facts) in assemblies.iter().enumerate() {
        let id = AssemblyId(a);
        let namespaces: Vec<NamespaceId> = staging.assembly_namespaces[a]
            .iter()
            .filter_map(|n| model.namespace_index.get(n).copied())
            .collect();
        for ns in &namespaces {
            model.namespaces[ns.0].assemblies.push(id);
        }
        model.assemblies.push(AssemblyDoc {
            name: facts.name.clone(),
            version: facts.version.clone(),
            namespaces,
        });
    }

    // Member indices per (assembly, owning type), declaration order.
    let members_by_owner: Vec<HashMap<usize, Vec<usize>>> = assemblies
        .iter()
        .map(|facts| {
            let mut map: HashMap<usize, Vec<usize>> = HashMap::new();
            for (m, member) in facts.members.iter().enumerate() {
                map.entry(member.owner).or_default().push(m);
            }
            map
        })
        .collect();

    // Slot n becomes TypeId(n).
    for (s, slot) in staging.slots.iter().enumerate() {
        let facts = &assemblies[slot.assembly];
        let ty = &facts.types[slot.index];
        let type_id = TypeId(s);
        let docs = comment_sections(&ty.documentation, &slot.key.to_string(), report);

        let mut members = MemberLists::default();
        for &m in members_by_owner[slot.assembly]
            .get(&slot.index)
            .map(Vec::as_slice)
            .unwrap_or_default()
        {
            let fact = &facts.members[m];
            let target = format!("{}.{}", slot.key, fact.name);
            let member_id = MemberId(model.members.len());
            model.members.push(MemberDoc {
                kind: fact.kind,
                name: fact.name.clone(),
                owner: type_id,
                accessibility: fact.accessibility,
                modifiers: fact.modifiers,
                generic_parameters: fact.generic_parameters.clone(),
                return_type: fact.return_type.clone(),
                parameters: fact
                    .parameters
                    .iter()
                    .map(|p| Parameter {
                        name: p.name.clone(),
                        ty: p.ty.clone(),
                        optional: p.optional,
                        default_value: p.default_value.clone(),
                        modifier: p.modifier,
                    })
                    .collect(),
                docs: comment_sections(&fact.documentation, &target, report),
                provider_symbol: fact.provider_symbol.clone(),
            });
            members.push(fact.kind, member_id);
        }

        let namespace = model.namespace_index[&slot.namespace];
        model.types.push(TypeDoc {
            key: slot.key.clone(),
            kind: ty.kind,
            name: ty.name.clone(),
            namespace,
            assembly: AssemblyId(slot.assembly),
            accessibility: ty.accessibility,
            modifiers: ty.modifiers,
            generic_parameters: ty.generic_parameters.clone(),
            base_type: ty.base_type.clone(),
            interfaces: ty.interfaces.clone(),
            members,
            docs,
            declaring_type: None,
            nested_types: Vec::new(),
            provider_symbol: ty.provider_symbol.clone(),
        });
        model.type_index.insert(slot.key.clone(), type_id);
        model
            .qualified_index
            .entry(slot.key.to_string())
            .or_insert(type_id);
    }

    for name in &staging.namespace_order {
        let ns = model.namespace_index[name];
        model.namespaces[ns.0].types = staging.namespace_types[name].iter().map(|&s| TypeId(s)).collect();
    }

    for (s, slot) in staging.slots.iter().enumerate() {
        let Some(parent_key) = &slot.parent else {
            continue;
        };
        if let Some(&parent) = staging.by_key.get(parent_key) {
            model.types[s].declaring_type = Some(TypeId(parent));
            model.types[parent].nested_types.push(TypeId(s));
        }
    }

    mark_origins(&mut model);
    model
}

fn comment_sections(
    comment: &Option<CommentFacts>,
    target: &str,
    report: &mut BuildReport,
) -> DocSections {
    let reason = match comment {
        None => return DocSections::default(),
        Some(CommentFacts::Sections(sections)) => return sections.clone(),
        Some(CommentFacts::Xml { xml }) => match xmldoc::parse(xml) {
            Ok(sections) => return sections,
            Err(e) => e.to_string(),
        },
        Some(CommentFacts::Unreadable { reason }) => reason.clone(),
    };
    warn!(target = %target, error = %reason, "malformed documentation comment");
    report.warnings.push(Warning::MalformedDocumentation {
        target: target.to_string(),
        reason,
    });
    DocSections::default()
}

/// Flag base/interface and signature references as internal when the
/// merged model documents their target.
fn mark_origins(model: &mut DocModel) {
    let types: Vec<(Option<TypeReference>, Vec<TypeReference>)> = model
        .types
        .iter()
        .map(|t| {
            (
                t.base_type.clone().map(|r| marked(model, r)),
                t.interfaces.iter().cloned().map(|r| marked(model, r)).collect(),
            )
        })
        .collect();
    for (ty, (base, interfaces)) in model.types.iter_mut().zip(types) {
        ty.base_type = base;
        ty.interfaces = interfaces;
    }

    let members: Vec<(Option<TypeReference>, Vec<TypeReference>)> = model
        .members
        .iter()
        .map(|m| {
            (
                m.return_type.clone().map(|r| marked(model, r)),
                m.parameters.iter().map(|p| marked(model, p.ty.clone())).collect(),
            )
        })
        .collect();
    for (member, (ret, params)) in model.members.iter_mut().zip(members) {
        member.return_type = ret;
        for (param, ty) in member.parameters.iter_mut().zip(params) {
            param.ty = ty;
        }
    }
}

fn marked(model: &DocModel, mut r: TypeReference) -> TypeReference {
    r.origin = if r.generic_parameter {
        RefOrigin::Unknown
    } else if model.find_type(&r).is_some() {
        RefOrigin::Internal
    } else {
        RefOrigin::External
    };
    r.generic_args = std::mem::take(&mut r.generic_args)
        .into_iter()
        .map(|arg| marked(model, arg))
        .collect();
    r
}
