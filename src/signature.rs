//! C#-style declaration text for Syntax sections.
//!
//! Derived purely from symbol facts, so an undocumented type or member still
//! gets a non-empty Syntax block.

use crate::model::typeref::{Qualifier, TypeReference};
use crate::model::*;

/// Framework types spelled with their C# keyword.
fn keyword(r: &TypeReference) -> Option<&'static str> {
    if r.namespace != "System" || !r.outer.is_empty() || !r.generic_args.is_empty() {
        return None;
    }
    Some(match r.name.as_str() {
        "Boolean" => "bool",
        "Byte" => "byte",
        "SByte" => "sbyte",
        "Char" => "char",
        "Decimal" => "decimal",
        "Double" => "double",
        "Single" => "float",
        "Int16" => "short",
        "UInt16" => "ushort",
        "Int32" => "int",
        "UInt32" => "uint",
        "Int64" => "long",
        "UInt64" => "ulong",
        "IntPtr" => "nint",
        "UIntPtr" => "nuint",
        "Object" => "object",
        "String" => "string",
        "Void" => "void",
        _ => return None,
    })
}

/// Source-level spelling of a type reference: `int`, `List<string>`,
/// `int?`, `Gadget[]`, `ref Span<byte>`.
pub fn type_name(r: &TypeReference) -> String {
    if r.namespace == "System" && r.name == "Nullable" && r.generic_args.len() == 1 {
        let mut inner = type_name(&r.generic_args[0]);
        inner.push('?');
        return inner;
    }

    let mut out = match keyword(r) {
        Some(k) => k.to_string(),
        None => {
            let mut name = r.nested_name();
            if !r.generic_args.is_empty() {
                let args: Vec<String> = r.generic_args.iter().map(type_name).collect();
                name.push('<');
                name.push_str(&args.join(", "));
                name.push('>');
            }
            name
        }
    };
    if r.array_rank > 0 {
        out.push('[');
        out.push_str(&",".repeat(usize::from(r.array_rank) - 1));
        out.push(']');
    }
    match r.qualifier {
        Qualifier::None => out,
        Qualifier::Nullable => out + "?",
        Qualifier::ByRef => format!("ref {}", out),
    }
}

fn generics(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

fn modifier_words(m: &Modifiers) -> Vec<&'static str> {
    let mut words = Vec::new();
    if m.is_const {
        words.push("const");
    } else if m.is_static {
        words.push("static");
    }
    if m.is_abstract {
        words.push("abstract");
    }
    if m.is_virtual {
        words.push("virtual");
    }
    if m.is_sealed {
        words.push("sealed");
    }
    if m.is_override {
        words.push("override");
    }
    if m.is_readonly {
        words.push("readonly");
    }
    words
}

/// Base types every type of a kind implicitly has; omitted from the
/// declaration.
fn implicit_base(kind: TypeKind, r: &TypeReference) -> bool {
    if r.namespace != "System" {
        return false;
    }
    matches!(
        (kind, r.name.as_str()),
        (TypeKind::Class, "Object")
            | (TypeKind::Struct, "ValueType")
            | (TypeKind::Enum, "Enum")
            | (TypeKind::Delegate, "MulticastDelegate")
            | (TypeKind::Delegate, "Delegate")
    )
}

pub fn parameter_list(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| {
            let mut out = String::new();
            match p.modifier {
                ParamModifier::None => {}
                ParamModifier::Ref => out.push_str("ref "),
                ParamModifier::Out => out.push_str("out "),
                ParamModifier::In => out.push_str("in "),
                ParamModifier::Params => out.push_str("params "),
            }
            let ty = if p.modifier != ParamModifier::None && p.ty.qualifier == Qualifier::ByRef {
                type_name(&TypeReference {
                    qualifier: Qualifier::None,
                    ..p.ty.clone()
                })
            } else {
                type_name(&p.ty)
            };
            out.push_str(&ty);
            out.push(' ');
            out.push_str(&p.name);
            if let Some(default) = &p.default_value {
                out.push_str(" = ");
                out.push_str(default);
            } else if p.optional {
                out.push_str(" = default");
            }
            out
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn type_signature(model: &DocModel, id: TypeId) -> String {
    let ty = model.ty(id);
    let mut words: Vec<String> = vec![ty.accessibility.keyword().to_string()];

    if ty.kind == TypeKind::Delegate {
        let invoke = ty
            .members
            .iter()
            .map(|m| model.member(m))
            .find(|m| m.name == "Invoke");
        let ret = invoke
            .and_then(|m| m.return_type.as_ref())
            .map(type_name)
            .unwrap_or_else(|| "void".to_string());
        let params = invoke.map(|m| parameter_list(&m.parameters)).unwrap_or_default();
        words.push("delegate".to_string());
        words.push(ret);
        words.push(format!("{}{}({})", ty.name, generics(&ty.generic_parameters), params));
        return words.join(" ") + ";";
    }

    let mut modifiers = ty.modifiers;
    if ty.kind != TypeKind::Class {
        // Interfaces are implicitly abstract, structs and enums sealed.
        modifiers.is_abstract = false;
        modifiers.is_sealed = false;
    }
    if modifiers.is_static {
        modifiers.is_abstract = false;
        modifiers.is_sealed = false;
    }
    words.extend(modifier_words(&modifiers).into_iter().map(str::to_string));
    words.push(ty.kind.keyword().to_string());
    words.push(format!("{}{}", ty.name, generics(&ty.generic_parameters)));

    let mut bases: Vec<String> = Vec::new();
    if let Some(base) = ty.base_type.as_ref().filter(|b| !implicit_base(ty.kind, b)) {
        bases.push(type_name(base));
    }
    bases.extend(ty.interfaces.iter().map(type_name));

    let mut out = words.join(" ");
    if !bases.is_empty() {
        out.push_str(" : ");
        out.push_str(&bases.join(", "));
    }
    out
}

pub fn member_signature(model: &DocModel, id: MemberId) -> String {
    let member = model.member(id);
    let owner = model.ty(member.owner);
    let mut words: Vec<String> = Vec::new();
    if owner.kind != TypeKind::Interface {
        words.push(member.accessibility.keyword().to_string());
    }
    let mut modifiers = member.modifiers;
    if member.kind == MemberKind::Property {
        // Readonly is expressed through the accessor list.
        modifiers.is_readonly = false;
    }
    words.extend(modifier_words(&modifiers).into_iter().map(str::to_string));

    let ret = || {
        member
            .return_type
            .as_ref()
            .map(type_name)
            .unwrap_or_else(|| "void".to_string())
    };

    match member.kind {
        MemberKind::Constructor => {
            words.push(format!("{}({})", owner.name, parameter_list(&member.parameters)));
            words.join(" ") + ";"
        }
        MemberKind::Method => {
            words.push(ret());
            words.push(format!(
                "{}{}({})",
                member.name,
                generics(&member.generic_parameters),
                parameter_list(&member.parameters)
            ));
            words.join(" ") + ";"
        }
        MemberKind::Property => {
            words.push(ret());
            if member.parameters.is_empty() {
                words.push(member.name.clone());
            } else {
                words.push(format!("this[{}]", parameter_list(&member.parameters)));
            }
            let accessors = if member.modifiers.is_readonly {
                "{ get; }"
            } else {
                "{ get; set; }"
            };
            words.push(accessors.to_string());
            words.join(" ")
        }
        MemberKind::Event => {
            words.push("event".to_string());
            words.push(ret());
            words.push(member.name.clone());
            words.join(" ") + ";"
        }
        MemberKind::Field => {
            words.push(ret());
            words.push(member.name.clone());
            words.join(" ") + ";"
        }
    }
}
