//! Mintlify MDX renderer.
//!
//! Markdown with YAML frontmatter, `<ParamField>`/`<ResponseField>` for
//! parameters and return values, `<Note>` for remarks and `<Warning>` for
//! exceptions. Links are routes (`/Acme/Widgets/Gadget#anchor`), the form
//! Mintlify resolves pages by. The manifest is a `docs.json` navigation
//! fragment.

use crate::error::{DocError, Result};
use crate::layout::Navigation;
use crate::model::{MemberKind, TypeKind};
use crate::render::*;
use serde_json::json;

pub struct MintlifyRenderer;

impl Renderer for MintlifyRenderer {
    fn format(&self) -> Format {
        Format::Mintlify
    }

    fn link_style(&self) -> LinkStyle {
        LinkStyle::Route
    }

    fn render_page(&self, page: &PageView) -> Result<String> {
        let description = page
            .namespaces
            .iter()
            .flat_map(|ns| ns.types.first().and_then(|t| t.docs.summary.as_ref()).or(ns.summary.as_ref()))
            .next();

        let mut out = frontmatter(&page.title, description.map(String::as_str));
        match page.kind {
            PageKind::Type => {
                for (i, ty) in page.namespaces.iter().flat_map(|ns| &ns.types).enumerate() {
                    // The page title already names the first type.
                    render_type(&mut out, ty, 2, i > 0);
                }
            }
            PageKind::Namespace => {
                for ns in &page.namespaces {
                    render_namespace_overview(&mut out, ns);
                }
            }
            PageKind::Flat => {
                for ns in &page.namespaces {
                    let title = if ns.name.is_empty() { "Global Namespace".to_string() } else { format!("{} Namespace", ns.name) };
                    out.push_str(&format!("## {}\n\n", title));
                    if let Some(summary) = &ns.summary {
                        out.push_str(&text(summary));
                        out.push_str("\n\n");
                    }
                    for ty in &ns.types {
                        render_type(&mut out, ty, 3, true);
                    }
                }
            }
        }
        while out.ends_with("\n\n") {
            out.pop();
        }
        Ok(out)
    }

    fn render_manifest(&self, navigation: &Navigation) -> Result<OutputUnit> {
        let groups: Vec<serde_json::Value> = navigation
            .groups
            .iter()
            .map(|group| {
                let mut pages: Vec<String> = Vec::new();
                let paths = group
                    .index
                    .iter()
                    .chain(group.entries.iter().map(|e| &e.path));
                for path in paths {
                    let page = page_route(path);
                    if !pages.contains(&page) {
                        pages.push(page);
                    }
                }
                json!({ "group": group_label(&group.namespace), "pages": pages })
            })
            .collect();
        let document = json!({ "navigation": { "groups": groups } });
        let mut content = serde_json::to_string_pretty(&document).map_err(|e| DocError::Serialize {
            path: self.format().manifest_path().to_string(),
            reason: e.to_string(),
        })?;
        content.push('\n');
        Ok(OutputUnit {
            path: self.format().manifest_path().to_string(),
            content: content.into_bytes(),
        })
    }
}

/// Navigation page id: extension and fragment dropped.
fn page_route(href: &str) -> String {
    let path = href.split('#').next().unwrap_or(href);
    path.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(path).to_string()
}

fn frontmatter(title: &str, description: Option<&str>) -> String {
    let mut out = String::from("---\n");
    out.push_str(&format!("title: {}\n", quote(title)));
    if let Some(description) = description {
        let first = description.lines().next().unwrap_or_default();
        out.push_str(&format!("description: {}\n", quote(first)));
    }
    out.push_str("---\n\n");
    out
}

/// Double-quoted YAML scalar.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Escape MDX-significant characters in prose, leaving code spans alone.
fn text(prose: &str) -> String {
    let mut out = String::with_capacity(prose.len());
    let mut in_code = false;
    for c in prose.chars() {
        if c == '`' {
            in_code = !in_code;
        }
        match c {
            '{' if !in_code => out.push_str("\\{"),
            '}' if !in_code => out.push_str("\\}"),
            '<' if !in_code => out.push_str("&lt;"),
            '>' if !in_code => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn reference(r: &RefView) -> String {
    r.compose("&lt;", "&gt;", &|part| match &part.href {
        Some(href) => format!("[{}]({})", part.name, href),
        None => part.name.clone(),
    })
}

fn heading(level: usize, title: &str) -> String {
    format!("{} {}\n\n", "#".repeat(level.min(6)), text(title))
}

fn code(out: &mut String, language: &str, body: &str) {
    out.push_str(&format!("```{}\n{}\n```\n\n", language, body));
}

fn render_type(out: &mut String, ty: &TypeView, level: usize, with_heading: bool) {
    if let Some(anchor) = &ty.anchor {
        out.push_str(&format!("<a id=\"{}\"></a>\n\n", anchor));
    }
    if with_heading {
        out.push_str(&heading(level, &ty.title));
    }
    let namespace = if ty.namespace.is_empty() { "(global)" } else { &ty.namespace };
    out.push_str(&format!("**Namespace:** `{}` · **Assembly:** `{}`\n\n", namespace, ty.assembly));

    if let Some(summary) = &ty.docs.summary {
        out.push_str(&text(summary));
        out.push_str("\n\n");
    }

    out.push_str(&heading(level, "Syntax"));
    code(out, "csharp", &ty.signature);
    if let Some(base) = &ty.base_type {
        out.push_str(&format!("**Inheritance:** {}\n\n", reference(base)));
    }
    if !ty.interfaces.is_empty() {
        let names: Vec<String> = ty.interfaces.iter().map(reference).collect();
        out.push_str(&format!("**Implements:** {}\n\n", names.join(", ")));
    }

    render_fields(out, &ty.docs, &[], None);
    if ty.kind == TypeKind::Delegate {
        if let Some(returns) = &ty.docs.returns {
            out.push_str(&format!("<ResponseField name=\"returns\">\n{}\n</ResponseField>\n\n", text(returns)));
        }
    }
    render_remarks(out, &ty.docs);

    for group in &ty.members {
        out.push_str(&heading(level, group.kind.plural()));
        for member in &group.members {
            render_member(out, member, level + 1);
        }
    }

    render_trailing(out, &ty.docs, level);
}

fn render_member(out: &mut String, member: &MemberView, level: usize) {
    if let Some(anchor) = &member.anchor {
        out.push_str(&format!("<a id=\"{}\"></a>\n\n", anchor));
    }
    out.push_str(&heading(level, &member.name));
    if let Some(summary) = &member.docs.summary {
        out.push_str(&text(summary));
        out.push_str("\n\n");
    }
    code(out, "csharp", &member.signature);

    let returns = meaningful_return(member).map(|r| (r, member.kind));
    render_fields(out, &member.docs, &member.parameters, returns);
    render_remarks(out, &member.docs);
    render_trailing(out, &member.docs, level + 1);
}

/// Type parameters, parameters and the return value as Mintlify fields.
fn render_fields(out: &mut String, docs: &DocsView, params: &[ParamView], returns: Option<(&RefView, MemberKind)>) {
    for tp in &docs.type_parameters {
        out.push_str(&format!(
            "<ParamField path=\"{}\" type=\"type parameter\">\n{}\n</ParamField>\n\n",
            attribute(&tp.name),
            text(&tp.description)
        ));
    }
    for row in parameter_rows(params, docs) {
        let ty = row.ty.map(|t| format!(" type=\"{}\"", attribute(&t.display))).unwrap_or_default();
        let required = if params.iter().any(|p| p.name == row.name && !p.optional) {
            " required"
        } else {
            ""
        };
        out.push_str(&format!("<ParamField path=\"{}\"{}{}>\n", attribute(row.name), ty, required));
        if let Some(description) = row.description {
            out.push_str(&text(description));
            out.push('\n');
        }
        out.push_str("</ParamField>\n\n");
    }
    if let Some((ret, kind)) = returns {
        let name = match kind {
            MemberKind::Property | MemberKind::Field => "value",
            MemberKind::Event => "handler",
            MemberKind::Method | MemberKind::Constructor => "returns",
        };
        out.push_str(&format!(
            "<ResponseField name=\"{}\" type=\"{}\">\n",
            name,
            attribute(&ret.display)
        ));
        match &docs.returns {
            Some(returns) => out.push_str(&text(returns)),
            None => out.push_str(&reference(ret)),
        }
        out.push_str("\n</ResponseField>\n\n");
    }
}

fn render_remarks(out: &mut String, docs: &DocsView) {
    if docs.remarks.is_empty() {
        return;
    }
    let body: Vec<String> = docs.remarks.iter().map(|p| text(p)).collect();
    out.push_str(&format!("<Note>\n{}\n</Note>\n\n", body.join("\n\n")));
}

fn render_trailing(out: &mut String, docs: &DocsView, level: usize) {
    if !docs.examples.is_empty() {
        out.push_str(&heading(level, "Examples"));
        for example in &docs.examples {
            if let Some(caption) = &example.caption {
                out.push_str(&text(caption));
                out.push_str("\n\n");
            }
            for block in &example.blocks {
                code(out, block.language.as_deref().unwrap_or("csharp"), &block.code);
            }
        }
    }

    if !docs.exceptions.is_empty() {
        let items: Vec<String> = docs
            .exceptions
            .iter()
            .map(|e| format!("- {}: {}", reference(&e.ty), text(&e.condition)))
            .collect();
        out.push_str(&format!("<Warning>\n**Exceptions**\n\n{}\n</Warning>\n\n", items.join("\n")));
    }

    if !docs.see_also.is_empty() {
        out.push_str(&heading(level, "See Also"));
        for link in &docs.see_also {
            match &link.href {
                Some(href) => out.push_str(&format!("- [{}]({})\n", text(&link.text), href)),
                None => out.push_str(&format!("- {}\n", text(&link.text))),
            }
        }
        out.push('\n');
    }
}

fn render_namespace_overview(out: &mut String, ns: &NamespaceView) {
    if let Some(summary) = &ns.summary {
        out.push_str(&text(summary));
        out.push_str("\n\n");
    }
    for kind in TypeKind::ALL {
        let rows: Vec<&ListingEntry> = ns.listing.iter().filter(|e| e.kind == kind).collect();
        if rows.is_empty() {
            continue;
        }
        out.push_str(&heading(2, kind.plural()));
        out.push_str("<CardGroup cols={2}>\n");
        for row in rows {
            out.push_str(&format!(
                "<Card title=\"{}\" href=\"{}\">\n{}\n</Card>\n",
                attribute(&row.name),
                attribute(&row.href),
                text(row.summary.as_deref().unwrap_or(""))
            ));
        }
        out.push_str("</CardGroup>\n\n");
    }
}
