//! GitHub-flavored markdown renderer.
//!
//! One heading per type and member with an explicit `<a id>` anchor so
//! cross-references land exactly where the layout says. Sections appear
//! only when there is something to show, except Syntax, which is always
//! derivable from the signature.

use crate::error::Result;
use crate::layout::Navigation;
use crate::model::{MemberKind, TypeKind};
use crate::render::*;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn format(&self) -> Format {
        Format::Markdown
    }

    fn render_page(&self, page: &PageView) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();
        match page.kind {
            PageKind::Type => {
                for (i, ty) in page.namespaces.iter().flat_map(|ns| &ns.types).enumerate() {
                    render_type(&mut lines, ty, if i == 0 { 1 } else { 2 });
                }
            }
            PageKind::Namespace => {
                lines.push(format!("# {}\n", escape(&page.title)));
                for ns in &page.namespaces {
                    render_namespace_overview(&mut lines, ns);
                }
            }
            PageKind::Flat => {
                lines.push(format!("# {}\n", escape(&page.title)));
                for ns in &page.namespaces {
                    lines.push(format!("## {}\n", namespace_title(&ns.name)));
                    if let Some(summary) = &ns.summary {
                        lines.push(summary.clone());
                        lines.push(String::new());
                    }
                    for ty in &ns.types {
                        render_type(&mut lines, ty, 3);
                    }
                }
            }
        }
        Ok(finish(lines))
    }

    fn render_manifest(&self, navigation: &Navigation) -> Result<OutputUnit> {
        let mut lines: Vec<String> = vec!["# Summary".to_string(), String::new()];
        for group in &navigation.groups {
            let label = escape(group_label(&group.namespace));
            match &group.index {
                Some(index) => lines.push(format!("- [{}]({})", label, index)),
                None => lines.push(format!("- {}", label)),
            }
            for entry in &group.entries {
                lines.push(format!("  - [{}]({})", escape(&entry.title), entry.path));
            }
        }
        Ok(OutputUnit {
            path: self.format().manifest_path().to_string(),
            content: finish(lines).into_bytes(),
        })
    }
}

fn finish(mut lines: Vec<String>) -> String {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn heading(level: usize, text: &str) -> String {
    format!("{} {}\n", "#".repeat(level.min(6)), text)
}

/// Escape angle brackets so generic names survive as text.
fn escape(text: &str) -> String {
    text.replace('<', "\\<").replace('>', "\\>")
}

fn namespace_title(name: &str) -> String {
    if name.is_empty() {
        "Global Namespace".to_string()
    } else {
        format!("{} Namespace", name)
    }
}

/// `[List](url)\<[Gadget](Gadget.md)\>`
fn reference(r: &RefView) -> String {
    r.compose("\\<", "\\>", &|part| match &part.href {
        Some(href) => format!("[{}]({})", part.name, href),
        None => part.name.clone(),
    })
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn push_anchor(lines: &mut Vec<String>, anchor: &Option<String>) {
    if let Some(anchor) = anchor {
        lines.push(format!("<a id=\"{}\"></a>\n", anchor));
    }
}

fn push_code(lines: &mut Vec<String>, language: &str, code: &str) {
    lines.push(format!("```{}", language));
    lines.push(code.to_string());
    lines.push("```".to_string());
    lines.push(String::new());
}

fn render_type(lines: &mut Vec<String>, ty: &TypeView, level: usize) {
    push_anchor(lines, &ty.anchor);
    lines.push(heading(level, &escape(&ty.title)));

    lines.push(heading(level + 1, "Definition"));
    let namespace = if ty.namespace.is_empty() { "(global)" } else { &ty.namespace };
    lines.push(format!("Namespace: `{}`  ", namespace));
    lines.push(format!("Assembly: `{}`", ty.assembly));
    lines.push(String::new());

    if let Some(summary) = &ty.docs.summary {
        lines.push(heading(level + 1, "Summary"));
        lines.push(summary.clone());
        lines.push(String::new());
    }

    lines.push(heading(level + 1, "Syntax"));
    push_code(lines, "csharp", &ty.signature);
    if let Some(base) = &ty.base_type {
        lines.push(format!("Inheritance: {}", reference(base)));
        lines.push(String::new());
    }
    if !ty.interfaces.is_empty() {
        let names: Vec<String> = ty.interfaces.iter().map(reference).collect();
        lines.push(format!("Implements: {}", names.join(", ")));
        lines.push(String::new());
    }

    render_remarks(lines, &ty.docs, level + 1);
    render_type_parameters(lines, &ty.docs, level + 1);
    render_parameters(lines, &parameter_rows(&[], &ty.docs), level + 1);
    if let Some(returns) = &ty.docs.returns {
        lines.push(heading(level + 1, "Returns"));
        lines.push(returns.clone());
        lines.push(String::new());
    }

    for group in &ty.members {
        lines.push(heading(level + 1, group.kind.plural()));
        for member in &group.members {
            render_member(lines, member, level + 2);
        }
    }

    render_trailing(lines, &ty.docs, level + 1);
}

fn render_member(lines: &mut Vec<String>, member: &MemberView, level: usize) {
    push_anchor(lines, &member.anchor);
    lines.push(heading(level, &escape(&member.name)));

    if let Some(summary) = &member.docs.summary {
        lines.push(heading(level + 1, "Summary"));
        lines.push(summary.clone());
        lines.push(String::new());
    }

    lines.push(heading(level + 1, "Syntax"));
    push_code(lines, "csharp", &member.signature);

    render_type_parameters(lines, &member.docs, level + 1);
    render_parameters(lines, &parameter_rows(&member.parameters, &member.docs), level + 1);

    if let Some(ret) = meaningful_return(member) {
        let title = match member.kind {
            MemberKind::Property => "Property Value",
            MemberKind::Field => "Field Value",
            MemberKind::Event => "Event Type",
            MemberKind::Method | MemberKind::Constructor => "Returns",
        };
        lines.push(heading(level + 1, title));
        lines.push(reference(ret));
        lines.push(String::new());
        if let Some(returns) = &member.docs.returns {
            lines.push(returns.clone());
            lines.push(String::new());
        }
    }

    render_remarks(lines, &member.docs, level + 1);
    render_trailing(lines, &member.docs, level + 1);
}

fn render_remarks(lines: &mut Vec<String>, docs: &DocsView, level: usize) {
    if docs.remarks.is_empty() {
        return;
    }
    lines.push(heading(level, "Remarks"));
    for paragraph in &docs.remarks {
        lines.push(paragraph.clone());
        lines.push(String::new());
    }
}

fn render_type_parameters(lines: &mut Vec<String>, docs: &DocsView, level: usize) {
    if docs.type_parameters.is_empty() {
        return;
    }
    lines.push(heading(level, "Type Parameters"));
    for tp in &docs.type_parameters {
        lines.push(format!("* **{}**: {}", tp.name, tp.description));
    }
    lines.push(String::new());
}

fn render_parameters(lines: &mut Vec<String>, rows: &[ParamRow<'_>], level: usize) {
    if rows.is_empty() {
        return;
    }
    lines.push(heading(level, "Parameters"));
    for row in rows {
        let mut line = format!("* **{}**", row.name);
        if let Some(ty) = row.ty {
            line.push_str(&format!(" ({})", reference(ty)));
        }
        if let Some(description) = row.description {
            line.push_str(": ");
            line.push_str(description);
        }
        lines.push(line);
    }
    lines.push(String::new());
}

/// Examples, Exceptions and See Also close every block.
fn render_trailing(lines: &mut Vec<String>, docs: &DocsView, level: usize) {
    if !docs.examples.is_empty() {
        lines.push(heading(level, "Examples"));
        for example in &docs.examples {
            if let Some(caption) = &example.caption {
                lines.push(caption.clone());
                lines.push(String::new());
            }
            for block in &example.blocks {
                push_code(lines, block.language.as_deref().unwrap_or("csharp"), &block.code);
            }
        }
    }

    if !docs.exceptions.is_empty() {
        lines.push(heading(level, "Exceptions"));
        for exception in &docs.exceptions {
            lines.push(format!("* {}: {}", reference(&exception.ty), exception.condition));
        }
        lines.push(String::new());
    }

    if !docs.see_also.is_empty() {
        lines.push(heading(level, "See Also"));
        for link in &docs.see_also {
            match &link.href {
                Some(href) => lines.push(format!("* [{}]({})", escape(&link.text), href)),
                None => lines.push(format!("* {}", escape(&link.text))),
            }
        }
        lines.push(String::new());
    }
}

fn render_namespace_overview(lines: &mut Vec<String>, ns: &NamespaceView) {
    if let Some(summary) = &ns.summary {
        lines.push(summary.clone());
        lines.push(String::new());
    }
    for kind in TypeKind::ALL {
        let rows: Vec<&ListingEntry> = ns.listing.iter().filter(|e| e.kind == kind).collect();
        if rows.is_empty() {
            continue;
        }
        lines.push(heading(2, kind.plural()));
        lines.push(format!("| {} | Description |", kind.label()));
        lines.push("| --- | --- |".to_string());
        for row in rows {
            lines.push(format!(
                "| [{}]({}) | {} |",
                escape(&row.name),
                row.href,
                table_cell(row.summary.as_deref().unwrap_or(""))
            ));
        }
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{NavEntry, NavGroup};

    fn ref_view(name: &str, href: Option<&str>) -> RefView {
        RefView {
            display: name.to_string(),
            name: name.to_string(),
            href: href.map(str::to_string),
            resolution: if href.is_some() { RefKind::Internal } else { RefKind::Unresolved },
            args: Vec::new(),
            suffix: String::new(),
        }
    }

    #[test]
    fn generic_reference_links_each_part() {
        let mut list = ref_view("List", Some("https://example.com/list"));
        list.args = vec![ref_view("Gadget", Some("Gadget.md")), ref_view("T", None)];
        assert_eq!(
            reference(&list),
            "[List](https://example.com/list)\\<[Gadget](Gadget.md), T\\>"
        );
    }

    #[test]
    fn escape_generics() {
        assert_eq!(escape("Cache<T> Class"), "Cache\\<T\\> Class");
    }

    #[test]
    fn undocumented_member_still_has_syntax() {
        let member = MemberView {
            name: "Spin()".to_string(),
            kind: MemberKind::Method,
            anchor: Some("gadget--spin".to_string()),
            signature: "public void Spin();".to_string(),
            return_type: None,
            parameters: Vec::new(),
            docs: DocsView::default(),
            provider_symbol: Default::default(),
        };
        let mut lines = Vec::new();
        render_member(&mut lines, &member, 3);
        let out = finish(lines);
        assert!(out.contains("<a id=\"gadget--spin\"></a>"));
        assert!(out.contains("#### Syntax\n\n```csharp\npublic void Spin();\n```"));
        assert!(!out.contains("Summary"));
    }

    #[test]
    fn summary_manifest() {
        let nav = Navigation {
            groups: vec![NavGroup {
                namespace: "Acme".to_string(),
                index: Some("Acme/_index.md".to_string()),
                entries: vec![NavEntry {
                    title: "Cache<T> Class".to_string(),
                    path: "Acme/Cache.md".to_string(),
                    kind: TypeKind::Class,
                }],
            }],
            units: Vec::new(),
        };
        let unit = MarkdownRenderer.render_manifest(&nav).unwrap();
        assert_eq!(unit.path, "SUMMARY.md");
        assert_eq!(
            String::from_utf8(unit.content).unwrap(),
            "# Summary\n\n- [Acme](Acme/_index.md)\n  - [Cache\\<T\\> Class](Acme/Cache.md)\n"
        );
    }
}
