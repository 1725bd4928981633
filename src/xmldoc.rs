//! XML documentation-comment parser.
//!
//! Turns a raw `///` comment fragment (`<summary>…</summary><param …>`) into
//! [`DocSections`]. Inline markup becomes Markdown-flavored text: `<c>` and
//! `<see cref>` are rendered as inline code, `<para>` splits paragraphs.
//! Anything structurally broken is an error; the builder degrades it to
//! empty sections and records a warning.

use crate::model::comment::{CodeBlock, DocSections, ExampleDoc, ExceptionDoc, ParamDoc, SeeAlso};
use crate::model::typeref::TypeReference;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlDocError {
    #[error("malformed tag '{0}'")]
    MalformedTag(String),
    #[error("closing tag </{found}> does not match <{expected}>")]
    Mismatched { expected: String, found: String },
    #[error("closing tag </{0}> without opening tag")]
    UnexpectedClose(String),
    #[error("unclosed tag <{0}>")]
    Unclosed(String),
    #[error("<{tag}> is missing required attribute '{attribute}'")]
    MissingAttribute { tag: String, attribute: String },
}

// -- Regex patterns -----------------------------------------------------------

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>|<!--.*?-->|<[^>]*>").unwrap()
});

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^<\s*(/)?\s*([A-Za-z_][\w:.-]*)((?:\s+[\w:.-]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/)?\s*>$"#,
    )
    .unwrap()
});

static RE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RE_BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

// -- Tree ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &str) -> Result<&str, XmlDocError> {
        self.attr(name).ok_or_else(|| XmlDocError::MissingAttribute {
            tag: self.name.clone(),
            attribute: name.to_string(),
        })
    }
}

/// Build an element tree from a fragment with any number of roots.
fn parse_tree(input: &str) -> Result<Vec<Node>, XmlDocError> {
    let mut stack: Vec<Element> = vec![Element {
        name: String::new(),
        attrs: Vec::new(),
        children: Vec::new(),
    }];
    let mut last = 0;

    for caps in RE_TOKEN.captures_iter(input) {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let Some((start, end, token)) = whole else {
            continue;
        };
        push_text(&mut stack, &decode_entities(&input[last..start]));
        last = end;

        if let Some(cdata) = caps.get(1) {
            push_text(&mut stack, cdata.as_str());
            continue;
        }
        if token.starts_with("<!--") {
            continue;
        }

        let tag = RE_TAG
            .captures(token)
            .ok_or_else(|| XmlDocError::MalformedTag(token.to_string()))?;
        let closing = tag.get(1).is_some();
        let self_closing = tag.get(4).is_some();
        let name = tag[2].to_string();

        if closing {
            if stack.len() == 1 {
                return Err(XmlDocError::UnexpectedClose(name));
            }
            let Some(open) = stack.pop() else {
                return Err(XmlDocError::UnexpectedClose(name));
            };
            if open.name != name {
                return Err(XmlDocError::Mismatched {
                    expected: open.name,
                    found: name,
                });
            }
            attach(&mut stack, Node::Element(open));
            continue;
        }

        let attrs = tag
            .get(3)
            .map(|m| {
                RE_ATTR
                    .captures_iter(m.as_str())
                    .map(|a| {
                        let value = a.get(2).or_else(|| a.get(3)).map_or("", |v| v.as_str());
                        (a[1].to_string(), decode_entities(value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let element = Element {
            name,
            attrs,
            children: Vec::new(),
        };
        if self_closing {
            attach(&mut stack, Node::Element(element));
        } else {
            stack.push(element);
        }
    }
    push_text(&mut stack, &decode_entities(&input[last..]));

    if stack.len() > 1 {
        let open = stack.pop().map(|e| e.name).unwrap_or_default();
        return Err(XmlDocError::Unclosed(open));
    }
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn attach(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    if !text.is_empty() {
        attach(stack, Node::Text(text.to_string()));
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// -- Sections -----------------------------------------------------------------

/// Parse a raw documentation fragment into sections.
pub fn parse(input: &str) -> Result<DocSections, XmlDocError> {
    let nodes = parse_tree(input)?;
    let mut docs = DocSections::default();
    let mut loose = Vec::new();

    for node in &nodes {
        let el = match node {
            Node::Element(el) => el,
            Node::Text(_) => {
                loose.push(node.clone());
                continue;
            }
        };
        match el.name.as_str() {
            "summary" => docs.summary = non_empty(paragraphs(&el.children).join("\n\n")),
            "remarks" => docs.remarks.extend(paragraphs(&el.children)),
            "param" => docs.parameters.push(ParamDoc {
                name: el.require("name")?.to_string(),
                description: paragraphs(&el.children).join("\n\n"),
            }),
            "typeparam" => docs.type_parameters.push(ParamDoc {
                name: el.require("name")?.to_string(),
                description: paragraphs(&el.children).join("\n\n"),
            }),
            "returns" => docs.returns = non_empty(paragraphs(&el.children).join("\n\n")),
            "value" => {
                if docs.returns.is_none() {
                    docs.returns = non_empty(paragraphs(&el.children).join("\n\n"));
                }
            }
            "exception" => {
                let cref = el.require("cref")?;
                let ty = TypeReference::from_cref(cref)
                    .map(|t| t.reference)
                    .ok_or_else(|| XmlDocError::MalformedTag(format!("exception cref '{}'", cref)))?;
                docs.exceptions.push(ExceptionDoc {
                    ty,
                    condition: paragraphs(&el.children).join("\n\n"),
                });
            }
            "example" => docs.examples.push(example(el)),
            "seealso" | "see" => {
                if let Some(entry) = see_also(el) {
                    docs.see_also.push(entry);
                }
            }
            _ => {}
        }
    }

    if docs.summary.is_none() {
        docs.summary = non_empty(paragraphs(&loose).join("\n\n"));
    }
    Ok(docs)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn see_also(el: &Element) -> Option<SeeAlso> {
    if let Some(href) = el.attr("href") {
        let text = non_empty(inline_text(&el.children));
        return Some(SeeAlso::Url {
            url: href.to_string(),
            text,
        });
    }
    let target = TypeReference::from_cref(el.attr("cref")?)?;
    Some(SeeAlso::Type {
        reference: target.reference,
        member: target.member,
    })
}

fn example(el: &Element) -> ExampleDoc {
    let mut caption = Vec::new();
    let mut blocks = Vec::new();
    let mut prose = Vec::new();

    for child in &el.children {
        match child {
            Node::Element(code) if code.name == "code" => {
                blocks.push(CodeBlock {
                    language: code
                        .attr("language")
                        .or_else(|| code.attr("lang"))
                        .map(str::to_string),
                    code: unindent(raw_text(&code.children).trim_matches('\n')),
                });
            }
            other => prose.push(other.clone()),
        }
    }
    caption.extend(paragraphs(&prose));

    ExampleDoc {
        caption: non_empty(caption.join("\n\n")),
        blocks,
    }
}

/// Split mixed content into whitespace-normalized paragraphs.
fn paragraphs(nodes: &[Node]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for node in nodes {
        match node {
            Node::Text(text) => {
                let mut pieces = RE_BLANK_LINE.split(text).peekable();
                while let Some(piece) = pieces.next() {
                    current.push_str(piece);
                    if pieces.peek().is_some() {
                        flush(&mut out, &mut current);
                    }
                }
            }
            Node::Element(el) if el.name == "para" => {
                flush(&mut out, &mut current);
                out.extend(paragraphs(&el.children));
            }
            Node::Element(el) if el.name == "code" => {
                flush(&mut out, &mut current);
                let lang = el.attr("language").or_else(|| el.attr("lang")).unwrap_or("");
                out.push(format!(
                    "```{}\n{}\n```",
                    lang,
                    unindent(raw_text(&el.children).trim_matches('\n'))
                ));
            }
            Node::Element(el) if el.name == "list" => {
                flush(&mut out, &mut current);
                out.push(list(el));
            }
            Node::Element(el) => current.push_str(&inline_element(el)),
        }
    }
    flush(&mut out, &mut current);
    out
}

fn flush(out: &mut Vec<String>, current: &mut String) {
    let normalized = RE_WHITESPACE.replace_all(current.trim(), " ").to_string();
    if !normalized.is_empty() {
        out.push(normalized);
    }
    current.clear();
}

fn list(el: &Element) -> String {
    let numbered = el.attr("type") == Some("number");
    let mut lines = Vec::new();
    let items = el.children.iter().filter_map(|n| match n {
        Node::Element(item) if item.name == "item" => Some(item),
        _ => None,
    });
    for (i, item) in items.enumerate() {
        let term = find_child(item, "term").map(|t| inline_text(&t.children));
        let description = find_child(item, "description")
            .map(|d| inline_text(&d.children))
            .unwrap_or_else(|| inline_text(&item.children));
        let text = match term {
            Some(term) if !term.is_empty() => format!("**{}**: {}", term, description),
            _ => description,
        };
        let bullet = if numbered { format!("{}.", i + 1) } else { "-".to_string() };
        lines.push(format!("{} {}", bullet, text));
    }
    lines.join("\n")
}

fn find_child<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    el.children.iter().find_map(|n| match n {
        Node::Element(child) if child.name == name => Some(child),
        _ => None,
    })
}

fn inline_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => out.push_str(&inline_element(el)),
        }
    }
    RE_WHITESPACE.replace_all(out.trim(), " ").to_string()
}

fn inline_element(el: &Element) -> String {
    match el.name.as_str() {
        "c" => format!("`{}`", raw_text(&el.children).trim()),
        "paramref" | "typeparamref" => format!("`{}`", el.attr("name").unwrap_or_default()),
        "see" | "seealso" => {
            let label = inline_text(&el.children);
            if let Some(href) = el.attr("href") {
                let label = if label.is_empty() { href.to_string() } else { label };
                format!("[{}]({})", label, href)
            } else if let Some(word) = el.attr("langword") {
                format!("`{}`", word)
            } else if !label.is_empty() {
                label
            } else if let Some(target) = el.attr("cref").and_then(TypeReference::from_cref) {
                match target.member {
                    Some(member) => format!("`{}.{}`", target.reference, member),
                    None => format!("`{}`", target.reference),
                }
            } else {
                String::new()
            }
        }
        "b" | "strong" => format!("**{}**", inline_text(&el.children)),
        "i" | "em" => format!("*{}*", inline_text(&el.children)),
        "br" => "\n".to_string(),
        _ => inline_text(&el.children),
    }
}

fn raw_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => out.push_str(&raw_text(&el.children)),
        }
    }
    out
}

/// Remove common leading indentation from a multi-line string.
pub fn unindent(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(0);
    if start >= lines.len() {
        return text.to_string();
    }

    let min_indent = lines[start..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    lines[start..]
        .iter()
        .map(|l| if l.len() >= min_indent { &l[min_indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
