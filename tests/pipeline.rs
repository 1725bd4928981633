use asmdoc::config::{Config, Settings};
use asmdoc::error::{DocError, Warning};
use asmdoc::facts::AssemblyFacts;
use asmdoc::layout::{FlatScope, LayoutMode};
use asmdoc::render::{Format, MemberView, PageView, TypeView};
use asmdoc::{generate, render_facts, Rendered};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

fn fixture(name: &str) -> AssemblyFacts {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let text = std::fs::read_to_string(&path).unwrap();
    AssemblyFacts::from_json(&text).unwrap()
}

fn acme() -> Vec<AssemblyFacts> {
    vec![fixture("acme_core.json"), fixture("acme_extras.json")]
}

fn settings(format: Format) -> Settings {
    Config {
        format: Some(format),
        ..Default::default()
    }
    .settings()
}

fn flat(format: Format, scope: FlatScope) -> Settings {
    Config {
        format: Some(format),
        mode: Some(LayoutMode::Flat),
        flat_scope: Some(scope),
        ..Default::default()
    }
    .settings()
}

fn paths(rendered: &Rendered) -> Vec<&str> {
    rendered.units.iter().map(|u| u.path.as_str()).collect()
}

fn unit(rendered: &Rendered, path: &str) -> String {
    let found = rendered
        .units
        .iter()
        .find(|u| u.path == path)
        .unwrap_or_else(|| panic!("no unit {} in {:?}", path, paths(rendered)));
    String::from_utf8(found.content.clone()).unwrap()
}

/// Text from `heading` up to the next heading of the same depth.
fn block<'t>(text: &'t str, heading: &str) -> &'t str {
    let start = text.find(heading).unwrap_or_else(|| panic!("missing {}", heading));
    let hashes = &heading[..heading.find(' ').unwrap() + 1];
    let rest = &text[start + heading.len()..];
    let end = rest.find(&format!("\n{}", hashes)).unwrap_or(rest.len());
    &text[start..start + heading.len() + end]
}

/// Lines of a markdown section, up to the first blank line after its body.
fn section<'t>(text: &'t str, heading: &str) -> Vec<&'t str> {
    let start = text.find(heading).unwrap_or_else(|| panic!("missing {}", heading));
    text[start + heading.len()..]
        .lines()
        .skip_while(|l| l.trim().is_empty())
        .take_while(|l| !l.trim().is_empty())
        .collect()
}

fn spin(page: &PageView) -> &MemberView {
    let gadget: &TypeView = page.namespaces[0]
        .types
        .iter()
        .find(|t| t.name == "Gadget")
        .unwrap();
    gadget
        .members
        .iter()
        .flat_map(|g| &g.members)
        .find(|m| m.name == "Spin(Int32, String)")
        .unwrap()
}

// -- model + layout --

#[test]
fn shared_namespace_merges_and_last_definition_wins() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    assert_eq!(
        paths(&rendered),
        vec![
            "Acme/Tools/ITool.md",
            "Acme/Tools/Wrench.md",
            "Acme/Tools/_index.md",
            "Acme/Widgets/Cache-1.md",
            "Acme/Widgets/Cache.md",
            "Acme/Widgets/Gadget.md",
            "Acme/Widgets/Speed.md",
            "Acme/Widgets/Sprocket.md",
            "Acme/Widgets/_index.md",
            "SUMMARY.md",
        ]
    );

    let sprocket = unit(&rendered, "Acme/Widgets/Sprocket.md");
    assert!(sprocket.contains("Extended sprocket."));
    assert!(!sprocket.contains("Original sprocket."));
    assert!(sprocket.contains("Assembly: `Acme.Extras`"));

    let conflicts: Vec<&Warning> = rendered
        .warnings
        .iter()
        .filter(|w| matches!(w, Warning::MergeConflict { .. }))
        .collect();
    assert_eq!(conflicts.len(), 1);
    match conflicts[0] {
        Warning::MergeConflict {
            key,
            previous,
            incoming,
        } => {
            assert_eq!(key, "Acme.Widgets.Sprocket");
            assert_eq!(previous, "Acme.Core");
            assert_eq!(incoming, "Acme.Extras");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn malformed_comment_is_a_warning_not_an_error() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    assert!(rendered
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::MalformedDocumentation { target, .. } if target.contains("Inspect"))));
    let wrench = unit(&rendered, "Acme/Tools/Wrench.md");
    assert!(wrench.contains("public void Inspect();"));
}

#[test]
fn generic_arity_keeps_cache_pages_apart() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    let plain = unit(&rendered, "Acme/Widgets/Cache.md");
    let generic = unit(&rendered, "Acme/Widgets/Cache-1.md");
    assert!(plain.starts_with("# Cache Class\n"));
    assert!(generic.starts_with("# Cache\\<T\\> Class\n"));
    assert!(generic.contains("* **T**: Cached value type."));
}

#[test]
fn case_insensitive_path_collision_is_fatal() {
    let err = render_facts(&[fixture("case_clash.json")], &settings(Format::Markdown), None).unwrap_err();
    match err {
        DocError::PathCollision { path, first, second } => {
            assert_eq!(path.to_lowercase(), "acme/widget.md");
            assert_ne!(first, second);
        }
        other => panic!("expected collision, got {:?}", other),
    }
}

#[test]
fn invalid_owner_is_fatal() {
    let err = render_facts(&[fixture("invalid_owner.json")], &settings(Format::Json), None).unwrap_err();
    assert!(matches!(err, DocError::InvalidFacts { ref assembly, .. } if assembly == "Broken"));
}

// -- references --

#[test]
fn framework_types_link_to_external_docs() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    let gadget = unit(&rendered, "Acme/Widgets/Gadget.md");
    assert!(gadget.contains("[String](https://learn.microsoft.com/dotnet/api/system.string)"));
    assert!(gadget.contains("Implements: [IDisposable](https://learn.microsoft.com/dotnet/api/system.idisposable)"));
}

#[test]
fn internal_references_are_relative_links() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    let wrench = unit(&rendered, "Acme/Tools/Wrench.md");
    assert!(wrench.contains("* **gadget** ([Gadget](../Widgets/Gadget.md))"));
    assert!(wrench.contains("* **cache** ([Cache](../Widgets/Cache-1.md)\\<Blob\\>)"));
    assert!(wrench.contains("Tightens `Gadget` instances."));
}

#[test]
fn nested_types_share_the_outer_page() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    let gadget = unit(&rendered, "Acme/Widgets/Gadget.md");
    assert!(gadget.contains("<a id=\"gadget+part\"></a>\n\n## Gadget.Part Struct"));
    assert!(gadget.contains("public double Weight;"));
    let summary = unit(&rendered, "SUMMARY.md");
    assert!(summary.contains("  - [Gadget Class](Acme/Widgets/Gadget.md)"));
    assert!(!summary.contains("Gadget.Part"));
}

// -- rendering --

#[test]
fn undocumented_members_still_render_syntax() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    let gadget = unit(&rendered, "Acme/Widgets/Gadget.md");
    let ctor = block(&gadget, "### Gadget()");
    assert_eq!(section(ctor, "#### Syntax"), vec!["```csharp", "public Gadget();", "```"]);
    assert!(!ctor.contains("#### Summary"));

    let name = block(&gadget, "### Name");
    assert_eq!(section(name, "#### Syntax")[1], "public string Name { get; }");

    let overload = block(&gadget, "### Spin()");
    assert!(gadget.contains("<a id=\"gadget--spin\"></a>"));
    assert!(gadget.contains("<a id=\"gadget--spin-int32-string\"></a>"));
    assert_eq!(section(overload, "#### Syntax")[1], "public void Spin();");
}

#[test]
fn markdown_round_trips_documentation() {
    let rendered = render_facts(&acme(), &settings(Format::Markdown), None).unwrap();
    let gadget = unit(&rendered, "Acme/Widgets/Gadget.md");
    let spin = block(&gadget, "### Spin(Int32, String)");

    assert_eq!(section(spin, "#### Summary"), vec!["Spins the gadget."]);
    assert_eq!(
        section(spin, "#### Parameters"),
        vec![
            "* **speed** ([Int32](https://learn.microsoft.com/dotnet/api/system.int32)): Revolutions per second.",
            "* **label** ([String](https://learn.microsoft.com/dotnet/api/system.string)): Optional label.",
        ]
    );
    assert_eq!(
        section(spin, "#### Exceptions"),
        vec!["* [ArgumentOutOfRangeException](https://learn.microsoft.com/dotnet/api/system.argumentoutofrangeexception): Speed is negative."]
    );
    assert_eq!(section(spin, "#### See Also"), vec!["* [Sprocket](Sprocket.md)"]);
    assert_eq!(
        section(spin, "#### Syntax")[1],
        "public bool Spin(int speed, string label = null);"
    );
}

#[test]
fn mintlify_round_trips_documentation() {
    let rendered = render_facts(&acme(), &settings(Format::Mintlify), None).unwrap();
    let gadget = unit(&rendered, "Acme/Widgets/Gadget.mdx");
    assert!(gadget.starts_with("---\ntitle: \"Gadget Class\"\ndescription: \"A spinning gadget.\"\n---\n"));

    let spin = block(&gadget, "### Spin(Int32, String)");
    assert!(spin.contains("Spins the gadget."));
    assert!(spin.contains("<ParamField path=\"speed\" type=\"Int32\" required>\nRevolutions per second.\n</ParamField>"));
    assert!(spin.contains("<ParamField path=\"label\" type=\"String\">\nOptional label.\n</ParamField>"));
    assert!(spin.contains(
        "- [ArgumentOutOfRangeException](https://learn.microsoft.com/dotnet/api/system.argumentoutofrangeexception): Speed is negative."
    ));
    assert!(spin.contains("- [Sprocket](/Acme/Widgets/Sprocket)"));
    assert!(gadget.contains("<Note>\nGadgets spin.\n\nSome spin faster.\n</Note>"));

    let docs: serde_json::Value = serde_json::from_str(&unit(&rendered, "docs.json")).unwrap();
    let groups = docs["navigation"]["groups"].as_array().unwrap();
    assert_eq!(groups[0]["group"], "Acme.Tools");
    assert_eq!(groups[1]["group"], "Acme.Widgets");
    let pages: Vec<&str> = groups[1]["pages"].as_array().unwrap().iter().map(|p| p.as_str().unwrap()).collect();
    assert_eq!(pages[0], "Acme/Widgets/_index");
    assert!(pages.contains(&"Acme/Widgets/Gadget"));
    assert!(pages.iter().all(|p| !p.contains('#') && !p.ends_with(".mdx")));
}

#[test]
fn json_round_trips_documentation() {
    let rendered = render_facts(&acme(), &settings(Format::Json), None).unwrap();
    let page: PageView = serde_json::from_str(&unit(&rendered, "Acme/Widgets/Gadget.json")).unwrap();
    let spin = spin(&page);

    assert_eq!(spin.docs.summary.as_deref(), Some("Spins the gadget."));
    assert_eq!(spin.docs.parameter("speed"), Some("Revolutions per second."));
    assert_eq!(spin.docs.parameter("label"), Some("Optional label."));
    assert_eq!(spin.docs.exceptions.len(), 1);
    assert_eq!(spin.docs.exceptions[0].ty.display, "ArgumentOutOfRangeException");
    assert_eq!(spin.docs.exceptions[0].condition, "Speed is negative.");
    assert_eq!(spin.docs.see_also[0].text, "Sprocket");
    assert_eq!(spin.docs.see_also[0].href.as_deref(), Some("Sprocket.json"));

    let raw: serde_json::Value = serde_json::from_str(&unit(&rendered, "Acme/Widgets/Gadget.json")).unwrap();
    assert!(raw["namespaces"][0]["types"][0]["provider_symbol"].is_null());
}

#[test]
fn yaml_round_trips_documentation() {
    let rendered = render_facts(&acme(), &settings(Format::Yaml), None).unwrap();
    let page: PageView = serde_yaml::from_str(&unit(&rendered, "Acme/Widgets/Gadget.yml")).unwrap();
    let spin = spin(&page);

    assert_eq!(spin.docs.summary.as_deref(), Some("Spins the gadget."));
    assert_eq!(spin.parameters.len(), 2);
    assert_eq!(spin.docs.parameter("speed"), Some("Revolutions per second."));
    assert_eq!(spin.docs.parameter("label"), Some("Optional label."));
    assert_eq!(spin.docs.exceptions[0].condition, "Speed is negative.");
    assert_eq!(spin.docs.see_also[0].href.as_deref(), Some("Sprocket.yml"));

    let toc: serde_yaml::Value = serde_yaml::from_str(&unit(&rendered, "toc.yml")).unwrap();
    assert_eq!(toc[1]["name"].as_str(), Some("Acme.Widgets"));
    assert_eq!(toc[1]["href"].as_str(), Some("Acme/Widgets/_index.yml"));
}

#[test]
fn json_and_yaml_carry_the_same_page() {
    let json = render_facts(&acme(), &settings(Format::Json), None).unwrap();
    let yaml = render_facts(&acme(), &settings(Format::Yaml), None).unwrap();
    let from_json: PageView = serde_json::from_str(&unit(&json, "Acme/Tools/Wrench.json")).unwrap();
    let from_yaml: PageView = serde_yaml::from_str(&unit(&yaml, "Acme/Tools/Wrench.yml")).unwrap();

    let a = &from_json.namespaces[0].types[0];
    let b = &from_yaml.namespaces[0].types[0];
    assert_eq!(a.uid, b.uid);
    assert_eq!(a.signature, b.signature);
    assert_eq!(a.docs, b.docs);
    assert_eq!(a.members.len(), b.members.len());
}

// -- flat layouts --

#[test]
fn flat_per_assembly() {
    let rendered = render_facts(&acme(), &flat(Format::Markdown, FlatScope::Assembly), None).unwrap();
    assert_eq!(paths(&rendered), vec!["Acme.Core.md", "Acme.Extras.md", "SUMMARY.md"]);

    let extras = unit(&rendered, "Acme.Extras.md");
    assert!(extras.starts_with("# Acme.Extras 2.1.0\n"));
    assert!(extras.contains("[Gadget](Acme.Core.md#acme.widgets.gadget)"));
    assert!(extras.contains("<a id=\"acme.widgets.sprocket\"></a>"));

    let core = unit(&rendered, "Acme.Core.md");
    assert!(core.contains("<a id=\"acme.widgets.gadget--spin-int32-string\"></a>"));
    assert!(!core.contains("Sprocket Class"));
}

#[test]
fn flat_per_namespace() {
    let rendered = render_facts(&acme(), &flat(Format::Json, FlatScope::Namespace), None).unwrap();
    assert_eq!(paths(&rendered), vec!["Acme.Tools.json", "Acme.Widgets.json", "manifest.json"]);
    let manifest: serde_json::Value = serde_json::from_str(&unit(&rendered, "manifest.json")).unwrap();
    let entries = manifest["groups"][1]["entries"].as_array().unwrap();
    let titles: Vec<&str> = entries.iter().map(|e| e["title"].as_str().unwrap()).collect();
    // kind first, then name, then arity
    assert_eq!(
        titles,
        vec!["Cache Class", "Cache<T> Class", "Gadget Class", "Sprocket Class", "Speed Enum"]
    );
}

#[test]
fn type_named_like_the_manifest_is_renamed() {
    let facts = AssemblyFacts::from_json(
        r#"{"name": "Lone", "types": [{"kind": "class", "name": "Summary"}]}"#,
    )
    .unwrap();
    let rendered = render_facts(&[facts], &settings(Format::Markdown), None).unwrap();
    assert_eq!(paths(&rendered), vec!["Summary-type.md", "_index.md", "SUMMARY.md"]);
    assert!(unit(&rendered, "SUMMARY.md").contains("[Summary Class](Summary-type.md)"));
}

#[test]
fn assembly_named_like_the_manifest_is_renamed() {
    let facts = AssemblyFacts::from_json(
        r#"{"name": "toc", "types": [{"kind": "class", "namespace": "Acme", "name": "Gadget"}]}"#,
    )
    .unwrap();
    let rendered = render_facts(&[facts], &flat(Format::Yaml, FlatScope::Assembly), None).unwrap();
    assert_eq!(paths(&rendered), vec!["toc-assembly.yml", "toc.yml"]);
}

// -- determinism --

#[test]
fn identical_input_gives_identical_output() {
    let a = render_facts(&acme(), &settings(Format::Mintlify), None).unwrap();
    let b = render_facts(&acme(), &settings(Format::Mintlify), None).unwrap();
    assert_eq!(a.units, b.units);
}

#[test]
fn navigation_ignores_input_order() {
    let forward = render_facts(&acme(), &settings(Format::Json), None).unwrap();
    let mut reversed_input = acme();
    reversed_input.reverse();
    let reversed = render_facts(&reversed_input, &settings(Format::Json), None).unwrap();
    assert_eq!(paths(&forward), paths(&reversed));
    assert_eq!(unit(&forward, "manifest.json"), unit(&reversed, "manifest.json"));
}

// -- cancellation + writing --

#[test]
fn cancelled_render_produces_nothing() {
    let cancel = AtomicBool::new(true);
    let err = render_facts(&acme(), &settings(Format::Markdown), Some(&cancel)).unwrap_err();
    assert!(matches!(err, DocError::Cancelled));
}

#[test]
fn generate_writes_every_unit() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(Format::Markdown);
    settings.output = dir.path().join("api");
    let generated = generate(&acme(), &settings, None).unwrap();
    assert!(generated.report.is_success());
    assert_eq!(generated.report.written.len(), generated.units);
    assert!(dir.path().join("api/Acme/Widgets/Gadget.md").is_file());
    assert!(dir.path().join("api/SUMMARY.md").is_file());
}
