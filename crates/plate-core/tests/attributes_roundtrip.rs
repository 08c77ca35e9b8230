use inkpress_plate_core::{
    AttributeTarget, Attrs, Document, Editor, MarkKind, Node, NodeKind, PluginRegistry, Point,
    Selection, SourceElement, set_attribute,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const VALUES: [&str; 5] = ["12px", "1.5", "2em", "large", "calc(1rem + 2px)"];

fn registered() -> Vec<(AttributeTarget, &'static str)> {
    vec![
        (AttributeTarget::Mark(MarkKind::TextStyle), "font_size"),
        (AttributeTarget::Node(NodeKind::Paragraph), "line_height"),
        (AttributeTarget::Node(NodeKind::Heading), "line_height"),
    ]
}

#[test]
fn serialize_parse_serialize_is_stable() {
    let registry = PluginRegistry::richtext();
    let attributes = registry.attributes();

    for (target, name) in registered() {
        let spec = attributes
            .get(target, name)
            .unwrap_or_else(|| panic!("{name} is not registered on {target:?}"));

        for value in VALUES {
            let value = json!(value);
            let markup = spec.serialize(Some(&value));
            let parsed = spec
                .parse(&SourceElement::with_markup("span", markup.clone()))
                .unwrap_or_else(|| panic!("{name} did not parse back from {markup:?}"));

            assert_eq!(parsed, value);
            assert_eq!(spec.serialize(Some(&parsed)), markup);
        }
    }
}

#[test]
fn unset_values_render_nothing_and_parse_to_none() {
    let registry = PluginRegistry::richtext();
    let attributes = registry.attributes();

    for (target, name) in registered() {
        let spec = attributes.get(target, name).unwrap();
        assert!(spec.serialize(None).is_empty());
        assert_eq!(spec.parse(&SourceElement::new("p")), None);
        assert_eq!(
            spec.parse(&SourceElement::new("p").attribute("style", "color: red")),
            None
        );
    }
}

#[test]
fn loading_reads_values_out_of_mixed_inline_styles() {
    let registry = PluginRegistry::richtext();
    let el = SourceElement::new("p").attribute("style", "color: red; LINE-HEIGHT: 1.8 ;");

    let attrs = registry
        .attributes()
        .parse_attrs(AttributeTarget::Node(NodeKind::Paragraph), &el);

    let mut expected = Attrs::new();
    expected.insert("line_height".into(), json!("1.8"));
    assert_eq!(attrs, expected);
}

#[test]
fn rendering_a_node_emits_only_set_attributes() {
    let registry = PluginRegistry::richtext();
    let target = AttributeTarget::Node(NodeKind::Heading);

    let mut attrs = Attrs::new();
    attrs.insert("level".into(), json!(2));
    assert!(registry.attributes().render_attrs(target, &attrs).is_empty());

    attrs.insert("line_height".into(), json!("1.25"));
    let markup = registry.attributes().render_attrs(target, &attrs);
    assert_eq!(
        markup.get("style").map(String::as_str),
        Some("line-height: 1.25")
    );
    assert_eq!(markup.len(), 1);
}

#[test]
fn numeric_values_are_stored_in_their_parsed_form() {
    let doc = Document {
        children: vec![Node::paragraph("a")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext());

    set_attribute(&mut editor, "line_height", json!(1.5)).unwrap();

    let stored = editor.doc().children[0]
        .attrs()
        .and_then(|attrs| attrs.get("line_height"))
        .cloned()
        .unwrap();
    assert_eq!(stored, json!("1.5"));

    let spec = editor
        .registry()
        .attributes()
        .get(AttributeTarget::Node(NodeKind::Paragraph), "line_height")
        .unwrap();
    let markup = spec.serialize(Some(&stored));
    assert_eq!(
        spec.parse(&SourceElement::with_markup("p", markup)),
        Some(stored)
    );
}

#[test]
fn values_without_a_css_form_are_rejected() {
    let mut editor = Editor::with_richtext_plugins();
    let err = set_attribute(&mut editor, "line_height", json!(true)).unwrap_err();
    assert!(err.message().contains("line_height"));
    assert_eq!(editor.doc().children[0].attrs().and_then(|a| a.get("line_height")), None);
}
