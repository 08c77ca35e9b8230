use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AttrPatch, Attrs, Editor, Marks, Node, NodeKind};
use crate::ops::{Op, Transaction};
use crate::plugin::{
    CommandError, CommandSpec, PlatePlugin, QueryError, QuerySpec, RegistryError,
    active_marks, apply_mark_range, selected_text_blocks, set_marks_at_caret,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    TextStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", content = "kind", rename_all = "snake_case")]
pub enum AttributeTarget {
    Node(NodeKind),
    Mark(MarkKind),
}

pub type MarkupAttrs = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl SourceElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_markup(tag: impl Into<String>, markup: MarkupAttrs) -> Self {
        Self {
            tag: tag.into(),
            attributes: markup,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Value of one inline `style` declaration. Later declarations win.
    pub fn style(&self, property: &str) -> Option<String> {
        let style = self.get("style")?;
        style_declarations(style)
            .into_iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }
}

pub fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

pub type ParseFn = Arc<dyn Fn(&SourceElement) -> Option<Value> + Send + Sync>;
pub type SerializeFn = Arc<dyn Fn(&Value) -> MarkupAttrs + Send + Sync>;

#[derive(Clone)]
pub struct AttributeSpec {
    pub name: String,
    pub default: Option<Value>,
    parse: ParseFn,
    serialize: SerializeFn,
}

impl std::fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("name", &self.name)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl AttributeSpec {
    pub fn new(
        name: impl Into<String>,
        parse: impl Fn(&SourceElement) -> Option<Value> + Send + Sync + 'static,
        serialize: impl Fn(&Value) -> MarkupAttrs + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            default: None,
            parse: Arc::new(parse),
            serialize: Arc::new(serialize),
        }
    }

    /// An attribute stored as one inline CSS declaration, e.g. `font-size: 12px`.
    pub fn style_property(name: impl Into<String>, property: &'static str) -> Self {
        Self::new(
            name,
            move |el| el.style(property).map(Value::String),
            move |value| {
                let mut out = MarkupAttrs::new();
                if let Some(css) = css_value(value) {
                    out.insert("style".to_string(), format!("{property}: {css}"));
                }
                out
            },
        )
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn parse(&self, el: &SourceElement) -> Option<Value> {
        (self.parse)(el).filter(|v| !v.is_null())
    }

    pub fn serialize(&self, value: Option<&Value>) -> MarkupAttrs {
        match value {
            Some(value) if !value.is_null() => (self.serialize)(value),
            _ => MarkupAttrs::new(),
        }
    }
}

fn css_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct AttributeRegistration {
    pub targets: Vec<AttributeTarget>,
    pub spec: AttributeSpec,
}

impl AttributeRegistration {
    pub fn new(targets: impl IntoIterator<Item = AttributeTarget>, spec: AttributeSpec) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            spec,
        }
    }
}

#[derive(Default)]
pub struct AttributeRegistry {
    entries: Vec<(AttributeTarget, Arc<AttributeSpec>)>,
}

impl AttributeRegistry {
    pub fn register(
        &mut self,
        targets: impl IntoIterator<Item = AttributeTarget>,
        spec: AttributeSpec,
    ) -> Result<(), RegistryError> {
        let targets: Vec<AttributeTarget> = targets.into_iter().collect();
        for target in &targets {
            if self.get(*target, &spec.name).is_some() {
                return Err(RegistryError::DuplicateAttribute(spec.name.clone()));
            }
        }

        let spec = Arc::new(spec);
        for target in targets {
            tracing::trace!(?target, name = %spec.name, "registered attribute");
            self.entries.push((target, spec.clone()));
        }
        Ok(())
    }

    pub fn get(&self, target: AttributeTarget, name: &str) -> Option<&AttributeSpec> {
        self.entries
            .iter()
            .find(|(t, spec)| *t == target && spec.name == name)
            .map(|(_, spec)| spec.as_ref())
    }

    pub fn for_target(&self, target: AttributeTarget) -> impl Iterator<Item = &AttributeSpec> {
        self.entries
            .iter()
            .filter(move |(t, _)| *t == target)
            .map(|(_, spec)| spec.as_ref())
    }

    /// Replaces the default of every registration named `name`. Returns false when the
    /// attribute is unknown.
    pub fn set_default(&mut self, name: &str, default: Option<Value>) -> bool {
        let mut found = false;
        for (_, spec) in self.entries.iter_mut().filter(|(_, spec)| spec.name == name) {
            Arc::make_mut(spec).default = default.clone();
            found = true;
        }
        found
    }

    pub fn value_or_default(
        &self,
        target: AttributeTarget,
        name: &str,
        attrs: Option<&Attrs>,
    ) -> Option<Value> {
        attrs
            .and_then(|attrs| attrs.get(name))
            .filter(|value| !value.is_null())
            .or_else(|| self.get(target, name)?.default.as_ref())
            .cloned()
    }

    pub fn targets_of(&self, name: &str) -> Vec<AttributeTarget> {
        self.entries
            .iter()
            .filter(|(_, spec)| spec.name == name)
            .map(|(target, _)| *target)
            .collect()
    }

    pub fn parse_attrs(&self, target: AttributeTarget, el: &SourceElement) -> Attrs {
        self.for_target(target)
            .filter_map(|spec| Some((spec.name.clone(), spec.parse(el)?)))
            .collect()
    }

    /// Renders every attribute registered on `target` onto one element. Style fragments
    /// are merged into a single declaration list.
    pub fn render_attrs(&self, target: AttributeTarget, attrs: &Attrs) -> MarkupAttrs {
        let mut out = MarkupAttrs::new();
        for spec in self.for_target(target) {
            for (key, value) in spec.serialize(attrs.get(&spec.name)) {
                match out.get_mut(&key) {
                    Some(existing) if key == "style" => {
                        existing.push_str("; ");
                        existing.push_str(&value);
                    }
                    _ => {
                        out.insert(key, value);
                    }
                }
            }
        }
        out
    }
}

pub fn set_attribute(editor: &mut Editor, name: &str, value: Value) -> Result<(), CommandError> {
    if value.is_null() {
        return unset_attribute(editor, name);
    }
    // Stored in the same string form `parse` yields, so a load after a render is lossless.
    let value = css_value(&value)
        .map(Value::String)
        .ok_or_else(|| CommandError::new(format!("Invalid value for {name}: {value}")))?;
    let patch_value = Some(value.clone());
    update_attribute(
        editor,
        name,
        |marks| marks.with_text_style_attr(name, patch_value.clone()),
        |attrs| {
            (attrs.get(name) != Some(&value)).then(|| AttrPatch::set(name.to_string(), value.clone()))
        },
        "command:attribute.set",
    )
}

pub fn unset_attribute(editor: &mut Editor, name: &str) -> Result<(), CommandError> {
    update_attribute(
        editor,
        name,
        |marks| marks.with_text_style_attr(name, None),
        |attrs| attrs.contains_key(name).then(|| AttrPatch::remove(name.to_string())),
        "command:attribute.unset",
    )
}

fn update_attribute(
    editor: &mut Editor,
    name: &str,
    mark_update: impl Fn(Marks) -> Marks,
    node_patch: impl Fn(&Attrs) -> Option<AttrPatch>,
    source: &str,
) -> Result<(), CommandError> {
    let targets = editor.registry().attributes().targets_of(name);
    if targets.is_empty() {
        return Err(CommandError::new(format!("Unknown attribute: {name}")));
    }

    let mut ops: Vec<Op> = Vec::new();
    let mut selection_after = editor.selection().clone();

    let node_kinds: Vec<NodeKind> = targets
        .iter()
        .filter_map(|t| match t {
            AttributeTarget::Node(kind) => Some(*kind),
            AttributeTarget::Mark(_) => None,
        })
        .collect();
    if !node_kinds.is_empty() {
        let blocks = selected_text_blocks(editor.doc(), editor.registry(), editor.selection())
            .map_err(CommandError::new)?;
        for block in blocks {
            if !node_kinds.contains(&block.el.kind) {
                continue;
            }
            if let Some(patch) = node_patch(&block.el.attrs) {
                ops.push(Op::SetNodeAttrs {
                    path: block.path.clone(),
                    patch,
                });
            }
        }
    }

    if targets.contains(&AttributeTarget::Mark(MarkKind::TextStyle)) {
        let selection = editor.selection().clone();
        let result = if selection.is_collapsed() {
            set_marks_at_caret(editor, &mark_update)
        } else {
            apply_mark_range(editor, &selection, &mark_update)
        };
        let (mark_ops, sel) = result.map_err(CommandError::new)?;
        ops.extend(mark_ops);
        selection_after = sel;
    }

    if ops.is_empty() {
        tracing::trace!(name, "attribute already in place");
        return Ok(());
    }

    editor
        .apply(
            Transaction::new(ops)
                .selection_after(selection_after)
                .source(source),
        )
        .map_err(|err| CommandError::new(format!("Failed to apply {source}: {err}")))
}

fn required_arg(args: Option<&Value>, key: &str) -> Result<Value, CommandError> {
    args.and_then(|args| args.get(key))
        .filter(|value| !value.is_null())
        .cloned()
        .ok_or_else(|| CommandError::new(format!("Missing args.{key}")))
}

pub(crate) struct FontSizePlugin;

impl PlatePlugin for FontSizePlugin {
    fn id(&self) -> &'static str {
        "font_size"
    }

    fn attributes(&self) -> Vec<AttributeRegistration> {
        vec![AttributeRegistration::new(
            [AttributeTarget::Mark(MarkKind::TextStyle)],
            AttributeSpec::style_property("font_size", "font-size"),
        )]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("mark.set_font_size", "Set font size", |editor, args| {
                let size = required_arg(args.as_ref(), "size")?;
                set_attribute(editor, "font_size", size)
            })
            .description("Set the font size of the selected text.")
            .keywords(["font", "size", "text"])
            .args_example(serde_json::json!({ "size": "18px" })),
            CommandSpec::new("mark.unset_font_size", "Reset font size", |editor, _args| {
                unset_attribute(editor, "font_size")
            })
            .description("Remove the explicit font size from the selected text.")
            .keywords(["font", "size", "reset"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("mark.font_size", |editor, _args| {
            Ok(editor
                .registry()
                .attributes()
                .value_or_default(
                    AttributeTarget::Mark(MarkKind::TextStyle),
                    "font_size",
                    active_marks(editor).text_style.as_ref(),
                )
                .unwrap_or(Value::Null))
        })]
    }
}

pub(crate) struct LineHeightPlugin;

impl PlatePlugin for LineHeightPlugin {
    fn id(&self) -> &'static str {
        "line_height"
    }

    fn attributes(&self) -> Vec<AttributeRegistration> {
        vec![AttributeRegistration::new(
            [
                AttributeTarget::Node(NodeKind::Paragraph),
                AttributeTarget::Node(NodeKind::Heading),
            ],
            AttributeSpec::style_property("line_height", "line-height"),
        )]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_line_height", "Set line height", |editor, args| {
                let value = required_arg(args.as_ref(), "value")?;
                set_attribute(editor, "line_height", value)
            })
            .description("Set the line height of the selected paragraphs and headings.")
            .keywords(["line", "height", "spacing"])
            .args_example(serde_json::json!({ "value": "1.5" })),
            CommandSpec::new("block.unset_line_height", "Reset line height", |editor, _args| {
                unset_attribute(editor, "line_height")
            })
            .description("Remove the explicit line height from the selected blocks.")
            .keywords(["line", "height", "reset"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.line_height", |editor, _args| {
            let focus = &editor.selection().focus;
            let Some((_, block_path)) = focus.path.split_last() else {
                return Err(QueryError::new("Selection is not in a text block"));
            };
            let Some(Node::Element(block)) = editor.doc().node_at(block_path) else {
                return Err(QueryError::new("Selection is not in a text block"));
            };
            Ok(editor
                .registry()
                .attributes()
                .value_or_default(
                    AttributeTarget::Node(block.kind),
                    "line_height",
                    Some(&block.attrs),
                )
                .unwrap_or(Value::Null))
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_declarations_are_trimmed_and_lowercased() {
        let decls = style_declarations(" Font-Size : 12px ;; color:red; bogus ");
        assert_eq!(
            decls,
            vec![
                ("font-size".to_string(), "12px".to_string()),
                ("color".to_string(), "red".to_string()),
            ]
        );
    }

    #[test]
    fn later_declarations_win() {
        let el = SourceElement::new("span").attribute("style", "font-size: 10px; font-size: 14px");
        assert_eq!(el.style("font-size").as_deref(), Some("14px"));
        assert_eq!(el.style("line-height"), None);
    }

    #[test]
    fn unset_values_serialize_to_nothing() {
        let spec = AttributeSpec::style_property("font_size", "font-size");
        assert!(spec.serialize(None).is_empty());
        assert!(spec.serialize(Some(&Value::Null)).is_empty());
        assert_eq!(
            spec.serialize(Some(&Value::String("12px".into())))
                .get("style")
                .map(String::as_str),
            Some("font-size: 12px")
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = AttributeRegistry::default();
        let target = AttributeTarget::Node(NodeKind::Paragraph);
        registry
            .register([target], AttributeSpec::style_property("line_height", "line-height"))
            .unwrap();
        let err = registry
            .register([target], AttributeSpec::style_property("line_height", "line-height"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateAttribute("line_height".into()));
    }

    #[test]
    fn style_fragments_merge_on_render() {
        let mut registry = AttributeRegistry::default();
        let target = AttributeTarget::Node(NodeKind::Paragraph);
        registry
            .register([target], AttributeSpec::style_property("line_height", "line-height"))
            .unwrap();
        registry
            .register([target], AttributeSpec::style_property("indent", "text-indent"))
            .unwrap();

        let mut attrs = Attrs::new();
        attrs.insert("line_height".into(), Value::String("2".into()));
        attrs.insert("indent".into(), Value::String("1em".into()));

        let markup = registry.render_attrs(target, &attrs);
        assert_eq!(
            markup.get("style").map(String::as_str),
            Some("line-height: 2; text-indent: 1em")
        );

        let parsed = registry.parse_attrs(target, &SourceElement::with_markup("p", markup));
        assert_eq!(parsed, attrs);
    }
}
