use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attrs::{MarkupAttrs, SourceElement};
use crate::core::{AttrPatch, Attrs, Document, Node, NodeKind, Point, Selection, VoidNode};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{
    ChildConstraint, CommandError, CommandSpec, NodeRole, NodeSpec, PlatePlugin, QueryError,
    QuerySpec, block_insert_point,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAlign {
    Left,
    #[default]
    Center,
    Right,
    Inline,
}

impl ImageAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageAlign::Left => "left",
            ImageAlign::Center => "center",
            ImageAlign::Right => "right",
            ImageAlign::Inline => "inline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "left" => Some(ImageAlign::Left),
            "center" => Some(ImageAlign::Center),
            "right" => Some(ImageAlign::Right),
            "inline" => Some(ImageAlign::Inline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageWrapping {
    #[default]
    #[serde(rename = "wrap")]
    Wrap,
    #[serde(rename = "nowrap")]
    NoWrap,
    #[serde(rename = "tight")]
    Tight,
}

impl ImageWrapping {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageWrapping::Wrap => "wrap",
            ImageWrapping::NoWrap => "nowrap",
            ImageWrapping::Tight => "tight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "wrap" => Some(ImageWrapping::Wrap),
            "nowrap" => Some(ImageWrapping::NoWrap),
            "tight" => Some(ImageWrapping::Tight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttrs {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub align: ImageAlign,
    #[serde(default)]
    pub wrapping: ImageWrapping,
}

impl ImageAttrs {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
            width: None,
            height: None,
            align: ImageAlign::default(),
            wrapping: ImageWrapping::default(),
        }
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn align(mut self, align: ImageAlign) -> Self {
        self.align = align;
        self
    }

    pub fn wrapping(mut self, wrapping: ImageWrapping) -> Self {
        self.wrapping = wrapping;
        self
    }

    pub fn from_attrs(attrs: &Attrs) -> Option<Self> {
        let src = attrs.get("src")?.as_str()?.to_string();
        let dimension = |key: &str| {
            attrs
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
        };
        Some(Self {
            src,
            alt: attrs.get("alt").and_then(Value::as_str).map(str::to_string),
            width: dimension("width"),
            height: dimension("height"),
            align: attrs
                .get("align")
                .and_then(Value::as_str)
                .and_then(ImageAlign::parse)
                .unwrap_or_default(),
            wrapping: attrs
                .get("wrapping")
                .and_then(Value::as_str)
                .and_then(ImageWrapping::parse)
                .unwrap_or_default(),
        })
    }

    pub fn to_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("src".into(), Value::String(self.src.clone()));
        if let Some(alt) = &self.alt {
            attrs.insert("alt".into(), Value::String(alt.clone()));
        }
        if let Some(width) = self.width {
            attrs.insert("width".into(), Value::from(width));
        }
        if let Some(height) = self.height {
            attrs.insert("height".into(), Value::from(height));
        }
        attrs.insert("align".into(), Value::String(self.align.as_str().into()));
        attrs.insert(
            "wrapping".into(),
            Value::String(self.wrapping.as_str().into()),
        );
        attrs
    }

    /// Loads an `<img>` element. Alignment and wrapping travel as `data-*` attributes.
    pub fn from_element(el: &SourceElement) -> Option<Self> {
        if !el.tag.eq_ignore_ascii_case("img") {
            return None;
        }
        let src = el.get("src").map(str::trim).filter(|s| !s.is_empty())?;
        let pixels = |key: &str| {
            el.get(key)
                .map(|v| v.trim().trim_end_matches("px"))
                .and_then(|v| v.parse::<u32>().ok())
        };
        Some(Self {
            src: src.to_string(),
            alt: el.get("alt").map(str::to_string),
            width: pixels("width"),
            height: pixels("height"),
            align: el
                .get("data-align")
                .and_then(ImageAlign::parse)
                .unwrap_or_default(),
            wrapping: el
                .get("data-wrapping")
                .and_then(ImageWrapping::parse)
                .unwrap_or_default(),
        })
    }

    pub fn to_markup(&self) -> MarkupAttrs {
        let mut out = MarkupAttrs::new();
        out.insert("src".into(), self.src.clone());
        if let Some(alt) = &self.alt {
            out.insert("alt".into(), alt.clone());
        }
        if let Some(width) = self.width {
            out.insert("width".into(), width.to_string());
        }
        if let Some(height) = self.height {
            out.insert("height".into(), height.to_string());
        }
        out.insert("data-align".into(), self.align.as_str().into());
        out.insert("data-wrapping".into(), self.wrapping.as_str().into());
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAttrsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<ImageAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping: Option<ImageWrapping>,
}

impl ImageAttrsPatch {
    pub fn size(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// The attr changes this patch makes on top of `current`. Unchanged fields drop out.
    pub fn diff(&self, current: &ImageAttrs) -> AttrPatch {
        let mut next = current.clone();
        if let Some(src) = &self.src {
            next.src = src.clone();
        }
        if let Some(alt) = &self.alt {
            next.alt = Some(alt.clone());
        }
        if let Some(width) = self.width {
            next.width = Some(width);
        }
        if let Some(height) = self.height {
            next.height = Some(height);
        }
        if let Some(align) = self.align {
            next.align = align;
        }
        if let Some(wrapping) = self.wrapping {
            next.wrapping = wrapping;
        }

        let before = current.to_attrs();
        let mut patch = AttrPatch::default();
        for (key, value) in next.to_attrs() {
            if before.get(&key) != Some(&value) {
                patch.set.insert(key, value);
            }
        }
        patch
    }
}

impl Node {
    pub fn image(attrs: ImageAttrs) -> Self {
        Node::Void(VoidNode {
            kind: NodeKind::Image,
            attrs: attrs.to_attrs(),
        })
    }
}

impl Document {
    pub fn image_at(&self, path: &[usize]) -> Option<ImageAttrs> {
        match self.node_at(path)? {
            Node::Void(v) if v.kind == NodeKind::Image => ImageAttrs::from_attrs(&v.attrs),
            _ => None,
        }
    }
}

/// Builds the transaction applying `patch` to the image at `path`.
///
/// `Ok(None)` when the image already has those attributes.
pub fn update_image_attributes(
    doc: &Document,
    path: &[usize],
    patch: &ImageAttrsPatch,
) -> Result<Option<Transaction>, String> {
    let current = doc
        .image_at(path)
        .ok_or_else(|| format!("No image at path {path:?}"))?;
    let attr_patch = patch.diff(&current);
    if attr_patch.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        Transaction::new(vec![Op::SetNodeAttrs {
            path: path.to_vec(),
            patch: attr_patch,
        }])
        .source("command:image.update_attributes"),
    ))
}

fn insert_image(editor: &crate::core::Editor, attrs: ImageAttrs) -> Transaction {
    let (parent_path, insert_at) = block_insert_point(editor);

    let mut image_path = parent_path.clone();
    image_path.push(insert_at);
    let mut paragraph_path = parent_path;
    paragraph_path.push(insert_at + 1);
    let mut paragraph_text_path = paragraph_path.clone();
    paragraph_text_path.push(0);

    Transaction::new(vec![
        Op::InsertNode {
            path: image_path,
            node: Node::image(attrs),
        },
        Op::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(paragraph_text_path, 0)))
    .source("command:image.insert")
}

fn path_arg(args: Option<&Value>) -> Result<Path, String> {
    let value = args
        .and_then(|v| v.get("path"))
        .ok_or_else(|| "Missing args.path".to_string())?;
    serde_json::from_value(value.clone()).map_err(|err| format!("Invalid args.path: {err}"))
}

fn patch_arg(args: Option<&Value>) -> Result<ImageAttrsPatch, String> {
    match args {
        Some(args) => serde_json::from_value(args.clone())
            .map_err(|err| format!("Invalid image attributes: {err}")),
        None => Ok(ImageAttrsPatch::default()),
    }
}

pub(crate) struct ImagePlugin;

impl PlatePlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec {
            kind: NodeKind::Image,
            role: NodeRole::Block,
            is_void: true,
            children: ChildConstraint::None,
        }]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("image.insert", "Insert image", |editor, args| {
                let src = args
                    .as_ref()
                    .and_then(|v| v.get("src"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| CommandError::new("Missing args.src"))?
                    .to_string();
                let patch = patch_arg(args.as_ref()).map_err(CommandError::new)?;

                let mut attrs = ImageAttrs::new(src);
                attrs.alt = patch.alt;
                attrs.width = patch.width;
                attrs.height = patch.height;
                attrs.align = patch.align.unwrap_or_default();
                attrs.wrapping = patch.wrapping.unwrap_or_default();

                editor
                    .apply(insert_image(editor, attrs))
                    .map_err(|e| CommandError::new(format!("Failed to insert image: {e}")))
            })
            .description("Insert a block image node (void).")
            .keywords(["image", "img", "media", "void"])
            .args_example(serde_json::json!({
                "src": "https://example.com/image.png",
                "alt": "Alt text",
                "width": 320,
                "height": 240,
                "align": "center",
                "wrapping": "wrap"
            })),
            CommandSpec::new(
                "image.update_attributes",
                "Update image",
                |editor, args| {
                    let path = path_arg(args.as_ref()).map_err(CommandError::new)?;
                    let patch = patch_arg(args.as_ref()).map_err(CommandError::new)?;
                    let Some(tx) = update_image_attributes(editor.doc(), &path, &patch)
                        .map_err(CommandError::new)?
                    else {
                        return Ok(());
                    };
                    editor
                        .apply(tx)
                        .map_err(|e| CommandError::new(format!("Failed to update image: {e}")))
                },
            )
            .description("Change the size, alignment or wrapping of an image.")
            .keywords(["image", "resize", "align", "wrap"])
            .args_example(serde_json::json!({
                "path": [1],
                "width": 250,
                "height": 180,
                "align": "left",
                "wrapping": "tight"
            })),
            CommandSpec::new("image.remove", "Remove image", |editor, args| {
                let path = path_arg(args.as_ref()).map_err(CommandError::new)?;
                if editor.doc().image_at(&path).is_none() {
                    return Err(CommandError::new(format!("No image at path {path:?}")));
                }
                editor
                    .apply(Transaction::new(vec![Op::RemoveNode { path }]).source("command:image.remove"))
                    .map_err(|e| CommandError::new(format!("Failed to remove image: {e}")))
            })
            .description("Delete an image node.")
            .keywords(["image", "delete", "remove"])
            .args_example(serde_json::json!({ "path": [1] })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("image.attributes", |editor, args| {
            let path = path_arg(args.as_ref()).map_err(QueryError::new)?;
            let attrs = editor
                .doc()
                .image_at(&path)
                .ok_or_else(|| QueryError::new(format!("No image at path {path:?}")))?;
            serde_json::to_value(attrs)
                .map_err(|err| QueryError::new(format!("Failed to encode image: {err}")))
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_layout_attrs_fall_back_to_defaults() {
        let mut attrs = Attrs::new();
        attrs.insert("src".into(), Value::String("a.png".into()));
        let image = ImageAttrs::from_attrs(&attrs).unwrap();
        assert_eq!(image.align, ImageAlign::Center);
        assert_eq!(image.wrapping, ImageWrapping::Wrap);
        assert_eq!(image.width, None);
    }

    #[test]
    fn wrapping_serializes_as_plain_words() {
        assert_eq!(
            serde_json::to_value(ImageWrapping::NoWrap).unwrap(),
            serde_json::json!("nowrap")
        );
        assert_eq!(ImageWrapping::parse("tight"), Some(ImageWrapping::Tight));
    }

    #[test]
    fn markup_round_trips() {
        let image = ImageAttrs::new("a.png")
            .alt("A")
            .size(320, 200)
            .align(ImageAlign::Right)
            .wrapping(ImageWrapping::Tight);
        let el = SourceElement::with_markup("img", image.to_markup());
        assert_eq!(ImageAttrs::from_element(&el), Some(image));
    }

    #[test]
    fn diff_only_carries_changed_fields() {
        let image = ImageAttrs::new("a.png").size(200, 150);
        let patch = ImageAttrsPatch {
            width: Some(250),
            height: Some(150),
            ..ImageAttrsPatch::default()
        }
        .diff(&image);
        assert_eq!(patch.set.len(), 1);
        assert_eq!(patch.set.get("width"), Some(&Value::from(250u32)));
    }
}
