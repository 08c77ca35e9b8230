use inkpress_plate_core::{ImageAlign, ImageAttrs, ImageWrapping};
use serde::{Deserialize, Serialize};

use crate::config::ImageViewConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    Block,
    InlineBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Float {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Clear {
    None,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    Baseline,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Px(f32),
    Auto,
}

impl Length {
    fn css(self) -> String {
        match self {
            Length::Px(px) if px == 0.0 => "0".to_string(),
            Length::Px(px) => format!("{px}px"),
            Length::Auto => "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margin {
    fn zero() -> Self {
        Self {
            top: Length::Px(0.0),
            right: Length::Px(0.0),
            bottom: Length::Px(0.0),
            left: Length::Px(0.0),
        }
    }
}

/// Box placement of an image, derived from its `align` and `wrapping` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageLayout {
    pub display: Display,
    pub float: Float,
    pub clear: Clear,
    pub margin: Margin,
    pub vertical_align: VerticalAlign,
}

impl ImageLayout {
    pub fn compute(align: ImageAlign, wrapping: ImageWrapping, config: &ImageViewConfig) -> Self {
        let spacing = match wrapping {
            ImageWrapping::Tight => config.tight_margin,
            ImageWrapping::Wrap | ImageWrapping::NoWrap => config.wrap_margin,
        };
        let gap = Length::Px(spacing);
        let mut margin = Margin::zero();

        let mut layout = match align {
            ImageAlign::Left => {
                margin.right = gap;
                margin.bottom = gap;
                ImageLayout {
                    display: Display::Block,
                    float: Float::Left,
                    clear: Clear::None,
                    margin,
                    vertical_align: VerticalAlign::Baseline,
                }
            }
            ImageAlign::Right => {
                margin.left = gap;
                margin.bottom = gap;
                ImageLayout {
                    display: Display::Block,
                    float: Float::Right,
                    clear: Clear::None,
                    margin,
                    vertical_align: VerticalAlign::Baseline,
                }
            }
            ImageAlign::Center => {
                margin.left = Length::Auto;
                margin.right = Length::Auto;
                margin.bottom = gap;
                ImageLayout {
                    display: Display::Block,
                    float: Float::None,
                    clear: Clear::None,
                    margin,
                    vertical_align: VerticalAlign::Baseline,
                }
            }
            ImageAlign::Inline => {
                margin.left = gap;
                margin.right = gap;
                ImageLayout {
                    display: Display::InlineBlock,
                    float: Float::None,
                    clear: Clear::None,
                    margin,
                    vertical_align: VerticalAlign::Middle,
                }
            }
        };

        // Text never flows beside a nowrap image: it keeps its side but leaves the float
        // flow.
        if wrapping == ImageWrapping::NoWrap {
            layout.clear = Clear::Both;
            match layout.float {
                Float::Left => layout.margin.right = Length::Auto,
                Float::Right => layout.margin.left = Length::Auto,
                Float::None => {}
            }
            layout.float = Float::None;
        }

        layout
    }

    pub fn css(&self) -> String {
        let display = match self.display {
            Display::Block => "block",
            Display::InlineBlock => "inline-block",
        };
        let mut decls = vec![format!("display: {display}")];
        match self.float {
            Float::Left => decls.push("float: left".into()),
            Float::Right => decls.push("float: right".into()),
            Float::None => {}
        }
        if self.clear == Clear::Both {
            decls.push("clear: both".into());
        }
        let m = &self.margin;
        decls.push(format!(
            "margin: {} {} {} {}",
            m.top.css(),
            m.right.css(),
            m.bottom.css(),
            m.left.css()
        ));
        if self.vertical_align == VerticalAlign::Middle {
            decls.push("vertical-align: middle".into());
        }
        decls.join("; ")
    }
}

/// The rendered element of one image view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub layout: ImageLayout,
    pub handles_visible: bool,
}

impl ImageElement {
    pub fn new(attrs: &ImageAttrs, config: &ImageViewConfig) -> Self {
        Self {
            src: attrs.src.clone(),
            alt: attrs.alt.clone(),
            width: attrs.width.map(|w| w as f32),
            height: attrs.height.map(|h| h as f32),
            layout: ImageLayout::compute(attrs.align, attrs.wrapping, config),
            handles_visible: false,
        }
    }

    /// Re-applies document attributes in place.
    pub fn apply(&mut self, attrs: &ImageAttrs, config: &ImageViewConfig) {
        self.src.clone_from(&attrs.src);
        self.alt.clone_from(&attrs.alt);
        self.width = attrs.width.map(|w| w as f32);
        self.height = attrs.height.map(|h| h as f32);
        self.layout = ImageLayout::compute(attrs.align, attrs.wrapping, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImageViewConfig {
        ImageViewConfig::default().with_defaults()
    }

    #[test]
    fn left_floats_with_trailing_margin() {
        let layout = ImageLayout::compute(ImageAlign::Left, ImageWrapping::Wrap, &config());
        assert_eq!(layout.float, Float::Left);
        assert_eq!(layout.css(), "display: block; float: left; margin: 0 16px 16px 0");
    }

    #[test]
    fn tight_shrinks_the_margin() {
        let layout = ImageLayout::compute(ImageAlign::Right, ImageWrapping::Tight, &config());
        assert_eq!(layout.margin.left, Length::Px(4.0));
    }

    #[test]
    fn nowrap_leaves_the_float_flow() {
        let layout = ImageLayout::compute(ImageAlign::Right, ImageWrapping::NoWrap, &config());
        assert_eq!(layout.float, Float::None);
        assert_eq!(layout.clear, Clear::Both);
        assert_eq!(layout.margin.left, Length::Auto);
    }
}
