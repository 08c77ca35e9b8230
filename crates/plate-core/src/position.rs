//! Absolute positions over the document tree.
//!
//! Every element contributes an opening and a closing token, every void one token and
//! every text leaf its UTF-8 length. No token sits between sibling text leaves, so
//! merging them never moves a position. Positions are only meaningful for the
//! generation they were computed against.

use std::ops::Range;

use crate::core::{Document, Node, Point};
use crate::ops::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLeaf<'a> {
    pub path: Path,
    pub base: usize,
    pub text: &'a str,
}

impl TextLeaf<'_> {
    pub fn end(&self) -> usize {
        self.base + self.text.len()
    }
}

impl Document {
    pub fn text_leaves(&self) -> Vec<TextLeaf<'_>> {
        fn walk<'a>(
            nodes: &'a [Node],
            path: &mut Vec<usize>,
            pos: &mut usize,
            out: &mut Vec<TextLeaf<'a>>,
        ) {
            for (ix, node) in nodes.iter().enumerate() {
                path.push(ix);
                match node {
                    Node::Text(t) => {
                        out.push(TextLeaf {
                            path: path.clone(),
                            base: *pos,
                            text: &t.text,
                        });
                        *pos += t.text.len();
                    }
                    Node::Void(_) => *pos += 1,
                    Node::Element(el) => {
                        *pos += 1;
                        walk(&el.children, path, pos, out);
                        *pos += 1;
                    }
                }
                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut Vec::new(), &mut 0, &mut out);
        out
    }

    pub fn content_size(&self) -> usize {
        fn size(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::Text(t) => t.text.len(),
                    Node::Void(_) => 1,
                    Node::Element(el) => 2 + size(&el.children),
                })
                .sum()
        }
        size(&self.children)
    }

    /// Resolves `from..to` to a text leaf path and a byte range inside that leaf.
    ///
    /// Fails when the range crosses a leaf boundary or splits a character.
    pub fn resolve_text_range(&self, from: usize, to: usize) -> Option<(Path, Range<usize>)> {
        if to < from {
            return None;
        }
        self.text_leaves().into_iter().find_map(|leaf| {
            let inside = leaf.base <= from && to <= leaf.end() && (from < leaf.end() || from == to);
            if !inside {
                return None;
            }
            let local = from - leaf.base..to - leaf.base;
            if !leaf.text.is_char_boundary(local.start) || !leaf.text.is_char_boundary(local.end) {
                return None;
            }
            Some((leaf.path, local))
        })
    }

    pub fn text_between(&self, from: usize, to: usize) -> Option<&str> {
        let (path, range) = self.resolve_text_range(from, to)?;
        match self.node_at(&path)? {
            Node::Text(t) => t.text.get(range),
            _ => None,
        }
    }

    pub fn point_at(&self, pos: usize) -> Option<Point> {
        let (path, range) = self.resolve_text_range(pos, pos)?;
        Some(Point::new(path, range.start))
    }

    pub fn position_of(&self, point: &Point) -> Option<usize> {
        self.text_leaves()
            .into_iter()
            .find(|leaf| leaf.path == point.path)
            .map(|leaf| leaf.base + point.offset.min(leaf.text.len()))
    }
}
