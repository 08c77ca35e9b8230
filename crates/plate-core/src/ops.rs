use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::{AttrPatch, Marks, Node, Selection};

pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: Range<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    SetNodeAttrs {
        #[serde(default)]
        path: Path,
        patch: AttrPatch,
    },
    SetTextMarks {
        #[serde(default)]
        path: Path,
        marks: Marks,
    },
}

impl Op {
    /// Maps a node path through this op. Returns `None` when the op removes the node
    /// (or one of its ancestors).
    pub fn map_path(&self, path: &[usize]) -> Option<Path> {
        match self {
            Op::InsertNode { path: at, .. } => Some(shift_after_insert(path, at)),
            Op::RemoveNode { path: at } => shift_after_remove(path, at),
            Op::InsertText { .. }
            | Op::RemoveText { .. }
            | Op::SetNodeAttrs { .. }
            | Op::SetTextMarks { .. } => Some(path.to_vec()),
        }
    }
}

fn shift_after_insert(path: &[usize], at: &[usize]) -> Path {
    let mut mapped = path.to_vec();
    let Some((&index, parent)) = at.split_last() else {
        return mapped;
    };
    let depth = parent.len();
    if mapped.len() > depth && mapped.starts_with(parent) && mapped[depth] >= index {
        mapped[depth] += 1;
    }
    mapped
}

fn shift_after_remove(path: &[usize], at: &[usize]) -> Option<Path> {
    let Some((&index, parent)) = at.split_last() else {
        return Some(path.to_vec());
    };
    if path.starts_with(at) {
        return None;
    }
    let mut mapped = path.to_vec();
    let depth = parent.len();
    if mapped.len() > depth && mapped.starts_with(parent) && mapped[depth] > index {
        mapped[depth] -= 1;
    }
    Some(mapped)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            selection_after: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn selection_after(mut self, selection_after: Selection) -> Self {
        self.selection_after = Some(selection_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_shifts_later_siblings() {
        let op = Op::InsertNode {
            path: vec![1],
            node: Node::paragraph(""),
        };
        assert_eq!(op.map_path(&[0]), Some(vec![0]));
        assert_eq!(op.map_path(&[1]), Some(vec![2]));
        assert_eq!(op.map_path(&[3, 0]), Some(vec![4, 0]));
    }

    #[test]
    fn remove_drops_the_node_and_its_descendants() {
        let op = Op::RemoveNode { path: vec![1] };
        assert_eq!(op.map_path(&[1]), None);
        assert_eq!(op.map_path(&[1, 0]), None);
        assert_eq!(op.map_path(&[2]), Some(vec![1]));
        assert_eq!(op.map_path(&[0, 4]), Some(vec![0, 4]));
    }

    #[test]
    fn nested_insert_leaves_other_branches_alone() {
        let op = Op::InsertNode {
            path: vec![0, 0],
            node: Node::paragraph(""),
        };
        assert_eq!(op.map_path(&[1]), Some(vec![1]));
        assert_eq!(op.map_path(&[0, 2]), Some(vec![0, 3]));
    }
}
