use inkpress_plate_core::{Node, NodeKind, Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    pub path: Path,
    pub generation: u64,
}

impl NodeLocation {
    pub fn new(path: Path, generation: u64) -> Self {
        Self { path, generation }
    }
}

pub trait NodeRenderer {
    type Handle;

    fn kind(&self) -> NodeKind;

    fn mount(&self, node: &Node, location: NodeLocation) -> Option<Self::Handle>;

    /// Applies `node` to an existing handle. Returning `false` asks the host to unmount
    /// the handle and mount a fresh one.
    fn update(&self, handle: &mut Self::Handle, node: &Node) -> bool;

    /// Records the node's mapped location after a transaction.
    fn relocate(&self, handle: &mut Self::Handle, location: NodeLocation);

    fn unmount(&self, handle: Self::Handle);
}
