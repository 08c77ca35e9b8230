use inkpress_plate_core::{Document, Editor, Node, NodeKind, Path};

use crate::config::ImageViewConfig;
use crate::image_view::{ImageRenderer, ImageView};
use crate::renderer::{NodeLocation, NodeRenderer};

#[derive(Debug, Clone)]
pub enum MountedView {
    Image(ImageView),
}

impl MountedView {
    pub fn kind(&self) -> NodeKind {
        match self {
            MountedView::Image(_) => NodeKind::Image,
        }
    }

    pub fn location(&self) -> &NodeLocation {
        match self {
            MountedView::Image(view) => view.location(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub mounted: usize,
    pub updated: usize,
    pub recreated: usize,
    pub unmounted: usize,
}

pub struct NodeViews {
    images: ImageRenderer,
    views: Vec<MountedView>,
    generation: Option<u64>,
}

impl NodeViews {
    pub fn new(config: ImageViewConfig) -> Self {
        Self {
            images: ImageRenderer::new(config),
            views: Vec::new(),
            generation: None,
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountedView> {
        self.views.iter()
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn image_at(&self, path: &[usize]) -> Option<&ImageView> {
        self.views.iter().find_map(|view| match view {
            MountedView::Image(image) if image.location().path == path => Some(image),
            _ => None,
        })
    }

    pub fn image_at_mut(&mut self, path: &[usize]) -> Option<&mut ImageView> {
        self.views.iter_mut().find_map(|view| match view {
            MountedView::Image(image) if image.location().path == path => Some(image),
            _ => None,
        })
    }

    /// Re-derives every view after the editor moved to a new generation. Views follow
    /// their node through inserts and removals, update in place while the kind stays
    /// the same and are recreated or unmounted otherwise. Nodes without a view get one.
    pub fn sync(&mut self, editor: &Editor) -> SyncReport {
        let generation = editor.generation();
        let mut report = SyncReport::default();
        let mut kept: Vec<MountedView> = Vec::with_capacity(self.views.len());

        for view in std::mem::take(&mut self.views) {
            let location = view.location().clone();
            let mapped = editor.map_path(&location.path, location.generation);
            let node = mapped
                .as_ref()
                .and_then(|path| editor.doc().node_at(path));

            let (Some(path), Some(node)) = (mapped.clone(), node) else {
                self.unmount(view);
                report.unmounted += 1;
                continue;
            };
            let location = NodeLocation::new(path, generation);

            let stale = if node.kind() != Some(view.kind()) {
                view
            } else {
                match view {
                    MountedView::Image(mut image) => {
                        self.images.relocate(&mut image, location.clone());
                        if self.images.update(&mut image, node) {
                            kept.push(MountedView::Image(image));
                            report.updated += 1;
                            continue;
                        }
                        MountedView::Image(image)
                    }
                }
            };

            self.unmount(stale);
            match self.mount(node, location) {
                Some(fresh) => {
                    kept.push(fresh);
                    report.recreated += 1;
                }
                None => report.unmounted += 1,
            }
        }

        for (path, node) in custom_nodes(editor.doc()) {
            if kept.iter().any(|view| view.location().path == path) {
                continue;
            }
            if let Some(view) = self.mount(node, NodeLocation::new(path, generation)) {
                kept.push(view);
                report.mounted += 1;
            }
        }

        kept.sort_by(|a, b| a.location().path.cmp(&b.location().path));
        self.views = kept;
        self.generation = Some(generation);
        tracing::trace!(generation, ?report, "node views synced");
        report
    }

    pub fn clear(&mut self) {
        for view in std::mem::take(&mut self.views) {
            self.unmount(view);
        }
        self.generation = None;
    }

    fn mount(&self, node: &Node, location: NodeLocation) -> Option<MountedView> {
        match node.kind()? {
            NodeKind::Image => self.images.mount(node, location).map(MountedView::Image),
            NodeKind::Paragraph | NodeKind::Heading => None,
        }
    }

    fn unmount(&self, view: MountedView) {
        match view {
            MountedView::Image(image) => self.images.unmount(image),
        }
    }
}

fn custom_nodes(doc: &Document) -> Vec<(Path, &Node)> {
    fn walk<'a>(nodes: &'a [Node], path: &mut Vec<usize>, out: &mut Vec<(Path, &'a Node)>) {
        for (ix, node) in nodes.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Void(v) if v.kind == NodeKind::Image => out.push((path.clone(), node)),
                Node::Element(el) => walk(&el.children, path, out),
                _ => {}
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, &mut Vec::new(), &mut out);
    out
}
