use inkpress_plate_core::{
    Editor, ImageAttrs, ImageAttrsPatch, Node, NodeKind, update_image_attributes,
};
use serde::{Deserialize, Serialize};

use crate::config::ImageViewConfig;
use crate::layout::ImageElement;
use crate::renderer::{NodeLocation, NodeRenderer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::S,
        ResizeHandle::E,
        ResizeHandle::W,
        ResizeHandle::Ne,
        ResizeHandle::Nw,
        ResizeHandle::Se,
        ResizeHandle::Sw,
    ];

    /// Sign applied to the horizontal pointer delta, `0` when the handle leaves the
    /// width alone.
    fn width_sign(self) -> f32 {
        match self {
            ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se => 1.0,
            ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw => -1.0,
            ResizeHandle::N | ResizeHandle::S => 0.0,
        }
    }

    fn height_sign(self) -> f32 {
        match self {
            ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw => 1.0,
            ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw => -1.0,
            ResizeHandle::E | ResizeHandle::W => 0.0,
        }
    }

    /// Size after dragging this handle by `(dx, dy)` from `start`, floored at `min` on
    /// each axis.
    pub fn resize(self, start: Size, dx: f32, dy: f32, min: f32) -> Size {
        Size {
            width: (start.width + self.width_sign() * dx).max(min),
            height: (start.height + self.height_sign() * dy).max(min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pub handle: ResizeHandle,
    pub start_pointer: Position,
    pub start_size: Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ResizeState {
    #[default]
    Idle,
    Dragging(ResizeSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { width: u32, height: u32 },
    /// The drag ended where it started; no transaction was dispatched.
    Unchanged,
    /// The image no longer resolves. The view falls back to its last committed size.
    Discarded,
    NotDragging,
}

#[derive(Debug, Clone)]
pub struct ImageView {
    location: NodeLocation,
    attrs: ImageAttrs,
    element: ImageElement,
    natural_size: Option<Size>,
    hovered: bool,
    state: ResizeState,
    config: ImageViewConfig,
}

impl ImageView {
    pub fn new(attrs: ImageAttrs, location: NodeLocation, config: ImageViewConfig) -> Self {
        let config = config.with_defaults();
        Self {
            element: ImageElement::new(&attrs, &config),
            location,
            attrs,
            natural_size: None,
            hovered: false,
            state: ResizeState::Idle,
            config,
        }
    }

    pub fn location(&self) -> &NodeLocation {
        &self.location
    }

    pub fn attrs(&self) -> &ImageAttrs {
        &self.attrs
    }

    pub fn element(&self) -> &ImageElement {
        &self.element
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging(_))
    }

    /// Intrinsic size reported by the surface once the image loaded. Used as the drag
    /// origin for images without explicit dimensions.
    pub fn set_natural_size(&mut self, size: Size) {
        self.natural_size = Some(size);
    }

    pub fn rendered_size(&self) -> Size {
        let natural = self
            .natural_size
            .unwrap_or(Size::new(self.config.min_size, self.config.min_size));
        Size {
            width: self.element.width.unwrap_or(natural.width),
            height: self.element.height.unwrap_or(natural.height),
        }
    }

    pub fn hover_enter(&mut self) {
        self.hovered = true;
        self.refresh_handles();
    }

    pub fn hover_leave(&mut self) {
        self.hovered = false;
        self.refresh_handles();
    }

    pub fn pointer_down(&mut self, handle: ResizeHandle, pointer: Position) -> bool {
        if self.is_dragging() {
            return false;
        }
        let session = ResizeSession {
            handle,
            start_pointer: pointer,
            start_size: self.rendered_size(),
        };
        tracing::trace!(?handle, start_size = ?session.start_size, "image resize started");
        self.state = ResizeState::Dragging(session);
        self.refresh_handles();
        true
    }

    pub fn pointer_move(&mut self, pointer: Position) -> Option<Size> {
        let ResizeState::Dragging(session) = self.state else {
            return None;
        };
        let size = session.handle.resize(
            session.start_size,
            pointer.x - session.start_pointer.x,
            pointer.y - session.start_pointer.y,
            self.config.min_size,
        );
        self.element.width = Some(size.width);
        self.element.height = Some(size.height);
        Some(size)
    }

    pub fn pointer_up(&mut self, editor: &mut Editor) -> CommitOutcome {
        self.commit(editor)
    }

    /// Pointer capture was lost without a pointer-up. The live size is committed the
    /// same way.
    pub fn pointer_cancel(&mut self, editor: &mut Editor) -> CommitOutcome {
        self.commit(editor)
    }

    fn commit(&mut self, editor: &mut Editor) -> CommitOutcome {
        let ResizeState::Dragging(session) = std::mem::take(&mut self.state) else {
            return CommitOutcome::NotDragging;
        };
        self.refresh_handles();

        let live = self.rendered_size();
        if live == session.start_size {
            self.element.apply(&self.attrs, &self.config);
            return CommitOutcome::Unchanged;
        }
        let width = live.width.round() as u32;
        let height = live.height.round() as u32;

        let Some(path) = editor.map_path(&self.location.path, self.location.generation) else {
            tracing::debug!(path = ?self.location.path, "image removed during resize");
            return self.discard();
        };
        let tx = match update_image_attributes(
            editor.doc(),
            &path,
            &ImageAttrsPatch::size(width, height),
        ) {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                self.element.apply(&self.attrs, &self.config);
                self.location = NodeLocation::new(path, editor.generation());
                return CommitOutcome::Unchanged;
            }
            Err(err) => {
                tracing::debug!(%err, "image no longer resolves");
                return self.discard();
            }
        };
        if let Err(err) = editor.apply(tx.source("view:image.resize")) {
            tracing::warn!(%err, "image resize commit failed");
            return self.discard();
        }

        tracing::debug!(?path, width, height, "image resize committed");
        if let Some(attrs) = editor.doc().image_at(&path) {
            self.sync(attrs);
        }
        self.location = NodeLocation::new(path, editor.generation());
        CommitOutcome::Committed { width, height }
    }

    fn discard(&mut self) -> CommitOutcome {
        self.element.apply(&self.attrs, &self.config);
        CommitOutcome::Discarded
    }

    pub fn sync(&mut self, attrs: ImageAttrs) {
        if attrs == self.attrs {
            return;
        }
        self.element.apply(&attrs, &self.config);
        self.attrs = attrs;
    }

    pub fn relocate(&mut self, location: NodeLocation) {
        self.location = location;
    }

    fn refresh_handles(&mut self) {
        self.element.handles_visible = self.hovered || self.is_dragging();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageRenderer {
    config: ImageViewConfig,
}

impl ImageRenderer {
    pub fn new(config: ImageViewConfig) -> Self {
        Self {
            config: config.with_defaults(),
        }
    }
}

fn image_attrs(node: &Node) -> Option<ImageAttrs> {
    match node {
        Node::Void(v) if v.kind == NodeKind::Image => ImageAttrs::from_attrs(&v.attrs),
        _ => None,
    }
}

impl NodeRenderer for ImageRenderer {
    type Handle = ImageView;

    fn kind(&self) -> NodeKind {
        NodeKind::Image
    }

    fn mount(&self, node: &Node, location: NodeLocation) -> Option<ImageView> {
        let attrs = image_attrs(node)?;
        tracing::trace!(path = ?location.path, "mount image view");
        Some(ImageView::new(attrs, location, self.config.clone()))
    }

    fn update(&self, view: &mut ImageView, node: &Node) -> bool {
        let Some(attrs) = image_attrs(node) else {
            return false;
        };
        // A new source is a new image: its natural size is unknown again.
        if attrs.src != view.attrs.src {
            return false;
        }
        // Mid-drag the element shows the live size; the drag's commit syncs it.
        if view.is_dragging() {
            view.attrs = attrs;
            return true;
        }
        view.sync(attrs);
        true
    }

    fn relocate(&self, view: &mut ImageView, location: NodeLocation) {
        view.relocate(location);
    }

    fn unmount(&self, view: ImageView) {
        tracing::trace!(path = ?view.location.path, "unmount image view");
    }
}
