mod config;
mod image_view;
mod layout;
mod node_views;
mod renderer;

pub use crate::config::*;
pub use crate::image_view::*;
pub use crate::layout::*;
pub use crate::node_views::*;
pub use crate::renderer::*;
