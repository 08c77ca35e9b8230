mod attrs;
mod config;
mod core;
mod debounce;
mod image;
mod ops;
mod plugin;
mod position;
mod search;
mod serde_value;

pub use crate::attrs::*;
pub use crate::config::*;
pub use crate::core::*;
pub use crate::debounce::*;
pub use crate::image::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::position::*;
pub use crate::search::*;
pub use crate::serde_value::*;
