//! Leaf rendering for the plate editor surface.
//!
//! Each leaf (a run of text sharing one set of marks) renders through a
//! [`MemoLeaf`], which skips work when nothing relevant changed. A leaf that
//! carries a placeholder draws an overlay, registers the overlay element on
//! its editor, and mirrors the overlay's measured height into the editor's
//! injected style element so an empty editor keeps the placeholder's height.

mod config;
mod context;
mod dom;
mod editable;
mod error;
mod host;
mod leaf;
mod memo;
mod placeholder;
mod resize;
mod string;
mod style;

pub use config::ViewConfig;
pub use context::*;
pub use dom::*;
pub use editable::Editable;
pub use error::ScopeError;
pub use host::{HeadlessHost, Host};
pub use leaf::*;
pub use memo::{MemoLeaf, leaf_props_equal};
pub use placeholder::PlaceholderHeightSync;
pub use resize::*;
pub use string::render_text_run;
pub use style::{
    StyleElement, editor_selector, min_height_rule, placeholder_style, where_if_supported,
};
