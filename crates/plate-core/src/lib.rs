mod core;
mod leaf;
mod serde_value;

pub use crate::core::*;
pub use crate::leaf::*;
pub use crate::serde_value::*;
