mod tree;

pub use crate::tree::*;
pub use gpui_tree_core as core;
