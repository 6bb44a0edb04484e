//! Shared utilities for the skelanim-rs CLI

pub mod format;
pub mod table;
pub mod tree;

pub use format::*;
pub use table::*;
pub use tree::*;
