//! Command implementations for each input kind

pub mod clip;
pub mod controller;
pub mod simulate;
pub mod skeleton;
