//! CLI library components for formbar.

pub mod logging;
pub mod settings;
pub mod simulate;
