//! Cross-browser support scoring for the CSS properties a project uses.
//!
//! Property names are resolved against MDN browser-compat-data first, then
//! the caniuse table, then MDN alternative names, and reduced to per-browser
//! and overall scores per file.

pub mod config;
pub mod core;
pub mod sources;
pub mod utils;
