//! powerfeed library crate.

pub mod config;
pub mod dedup;
pub mod domain;
pub mod editor;
pub mod generate;
pub mod logging;
pub mod render;
pub mod thread;
