//! Text renderers for terminal output.

pub mod thread;
