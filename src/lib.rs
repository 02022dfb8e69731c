//! Sprout library exports for the binary and integration tests

pub mod api;
pub mod core;
pub mod render;
pub mod session;
pub mod tui;

#[cfg(test)]
pub mod test_support;
