//! Platform abstraction layer
//!
//! The library core never touches the DOM; the browser build wires events
//! and rendering here. Native builds drive `TrackerApp` directly.

#[cfg(target_arch = "wasm32")]
pub mod web;
