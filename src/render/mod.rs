//! CPU compositing of the background, text layers and subject cutout.

/// `vello_cpu` compositor and its options.
pub mod compositor;
/// Rendered frame buffer.
pub mod frame;
/// Text layer placement in logical space.
pub mod geometry;
