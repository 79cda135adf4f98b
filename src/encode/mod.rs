//! Lossless export of composited frames.
//!
//! Frames are encoded at full physical resolution and handed to an [`sink::ExportSink`].

/// PNG encoding.
pub mod png;
/// Export destinations.
pub mod sink;
