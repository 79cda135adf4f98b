//! Single-owner session tying the store, compositor and processing pipeline together.

/// The [`studio::Studio`] session.
pub mod studio;
