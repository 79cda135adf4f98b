//! Text layer styles, UI control mapping and the layer store.

/// Single-field updates from numeric and non-numeric controls.
pub mod controls;
/// Layer list, selection and current image pair.
pub mod store;
/// Text layer style record, defaults and partial updates.
pub mod style;
