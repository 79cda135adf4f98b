//! Off-thread upload processing (ingest, then extract) with completion hand-back.

/// Processing jobs, generations and supersede policy.
pub mod processing;
