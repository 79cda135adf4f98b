//! Subject extraction boundary.
//!
//! Segmentation itself is out of scope for this crate: callers plug in any implementation of
//! [`SubjectExtractor`] (a model runtime, a remote service, a precomputed mask). The crate only
//! checks that what comes back can be composited against the source.

use crate::assets::raster::Raster;
use crate::foundation::error::{TexturaError, TexturaResult};

/// Produces a cutout of the foreground subject: same dimensions, background pixels transparent.
///
/// Implementations may take arbitrarily long; they are always invoked off the owning thread.
pub trait SubjectExtractor: Send + Sync {
    /// Return the subject cutout for `source`.
    fn extract_subject(&self, source: &Raster) -> TexturaResult<Raster>;
}

impl<F> SubjectExtractor for F
where
    F: Fn(&Raster) -> TexturaResult<Raster> + Send + Sync,
{
    fn extract_subject(&self, source: &Raster) -> TexturaResult<Raster> {
        self(source)
    }
}

/// Run `extractor` and reject cutouts whose dimensions do not match the source.
#[tracing::instrument(skip_all, fields(w = source.width(), h = source.height()))]
pub(crate) fn extract_checked(
    extractor: &dyn SubjectExtractor,
    source: &Raster,
) -> TexturaResult<Raster> {
    let cutout = extractor.extract_subject(source).map_err(|e| match e {
        TexturaError::Extraction(_) => e,
        other => TexturaError::extraction(other.to_string()),
    })?;
    if cutout.size() != source.size() {
        return Err(TexturaError::extraction(format!(
            "cutout is {}x{} but source is {}x{}",
            cutout.width(),
            cutout.height(),
            source.width(),
            source.height()
        )));
    }
    Ok(cutout)
}

#[cfg(test)]
#[path = "../../tests/unit/extract/mod.rs"]
mod tests;
