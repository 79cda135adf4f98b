use std::io::Cursor;
use std::path::Path;

use crate::foundation::error::{TexturaError, TexturaResult};
use crate::render::frame::RenderedFrame;

/// File name used for exports; not user-editable.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "processed-image.png";

/// Encode a frame at its full physical resolution as PNG (straight alpha).
#[tracing::instrument(skip_all, fields(width = frame.width, height = frame.height))]
pub fn encode_png(frame: &RenderedFrame) -> TexturaResult<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        return Err(TexturaError::export("cannot encode an empty frame"));
    }
    let img = frame
        .to_rgba_image()
        .map_err(|e| TexturaError::export(e.to_string()))?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| TexturaError::export(format!("png encoding failed: {e}")))?;
    Ok(out)
}

/// Create the parent directory of `path` if it does not exist.
pub fn ensure_parent_dir(path: &Path) -> TexturaResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
