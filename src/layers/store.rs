use crate::assets::raster::Raster;
use crate::foundation::core::{LayerId, LogicalSize};
use crate::foundation::error::{TexturaError, TexturaResult};
use crate::layers::style::{INITIAL_LAYER_TEXT, LayerUpdate, NEW_LAYER_TEXT, TextLayerStyle};

/// The two aligned image layers produced by one upload-and-extract cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedImageSet {
    original: Raster,
    subject: Raster,
    size: LogicalSize,
}

impl ProcessedImageSet {
    /// Pair an original with its cutout. Dimensions must match exactly; the original is
    /// flattened so that it is fully opaque.
    pub fn new(original: Raster, subject: Raster) -> TexturaResult<Self> {
        if original.size() != subject.size() {
            return Err(TexturaError::validation(format!(
                "subject is {}x{} but original is {}x{}",
                subject.width(),
                subject.height(),
                original.width(),
                original.height()
            )));
        }
        let size = original.size();
        Ok(Self {
            original: original.flattened(),
            subject,
            size,
        })
    }

    /// Opaque background layer.
    pub fn original(&self) -> &Raster {
        &self.original
    }

    /// Subject cutout with per-pixel alpha.
    pub fn subject(&self) -> &Raster {
        &self.subject
    }

    /// Shared logical dimensions.
    pub fn size(&self) -> LogicalSize {
        self.size
    }
}

/// Single source of truth for text layers, selection and the current image pair.
///
/// Invalid mutations (unknown ids, removing the last layer) are rejected by returning `false`.
/// [`LayerStore::revision`] advances on every successful mutation, which is what drives
/// re-rendering.
#[derive(Clone, Debug)]
pub struct LayerStore {
    layers: Vec<TextLayerStyle>,
    selected: LayerId,
    next_id: u64,
    images: Option<ProcessedImageSet>,
    revision: u64,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Store holding one default layer, selected.
    pub fn new() -> Self {
        let first = LayerId(1);
        Self {
            layers: vec![TextLayerStyle::new(first, INITIAL_LAYER_TEXT)],
            selected: first,
            next_id: 2,
            images: None,
            revision: 0,
        }
    }

    /// Layers in paint order (later entries paint over earlier ones).
    pub fn layers(&self) -> &[TextLayerStyle] {
        &self.layers
    }

    /// Number of layers; never zero.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Look up a layer.
    pub fn layer(&self, id: LayerId) -> Option<&TextLayerStyle> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Id of the layer being edited.
    pub fn selected_id(&self) -> LayerId {
        self.selected
    }

    /// The layer being edited.
    pub fn selected_layer(&self) -> &TextLayerStyle {
        let i = self.index_of(self.selected).unwrap_or(0);
        &self.layers[i]
    }

    /// Current image pair, if an upload has completed.
    pub fn processed_images(&self) -> Option<&ProcessedImageSet> {
        self.images.as_ref()
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a default layer with a fresh id and select it.
    pub fn add_layer(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.push(TextLayerStyle::new(id, NEW_LAYER_TEXT));
        self.selected = id;
        self.bump();
        tracing::debug!(%id, layers = self.layers.len(), "layer added");
        id
    }

    /// Remove a layer. No-op for unknown ids and for the last remaining layer.
    ///
    /// If the removed layer was selected, selection moves to the first remaining layer.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }
        let Some(i) = self.index_of(id) else {
            return false;
        };
        self.layers.remove(i);
        if self.selected == id {
            self.selected = self.layers[0].id;
        }
        self.bump();
        tracing::debug!(%id, layers = self.layers.len(), "layer removed");
        true
    }

    /// Merge `update` into the layer with `id`. No-op for unknown ids or empty updates.
    pub fn update_layer(&mut self, id: LayerId, update: &LayerUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        let Some(i) = self.index_of(id) else {
            return false;
        };
        update.apply_to(&mut self.layers[i]);
        self.bump();
        true
    }

    /// Select an existing layer. No-op for unknown ids.
    pub fn select(&mut self, id: LayerId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.selected = id;
        self.bump();
        true
    }

    /// Replace the image pair as a whole. The previous pair is dropped.
    pub fn set_processed_images(&mut self, images: ProcessedImageSet) {
        self.images = Some(images);
        self.bump();
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/store.rs"]
mod tests;
