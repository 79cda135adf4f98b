use super::*;

fn images(w: u32, h: u32) -> ProcessedImageSet {
    ProcessedImageSet::new(
        Raster::solid(w, h, [0, 0, 255, 255]).unwrap(),
        Raster::solid(w, h, [255, 0, 0, 0]).unwrap(),
    )
    .unwrap()
}

#[test]
fn starts_with_one_selected_layer() {
    let store = LayerStore::new();
    assert_eq!(store.len(), 1);
    assert!(!store.is_empty());
    assert_eq!(store.selected_layer().text, "Your Text Here");
    assert_eq!(store.selected_id(), store.layers()[0].id);
    assert!(store.processed_images().is_none());
}

#[test]
fn add_layer_appends_and_selects_with_fresh_id() {
    let mut store = LayerStore::new();
    let first = store.selected_id();
    let a = store.add_layer();
    let b = store.add_layer();
    assert_ne!(a, first);
    assert_ne!(a, b);
    assert_eq!(store.len(), 3);
    assert_eq!(store.selected_id(), b);
    assert_eq!(store.layers()[2].id, b);
    assert_eq!(store.layer(a).unwrap().text, "New Text Layer");
}

#[test]
fn removing_the_only_layer_is_a_no_op() {
    let mut store = LayerStore::new();
    let before = store.layers().to_vec();
    let rev = store.revision();
    assert!(!store.remove_layer(store.selected_id()));
    assert_eq!(store.layers(), before.as_slice());
    assert_eq!(store.revision(), rev);
}

#[test]
fn removing_unknown_id_is_a_no_op() {
    let mut store = LayerStore::new();
    store.add_layer();
    assert!(!store.remove_layer(LayerId(999)));
    assert_eq!(store.len(), 2);
}

#[test]
fn removing_selected_moves_selection_to_first() {
    let mut store = LayerStore::new();
    let first = store.selected_id();
    let second = store.add_layer();
    let third = store.add_layer();
    assert!(store.remove_layer(third));
    assert_eq!(store.selected_id(), first);

    assert!(store.select(second));
    assert!(store.remove_layer(first));
    assert_eq!(store.selected_id(), second);
}

#[test]
fn removing_unselected_keeps_selection() {
    let mut store = LayerStore::new();
    let first = store.selected_id();
    let second = store.add_layer();
    assert!(store.remove_layer(first));
    assert_eq!(store.selected_id(), second);
}

#[test]
fn layer_floor_and_selection_hold_under_churn() {
    let mut store = LayerStore::new();
    let mut seed = 0x2545_f491_4f6c_dd1du64;
    for _ in 0..500 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let ids: Vec<LayerId> = store.layers().iter().map(|l| l.id).collect();
        let pick = ids[(seed as usize / 4) % ids.len()];
        match seed % 4 {
            0 => {
                store.add_layer();
            }
            1 | 2 => {
                store.remove_layer(pick);
            }
            _ => {
                store.select(pick);
            }
        }
        assert!(store.len() >= 1);
        assert!(store.layer(store.selected_id()).is_some());
    }
}

#[test]
fn update_merges_into_matching_layer_only() {
    let mut store = LayerStore::new();
    let first = store.selected_id();
    let second = store.add_layer();
    let snapshot = store.layers().to_vec();

    assert!(store.update_layer(second, &LayerUpdate::default().with_opacity(0.3)));

    assert_eq!(store.layer(first), snapshot.iter().find(|l| l.id == first));
    let mut expected = snapshot[1].clone();
    expected.opacity = 0.3;
    assert_eq!(store.layer(second), Some(&expected));
}

#[test]
fn update_unknown_or_empty_is_a_no_op() {
    let mut store = LayerStore::new();
    let rev = store.revision();
    assert!(!store.update_layer(LayerId(42), &LayerUpdate::default().with_text("x")));
    assert!(!store.update_layer(store.selected_id(), &LayerUpdate::default()));
    assert_eq!(store.revision(), rev);
}

#[test]
fn store_does_not_clamp() {
    let mut store = LayerStore::new();
    let id = store.selected_id();
    store.update_layer(id, &LayerUpdate::default().with_opacity(3.0));
    assert_eq!(store.layer(id).unwrap().opacity, 3.0);
}

#[test]
fn select_unknown_is_a_no_op() {
    let mut store = LayerStore::new();
    let id = store.selected_id();
    assert!(!store.select(LayerId(77)));
    assert_eq!(store.selected_id(), id);
}

#[test]
fn revision_advances_on_each_successful_mutation() {
    let mut store = LayerStore::new();
    let r0 = store.revision();
    let id = store.add_layer();
    let r1 = store.revision();
    store.update_layer(id, &LayerUpdate::default().with_rotation(10.0));
    let r2 = store.revision();
    store.set_processed_images(images(2, 2));
    let r3 = store.revision();
    assert!(r0 < r1 && r1 < r2 && r2 < r3);
}

#[test]
fn processed_images_are_replaced_whole() {
    let mut store = LayerStore::new();
    store.set_processed_images(images(4, 2));
    store.set_processed_images(images(8, 6));
    let set = store.processed_images().unwrap();
    assert_eq!(set.size(), LogicalSize { width: 8, height: 6 });
    assert_eq!(set.original().size(), set.subject().size());
}

#[test]
fn image_set_rejects_mismatched_layers_and_flattens_original() {
    let bad = ProcessedImageSet::new(
        Raster::solid(4, 4, [0, 0, 0, 255]).unwrap(),
        Raster::solid(4, 3, [0, 0, 0, 0]).unwrap(),
    );
    assert!(bad.is_err());

    let set = ProcessedImageSet::new(
        Raster::solid(2, 2, [255, 255, 255, 0]).unwrap(),
        Raster::solid(2, 2, [0, 0, 0, 0]).unwrap(),
    )
    .unwrap();
    assert!(set.original().is_opaque());
    assert!(!set.subject().is_opaque());
}
