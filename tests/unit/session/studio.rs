use std::collections::HashMap;
use std::sync::{Mutex, mpsc};
use std::time::{Duration, Instant};

use super::*;
use crate::assets::raster::Raster;
use crate::encode::sink::InMemoryExportSink;
use crate::pipeline::processing::SupersedePolicy;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([40, 90, 160, 255]));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn keep_top_half(src: &Raster) -> TexturaResult<Raster> {
    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut data = src.premul_bytes().to_vec();
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        if i / w >= h / 2 {
            px.copy_from_slice(&[0, 0, 0, 0]);
        }
    }
    Raster::from_premul_rgba8(src.width(), src.height(), data)
}

fn studio() -> Studio {
    Studio::new(Arc::new(keep_top_half), StudioOpts::default()).unwrap()
}

fn loaded_studio(w: u32, h: u32) -> Studio {
    let mut s = studio();
    s.submit_upload(png(w, h));
    assert_eq!(s.wait_for_processing(), ProcessingState::Ready);
    s
}

#[test]
fn nothing_renders_or_exports_before_an_upload() {
    let mut s = studio();
    assert!(!s.can_export());
    assert!(s.frame().unwrap().is_none());
    let err = s.export_png().unwrap_err();
    assert!(err.to_string().starts_with("export error:"), "{err}");
    assert_eq!(s.render_count(), 0);
    assert_eq!(s.processing_state(), ProcessingState::Idle);
}

#[test]
fn upload_produces_a_double_density_frame() {
    let mut s = loaded_studio(30, 20);
    assert!(s.can_export());
    let frame = s.frame().unwrap().unwrap();
    assert_eq!((frame.width, frame.height), (60, 40));
    assert_eq!(frame.logical.width, 30);
}

#[test]
fn unchanged_state_is_not_re_rendered() {
    let mut s = loaded_studio(16, 16);
    let first = s.frame().unwrap().unwrap().fingerprint();
    let again = s.frame().unwrap().unwrap().fingerprint();
    assert_eq!(first, again);
    assert_eq!(s.render_count(), 1);
}

#[test]
fn bursts_of_mutations_coalesce_into_one_render() {
    let mut s = loaded_studio(16, 16);
    s.frame().unwrap();
    let id = s.add_layer();
    s.set_control(StyleControl::Rotation, 30.0);
    s.set_control(StyleControl::Opacity, 0.5);
    s.select(id);
    s.frame().unwrap();
    assert_eq!(s.render_count(), 2);
}

#[test]
fn rejected_mutations_do_not_re_render() {
    let mut s = loaded_studio(16, 16);
    s.frame().unwrap();
    let only = s.selected_layer().id;
    assert!(!s.remove_layer(only));
    assert!(!s.select(LayerId(999)));
    s.frame().unwrap();
    assert_eq!(s.render_count(), 1);
    assert_eq!(s.layers().len(), 1);
}

#[test]
fn controls_clamp_before_reaching_the_store() {
    let mut s = studio();
    assert!(s.set_control(StyleControl::FontSize, 500.0));
    assert!(s.set_control(StyleControl::FontWeight, 640.0));
    assert_eq!(s.selected_layer().font_size, 50.0);
    assert_eq!(s.selected_layer().font_weight, 600);
}

#[test]
fn json_patches_update_layers() {
    let mut s = studio();
    let id = s.selected_layer().id;
    assert!(s.update_layer_json(id, r##"{"text": "Hello", "color": "#000000"}"##).unwrap());
    assert_eq!(s.selected_layer().text, "Hello");
    assert!(s.update_layer_json(id, r#"{"bogus": 1}"#).is_err());
}

#[test]
fn json_patches_are_clamped_before_reaching_the_store() {
    let mut s = loaded_studio(40, 20);
    let id = s.selected_layer().id;
    assert!(s.update_layer_json(id, r#"{"fontSize": 0}"#).unwrap());
    assert_eq!(s.selected_layer().font_size, 5.0);
    assert!(s.frame().unwrap().is_some());

    assert!(
        s.update_layer_json(id, r#"{"opacity": 7.5, "xPosition": -300, "fontWeight": 1234}"#)
            .unwrap()
    );
    let layer = s.selected_layer();
    assert_eq!(layer.opacity, 1.0);
    assert_eq!(layer.x_position, 0.0);
    assert_eq!(layer.font_weight, 900);
    assert!(layer.is_within_ranges());
    assert!(s.export_png().is_ok());
}

/// Extractor that blocks per source width until the matching gate is released.
#[derive(Default)]
struct Gated {
    gates: Mutex<HashMap<u32, mpsc::Receiver<()>>>,
}

impl Gated {
    fn gate(&self, width: u32) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        self.gates.lock().unwrap().insert(width, rx);
        tx
    }
}

impl SubjectExtractor for Gated {
    fn extract_subject(&self, source: &Raster) -> TexturaResult<Raster> {
        let gate = self.gates.lock().unwrap().remove(&source.width());
        if let Some(rx) = gate {
            let _ = rx.recv();
        }
        keep_top_half(source)
    }
}

fn stored_width(s: &Studio) -> Option<u32> {
    s.store().processed_images().map(|images| images.size().width)
}

fn poll_until_stored(s: &mut Studio, width: u32) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while stored_width(s) != Some(width) {
        assert!(Instant::now() < deadline, "upload of width {width} never landed");
        s.poll_processing();
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn racing_uploads(policy: SupersedePolicy) -> Studio {
    let gated = Arc::new(Gated::default());
    let release_first = gated.gate(4);
    let release_second = gated.gate(8);
    let opts = StudioOpts::default()
        .with_pipeline(PipelineOpts::default().with_policy(policy).with_threads(2));
    let mut s = Studio::new(gated.clone(), opts).unwrap();

    s.submit_upload(png(4, 4));
    s.submit_upload(png(8, 8));
    assert!(s.is_loading());

    release_second.send(()).unwrap();
    poll_until_stored(&mut s, 8);
    assert!(s.is_loading());

    release_first.send(()).unwrap();
    assert_eq!(s.wait_for_processing(), ProcessingState::Ready);
    s
}

#[test]
fn last_completed_upload_ends_up_in_the_store() {
    let mut s = racing_uploads(SupersedePolicy::LastCompletionWins);
    assert_eq!(stored_width(&s), Some(4));
    assert_eq!(s.frame().unwrap().unwrap().logical.width, 4);
}

#[test]
fn latest_submission_policy_keeps_the_newest_upload() {
    let s = racing_uploads(SupersedePolicy::LatestSubmissionOnly);
    assert_eq!(stored_width(&s), Some(8));
}

#[test]
fn failed_upload_keeps_previous_images() {
    let mut s = loaded_studio(20, 10);
    let before = s.frame().unwrap().unwrap().clone();

    s.submit_upload(b"garbage".to_vec());
    let state = s.wait_for_processing();
    assert!(matches!(state, ProcessingState::Failed(_)));
    assert!(!s.is_loading());

    let after = s.frame().unwrap().unwrap();
    assert_eq!(after, &before);
}

#[test]
fn exports_full_resolution_png_under_fixed_name() {
    let mut s = loaded_studio(12, 8);
    let mut sink = InMemoryExportSink::new();
    s.export_to(&mut sink).unwrap();
    let (name, bytes) = &sink.files()[0];
    assert_eq!(name, "processed-image.png");
    let decoded = image::load_from_memory(bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (24, 16));
}

#[test]
fn save_export_writes_into_directory() {
    let mut s = loaded_studio(6, 6);
    let dir = std::env::temp_dir().join(format!("textura_studio_{}", std::process::id()));
    let path = s.save_export(&dir).unwrap();
    assert_eq!(path, dir.join(DEFAULT_EXPORT_FILE_NAME));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
    let _ = std::fs::remove_dir_all(&dir);
}
