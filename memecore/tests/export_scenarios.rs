//! End-to-end export: snapshot in, meme.png out

use image::{ImageFormat, Rgba, RgbaImage};
use memecore::error::{ExportError, LoadError};
use memecore::export::{encode_png, EXPORT_FILE_NAME};
use memecore::font::bundled_font;
use memecore::loader::Fetcher;
use memecore::{Composition, ExportOutcome, Exporter, ImageSource, Surface, UploadedFile};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Serves one fixed image for any URL.
struct FixedImage(Vec<u8>);

impl Fetcher for FixedImage {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, LoadError> {
        Ok(self.0.clone())
    }
}

struct NeverAnswers;

impl Fetcher for NeverAnswers {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, LoadError> {
        std::thread::sleep(Duration::from_secs(3));
        Err(LoadError::Http(504))
    }
}

const GRAY: [u8; 4] = [128, 128, 128, 255];

fn gray_png(w: u32, h: u32) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(w, h, Rgba(GRAY))).unwrap()
}

fn exporter(dir: &Path, fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Exporter {
    Exporter::new(dir.to_path_buf(), fetcher, bundled_font(), timeout)
}

#[test]
fn test_edit_me_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut surface = Surface::new();
    surface.select_template(ImageSource::url("https://templates.example/template-A.png"));
    surface.set_font_size(32.0);
    surface.add_text_layer();

    let exporter = exporter(dir.path(), Arc::new(FixedImage(gray_png(600, 400))), Duration::from_secs(10));
    let ExportOutcome::Started(job) = exporter.export(&surface.snapshot(), true) else {
        panic!("signed-in export should start");
    };
    let meme = job.wait().unwrap();
    assert_eq!((meme.width, meme.height), (600, 400));
    assert_eq!(meme.path, dir.path().join("meme.png"));

    let written = std::fs::read(&meme.path).unwrap();
    assert_eq!(written, meme.png);
    let img = image::load_from_memory_with_format(&written, ImageFormat::Png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (600, 400));

    // background untouched away from the text
    assert_eq!(img.get_pixel(0, 399).0, GRAY);
    assert_eq!(img.get_pixel(599, 0).0, GRAY);
    assert_eq!(img.get_pixel(300, 200).0, GRAY);

    // white fill and black outline around the baseline at y = 50, centered on x = 50
    let band: Vec<[u8; 4]> = (20..56)
        .flat_map(|y| (0..110).map(move |x| (x, y)))
        .map(|(x, y)| img.get_pixel(x, y).0)
        .collect();
    assert!(band.iter().any(|p| p[0] > 200 && p[1] > 200 && p[2] > 200), "no white fill");
    assert!(band.iter().any(|p| p[0] < 40 && p[1] < 40 && p[2] < 40), "no black outline");

    // "Edit Me" at 32 px can be wider than 100 px, clipping its left edge,
    // so check placement from the right edge
    let inked: Vec<u32> = (0..600)
        .filter(|&x| (0..400).any(|y| img.get_pixel(x, y).0 != GRAY))
        .collect();
    let last = *inked.last().unwrap();
    assert!(inked.iter().any(|x| (30..70).contains(x)));
    assert!((80..130).contains(&last), "text ends at {}", last);
}

#[test]
fn test_signed_out_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut surface = Surface::new();
    for _ in 0..3 {
        surface.add_text_layer();
    }
    let exporter = exporter(dir.path(), Arc::new(FixedImage(gray_png(10, 10))), Duration::from_secs(10));
    let outcome = exporter.export(&surface.snapshot(), false);
    assert!(!outcome.is_started());
    std::thread::sleep(Duration::from_millis(100));
    assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
}

#[test]
fn test_stalled_background_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let comp = Composition::with_background(ImageSource::url("https://slow.example/x.jpg"));
    let exporter = exporter(dir.path(), Arc::new(NeverAnswers), Duration::from_millis(100));
    let ExportOutcome::Started(job) = exporter.export(&comp, true) else {
        panic!("signed-in export should start");
    };
    assert!(matches!(job.wait(), Err(ExportError::Load(LoadError::TimedOut(_)))));
    assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
}

#[test]
fn test_uploaded_background_exports_at_native_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut surface = Surface::new();
    surface.upload_image(Some(UploadedFile { name: "cat.png".into(), bytes: gray_png(123, 45) }));
    let exporter = exporter(dir.path(), Arc::new(NeverAnswers), Duration::from_secs(5));
    let ExportOutcome::Started(job) = exporter.export(&surface.snapshot(), true) else {
        panic!("signed-in export should start");
    };
    let meme = job.wait().unwrap();
    assert_eq!((meme.width, meme.height), (123, 45));
}

#[test]
fn test_undecodable_upload_reports_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut surface = Surface::new();
    surface.upload_image(Some(UploadedFile { name: "notes.txt".into(), bytes: b"just text".to_vec() }));
    let exporter = exporter(dir.path(), Arc::new(NeverAnswers), Duration::from_secs(5));
    let ExportOutcome::Started(job) = exporter.export(&surface.snapshot(), true) else {
        panic!("signed-in export should start");
    };
    assert!(matches!(job.wait(), Err(ExportError::Load(LoadError::Decode(_)))));
}

#[test]
fn test_export_does_not_mutate_composition() {
    let dir = tempfile::tempdir().unwrap();
    let mut surface = Surface::new();
    surface.add_text_layer();
    let before = surface.snapshot();
    let exporter = exporter(dir.path(), Arc::new(FixedImage(gray_png(64, 64))), Duration::from_secs(5));
    if let ExportOutcome::Started(job) = exporter.export(surface.composition(), true) {
        job.wait().unwrap();
    }
    assert_eq!(surface.snapshot(), before);
}
