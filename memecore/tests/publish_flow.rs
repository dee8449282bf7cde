//! Export followed by sharing to the meme listing

use chrono::Utc;
use image::{Rgba, RgbaImage};
use memecore::error::{BackendError, LoadError};
use memecore::export::encode_png;
use memecore::font::bundled_font;
use memecore::gallery::{begin_publish, MemeListing, MemeRecord};
use memecore::loader::Fetcher;
use memecore::session::{AuthBackend, AuthSession, Tokens};
use memecore::{ExportOutcome, ExportedMeme, Exporter, Identity, ImageSource, SessionContext, Surface};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FixedImage(Vec<u8>);

impl Fetcher for FixedImage {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, LoadError> {
        Ok(self.0.clone())
    }
}

struct AcceptAll;

impl AuthBackend for AcceptAll {
    fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession, BackendError> {
        Ok(AuthSession {
            user: Identity { id: "u-1".into(), email: Some(email.into()) },
            tokens: Tokens { access_token: "access".into(), refresh_token: "refresh".into() },
        })
    }

    fn refresh(&self, _refresh_token: &str) -> Result<AuthSession, BackendError> {
        Err(BackendError::Status { status: 401, body: String::new() })
    }

    fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Records every upload; optionally rejects them.
#[derive(Default)]
struct RecordingListing {
    reject: AtomicBool,
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl MemeListing for RecordingListing {
    fn recent(&self, _access_token: Option<&str>) -> Result<Vec<MemeRecord>, BackendError> {
        Ok(Vec::new())
    }

    fn publish(&self, user: &Identity, access_token: &str, png: &[u8]) -> Result<MemeRecord, BackendError> {
        self.uploads
            .lock()
            .unwrap()
            .push((user.id.clone(), access_token.to_string(), png.len()));
        if self.reject.load(Ordering::SeqCst) {
            return Err(BackendError::Status { status: 500, body: "bucket full".into() });
        }
        Ok(MemeRecord {
            id: "m-1".into(),
            image_url: format!("https://x/{}/m-1.png", user.id),
            created_at: Utc::now(),
            user_id: user.id.clone(),
        })
    }
}

fn signed_in() -> SessionContext {
    let mut session = SessionContext::new(Arc::new(AcceptAll), None);
    session.sign_in("me@slow.computer", "pw").unwrap();
    session
}

fn export_one(dir: &std::path::Path) -> ExportedMeme {
    let png = encode_png(&RgbaImage::from_pixel(120, 80, Rgba([10, 20, 30, 255]))).unwrap();
    let exporter = Exporter::new(
        dir.to_path_buf(),
        Arc::new(FixedImage(png)),
        bundled_font(),
        Duration::from_secs(10),
    );
    let mut surface = Surface::new();
    surface.select_template(ImageSource::url("https://templates.example/a.png"));
    surface.add_text_layer();
    let ExportOutcome::Started(job) = exporter.export(&surface.snapshot(), true) else {
        panic!("signed-in export should start");
    };
    job.wait().unwrap()
}

#[test]
fn test_publish_only_when_enabled_and_signed_in() {
    let dir = tempfile::tempdir().unwrap();
    let meme = export_one(dir.path());
    let recorder = Arc::new(RecordingListing::default());
    let listing: Arc<dyn MemeListing> = recorder.clone();

    let session = signed_in();
    assert!(begin_publish(false, Some(&listing), &session, &meme).is_none());
    assert!(begin_publish(true, None, &session, &meme).is_none());
    assert!(begin_publish(true, Some(&listing), &SessionContext::offline(), &meme).is_none());
    assert!(recorder.uploads.lock().unwrap().is_empty());

    let task = begin_publish(true, Some(&listing), &session, &meme).expect("publish should start");
    let record = task.wait().unwrap().unwrap();
    assert_eq!(record.user_id, "u-1");
    let uploads = recorder.uploads.lock().unwrap();
    assert_eq!(*uploads, [("u-1".to_string(), "access".to_string(), meme.png.len())]);
}

#[test]
fn test_signed_out_session_never_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let meme = export_one(dir.path());
    let recorder = Arc::new(RecordingListing::default());
    let listing: Arc<dyn MemeListing> = recorder.clone();

    let mut session = signed_in();
    session.sign_out().unwrap();
    assert!(begin_publish(true, Some(&listing), &session, &meme).is_none());
    assert!(recorder.uploads.lock().unwrap().is_empty());
}

#[test]
fn test_failed_publish_keeps_local_png() {
    let dir = tempfile::tempdir().unwrap();
    let meme = export_one(dir.path());
    let recorder = Arc::new(RecordingListing::default());
    recorder.reject.store(true, Ordering::SeqCst);
    let listing: Arc<dyn MemeListing> = recorder.clone();

    let task = begin_publish(true, Some(&listing), &signed_in(), &meme).expect("publish should start");
    assert!(matches!(task.wait(), Some(Err(BackendError::Status { status: 500, .. }))));

    assert_eq!(recorder.uploads.lock().unwrap().len(), 1);
    assert_eq!(std::fs::read(dir.path().join("meme.png")).unwrap(), meme.png);
}
