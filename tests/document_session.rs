use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use egui::{Color32, pos2, vec2};
use image::RgbaImage;
use pdf_annotator::document::{LoadPoll, PendingLoad};
use pdf_annotator::{
    DocumentSession, DocumentWriter, EditorConfig, EditorError, ExportError, LoadError, Raster, Rasterizer,
    RenderError, Rotation,
};

const PDF: &[u8] = b"%PDF-1.7\n% three pages\n%%EOF";

/// Three 700x900 pages; counts how many pages it had to render
#[derive(Default)]
struct FakeRasterizer {
    renders: AtomicUsize,
}

impl Rasterizer for FakeRasterizer {
    fn page_count(&self, _bytes: &[u8]) -> Result<u32, RenderError> {
        Ok(3)
    }

    fn render_page(&self, _bytes: &[u8], page: u32, scale: f32) -> Result<Raster, RenderError> {
        if !(1..=3).contains(&page) {
            return Err(RenderError::MissingPage(page));
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        Raster::blank(page, vec2(700.0, 900.0), scale, Color32::WHITE)
    }
}

/// Echoes the original bytes followed by the overlay size
struct FakeWriter;

impl DocumentWriter for FakeWriter {
    fn save(&self, original: &[u8], overlay: Option<&RgbaImage>) -> Result<Vec<u8>, ExportError> {
        let mut out = original.to_vec();
        if let Some(overlay) = overlay {
            out.extend_from_slice(format!("|{}x{}", overlay.width(), overlay.height()).as_bytes());
        }
        Ok(out)
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

fn session() -> (DocumentSession, Arc<FakeRasterizer>) {
    let rasterizer = Arc::new(FakeRasterizer::default());
    let session = DocumentSession::new(EditorConfig::default(), rasterizer.clone());
    (session, rasterizer)
}

#[test]
fn test_load_reports_pages_and_first_raster() {
    let (mut session, _) = session();
    let loaded = session.load(PDF).unwrap();

    assert_eq!(loaded.page_count, 3);
    assert_eq!(loaded.first_page.page, 1);
    assert_eq!(loaded.first_page.page_size, vec2(700.0, 900.0));
    let document = session.document().unwrap();
    assert_eq!(document.current_page(), 1);
    assert_eq!(document.scale(), 1.0);
    assert_eq!(document.rotation(), Rotation::R0);
}

#[test]
fn test_failed_load_keeps_previous_document() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();
    session.go_to_page(2).unwrap();

    let err = session.load(&b"GIF89a not a pdf"[..]).unwrap_err();
    assert_eq!(err, EditorError::Load(LoadError::NotPdf));
    assert_eq!(err.user_message(), "Please choose a PDF file.");
    assert_eq!(session.document().unwrap().current_page(), 2);

    assert_eq!(session.load(&b""[..]).unwrap_err(), EditorError::Load(LoadError::Empty));
    assert!(session.is_loaded());
}

#[test]
fn test_out_of_range_page_is_rejected() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();
    let generation = session.generation();

    for page in [0, 4] {
        assert_eq!(
            session.go_to_page(page),
            Err(EditorError::PageIndex { requested: page, page_count: 3 })
        );
    }
    assert_eq!(session.document().unwrap().current_page(), 1);
    assert_eq!(session.generation(), generation);
}

#[test]
fn test_operations_need_a_document() {
    let (mut session, _) = session();
    assert_eq!(session.go_to_page(1), Err(EditorError::NoDocument));
    assert_eq!(session.set_scale(2.0), Err(EditorError::NoDocument));
    assert_eq!(
        session.export(&FakeWriter, None),
        Err(EditorError::Export(ExportError::NoDocument))
    );
}

#[test]
fn test_view_changes_bump_generation() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();

    let mut last = session.generation();
    let mut check_bumped = |session: &DocumentSession| {
        assert!(session.generation() > last);
        assert!(session.accept_render(session.generation()));
        assert!(!session.accept_render(last));
        last = session.generation();
    };

    session.go_to_page(3).unwrap();
    check_bumped(&session);
    session.set_scale(2.0).unwrap();
    check_bumped(&session);
    session.set_rotation(Rotation::R90).unwrap();
    check_bumped(&session);

    // Setting the same value again is not a change
    session.set_scale(2.0).unwrap();
    assert_eq!(session.generation(), last);
}

#[test]
fn test_scale_is_clamped() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();
    let config = EditorConfig::default();

    assert_eq!(session.set_scale(1000.0).unwrap(), config.max_scale);
    assert_eq!(session.set_scale(0.0).unwrap(), config.min_scale);
}

#[test]
fn test_fit_to_width() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();

    let scale = session.fit_to_width(1000.0).unwrap();
    assert!((scale - 980.0 / 700.0).abs() < 1e-4);
    assert_eq!(session.document().unwrap().scale(), scale);

    // Sideways pages fit their height
    session.set_rotation(Rotation::R90).unwrap();
    let scale = session.fit_to_width(1000.0).unwrap();
    assert!((scale - 980.0 / 900.0).abs() < 1e-4);
}

#[test]
fn test_pages_are_rendered_once() {
    let (mut session, rasterizer) = session();
    session.load(PDF).unwrap();
    assert_eq!(rasterizer.renders.load(Ordering::SeqCst), 1);

    session.page(2).unwrap();
    session.page(2).unwrap();
    session.page(1).unwrap();
    assert_eq!(rasterizer.renders.load(Ordering::SeqCst), 2);
    assert_eq!(session.document().unwrap().cached_pages(), 2);
}

#[test]
fn test_view_transform_round_trips_points() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();
    session.set_scale(1.5).unwrap();
    session.set_rotation(Rotation::R270).unwrap();

    let transform = session.view_transform(1.0).unwrap();
    assert_eq!(transform.display_size(), vec2(900.0 * 1.5, 700.0 * 1.5));
    let point = pos2(123.0, 456.0);
    let back = transform.display_to_page(transform.page_to_display(point));
    assert!((back - point).length() < 1e-3);
}

#[test]
fn test_export_hands_bytes_and_overlay_to_writer() {
    let (mut session, _) = session();
    session.load(PDF).unwrap();
    let overlay = RgbaImage::new(70, 90);

    let bytes = session.export(&FakeWriter, Some(&overlay)).unwrap();
    assert!(bytes.starts_with(PDF));
    assert!(bytes.ends_with(b"|70x90"));
}

#[cfg(not(target_arch = "wasm32"))]
fn wait(load: &mut PendingLoad) -> LoadPoll {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match load.poll() {
            LoadPoll::Pending if std::time::Instant::now() < deadline => {
                std::thread::sleep(std::time::Duration::from_millis(5));
            }
            other => return other,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn test_superseded_load_is_dropped() {
    let (mut session, _) = session();
    let mut first = session.begin_load(PDF, "first.pdf").unwrap();
    let mut second = session.begin_load(PDF, "second.pdf").unwrap();

    let LoadPoll::Ready(result) = wait(&mut first) else {
        panic!("first load did not finish");
    };
    assert_eq!(session.finish_load(first.generation(), result).unwrap(), None);
    assert!(!session.is_loaded());

    let LoadPoll::Ready(result) = wait(&mut second) else {
        panic!("second load did not finish");
    };
    let loaded = session.finish_load(second.generation(), result).unwrap().unwrap();
    assert_eq!(loaded.page_count, 3);
    assert_eq!(second.name(), "second.pdf");
}
