use std::sync::Arc;

use egui::{Pos2, pos2};
use pdf_annotator::document::FlattenedPngWriter;
use pdf_annotator::{
    DocumentSession, Editor, EditorConfig, MediaBoxRasterizer, ObjectKind, ShapeKind, ToolMode, overlay,
};

const ONE_PAGE: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Page /MediaBox [0 0 700 900] >> endobj\n%%EOF";

fn drag(editor: &mut Editor, from: Pos2, to: Pos2) {
    editor.pointer_down(from, false).unwrap();
    editor.pointer_move(to, false);
    editor.pointer_up(to, false).unwrap();
}

fn kinds(editor: &Editor) -> Vec<ObjectKind> {
    editor
        .layers()
        .paint_order()
        .into_iter()
        .filter_map(|id| editor.scene().get(id))
        .map(|object| object.kind.clone())
        .collect()
}

#[test]
fn test_annotate_hide_undo_redo() {
    let mut session = DocumentSession::new(EditorConfig::default(), Arc::new(MediaBoxRasterizer::new()));
    let loaded = session.load(ONE_PAGE).unwrap();
    assert_eq!(loaded.page_count, 1);

    let mut editor = Editor::default();
    editor.reset_for_document(loaded.first_page.page_size);
    assert_eq!(editor.page_bounds().size(), egui::vec2(700.0, 900.0));

    // Rectangle on the base layer
    let base = editor.layers().active_id();
    editor.select_mode(ToolMode::Shape(ShapeKind::Rectangle)).unwrap();
    drag(&mut editor, pos2(50.0, 50.0), pos2(250.0, 150.0));
    assert_eq!(editor.scene().len(), 1);

    // Text on a new layer
    let notes = editor.add_layer(Some("Notes"));
    editor.select_mode(ToolMode::Text).unwrap();
    editor.pointer_down(pos2(400.0, 600.0), false).unwrap();
    editor.pointer_up(pos2(400.0, 600.0), false).unwrap();
    assert!(editor.session().is_editing_text());
    editor.text_input("Hello");
    editor.commit_text_edit().unwrap();

    assert_eq!(editor.scene().len(), 2);
    assert_eq!(editor.history().undo_len(), 2);
    assert_eq!(editor.layers().get(notes).unwrap().objects.len(), 1);
    let text = editor.layers().get(notes).unwrap().objects[0];
    assert_eq!(editor.scene().get(text).unwrap().as_text().unwrap().content, "Hello");

    // Hiding the rectangle's layer leaves only the text visible
    editor.toggle_layer_visibility(base).unwrap();
    let visible: Vec<_> = editor.visible_objects(1).iter().map(|object| object.id()).collect();
    assert_eq!(visible, vec![text]);
    editor.toggle_layer_visibility(base).unwrap();

    let before = kinds(&editor);
    assert!(editor.undo().unwrap());
    assert!(editor.undo().unwrap());
    assert!(editor.scene().is_empty());

    assert!(editor.redo().unwrap());
    assert!(editor.redo().unwrap());
    assert_eq!(kinds(&editor), before);
    assert!(matches!(before[0], ObjectKind::Rectangle { .. }));
}

#[test]
fn test_flattened_export_matches_page_raster() {
    let mut session = DocumentSession::new(EditorConfig::default(), Arc::new(MediaBoxRasterizer::new()));
    let loaded = session.load(ONE_PAGE).unwrap();
    let mut editor = Editor::default();
    editor.reset_for_document(loaded.first_page.page_size);

    editor.select_mode(ToolMode::Shape(ShapeKind::Rectangle)).unwrap();
    drag(&mut editor, pos2(100.0, 100.0), pos2(300.0, 200.0));

    let raster = session.current_page().unwrap();
    let flattened = overlay::flatten(&raster, &editor.visible_objects(1)).unwrap();
    assert_eq!([flattened.width() as usize, flattened.height() as usize], raster.size);

    // The stroke lands on the rectangle's left edge
    let edge = flattened.get_pixel(100, 150);
    assert_ne!(edge.0, [255, 255, 255, 255]);
    let outside = flattened.get_pixel(20, 20);
    assert_eq!(outside.0, [255, 255, 255, 255]);

    let bytes = session.export(&FlattenedPngWriter, Some(&flattened)).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded, flattened);
}
