use egui::{Pos2, Rect, pos2, vec2};
use pdf_annotator::state::Preferences;
use pdf_annotator::{Editor, ObjectKind, ObjectStyle, SceneObject, ShapeKind, ToolMode};

fn editor_with(mode: ToolMode) -> Editor {
    let mut editor = Editor::default();
    editor.reset_for_document(vec2(600.0, 800.0));
    editor.select_mode(mode).unwrap();
    editor
}

fn drag(editor: &mut Editor, from: Pos2, to: Pos2, shift: bool) {
    editor.pointer_down(from, shift).unwrap();
    editor.pointer_move(from.lerp(to, 0.5), shift);
    editor.pointer_move(to, shift);
    editor.pointer_up(to, shift).unwrap();
}

fn only_object(editor: &Editor) -> &SceneObject {
    assert_eq!(editor.scene().len(), 1, "expected exactly one object");
    editor.scene().iter().next().unwrap()
}

fn assert_rect(actual: Rect, min: Pos2, size: egui::Vec2) {
    assert!((actual.min - min).length() < 1e-3, "min {:?} != {:?}", actual.min, min);
    assert!((actual.size() - size).length() < 1e-3, "size {:?} != {:?}", actual.size(), size);
}

#[test]
fn test_rectangle_drag_in_either_direction() {
    for (from, to) in [(pos2(10.0, 10.0), pos2(110.0, 60.0)), (pos2(110.0, 60.0), pos2(10.0, 10.0))] {
        let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
        drag(&mut editor, from, to, false);

        let ObjectKind::Rectangle { rect } = only_object(&editor).kind else {
            panic!("expected a rectangle");
        };
        assert_rect(rect, pos2(10.0, 10.0), vec2(100.0, 50.0));
        assert_eq!(editor.history().undo_len(), 1);
    }
}

#[test]
fn test_shift_makes_a_square() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
    drag(&mut editor, pos2(0.0, 0.0), pos2(30.0, 80.0), true);

    let ObjectKind::Rectangle { rect } = only_object(&editor).kind else {
        panic!("expected a rectangle");
    };
    assert_rect(rect, pos2(0.0, 0.0), vec2(80.0, 80.0));
}

#[test]
fn test_circle_uses_drag_as_diameter() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Circle));
    drag(&mut editor, pos2(100.0, 100.0), pos2(160.0, 180.0), false);

    let ObjectKind::Circle { center, radius } = only_object(&editor).kind else {
        panic!("expected a circle");
    };
    assert_eq!(center, pos2(130.0, 140.0));
    assert!((radius - 50.0).abs() < 1e-3);
}

#[test]
fn test_ellipse_fills_drag_box() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Ellipse));
    drag(&mut editor, pos2(200.0, 100.0), pos2(100.0, 160.0), false);

    let ObjectKind::Ellipse { center, radii } = only_object(&editor).kind else {
        panic!("expected an ellipse");
    };
    assert_eq!(center, pos2(150.0, 130.0));
    assert_eq!(radii, vec2(50.0, 30.0));
}

#[test]
fn test_line_and_arrow_keep_drag_endpoints() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Line));
    drag(&mut editor, pos2(20.0, 30.0), pos2(220.0, 90.0), false);
    let ObjectKind::Line { start, end } = only_object(&editor).kind else {
        panic!("expected a line");
    };
    assert_eq!((start, end), (pos2(20.0, 30.0), pos2(220.0, 90.0)));

    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Arrow));
    drag(&mut editor, pos2(220.0, 90.0), pos2(20.0, 30.0), false);
    let ObjectKind::Arrow { start, end } = only_object(&editor).kind else {
        panic!("expected an arrow");
    };
    assert_eq!((start, end), (pos2(220.0, 90.0), pos2(20.0, 30.0)));
}

#[test]
fn test_construction_is_clamped_to_page() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
    drag(&mut editor, pos2(500.0, 700.0), pos2(900.0, 1200.0), false);

    let object = only_object(&editor);
    assert!(editor.page_bounds().contains_rect(object.bounds()));
    let ObjectKind::Rectangle { rect } = object.kind else {
        panic!("expected a rectangle");
    };
    assert_rect(rect, pos2(500.0, 700.0), vec2(100.0, 100.0));
}

#[test]
fn test_provisional_object_is_not_in_scene() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
    editor.pointer_down(pos2(10.0, 10.0), false).unwrap();
    editor.pointer_move(pos2(80.0, 80.0), false);

    assert!(editor.session().is_dragging());
    assert!(editor.session().preview().is_some());
    assert!(editor.scene().is_empty());
    assert_eq!(editor.history().undo_len(), 0);
}

#[test]
fn test_switching_tool_mid_drag_drops_provisional() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Ellipse));
    editor.pointer_down(pos2(10.0, 10.0), false).unwrap();
    editor.pointer_move(pos2(120.0, 90.0), false);

    editor.select_mode(ToolMode::Cursor).unwrap();
    editor.pointer_up(pos2(120.0, 90.0), false).unwrap();

    assert!(editor.session().is_idle());
    assert!(editor.scene().is_empty());
    assert!(!editor.history().can_undo());
}

#[test]
fn test_click_without_drag_is_discarded() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
    drag(&mut editor, pos2(40.0, 40.0), pos2(41.0, 40.5), false);

    assert!(editor.scene().is_empty());
    assert_eq!(editor.history().undo_len(), 0);
}

#[test]
fn test_freehand_records_the_path() {
    let mut editor = editor_with(ToolMode::Draw);
    editor.pointer_down(pos2(10.0, 10.0), false).unwrap();
    for i in 1..=10 {
        editor.pointer_move(pos2(10.0 + i as f32 * 10.0, 10.0 + i as f32 * 5.0), false);
    }
    editor.pointer_up(pos2(110.0, 60.0), false).unwrap();

    let ObjectKind::Freehand { points } = &only_object(&editor).kind else {
        panic!("expected a freehand path");
    };
    assert!(points.len() >= 10);
    assert_eq!(points.first(), Some(&pos2(10.0, 10.0)));
}

#[test]
fn test_highlight_is_translucent() {
    let mut editor = editor_with(ToolMode::Highlight);
    drag(&mut editor, pos2(50.0, 200.0), pos2(300.0, 200.0), false);

    let object = only_object(&editor);
    assert!(matches!(object.kind, ObjectKind::Freehand { .. }));
    assert!(object.style.opacity < 1.0);
}

#[test]
fn test_stamp_returns_to_cursor() {
    let mut editor = editor_with(ToolMode::Stamp);
    editor.pointer_down(pos2(300.0, 300.0), false).unwrap();
    editor.pointer_up(pos2(300.0, 300.0), false).unwrap();

    assert!(matches!(only_object(&editor).kind, ObjectKind::Stamp { .. }));
    assert_eq!(editor.mode(), ToolMode::Cursor);
}

#[test]
fn test_snapping_puts_corners_on_the_grid() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
    let prefs = Preferences {
        snap_to_grid: true,
        ..editor.preferences().clone()
    };
    editor.set_preferences(prefs);
    let spacing = editor.config().grid_spacing;
    drag(&mut editor, pos2(12.0, 18.0), pos2(57.0, 44.0), false);

    let ObjectKind::Rectangle { rect } = only_object(&editor).kind else {
        panic!("expected a rectangle");
    };
    for value in [rect.min.x, rect.min.y, rect.max.x, rect.max.y] {
        assert_eq!(value % spacing, 0.0, "{value} is off the grid");
    }
}

#[test]
fn test_page_change_cancels_construction() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Rectangle));
    editor.pointer_down(pos2(10.0, 10.0), false).unwrap();
    editor.pointer_move(pos2(120.0, 90.0), false);

    editor.set_page(2, vec2(600.0, 800.0));
    assert!(editor.session().is_idle());
    editor.pointer_up(pos2(120.0, 90.0), false).unwrap();

    assert!(editor.scene().is_empty());
    assert_eq!(editor.history().undo_len(), 0);
    assert_eq!(editor.page(), 2);
}

#[test]
fn test_zoom_change_cancels_construction() {
    let mut editor = editor_with(ToolMode::Shape(ShapeKind::Ellipse));
    editor.pointer_down(pos2(10.0, 10.0), false).unwrap();
    editor.pointer_move(pos2(120.0, 90.0), false);

    editor.set_view_scale(2.0);
    editor.pointer_up(pos2(120.0, 90.0), false).unwrap();

    assert!(editor.scene().is_empty());
    assert!(!editor.history().can_undo());
}

#[test]
fn test_line_handle_moves_its_endpoint() {
    let mut editor = editor_with(ToolMode::Cursor);
    let line = SceneObject::new(
        1,
        ObjectKind::Line { start: pos2(100.0, 100.0), end: pos2(200.0, 100.0) },
        ObjectStyle::default(),
    );
    let id = editor.add_object(line).unwrap();
    assert!(editor.select(id, false));

    drag(&mut editor, pos2(200.0, 100.0), pos2(300.0, 100.0), false);

    let ObjectKind::Line { start, end } = editor.scene().get(id).unwrap().kind else {
        panic!("expected a line");
    };
    assert_eq!((start, end), (pos2(100.0, 100.0), pos2(300.0, 100.0)));
    assert_eq!(editor.history().undo_len(), 2);

    editor.undo().unwrap();
    let ObjectKind::Line { end, .. } = editor.scene().get(id).unwrap().kind else {
        panic!("expected a line");
    };
    assert_eq!(end, pos2(200.0, 100.0));
}
