use egui::{Color32, Pos2, Rect, pos2, vec2};
use pdf_annotator::element::factory;
use pdf_annotator::{Editor, EditorConfig, ObjectStyle, PropertyKey, PropertyValue, SceneObject, ShapeKind, ToolMode};
use pdf_annotator::state::Preferences;

fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_min_size(pos2(x, y), vec2(w, h))
}

fn drag(editor: &mut Editor, from: Pos2, to: Pos2) {
    editor.pointer_down(from, false).unwrap();
    editor.pointer_move(to, false);
    editor.pointer_up(to, false).unwrap();
}

/// Every object in paint order, for comparing whole-scene states
fn state(editor: &Editor) -> Vec<SceneObject> {
    editor.layers().paint_order().into_iter().filter_map(|id| editor.scene().get(id).cloned()).collect()
}

#[test]
fn test_undo_redo_restores_exact_state() {
    let mut editor = Editor::default();
    let a = editor.add_object(factory::rectangle(1, rect(10.0, 10.0, 50.0, 50.0), ObjectStyle::default())).unwrap();
    let b = editor.add_object(factory::rectangle(1, rect(80.0, 10.0, 50.0, 50.0), ObjectStyle::default())).unwrap();
    editor.add_object(factory::text(1, pos2(10.0, 200.0), "note", Color32::BLACK)).unwrap();
    editor.remove_object(a).unwrap();
    editor.set_property(b, PropertyKey::StrokeWidth, PropertyValue::Number(6.0)).unwrap();

    // undo(); redo() is the identity at every depth
    for depth in 0..5 {
        for _ in 0..depth {
            editor.undo().unwrap();
        }
        let before = state(&editor);
        let order = editor.layers().paint_order();
        assert!(editor.undo().unwrap());
        assert!(editor.redo().unwrap());
        assert_eq!(state(&editor), before, "depth {depth}");
        assert_eq!(editor.layers().paint_order(), order, "depth {depth}");
        for _ in 0..depth {
            editor.redo().unwrap();
        }
    }
}

#[test]
fn test_removed_object_returns_to_its_z_position() {
    let mut editor = Editor::default();
    let ids: Vec<_> = (0..3)
        .map(|i| {
            let object = factory::rectangle(1, rect(i as f32 * 20.0, 0.0, 10.0, 10.0), ObjectStyle::default());
            editor.add_object(object).unwrap()
        })
        .collect();

    editor.remove_object(ids[1]).unwrap();
    assert_eq!(editor.layers().paint_order(), vec![ids[0], ids[2]]);
    editor.undo().unwrap();
    assert_eq!(editor.layers().paint_order(), ids);
}

#[test]
fn test_empty_stacks_are_noops() {
    let mut editor = Editor::default();
    assert!(!editor.undo().unwrap());
    assert!(!editor.redo().unwrap());
    assert!(editor.scene().is_empty());
}

#[test]
fn test_new_action_clears_redo() {
    let mut editor = Editor::default();
    editor.add_object(factory::rectangle(1, rect(0.0, 0.0, 10.0, 10.0), ObjectStyle::default())).unwrap();
    editor.undo().unwrap();
    assert!(editor.history().can_redo());

    editor.add_object(factory::rectangle(1, rect(20.0, 0.0, 10.0, 10.0), ObjectStyle::default())).unwrap();
    assert!(!editor.history().can_redo());
    assert!(!editor.redo().unwrap());
}

#[test]
fn test_history_is_bounded() {
    let config = EditorConfig::default().with_history_limit(3);
    let mut editor = Editor::new(config, Preferences::default());
    for i in 0..5 {
        let object = factory::rectangle(1, rect(i as f32 * 20.0, 0.0, 10.0, 10.0), ObjectStyle::default());
        editor.add_object(object).unwrap();
    }
    assert_eq!(editor.history().undo_len(), 3);

    while editor.undo().unwrap() {}
    // The two oldest additions can no longer be undone
    assert_eq!(editor.scene().len(), 2);
}

#[test]
fn test_multi_selection_edit_is_one_entry() {
    let mut editor = Editor::default();
    let a = editor.add_object(factory::rectangle(1, rect(10.0, 10.0, 40.0, 40.0), ObjectStyle::default())).unwrap();
    let b = editor.add_object(factory::rectangle(1, rect(100.0, 10.0, 40.0, 40.0), ObjectStyle::default())).unwrap();
    editor.select(a, false);
    editor.select(b, true);
    let entries = editor.history().undo_len();

    let changed = editor
        .set_selection_property(PropertyKey::Color, PropertyValue::Color(Some(Color32::BLUE)))
        .unwrap();
    assert_eq!(changed, 2);
    assert_eq!(editor.history().undo_len(), entries + 1);

    editor.undo().unwrap();
    for id in [a, b] {
        assert_eq!(editor.scene().get(id).unwrap().style.stroke_color, ObjectStyle::default().stroke_color);
    }
}

#[test]
fn test_shape_tool_stays_active_after_commit() {
    let mut editor = Editor::default();
    editor.select_mode(ToolMode::Shape(ShapeKind::Rectangle)).unwrap();
    drag(&mut editor, pos2(10.0, 10.0), pos2(60.0, 60.0));
    drag(&mut editor, pos2(100.0, 100.0), pos2(160.0, 140.0));

    assert_eq!(editor.mode(), ToolMode::Shape(ShapeKind::Rectangle));
    assert_eq!(editor.scene().len(), 2);
    assert_eq!(editor.history().undo_len(), 2);
}
