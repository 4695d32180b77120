use std::collections::HashSet;

use egui::{Rect, pos2, vec2};
use pdf_annotator::element::factory;
use pdf_annotator::state::EditorSnapshot;
use pdf_annotator::{Editor, LayerStack, ObjectId, ObjectStyle, ToolMode};
use serde_json::{Value, json};

fn add_rect(editor: &mut Editor, x: f32) -> ObjectId {
    let rect = Rect::from_min_size(pos2(x, 100.0), vec2(40.0, 40.0));
    editor.add_object(factory::rectangle(1, rect, ObjectStyle::default())).unwrap()
}

fn assert_disjoint(editor: &Editor) {
    let mut seen = HashSet::new();
    for layer in editor.layers().layers() {
        for id in &layer.objects {
            assert!(seen.insert(*id), "{id} is in more than one layer");
        }
    }
    assert_eq!(seen.len(), editor.scene().len());
}

#[test]
fn test_editor_starts_with_one_active_layer() {
    let editor = Editor::default();
    assert_eq!(editor.layers().len(), 1);
    assert_eq!(editor.layers().active_id(), editor.layers().layers()[0].id);
}

#[test]
fn test_objects_go_to_the_active_layer() {
    let mut editor = Editor::default();
    let base = editor.layers().active_id();
    let a = add_rect(&mut editor, 0.0);

    let top = editor.add_layer(Some("Notes"));
    assert_eq!(editor.layers().active_id(), top);
    let b = add_rect(&mut editor, 100.0);

    assert_eq!(editor.layers().get(base).unwrap().objects, vec![a]);
    assert_eq!(editor.layers().get(top).unwrap().objects, vec![b]);
    assert_eq!(editor.layers().get(top).unwrap().name, "Notes");
    assert_disjoint(&editor);
}

#[test]
fn test_layer_order_is_paint_order() {
    let mut editor = Editor::default();
    let base = editor.layers().active_id();
    let a = add_rect(&mut editor, 0.0);
    editor.add_layer(None);
    let b = add_rect(&mut editor, 0.0);
    assert_eq!(editor.layers().paint_order(), vec![a, b]);

    editor.move_layer(base, 1).unwrap();
    assert_eq!(editor.layers().paint_order(), vec![b, a]);
}

#[test]
fn test_deleting_last_layer_is_a_noop() {
    let mut editor = Editor::default();
    let only = editor.layers().active_id();
    add_rect(&mut editor, 0.0);

    assert!(!editor.delete_layer(only).unwrap());
    assert_eq!(editor.layers().len(), 1);
    assert_eq!(editor.scene().len(), 1);
}

#[test]
fn test_delete_layer_removes_members_and_undoes() {
    let mut editor = Editor::default();
    add_rect(&mut editor, 0.0);
    let doomed = editor.add_layer(None);
    let b = add_rect(&mut editor, 100.0);
    let c = add_rect(&mut editor, 200.0);

    assert!(editor.delete_layer(doomed).unwrap());
    assert_eq!(editor.layers().len(), 1);
    assert_eq!(editor.scene().len(), 1);
    assert_ne!(editor.layers().active_id(), doomed);

    assert!(editor.undo().unwrap());
    let restored = editor.layers().get(doomed).unwrap();
    assert_eq!(restored.objects, vec![b, c]);
    assert_eq!(editor.layers().index_of(doomed), Some(1));
    assert_disjoint(&editor);
}

#[test]
fn test_hidden_layer_is_not_painted() {
    let mut editor = Editor::default();
    let base = editor.layers().active_id();
    let a = add_rect(&mut editor, 0.0);
    editor.add_layer(None);
    let b = add_rect(&mut editor, 100.0);

    assert!(!editor.toggle_layer_visibility(base).unwrap());
    let visible: Vec<_> = editor.visible_objects(1).iter().map(|object| object.id()).collect();
    assert_eq!(visible, vec![b]);
    assert!(!editor.scene().get(a).unwrap().visible);

    assert!(editor.toggle_layer_visibility(base).unwrap());
    assert_eq!(editor.visible_objects(1).len(), 2);
}

#[test]
fn test_hidden_objects_cannot_be_picked() {
    let mut editor = Editor::default();
    let base = editor.layers().active_id();
    let a = add_rect(&mut editor, 0.0);
    editor.select(a, false);

    editor.toggle_layer_visibility(base).unwrap();
    assert!(editor.scene().selection().is_empty());
    assert!(!editor.select(a, false));
}

#[test]
fn test_locked_layer_objects_are_unselectable() {
    let mut editor = Editor::default();
    let base = editor.layers().active_id();
    let a = add_rect(&mut editor, 0.0);
    editor.toggle_layer_lock(base).unwrap();

    assert!(editor.scene().get(a).unwrap().locked);
    editor.pointer_down(pos2(20.0, 120.0), false).unwrap();
    editor.pointer_up(pos2(20.0, 120.0), false).unwrap();
    assert!(editor.scene().selection().is_empty());

    // Still painted
    assert_eq!(editor.visible_objects(1).len(), 1);

    editor.toggle_layer_lock(base).unwrap();
    editor.pointer_down(pos2(20.0, 120.0), false).unwrap();
    editor.pointer_up(pos2(20.0, 120.0), false).unwrap();
    assert!(editor.scene().is_selected(a));
}

#[test]
fn test_eraser_skips_locked_layers() {
    let mut editor = Editor::default();
    let base = editor.layers().active_id();
    add_rect(&mut editor, 0.0);
    editor.toggle_layer_lock(base).unwrap();
    editor.select_mode(ToolMode::Eraser).unwrap();

    editor.pointer_down(pos2(20.0, 120.0), false).unwrap();
    assert_eq!(editor.scene().len(), 1);
}

#[test]
fn test_rename_ignores_blank_names() {
    let mut editor = Editor::default();
    let id = editor.layers().active_id();
    editor.rename_layer(id, "  Review  ").unwrap();
    assert_eq!(editor.layers().get(id).unwrap().name, "Review");

    editor.rename_layer(id, "   ").unwrap();
    assert_eq!(editor.layers().get(id).unwrap().name, "Review");
}

fn edited_snapshot(editor: &Editor, edit: impl FnOnce(&mut Value)) -> EditorSnapshot {
    let mut value: Value = serde_json::from_str(&editor.snapshot().to_json().unwrap()).unwrap();
    edit(&mut value);
    EditorSnapshot::from_json(&value.to_string()).unwrap()
}

#[test]
fn test_restore_refills_an_empty_layer_stack() {
    let mut editor = Editor::default();
    let a = add_rect(&mut editor, 0.0);
    let snapshot = edited_snapshot(&editor, |value| value["layers"]["layers"] = json!([]));

    let mut restored = Editor::default();
    restored.restore(snapshot).unwrap();
    assert_eq!(restored.layers().len(), 1);
    assert_eq!(restored.layers().active().objects, vec![a]);

    add_rect(&mut restored, 100.0);
    assert_eq!(restored.scene().len(), 2);
    assert_disjoint(&restored);
}

#[test]
fn test_restore_files_orphans_into_active_layer() {
    let mut editor = Editor::default();
    let a = add_rect(&mut editor, 0.0);
    let mut snapshot = editor.snapshot();
    snapshot.layers = LayerStack::new();

    let mut restored = Editor::default();
    restored.restore(snapshot).unwrap();
    assert_eq!(restored.layers().paint_order(), vec![a]);
    assert_eq!(restored.visible_objects(1).len(), 1);

    restored.remove_object(a).unwrap();
    assert!(restored.scene().is_empty());
    assert!(restored.layers().paint_order().is_empty());
}

#[test]
fn test_restore_drops_dangling_and_repeated_ids() {
    let mut editor = Editor::default();
    let a = add_rect(&mut editor, 0.0);
    editor.add_layer(Some("Notes"));
    let snapshot = edited_snapshot(&editor, |value| {
        let members = value["layers"]["layers"][1]["objects"].as_array_mut().unwrap();
        members.push(serde_json::to_value(a).unwrap());
        members.push(serde_json::to_value(ObjectId::new()).unwrap());
        value["layers"]["active"] = serde_json::to_value(pdf_annotator::LayerId::new()).unwrap();
    });

    let mut restored = Editor::default();
    restored.restore(snapshot).unwrap();
    assert_eq!(restored.layers().paint_order(), vec![a]);
    assert_eq!(restored.layers().active_id(), restored.layers().layers()[0].id);
    assert_disjoint(&restored);
}
