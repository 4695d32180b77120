use egui::Key;

use super::InputEvent;
use crate::error::EditorResult;
use crate::state::Editor;

/// Apply one input event to the editor.
///
/// While text is being edited, keys go to the text. Otherwise Escape
/// cancels the gesture, Delete removes the selection, and Ctrl/Cmd+Z / Y
/// step through history.
pub fn route_event(event: &InputEvent, editor: &mut Editor) -> EditorResult<()> {
    let editing = editor.session().is_editing_text();
    match event {
        InputEvent::PointerDown { pos, shift } => editor.pointer_down(*pos, *shift)?,
        InputEvent::PointerMove { pos, shift } => editor.pointer_move(*pos, *shift),
        InputEvent::PointerUp { pos, shift } => editor.pointer_up(*pos, *shift)?,
        InputEvent::DoubleClick { pos } => editor.double_click(*pos)?,
        InputEvent::Text(text) if editing => editor.text_input(text),
        InputEvent::Text(_) => {}
        InputEvent::Key { key, modifiers } if editing => match key {
            Key::Backspace => editor.backspace(),
            Key::ArrowLeft => editor.caret_left(),
            Key::ArrowRight => editor.caret_right(),
            Key::Enter if modifiers.shift => editor.text_input("\n"),
            Key::Enter | Key::Escape => editor.commit_text_edit()?,
            _ => {}
        },
        InputEvent::Key { key, modifiers } => match key {
            Key::Escape => editor.cancel_interaction(),
            Key::Delete | Key::Backspace => {
                editor.delete_selection()?;
            }
            Key::Z if modifiers.command && modifiers.shift => {
                editor.redo()?;
            }
            Key::Z if modifiers.command => {
                editor.undo()?;
            }
            Key::Y if modifiers.command => {
                editor.redo()?;
            }
            _ => {}
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolMode;
    use egui::{Modifiers, pos2};

    fn key(key: Key, modifiers: Modifiers) -> InputEvent {
        InputEvent::Key { key, modifiers }
    }

    #[test]
    fn typing_goes_into_new_text() {
        let mut editor = Editor::default();
        editor.select_mode(ToolMode::Text).unwrap();
        route_event(&InputEvent::PointerDown { pos: pos2(20.0, 20.0), shift: false }, &mut editor).unwrap();
        route_event(&InputEvent::Text("Hello".to_owned()), &mut editor).unwrap();
        route_event(&key(Key::Enter, Modifiers::NONE), &mut editor).unwrap();

        assert!(editor.session().is_idle());
        let text = editor.scene().iter().next().unwrap().as_text().unwrap().content.clone();
        assert_eq!(text, "Hello");
    }

    #[test]
    fn shortcuts_step_history() {
        let mut editor = Editor::default();
        editor.select_mode(ToolMode::Stamp).unwrap();
        route_event(&InputEvent::PointerDown { pos: pos2(200.0, 200.0), shift: false }, &mut editor).unwrap();
        assert_eq!(editor.scene().len(), 1);

        route_event(&key(Key::Z, Modifiers::COMMAND), &mut editor).unwrap();
        assert!(editor.scene().is_empty());
        route_event(&key(Key::Z, Modifiers::COMMAND | Modifiers::SHIFT), &mut editor).unwrap();
        assert_eq!(editor.scene().len(), 1);
    }
}
