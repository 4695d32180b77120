use egui::{Color32, FontFamily, FontId, Pos2, Rect};
use serde::{Deserialize, Serialize};

use super::common;

pub const DEFAULT_FONT_FAMILY: &str = "Sans";
pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const PLACEHOLDER_TEXT: &str = "Type here";
/// Families the property editor offers
pub const FONT_FAMILIES: [&str; 2] = [DEFAULT_FONT_FAMILY, "Monospace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    /// Top-left of the text box
    pub anchor: Pos2,
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    /// Glyph color
    pub color: Color32,
    pub background: Option<Color32>,
}

impl TextObject {
    pub fn new(anchor: Pos2, content: impl Into<String>) -> Self {
        Self {
            anchor,
            content: content.into(),
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            color: Color32::BLACK,
            background: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.anchor, common::text_box_size(&self.content, self.font_size))
    }

    /// egui font for on-screen rendering at `scale`
    pub fn font_id(&self, scale: f32) -> FontId {
        let family = if self.font_family.eq_ignore_ascii_case("monospace") {
            FontFamily::Monospace
        } else {
            FontFamily::Proportional
        };
        FontId::new((self.font_size * scale).max(1.0), family)
    }
}

/// Caret state of a text object being edited.
///
/// `select_all` is set when editing starts so that the first keystroke
/// replaces the whole content (the placeholder on fresh objects).
#[derive(Debug, Clone, PartialEq)]
pub struct TextCursor {
    /// Caret position in chars
    pub caret: usize,
    pub select_all: bool,
}

impl TextCursor {
    pub fn select_all(content: &str) -> Self {
        Self {
            caret: content.chars().count(),
            select_all: true,
        }
    }

    /// Insert `input` at the caret, replacing everything if all is selected
    pub fn insert(&mut self, content: &mut String, input: &str) {
        if self.select_all {
            content.clear();
            self.caret = 0;
            self.select_all = false;
        }
        let byte = byte_index(content, self.caret);
        content.insert_str(byte, input);
        self.caret += input.chars().count();
    }

    pub fn backspace(&mut self, content: &mut String) {
        if self.select_all {
            content.clear();
            self.caret = 0;
            self.select_all = false;
            return;
        }
        if self.caret == 0 {
            return;
        }
        let start = byte_index(content, self.caret - 1);
        let end = byte_index(content, self.caret);
        content.replace_range(start..end, "");
        self.caret -= 1;
    }

    pub fn move_left(&mut self) {
        self.select_all = false;
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn move_right(&mut self, content: &str) {
        self.select_all = false;
        self.caret = (self.caret + 1).min(content.chars().count());
    }
}

fn byte_index(content: &str, char_index: usize) -> usize {
    content
        .char_indices()
        .nth(char_index)
        .map_or(content.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_keystroke_replaces_placeholder() {
        let mut content = PLACEHOLDER_TEXT.to_owned();
        let mut cursor = TextCursor::select_all(&content);
        cursor.insert(&mut content, "H");
        cursor.insert(&mut content, "ello");
        assert_eq!(content, "Hello");
        assert_eq!(cursor.caret, 5);
    }

    #[test]
    fn editing_handles_multibyte_chars() {
        let mut content = "añb".to_owned();
        let mut cursor = TextCursor { caret: 2, select_all: false };
        cursor.backspace(&mut content);
        assert_eq!(content, "ab");
        cursor.insert(&mut content, "é");
        assert_eq!(content, "aéb");
        cursor.move_right(&content);
        cursor.move_right(&content);
        assert_eq!(cursor.caret, 3);
    }

    #[test]
    fn text_rect_grows_with_content() {
        let short = TextObject::new(Pos2::ZERO, "Hi");
        let long = TextObject::new(Pos2::ZERO, "Hello world");
        assert!(long.rect().width() > short.rect().width());
        assert_eq!(short.rect().height(), long.rect().height());
    }
}
