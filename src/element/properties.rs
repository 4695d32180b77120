//! Generic property access used by the floating property editor.
//!
//! Keys are resolved per variant: on text objects `Color` is the glyph color
//! and `Fill` is the background, on every other object they are the stroke
//! and fill colors.

use egui::Color32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ObjectKind, SceneObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    Color,
    Fill,
    StrokeWidth,
    Opacity,
    FontFamily,
    FontSize,
    Bold,
    Italic,
    Content,
}

impl PropertyKey {
    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Color => "color",
            PropertyKey::Fill => "fill",
            PropertyKey::StrokeWidth => "stroke_width",
            PropertyKey::Opacity => "opacity",
            PropertyKey::FontFamily => "font_family",
            PropertyKey::FontSize => "font_size",
            PropertyKey::Bold => "bold",
            PropertyKey::Italic => "italic",
            PropertyKey::Content => "content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// `None` clears an optional color (no fill / no background)
    Color(Option<Color32>),
    Number(f32),
    Bool(bool),
    Text(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("property `{key}` does not apply to {object_type} objects")]
    NotApplicable {
        key: &'static str,
        object_type: &'static str,
    },
    #[error("property `{key}` expects {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
    #[error("property `{key}` value {value} is out of range")]
    OutOfRange { key: &'static str, value: f32 },
}

fn wrong_type(key: PropertyKey, expected: &'static str) -> PropertyError {
    PropertyError::WrongType {
        key: key.name(),
        expected,
    }
}

fn positive(key: PropertyKey, value: f32) -> Result<f32, PropertyError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PropertyError::OutOfRange {
            key: key.name(),
            value,
        })
    }
}

impl SceneObject {
    /// Current value of `key`, `None` if it does not apply to this variant
    pub fn property(&self, key: PropertyKey) -> Option<PropertyValue> {
        let text = self.as_text();
        match (key, text) {
            (PropertyKey::Color, Some(text)) => Some(PropertyValue::Color(Some(text.color))),
            (PropertyKey::Color, None) => Some(PropertyValue::Color(Some(self.style.stroke_color))),
            (PropertyKey::Fill, Some(text)) => Some(PropertyValue::Color(text.background)),
            (PropertyKey::Fill, None) => Some(PropertyValue::Color(self.style.fill)),
            (PropertyKey::StrokeWidth, _) => Some(PropertyValue::Number(self.style.stroke_width)),
            (PropertyKey::Opacity, _) => Some(PropertyValue::Number(self.style.opacity)),
            (PropertyKey::FontFamily, Some(text)) => Some(PropertyValue::Text(text.font_family.clone())),
            (PropertyKey::FontSize, Some(text)) => Some(PropertyValue::Number(text.font_size)),
            (PropertyKey::Bold, Some(text)) => Some(PropertyValue::Bool(text.bold)),
            (PropertyKey::Italic, Some(text)) => Some(PropertyValue::Bool(text.italic)),
            (PropertyKey::Content, Some(text)) => Some(PropertyValue::Text(text.content.clone())),
            (PropertyKey::Content, None) => match &self.kind {
                ObjectKind::Stamp { label, .. } => Some(PropertyValue::Text(label.clone())),
                _ => None,
            },
            (PropertyKey::FontFamily | PropertyKey::FontSize | PropertyKey::Bold | PropertyKey::Italic, None) => None,
        }
    }

    pub fn set_property(&mut self, key: PropertyKey, value: PropertyValue) -> Result<(), PropertyError> {
        let object_type = self.type_name();
        let not_applicable = || PropertyError::NotApplicable {
            key: key.name(),
            object_type,
        };

        match key {
            PropertyKey::Color => {
                let PropertyValue::Color(Some(color)) = value else {
                    return Err(wrong_type(key, "a color"));
                };
                match self.as_text_mut() {
                    Some(text) => text.color = color,
                    None => self.style.stroke_color = color,
                }
            }
            PropertyKey::Fill => {
                let PropertyValue::Color(color) = value else {
                    return Err(wrong_type(key, "a color or none"));
                };
                match self.as_text_mut() {
                    Some(text) => text.background = color,
                    None => self.style.fill = color,
                }
            }
            PropertyKey::StrokeWidth => {
                let PropertyValue::Number(width) = value else {
                    return Err(wrong_type(key, "a number"));
                };
                self.style.stroke_width = positive(key, width)?;
            }
            PropertyKey::Opacity => {
                let PropertyValue::Number(opacity) = value else {
                    return Err(wrong_type(key, "a number"));
                };
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(PropertyError::OutOfRange {
                        key: key.name(),
                        value: opacity,
                    });
                }
                self.style.opacity = opacity;
            }
            PropertyKey::FontFamily => {
                let PropertyValue::Text(family) = value else {
                    return Err(wrong_type(key, "a font name"));
                };
                self.as_text_mut().ok_or_else(not_applicable)?.font_family = family;
            }
            PropertyKey::FontSize => {
                let PropertyValue::Number(size) = value else {
                    return Err(wrong_type(key, "a number"));
                };
                let size = positive(key, size)?;
                self.as_text_mut().ok_or_else(not_applicable)?.font_size = size;
            }
            PropertyKey::Bold | PropertyKey::Italic => {
                let PropertyValue::Bool(flag) = value else {
                    return Err(wrong_type(key, "true or false"));
                };
                let text = self.as_text_mut().ok_or_else(not_applicable)?;
                if key == PropertyKey::Bold {
                    text.bold = flag;
                } else {
                    text.italic = flag;
                }
            }
            PropertyKey::Content => {
                let PropertyValue::Text(content) = value else {
                    return Err(wrong_type(key, "text"));
                };
                match &mut self.kind {
                    ObjectKind::Text(text) => text.content = content,
                    ObjectKind::Stamp { label, .. } => *label = content,
                    _ => return Err(not_applicable()),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ObjectStyle, factory};
    use egui::{Rect, pos2, vec2};

    fn rect() -> SceneObject {
        factory::rectangle(1, Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0)), ObjectStyle::default())
    }

    #[test]
    fn color_maps_to_text_fill_and_fill_to_background() {
        let mut text = factory::text(1, pos2(0.0, 0.0), "Hello", Color32::BLACK);
        text.set_property(PropertyKey::Color, PropertyValue::Color(Some(Color32::RED))).unwrap();
        text.set_property(PropertyKey::Fill, PropertyValue::Color(Some(Color32::YELLOW))).unwrap();

        let inner = text.as_text().unwrap();
        assert_eq!(inner.color, Color32::RED);
        assert_eq!(inner.background, Some(Color32::YELLOW));
        // The shared style is untouched for text
        assert_eq!(text.style, ObjectStyle::default());
    }

    #[test]
    fn color_maps_to_stroke_on_shapes() {
        let mut shape = rect();
        shape.set_property(PropertyKey::Color, PropertyValue::Color(Some(Color32::BLUE))).unwrap();
        shape.set_property(PropertyKey::Fill, PropertyValue::Color(None)).unwrap();
        assert_eq!(shape.style.stroke_color, Color32::BLUE);
        assert_eq!(shape.style.fill, None);
        assert_eq!(shape.property(PropertyKey::Color), Some(PropertyValue::Color(Some(Color32::BLUE))));
    }

    #[test]
    fn text_only_keys_are_rejected_on_shapes() {
        let mut shape = rect();
        let err = shape.set_property(PropertyKey::FontSize, PropertyValue::Number(12.0)).unwrap_err();
        assert!(matches!(err, PropertyError::NotApplicable { key: "font_size", object_type: "rectangle" }));
        assert_eq!(shape.property(PropertyKey::Bold), None);
    }

    #[test]
    fn invalid_values_leave_object_unchanged() {
        let mut shape = rect();
        let before = shape.clone();
        assert!(shape.set_property(PropertyKey::Opacity, PropertyValue::Number(1.5)).is_err());
        assert!(shape.set_property(PropertyKey::StrokeWidth, PropertyValue::Bool(true)).is_err());
        assert_eq!(shape, before);
    }
}
