use egui::{Key, Modifiers, PointerButton, Pos2};

use crate::renderer::PageView;

mod router;
pub use router::route_event;

/// Seconds between two clicks that still count as a double-click
pub const DOUBLE_CLICK_DELAY: f64 = 0.3;
/// Max pointer travel between the two clicks of a double-click, in screen pixels
pub const DOUBLE_CLICK_SLOP: f32 = 6.0;

/// Editor input with pointer positions already in page space
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2, shift: bool },
    PointerMove { pos: Pos2, shift: bool },
    PointerUp { pos: Pos2, shift: bool },
    DoubleClick { pos: Pos2 },
    /// Typed characters
    Text(String),
    Key { key: Key, modifiers: Modifiers },
}

/// Turns raw egui events into [`InputEvent`]s for the page under the pointer
#[derive(Debug, Default)]
pub struct InputHandler {
    /// Primary button went down on the page and has not been released yet
    pressed: bool,
    last_click: Option<(f64, Pos2)>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Translate one frame of raw events.
    ///
    /// Presses only start on the page; moves and the release are forwarded
    /// for as long as the press lasts, even off the page.
    pub fn process_input(
        &mut self,
        events: &[egui::Event],
        modifiers: Modifiers,
        time: f64,
        view: &PageView<'_>,
    ) -> Vec<InputEvent> {
        let page_area = view.screen_rect();
        let mut out = Vec::new();
        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: true,
                    modifiers,
                } if page_area.contains(*pos) => {
                    self.pressed = true;
                    let page_pos = view.from_screen(*pos);
                    let double = self.last_click.is_some_and(|(at, last)| {
                        time - at <= DOUBLE_CLICK_DELAY && last.distance(*pos) <= DOUBLE_CLICK_SLOP
                    });
                    out.push(InputEvent::PointerDown {
                        pos: page_pos,
                        shift: modifiers.shift,
                    });
                    if double {
                        self.last_click = None;
                        out.push(InputEvent::DoubleClick { pos: page_pos });
                    } else {
                        self.last_click = Some((time, *pos));
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: false,
                    modifiers,
                } if self.pressed => {
                    self.pressed = false;
                    out.push(InputEvent::PointerUp {
                        pos: view.from_screen(*pos),
                        shift: modifiers.shift,
                    });
                }
                egui::Event::PointerMoved(pos) if self.pressed => {
                    out.push(InputEvent::PointerMove {
                        pos: view.from_screen(*pos),
                        shift: modifiers.shift,
                    });
                }
                egui::Event::PointerGone if self.pressed => {
                    // Release arrives nowhere once the pointer leaves the window
                    log::debug!("Pointer left during a press");
                }
                egui::Event::Text(text) => out.push(InputEvent::Text(text.clone())),
                egui::Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => out.push(InputEvent::Key {
                    key: *key,
                    modifiers: *modifiers,
                }),
                _ => {}
            }
        }
        out
    }
}
