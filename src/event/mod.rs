mod bus;
mod events;
mod handlers;

pub use bus::EventBus;
pub use events::{DocumentEvent, EditorEvent, LayerEvent};
pub use handlers::{EventQueue, LoggingHandler};

pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &EditorEvent);
}
