use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{EditorEvent, EventHandler};

/// Collects events into a shared queue that a UI panel drains each frame
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<Vec<EditorEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler feeding this queue, to pass to [`crate::event::EventBus::subscribe`]
    pub fn handler(&self) -> Box<dyn EventHandler> {
        Box::new(QueueHandler {
            events: Arc::clone(&self.events),
        })
    }

    pub fn drain(&self) -> Vec<EditorEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

struct QueueHandler {
    events: Arc<Mutex<Vec<EditorEvent>>>,
}

impl EventHandler for QueueHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Logs every event at debug level
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::Error(message) => log::error!("Editor error: {}", message),
            EditorEvent::RepaintRequested => {}
            other => log::debug!("Editor event: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;

    #[test]
    fn queue_receives_emitted_events() {
        let bus = EventBus::new();
        let queue = EventQueue::new();
        bus.subscribe(queue.handler());
        bus.subscribe(Box::new(LoggingHandler));

        bus.emit(EditorEvent::RepaintRequested);
        bus.emit(EditorEvent::Error("boom".to_owned()));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain()[1], EditorEvent::Error("boom".to_owned()));
        assert!(queue.is_empty());
    }
}
