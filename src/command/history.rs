use std::collections::VecDeque;

use super::{Command, CommandContext, CommandError};
use crate::util::time::current_time_secs;

/// A recorded command and when it was recorded
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: Command,
    pub timestamp: f64,
}

/// Manages the history of executed commands for undo/redo functionality
#[derive(Debug, Clone)]
pub struct CommandHistory {
    /// Oldest first; trimmed from the front when over `limit`
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CommandHistory {
    /// Creates an empty history keeping at most `limit` undo entries
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record a command that has already been applied.
    ///
    /// Clears the redo stack and drops the oldest entry when full.
    pub fn record(&mut self, command: Command) {
        log::debug!("History: recorded '{}'", command.label());
        self.undo_stack.push_back(HistoryEntry {
            command,
            timestamp: current_time_secs(),
        });
        self.redo_stack.clear();
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Apply a command and record it if it succeeded
    pub fn execute(&mut self, command: Command, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        command.execute(ctx)?;
        self.record(command);
        Ok(())
    }

    /// Revert the newest entry. Returns the reverted command, `None` if
    /// there was nothing to undo.
    pub fn undo(&mut self, ctx: &mut CommandContext<'_>) -> Result<Option<&Command>, CommandError> {
        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(None);
        };
        if let Err(err) = entry.command.undo(ctx) {
            log::error!("Undo of '{}' failed: {}", entry.command.label(), err);
            self.undo_stack.push_back(entry);
            return Err(err);
        }
        self.redo_stack.push(entry);
        Ok(self.redo_stack.last().map(|entry| &entry.command))
    }

    /// Re-apply the newest undone entry. Returns `None` if there was nothing to redo.
    pub fn redo(&mut self, ctx: &mut CommandContext<'_>) -> Result<Option<&Command>, CommandError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = entry.command.execute(ctx) {
            log::error!("Redo of '{}' failed: {}", entry.command.label(), err);
            self.redo_stack.push(entry);
            return Err(err);
        }
        self.undo_stack.push_back(entry);
        Ok(self.undo_stack.back().map(|entry| &entry.command))
    }

    /// Returns true if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.undo_stack.iter()
    }

    pub fn redo_entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.redo_stack.iter()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear the command history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ObjectStyle, SceneObject, factory};
    use crate::layer::LayerStack;
    use crate::scene::Scene;
    use egui::{Rect, pos2, vec2};

    fn add(layers: &LayerStack, x: f32) -> Command {
        let object: SceneObject =
            factory::rectangle(1, Rect::from_min_size(pos2(x, 0.0), vec2(10.0, 10.0)), ObjectStyle::default());
        Command::AddObject { object, layer: layers.active_id(), index: 0 }
    }

    #[test]
    fn oldest_entries_are_dropped() {
        let mut scene = Scene::new();
        let mut layers = LayerStack::new();
        let mut history = CommandHistory::new(2);
        for i in 0..3 {
            let command = add(&layers, i as f32 * 20.0);
            let mut ctx = CommandContext::new(&mut scene, &mut layers, true);
            history.execute(command, &mut ctx).unwrap();
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut scene = Scene::new();
        let mut layers = LayerStack::new();
        let mut history = CommandHistory::default();
        let mut ctx = CommandContext::new(&mut scene, &mut layers, true);
        assert_eq!(history.undo(&mut ctx), Ok(None));
        assert_eq!(history.redo(&mut ctx), Ok(None));
    }

    #[test]
    fn new_record_clears_redo() {
        let mut scene = Scene::new();
        let mut layers = LayerStack::new();
        let mut history = CommandHistory::default();

        let first = add(&layers, 0.0);
        let second = add(&layers, 30.0);
        let mut ctx = CommandContext::new(&mut scene, &mut layers, true);
        history.execute(first, &mut ctx).unwrap();
        history.undo(&mut ctx).unwrap();
        assert!(history.can_redo());

        history.execute(second, &mut ctx).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 1);
    }
}
