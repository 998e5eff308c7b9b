//! Undo/Redo coordination.
//!
//! The document wrapper registers an [`UndoEntry`] (forward edit plus its
//! inverse) *before* applying each mutation. A coordinator keeps entries as
//! LIFO steps; undo hands a step back so the wrapper can apply its inverses
//! newest-first, redo hands it back for the forwards oldest-first.
//!
//! Gestures are coalesced by [`GroupToken`]: consecutive registrations that
//! carry the same token extend the step on top of the stack instead of
//! opening a new one.

use crate::edit::DocumentEdit;
use ea_core::config::EditorConfig;

/// Identifies one user gesture (a drag, a pinch) for undo grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupToken(pub u64);

/// A forward edit and the edit that reverses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub forward: DocumentEdit,
    pub inverse: DocumentEdit,
}

/// One undoable unit: a single edit or a whole gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStep {
    pub entries: Vec<UndoEntry>,
    pub description: String,
    pub group: Option<GroupToken>,
}

/// External undo collaborator.
///
/// Coordinators without grouping support may ignore the token; each
/// registration then becomes its own step.
pub trait UndoCoordinator {
    fn register(&mut self, entry: UndoEntry, description: &str, group: Option<GroupToken>);

    /// Pop the newest step for undoing, moving it to the redo side.
    fn undo(&mut self) -> Option<UndoStep>;

    /// Pop the newest undone step for redoing, moving it back.
    fn redo(&mut self) -> Option<UndoStep>;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    /// Drop every undo and redo step.
    fn clear(&mut self);
}

/// Default coordinator: bounded undo stack with redo and grouping.
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    /// Maximum undo depth.
    max_depth: usize,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(1024)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.undo_depth)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Description of the step `undo` would reverse.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|s| s.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|s| s.description.as_str())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoCoordinator for UndoStack {
    fn register(&mut self, entry: UndoEntry, description: &str, group: Option<GroupToken>) {
        // New action invalidates anything undone.
        self.redo_stack.clear();

        if let Some(token) = group
            && let Some(top) = self.undo_stack.last_mut()
            && top.group == Some(token)
        {
            top.entries.push(entry);
            return;
        }

        self.undo_stack.push(UndoStep {
            entries: vec![entry],
            description: description.to_string(),
            group,
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    fn undo(&mut self) -> Option<UndoStep> {
        let step = self.undo_stack.pop()?;
        self.redo_stack.push(step.clone());
        Some(step)
    }

    fn redo(&mut self) -> Option<UndoStep> {
        let step = self.redo_stack.pop()?;
        self.undo_stack.push(step.clone());
        Some(step)
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ea_core::position::Position;

    fn nudge(dx: i32) -> UndoEntry {
        UndoEntry {
            forward: DocumentEdit::MoveEmoji { id: 1, by: Position::new(dx, 0) },
            inverse: DocumentEdit::MoveEmoji { id: 1, by: Position::new(-dx, 0) },
        }
    }

    #[test]
    fn undo_then_redo_returns_same_step() {
        let mut stack = UndoStack::new(100);
        stack.register(nudge(5), "Move", None);

        let undone = stack.undo().unwrap();
        assert_eq!(undone.description, "Move");
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        let redone = stack.redo().unwrap();
        assert_eq!(redone, undone);
        assert!(stack.can_undo());
    }

    #[test]
    fn redo_clears_on_new_action() {
        let mut stack = UndoStack::new(100);
        stack.register(nudge(5), "move", None);
        stack.undo();
        assert!(stack.can_redo());

        stack.register(nudge(1), "move2", None);
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            stack.register(nudge(i + 1), &format!("move {i}"), None);
        }
        let mut undo_count = 0;
        while stack.undo().is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
    }

    #[test]
    fn same_group_coalesces() {
        let mut stack = UndoStack::new(100);
        let drag = GroupToken(7);
        for _ in 0..5 {
            stack.register(nudge(10), "drag", Some(drag));
        }
        stack.register(nudge(1), "drag", Some(GroupToken(8)));

        assert_eq!(stack.undo_depth(), 2);
        stack.undo();
        assert_eq!(stack.undo().unwrap().entries.len(), 5);
    }

    #[test]
    fn ungrouped_entries_never_coalesce() {
        let mut stack = UndoStack::new(100);
        stack.register(nudge(1), "a", None);
        stack.register(nudge(2), "b", None);
        assert_eq!(stack.undo_depth(), 2);
        assert_eq!(stack.undo_description(), Some("b"));
    }

    #[test]
    fn depth_comes_from_config() {
        let config = EditorConfig {
            undo_depth: 2,
            ..EditorConfig::default()
        };
        let mut stack = UndoStack::from_config(&config);
        for i in 0..4 {
            stack.register(nudge(i), "move", None);
        }
        assert_eq!(stack.undo_depth(), 2);
    }

    #[test]
    fn clear_drops_both_sides() {
        let mut stack = UndoStack::new(100);
        stack.register(nudge(1), "a", None);
        stack.register(nudge(2), "b", None);
        stack.undo();
        stack.clear();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_depth(), 0);
    }

    #[test]
    fn empty_stack_returns_none() {
        let mut stack = UndoStack::default();
        assert!(stack.undo().is_none());
        assert!(stack.redo().is_none());
    }
}
