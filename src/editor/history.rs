use crate::operation::OperationOptions;

/// One undoable edit of a single operation
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Identifier of the edited operation
    pub operation: String,
    /// Options the operation had before the edit
    pub options: OperationOptions,
    /// Whether the operation existed before the edit; undo removes it otherwise
    pub existed_before: bool,
}

/// Linear undo stack. There is no redo: undoing discards the step.
///
/// A step groups every entry recorded by one control session so a single undo reverts
/// them together.
#[derive(Debug, Clone, Default)]
pub struct History {
    steps: Vec<Vec<HistoryEntry>>,
}

impl History {
    /// Creates a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.push_step(vec![entry]);
    }

    /// Records `entries` as one undo step; an empty step is ignored
    pub fn push_step(&mut self, entries: Vec<HistoryEntry>) {
        if entries.is_empty() {
            return;
        }
        for entry in &entries {
            log::debug!(
                "history: recorded edit of `{}` (existed before: {})",
                entry.operation,
                entry.existed_before
            );
        }
        self.steps.push(entries);
    }

    pub fn pop(&mut self) -> Option<Vec<HistoryEntry>> {
        self.steps.pop()
    }

    /// Returns true if there are steps that can be undone
    pub fn can_undo(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Number of undo steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Vec<HistoryEntry>] {
        &self.steps
    }

    /// Clear the history
    pub fn clear(&mut self) {
        self.steps.clear();
    }
}
