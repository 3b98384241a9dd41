//! Completion handling for card drags between columns.

use shared::{TaskId, TaskStatus};

/// A card slot: the column and the card's index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub column: TaskStatus,
    pub index: usize,
}

impl DragLocation {
    pub fn new(column: TaskStatus, index: usize) -> Self {
        Self { column, index }
    }
}

/// Recorded when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSource {
    pub task_id: TaskId,
    pub origin: DragLocation,
}

impl DragSource {
    pub fn dropped(self, destination: Option<DragLocation>) -> DropResult {
        DropResult {
            task_id: self.task_id,
            source: self.origin,
            destination,
        }
    }

    /// Slot at the end of `column`, which currently shows `len` cards. The
    /// dragged card still counts in its own column, so it lands on its last slot there.
    pub fn column_end(&self, column: TaskStatus, len: usize) -> DragLocation {
        let index = if column == self.origin.column {
            len.saturating_sub(1)
        } else {
            len
        };
        DragLocation::new(column, index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropResult {
    pub task_id: TaskId,
    pub source: DragLocation,
    /// `None` when the card was released outside every column.
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Cancelled,
    Unchanged,
    Move { task_id: TaskId, status: TaskStatus },
}

pub fn resolve(result: &DropResult) -> DropOutcome {
    match result.destination {
        None => DropOutcome::Cancelled,
        Some(destination) if destination == result.source => DropOutcome::Unchanged,
        Some(destination) => DropOutcome::Move {
            task_id: result.task_id,
            status: destination.column,
        },
    }
}
