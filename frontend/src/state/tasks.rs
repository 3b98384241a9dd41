use std::collections::BTreeMap;

use shared::{map_rows, BoardId, NewTask, Task, TaskChanges, TaskId, TaskRow, TaskStatus};

use super::Command;
use crate::error::RemoteError;
use crate::feed::Feed;
use crate::remote::{ChangeEvent, FeedScope, RemoteService};

/// Tasks of the active board, mutated optimistically ahead of the remote write.
#[derive(Debug, Default)]
pub struct TaskStore {
    board: Option<BoardId>,
    tasks: Vec<Task>,
    loading: bool,
    feed: Option<Feed<ChangeEvent>>,
    generation: u64,
    /// Open inline "add card" inputs, keyed by column.
    drafts: BTreeMap<TaskStatus, String>,
}

impl TaskStore {
    pub fn board(&self) -> Option<BoardId> {
        self.board
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn column(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |task| task.status == status)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn is_subscribed(&self) -> bool {
        self.feed.is_some()
    }

    /// Switches to `board_id`: the previous feed is released before the new one opens.
    pub fn open<R: RemoteService>(&mut self, remote: &R, board_id: BoardId) -> Vec<Command> {
        self.close();
        self.board = Some(board_id);
        self.subscribe(remote, board_id)
    }

    /// Opens a fresh feed for the active board and refetches its tasks.
    fn subscribe<R: RemoteService>(&mut self, remote: &R, board_id: BoardId) -> Vec<Command> {
        self.feed = None;
        self.generation += 1;
        let feed = remote.subscribe(FeedScope::Tasks(board_id));
        let listener = feed.listener();
        self.feed = Some(feed);

        let mut commands = self.refetch();
        commands.push(Command::ListenTasks {
            board_id,
            generation: self.generation,
            listener,
        });
        commands
    }

    pub fn close(&mut self) {
        self.feed = None;
        self.board = None;
        self.tasks.clear();
        self.loading = false;
        self.drafts.clear();
    }

    /// Fetch of the active board's tasks, if there is one.
    pub fn refetch(&mut self) -> Vec<Command> {
        match self.board {
            Some(board_id) => {
                self.loading = true;
                vec![Command::LoadTasks(board_id)]
            }
            None => Vec::new(),
        }
    }

    pub fn loaded(&mut self, board_id: BoardId, result: Result<Vec<TaskRow>, RemoteError>) {
        if self.board != Some(board_id) {
            log::debug!("discarding tasks of inactive board {}", board_id);
            return;
        }
        self.loading = false;
        match result {
            Ok(rows) => self.tasks = map_rows(rows),
            Err(e) => log::warn!("failed to fetch tasks of board {}: {}", board_id, e),
        }
    }

    /// Reacts to a task-feed notification. `None` means the source closed the
    /// feed, which is reopened while the board is still active.
    pub fn on_change<R: RemoteService>(
        &mut self,
        remote: &R,
        board_id: BoardId,
        generation: u64,
        event: Option<ChangeEvent>,
    ) -> Vec<Command> {
        if self.board != Some(board_id) || generation != self.generation {
            return Vec::new();
        }
        let Some(listener) = self.feed.as_ref().map(Feed::listener) else {
            return Vec::new();
        };
        match event {
            Some(event) => {
                log::debug!("tasks of {} changed ({:?}), refetching", board_id, event.kind);
                let mut commands = self.refetch();
                commands.push(Command::ListenTasks {
                    board_id,
                    generation,
                    listener,
                });
                commands
            }
            None => {
                log::info!("task feed of {} dropped, resubscribing", board_id);
                self.subscribe(remote, board_id)
            }
        }
    }

    /// Insert for a new card. Nothing is added locally; the row arrives with the refetch.
    pub fn add(&self, content: &str, status: TaskStatus) -> Option<NewTask> {
        let board_id = self.board?;
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(NewTask::new(board_id, content.to_string(), status))
    }

    pub fn update(&mut self, task: Task) -> Option<Command> {
        let slot = self.tasks.iter_mut().find(|current| current.id == task.id)?;
        let changes = TaskChanges::from(&task);
        *slot = task;
        Some(Command::UpdateTask(slot.id, changes))
    }

    pub fn delete(&mut self, id: TaskId) -> Option<Command> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        self.tasks.remove(index);
        Some(Command::DeleteTask(id))
    }

    pub fn move_to(&mut self, id: TaskId, status: TaskStatus) -> Option<Command> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.status = status;
        Some(Command::MoveTask(id, status))
    }

    pub fn draft(&self, status: TaskStatus) -> Option<&str> {
        self.drafts.get(&status).map(String::as_str)
    }

    pub fn open_draft(&mut self, status: TaskStatus) {
        self.drafts.entry(status).or_default();
    }

    pub fn edit_draft(&mut self, status: TaskStatus, content: String) {
        if let Some(draft) = self.drafts.get_mut(&status) {
            *draft = content;
        }
    }

    pub fn cancel_draft(&mut self, status: TaskStatus) {
        self.drafts.remove(&status);
    }

    /// Closes a non-blank draft and returns the insert for it.
    pub fn submit_draft(&mut self, status: TaskStatus) -> Option<NewTask> {
        let task = self.add(self.draft(status)?, status)?;
        self.drafts.remove(&status);
        Some(task)
    }
}
