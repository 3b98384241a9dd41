//! The boundary to the hosted data service.
//!
//! [`RemoteService`] lists every call the app makes. [`SupabaseClient`] is the
//! browser implementation; tests drive the app with an in-memory one.

pub mod auth;
pub mod http;
pub mod query;
pub mod realtime;
mod supabase;

#[cfg(test)]
pub mod memory;

use futures::future::LocalBoxFuture;
use shared::{Board, BoardId, NewBoard, NewTask, TaskChanges, TaskId, TaskRow, TaskStatus, User};

use crate::error::RemoteError;
use crate::feed::Feed;

pub use supabase::SupabaseClient;

pub type RemoteFuture<T> = LocalBoxFuture<'static, Result<T, RemoteError>>;

/// What a change-feed subscription watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedScope {
    Boards,
    Tasks(BoardId),
}

impl FeedScope {
    pub fn table(&self) -> &'static str {
        match self {
            FeedScope::Boards => "boards",
            FeedScope::Tasks(_) => "tasks",
        }
    }

    /// Row filter in the service's `column=eq.value` syntax.
    pub fn filter(&self) -> Option<String> {
        match self {
            FeedScope::Boards => None,
            FeedScope::Tasks(board_id) => Some(format!("board_id=eq.{}", board_id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account exists but must be confirmed by email first.
    ConfirmationSent,
    SignedIn(User),
}

pub trait RemoteService: Clone + 'static {
    /// The persisted session's user, refreshing an expired token when possible.
    fn current_session(&self) -> RemoteFuture<Option<User>>;
    fn sign_up(&self, email: String, password: String, name: String) -> RemoteFuture<SignUpOutcome>;
    fn sign_in(&self, email: String, password: String) -> RemoteFuture<User>;
    /// Always forgets the local session, even when the remote call fails.
    fn sign_out(&self) -> RemoteFuture<()>;
    fn auth_events(&self) -> Feed<AuthEvent>;

    /// All boards, oldest first.
    fn list_boards(&self) -> RemoteFuture<Vec<Board>>;
    fn insert_board(&self, board: NewBoard) -> RemoteFuture<Board>;
    /// Rows of one board, oldest first.
    fn list_tasks(&self, board_id: BoardId) -> RemoteFuture<Vec<TaskRow>>;
    fn insert_task(&self, task: NewTask) -> RemoteFuture<()>;
    fn update_task(&self, id: TaskId, changes: TaskChanges) -> RemoteFuture<()>;
    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RemoteFuture<()>;
    fn delete_task(&self, id: TaskId) -> RemoteFuture<()>;

    fn subscribe(&self, scope: FeedScope) -> Feed<ChangeEvent>;
}
