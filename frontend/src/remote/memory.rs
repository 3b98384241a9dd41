//! In-memory [`RemoteService`] that drives the app state in native tests.
//!
//! Writes notify every open change feed whose scope matches, the same way the
//! hosted service's realtime channel would. Helpers prefixed `external_`
//! simulate another client writing to the shared store, or the service
//! itself dropping a channel or a session.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc::UnboundedSender;
use futures::FutureExt;
use shared::{Board, BoardId, NewBoard, NewTask, TaskChanges, TaskId, TaskRow, TaskStatus, User};
use uuid::Uuid;

use super::{AuthEvent, ChangeEvent, ChangeKind, FeedScope, RemoteFuture, RemoteService, SignUpOutcome};
use crate::error::RemoteError;
use crate::feed::Feed;

#[derive(Clone, Default)]
pub struct MemoryRemote {
    store: Rc<RefCell<Store>>,
}

#[derive(Default)]
struct Store {
    accounts: Vec<Account>,
    session: Option<User>,
    confirm_sign_ups: bool,
    boards: Vec<Board>,
    tasks: Vec<TaskRow>,
    auth_listeners: Vec<(u64, UnboundedSender<AuthEvent>)>,
    channels: Vec<(u64, FeedScope, UnboundedSender<ChangeEvent>)>,
    released: Vec<FeedScope>,
    requests: Vec<String>,
    fail_writes: bool,
    /// The stored refresh token no longer works; the next authorized call fails.
    session_revoked: bool,
    next_handle: u64,
}

struct Account {
    user: User,
    password: String,
}

fn invalid_credentials() -> RemoteError {
    RemoteError::Status {
        status: 400,
        message: "Invalid login credentials".to_string(),
    }
}

fn session_rejected() -> RemoteError {
    RemoteError::Status {
        status: 401,
        message: "Invalid Refresh Token".to_string(),
    }
}

fn write_rejected() -> RemoteError {
    RemoteError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

impl Store {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn broadcast(&mut self, event: AuthEvent) {
        self.auth_listeners
            .retain(|(_, listener)| listener.unbounded_send(event.clone()).is_ok());
    }

    fn notify(&mut self, scope: FeedScope, kind: ChangeKind) {
        let change = ChangeEvent {
            kind,
            table: scope.table().to_string(),
        };
        for (_, channel_scope, sender) in &self.channels {
            if *channel_scope == scope {
                let _ = sender.unbounded_send(change.clone());
            }
        }
    }

    /// Refreshing a revoked session signs the user out everywhere.
    fn authorize(&mut self) -> Result<(), RemoteError> {
        if !self.session_revoked || self.session.is_none() {
            return Ok(());
        }
        self.requests.push("refresh_session".to_string());
        self.session_revoked = false;
        self.session = None;
        self.broadcast(AuthEvent::SignedOut);
        Err(session_rejected())
    }

    fn check_write(&mut self) -> Result<(), RemoteError> {
        self.authorize()?;
        if self.fail_writes {
            Err(write_rejected())
        } else {
            Ok(())
        }
    }

    fn task_mut(&mut self, id: TaskId) -> Option<&mut TaskRow> {
        self.tasks.iter_mut().find(|row| row.id == id)
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account that can sign in with `password`.
    pub fn with_account(self, name: &str, email: &str, password: &str) -> Self {
        self.store.borrow_mut().accounts.push(Account {
            user: User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                avatar: None,
            },
            password: password.to_string(),
        });
        self
    }

    /// Starts with a persisted session for the account registered under `email`.
    pub fn signed_in(self, email: &str) -> Self {
        let user = self.user(email);
        self.store.borrow_mut().session = user;
        self
    }

    /// New accounts must confirm their email before they can sign in.
    pub fn confirming_sign_ups(self) -> Self {
        self.store.borrow_mut().confirm_sign_ups = true;
        self
    }

    pub fn user(&self, email: &str) -> Option<User> {
        self.store
            .borrow()
            .accounts
            .iter()
            .find(|account| account.user.email == email)
            .map(|account| account.user.clone())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.store.borrow_mut().fail_writes = fail;
    }

    pub fn requests(&self) -> Vec<String> {
        self.store.borrow().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.store.borrow_mut().requests.clear();
    }

    pub fn open_channels(&self) -> Vec<FeedScope> {
        self.store.borrow().channels.iter().map(|(_, scope, _)| *scope).collect()
    }

    pub fn released_channels(&self) -> Vec<FeedScope> {
        self.store.borrow().released.clone()
    }

    pub fn auth_listener_count(&self) -> usize {
        self.store.borrow().auth_listeners.len()
    }

    pub fn boards(&self) -> Vec<Board> {
        self.store.borrow().boards.clone()
    }

    pub fn task_rows(&self, board_id: BoardId) -> Vec<TaskRow> {
        self.store
            .borrow()
            .tasks
            .iter()
            .filter(|row| row.board_id == board_id)
            .cloned()
            .collect()
    }

    pub fn external_insert_board(&self, name: &str) -> Board {
        let board = Board {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let mut store = self.store.borrow_mut();
        store.boards.push(board.clone());
        store.notify(FeedScope::Boards, ChangeKind::Insert);
        board
    }

    /// Stores `row` as-is, so tests can plant rows the app must reject.
    pub fn external_insert_row(&self, row: TaskRow) {
        let mut store = self.store.borrow_mut();
        let scope = FeedScope::Tasks(row.board_id);
        store.tasks.push(row);
        store.notify(scope, ChangeKind::Insert);
    }

    pub fn external_set_status(&self, id: TaskId, status: TaskStatus) {
        let mut store = self.store.borrow_mut();
        let Some(row) = store.task_mut(id) else {
            return;
        };
        row.status = status.as_str().to_string();
        let scope = FeedScope::Tasks(row.board_id);
        store.notify(scope, ChangeKind::Update);
    }

    /// The service closing every open channel for `scope`, as a dropped socket would.
    pub fn external_disconnect(&self, scope: FeedScope) {
        self.store
            .borrow_mut()
            .channels
            .retain(|(_, channel_scope, _)| *channel_scope != scope);
    }

    /// The session outlives its refresh token: the next authorized call cannot renew it.
    pub fn revoke_session(&self) {
        self.store.borrow_mut().session_revoked = true;
    }

    /// Another tab signing out of the shared session.
    pub fn external_sign_out(&self) {
        let mut store = self.store.borrow_mut();
        store.session = None;
        store.broadcast(AuthEvent::SignedOut);
    }

    /// Another tab signing in, possibly as a different user.
    pub fn external_sign_in(&self, user: User) {
        let mut store = self.store.borrow_mut();
        store.session = Some(user.clone());
        store.broadcast(AuthEvent::SignedIn(user));
    }

    fn call<T: 'static>(&self, f: impl FnOnce(&mut Store) -> Result<T, RemoteError> + 'static) -> RemoteFuture<T> {
        let store = Rc::clone(&self.store);
        async move { f(&mut store.borrow_mut()) }.boxed_local()
    }
}

impl RemoteService for MemoryRemote {
    fn current_session(&self) -> RemoteFuture<Option<User>> {
        self.call(|store| {
            store.requests.push("current_session".to_string());
            Ok(store.session.clone())
        })
    }

    fn sign_up(&self, email: String, password: String, name: String) -> RemoteFuture<SignUpOutcome> {
        self.call(move |store| {
            store.requests.push(format!("sign_up {}", email));
            if store.accounts.iter().any(|account| account.user.email == email) {
                return Err(RemoteError::Status {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
            let user = User {
                id: Uuid::new_v4(),
                name,
                email,
                avatar: None,
            };
            store.accounts.push(Account {
                user: user.clone(),
                password,
            });
            if store.confirm_sign_ups {
                return Ok(SignUpOutcome::ConfirmationSent);
            }
            store.session = Some(user.clone());
            store.broadcast(AuthEvent::SignedIn(user.clone()));
            Ok(SignUpOutcome::SignedIn(user))
        })
    }

    fn sign_in(&self, email: String, password: String) -> RemoteFuture<User> {
        self.call(move |store| {
            store.requests.push(format!("sign_in {}", email));
            let user = store
                .accounts
                .iter()
                .find(|account| account.user.email == email && account.password == password)
                .map(|account| account.user.clone())
                .ok_or_else(invalid_credentials)?;
            store.session = Some(user.clone());
            store.broadcast(AuthEvent::SignedIn(user.clone()));
            Ok(user)
        })
    }

    fn sign_out(&self) -> RemoteFuture<()> {
        self.call(|store| {
            store.requests.push("sign_out".to_string());
            store.session = None;
            store.broadcast(AuthEvent::SignedOut);
            Ok(())
        })
    }

    fn auth_events(&self) -> Feed<AuthEvent> {
        let mut store = self.store.borrow_mut();
        let handle = store.handle();
        let (sender, feed) = Feed::channel({
            let store = Rc::clone(&self.store);
            move || store.borrow_mut().auth_listeners.retain(|(id, _)| *id != handle)
        });
        store.auth_listeners.push((handle, sender));
        feed
    }

    fn list_boards(&self) -> RemoteFuture<Vec<Board>> {
        self.call(|store| {
            store.requests.push("list_boards".to_string());
            store.authorize()?;
            Ok(store.boards.clone())
        })
    }

    fn insert_board(&self, board: NewBoard) -> RemoteFuture<Board> {
        self.call(move |store| {
            store.requests.push(format!("insert_board {}", board.name));
            store.check_write()?;
            let board = Board {
                id: Uuid::new_v4(),
                name: board.name,
            };
            store.boards.push(board.clone());
            store.notify(FeedScope::Boards, ChangeKind::Insert);
            Ok(board)
        })
    }

    fn list_tasks(&self, board_id: BoardId) -> RemoteFuture<Vec<TaskRow>> {
        self.call(move |store| {
            store.requests.push(format!("list_tasks {}", board_id));
            store.authorize()?;
            Ok(store
                .tasks
                .iter()
                .filter(|row| row.board_id == board_id)
                .cloned()
                .collect())
        })
    }

    fn insert_task(&self, task: NewTask) -> RemoteFuture<()> {
        self.call(move |store| {
            store.requests.push(format!("insert_task {} {}", task.status, task.content));
            store.check_write()?;
            store.tasks.push(TaskRow {
                id: Uuid::new_v4(),
                board_id: task.board_id,
                content: task.content,
                status: task.status.as_str().to_string(),
                description: None,
                priority: Some(task.priority.as_str().to_string()),
                due_date: None,
                assignee: None,
                issue: None,
                created_at: None,
            });
            store.notify(FeedScope::Tasks(task.board_id), ChangeKind::Insert);
            Ok(())
        })
    }

    fn update_task(&self, id: TaskId, changes: TaskChanges) -> RemoteFuture<()> {
        self.call(move |store| {
            store.requests.push(format!("update_task {}", id));
            store.check_write()?;
            let Some(row) = store.task_mut(id) else {
                return Ok(());
            };
            row.content = changes.content;
            row.description = changes.description;
            row.status = changes.status.as_str().to_string();
            row.priority = Some(changes.priority.as_str().to_string());
            row.issue = changes.issue;
            row.due_date = changes.due_date.map(|date| date.format("%Y-%m-%d").to_string());
            row.assignee = changes.assignee;
            let scope = FeedScope::Tasks(row.board_id);
            store.notify(scope, ChangeKind::Update);
            Ok(())
        })
    }

    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RemoteFuture<()> {
        self.call(move |store| {
            store.requests.push(format!("update_task_status {} {}", id, status));
            store.check_write()?;
            let Some(row) = store.task_mut(id) else {
                return Ok(());
            };
            row.status = status.as_str().to_string();
            let scope = FeedScope::Tasks(row.board_id);
            store.notify(scope, ChangeKind::Update);
            Ok(())
        })
    }

    fn delete_task(&self, id: TaskId) -> RemoteFuture<()> {
        self.call(move |store| {
            store.requests.push(format!("delete_task {}", id));
            store.check_write()?;
            let Some(index) = store.tasks.iter().position(|row| row.id == id) else {
                return Ok(());
            };
            let row = store.tasks.remove(index);
            store.notify(FeedScope::Tasks(row.board_id), ChangeKind::Delete);
            Ok(())
        })
    }

    fn subscribe(&self, scope: FeedScope) -> Feed<ChangeEvent> {
        let mut store = self.store.borrow_mut();
        let handle = store.handle();
        let (sender, feed) = Feed::channel({
            let store = Rc::clone(&self.store);
            move || {
                let mut store = store.borrow_mut();
                store.channels.retain(|(id, _, _)| *id != handle);
                store.released.push(scope);
            }
        });
        store.channels.push((handle, scope, sender));
        feed
    }
}
