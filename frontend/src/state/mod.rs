//! Application state and its message handling.
//!
//! [`AppState::update`] is the only place state changes. It returns
//! [`Effect`]s instead of running anything itself; the view layer executes
//! them, and [`run`] turns each remote call into the follow-up [`Msg`].

pub mod boards;
pub mod dialog;
pub mod session;
pub mod tasks;

use shared::{Board, BoardId, NewBoard, NewTask, Priority, TaskChanges, TaskId, TaskRow, TaskStatus, User};

use crate::drag::{resolve, DragLocation, DragSource, DropOutcome, DropResult};
use crate::error::RemoteError;
use crate::feed::{Feed, FeedListener};
use crate::remote::{AuthEvent, ChangeEvent, RemoteService, SignUpOutcome};

use self::boards::BoardStore;
use self::dialog::TaskDialog;
use self::session::{AuthForm, Credentials, SessionChange, SessionState};
use self::tasks::TaskStore;

const MISSING_FIELDS: &str = "Please fill in every field.";
const CONFIRM_EMAIL: &str = "Check your email for the confirmation link, then sign in.";

#[derive(Debug, Clone)]
pub enum Msg {
    // Session
    SessionChecked(Result<Option<User>, RemoteError>),
    AuthChanged(Option<AuthEvent>),
    SignOut,
    SignedOut(Result<(), RemoteError>),

    // Auth form
    ToggleAuthMode,
    SetAuthName(String),
    SetAuthEmail(String),
    SetAuthPassword(String),
    SubmitAuth,
    /// A key pressed in the password field.
    AuthKey(String),
    SignedIn(Result<User, RemoteError>),
    SignedUp(Result<SignUpOutcome, RemoteError>),

    // Boards
    BoardsLoaded { generation: u64, result: Result<Vec<Board>, RemoteError> },
    BoardsChanged { generation: u64, event: Option<ChangeEvent> },
    SetBoardName(String),
    CreateBoard,
    BoardCreated(Result<Board, RemoteError>),
    SelectBoard(BoardId),
    BackToBoards,

    // Tasks
    TasksLoaded(BoardId, Result<Vec<TaskRow>, RemoteError>),
    TasksChanged { board_id: BoardId, generation: u64, event: Option<ChangeEvent> },
    OpenDraft(TaskStatus),
    SetDraft(TaskStatus, String),
    CancelDraft(TaskStatus),
    SubmitDraft(TaskStatus),
    /// A key pressed in a column's draft input.
    DraftKey(TaskStatus, String),
    WriteFinished(WriteOp, Result<(), RemoteError>),

    // Drag and drop
    DragStart(DragSource),
    DragOver(TaskStatus),
    /// Dropped on a card slot.
    DropOn(DragLocation),
    /// Dropped on a column's free area, below its cards.
    DropOnColumn(TaskStatus),
    DragEnd,

    // Task dialog
    OpenTask(TaskId),
    CloseDialog,
    SetDialogContent(String),
    SetDialogDescription(String),
    SetDialogIssue(String),
    SetDialogPriority(Priority),
    SetDialogDueDate(String),
    ToggleAssignee,
    SaveDialog,
    DeleteFromDialog,
}

/// The task write a [`Msg::WriteFinished`] reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update(TaskId),
    Move(TaskId),
    Delete(TaskId),
}

impl WriteOp {
    /// Whether local state was changed ahead of the write.
    fn is_optimistic(&self) -> bool {
        !matches!(self, WriteOp::Insert)
    }
}

/// A remote call or feed wait, executed by [`run`].
#[derive(Debug)]
pub enum Command {
    LoadSession,
    ListenAuth(FeedListener<AuthEvent>),
    SignIn { email: String, password: String },
    SignUp { email: String, password: String, name: String },
    SignOut,
    LoadBoards { generation: u64 },
    ListenBoards { generation: u64, listener: FeedListener<ChangeEvent> },
    CreateBoard(NewBoard),
    LoadTasks(BoardId),
    ListenTasks { board_id: BoardId, generation: u64, listener: FeedListener<ChangeEvent> },
    InsertTask(NewTask),
    UpdateTask(TaskId, TaskChanges),
    MoveTask(TaskId, TaskStatus),
    DeleteTask(TaskId),
}

#[derive(Debug)]
pub enum Effect {
    Run(Command),
    /// Blocking message for the user.
    Alert(String),
}

fn run_all(commands: impl IntoIterator<Item = Command>) -> Vec<Effect> {
    commands.into_iter().map(Effect::Run).collect()
}

/// Executes `command` against `remote` and reports the result as a message.
pub async fn run<R: RemoteService>(remote: R, command: Command) -> Msg {
    match command {
        Command::LoadSession => Msg::SessionChecked(remote.current_session().await),
        Command::ListenAuth(listener) => Msg::AuthChanged(listener.next().await),
        Command::SignIn { email, password } => Msg::SignedIn(remote.sign_in(email, password).await),
        Command::SignUp { email, password, name } => Msg::SignedUp(remote.sign_up(email, password, name).await),
        Command::SignOut => Msg::SignedOut(remote.sign_out().await),
        Command::LoadBoards { generation } => Msg::BoardsLoaded {
            generation,
            result: remote.list_boards().await,
        },
        Command::ListenBoards { generation, listener } => Msg::BoardsChanged {
            generation,
            event: listener.next().await,
        },
        Command::CreateBoard(board) => Msg::BoardCreated(remote.insert_board(board).await),
        Command::LoadTasks(board_id) => Msg::TasksLoaded(board_id, remote.list_tasks(board_id).await),
        Command::ListenTasks {
            board_id,
            generation,
            listener,
        } => Msg::TasksChanged {
            board_id,
            generation,
            event: listener.next().await,
        },
        Command::InsertTask(task) => Msg::WriteFinished(WriteOp::Insert, remote.insert_task(task).await),
        Command::UpdateTask(id, changes) => Msg::WriteFinished(WriteOp::Update(id), remote.update_task(id, changes).await),
        Command::MoveTask(id, status) => Msg::WriteFinished(WriteOp::Move(id), remote.update_task_status(id, status).await),
        Command::DeleteTask(id) => Msg::WriteFinished(WriteOp::Delete(id), remote.delete_task(id).await),
    }
}

/// Everything the app knows, owned in one place for the app's lifetime.
pub struct AppState<R: RemoteService> {
    remote: R,
    session: SessionState,
    pub auth_form: AuthForm,
    pub boards: BoardStore,
    pub tasks: TaskStore,
    dialog: Option<TaskDialog>,
    dragging: Option<DragSource>,
    drag_over: Option<TaskStatus>,
    auth_feed: Option<Feed<AuthEvent>>,
}

impl<R: RemoteService> AppState<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            session: SessionState::default(),
            auth_form: AuthForm::default(),
            boards: BoardStore::default(),
            tasks: TaskStore::default(),
            dialog: None,
            dragging: None,
            drag_over: None,
            auth_feed: None,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn dialog(&self) -> Option<&TaskDialog> {
        self.dialog.as_ref()
    }

    pub fn dragging(&self) -> Option<&DragSource> {
        self.dragging.as_ref()
    }

    pub fn drag_over(&self) -> Option<TaskStatus> {
        self.drag_over
    }

    /// Looks up the persisted session and starts listening for session changes.
    pub fn start(&mut self) -> Vec<Effect> {
        let feed = self.remote.auth_events();
        let listener = feed.listener();
        self.auth_feed = Some(feed);
        run_all([Command::LoadSession, Command::ListenAuth(listener)])
    }

    /// Releases every subscription.
    pub fn shutdown(&mut self) {
        self.auth_feed = None;
        self.reset_workspace();
        self.boards.clear();
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::SessionChecked(result) => {
                self.session.finish_check();
                match result {
                    // A missing session must not undo a sign-in that raced the lookup.
                    Ok(Some(user)) => self.apply_user(Some(user)),
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        log::warn!("could not restore session: {}", e);
                        Vec::new()
                    }
                }
            }
            Msg::AuthChanged(event) => {
                let Some(event) = event else {
                    log::debug!("auth feed closed");
                    return Vec::new();
                };
                self.session.finish_check();
                let mut effects = match event {
                    AuthEvent::SignedIn(user) => self.apply_user(Some(user)),
                    AuthEvent::SignedOut => self.apply_user(None),
                };
                if let Some(feed) = &self.auth_feed {
                    effects.push(Effect::Run(Command::ListenAuth(feed.listener())));
                }
                effects
            }
            Msg::SignOut => run_all([Command::SignOut]),
            Msg::SignedOut(result) => {
                if let Err(e) = result {
                    log::warn!("sign out failed remotely: {}", e);
                }
                self.apply_user(None)
            }

            Msg::ToggleAuthMode => {
                self.auth_form.toggle_mode();
                Vec::new()
            }
            Msg::SetAuthName(name) => {
                self.auth_form.name = name;
                Vec::new()
            }
            Msg::SetAuthEmail(email) => {
                self.auth_form.email = email;
                Vec::new()
            }
            Msg::SetAuthPassword(password) => {
                self.auth_form.password = password;
                Vec::new()
            }
            Msg::SubmitAuth => {
                if self.auth_form.submitting {
                    return Vec::new();
                }
                match self.auth_form.submit() {
                    Some(Credentials::SignIn { email, password }) => run_all([Command::SignIn { email, password }]),
                    Some(Credentials::SignUp { email, password, name }) => {
                        run_all([Command::SignUp { email, password, name }])
                    }
                    None => vec![Effect::Alert(MISSING_FIELDS.to_string())],
                }
            }
            Msg::AuthKey(key) => {
                if key == "Enter" {
                    self.update(Msg::SubmitAuth)
                } else {
                    Vec::new()
                }
            }
            Msg::SignedIn(result) => {
                self.auth_form.finish();
                match result {
                    Ok(_) => {
                        self.auth_form.reset();
                        Vec::new()
                    }
                    Err(e) => vec![Effect::Alert(e.user_message())],
                }
            }
            Msg::SignedUp(result) => {
                self.auth_form.finish();
                match result {
                    Ok(SignUpOutcome::ConfirmationSent) => {
                        self.auth_form.toggle_mode();
                        self.auth_form.password.clear();
                        vec![Effect::Alert(CONFIRM_EMAIL.to_string())]
                    }
                    Ok(SignUpOutcome::SignedIn(_)) => {
                        self.auth_form.reset();
                        Vec::new()
                    }
                    Err(e) => vec![Effect::Alert(e.user_message())],
                }
            }

            Msg::BoardsLoaded { generation, result } => {
                if self.session.user().is_some() {
                    self.boards.loaded(generation, result);
                }
                Vec::new()
            }
            Msg::BoardsChanged { generation, event } => run_all(self.boards.on_change(&self.remote, generation, event)),
            Msg::SetBoardName(name) => {
                self.boards.new_name = name;
                Vec::new()
            }
            Msg::CreateBoard => match self.boards.create() {
                Some(board) => run_all([Command::CreateBoard(board)]),
                None => Vec::new(),
            },
            Msg::BoardCreated(result) => {
                if self.session.user().is_none() {
                    return Vec::new();
                }
                match self.boards.created(result) {
                    Some(board_id) => self.open_board(board_id),
                    None => Vec::new(),
                }
            }
            Msg::SelectBoard(board_id) => {
                if self.boards.select(board_id) {
                    self.open_board(board_id)
                } else {
                    Vec::new()
                }
            }
            Msg::BackToBoards => {
                self.boards.leave();
                self.reset_workspace();
                Vec::new()
            }

            Msg::TasksLoaded(board_id, result) => {
                self.tasks.loaded(board_id, result);
                Vec::new()
            }
            Msg::TasksChanged {
                board_id,
                generation,
                event,
            } => run_all(self.tasks.on_change(&self.remote, board_id, generation, event)),
            Msg::OpenDraft(status) => {
                self.tasks.open_draft(status);
                Vec::new()
            }
            Msg::SetDraft(status, content) => {
                self.tasks.edit_draft(status, content);
                Vec::new()
            }
            Msg::CancelDraft(status) => {
                self.tasks.cancel_draft(status);
                Vec::new()
            }
            Msg::SubmitDraft(status) => run_all(self.tasks.submit_draft(status).map(Command::InsertTask)),
            Msg::DraftKey(status, key) => match key.as_str() {
                "Enter" => run_all(self.tasks.submit_draft(status).map(Command::InsertTask)),
                "Escape" => {
                    self.tasks.cancel_draft(status);
                    Vec::new()
                }
                _ => Vec::new(),
            },
            Msg::WriteFinished(op, result) => match result {
                Ok(()) => Vec::new(),
                Err(e) => {
                    log::warn!("task write {:?} failed: {}", op, e);
                    if op.is_optimistic() {
                        run_all(self.tasks.refetch())
                    } else {
                        Vec::new()
                    }
                }
            },

            Msg::DragStart(source) => {
                self.dragging = Some(source);
                Vec::new()
            }
            Msg::DragOver(status) => {
                if self.dragging.is_some() {
                    self.drag_over = Some(status);
                }
                Vec::new()
            }
            Msg::DropOn(destination) => match self.dragging.take() {
                Some(source) => self.finish_drag(source.dropped(Some(destination))),
                None => Vec::new(),
            },
            Msg::DropOnColumn(column) => match self.dragging.take() {
                Some(source) => {
                    let end = source.column_end(column, self.tasks.column(column).count());
                    self.finish_drag(source.dropped(Some(end)))
                }
                None => Vec::new(),
            },
            Msg::DragEnd => match self.dragging.take() {
                Some(source) => self.finish_drag(source.dropped(None)),
                None => {
                    self.drag_over = None;
                    Vec::new()
                }
            },

            Msg::OpenTask(id) => {
                self.dialog = self.tasks.get(id).map(TaskDialog::open);
                Vec::new()
            }
            Msg::CloseDialog => {
                self.dialog = None;
                Vec::new()
            }
            Msg::SetDialogContent(content) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.content = content;
                }
                Vec::new()
            }
            Msg::SetDialogDescription(description) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.description = description;
                }
                Vec::new()
            }
            Msg::SetDialogIssue(issue) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.issue = issue;
                }
                Vec::new()
            }
            Msg::SetDialogPriority(priority) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.priority = priority;
                }
                Vec::new()
            }
            Msg::SetDialogDueDate(input) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.set_due_date(&input);
                }
                Vec::new()
            }
            Msg::ToggleAssignee => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.toggle_assignee(self.session.user());
                }
                Vec::new()
            }
            Msg::SaveDialog => {
                let Some(dialog) = self.dialog.take() else {
                    return Vec::new();
                };
                let Some(current) = self.tasks.get(dialog.task_id()) else {
                    log::debug!("task {} vanished before save", dialog.task_id());
                    return Vec::new();
                };
                let task = dialog.apply_to(current);
                run_all(self.tasks.update(task))
            }
            Msg::DeleteFromDialog => match self.dialog.take() {
                Some(dialog) => run_all(self.tasks.delete(dialog.task_id())),
                None => Vec::new(),
            },
        }
    }

    fn apply_user(&mut self, user: Option<User>) -> Vec<Effect> {
        match self.session.apply(user) {
            SessionChange::SignedIn | SessionChange::SwitchedUser => {
                if let Some(user) = self.session.user() {
                    log::info!("signed in as {}", user.email);
                }
                self.reset_workspace();
                run_all(self.boards.start(&self.remote))
            }
            SessionChange::SignedOut => {
                log::info!("signed out");
                self.reset_workspace();
                self.boards.clear();
                Vec::new()
            }
            SessionChange::ProfileUpdated => {
                log::debug!("profile refreshed");
                Vec::new()
            }
            SessionChange::Unchanged => Vec::new(),
        }
    }

    fn open_board(&mut self, board_id: BoardId) -> Vec<Effect> {
        self.dialog = None;
        self.dragging = None;
        self.drag_over = None;
        run_all(self.tasks.open(&self.remote, board_id))
    }

    /// Closes the board view: task feed, dialog and any drag in progress.
    fn reset_workspace(&mut self) {
        self.tasks.close();
        self.dialog = None;
        self.dragging = None;
        self.drag_over = None;
    }

    fn finish_drag(&mut self, result: DropResult) -> Vec<Effect> {
        self.drag_over = None;
        match resolve(&result) {
            DropOutcome::Cancelled | DropOutcome::Unchanged => Vec::new(),
            DropOutcome::Move { task_id, status } => run_all(self.tasks.move_to(task_id, status)),
        }
    }
}

impl<R: RemoteService> Drop for AppState<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use futures::executor::block_on;
    use futures::future::LocalBoxFuture;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::remote::memory::MemoryRemote;
    use crate::remote::FeedScope;

    const EMAIL: &str = "kim@example.com";
    const PASSWORD: &str = "hunter22";

    /// Runs the app against an in-memory remote: commands execute to completion,
    /// feed waits are parked and polled until nothing more happens.
    struct Harness {
        remote: MemoryRemote,
        app: AppState<MemoryRemote>,
        queue: VecDeque<Effect>,
        parked: Vec<LocalBoxFuture<'static, Msg>>,
        alerts: Vec<String>,
    }

    impl Harness {
        fn start(remote: MemoryRemote) -> Self {
            let mut app = AppState::new(remote.clone());
            let effects = app.start();
            let mut harness = Self {
                remote,
                app,
                queue: effects.into(),
                parked: Vec::new(),
                alerts: Vec::new(),
            };
            harness.settle();
            harness
        }

        fn signed_in() -> Self {
            let remote = MemoryRemote::new()
                .with_account("Kim", EMAIL, PASSWORD)
                .signed_in(EMAIL);
            Self::start(remote)
        }

        /// Applies `msg` without running what it asks for.
        fn dispatch(&mut self, msg: Msg) {
            let effects = self.app.update(msg);
            self.queue.extend(effects);
        }

        fn send(&mut self, msg: Msg) {
            self.dispatch(msg);
            self.settle();
        }

        fn settle(&mut self) {
            loop {
                if let Some(effect) = self.queue.pop_front() {
                    match effect {
                        Effect::Alert(message) => self.alerts.push(message),
                        Effect::Run(command) => {
                            let waits = matches!(
                                command,
                                Command::ListenAuth(_) | Command::ListenBoards { .. } | Command::ListenTasks { .. }
                            );
                            let future = run(self.remote.clone(), command).boxed_local();
                            if waits {
                                self.parked.push(future);
                            } else {
                                let msg = block_on(future);
                                self.dispatch(msg);
                            }
                        }
                    }
                    continue;
                }

                let mut woke = false;
                for mut future in std::mem::take(&mut self.parked) {
                    match (&mut future).now_or_never() {
                        Some(msg) => {
                            woke = true;
                            self.dispatch(msg);
                        }
                        None => self.parked.push(future),
                    }
                }
                if !woke {
                    break;
                }
            }
        }

        fn create_board(&mut self, name: &str) -> BoardId {
            self.send(Msg::SetBoardName(name.to_string()));
            self.send(Msg::CreateBoard);
            self.app.boards.active().unwrap()
        }

        fn add_task(&mut self, status: TaskStatus, content: &str) -> TaskId {
            self.send(Msg::OpenDraft(status));
            self.send(Msg::SetDraft(status, content.to_string()));
            self.send(Msg::SubmitDraft(status));
            self.app
                .tasks
                .tasks()
                .iter()
                .find(|task| task.content == content)
                .map(|task| task.id)
                .unwrap()
        }

        fn drag(&mut self, id: TaskId, from: DragLocation, to: DragLocation) {
            self.dispatch(Msg::DragStart(DragSource { task_id: id, origin: from }));
            self.dispatch(Msg::DragOver(to.column));
            self.dispatch(Msg::DropOn(to));
            self.dispatch(Msg::DragEnd);
        }

        fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
            self.app.tasks.get(id).map(|task| task.status)
        }
    }

    #[test]
    fn restores_the_persisted_session() {
        let harness = Harness::signed_in();

        assert!(!harness.app.session().checking());
        assert_eq!(harness.app.user().map(|user| user.name.as_str()), Some("Kim"));
        assert!(harness.app.boards.is_subscribed());
        assert_eq!(harness.remote.open_channels(), vec![FeedScope::Boards]);
    }

    #[test]
    fn no_session_shows_the_auth_form() {
        let harness = Harness::start(MemoryRemote::new());

        assert!(!harness.app.session().checking());
        assert_eq!(harness.app.user(), None);
        assert!(harness.remote.open_channels().is_empty());
    }

    #[test]
    fn failed_session_lookup_still_finishes_checking() {
        let mut app = AppState::new(MemoryRemote::new());
        let effects = app.update(Msg::SessionChecked(Err(RemoteError::Network("offline".to_string()))));

        assert!(effects.is_empty());
        assert!(!app.session().checking());
        assert_eq!(app.user(), None);
    }

    #[test]
    fn team_board_walkthrough() {
        let mut harness = Harness::signed_in();
        let kim = harness.remote.user(EMAIL).unwrap();

        let board_id = harness.create_board("Sprint 12");
        assert_eq!(harness.app.boards.active_board().map(|b| b.name.as_str()), Some("Sprint 12"));
        assert_eq!(harness.app.boards.boards().len(), 1);
        assert!(harness.app.tasks.tasks().is_empty());
        assert!(harness.app.boards.new_name.is_empty());

        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        let task = harness.app.tasks.get(id).unwrap();
        assert_eq!(task.board_id, board_id);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(harness.app.tasks.draft(TaskStatus::Pending), None);

        harness.drag(
            id,
            DragLocation::new(TaskStatus::Pending, 0),
            DragLocation::new(TaskStatus::InProgress, 0),
        );
        assert_eq!(harness.status_of(id), Some(TaskStatus::InProgress));
        harness.settle();
        assert_eq!(harness.status_of(id), Some(TaskStatus::InProgress));
        assert_eq!(harness.remote.task_rows(board_id)[0].status, "IN_PROGRESS");

        harness.send(Msg::OpenTask(id));
        harness.send(Msg::SetDialogPriority(Priority::High));
        harness.send(Msg::ToggleAssignee);
        harness.send(Msg::SaveDialog);
        assert_eq!(harness.app.dialog(), None);
        let task = harness.app.tasks.get(id).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.assignee.as_ref(), Some(&kim));
        assert_eq!(task.status, TaskStatus::InProgress);

        harness.send(Msg::OpenTask(id));
        harness.dispatch(Msg::DeleteFromDialog);
        assert_eq!(harness.app.tasks.get(id), None);
        harness.settle();
        assert_eq!(harness.app.tasks.get(id), None);
        assert!(harness.remote.task_rows(board_id).is_empty());
    }

    #[test]
    fn dropping_on_the_origin_changes_nothing() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        let before = harness.app.tasks.tasks().to_vec();
        harness.remote.clear_requests();

        let origin = DragLocation::new(TaskStatus::Pending, 0);
        harness.drag(id, origin, origin);
        harness.settle();

        assert_eq!(harness.app.tasks.tasks(), before.as_slice());
        assert!(harness.remote.requests().is_empty());
        assert_eq!(harness.app.dragging(), None);
    }

    #[test]
    fn dropping_the_last_card_below_itself_changes_nothing() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.clear_requests();

        harness.dispatch(Msg::DragStart(DragSource {
            task_id: id,
            origin: DragLocation::new(TaskStatus::Pending, 0),
        }));
        harness.dispatch(Msg::DragOver(TaskStatus::Pending));
        harness.dispatch(Msg::DropOnColumn(TaskStatus::Pending));
        harness.dispatch(Msg::DragEnd);
        harness.settle();

        assert_eq!(harness.status_of(id), Some(TaskStatus::Pending));
        assert!(harness.remote.requests().is_empty());
        assert_eq!(harness.app.drag_over(), None);
    }

    #[test]
    fn dropping_on_another_columns_area_moves_the_card() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.clear_requests();

        harness.dispatch(Msg::DragStart(DragSource {
            task_id: id,
            origin: DragLocation::new(TaskStatus::Pending, 0),
        }));
        harness.dispatch(Msg::DropOnColumn(TaskStatus::Done));
        assert_eq!(harness.status_of(id), Some(TaskStatus::Done));
        harness.settle();

        assert_eq!(harness.status_of(id), Some(TaskStatus::Done));
        assert_eq!(harness.remote.requests()[0], format!("update_task_status {} DONE", id));
    }

    #[test]
    fn cancelled_drags_change_nothing() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.clear_requests();

        harness.send(Msg::DragStart(DragSource {
            task_id: id,
            origin: DragLocation::new(TaskStatus::Pending, 0),
        }));
        harness.send(Msg::DragOver(TaskStatus::Done));
        assert_eq!(harness.app.drag_over(), Some(TaskStatus::Done));
        harness.send(Msg::DragEnd);

        assert_eq!(harness.status_of(id), Some(TaskStatus::Pending));
        assert_eq!(harness.app.drag_over(), None);
        assert!(harness.remote.requests().is_empty());
    }

    #[test]
    fn dragging_a_vanished_task_is_a_no_op() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        harness.remote.clear_requests();

        harness.drag(
            Uuid::new_v4(),
            DragLocation::new(TaskStatus::Pending, 0),
            DragLocation::new(TaskStatus::Done, 0),
        );
        harness.settle();

        assert!(harness.remote.requests().is_empty());
    }

    #[test]
    fn failed_writes_refetch_the_board() {
        let mut harness = Harness::signed_in();
        let board_id = harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.fail_writes(true);
        harness.remote.clear_requests();

        harness.drag(
            id,
            DragLocation::new(TaskStatus::Pending, 0),
            DragLocation::new(TaskStatus::Done, 0),
        );
        assert_eq!(harness.status_of(id), Some(TaskStatus::Done));
        harness.settle();

        assert_eq!(harness.status_of(id), Some(TaskStatus::Pending));
        assert_eq!(
            harness.remote.requests(),
            vec![
                format!("update_task_status {} DONE", id),
                format!("list_tasks {}", board_id),
            ]
        );
    }

    #[test]
    fn failed_inserts_are_only_logged() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        harness.remote.fail_writes(true);
        harness.remote.clear_requests();

        harness.send(Msg::OpenDraft(TaskStatus::Pending));
        harness.send(Msg::SetDraft(TaskStatus::Pending, "Write spec".to_string()));
        harness.send(Msg::SubmitDraft(TaskStatus::Pending));

        assert_eq!(harness.remote.requests(), vec!["insert_task TODO Write spec".to_string()]);
        assert!(harness.app.tasks.tasks().is_empty());
        assert!(harness.alerts.is_empty());
    }

    #[test]
    fn blank_board_names_issue_no_request() {
        let mut harness = Harness::signed_in();
        harness.remote.clear_requests();

        harness.send(Msg::SetBoardName("   ".to_string()));
        harness.send(Msg::CreateBoard);

        assert!(harness.remote.requests().is_empty());
        assert!(harness.app.boards.boards().is_empty());
        assert_eq!(harness.app.boards.active(), None);
    }

    #[test]
    fn logging_out_clears_everything() {
        let mut harness = Harness::signed_in();
        let board_id = harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.send(Msg::OpenTask(id));
        harness.send(Msg::OpenDraft(TaskStatus::Done));

        harness.send(Msg::SignOut);

        assert_eq!(harness.app.user(), None);
        assert!(harness.app.boards.boards().is_empty());
        assert_eq!(harness.app.boards.active(), None);
        assert!(harness.app.tasks.tasks().is_empty());
        assert_eq!(harness.app.tasks.board(), None);
        assert_eq!(harness.app.tasks.draft(TaskStatus::Done), None);
        assert_eq!(harness.app.dialog(), None);
        assert!(harness.remote.open_channels().is_empty());
        let released = harness.remote.released_channels();
        assert!(released.contains(&FeedScope::Boards));
        assert!(released.contains(&FeedScope::Tasks(board_id)));
    }

    #[test]
    fn another_tab_signing_out_clears_the_session() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");

        harness.remote.external_sign_out();
        harness.settle();

        assert_eq!(harness.app.user(), None);
        assert!(harness.app.boards.boards().is_empty());
        assert!(harness.remote.open_channels().is_empty());
    }

    #[test]
    fn dropped_feeds_are_reopened_and_catch_up() {
        let mut harness = Harness::signed_in();
        let board_id = harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.clear_requests();

        harness.remote.external_disconnect(FeedScope::Boards);
        harness.remote.external_disconnect(FeedScope::Tasks(board_id));
        harness.settle();

        assert!(harness.app.boards.is_subscribed());
        assert!(harness.app.tasks.is_subscribed());
        let mut open = harness.remote.open_channels();
        open.sort_by_key(|scope| matches!(scope, FeedScope::Tasks(_)));
        assert_eq!(open, vec![FeedScope::Boards, FeedScope::Tasks(board_id)]);
        let requests = harness.remote.requests();
        assert!(requests.contains(&"list_boards".to_string()));
        assert!(requests.contains(&format!("list_tasks {}", board_id)));

        harness.remote.external_set_status(id, TaskStatus::Done);
        harness.remote.external_insert_board("Retro");
        harness.settle();

        assert_eq!(harness.status_of(id), Some(TaskStatus::Done));
        assert_eq!(harness.app.boards.boards().len(), 2);
    }

    #[test]
    fn an_unrenewable_session_signs_out() {
        let mut harness = Harness::signed_in();
        let board_id = harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.revoke_session();

        harness.drag(
            id,
            DragLocation::new(TaskStatus::Pending, 0),
            DragLocation::new(TaskStatus::Done, 0),
        );
        harness.settle();

        assert_eq!(harness.app.user(), None);
        assert!(harness.app.boards.boards().is_empty());
        assert_eq!(harness.app.tasks.board(), None);
        assert!(harness.remote.open_channels().is_empty());
        assert_eq!(harness.remote.task_rows(board_id)[0].status, "TODO");
        assert!(harness.remote.requests().contains(&"refresh_session".to_string()));
    }

    #[test]
    fn board_lists_from_an_earlier_session_are_ignored() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let ana = User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        };
        harness.remote.external_sign_in(ana);
        harness.settle();
        let current = harness.app.boards.boards().to_vec();

        let stale = Board {
            id: Uuid::new_v4(),
            name: "Kim's private board".to_string(),
        };
        harness.send(Msg::BoardsLoaded {
            generation: 1,
            result: Ok(vec![stale]),
        });

        assert_eq!(harness.app.boards.boards(), current.as_slice());
    }

    #[test]
    fn same_user_sign_in_keeps_subscriptions() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let kim = harness.remote.user(EMAIL).unwrap();

        harness.remote.external_sign_in(User {
            name: "Kim Lee".to_string(),
            ..kim
        });
        harness.settle();

        assert_eq!(harness.app.user().map(|user| user.name.as_str()), Some("Kim Lee"));
        assert!(harness.remote.released_channels().is_empty());
        assert!(harness.app.boards.active().is_some());
    }

    #[test]
    fn switching_users_restarts_the_board_list() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let ana = User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        };

        harness.remote.external_sign_in(ana.clone());
        harness.settle();

        assert_eq!(harness.app.user(), Some(&ana));
        assert_eq!(harness.app.boards.active(), None);
        assert_eq!(harness.app.boards.boards().len(), 1);
        assert_eq!(harness.remote.open_channels(), vec![FeedScope::Boards]);
    }

    #[test]
    fn changes_from_other_clients_are_refetched() {
        let mut harness = Harness::signed_in();
        let board_id = harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");

        harness.remote.external_set_status(id, TaskStatus::Done);
        harness.remote.external_insert_board("Retro");
        harness.settle();

        assert_eq!(harness.status_of(id), Some(TaskStatus::Done));
        assert_eq!(harness.app.boards.boards().len(), 2);
        assert_eq!(harness.app.boards.active(), Some(board_id));
    }

    #[test]
    fn rows_outside_the_enums_are_skipped() {
        let mut harness = Harness::signed_in();
        let board_id = harness.create_board("Sprint 12");

        harness.remote.external_insert_row(TaskRow {
            id: Uuid::new_v4(),
            board_id,
            content: "Legacy".to_string(),
            status: "ARCHIVED".to_string(),
            description: None,
            priority: None,
            due_date: None,
            assignee: None,
            issue: None,
            created_at: None,
        });
        harness.add_task(TaskStatus::Done, "Ship it");

        assert_eq!(harness.app.tasks.tasks().len(), 1);
        assert_eq!(harness.app.tasks.tasks()[0].content, "Ship it");
    }

    #[test]
    fn switching_boards_replaces_the_task_feed() {
        let mut harness = Harness::signed_in();
        let first = harness.create_board("Sprint 12");
        let second = harness.create_board("Sprint 13");

        assert_eq!(harness.app.boards.active(), Some(second));
        assert_eq!(
            harness.remote.open_channels(),
            vec![FeedScope::Boards, FeedScope::Tasks(second)]
        );
        assert_eq!(harness.remote.released_channels(), vec![FeedScope::Tasks(first)]);

        harness.send(Msg::BackToBoards);
        assert_eq!(harness.app.boards.active(), None);
        assert_eq!(harness.remote.open_channels(), vec![FeedScope::Boards]);

        harness.send(Msg::SelectBoard(first));
        assert_eq!(harness.app.tasks.board(), Some(first));
    }

    #[test]
    fn signing_in_through_the_form() {
        let remote = MemoryRemote::new().with_account("Kim", EMAIL, PASSWORD);
        let mut harness = Harness::start(remote);

        harness.send(Msg::SetAuthEmail(EMAIL.to_string()));
        harness.send(Msg::SetAuthPassword("wrong".to_string()));
        harness.send(Msg::SubmitAuth);
        assert_eq!(harness.alerts, vec!["Invalid login credentials".to_string()]);
        assert!(!harness.app.auth_form.submitting);
        assert_eq!(harness.app.user(), None);

        harness.send(Msg::SetAuthPassword(PASSWORD.to_string()));
        harness.send(Msg::AuthKey("Tab".to_string()));
        assert!(!harness.app.auth_form.submitting);
        harness.dispatch(Msg::AuthKey("Enter".to_string()));
        assert!(harness.app.auth_form.submitting);
        harness.settle();

        assert_eq!(harness.app.user().map(|user| user.email.as_str()), Some(EMAIL));
        assert!(harness.app.auth_form.password.is_empty());
        assert!(harness.app.boards.is_subscribed());
    }

    #[test]
    fn incomplete_form_alerts() {
        let mut harness = Harness::start(MemoryRemote::new());
        harness.send(Msg::SubmitAuth);

        assert_eq!(harness.alerts, vec![MISSING_FIELDS.to_string()]);
        assert!(harness.remote.requests().iter().all(|request| request == "current_session"));
    }

    #[test]
    fn sign_up_waiting_for_confirmation() {
        let mut harness = Harness::start(MemoryRemote::new().confirming_sign_ups());

        harness.send(Msg::ToggleAuthMode);
        harness.send(Msg::SetAuthName("Ana".to_string()));
        harness.send(Msg::SetAuthEmail("ana@example.com".to_string()));
        harness.send(Msg::SetAuthPassword(PASSWORD.to_string()));
        harness.send(Msg::SubmitAuth);

        assert_eq!(harness.alerts, vec![CONFIRM_EMAIL.to_string()]);
        assert_eq!(harness.app.user(), None);
        assert_eq!(harness.app.auth_form.mode, session::AuthMode::SignIn);
    }

    #[test]
    fn sign_up_with_instant_session() {
        let mut harness = Harness::start(MemoryRemote::new());

        harness.send(Msg::ToggleAuthMode);
        harness.send(Msg::SetAuthName("Ana".to_string()));
        harness.send(Msg::SetAuthEmail("ana@example.com".to_string()));
        harness.send(Msg::SetAuthPassword(PASSWORD.to_string()));
        harness.send(Msg::SubmitAuth);

        assert!(harness.alerts.is_empty());
        assert_eq!(harness.app.user().map(|user| user.name.as_str()), Some("Ana"));
    }

    #[test]
    fn shutdown_releases_every_subscription() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        assert_eq!(harness.remote.auth_listener_count(), 1);

        harness.app.shutdown();

        assert_eq!(harness.remote.auth_listener_count(), 0);
        assert!(harness.remote.open_channels().is_empty());
    }

    #[test]
    fn draft_keys_submit_and_cancel() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");

        harness.send(Msg::OpenDraft(TaskStatus::Done));
        harness.send(Msg::SetDraft(TaskStatus::Done, "Ship it".to_string()));
        harness.send(Msg::DraftKey(TaskStatus::Done, "a".to_string()));
        assert_eq!(harness.app.tasks.draft(TaskStatus::Done), Some("Ship it"));
        harness.send(Msg::DraftKey(TaskStatus::Done, "Enter".to_string()));
        assert_eq!(harness.app.tasks.draft(TaskStatus::Done), None);
        assert_eq!(harness.app.tasks.column(TaskStatus::Done).count(), 1);

        harness.send(Msg::OpenDraft(TaskStatus::Pending));
        harness.send(Msg::DraftKey(TaskStatus::Pending, "Escape".to_string()));
        assert_eq!(harness.app.tasks.draft(TaskStatus::Pending), None);
    }

    #[test]
    fn dialog_cancel_leaves_the_task() {
        let mut harness = Harness::signed_in();
        harness.create_board("Sprint 12");
        let id = harness.add_task(TaskStatus::Pending, "Write spec");
        harness.remote.clear_requests();

        harness.send(Msg::OpenTask(id));
        harness.send(Msg::SetDialogContent("Rewrite spec".to_string()));
        harness.send(Msg::CloseDialog);

        assert_eq!(harness.app.tasks.get(id).map(|task| task.content.as_str()), Some("Write spec"));
        assert!(harness.remote.requests().is_empty());
    }
}
