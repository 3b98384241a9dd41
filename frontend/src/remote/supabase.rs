use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use shared::{Board, BoardId, NewBoard, NewTask, StatusChange, TaskChanges, TaskId, TaskRow, TaskStatus, User};
use url::Url;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::StorageEvent;

use super::auth::{
    self, check_token, now_secs, PasswordGrant, RefreshGrant, Session, SignUpData, SignUpRequest, SignUpResponse,
    TokenCheck, TokenResponse, SESSION_STORAGE_KEY,
};
use super::http::{self, HttpRequest};
use super::query::Query;
use super::{realtime, AuthEvent, ChangeEvent, FeedScope, RemoteFuture, RemoteService, SignUpOutcome};
use crate::config::Config;
use crate::error::RemoteError;
use crate::feed::Feed;

/// Browser client for a Supabase-compatible project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Rc<Inner>,
}

type PendingRefresh = Shared<LocalBoxFuture<'static, Result<Session, RemoteError>>>;

struct Inner {
    config: Config,
    session: RefCell<Option<Session>>,
    /// In-flight token refresh, awaited by every call that finds the token expired.
    refreshing: RefCell<Option<PendingRefresh>>,
    auth_listeners: RefCell<Vec<UnboundedSender<AuthEvent>>>,
    /// Consecutive realtime connects per scope that never got a join reply.
    reconnects: RefCell<HashMap<FeedScope, u32>>,
}

impl SupabaseClient {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                session: RefCell::new(None),
                refreshing: RefCell::new(None),
                auth_listeners: RefCell::new(Vec::new()),
                reconnects: RefCell::new(HashMap::new()),
            }),
        }
    }

    fn config(&self) -> &Config {
        &self.inner.config
    }

    /// A current access token, refreshed first when it has expired, or the
    /// anon key when signed out.
    async fn bearer(&self) -> Result<String, RemoteError> {
        let check = check_token(self.inner.session.borrow().as_ref(), now_secs());
        match check {
            TokenCheck::Anonymous => Ok(self.config().anon_key().to_string()),
            TokenCheck::Valid(token) => Ok(token),
            TokenCheck::Refresh(refresh_token) => Ok(self.refresh(refresh_token).await?.access_token),
        }
    }

    /// Renews the session. Concurrent callers share one grant request. A refresh
    /// token the service rejects ends the session for every listener.
    async fn refresh(&self, refresh_token: String) -> Result<Session, RemoteError> {
        let pending = self.inner.refreshing.borrow().clone();
        let pending = match pending {
            Some(pending) => pending,
            None => {
                let client = self.clone();
                let pending = async move {
                    log::debug!("access token expired, refreshing");
                    let grant = RefreshGrant {
                        refresh_token: &refresh_token,
                    };
                    let result = client.grant("refresh_token", &grant).await;
                    client.inner.refreshing.borrow_mut().take();
                    match &result {
                        Ok(session) => client.set_session(Some(session.clone())),
                        Err(e) if e.is_rejection() => {
                            log::warn!("session could not be renewed, signing out: {}", e);
                            client.set_session(None);
                            client.broadcast(AuthEvent::SignedOut);
                        }
                        Err(e) => log::warn!("session refresh failed: {}", e),
                    }
                    result
                }
                .boxed_local()
                .shared();
                *self.inner.refreshing.borrow_mut() = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    async fn authorized(&self, request: HttpRequest) -> Result<HttpRequest, RemoteError> {
        let bearer = self.bearer().await?;
        Ok(request
            .header("apikey", self.config().anon_key())
            .header("Authorization", format!("Bearer {}", bearer)))
    }

    fn token_url(&self, grant_type: &str) -> Url {
        let mut url = self.config().auth_url("token");
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        url
    }

    fn set_session(&self, session: Option<Session>) {
        let persisted = match &session {
            Some(session) => auth::store_session(session),
            None => auth::clear_session(),
        };
        if let Err(e) = persisted {
            log::warn!("session not persisted: {}", e);
        }
        *self.inner.session.borrow_mut() = session;
    }

    fn broadcast(&self, event: AuthEvent) {
        self.inner
            .auth_listeners
            .borrow_mut()
            .retain(|listener| listener.unbounded_send(event.clone()).is_ok());
    }

    async fn grant<T: serde::Serialize>(&self, grant_type: &str, body: &T) -> Result<Session, RemoteError> {
        let request = HttpRequest::post(self.token_url(grant_type).as_str())
            .header("apikey", self.config().anon_key())
            .json(body)?;
        let response: TokenResponse = serde_json::from_str(&http::send(request).await?)?;
        Ok(response.into_session(now_secs()))
    }

    async fn write<T: serde::Serialize>(&self, request: HttpRequest, body: &T) -> Result<(), RemoteError> {
        http::send(self.authorized(request).await?.json(body)?).await.map(|_| ())
    }
}

impl RemoteService for SupabaseClient {
    fn current_session(&self) -> RemoteFuture<Option<User>> {
        let client = self.clone();
        async move {
            let Some(stored) = auth::load_session() else {
                return Ok(None);
            };
            *client.inner.session.borrow_mut() = Some(stored);

            // Renews an expired token; a rejected one is cleared from storage too.
            if let Err(e) = client.bearer().await {
                client.inner.session.borrow_mut().take();
                return Err(e);
            }
            let user = client.inner.session.borrow().as_ref().map(|session| session.user.to_user());
            Ok(user)
        }
        .boxed_local()
    }

    fn sign_up(&self, email: String, password: String, name: String) -> RemoteFuture<SignUpOutcome> {
        let client = self.clone();
        async move {
            let body = SignUpRequest {
                email: &email,
                password: &password,
                data: SignUpData { name: &name },
            };
            let request = HttpRequest::post(client.config().auth_url("signup").as_str())
                .header("apikey", client.config().anon_key())
                .json(&body)?;

            match serde_json::from_str(&http::send(request).await?)? {
                SignUpResponse::Session(tokens) => {
                    let session = tokens.into_session(now_secs());
                    let user = session.user.to_user();
                    client.set_session(Some(session));
                    client.broadcast(AuthEvent::SignedIn(user.clone()));
                    Ok(SignUpOutcome::SignedIn(user))
                }
                SignUpResponse::User(_) => Ok(SignUpOutcome::ConfirmationSent),
            }
        }
        .boxed_local()
    }

    fn sign_in(&self, email: String, password: String) -> RemoteFuture<User> {
        let client = self.clone();
        async move {
            let grant = PasswordGrant {
                email: &email,
                password: &password,
            };
            let session = client.grant("password", &grant).await?;
            let user = session.user.to_user();
            log::info!("signed in as {}", user.email);
            client.set_session(Some(session));
            client.broadcast(AuthEvent::SignedIn(user.clone()));
            Ok(user)
        }
        .boxed_local()
    }

    fn sign_out(&self) -> RemoteFuture<()> {
        let client = self.clone();
        async move {
            let signed_in = client.inner.session.borrow().is_some();
            if signed_in {
                let logout = HttpRequest::post(client.config().auth_url("logout").as_str());
                let sent = match client.authorized(logout).await {
                    Ok(request) => http::send(request).await.map(|_| ()),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    log::warn!("remote logout failed, clearing local session anyway: {}", e);
                }
            }
            client.set_session(None);
            client.broadcast(AuthEvent::SignedOut);
            Ok(())
        }
        .boxed_local()
    }

    fn auth_events(&self) -> Feed<AuthEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.inner.auth_listeners.borrow_mut().push(sender.clone());

        // Other tabs signing in or out rewrite the persisted session.
        let on_storage = {
            let inner = Rc::clone(&self.inner);
            let sender = sender.clone();
            Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
                if event.key().as_deref() != Some(SESSION_STORAGE_KEY) {
                    return;
                }
                let session = event.new_value().as_deref().and_then(auth::parse_stored);
                let notification = match &session {
                    Some(session) => AuthEvent::SignedIn(session.user.to_user()),
                    None => AuthEvent::SignedOut,
                };
                *inner.session.borrow_mut() = session;
                let _ = sender.unbounded_send(notification);
            })
        };
        let window = web_sys::window();
        if let Some(window) = &window {
            if let Err(e) = window.add_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref()) {
                log::warn!("cannot watch session storage: {:?}", e);
            }
        }

        let inner = Rc::clone(&self.inner);
        Feed::new(receiver, move || {
            if let Some(window) = window {
                let _ = window.remove_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref());
            }
            inner
                .auth_listeners
                .borrow_mut()
                .retain(|listener| !listener.same_receiver(&sender));
            sender.close_channel();
        })
    }

    fn list_boards(&self) -> RemoteFuture<Vec<Board>> {
        let client = self.clone();
        async move {
            let url = Query::table("boards").select("*").order_asc("created_at").url(client.config());
            let body = http::send(client.authorized(HttpRequest::get(url.as_str())).await?).await?;
            Ok(serde_json::from_str(&body)?)
        }
        .boxed_local()
    }

    fn insert_board(&self, board: NewBoard) -> RemoteFuture<Board> {
        let client = self.clone();
        async move {
            let request = client
                .authorized(HttpRequest::post(client.config().rest_url("boards").as_str()))
                .await?
                .header("Prefer", "return=representation")
                .json(&[board])?;
            let inserted: Vec<Board> = serde_json::from_str(&http::send(request).await?)?;
            inserted
                .into_iter()
                .next()
                .ok_or_else(|| RemoteError::Decode("insert returned no board".to_string()))
        }
        .boxed_local()
    }

    fn list_tasks(&self, board_id: BoardId) -> RemoteFuture<Vec<TaskRow>> {
        let client = self.clone();
        async move {
            let url = Query::table("tasks")
                .select("*")
                .eq("board_id", board_id)
                .order_asc("created_at")
                .url(client.config());
            let body = http::send(client.authorized(HttpRequest::get(url.as_str())).await?).await?;
            Ok(serde_json::from_str(&body)?)
        }
        .boxed_local()
    }

    fn insert_task(&self, task: NewTask) -> RemoteFuture<()> {
        let client = self.clone();
        async move {
            let request = HttpRequest::post(client.config().rest_url("tasks").as_str());
            client.write(request, &[task]).await
        }
        .boxed_local()
    }

    fn update_task(&self, id: TaskId, changes: TaskChanges) -> RemoteFuture<()> {
        let client = self.clone();
        async move {
            let url = Query::table("tasks").eq("id", id).url(client.config());
            client.write(HttpRequest::patch(url.as_str()), &changes).await
        }
        .boxed_local()
    }

    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RemoteFuture<()> {
        let client = self.clone();
        async move {
            let url = Query::table("tasks").eq("id", id).url(client.config());
            client.write(HttpRequest::patch(url.as_str()), &StatusChange { status }).await
        }
        .boxed_local()
    }

    fn delete_task(&self, id: TaskId) -> RemoteFuture<()> {
        let client = self.clone();
        async move {
            let url = Query::table("tasks").eq("id", id).url(client.config());
            http::send(client.authorized(HttpRequest::delete(url.as_str())).await?)
                .await
                .map(|_| ())
        }
        .boxed_local()
    }

    fn subscribe(&self, scope: FeedScope) -> Feed<ChangeEvent> {
        let attempt = {
            let mut reconnects = self.inner.reconnects.borrow_mut();
            let attempts = reconnects.entry(scope).or_insert(0);
            *attempts += 1;
            *attempts - 1
        };

        let client = self.clone();
        let access_token = async move {
            client.bearer().await.unwrap_or_else(|e| {
                log::warn!("joining realtime without a session token: {}", e);
                client.config().anon_key().to_string()
            })
        }
        .boxed_local();

        let inner = Rc::downgrade(&self.inner);
        let on_joined = move || {
            if let Some(inner) = inner.upgrade() {
                inner.reconnects.borrow_mut().remove(&scope);
            }
        };

        realtime::subscribe(
            self.config().realtime_url(),
            scope,
            realtime::Connect {
                access_token,
                delay_ms: realtime::reconnect_delay_ms(attempt),
                on_joined: Box::new(on_joined),
            },
        )
    }
}
