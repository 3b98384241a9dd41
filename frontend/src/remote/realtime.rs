//! Change-feed channels over the realtime websocket.
//!
//! Each subscription opens its own socket, joins one topic with a
//! `postgres_changes` filter, and keeps the connection alive with heartbeats
//! until the owning [`Feed`] is dropped. When the socket or the channel
//! closes from the service side the feed ends, and its owner subscribes again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::LocalBoxFuture;
use js_sys::{Function, Promise};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, MessageEvent, WebSocket};

use super::{ChangeEvent, ChangeKind, FeedScope};
use crate::error::RemoteError;
use crate::feed::Feed;
use crate::remote::http::network_error;

pub const HEARTBEAT_INTERVAL_MS: i32 = 25_000;

const RECONNECT_BASE_MS: i32 = 1_000;
const RECONNECT_MAX_MS: i32 = 30_000;

const PHOENIX_TOPIC: &str = "phoenix";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Change(ChangeEvent),
    Joined,
    JoinRejected(String),
    Closed,
    Ignored,
}

pub fn topic(scope: &FeedScope) -> String {
    match scope {
        FeedScope::Boards => "realtime:public:boards".to_string(),
        FeedScope::Tasks(board_id) => format!("realtime:public:tasks:{}", board_id),
    }
}

fn change_filter(scope: &FeedScope) -> Value {
    let mut filter = json!({
        "event": "*",
        "schema": "public",
        "table": scope.table(),
    });
    if let Some(rows) = scope.filter() {
        filter["filter"] = Value::String(rows);
    }
    filter
}

pub fn join_message(scope: &FeedScope, access_token: &str, reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic(scope),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": {"self": false},
                "presence": {"key": ""},
                "postgres_changes": [change_filter(scope)],
            },
            "access_token": access_token,
        }),
        reference: Some(reference.to_string()),
        join_ref: Some(reference.to_string()),
    }
}

pub fn heartbeat_message(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: PHOENIX_TOPIC.to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

pub fn leave_message(scope: &FeedScope, reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic(scope),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

pub fn decode(text: &str) -> Result<Inbound, RemoteError> {
    let message: PhoenixMessage = serde_json::from_str(text)?;

    let inbound = match message.event.as_str() {
        "postgres_changes" => {
            let data = &message.payload["data"];
            let kind = match data["type"].as_str() {
                Some("INSERT") => ChangeKind::Insert,
                Some("UPDATE") => ChangeKind::Update,
                Some("DELETE") => ChangeKind::Delete,
                other => {
                    return Err(RemoteError::Decode(format!("unknown change type {:?}", other)));
                }
            };
            Inbound::Change(ChangeEvent {
                kind,
                table: data["table"].as_str().unwrap_or_default().to_string(),
            })
        }
        // Heartbeat acknowledgements arrive on the phoenix topic.
        "phx_reply" if message.topic == PHOENIX_TOPIC => Inbound::Ignored,
        "phx_reply" => match message.payload["status"].as_str() {
            Some("ok") => Inbound::Joined,
            _ => Inbound::JoinRejected(rejection_reason(&message.payload)),
        },
        "phx_error" | "phx_close" => Inbound::Closed,
        _ => Inbound::Ignored,
    };

    Ok(inbound)
}

fn rejection_reason(payload: &Value) -> String {
    let response = &payload["response"];
    response["reason"]
        .as_str()
        .or_else(|| response["message"].as_str())
        .unwrap_or("join rejected")
        .to_string()
}

/// Wait before connecting, given how many connects in a row never got joined.
pub fn reconnect_delay_ms(attempt: u32) -> i32 {
    match attempt {
        0 => 0,
        n => RECONNECT_BASE_MS
            .saturating_mul(1 << (n - 1).min(5))
            .min(RECONNECT_MAX_MS),
    }
}

/// How a channel connects: after `delay_ms`, with the token `access_token`
/// resolves to. `on_joined` runs when the service accepts the join.
pub struct Connect {
    pub access_token: LocalBoxFuture<'static, String>,
    pub delay_ms: i32,
    pub on_joined: Box<dyn Fn()>,
}

enum Slot {
    Connecting,
    Open(Channel),
    Released,
}

/// Opens a channel for `scope` in the background. A socket that cannot be
/// created, or that closes later, ends the feed.
pub fn subscribe(url: Url, scope: FeedScope, connect: Connect) -> Feed<ChangeEvent> {
    let (sender, receiver) = mpsc::unbounded();
    let slot = Rc::new(RefCell::new(Slot::Connecting));

    wasm_bindgen_futures::spawn_local({
        let slot = Rc::clone(&slot);
        async move {
            sleep(connect.delay_ms).await;
            let access_token = connect.access_token.await;
            if matches!(*slot.borrow(), Slot::Released) {
                return;
            }
            match Channel::connect(&url, scope, access_token, sender, connect.on_joined) {
                Ok(channel) => {
                    log::debug!("opened realtime channel {}", topic(&scope));
                    *slot.borrow_mut() = Slot::Open(channel);
                }
                Err(e) => log::warn!("realtime channel {} failed to open: {}", topic(&scope), e),
            }
        }
    });

    Feed::new(receiver, move || {
        if let Slot::Open(channel) = slot.replace(Slot::Released) {
            channel.close();
        }
    })
}

async fn sleep(ms: i32) {
    if ms <= 0 {
        return;
    }
    let timer = Promise::new(&mut |resolve: Function, _reject: Function| {
        let scheduled = web_sys::window()
            .map(|window| window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms));
        if !matches!(scheduled, Some(Ok(_))) {
            let _ = resolve.call0(&JsValue::UNDEFINED);
        }
    });
    let _ = JsFuture::from(timer).await;
}

struct Channel {
    socket: WebSocket,
    scope: FeedScope,
    refs: Rc<Cell<u64>>,
    interval: i32,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(Event)>,
    _heartbeat: Closure<dyn FnMut()>,
}

impl Channel {
    fn connect(
        url: &Url,
        scope: FeedScope,
        access_token: String,
        sender: UnboundedSender<ChangeEvent>,
        on_joined: Box<dyn Fn()>,
    ) -> Result<Self, RemoteError> {
        let socket = WebSocket::new(url.as_str()).map_err(network_error)?;
        let refs = Rc::new(Cell::new(0));

        let on_open = {
            let socket = socket.clone();
            let refs = Rc::clone(&refs);
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                send(&socket, &join_message(&scope, &access_token, next_ref(&refs)));
            })
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = {
            let sender = sender.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let Some(text) = event.data().as_string() else {
                    return;
                };
                match decode(&text) {
                    Ok(Inbound::Change(change)) => {
                        // The receiver is gone once the feed is released.
                        let _ = sender.unbounded_send(change);
                    }
                    Ok(Inbound::Joined) => {
                        log::debug!("joined {}", topic(&scope));
                        on_joined();
                    }
                    Ok(Inbound::JoinRejected(reason)) => {
                        log::warn!("realtime join for {} rejected: {}", topic(&scope), reason);
                        sender.close_channel();
                    }
                    Ok(Inbound::Closed) => {
                        log::debug!("realtime channel {} closed by server", topic(&scope));
                        sender.close_channel();
                    }
                    Ok(Inbound::Ignored) => {}
                    Err(e) => log::warn!("unreadable realtime message: {}", e),
                }
            })
        };
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            log::debug!("realtime socket for {} closed", topic(&scope));
            sender.close_channel();
        });
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let heartbeat = {
            let socket = socket.clone();
            let refs = Rc::clone(&refs);
            Closure::<dyn FnMut()>::new(move || {
                if socket.ready_state() == WebSocket::OPEN {
                    send(&socket, &heartbeat_message(next_ref(&refs)));
                }
            })
        };
        let interval = web_sys::window()
            .ok_or_else(|| RemoteError::Network("no window".to_string()))
            .and_then(|window| {
                window
                    .set_interval_with_callback_and_timeout_and_arguments_0(
                        heartbeat.as_ref().unchecked_ref(),
                        HEARTBEAT_INTERVAL_MS,
                    )
                    .map_err(network_error)
            });
        let interval = match interval {
            Ok(interval) => interval,
            Err(e) => {
                // The callbacks are about to be dropped; detach them first.
                socket.set_onopen(None);
                socket.set_onmessage(None);
                socket.set_onclose(None);
                let _ = socket.close();
                return Err(e);
            }
        };

        Ok(Self {
            socket,
            scope,
            refs,
            interval,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _heartbeat: heartbeat,
        })
    }

    fn close(self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.interval);
        }
        if self.socket.ready_state() == WebSocket::OPEN {
            send(&self.socket, &leave_message(&self.scope, next_ref(&self.refs)));
        }
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        if let Err(e) = self.socket.close() {
            log::debug!("closing realtime socket: {:?}", e);
        }
        log::debug!("released realtime channel {}", topic(&self.scope));
    }
}

fn next_ref(refs: &Cell<u64>) -> u64 {
    let next = refs.get() + 1;
    refs.set(next);
    next
}

fn send(socket: &WebSocket, message: &PhoenixMessage) {
    match serde_json::to_string(message) {
        Ok(text) => {
            if let Err(e) = socket.send_with_str(&text) {
                log::warn!("realtime send on {} failed: {:?}", message.topic, e);
            }
        }
        Err(e) => log::warn!("cannot encode realtime message: {}", e),
    }
}
