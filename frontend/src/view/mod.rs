mod auth;
mod boards;
mod dialog;
mod kanban;

use sauron::{
    html::{attributes::*, *},
    prelude::*,
};

use crate::remote::RemoteService;
use crate::state::{run, AppState, Effect, Msg};

/// The mounted application: [`AppState`] plus the effect runner.
pub struct App<R: RemoteService> {
    state: AppState<R>,
}

impl<R: RemoteService> App<R> {
    pub fn new(remote: R) -> Self {
        Self {
            state: AppState::new(remote),
        }
    }

    fn perform(&self, effects: Vec<Effect>) -> Cmd<Msg> {
        let mut commands = Vec::new();
        for effect in effects {
            match effect {
                Effect::Run(command) => {
                    let remote = self.state.remote().clone();
                    commands.push(Cmd::new(run(remote, command)));
                }
                Effect::Alert(message) => alert(&message),
            }
        }
        Cmd::batch(commands)
    }

    fn view_loading(&self) -> Node<Msg> {
        div(
            [class("flex h-screen w-full items-center justify-center bg-ctp-base")],
            [span([class("animate-spin text-3xl text-ctp-blue")], [text("◐")])],
        )
    }
}

impl<R: RemoteService> Application for App<R> {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        let effects = self.state.start();
        self.perform(effects)
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        let effects = self.state.update(msg);
        self.perform(effects)
    }

    fn view(&self) -> Node<Msg> {
        if self.state.session().checking() {
            return self.view_loading();
        }
        let Some(user) = self.state.user() else {
            return auth::view(&self.state.auth_form);
        };

        let store = &self.state.boards;
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                boards::view_header(store, user),
                div(
                    [class("max-w-7xl mx-auto px-6 py-8")],
                    [match store.active() {
                        Some(_) => kanban::view(store.active_board(), &self.state.tasks, self.state.drag_over()),
                        None => boards::view_grid(store),
                    }],
                ),
                match self.state.dialog() {
                    Some(task_dialog) => dialog::view(task_dialog),
                    None => span([], []),
                },
            ],
        )
    }
}

fn alert(message: &str) {
    let shown = web_sys::window().map(|window| window.alert_with_message(message));
    if !matches!(shown, Some(Ok(()))) {
        log::warn!("could not show alert: {}", message);
    }
}
