use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::User;

use crate::state::boards::BoardStore;
use crate::state::Msg;

pub fn view_header(store: &BoardStore, user: &User) -> Node<Msg> {
    header([class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")], [
        div([class("max-w-7xl mx-auto px-6 py-4 flex flex-col md:flex-row md:items-center justify-between gap-4")], [
            div([], [
                h1([class("text-2xl font-bold text-ctp-text")], [text("Team Board")]),
                p([class("text-ctp-subtext1 text-sm mt-1 flex items-center gap-2")], [
                    span([class("w-2 h-2 bg-ctp-green rounded-full animate-pulse")], []),
                    text(&format!("Live sync · {}", user.name)),
                ]),
            ]),
            div([class("flex gap-2 w-full md:w-auto")], [
                input([
                    r#type("text"),
                    placeholder("New board name..."),
                    value(&store.new_name),
                    on_input(|event| Msg::SetBoardName(event.value())),
                    class("px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue"),
                ], []),
                button([
                    on_click(|_| Msg::CreateBoard),
                    class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                ], [text("Create board")]),
                button([
                    on_click(|_| Msg::SignOut),
                    class("border border-ctp-surface2 text-ctp-text px-4 py-2 rounded-md hover:bg-ctp-surface0 transition-colors duration-200"),
                ], [text("Log out")]),
            ]),
        ]),
    ])
}

pub fn view_grid(store: &BoardStore) -> Node<Msg> {
    div([class("text-center py-20")], [
        h2([class("text-xl text-ctp-overlay1 font-medium")], [text("Pick a board or create a new one.")]),
        div(
            [class("mt-8 grid grid-cols-1 sm:grid-cols-2 md:grid-cols-3 gap-4")],
            store.boards().iter().map(|board| {
                let board_id = board.id;
                div([
                    on_click(move |_| Msg::SelectBoard(board_id)),
                    class("cursor-pointer p-6 bg-ctp-surface1 rounded-lg border border-ctp-surface2 hover:border-ctp-blue hover:shadow-md transition-all duration-200"),
                ], [
                    span([class("font-bold text-lg text-ctp-text")], [text(&board.name)]),
                ])
            }),
        ),
    ])
}
