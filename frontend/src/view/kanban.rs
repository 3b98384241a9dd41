use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{Board, Priority, Task, TaskStatus};
use wasm_bindgen::JsCast;
use web_sys::DragEvent;

use crate::drag::{DragLocation, DragSource};
use crate::state::tasks::TaskStore;
use crate::state::Msg;

pub fn view(board: Option<&Board>, tasks: &TaskStore, drag_over: Option<TaskStatus>) -> Node<Msg> {
    div([], [
        div([class("flex items-center gap-4 mb-6")], [
            button([
                on_click(|_| Msg::BackToBoards),
                class("border border-ctp-surface2 text-ctp-text text-sm px-3 py-1 rounded-md hover:bg-ctp-surface0 transition-colors duration-200"),
            ], [text("← All boards")]),
            h2([class("text-2xl font-bold text-ctp-text flex items-center gap-2")], [
                text(board.map(|board| board.name.as_str()).unwrap_or_default()),
                if tasks.loading() {
                    span([class("animate-spin text-ctp-overlay1 text-base")], [text("◐")])
                } else {
                    span([], [])
                },
            ]),
        ]),
        div(
            [class("grid grid-cols-1 md:grid-cols-3 gap-6")],
            TaskStatus::ALL
                .into_iter()
                .map(|status| view_column(status, tasks, drag_over == Some(status))),
        ),
    ])
}

fn view_column(status: TaskStatus, tasks: &TaskStore, highlighted: bool) -> Node<Msg> {
    let cards: Vec<&Task> = tasks.column(status).collect();

    div([class("flex flex-col bg-ctp-mantle rounded-xl border border-ctp-surface0 p-4")], [
        div([class("flex items-center justify-between mb-4")], [
            h3([class("font-semibold text-ctp-text")], [text(status.label())]),
            span([class("text-xs font-bold bg-ctp-surface0 px-2 py-1 rounded-full text-ctp-subtext1")], [
                text(cards.len()),
            ]),
        ]),
        div(
            [
                on("dragover", move |event| {
                    if let Some(event) = event.as_web() {
                        event.prevent_default();
                    }
                    Msg::DragOver(status)
                }),
                on("drop", move |event| {
                    if let Some(event) = event.as_web() {
                        event.prevent_default();
                    }
                    Msg::DropOnColumn(status)
                }),
                class(&format!(
                    "flex-1 min-h-[150px] rounded-lg transition-colors duration-200 {}",
                    if highlighted { "bg-ctp-surface0" } else { "" }
                )),
            ],
            cards
                .iter()
                .enumerate()
                .map(|(index, task)| view_card(task, DragLocation::new(status, index))),
        ),
        view_draft(status, tasks.draft(status)),
    ])
}

fn view_card(task: &Task, location: DragLocation) -> Node<Msg> {
    let task_id = task.id;
    let source = DragSource {
        task_id,
        origin: location,
    };

    div([
        attr("draggable", "true"),
        on("dragstart", move |event| {
            // Firefox refuses to start a drag that carries no data.
            let transfer = event
                .as_web()
                .and_then(|event| event.dyn_into::<DragEvent>().ok())
                .and_then(|event| event.data_transfer());
            if let Some(transfer) = transfer {
                transfer.set_effect_allowed("move");
                let _ = transfer.set_data("text/plain", &task_id.to_string());
            }
            Msg::DragStart(source)
        }),
        on("drop", move |event| {
            if let Some(event) = event.as_web() {
                event.prevent_default();
                event.stop_propagation();
            }
            Msg::DropOn(location)
        }),
        on("dragend", |_| Msg::DragEnd),
        on_click(move |_| Msg::OpenTask(task_id)),
        class(&format!(
            "mb-3 p-3 space-y-2 cursor-pointer bg-ctp-surface1 rounded-lg border-l-4 hover:shadow-md transition-all duration-200 {}",
            match task.status {
                TaskStatus::Done => "border-ctp-green opacity-60",
                TaskStatus::InProgress => "border-ctp-blue",
                TaskStatus::Pending => "border-ctp-overlay0",
            }
        )),
    ], [
        span([class(&format!("text-[10px] px-2 py-0.5 rounded font-bold {}", priority_badge(task.priority)))], [
            text(task.priority.label()),
        ]),
        div([class("text-sm font-medium text-ctp-text break-words")], [text(&task.content)]),
        div([class("flex items-center justify-between pt-2 border-t border-ctp-surface2")], [
            match task.due_date {
                Some(due) => span([class("text-xs text-ctp-subtext0")], [text(&due.format("%m/%d").to_string())]),
                None => span([], []),
            },
            match &task.assignee {
                Some(assignee) => span([class("text-xs font-medium bg-ctp-surface0 px-2 py-1 rounded-full text-ctp-subtext1")], [
                    text(&assignee.name),
                ]),
                None => span([], []),
            },
        ]),
    ])
}

fn view_draft(status: TaskStatus, draft: Option<&str>) -> Node<Msg> {
    let Some(content) = draft else {
        return button([
            on_click(move |_| Msg::OpenDraft(status)),
            class("mt-3 w-full text-ctp-subtext0 hover:text-ctp-text border border-dashed border-ctp-surface2 rounded-md py-2 transition-colors duration-200"),
        ], [text("+ Add card")]);
    };

    div([class("mt-3 space-y-2")], [
        input([
            r#type("text"),
            placeholder("What needs doing?"),
            value(content.to_string()),
            on_input(move |event| Msg::SetDraft(status, event.value())),
            on_keydown(move |event| Msg::DraftKey(status, event.key())),
            class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue"),
        ], []),
        div([class("flex gap-2")], [
            button([
                on_click(move |_| Msg::SubmitDraft(status)),
                class("flex-1 bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base text-sm font-medium py-1 rounded-md transition-colors duration-200"),
            ], [text("Add")]),
            button([
                on_click(move |_| Msg::CancelDraft(status)),
                class("px-3 text-ctp-subtext0 hover:text-ctp-text"),
            ], [text("✕")]),
        ]),
    ])
}

fn priority_badge(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "bg-ctp-surface2 text-ctp-subtext1",
        Priority::Medium => "bg-ctp-yellow/20 text-ctp-yellow",
        Priority::High => "bg-ctp-red/20 text-ctp-red",
    }
}
