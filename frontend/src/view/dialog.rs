use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::Priority;

use crate::state::dialog::TaskDialog;
use crate::state::Msg;

const FIELD: &str = "w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue";

pub fn view(dialog: &TaskDialog) -> Node<Msg> {
    div([class("fixed inset-0 z-50 flex items-center justify-center bg-black/50 p-4")], [
        div([class("w-full max-w-xl bg-ctp-surface1 rounded-lg border border-ctp-surface2 shadow-xl p-6 space-y-4")], [
            h2([class("text-xl font-semibold text-ctp-text pb-2 border-b border-ctp-surface2")], [text("Task details")]),
            labelled("Title", input([
                r#type("text"),
                value(&dialog.content),
                on_input(|event| Msg::SetDialogContent(event.value())),
                class(FIELD),
            ], [])),
            div([class("grid grid-cols-2 gap-4")], [
                labelled("Priority", select(
                    [
                        value(dialog.priority.as_str()),
                        on_input(|event| Msg::SetDialogPriority(event.value().parse().unwrap_or_default())),
                        class(FIELD),
                    ],
                    Priority::ALL.into_iter().map(|priority| {
                        let mut attrs = vec![value(priority.as_str())];
                        if priority == dialog.priority {
                            attrs.push(attr("selected", "selected"));
                        }
                        option(attrs, [text(priority.label())])
                    }),
                )),
                labelled("Assignee", button([
                    on_click(|_| Msg::ToggleAssignee),
                    class(&format!(
                        "w-full text-left px-3 py-2 rounded-md border transition-colors duration-200 {}",
                        if dialog.assignee.is_some() {
                            "border-ctp-blue bg-ctp-blue/10 text-ctp-text"
                        } else {
                            "border-ctp-surface2 text-ctp-subtext0"
                        }
                    )),
                ], [text(
                    dialog
                        .assignee
                        .as_ref()
                        .map(|user| user.name.as_str())
                        .unwrap_or("No assignee"),
                )])),
            ]),
            labelled("Due date", input([
                r#type("date"),
                value(&dialog.due_date_input()),
                on_input(|event| Msg::SetDialogDueDate(event.value())),
                class(FIELD),
            ], [])),
            labelled("Description", textarea([
                placeholder("Add more detail..."),
                value(&dialog.description),
                on_input(|event| Msg::SetDialogDescription(event.value())),
                class(&format!("{} min-h-[100px] resize-y", FIELD)),
            ], [])),
            labelled("Issue", input([
                r#type("text"),
                placeholder("Record blockers here"),
                value(&dialog.issue),
                on_input(|event| Msg::SetDialogIssue(event.value())),
                class(&format!("{} border-ctp-red/40", FIELD)),
            ], [])),
            div([class("flex justify-between pt-2")], [
                button([
                    on_click(|_| Msg::DeleteFromDialog),
                    class("bg-ctp-red hover:bg-ctp-maroon text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                ], [text("Delete")]),
                div([class("flex gap-2")], [
                    button([
                        on_click(|_| Msg::CloseDialog),
                        class("border border-ctp-surface2 text-ctp-text px-4 py-2 rounded-md hover:bg-ctp-surface0 transition-colors duration-200"),
                    ], [text("Cancel")]),
                    button([
                        on_click(|_| Msg::SaveDialog),
                        class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                    ], [text("Save")]),
                ]),
            ]),
        ]),
    ])
}

fn labelled(name: &str, control: Node<Msg>) -> Node<Msg> {
    div([class("grid gap-2")], [
        label([class("text-sm font-medium text-ctp-subtext1")], [text(name)]),
        control,
    ])
}
