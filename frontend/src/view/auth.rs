use sauron::{
    html::{attributes::*, *},
    prelude::*,
};

use crate::state::session::{AuthForm, AuthMode};
use crate::state::Msg;

const FIELD: &str = "w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent";

pub fn view(form: &AuthForm) -> Node<Msg> {
    let signing_up = form.mode == AuthMode::SignUp;

    div([class("flex items-center justify-center min-h-screen bg-ctp-base p-4")], [
        div([class("w-full max-w-md p-6 bg-ctp-surface1 rounded-lg border border-ctp-surface2 shadow-lg")], [
            h1([class("text-2xl font-bold text-center text-ctp-text")], [text("Team Board")]),
            p([class("text-center text-ctp-subtext1 mt-1 mb-6")], [text(if signing_up {
                "Create a new account"
            } else {
                "Sign in with your email"
            })]),
            div([class("space-y-4")], [
                if signing_up {
                    field("Name", input([
                        r#type("text"),
                        placeholder("Jane Doe"),
                        value(&form.name),
                        on_input(|event| Msg::SetAuthName(event.value())),
                        class(FIELD),
                    ], []))
                } else {
                    span([], [])
                },
                field("Email", input([
                    r#type("email"),
                    placeholder("name@example.com"),
                    value(&form.email),
                    on_input(|event| Msg::SetAuthEmail(event.value())),
                    class(FIELD),
                ], [])),
                field("Password", input([
                    r#type("password"),
                    value(&form.password),
                    on_input(|event| Msg::SetAuthPassword(event.value())),
                    on_keydown(|event| Msg::AuthKey(event.key())),
                    class(FIELD),
                ], [])),
                button([
                    on_click(|_| Msg::SubmitAuth),
                    disabled(form.submitting),
                    class("w-full bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200 disabled:opacity-50"),
                ], [text(match (form.submitting, signing_up) {
                    (true, _) => "Please wait...",
                    (false, true) => "Sign up",
                    (false, false) => "Sign in",
                })]),
            ]),
            div([class("mt-4 text-center text-sm")], [
                span([class("text-ctp-subtext0")], [text(if signing_up {
                    "Already have an account? "
                } else {
                    "No account yet? "
                })]),
                button([
                    r#type("button"),
                    on_click(|_| Msg::ToggleAuthMode),
                    class("font-semibold text-ctp-blue hover:underline"),
                ], [text(if signing_up { "Sign in" } else { "Sign up" })]),
            ]),
        ]),
    ])
}

fn field(name: &str, control: Node<Msg>) -> Node<Msg> {
    div([class("space-y-2")], [
        label([class("text-sm font-medium text-ctp-subtext1")], [text(name)]),
        control,
    ])
}
