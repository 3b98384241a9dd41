pub mod config;
pub mod drag;
pub mod error;
pub mod feed;
pub mod logging;
pub mod remote;
pub mod state;
pub mod view;

use sauron::prelude::*;

use crate::remote::SupabaseClient;
use crate::view::App;

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();

    wasm_bindgen_futures::spawn_local(async {
        match config::load().await {
            Ok(config) => {
                log::debug!("remote service configured");
                Program::mount_to_body(App::new(SupabaseClient::new(config)));
            }
            Err(e) => {
                log::error!("cannot start: {}", e);
                show_startup_error(&format!("Team Board could not start: {}", e));
            }
        }
    });
}

fn show_startup_error(message: &str) {
    if let Some(body) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
    {
        body.set_inner_text(message);
    }
}
