//! socketdeck client - main entry point
//!
//! Supports both web (WASM) and desktop platforms.

#![allow(non_snake_case)]

use dioxus::prelude::*;
use socketdeck_client::{config, console, views::ConsolePage, ConsoleView, PlatformStore};

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    socketdeck_client::logging::init();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let mut view = use_signal(ConsoleView::default);

    use_context_provider(move || {
        let (handle, run) = console::launch(PlatformStore::open(), config::from_env(), move |next| {
            view.set(next)
        });
        spawn(run);
        handle
    });

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        ConsolePage { view: view.read().clone() }
    }
}
