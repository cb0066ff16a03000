use dioxus::prelude::*;

use crate::components::{ConnectionCard, TokenBar};
use crate::console::ConsoleView;

/// The whole console: token bar on top, one card per connection below.
#[component]
pub fn ConsolePage(view: ConsoleView) -> Element {
    rsx! {
        main { class: "console",
            h1 { "WebSocket Console" }
            TokenBar { token: view.token.clone(), notice: view.notice.clone() }
            div { class: "connections",
                if view.connections.is_empty() {
                    p { class: "empty", "No connections. Add one to get started." }
                }
                for connection in view.connections.iter().cloned() {
                    ConnectionCard { key: "{connection.id}", connection }
                }
            }
        }
    }
}
