//! Auth token entry and console-wide actions.

use dioxus::prelude::*;

use crate::components::ui::{Button, ButtonVariant};
use crate::console::{Command, ConsoleHandle};

#[component]
pub fn TokenBar(token: Option<String>, notice: Option<String>) -> Element {
    let console = use_context::<ConsoleHandle>();
    let mut draft = use_signal(|| token.clone().unwrap_or_default());

    let save = {
        let console = console.clone();
        move |_| console.send(Command::SaveToken(draft.read().clone()))
    };
    let add = {
        let console = console.clone();
        move |_| console.send(Command::AddConnection)
    };
    let export = move |_| console.send(Command::ExportLogs);

    rsx! {
        div { class: "token-bar",
            label { r#for: "auth-token", "Auth token" }
            input {
                id: "auth-token",
                r#type: "password",
                placeholder: "Token appended to every connect",
                value: "{draft}",
                oninput: move |e| draft.set(e.value()),
            }
            Button { onclick: save, "Save Token" }
            Button { variant: ButtonVariant::Secondary, onclick: add, "Add Connection" }
            Button { variant: ButtonVariant::Secondary, onclick: export, "Export Logs" }
            if let Some(notice) = notice {
                span { class: "notice", "{notice}" }
            }
        }
    }
}
