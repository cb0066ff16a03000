//! One connection panel: address, controls, log and composer.

use dioxus::prelude::*;
use socketdeck_core::{history_label, MessageFormat, SessionState};

use crate::components::ui::{Button, ButtonVariant};
use crate::console::{Command, ConnectionView, ConsoleHandle};

#[component]
pub fn ConnectionCard(connection: ConnectionView) -> Element {
    let console = use_context::<ConsoleHandle>();
    let id = connection.id;

    let mut message = use_signal(String::new);
    let mut format = use_signal(MessageFormat::default);
    let mut picked = use_signal(String::new);

    let send = {
        let console = console.clone();
        move || {
            console.send(Command::Send {
                id,
                text: message.read().clone(),
                format: *format.read(),
            })
        }
    };

    let status_class = match connection.state {
        SessionState::Connected => "status status-connected",
        SessionState::Connecting | SessionState::ReconnectPending => "status status-pending",
        SessionState::Disconnected => "status status-disconnected",
    };
    let status = connection.state.label();
    let idle = connection.state == SessionState::Disconnected;
    let format_value = format.read().as_str();

    rsx! {
        section { class: "connection-card",
            header { class: "card-header",
                h2 { "Connection {id}" }
                span { class: status_class, "{status}" }
                Button {
                    variant: ButtonVariant::Danger,
                    title: "Remove this connection",
                    onclick: {
                        let console = console.clone();
                        move |_| console.send(Command::RemoveConnection(id))
                    },
                    "Remove"
                }
            }

            div { class: "card-row",
                input {
                    class: "url-input",
                    value: "{connection.url}",
                    oninput: {
                        let console = console.clone();
                        move |e: FormEvent| console.send(Command::SetUrl { id, url: e.value() })
                    },
                }
                if idle {
                    Button {
                        onclick: {
                            let console = console.clone();
                            move |_| console.send(Command::Connect(id))
                        },
                        "Connect"
                    }
                } else {
                    Button {
                        variant: ButtonVariant::Secondary,
                        onclick: {
                            let console = console.clone();
                            move |_| console.send(Command::Disconnect(id))
                        },
                        "Disconnect"
                    }
                }
                label { class: "checkbox",
                    input {
                        r#type: "checkbox",
                        checked: connection.auto_reconnect,
                        onchange: {
                            let console = console.clone();
                            move |e: FormEvent| {
                                console.send(Command::SetAutoReconnect { id, enabled: e.checked() })
                            }
                        },
                    }
                    "Auto-reconnect"
                }
            }

            textarea {
                class: "log",
                readonly: true,
                rows: 12,
                value: "{connection.log}",
            }

            div { class: "card-row",
                input {
                    class: "message-input",
                    placeholder: "Message",
                    value: "{message}",
                    oninput: move |e| message.set(e.value()),
                    onkeydown: {
                        let send = send.clone();
                        move |e: KeyboardEvent| {
                            if e.key() == Key::Enter {
                                send();
                            }
                        }
                    },
                }
                select {
                    value: format_value,
                    onchange: move |e| {
                        if let Ok(f) = e.value().parse() {
                            format.set(f);
                        }
                    },
                    option { value: "text", "Text" }
                    option { value: "json", "JSON" }
                }
                Button {
                    onclick: {
                        let send = send.clone();
                        move |_| send()
                    },
                    "Send"
                }
                Button {
                    variant: ButtonVariant::Secondary,
                    onclick: {
                        let console = console.clone();
                        move |_| console.send(Command::ClearLog(id))
                    },
                    "Clear"
                }
            }

            div { class: "card-row",
                select {
                    class: "history",
                    onchange: move |e| picked.set(e.value()),
                    option { value: "", "Message history" }
                    for item in connection.history.iter() {
                        option { key: "{item}", value: "{item}", {history_label(item)} }
                    }
                }
                Button {
                    variant: ButtonVariant::Secondary,
                    onclick: move |_| {
                        let item = picked.read().clone();
                        if !item.is_empty() {
                            message.set(item);
                        }
                    },
                    "Load"
                }
                Button {
                    variant: ButtonVariant::Secondary,
                    onclick: {
                        let console = console.clone();
                        move |_| {
                            console.send(Command::SaveToHistory {
                                id,
                                text: message.read().clone(),
                            })
                        }
                    },
                    "Save Current"
                }
            }
        }
    }
}
