//! socketdeck client - Dioxus web and desktop front end
//!
//! Drives the connection core with real sockets, timers and storage for the
//! platform it runs on, and renders the console.

pub mod components;
pub mod config;
pub mod console;
pub mod export;
pub mod logging;
pub mod storage;
pub mod timers;
pub mod views;
pub mod ws;

pub use console::{launch, Command, ConsoleHandle, ConsoleView};
pub use storage::PlatformStore;
