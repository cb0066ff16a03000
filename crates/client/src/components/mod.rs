//! Console building blocks.

pub mod connection_card;
pub mod token_bar;
pub mod ui;

pub use connection_card::ConnectionCard;
pub use token_bar::TokenBar;
