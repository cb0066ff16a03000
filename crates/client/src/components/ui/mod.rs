//! UI primitives.

pub mod button;

pub use button::*;
