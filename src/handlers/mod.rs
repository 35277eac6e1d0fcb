//! Request handlers.

pub mod assets;
pub mod location;
