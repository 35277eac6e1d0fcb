//! Object storage backends.

pub mod aws;
pub mod memory;
pub mod store;
