//! Shared fakes and helpers for unit tests
mod common;
mod fake_launcher;
mod stub_connector;

pub use common::*;
pub use fake_launcher::*;
pub use stub_connector::*;
