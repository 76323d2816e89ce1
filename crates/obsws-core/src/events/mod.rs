//! Typed views of event payloads the client derives local state from.

pub mod output;

pub use output::{OutputKind, OutputState, OutputStateChanged};
