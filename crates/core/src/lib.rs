// Core types for the ssemcp server: response envelopes and the weather domain

pub mod envelope;
pub mod weather;

pub use envelope::{Envelope, ErrorEnvelope, Status, SuccessEnvelope};
