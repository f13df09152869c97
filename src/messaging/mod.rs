//! # Messaging
//!
//! Message envelope, typed control payloads and wire replies.

pub mod errors;
pub mod message;
pub mod payloads;
pub mod reply;

pub use errors::{ProtocolError, ProtocolResult};
pub use message::{Message, RawMessage};
pub use payloads::{EventPayload, SaveSettingsPayload, StartPayload};
pub use reply::{ControlResponse, Reply};
