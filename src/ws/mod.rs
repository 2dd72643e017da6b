//! Observer transport: wire protocol, codec and the WebSocket endpoint

pub mod codec;
pub mod handler;
pub mod protocol;

pub use codec::{Codec, CodecError};
pub use protocol::{Action, Key, Message, Payload, PayloadKind};
