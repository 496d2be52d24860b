//! Data model and wire protocol for Turncoat.
//!
//! This crate defines everything that crosses the boundary between the
//! room core and whatever request layer sits in front of it:
//!
//! - **Model** ([`Player`], [`RoomSnapshot`], [`GameRecord`], ...): the
//!   records the room hands out. All of them are owned copies; nothing in
//!   here aliases room internals.
//! - **Messages** ([`Request`], [`Response`]): the action-tagged JSON
//!   shapes clients send and receive.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, messages out.
//!
//! ```text
//! client bytes → Codec → Request → RoomManager → Response → Codec → bytes
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{JoinStatus, Request, Response};
pub use types::{GameRecord, Phase, Player, PlayerId, RoomSnapshot, Team, Teams};
