//! Session data model for Examdesk.
//!
//! This crate defines what a session "looks like" once it is written
//! down:
//!
//! - **Types** ([`SessionRecord`], [`UserProfile`], [`EpochMillis`],
//!   [`StorageKey`]): the four logically related entries that make up
//!   a persisted session.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   turned into the strings a key-value store holds.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding
//!   or decoding them.
//!
//! # Architecture
//!
//! ```text
//! Session core (examdesk-session) → Protocol (typed record) → Store (strings)
//! ```
//!
//! The protocol layer knows nothing about timers or storage backends.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{EpochMillis, Role, SessionRecord, StorageKey, UserProfile};
