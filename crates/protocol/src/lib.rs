//! Wire types for the drover command channel.
//!
//! This crate contains the serde-serializable types exchanged between the
//! driving process and the in-page command executor. These types represent
//! the "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with the channel contract**: Field names match the JSON the page
//!   script produces and consumes (camelCase, `type`-tagged messages)
//! - **Versioned**: Every message carries the protocol version so the two
//!   sides can refuse to talk across an incompatible upgrade
//!
//! The runtime that moves these messages lives in the `drover` crate.

pub mod command;
pub mod message;

pub use command::*;
pub use message::*;
