//! Transport layer: a managed TCP connection speaking [`DroneCodec`].
//!
//! [`DroneCodec`]: crate::codec::DroneCodec

pub mod connection;

pub use connection::{ConnectionInfo, DroneConnection};
