//! DRTP: a Go-Back-N, UDP-based reliable file transfer protocol.
//!
//! This crate has no knowledge of argv, environment variables, or
//! stdout/stderr: it is driven entirely through [`Config`] and
//! [`endpoint::Endpoint`]. The `sender` and `receiver` binaries own the
//! CLI surface and logging setup; this crate only logs through the
//! `log` facade.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod framer;
pub mod handshake;
pub mod header;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod window;

pub use config::Config;
pub use endpoint::{Endpoint, RecvOutcome};
pub use error::{Error, Result};
pub use handshake::ConnectionState;
pub use header::{Flags, Header};
pub use packet::Packet;
