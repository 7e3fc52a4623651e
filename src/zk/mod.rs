//! ZKTeco "ZK" binary attendance-terminal protocol (TCP/UDP, port 4370).
//!
//! Communicates with devices using the wire-exact ZK protocol: outer TCP
//! framing, an 8-byte inner header with a ones-complement checksum, a
//! challenge-response auth handshake, and a chunked bulk-transfer engine
//! for datasets too large for one packet.
//!
//! # Example
//!
//! ```ignore
//! use rbzk::zk::client::{Options, ZkTeco};
//!
//! let mut device = ZkTeco::new(Options { ip: "192.168.1.201".into(), ..Default::default() });
//! device.connect()?;
//! let users = device.get_users()?;
//! device.disconnect()?;
//! ```

pub mod bulk;
pub mod client;
pub mod commkey;
pub mod error;
pub mod protocol;
pub mod records;
pub mod timestamp;
pub mod transport;
pub mod types;

pub use client::{Options, ZkTeco};
pub use error::{Result, ZkError};
pub use types::{Attendance, DeviceCounts, FingerTemplate, User};
