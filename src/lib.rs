pub mod cli;
pub mod config;
pub mod zk;

pub use zk::{Result, ZkError};
