pub mod binding;
pub mod bridge;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod platform;
pub mod report;
pub mod sysfs;
pub mod transport;

pub use bridge::Bridge;
pub use error::{Error, Result};
