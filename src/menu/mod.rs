// Menu screen: preferences, premium restore and sharing

pub mod types;
pub mod config;
pub mod device;
pub mod storage;
pub mod api;
pub mod platform;
pub mod share;
pub mod verifier;
pub mod manager;

pub use types::*;
pub use config::*;
pub use manager::{commands, MenuState};
