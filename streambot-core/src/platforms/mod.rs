// File: src/platforms/mod.rs

pub use streambot_common::traits::platform_traits::{
    ConnectionStatus, PlatformAuth, PlatformIntegration,
};

pub mod discord;
