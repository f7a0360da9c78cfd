// src/lib.rs

pub mod catalog;
pub mod config;
pub mod http;
pub mod platforms;
pub mod services;
pub mod tasks;

pub use config::BotConfig;
pub use http::{DefaultHttpClient, HttpClient};
pub use streambot_common::error::Error;
