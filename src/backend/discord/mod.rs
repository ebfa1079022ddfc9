mod client;
mod config;
mod error;
mod models;

pub use client::DiscordBackend;
pub use config::DiscordConfig;
pub use error::DiscordError;
