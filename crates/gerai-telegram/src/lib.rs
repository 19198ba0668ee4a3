//! Telegram transport for the gerai status service: a Bot API client, the
//! long-polling bot and a queue-backed notifier.

pub mod bot;
pub mod client;
pub mod error;
pub mod keyboard;
pub mod notifier;
pub mod types;

pub use bot::Bot;
pub use client::TelegramClient;
pub use error::{Result, TelegramError};
pub use notifier::{DeliveryQueue, TelegramNotifier};
