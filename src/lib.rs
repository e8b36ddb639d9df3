//! FormFlow — text-driven form filling over chat channels.

pub mod catalog;
pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod render;
pub mod template;
