//! Channel abstraction for message I/O.

pub mod bluebubbles;
pub mod channel;
pub mod cli;
pub mod manager;

pub use bluebubbles::{BlueBubblesChannel, BlueBubblesClient};
pub use channel::*;
pub use cli::CliChannel;
pub use manager::ChannelManager;
