//! Shared utility functions.
//!
//! - `channels`: channel-reference parsing and URL building
//! - `progress`: terminal status lines and progress bars

pub mod channels;
pub mod progress;
