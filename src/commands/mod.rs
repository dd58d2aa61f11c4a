//! Non-interactive command handlers.
//!
//! Each handler takes the state it needs plus an output sink, so it can be
//! tested without a terminal.

pub mod export;
pub mod presets;

pub use export::handle_export;
pub use presets::handle_presets;
