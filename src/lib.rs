#![cfg_attr(not(test), no_std)]

// must come first so the logging macros are visible to every module below
mod fmt;

#[cfg(target_os = "none")]
pub mod board;
pub mod config;
pub mod drivers;
pub mod emitter;
pub mod indicator;
pub mod scheduler;
pub mod tasks;
pub mod walk;

#[cfg(target_os = "none")]
pub use board::Board;
pub use drivers::Humiture;
pub use walk::RandomWalk;
