// Licel measurement file reader/writer
// Main library entry point

pub mod core;

// Re-export main types
pub use core::error::{LicelError, Result};
pub use core::format::{LicelFile, LicelProfile};
pub use core::pack::LicelPack;
