pub mod codec;
pub mod constants;
pub mod error;
pub mod format;
pub mod pack;
pub mod reader;
pub mod writer;
