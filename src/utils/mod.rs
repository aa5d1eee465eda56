//! Shared utility functions.
//!
//! - `text`: character-aware truncation and size formatting

mod text;

pub use text::{char_len, format_size, truncate_chars};
