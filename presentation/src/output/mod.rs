//! Terminal output: formatted listings, streamed replies and image files

pub mod console;
pub mod image;
pub mod stream;
