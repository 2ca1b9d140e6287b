//! Application-level configuration.
//!
//! - [`ChatParams`] - chat exchange control (conversation mode, partial persistence)

pub mod chat_params;

pub use chat_params::ChatParams;
