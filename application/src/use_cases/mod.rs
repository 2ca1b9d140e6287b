//! Use cases (application services)
//!
//! Use cases orchestrate domain logic and coordinate with external
//! services through ports.

pub mod authenticate;
pub mod consume_stream;
pub mod dictate;
pub mod generate_image;
pub mod manage_conversations;
pub mod send_message;

#[cfg(test)]
mod test_support;
