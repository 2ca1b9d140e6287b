//! Interactive prompts outside the chat loop

pub mod credentials;
