//! In-process adapters used when running without a backend (`--offline`).

mod store;

pub use store::InMemoryConversationStore;
