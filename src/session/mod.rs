//! Session module - Durable identity → session registry
//!
//! Sessions are opaque to this crate: whatever the login flow produces is
//! stored and handed back unchanged.

mod store;
mod types;

pub use store::{
    JsonSessionStorage, MemorySessionStorage, SessionRegistry, SessionStorage,
    SessionStoreError,
};
pub use types::Session;
