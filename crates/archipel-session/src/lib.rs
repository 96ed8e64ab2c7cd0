//! Client session management for Archipel.
//!
//! This crate owns the two pieces of client state that outlive a single
//! request:
//!
//! 1. **Token storage**: where the bearer token lives between calls
//!    ([`TokenStore`], backed by a [`KeyValueStore`] per [`StorageScope`])
//! 2. **Session state**: who is logged in right now, observable by any
//!    number of subscribers ([`SessionHolder`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Auth layer (above)  ← logs in/out, attaches tokens, reacts to 401
//!     ↕
//! Session layer (this crate)  ← token persistence and current user
//!     ↕
//! Protocol layer (below)  ← provides JwtResponse, Claims, TokenCodec
//! ```
//!
//! Both types use short, non-reentrant critical sections and are meant to
//! be created once per process and shared through `Arc`.

mod error;
mod holder;
mod session;
mod store;

pub use error::SessionError;
pub use holder::{SessionHolder, Subscription};
pub use session::{Session, SessionState};
pub use store::{
    DEFAULT_TOKEN_KEY, FileStore, KeyValueStore, MemoryStore, StorageScope,
    TokenStore,
};
