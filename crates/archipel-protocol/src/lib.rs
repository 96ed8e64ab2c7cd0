//! Wire protocol for Archipel.
//!
//! This crate defines the "language" the client and the REST backend speak:
//!
//! - **Types** ([`LoginRequest`], [`RegisterRequest`], [`JwtResponse`],
//!   [`ApiMessage`]): the JSON bodies that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those bodies are
//!   converted to/from bytes.
//! - **Token codec** ([`TokenCodec`], [`Claims`]): reads the claims out of
//!   a bearer token's payload segment, for display and authorization hints.
//! - **Validation** ([`ValidationError`]): the checks a request must pass
//!   before it is allowed onto the network.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (who is logged in). It doesn't know about storage or subscribers;
//! it only knows how to serialize, deserialize and check messages.
//!
//! ```text
//! Transport (bytes) → Protocol (DTOs, claims) → Session (token, current user)
//! ```

mod codec;
mod error;
mod token;
mod types;
mod validation;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use token::{Claims, TokenCodec};
pub use types::{
    ApiMessage, DEFAULT_ROLE, JwtResponse, LoginRequest, RegisterRequest,
    TOKEN_TYPE_BEARER, error_message,
};
pub use validation::{ValidationError, is_valid_email};
