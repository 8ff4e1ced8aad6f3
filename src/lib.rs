//! # Revolve (Access Token Issuance & Refresh Rotation)
//!
//! `revolve` exchanges an identity lookup or a presented refresh token for a
//! fresh, short-lived access token plus a newly rotated refresh token.
//!
//! ## Rotation Model
//!
//! Every identity holds exactly one valid refresh token at a time. A rotation
//! mints a new pair and atomically swaps the stored refresh token using
//! compare-and-swap against the value that was read (or presented):
//!
//! - **Replay:** once rotated, the previous refresh token no longer matches any
//!   record and is rejected like any other unknown token.
//! - **Races:** two concurrent presentations of the same refresh token both reach
//!   the swap, but only one can match; the loser gets a stale-rotation error.
//!
//! The engine holds no in-process locks. Linearization of concurrent rotations
//! rests entirely on the atomicity of the directory's compare-and-swap.
//!
//! ## Tokens
//!
//! - **Access tokens** are HS256 JWTs carrying `sub`, `iat` and `exp`. They are
//!   verified by signature and expiry, never by storage lookup.
//! - **Refresh tokens** are 32 random bytes from the OS CSPRNG, base64url encoded.
//!   They share nothing with the access-token signing secret.

pub mod api;
pub mod cli;
pub mod directory;
pub mod identity;
pub mod rotation;
pub mod token;
pub mod vault;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
