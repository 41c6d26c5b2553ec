//! Signing key material for the Meridian ledger client SDK.
//!
//! The execution engine consumes signing as an opaque capability: anything
//! implementing [`Signer`] can authorize a request. This crate supplies the
//! Ed25519 implementation used on the network.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod ed25519;
mod error;
mod signer;

pub use ed25519::{PrivateKey, PublicKey, Signature};
pub use error::CryptoError;
pub use signer::Signer;
