//! Identifier codecs for hotel ads.
//!
//! Two kinds of public identifiers leave the service in URLs:
//!
//! - **Context tokens**: a context id encrypted and authenticated with a
//!   server-held key ([`ContextTokenCodec`]). Forged or corrupted tokens are
//!   rejected.
//! - **Bundle ids**: a `zipcode|hotel_id` pair, URL-safe base64 encoded
//!   ([`BundleId`]). This is an obfuscated composite key, not a security
//!   boundary.

mod bundle;
mod error;
mod ids;
mod token;
mod zipcode;

pub use bundle::BundleId;
pub use error::{CodecError, CodecResult};
pub use ids::{ContextId, HotelId};
pub use token::ContextTokenCodec;
pub use zipcode::Zipcode;
