//! Index reconciliation policies.
//!
//! Two policies run after provisioning:
//!
//! - [`ensure_text_index`] - full-text indexes with language-agnostic options,
//!   falling back to a plain text index on stores that reject them
//! - [`ensure_ttl`] - TTL indexes whose expiry drifted from configuration
//!
//! Live indexes are never altered in place: a mismatched index is dropped and
//! recreated.

mod text;
mod ttl;

pub use text::{TextIndexOutcome, ensure_text_index};
pub use ttl::{TtlOutcome, ensure_ttl};
