//! Lifecycle managers that turn long-lived credentials into `Authorization` headers on demand.
//!
//! Staleness is checked lazily on each access; there are no background timers. Each manager
//! serializes its read-check-refresh-write sequence behind an async mutex so concurrent callers
//! piggy-back on a single in-flight exchange instead of stampeding the token endpoint.

pub mod keypair;
pub mod pat;

pub use keypair::*;
pub use pat::*;

// self
use crate::{_prelude::*, session::Secret};

/// Name of the header every manager emits.
pub const AUTHORIZATION: &str = "Authorization";

/// Boxed future returned by [`HeaderProvider::authorization_header`].
pub type HeaderFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a + Send>>;

/// Capability exposed by both managers: produce the `Authorization` header value for the
/// current moment, refreshing stale credentials first.
pub trait HeaderProvider: Send + Sync {
	/// Returns the current `Authorization` header value.
	fn authorization_header(&self) -> HeaderFuture<'_>;
}

/// Formats a session token in the exact shape the SPCS ingress gateway requires; case and
/// quoting are part of the platform contract.
pub fn format_snowflake_header(token: &Secret) -> String {
	format!("Snowflake Token=\"{}\"", token.expose())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_values_match_the_platform_format_exactly() {
		let secret = Secret::new("abc.def.ghi");

		assert_eq!(format_snowflake_header(&secret), "Snowflake Token=\"abc.def.ghi\"");
	}
}
