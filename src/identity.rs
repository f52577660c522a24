//! Account and user identity normalization for assertion claims.
//!
//! The platform verifies the assertion signature against `ACCOUNT.USER`, where the account
//! identifier must not include the subdomain or any region or cloud-provider information. The
//! helpers here apply that normalization consistently so the issuer/subject claims always match
//! what the platform expects.

// self
use crate::{_prelude::*, error::ConfigError};

/// Marker found in replicated account identifiers, which truncate at the first hyphen instead of
/// the first period.
const REPLICATION_MARKER: &str = ".global";

/// Normalizes a raw account identifier for use inside assertion claims.
///
/// Replicated identifiers (containing `.global`) truncate at the first hyphen; all other
/// identifiers truncate at the first period. The result is uppercased.
pub fn prepare_account_identifier(raw: &str) -> String {
	let truncate_at = if raw.contains(REPLICATION_MARKER) { '-' } else { '.' };
	let account = match raw.find(truncate_at) {
		Some(idx) if idx > 0 => &raw[..idx],
		_ => raw,
	};

	account.to_uppercase()
}

/// Normalizes an account URL for use as a hostname; underscores become hyphens.
pub fn normalize_account_host(raw: &str) -> String {
	raw.replace('_', "-")
}

/// Extracts the hostname of an SPCS request URL for use as the exchange scope.
pub fn endpoint_host(endpoint: &str) -> Result<String, ConfigError> {
	let url = Url::parse(endpoint)
		.map_err(|source| ConfigError::InvalidEndpoint { value: endpoint.into(), source })?;

	url.host_str()
		.map(str::to_owned)
		.ok_or_else(|| ConfigError::EndpointMissingHost { value: endpoint.into() })
}

/// Normalized account + user pair used as the subject of signed assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedIdentity {
	account: String,
	user: String,
}
impl QualifiedIdentity {
	/// Builds an identity from a raw account identifier (or account URL) and username.
	pub fn new(account: impl AsRef<str>, user: impl AsRef<str>) -> Self {
		Self {
			account: prepare_account_identifier(account.as_ref()),
			user: user.as_ref().to_uppercase(),
		}
	}

	/// Returns the normalized account identifier.
	pub fn account(&self) -> &str {
		&self.account
	}

	/// Returns the uppercased username.
	pub fn user(&self) -> &str {
		&self.user
	}

	/// Returns the fully qualified `ACCOUNT.USER` subject string.
	pub fn qualified_username(&self) -> String {
		format!("{}.{}", self.account, self.user)
	}
}
