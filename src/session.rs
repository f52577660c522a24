//! Session-token model, redacted secrets, and unverified expiry-claim decoding.

// self
use crate::{_prelude::*, error::ClaimDecodeError};

/// Redacting wrapper keeping bearer material out of logs and debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
	exp: Option<i64>,
}

/// Short-lived opaque bearer credential returned by the exchange endpoint.
///
/// The renewal deadline is whatever expiry the platform stamped into the token itself, not a
/// locally configured interval.
#[derive(Clone, Debug)]
pub struct SessionToken {
	secret: Secret,
	expires_at: OffsetDateTime,
}
impl SessionToken {
	/// Wraps a raw exchange-response body, deriving the renewal deadline from its `exp` claim.
	///
	/// The claim is read without signature verification: the response arrived over an
	/// authenticated TLS channel from the server that minted it, and the platform's verification
	/// key is not available client-side.
	pub fn from_exchange(body: impl Into<String>) -> Result<Self, ClaimDecodeError> {
		let body = body.into();
		let expires_at = decode_expiry(&body)?;

		Ok(Self { secret: Secret::new(body), expires_at })
	}

	/// Returns the bearer secret.
	pub fn secret(&self) -> &Secret {
		&self.secret
	}

	/// Returns the server-assigned expiry instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// A token is stale once the current instant reaches its server-assigned expiry.
	pub fn is_stale_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Decodes the `exp` claim of a JWT without verifying its signature.
pub fn decode_expiry(token: &str) -> Result<OffsetDateTime, ClaimDecodeError> {
	let data = jsonwebtoken::dangerous::insecure_decode::<ExpiryClaim>(token)
		.map_err(|source| ClaimDecodeError::Malformed { source })?;
	let exp = data.claims.exp.ok_or(ClaimDecodeError::MissingExpiry)?;

	OffsetDateTime::from_unix_timestamp(exp).map_err(|_| ClaimDecodeError::ExpiryOutOfRange)
}
