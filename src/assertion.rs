//! Time-boxed RS256 bearer assertions with renew-before-expiry caching.
//!
//! The signer keeps the encoded assertion and only recomputes it once the renewal delay has
//! elapsed, so repeated calls inside the renewal window are pure cache reads. The renewal delay
//! is deliberately shorter than the assertion lifetime, which guarantees a renewal always
//! happens before the previous assertion expires.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, SigningError},
	identity::QualifiedIdentity,
	key::PrivateKeyMaterial,
};

/// Default assertion lifetime.
pub const DEFAULT_LIFETIME: Duration = Duration::minutes(59);
/// Default renewal delay; assertions are recomputed once this much time has passed.
pub const DEFAULT_RENEWAL_DELAY: Duration = Duration::minutes(54);

/// Claim set carried by a signed assertion.
///
/// The issuer is the fully qualified username concatenated with the public-key fingerprint; the
/// subject is the fully qualified username alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issuer: `ACCOUNT.USER.SHA256:<fingerprint>`.
	pub iss: String,
	/// Subject: `ACCOUNT.USER`.
	pub sub: String,
	/// Issued-at instant as a unix timestamp.
	pub iat: i64,
	/// Expiry instant as a unix timestamp; always `iat` plus the configured lifetime.
	pub exp: i64,
}

/// Builds and caches signed time-boxed assertions for one identity + key pair.
pub struct AssertionSigner {
	identity: QualifiedIdentity,
	signing_key: EncodingKey,
	fingerprint: String,
	lifetime: Duration,
	renewal_delay: Duration,
	cached: Option<String>,
	next_renewal: Option<OffsetDateTime>,
}
impl AssertionSigner {
	/// Creates a signer with explicit lifetime and renewal delay.
	///
	/// Rejects configurations where the renewal delay is not shorter than the lifetime.
	pub fn new(
		identity: QualifiedIdentity,
		key: &PrivateKeyMaterial,
		lifetime: Duration,
		renewal_delay: Duration,
	) -> Result<Self> {
		if renewal_delay >= lifetime {
			return Err(ConfigError::RenewalExceedsLifetime { lifetime, renewal_delay }.into());
		}

		Ok(Self {
			identity,
			signing_key: key.signing_key()?,
			fingerprint: key.fingerprint()?,
			lifetime,
			renewal_delay,
			cached: None,
			next_renewal: None,
		})
	}

	/// Creates a signer with the default 59-minute lifetime and 54-minute renewal delay.
	pub fn with_defaults(identity: QualifiedIdentity, key: &PrivateKeyMaterial) -> Result<Self> {
		Self::new(identity, key, DEFAULT_LIFETIME, DEFAULT_RENEWAL_DELAY)
	}

	/// Returns the current encoded assertion, signing a fresh one when stale.
	pub fn sign(&mut self) -> Result<String> {
		self.sign_at(OffsetDateTime::now_utc())
	}

	/// Returns the encoded assertion as of `now`.
	///
	/// A cache hit returns the previously signed string byte-for-byte with no side effect; a
	/// stale or absent cache triggers a fresh signature with `iat = now` and `exp = now +
	/// lifetime`, and pushes the next renewal out to `now + renewal_delay`.
	pub fn sign_at(&mut self, now: OffsetDateTime) -> Result<String> {
		if let (Some(cached), Some(deadline)) = (self.cached.as_ref(), self.next_renewal)
			&& now < deadline
		{
			return Ok(cached.clone());
		}

		let qualified_username = self.identity.qualified_username();
		let claims = AssertionClaims {
			iss: format!("{qualified_username}.{}", self.fingerprint),
			sub: qualified_username,
			iat: now.unix_timestamp(),
			exp: (now + self.lifetime).unix_timestamp(),
		};

		tracing::debug!(
			issuer = %claims.iss,
			expires_at = claims.exp,
			"signing a fresh bearer assertion",
		);

		let encoded = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
			.map_err(SigningError)?;

		self.next_renewal = Some(now + self.renewal_delay);
		self.cached = Some(encoded.clone());

		Ok(encoded)
	}

	/// Returns the public-key fingerprint baked into the issuer claim.
	pub fn fingerprint(&self) -> &str {
		&self.fingerprint
	}

	/// Returns the instant at which the next call will recompute the assertion, if one has been
	/// signed already.
	pub fn next_renewal(&self) -> Option<OffsetDateTime> {
		self.next_renewal
	}
}
impl Debug for AssertionSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssertionSigner")
			.field("identity", &self.identity)
			.field("fingerprint", &self.fingerprint)
			.field("lifetime", &self.lifetime)
			.field("renewal_delay", &self.renewal_delay)
			.field("next_renewal", &self.next_renewal)
			.finish()
	}
}
