//! Error taxonomy shared by the signers, managers, and the transport seam.
//!
//! Every variant is fatal to the operation that produced it; nothing is retried internally and
//! nothing is swallowed. Retry policy, if any, belongs to the transport collaborator or the
//! caller.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error surfaced by the lifecycle managers.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Private-key material could not be read or decrypted.
	#[error(transparent)]
	KeyLoad(#[from] KeyLoadError),
	/// The RS256 signing operation failed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// The token-exchange endpoint rejected the request.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// The exchanged session token could not be parsed for its expiry claim.
	#[error(transparent)]
	ClaimDecode(#[from] ClaimDecodeError),
	/// Local configuration problem, detected before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) reported by the HTTP collaborator.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Failures while loading, decrypting, or re-encoding private-key material.
#[derive(Debug, ThisError)]
pub enum KeyLoadError {
	/// The key file could not be read.
	#[error("Unable to read private key file `{path}`.")]
	Io {
		/// Path supplied by the caller.
		path: String,
		/// Underlying filesystem failure.
		#[source]
		source: std::io::Error,
	},
	/// The PEM payload is not a supported RSA private key.
	#[error("Private key PEM is malformed or unsupported: {message}.")]
	Malformed {
		/// Parser failure summary.
		message: String,
	},
	/// The encrypted key could not be decrypted.
	#[error("Private key could not be decrypted; wrong or missing passphrase.")]
	Decrypt {
		/// Underlying PKCS#8 decryption failure.
		#[source]
		source: rsa::pkcs8::Error,
	},
	/// A passphrase was required but could not be resolved.
	#[error("Passphrase could not be resolved: {message}.")]
	Passphrase {
		/// Resolver failure summary.
		message: String,
	},
	/// The parsed key could not be re-encoded for the signing backend.
	#[error("Private key could not be re-encoded for signing.")]
	Encode {
		/// Underlying PKCS#1 encoding failure.
		#[source]
		source: rsa::pkcs1::Error,
	},
}

/// The RS256 signing operation itself failed; should not occur for valid keys.
#[derive(Debug, ThisError)]
#[error("Failed to sign the bearer assertion.")]
pub struct SigningError(#[source] pub jsonwebtoken::errors::Error);

/// Non-200 response from the token-exchange endpoint.
///
/// The upstream body is carried verbatim for diagnosis; the cached session token is never
/// updated when this error is raised.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token exchange failed with HTTP {status}: {body}")]
pub struct ExchangeError {
	/// HTTP status code returned by the endpoint.
	pub status: u16,
	/// Response body returned by the endpoint.
	pub body: String,
}

/// The exchanged session token could not be decoded for its expiry claim.
#[derive(Debug, ThisError)]
pub enum ClaimDecodeError {
	/// The token is not a decodable JWT.
	#[error("Session token is not a decodable JWT.")]
	Malformed {
		/// Underlying decoder failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// The token payload carries no `exp` claim.
	#[error("Session token payload is missing the exp claim.")]
	MissingExpiry,
	/// The `exp` claim is outside the representable timestamp range.
	#[error("Session token expiry claim is outside the representable range.")]
	ExpiryOutOfRange,
}

/// Configuration and argument-combination failures raised before any network call.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The account URL cannot form a valid token-endpoint URL.
	#[error("Account URL `{value}` cannot form a valid token endpoint.")]
	InvalidAccountUrl {
		/// Account URL supplied by the caller.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The SPCS endpoint URL cannot be parsed.
	#[error("Endpoint URL `{value}` cannot be parsed.")]
	InvalidEndpoint {
		/// Endpoint URL supplied by the caller.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The SPCS endpoint URL has no hostname component.
	#[error("Endpoint URL `{value}` has no hostname.")]
	EndpointMissingHost {
		/// Endpoint URL supplied by the caller.
		value: String,
	},
	/// The renewal delay must stay shorter than the assertion lifetime, otherwise a renewal
	/// could present an already-expired assertion.
	#[error("Renewal delay ({renewal_delay}) must be shorter than the assertion lifetime ({lifetime}).")]
	RenewalExceedsLifetime {
		/// Configured assertion lifetime.
		lifetime: Duration,
		/// Configured renewal delay.
		renewal_delay: Duration,
	},
	/// A private key was supplied without the username it belongs to.
	#[error("A private key requires the Snowflake user it belongs to.")]
	MissingUser,
	/// Both credential kinds were supplied; there is no precedence order between them.
	#[error("Both a programmatic access token and a private key were supplied; pick one credential source.")]
	ConflictingCredentials,
	/// No programmatic access token could be resolved.
	#[error("No programmatic access token was found.")]
	MissingPat,
	/// The PAT file exists but its contents could not be read.
	#[error("PAT file `{path}` could not be read.")]
	UnreadablePat {
		/// Path supplied by the caller.
		path: String,
		/// Underlying filesystem failure.
		#[source]
		source: std::io::Error,
	},
}

/// Transport-level failures (network, IO) from the HTTP collaborator.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn exchange_error_displays_status_and_body() {
		let err = ExchangeError { status: 401, body: "{\"message\":\"invalid assertion\"}".into() };

		assert_eq!(
			err.to_string(),
			"Token exchange failed with HTTP 401: {\"message\":\"invalid assertion\"}"
		);
	}

	#[test]
	fn config_errors_convert_into_the_canonical_error() {
		let err: Error = ConfigError::MissingUser.into();

		assert!(matches!(err, Error::Config(ConfigError::MissingUser)));
		assert_eq!(err.to_string(), "A private key requires the Snowflake user it belongs to.");
	}
}
