//! PAT-backed manager: static programmatic token, `token-exchange` grant, session cache.

// std
use std::{fs, path::Path};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	exchange,
	http::ExchangeTransport,
	identity,
	manager::{HeaderFuture, HeaderProvider, format_snowflake_header},
	session::{Secret, SessionToken},
};

/// Exchanges a long-lived programmatic access token for cached session tokens.
///
/// Same shape as the keypair manager minus the assertion step: the upstream credential is a
/// static string supplied at construction, and only the session-token layer ever refreshes.
pub struct PatTokenManager {
	token_endpoint: Url,
	endpoint_host: String,
	role: Option<String>,
	pat: Secret,
	transport: Arc<dyn ExchangeTransport>,
	session: AsyncMutex<Option<SessionToken>>,
}
impl PatTokenManager {
	/// Creates a manager for the account's token endpoint and the SPCS request URL the session
	/// token should be scoped to.
	pub fn new(
		account_url: &str,
		endpoint: &str,
		pat: Secret,
		role: Option<String>,
		transport: Arc<dyn ExchangeTransport>,
	) -> Result<Self> {
		Ok(Self::with_endpoints(
			exchange::token_endpoint(account_url)?,
			identity::endpoint_host(endpoint)?,
			pat,
			role,
			transport,
		))
	}

	/// Creates a manager against an explicit token endpoint; the seam used by tests and callers
	/// that resolve URLs themselves.
	pub fn with_endpoints(
		token_endpoint: Url,
		endpoint_host: impl Into<String>,
		pat: Secret,
		role: Option<String>,
		transport: Arc<dyn ExchangeTransport>,
	) -> Self {
		Self {
			token_endpoint,
			endpoint_host: endpoint_host.into(),
			role,
			pat,
			transport,
			session: AsyncMutex::new(None),
		}
	}

	/// Returns the current `Authorization` header value.
	pub async fn header_value(&self) -> Result<String> {
		self.header_value_at(OffsetDateTime::now_utc()).await
	}

	/// Returns the `Authorization` header value as of `now`, exchanging the PAT again only when
	/// the cached session token has reached its server-assigned expiry.
	pub async fn header_value_at(&self, now: OffsetDateTime) -> Result<String> {
		let mut cache = self.session.lock().await;

		if let Some(session) = cache.as_ref().filter(|session| !session.is_stale_at(now)) {
			return Ok(format_snowflake_header(session.secret()));
		}

		tracing::debug!(scope = %self.endpoint_host, "session token absent or stale");

		let form = exchange::pat_exchange_form(
			&self.endpoint_host,
			self.role.as_deref(),
			self.pat.expose(),
		);
		let session = exchange::exchange_session_token(
			self.transport.as_ref(),
			&self.token_endpoint,
			&form,
		)
		.await?;
		let header = format_snowflake_header(session.secret());

		*cache = Some(session);

		Ok(header)
	}
}
impl HeaderProvider for PatTokenManager {
	fn authorization_header(&self) -> HeaderFuture<'_> {
		Box::pin(self.header_value())
	}
}
impl Debug for PatTokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PatTokenManager")
			.field("token_endpoint", &self.token_endpoint)
			.field("endpoint_host", &self.endpoint_host)
			.field("role", &self.role)
			.finish()
	}
}

/// Resolves a PAT argument: the contents of the file it names when such a file exists,
/// otherwise the value itself. File contents are trimmed of surrounding whitespace.
pub fn resolve_pat(value: &str) -> Result<Secret, ConfigError> {
	let path = Path::new(value);

	if path.is_file() {
		let text = fs::read_to_string(path).map_err(|source| ConfigError::UnreadablePat {
			path: path.display().to_string(),
			source,
		})?;
		let trimmed = text.trim();

		if trimmed.is_empty() {
			return Err(ConfigError::MissingPat);
		}

		return Ok(Secret::new(trimmed));
	}
	if value.is_empty() {
		return Err(ConfigError::MissingPat);
	}

	Ok(Secret::new(value))
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, fs};
	// self
	use super::*;

	#[test]
	fn literal_pats_pass_through() {
		let pat = resolve_pat("eyJraWQ...").expect("Literal PAT should resolve.");

		assert_eq!(pat.expose(), "eyJraWQ...");
	}

	#[test]
	fn pat_files_are_read_and_trimmed() {
		let path = env::temp_dir().join("snowkey-pat-resolve-test.txt");

		fs::write(&path, "file-pat-value\n").expect("Temp PAT file should be writable.");

		let pat = resolve_pat(&path.display().to_string()).expect("PAT file should resolve.");

		assert_eq!(pat.expose(), "file-pat-value");

		fs::remove_file(&path).expect("Temp PAT file should be removable.");
	}

	#[test]
	fn empty_values_are_rejected() {
		assert!(matches!(resolve_pat(""), Err(ConfigError::MissingPat)));
	}

	#[test]
	fn unreadable_pat_files_keep_their_io_cause() {
		let path = env::temp_dir().join("snowkey-pat-unreadable-test.txt");

		// Not valid UTF-8, so the read itself fails rather than the file being absent.
		fs::write(&path, [0xFF, 0xFE, 0xFD]).expect("Temp PAT file should be writable.");

		let err = resolve_pat(&path.display().to_string())
			.expect_err("An unreadable PAT file must fail with its IO cause.");

		assert!(matches!(err, ConfigError::UnreadablePat { .. }));

		fs::remove_file(&path).expect("Temp PAT file should be removable.");
	}
}
