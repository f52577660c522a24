//! Keypair-backed manager: signed assertion, `jwt-bearer` exchange, session cache.

// self
use crate::{
	_prelude::*,
	assertion::AssertionSigner,
	exchange,
	http::ExchangeTransport,
	identity,
	manager::{HeaderFuture, HeaderProvider, format_snowflake_header},
	session::SessionToken,
};

struct KeypairState {
	signer: AssertionSigner,
	session: Option<SessionToken>,
}

/// Lazily signs a bearer assertion and exchanges it for a cached session token.
///
/// The assertion renews on its own configured clock while the session token renews on the
/// expiry the platform stamped into it; the two deadlines are independent state and drift apart
/// in practice.
pub struct KeypairTokenManager {
	token_endpoint: Url,
	endpoint_host: String,
	transport: Arc<dyn ExchangeTransport>,
	state: AsyncMutex<KeypairState>,
}
impl KeypairTokenManager {
	/// Creates a manager for the account's token endpoint and the SPCS request URL the session
	/// token should be scoped to.
	pub fn new(
		account_url: &str,
		endpoint: &str,
		signer: AssertionSigner,
		transport: Arc<dyn ExchangeTransport>,
	) -> Result<Self> {
		Ok(Self::with_endpoints(
			exchange::token_endpoint(account_url)?,
			identity::endpoint_host(endpoint)?,
			signer,
			transport,
		))
	}

	/// Creates a manager against an explicit token endpoint; the seam used by tests and callers
	/// that resolve URLs themselves.
	pub fn with_endpoints(
		token_endpoint: Url,
		endpoint_host: impl Into<String>,
		signer: AssertionSigner,
		transport: Arc<dyn ExchangeTransport>,
	) -> Self {
		Self {
			token_endpoint,
			endpoint_host: endpoint_host.into(),
			transport,
			state: AsyncMutex::new(KeypairState { signer, session: None }),
		}
	}

	/// Returns the current `Authorization` header value.
	pub async fn header_value(&self) -> Result<String> {
		self.header_value_at(OffsetDateTime::now_utc()).await
	}

	/// Returns the `Authorization` header value as of `now`, refreshing whichever credential
	/// layers have gone stale.
	pub async fn header_value_at(&self, now: OffsetDateTime) -> Result<String> {
		let mut state = self.state.lock().await;
		// The signer handles its own staleness; a fresh session token does not keep the
		// assertion alive past its renewal delay.
		let assertion = state.signer.sign_at(now)?;

		if let Some(session) = state.session.as_ref().filter(|session| !session.is_stale_at(now))
		{
			return Ok(format_snowflake_header(session.secret()));
		}

		tracing::debug!(scope = %self.endpoint_host, "session token absent or stale");

		let form = exchange::jwt_bearer_form(&self.endpoint_host, &assertion);
		let session = exchange::exchange_session_token(
			self.transport.as_ref(),
			&self.token_endpoint,
			&form,
		)
		.await?;
		let header = format_snowflake_header(session.secret());

		state.session = Some(session);

		Ok(header)
	}
}
impl HeaderProvider for KeypairTokenManager {
	fn authorization_header(&self) -> HeaderFuture<'_> {
		Box::pin(self.header_value())
	}
}
impl Debug for KeypairTokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeypairTokenManager")
			.field("token_endpoint", &self.token_endpoint)
			.field("endpoint_host", &self.endpoint_host)
			.finish()
	}
}
