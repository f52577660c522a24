//! Wire contract for the `/oauth/token` exchange.
//!
//! Both credential paths POST a form-encoded grant to the account's token endpoint. An HTTP 200
//! response body *is* the session token string; anything else is a fatal [`ExchangeError`]
//! carrying the upstream body for diagnosis.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, ExchangeError},
	http::ExchangeTransport,
	identity,
	session::SessionToken,
};

/// Path of the token-exchange endpoint relative to the account host.
pub const TOKEN_EXCHANGE_PATH: &str = "/oauth/token";
/// `grant_type` for exchanging a signed keypair assertion.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// `grant_type` for exchanging a programmatic access token.
pub const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
/// `subject_token_type` accompanying a PAT exchange.
pub const PAT_SUBJECT_TOKEN_TYPE: &str = "programmatic_access_token";

/// Builds the token-endpoint URL for an account; underscores in the account URL become hyphens
/// before it is used as a hostname.
pub fn token_endpoint(account_url: &str) -> Result<Url, ConfigError> {
	let host = identity::normalize_account_host(account_url);

	Url::parse(&format!("https://{host}{TOKEN_EXCHANGE_PATH}"))
		.map_err(|source| ConfigError::InvalidAccountUrl { value: account_url.into(), source })
}

/// Form body for the `jwt-bearer` grant: a signed assertion scoped to the endpoint host.
pub fn jwt_bearer_form(endpoint_host: &str, assertion: &str) -> Vec<(&'static str, String)> {
	vec![
		("grant_type", JWT_BEARER_GRANT.into()),
		("scope", endpoint_host.into()),
		("assertion", assertion.into()),
	]
}

/// Form body for the `token-exchange` grant: a PAT scoped to the endpoint host and optional role.
pub fn pat_exchange_form(
	endpoint_host: &str,
	role: Option<&str>,
	pat: &str,
) -> Vec<(&'static str, String)> {
	vec![
		("grant_type", TOKEN_EXCHANGE_GRANT.into()),
		("scope", pat_scope(endpoint_host, role)),
		("subject_token", pat.into()),
		("subject_token_type", PAT_SUBJECT_TOKEN_TYPE.into()),
	]
}

/// Scope parameter for a PAT exchange: `session:scope:{ROLE} {host}` when a role is configured
/// (role uppercased), otherwise just the host.
pub fn pat_scope(endpoint_host: &str, role: Option<&str>) -> String {
	match role {
		Some(role) => format!("session:scope:{} {endpoint_host}", role.to_uppercase()),
		None => endpoint_host.to_owned(),
	}
}

/// Performs one exchange call and wraps the returned body as a [`SessionToken`].
///
/// Never retried here; a non-200 response surfaces verbatim and leaves the caller's cache
/// untouched.
pub async fn exchange_session_token(
	transport: &dyn ExchangeTransport,
	token_endpoint: &Url,
	form: &[(&'static str, String)],
) -> Result<SessionToken> {
	tracing::info!(endpoint = %token_endpoint, "exchanging credential for a session token");

	let response = transport.post_form(token_endpoint, form).await?;

	if response.status != 200 {
		return Err(ExchangeError { status: response.status, body: response.body }.into());
	}

	let session = SessionToken::from_exchange(response.body)?;

	tracing::debug!(expires_at = %session.expires_at(), "session token refreshed");

	Ok(session)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_endpoints_normalize_account_hosts() {
		let url = token_endpoint("org_acct.snowflakecomputing.com")
			.expect("Account URL fixture should form a token endpoint.");

		assert_eq!(url.as_str(), "https://org-acct.snowflakecomputing.com/oauth/token");
	}

	#[test]
	fn jwt_bearer_forms_carry_grant_scope_and_assertion() {
		let form = jwt_bearer_form("app.example.snowflakecomputing.app", "header.payload.sig");

		assert_eq!(
			form,
			vec![
				("grant_type", JWT_BEARER_GRANT.to_owned()),
				("scope", "app.example.snowflakecomputing.app".to_owned()),
				("assertion", "header.payload.sig".to_owned()),
			],
		);
	}

	#[test]
	fn pat_scopes_prepend_the_uppercased_role() {
		assert_eq!(
			pat_scope("h.example.com", Some("analyst")),
			"session:scope:ANALYST h.example.com"
		);
		assert_eq!(pat_scope("h.example.com", None), "h.example.com");
	}

	#[test]
	fn pat_forms_carry_the_subject_token_fields() {
		let form = pat_exchange_form("h.example.com", Some("ANALYST"), "pat-value");

		assert_eq!(
			form,
			vec![
				("grant_type", TOKEN_EXCHANGE_GRANT.to_owned()),
				("scope", "session:scope:ANALYST h.example.com".to_owned()),
				("subject_token", "pat-value".to_owned()),
				("subject_token_type", PAT_SUBJECT_TOKEN_TYPE.to_owned()),
			],
		);
	}
}
