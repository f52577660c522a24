// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use jsonwebtoken::{EncodingKey, Header};
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use snowkey::{
	assertion::AssertionSigner,
	error::{Error, ExchangeError, KeyLoadError},
	http::ReqwestTransport,
	identity::QualifiedIdentity,
	key::{PassphraseProvider, PrivateKeyMaterial},
	manager::{HeaderProvider, KeypairTokenManager, PatTokenManager},
	session::Secret,
};

const PLAIN_PEM: &str = include_str!("fixtures/rsa_key.p8");

struct NoPassphrase;
impl PassphraseProvider for NoPassphrase {
	fn passphrase(&self) -> Result<String, KeyLoadError> {
		unreachable!("fixture key is unencrypted")
	}
}

fn mint_session(expires_at: OffsetDateTime) -> String {
	#[derive(serde::Serialize)]
	struct SessionClaims {
		exp: i64,
	}

	jsonwebtoken::encode(
		&Header::default(),
		&SessionClaims { exp: expires_at.unix_timestamp() },
		&EncodingKey::from_secret(b"mock-platform-secret"),
	)
	.expect("Mock session token should encode.")
}

fn mock_token_endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/oauth/token")).expect("Mock token endpoint should parse.")
}

#[tokio::test]
async fn pat_manager_exchanges_over_reqwest() {
	let server = MockServer::start_async().await;
	let token = mint_session(OffsetDateTime::now_utc() + Duration::minutes(30));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body(
				"grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Atoken-exchange\
				&scope=session%3Ascope%3AANALYST+h.example.com\
				&subject_token=pat-secret\
				&subject_token_type=programmatic_access_token",
			);
			then.status(200).body(&token);
		})
		.await;
	let manager = PatTokenManager::with_endpoints(
		mock_token_endpoint(&server),
		"h.example.com",
		Secret::new("pat-secret"),
		Some("analyst".into()),
		Arc::new(ReqwestTransport::default()),
	);
	let header = manager
		.authorization_header()
		.await
		.expect("PAT exchange over the reqwest transport should succeed.");

	assert_eq!(header, format!("Snowflake Token=\"{token}\""));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn keypair_manager_exchanges_over_reqwest() {
	let server = MockServer::start_async().await;
	let token = mint_session(OffsetDateTime::now_utc() + Duration::minutes(30));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).body(&token);
		})
		.await;
	let key =
		PrivateKeyMaterial::from_pem(PLAIN_PEM, &NoPassphrase).expect("Fixture key should load.");
	let signer =
		AssertionSigner::with_defaults(QualifiedIdentity::new("org-acct", "alice"), &key)
			.expect("Default signer configuration should be accepted.");
	let manager = KeypairTokenManager::with_endpoints(
		mock_token_endpoint(&server),
		"app.example.snowflakecomputing.app",
		signer,
		Arc::new(ReqwestTransport::default()),
	);
	let header = manager
		.authorization_header()
		.await
		.expect("Keypair exchange over the reqwest transport should succeed.");

	assert_eq!(header, format!("Snowflake Token=\"{token}\""));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_200_responses_surface_as_exchange_errors() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(400).body("{\"message\":\"unknown subject token\"}");
		})
		.await;
	let manager = PatTokenManager::with_endpoints(
		mock_token_endpoint(&server),
		"h.example.com",
		Secret::new("pat-secret"),
		None,
		Arc::new(ReqwestTransport::default()),
	);
	let err = manager
		.authorization_header()
		.await
		.expect_err("Non-200 responses must surface as exchange errors.");

	assert!(matches!(
		err,
		Error::Exchange(ExchangeError { status: 400, ref body })
			if body.contains("unknown subject token"),
	));

	mock.assert_calls_async(1).await;
}
