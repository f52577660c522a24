//! Transport seam for the token-exchange POST.
//!
//! The managers never talk to an HTTP stack directly; they call [`ExchangeTransport`], which
//! performs a single form-encoded POST and reports the status and body text back. Timeouts and
//! retry policy, if any, belong to the implementation behind this trait.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ExchangeTransport::post_form`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Status and body text of a token-endpoint response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body text.
	pub body: String,
}

/// HTTP collaborator contract: one form-encoded POST, returning status + body.
pub trait ExchangeTransport: Send + Sync {
	/// Posts `form` (urlencoded) to `url` and collects the response.
	fn post_form<'a>(
		&'a self,
		url: &'a Url,
		form: &'a [(&'static str, String)],
	) -> TransportFuture<'a, FormResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl ExchangeTransport for ReqwestTransport {
	fn post_form<'a>(
		&'a self,
		url: &'a Url,
		form: &'a [(&'static str, String)],
	) -> TransportFuture<'a, FormResponse> {
		Box::pin(async move {
			let response = self
				.0
				.post(url.clone())
				.form(form)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(FormResponse { status, body })
		})
	}
}
