//! Snowflake SPCS session-token lifecycle managers: sign keypair JWT assertions or exchange
//! programmatic access tokens for short-lived ingress credentials, refreshing each credential
//! layer only when it goes stale.
//!
//! Two managers share one contract: produce a valid `Authorization` header value on demand.
//! [`manager::KeypairTokenManager`] signs a time-boxed RS256 assertion and exchanges it through
//! the `jwt-bearer` grant; [`manager::PatTokenManager`] exchanges a long-lived programmatic
//! access token through the `token-exchange` grant. Both derive the session token's renewal
//! deadline from the expiry claim embedded in the exchanged token itself.

#![deny(clippy::all, missing_docs)]

pub mod assertion;
pub mod error;
pub mod exchange;
pub mod http;
pub mod identity;
pub mod key;
pub mod manager;
pub mod session;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
