//! RSA private-key material, passphrase resolution, and public-key fingerprints.

// std
use std::{fs, path::Path};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::EncodingKey;
use rsa::{
	RsaPrivateKey,
	pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding},
	pkcs8::{DecodePrivateKey, EncodePublicKey},
};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::KeyLoadError};

/// Tag prepended to every public-key fingerprint.
pub const FINGERPRINT_PREFIX: &str = "SHA256:";

const ENCRYPTED_PEM_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Pluggable passphrase resolution for encrypted private keys.
///
/// The provider is consulted only when the PEM payload is actually encrypted, so tests and
/// scripted callers can supply a fixed value while interactive callers prompt the terminal.
pub trait PassphraseProvider: Send + Sync {
	/// Resolves the passphrase protecting the private key.
	fn passphrase(&self) -> Result<String, KeyLoadError>;
}

/// Fixed passphrase supplied up front (CLI flag, environment, tests).
#[derive(Clone)]
pub struct StaticPassphrase(String);
impl StaticPassphrase {
	/// Wraps a known passphrase value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}
}
impl PassphraseProvider for StaticPassphrase {
	fn passphrase(&self) -> Result<String, KeyLoadError> {
		Ok(self.0.clone())
	}
}
impl Debug for StaticPassphrase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("StaticPassphrase").field(&"<redacted>").finish()
	}
}

/// Interactive passphrase prompt on the controlling terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompt;
impl PassphraseProvider for TerminalPrompt {
	fn passphrase(&self) -> Result<String, KeyLoadError> {
		rpassword::prompt_password("Passphrase for private key: ")
			.map_err(|e| KeyLoadError::Passphrase { message: e.to_string() })
	}
}

/// Parsed RSA private key plus the derived artifacts the signer needs.
///
/// The key is immutable for the lifetime of a manager, so the fingerprint and signing key are
/// deterministic and may be derived once.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
	key: RsaPrivateKey,
}
impl PrivateKeyMaterial {
	/// Parses a PEM private key, decrypting it through `passphrase` when the payload is an
	/// encrypted PKCS#8 document. Unencrypted PKCS#8 and PKCS#1 documents load without touching
	/// the provider.
	pub fn from_pem(pem: &str, passphrase: &dyn PassphraseProvider) -> Result<Self, KeyLoadError> {
		let key = if pem.contains(ENCRYPTED_PEM_LABEL) {
			let secret = passphrase.passphrase()?;

			RsaPrivateKey::from_pkcs8_encrypted_pem(pem, secret.as_bytes())
				.map_err(|source| KeyLoadError::Decrypt { source })?
		} else {
			match RsaPrivateKey::from_pkcs8_pem(pem) {
				Ok(key) => key,
				Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem)
					.map_err(|_| KeyLoadError::Malformed { message: pkcs8_err.to_string() })?,
			}
		};

		Ok(Self { key })
	}

	/// Reads and parses a PEM private key file.
	pub fn from_pem_file(
		path: impl AsRef<Path>,
		passphrase: &dyn PassphraseProvider,
	) -> Result<Self, KeyLoadError> {
		let path = path.as_ref();
		let pem = fs::read_to_string(path).map_err(|source| KeyLoadError::Io {
			path: path.display().to_string(),
			source,
		})?;

		Self::from_pem(&pem, passphrase)
	}

	/// Computes the public-key fingerprint: `SHA256:` plus the base64-encoded SHA-256 digest of
	/// the DER-encoded SubjectPublicKeyInfo.
	pub fn fingerprint(&self) -> Result<String, KeyLoadError> {
		let spki = self
			.key
			.to_public_key()
			.to_public_key_der()
			.map_err(|e| KeyLoadError::Malformed { message: e.to_string() })?;
		let digest = Sha256::digest(spki.as_bytes());

		Ok(format!("{FINGERPRINT_PREFIX}{}", STANDARD.encode(digest)))
	}

	/// Derives the RS256 signing key for the JWT backend.
	pub fn signing_key(&self) -> Result<EncodingKey, KeyLoadError> {
		let pem = self
			.key
			.to_pkcs1_pem(LineEnding::LF)
			.map_err(|source| KeyLoadError::Encode { source })?;

		EncodingKey::from_rsa_pem(pem.as_bytes())
			.map_err(|e| KeyLoadError::Malformed { message: e.to_string() })
	}
}
impl Debug for PrivateKeyMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PrivateKeyMaterial").field("key", &"<redacted>").finish()
	}
}
