//! `snowkey` CLI: authenticate an SPCS request with a keypair or PAT credential and print the
//! JSON response.

// std
use std::{error::Error as StdError, fs, path::PathBuf, process::ExitCode, sync::Arc};
// crates.io
use clap::Parser;
use time::Duration;
use tracing_subscriber::EnvFilter;
// self
use snowkey::{
	assertion::AssertionSigner,
	error::ConfigError,
	http::ReqwestTransport,
	identity::QualifiedIdentity,
	key::{PassphraseProvider, PrivateKeyMaterial, StaticPassphrase, TerminalPrompt},
	manager::{AUTHORIZATION, HeaderProvider, KeypairTokenManager, PatTokenManager, resolve_pat},
	reqwest::Method,
};

const PAT_FILE_SUFFIX: &str = "-token-secret.txt";

#[derive(Debug, Parser)]
#[command(name = "snowkey", version, about = "Authenticate SPCS ingress requests with a Snowflake keypair or PAT.")]
struct Cli {
	/// Account URL in the form <ORGNAME>-<ACCTNAME>.snowflakecomputing.com.
	#[arg(long)]
	account_url: String,
	/// SPCS request URL, including the scheme.
	#[arg(long)]
	url: String,
	/// HTTP method for the request.
	#[arg(long, default_value = "GET")]
	method: String,
	/// JSON payload for the request body.
	#[arg(long)]
	data: Option<String>,
	/// Snowflake role to use when exchanging a PAT.
	#[arg(long)]
	role: Option<String>,
	/// Snowflake user associated with the private key.
	#[arg(long)]
	user: Option<String>,
	/// Assertion lifetime in minutes.
	#[arg(long, default_value_t = 59, value_parser = clap::value_parser!(i64).range(1..=1440))]
	lifetime: i64,
	/// Minutes after which the assertion is renewed.
	#[arg(long, default_value_t = 54, value_parser = clap::value_parser!(i64).range(1..=1440))]
	renewal_delay: i64,
	/// Passphrase for an encrypted private key (prompted when omitted).
	#[arg(long)]
	passphrase: Option<String>,
	/// Private key file.
	#[arg(long, conflicts_with_all = ["pat", "patfile"])]
	keyfile: Option<PathBuf>,
	/// File holding a programmatic access token.
	#[arg(long, conflicts_with = "pat")]
	patfile: Option<PathBuf>,
	/// Programmatic access token value.
	#[arg(long)]
	pat: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	match run(Cli::parse()).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("error: {e}");

			ExitCode::FAILURE
		},
	}
}

async fn run(cli: Cli) -> Result<(), Box<dyn StdError>> {
	let transport = Arc::new(ReqwestTransport::default());
	let provider = build_provider(&cli, transport.clone())?;
	let header = provider.authorization_header().await?;
	let method = Method::from_bytes(cli.method.to_uppercase().as_bytes())?;
	let client: &snowkey::reqwest::Client = transport.as_ref().as_ref();
	let mut request = client.request(method, &cli.url).header(AUTHORIZATION, header);

	if let Some(data) = &cli.data {
		let payload: serde_json::Value = serde_json::from_str(data)?;

		request = request.json(&payload);
	}

	let response = request.send().await?;
	let body: serde_json::Value = response.json().await?;

	println!("{}", serde_json::to_string_pretty(&body)?);

	Ok(())
}

fn build_provider(
	cli: &Cli,
	transport: Arc<ReqwestTransport>,
) -> Result<Arc<dyn HeaderProvider>, snowkey::error::Error> {
	// clap already rejects this combination; keep the check here so the rule holds for callers
	// that bypass argument parsing.
	if cli.keyfile.is_some() && (cli.pat.is_some() || cli.patfile.is_some()) {
		return Err(ConfigError::ConflictingCredentials.into());
	}
	if let Some(keyfile) = &cli.keyfile {
		let user = cli.user.as_deref().ok_or(ConfigError::MissingUser)?;
		let passphrase: Box<dyn PassphraseProvider> = match &cli.passphrase {
			Some(value) => Box::new(StaticPassphrase::new(value)),
			None => Box::new(TerminalPrompt),
		};
		let key = PrivateKeyMaterial::from_pem_file(keyfile, passphrase.as_ref())?;
		let signer = AssertionSigner::new(
			QualifiedIdentity::new(&cli.account_url, user),
			&key,
			Duration::minutes(cli.lifetime),
			Duration::minutes(cli.renewal_delay),
		)?;

		return Ok(Arc::new(KeypairTokenManager::new(
			&cli.account_url,
			&cli.url,
			signer,
			transport,
		)?));
	}

	let pat_argument = cli
		.pat
		.clone()
		.or_else(|| cli.patfile.as_ref().map(|p| p.display().to_string()))
		.or_else(discover_pat_file)
		.ok_or(ConfigError::MissingPat)?;
	let pat = resolve_pat(&pat_argument)?;

	Ok(Arc::new(PatTokenManager::new(
		&cli.account_url,
		&cli.url,
		pat,
		cli.role.clone(),
		transport,
	)?))
}

/// Falls back to a `*-token-secret.txt` file in the working directory, the name the platform
/// gives downloaded PAT secrets.
fn discover_pat_file() -> Option<String> {
	fs::read_dir(".")
		.ok()?
		.flatten()
		.map(|entry| entry.path())
		.find(|path| {
			path.is_file()
				&& path
					.file_name()
					.and_then(|name| name.to_str())
					.is_some_and(|name| name.ends_with(PAT_FILE_SUFFIX))
		})
		.map(|path| path.display().to_string())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use snowkey::error::Error;

	fn base_cli() -> Cli {
		Cli {
			account_url: "org-acct.snowflakecomputing.com".into(),
			url: "https://h.example.com/x".into(),
			method: "GET".into(),
			data: None,
			role: None,
			user: None,
			lifetime: 59,
			renewal_delay: 54,
			passphrase: None,
			keyfile: None,
			patfile: None,
			pat: None,
		}
	}

	fn provider_err(cli: &Cli) -> Error {
		match build_provider(cli, Arc::new(ReqwestTransport::default())) {
			Ok(_) => panic!("provider construction should have been rejected"),
			Err(e) => e,
		}
	}

	#[test]
	fn conflicting_credentials_fail_before_any_network_call() {
		let cli = Cli {
			keyfile: Some(PathBuf::from("rsa_key.p8")),
			pat: Some("pat-value".into()),
			user: Some("alice".into()),
			..base_cli()
		};

		assert!(matches!(
			provider_err(&cli),
			Error::Config(ConfigError::ConflictingCredentials)
		));
	}

	#[test]
	fn keyfiles_require_the_matching_user() {
		let cli = Cli { keyfile: Some(PathBuf::from("rsa_key.p8")), ..base_cli() };

		assert!(matches!(provider_err(&cli), Error::Config(ConfigError::MissingUser)));
	}

	#[test]
	fn lifetime_flags_reject_out_of_range_minutes() {
		let err = Cli::try_parse_from([
			"snowkey",
			"--account-url",
			"org-acct.snowflakecomputing.com",
			"--url",
			"https://h.example.com/x",
			"--lifetime",
			"9223372036854775807",
		])
		.expect_err("An out-of-range lifetime must be rejected at parse time.");

		assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
	}
}
