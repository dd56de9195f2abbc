//! Authorizes against Fyers (when no access token is configured) and prints the default quotes.
//!
//! 1. Export `FYERS_APP_ID`, `FYERS_SECRET`, and `FYERS_REDIRECT_URI`; optionally point
//!    `FYERS_API_BASE` at `https://api-t1.fyers.in` for the test host.
//! 2. Open the printed login URL and copy the `auth_code` from the redirect.
//! 3. Provide it through `FYERS_AUTH_CODE` or paste it on stdin.

// std
use std::io::{self, BufRead, Write};
// crates.io
use color_eyre::{Result, eyre::eyre};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
// self
use fyers_broker::{config::BrokerConfig, flows::ReqwestBroker};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
		)
		.init();

	let config = BrokerConfig::from_env()?;
	let broker = ReqwestBroker::from_config(&config)?;

	println!("Using the {} environment.", broker.environment());

	if !broker.is_authenticated().await? {
		let request = broker.start_authorization()?;

		println!("Open {} and sign in.", request.url);

		let code = match std::env::var("FYERS_AUTH_CODE") {
			Ok(code) => code,
			Err(_) => read_code()?,
		};
		let grant = broker.exchange(&code).await?;

		println!(
			"Exchange succeeded; access token expires at {:?}.",
			grant.expires_at().map(|at| at.to_string())
		);
	}

	let quotes = broker.fetch_default_quotes().await?;

	println!("{}", serde_json::to_string_pretty(&quotes)?);

	Ok(())
}

fn read_code() -> Result<String> {
	print!("Paste the auth_code from the redirect: ");
	io::stdout().flush()?;

	let mut line = String::new();

	io::stdin().lock().read_line(&mut line)?;

	let code = line.trim();

	if code.is_empty() {
		return Err(eyre!("No authorization code was provided."));
	}

	Ok(code.to_owned())
}
