use anyhow::{Context, Result};
use std::io::Read;

use nbi_client::auth::AuthMode;
use nbi_client::config::CliArgs;
use nbi_client::NbiClient;

fn main() -> Result<()> {
    let args = CliArgs::load();

    // Initialize logging with a configured level; stdout is reserved for results
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = args.client_config()?;
    let mut client = NbiClient::new(config).context("Failed to create client")?;

    let secret = args.secret()?;
    match args.auth_mode()? {
        AuthMode::Basic => client.use_basic_auth(&args.user, secret),
        AuthMode::Bearer => client.use_oauth(&args.user, secret),
        AuthMode::None => anyhow::bail!("An authentication method is required"),
    }
    tracing::info!("Client configured: {}", client);

    if args.show_token {
        client
            .acquire_token()
            .context("Could not retrieve OAuth token")?;
        let token = client.token();
        let decoded = serde_json::json!({
            "token_type": token.token_type(),
            "header": token.header(),
            "payload": token.payload(),
        });
        println!("{}", serde_json::to_string_pretty(&decoded)?);
        return Ok(());
    }

    let query = read_query(&args)?;
    let result = client.submit_query(&query).context("Query failed")?;
    println!("{}", result);

    Ok(())
}

/// Query text from the argument, the --file path or stdin, in that order
fn read_query(args: &CliArgs) -> Result<String> {
    if let Some(ref query) = args.query {
        return Ok(query.clone());
    }

    if let Some(ref path) = args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path.display()));
    }

    let mut query = String::new();
    std::io::stdin()
        .read_to_string(&mut query)
        .context("Failed to read query from stdin")?;
    if query.trim().is_empty() {
        anyhow::bail!("No query given (pass it as an argument, with --file or on stdin)");
    }
    Ok(query)
}
