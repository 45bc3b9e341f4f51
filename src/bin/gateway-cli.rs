use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the NetSuite existence-check gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3333")]
    url: String,

    /// Sent as x-api-key.
    #[arg(short = 'k', long, env = "GATEWAY_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Validate an email against customers and contacts
    Check { email: String },
    /// Does a customer with this email exist
    Customer { email: String },
    /// Does a contact with this email exist
    Contact { email: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/api/netsuite", cli.url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.api_key {
        headers.insert("x-api-key", HeaderValue::from_str(key)?);
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Check { email } => {
            client
                .post(format!("{}/customer/check", base))
                .headers(headers)
                .json(&json!({ "companyEmail": email }))
                .send()
                .await?
        }
        Commands::Customer { email } => {
            client
                .get(format!("{}/customer/{}/exists", base, email))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Contact { email } => {
            client
                .get(format!("{}/contact/{}/exists", base, email))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let correlation_id = res
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .map(|json| serde_json::to_string_pretty(&json).unwrap_or_else(|_| text.clone()))
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", body);
    }
    if let Some(id) = correlation_id {
        eprintln!("correlation id: {}", id);
    }
    Ok(())
}
