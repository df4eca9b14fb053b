use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Query the failover service status API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall health, endpoint counts and circuit breaker state
    Status,
    /// Per-endpoint health and probe metrics
    Endpoints {
        /// Show a single endpoint by id
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match &cli.command {
        Commands::Status => "/status".to_string(),
        Commands::Endpoints { id: None } => "/endpoints".to_string(),
        Commands::Endpoints { id: Some(id) } => format!("/endpoints/{}", id),
    };

    let res = client.get(format!("{}{}", cli.url, path)).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        eprintln!("Service responded with {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
