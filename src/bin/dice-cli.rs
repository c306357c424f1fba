use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};

#[derive(Parser)]
#[command(name = "dice-cli")]
#[command(about = "Client for the roll-a-die service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll the die
    Roll {
        /// Number of rolls
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// Sent as the `username` baggage member
        #[arg(long)]
        user: Option<String>,
    },
    /// Check that the service is alive
    Liveness,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Roll { count, user } => {
            let mut headers = HeaderMap::new();
            if let Some(user) = user {
                headers.insert("baggage", HeaderValue::from_str(&format!("username={user}"))?);
            }

            for _ in 0..count {
                let res = client
                    .get(format!("{}/rolldice", cli.url))
                    .headers(headers.clone())
                    .send()
                    .await?;
                print_response(res).await?;
            }
        }
        Commands::Liveness => {
            let res = client.get(format!("{}/liveness", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    println!("{}", text.trim_end());
    Ok(())
}
