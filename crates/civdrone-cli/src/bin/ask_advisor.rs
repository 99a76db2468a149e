use anyhow::Result;
use civdrone_cli::ServerClient;
use clap::Parser;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask the civdrone advisor a question", long_about = None)]
struct Args {
    /// civdrone server URL
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,

    /// Operation type the question is about
    #[arg(long, default_value = "surveying")]
    operation: String,

    question: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = ServerClient::new(args.url);

    let response = client
        .post_json(
            "/v1/advice/general",
            &json!({
                "question": args.question,
                "operation_type": args.operation,
                "context": {"operation_type": args.operation},
            }),
        )
        .await?;

    match response["advice"].as_str() {
        Some(advice) => println!("{advice}"),
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }
    if response["source"] == "fallback" {
        eprintln!("(advisor unavailable, default answer)");
    }

    Ok(())
}
