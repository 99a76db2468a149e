use anyhow::Result;
use civdrone_cli::{parse_point, RouteKindArg, RouteRequest, ServerClient};
use civdrone_core::GeoPoint;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Request a route from the civdrone server", long_about = None)]
struct Args {
    /// civdrone server URL
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,

    #[arg(long, value_enum, default_value_t = RouteKindArg::General)]
    kind: RouteKindArg,

    /// Start (or herd location), as lat,lon
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    from: GeoPoint,

    /// Destination (or subject / target), as lat,lon
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    to: GeoPoint,

    /// Waypoint count for general routes
    #[arg(long, default_value_t = 5)]
    count: usize,

    /// Wind direction in degrees (hunting)
    #[arg(long)]
    wind: Option<f64>,

    /// Plan without asking the advisor
    #[arg(long)]
    no_advice: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = ServerClient::new(args.url);

    let request = RouteRequest {
        kind: args.kind,
        from: args.from,
        to: args.to,
        count: args.count,
        wind_deg: args.wind,
        use_advice: !args.no_advice,
    };
    let (path, body) = request.to_body();

    println!("Requesting {:?} route...", args.kind);
    let response = client.post_json(path, &body).await?;
    if let Some(count) = response["route"]["waypoints"].as_array().map(Vec::len) {
        println!("Route: {} waypoints", count);
    }
    if response["advised"] == false {
        if let Some(reason) = response["fallback_reason"]["reason"].as_str() {
            println!("Planned from defaults ({reason})");
        }
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
