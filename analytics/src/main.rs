
use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use std::process;


fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Sets a custom config file")
}

fn config_path(matches: &ArgMatches) -> &str {
    matches.get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/analytics.toml")
}

async fn inspect(config_path: &str) -> anyhow::Result<()> {
    let summary = analytics::inspect_dataset(config_path)
        .await
        .with_context(|| format!("inspecting dataset from config {}", config_path))?;

    println!("--- Inspecting {} ---", summary.path);
    println!("\n[Table Schema]");
    for column in &summary.columns {
        println!("{:<22} {}", column.name, column.data_type);
    }
    println!("\n[Total Rows]: {}", summary.total_rows);
    println!("\n[Sample Data - First {} Rows]", summary.sample.len());
    for row in &summary.sample {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = Command::new("Trip Analytics")
        .version("1.0")
        .about("Serves trip queries and trip duration predictions")
        .subcommand(
            Command::new("serve")
                .about("Run the analytics API server")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the dataset schema, row count and a sample")
                .arg(config_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", serve_matches)) => {
            let config_path = config_path(serve_matches);
            println!("Starting analytics API with config: {}", config_path);

            if let Err(e) = analytics::run_analytics_api(config_path).await {
                eprintln!("Analytics API error: {}", e);
                process::exit(1);
            }
        }
        Some(("inspect", inspect_matches)) => {
            if let Err(e) = inspect(config_path(inspect_matches)).await {
                eprintln!("Error reading dataset: {:#}", e);
                process::exit(1);
            }
        }
        _ => {
            println!("No subcommand specified. Use --help for usage information.");
            process::exit(1);
        }
    }
}
