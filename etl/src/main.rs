use clap::{Arg, Command};
use std::process;


#[tokio::main]
async fn main() {
    let matches = Command::new("Trip ETL")
        .version("1.0")
        .about("Cleans the raw taxi trip export into the analytics dataset")
        .subcommand(
            Command::new("etl")
                .about("Run the ETL pipeline")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("etl", etl_matches)) => {
            let config_path = etl_matches.get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/analytics.toml");
            println!("Starting ETL pipeline with config: {}", config_path);

            match etl::run_etl_pipeline(config_path).await {
                Ok(report) => println!(
                    "Loaded {} rows into {} in {:.2} seconds",
                    report.rows_loaded, report.output_path, report.elapsed_secs
                ),
                Err(e) => {
                    eprintln!("ETL pipeline error: {}", e);
                    process::exit(1);
                }
            }
        },

        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}
