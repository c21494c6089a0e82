use clap::Parser;
use std::process;
use templog::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    match commands::run(args) {
        Ok(true) => process::exit(0),
        Ok(false) => {
            show_help_and_commands();
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("templog - Temperature Log Dashboard");
    println!("===================================");
    println!();
    println!("Upload a CSV of indoor/outdoor temperature readings and explore it");
    println!("as time series, distributions and statistics.");
    println!();
    println!("USAGE:");
    println!("    templog <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    status      Show whether data has been uploaded");
    println!("    preview     Preview a CSV file without storing it");
    println!("    upload      Store a CSV file, replacing existing data");
    println!("    series      Time series and temperature distribution");
    println!("    stats       Overall, indoor/outdoor and daily statistics");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Check the uploaded file before storing it:");
    println!("    templog preview IOT-temp.csv");
    println!();
    println!("    # Store it and look at hourly indoor means for one week:");
    println!("    templog upload IOT-temp.csv");
    println!("    templog series --location indoor --resample hourly \\");
    println!("                   --from 2018-12-01 --to 2018-12-07");
    println!();
    println!("    # Statistics as JSON, using another database:");
    println!("    templog stats --json --database-url sqlite:///tmp/logs.db");
    println!();
    println!("For detailed help on any command, use:");
    println!("    templog <COMMAND> --help");
}
