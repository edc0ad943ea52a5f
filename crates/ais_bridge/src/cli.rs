use chrono::NaiveDate;
use clap::Parser;

/// Fetch AIS data from BarentsWatch and publish it to NATS
#[derive(Parser, Debug)]
#[command(name = "ais-bridge", version, about)]
pub struct Cli {
    /// Fetch historical data since this date before streaming (format: YYYY-MM-DD)
    #[arg(short = 's', long = "since", value_name = "YYYY-MM-DD", value_parser = parse_since_date)]
    pub since: Option<NaiveDate>,
}

fn parse_since_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected a date formatted as YYYY-MM-DD: {}", e))
}
