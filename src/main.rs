use std::path::PathBuf;

use anyhow::{Context, Result};
use astro_match::logger::init_logger;
use astro_match::{
    score_compatibility, BirthInfo, CelestialBody, Chart, CompatibilityResult, Config, Ephemeris, Location, OutputFormat,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "astro_match", version, about = "Natal charts and chart compatibility")]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Planetary positions for one birth moment
    Chart(Birth),
    /// Compatibility score between two birth moments
    Match(Pair),
}

#[derive(Debug, Args)]
struct Birth {
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    /// HH:MM, local clock time
    #[arg(long)]
    time: String,
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl Birth {
    fn info(&self) -> Result<BirthInfo> {
        birth_info(&self.date, &self.time, self.lat, self.lon)
    }
}

#[derive(Debug, Args)]
struct Pair {
    #[arg(long)]
    first_date: String,
    #[arg(long)]
    first_time: String,
    #[arg(long, requires = "first_lon", allow_hyphen_values = true)]
    first_lat: Option<f64>,
    #[arg(long, requires = "first_lat", allow_hyphen_values = true)]
    first_lon: Option<f64>,
    #[arg(long)]
    second_date: String,
    #[arg(long)]
    second_time: String,
    #[arg(long, requires = "second_lon", allow_hyphen_values = true)]
    second_lat: Option<f64>,
    #[arg(long, requires = "second_lat", allow_hyphen_values = true)]
    second_lon: Option<f64>,
}

impl Pair {
    fn infos(&self) -> Result<(BirthInfo, BirthInfo)> {
        let first = birth_info(&self.first_date, &self.first_time, self.first_lat, self.first_lon)?;
        let second = birth_info(&self.second_date, &self.second_time, self.second_lat, self.second_lon)?;
        Ok((first, second))
    }
}

#[derive(Serialize)]
struct ChartOutput<'a> {
    birth: &'a BirthInfo,
    julian_day: f64,
    chart: &'a Chart,
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    first: &'a BirthInfo,
    second: &'a BirthInfo,
    #[serde(flatten)]
    result: &'a CompatibilityResult,
}

fn birth_info(date: &str, time: &str, lat: Option<f64>, lon: Option<f64>) -> Result<BirthInfo> {
    let birth = BirthInfo::parse(date, time)?;
    Ok(match (lat, lon) {
        (Some(lat), Some(lon)) => birth.with_location(Location::new(lat, lon)),
        _ => birth,
    })
}

fn chart_for(birth: &BirthInfo) -> Result<Chart> {
    let chart = birth
        .chart(&Ephemeris::new())
        .with_context(|| format!("computing chart for {} {}", birth.date, birth.time))?;
    if let (Some(sun), Some(moon)) = (chart.get(CelestialBody::Sun), chart.get(CelestialBody::Moon)) {
        tracing::info!(date = %birth.date, sun = %sun.sign, moon = %moon.sign, "chart computed");
    }
    Ok(chart)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;
    init_logger(&config.logging, cli.verbose);

    let format = if cli.json { OutputFormat::Json } else { config.output.format };
    tracing::debug!(?format, "starting");

    match cli.command {
        Command::Chart(args) => {
            let birth = args.info()?;
            let chart = chart_for(&birth)?;
            match format {
                OutputFormat::Json => {
                    let output = ChartOutput {
                        birth: &birth,
                        julian_day: birth.julian_day(),
                        chart: &chart,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => print!("{}", chart),
            }
        }
        Command::Match(pair) => {
            let (first_birth, second_birth) = pair.infos()?;
            let first = chart_for(&first_birth)?;
            let second = chart_for(&second_birth)?;
            let result = score_compatibility(&first, &second)?;
            tracing::info!(score = result.scaled_score, level = %result.level, "match scored");
            match format {
                OutputFormat::Json => {
                    let output = MatchOutput {
                        first: &first_birth,
                        second: &second_birth,
                        result: &result,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => print!("{}", result),
            }
        }
    }

    Ok(())
}
