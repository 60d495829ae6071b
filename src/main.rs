use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

use restaurant_insights::config::Config;
use restaurant_insights::constants::TOP_N_RANGE;
use restaurant_insights::insights::Selection;
use restaurant_insights::pipeline::{storage, Pipeline};
use restaurant_insights::types::NormalizedTable;
use restaurant_insights::views::{CitiesPage, CountriesPage, CuisinesPage, HomePage};
use restaurant_insights::{logging, metrics};

#[derive(Parser)]
#[command(name = "restaurant_insights")]
#[command(about = "Restaurant listings normalization and dashboard summaries")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw extract and write the normalized table
    Normalize {
        /// Raw CSV extract (defaults to data.raw_path)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Normalized CSV output (defaults to data.processed_path)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print Prometheus metrics after the run
        #[arg(long)]
        metrics: bool,
    },
    /// Print the summaries behind one dashboard page as JSON
    Report {
        #[arg(value_enum)]
        page: Page,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Normalize, then print every page
    Run {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Page {
    Home,
    Countries,
    Cities,
    Cuisines,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Countries to include (comma-separated, or "all"); defaults to filters.countries
    #[arg(long)]
    countries: Option<String>,
    /// Primary cuisines to include (comma-separated, or "all"); defaults to filters.cuisines
    #[arg(long)]
    cuisines: Option<String>,
    /// Number of restaurants on the cuisines page
    #[arg(long)]
    top_n: Option<usize>,
}

impl FilterArgs {
    fn selection(&self, config: &Config) -> Selection {
        let mut selection = Selection::from_config(&config.filters);
        if let Some(countries) = &self.countries {
            selection.countries = parse_list(countries);
        }
        if let Some(cuisines) = &self.cuisines {
            selection.cuisines = parse_list(cuisines);
        }
        selection
    }

    fn top_n(&self, config: &Config) -> anyhow::Result<usize> {
        let top_n = self.top_n.unwrap_or(config.filters.top_n);
        if !TOP_N_RANGE.contains(&top_n) {
            bail!(
                "--top-n must be between {} and {}",
                TOP_N_RANGE.start(),
                TOP_N_RANGE.end()
            );
        }
        Ok(top_n)
    }
}

fn parse_list(list: &str) -> Option<Vec<String>> {
    if list.trim().eq_ignore_ascii_case("all") {
        return None;
    }
    Some(
        list.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(
    page: Page,
    table: &NormalizedTable,
    filters: &FilterArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let selection = filters.selection(config);
    match page {
        Page::Home => print_json(&HomePage::build(table)),
        Page::Countries => print_json(&CountriesPage::build(table, &selection)?),
        Page::Cities => print_json(&CitiesPage::build(table, &selection, config)?),
        Page::Cuisines => {
            let top_n = filters.top_n(config)?;
            print_json(&CuisinesPage::build(table, &selection, top_n)?)
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    match cli.command {
        Commands::Normalize {
            input,
            output,
            metrics: print_metrics,
        } => {
            if print_metrics {
                metrics::init_metrics();
            }
            let input = input.unwrap_or_else(|| config.data.raw_path.clone());
            let output = output.unwrap_or_else(|| config.data.processed_path.clone());
            let (_, result) = Pipeline::run(&input, &output).map_err(|e| {
                error!("Normalization failed: {}", e);
                e
            })?;
            print_json(&result)?;
            if print_metrics {
                if let Some(rendered) = metrics::render() {
                    println!("{}", rendered);
                }
            }
        }
        Commands::Report { page, filters } => {
            let table = storage::read_normalized(&config.data.processed_path)?;
            info!(rows = table.len(), "Loaded normalized table");
            report(page, &table, &filters, &config)?;
        }
        Commands::Run { filters } => {
            let (table, result) =
                Pipeline::run(&config.data.raw_path, &config.data.processed_path)?;
            print_json(&result)?;
            for page in [Page::Home, Page::Countries, Page::Cities, Page::Cuisines] {
                report(page, &table, &filters, &config)?;
            }
        }
    }
    Ok(())
}
