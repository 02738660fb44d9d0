use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tripwise_agents::TripPlannerAgent;
use tripwise_catalog::{extract_record_list, Catalog, CatalogConfig, MemoryCatalog};
use tripwise_core::{allocate_budget, normalize_with_report, BudgetPercentages, TripRequest};
use tripwise_observability::{init_tracing, PlannerMetrics};

#[derive(Debug, Parser)]
#[command(name = "tripwise")]
#[command(about = "Tripwise budget trip planner CLI")]
struct Cli {
    /// Provider API base URL used when no fixtures are given.
    #[arg(long, global = true, env = "TRIPWISE_PROVIDER_URL")]
    provider_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plans a trip against the provider, or against a fixture directory.
    Plan {
        #[arg(long)]
        budget: f64,
        #[arg(long)]
        people: u32,
        #[arg(long)]
        days: u32,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        city_id: Option<i64>,
        /// Ratios as `hotels,food,activities,transport`.
        #[arg(long)]
        percentages: Option<String>,
        #[arg(long)]
        from_city_id: Option<i64>,
        #[arg(long)]
        user_id: Option<i64>,
        #[arg(long, env = "TRIPWISE_FIXTURES")]
        fixtures: Option<PathBuf>,
    },
    /// Prints the per-person, per-day split without touching the provider.
    Budget {
        #[arg(long)]
        budget: f64,
        #[arg(long)]
        people: u32,
        #[arg(long)]
        days: u32,
        #[arg(long)]
        percentages: Option<String>,
    },
    /// Normalizes a saved provider response for one destination.
    Normalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        destination: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("tripwise_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Plan {
            budget,
            people,
            days,
            destination,
            city_id,
            percentages,
            from_city_id,
            user_id,
            fixtures,
        } => {
            let catalog = build_catalog(cli.provider_url, fixtures.as_deref())?;
            let agent = TripPlannerAgent::new(Arc::new(catalog), PlannerMetrics::shared());

            let mut request = TripRequest::new(budget, people, days, &destination);
            request.city_id = city_id;
            request.percentages = parse_percentages(percentages.as_deref())?;
            request.from_city_id = from_city_id;
            request.user_id = user_id;

            let outcome = agent.plan_trip(request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Budget {
            budget,
            people,
            days,
            percentages,
        } => {
            TripRequest::new(budget, people, days, "").validate()?;
            let percentages = parse_percentages(percentages.as_deref())?;
            let allocation = allocate_budget(budget, people, days, percentages.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        Command::Normalize { input, destination } => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("failed reading {}", input.display()))?;
            let payload: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", input.display()))?;
            let records = extract_record_list("input", payload)?;

            let (items, report) = normalize_with_report(&records, &destination);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "items": items, "report": report }))?
            );
        }
    }

    Ok(())
}

fn build_catalog(provider_url: Option<String>, fixtures: Option<&Path>) -> Result<Catalog> {
    if let Some(dir) = fixtures {
        let catalog = MemoryCatalog::from_fixture_dir(dir)
            .with_context(|| format!("failed loading fixtures from {}", dir.display()))?;
        return Ok(Catalog::memory(catalog));
    }

    let mut config = CatalogConfig::from_env();
    if let Some(url) = provider_url {
        config.base_url = url;
    }
    Catalog::http(config)
}

fn parse_percentages(value: Option<&str>) -> Result<Option<BudgetPercentages>> {
    value
        .map(|value| {
            BudgetPercentages::parse_list(value)
                .context("--percentages expects four comma-separated ratios")
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_flag_is_optional_but_strict() {
        assert!(parse_percentages(None).unwrap().is_none());

        let parsed = parse_percentages(Some("0.5, 0.2, 0.2, 0.1")).unwrap().unwrap();
        assert_eq!(parsed.hotels, 0.5);

        assert!(parse_percentages(Some("0.5,0.5")).is_err());
    }

    #[test]
    fn cli_parses_plan_command() {
        let cli = Cli::parse_from([
            "tripwise",
            "plan",
            "--budget",
            "9000",
            "--people",
            "3",
            "--days",
            "3",
            "--destination",
            "Jeddah",
        ]);
        assert!(matches!(cli.command, Command::Plan { people: 3, .. }));
    }
}
