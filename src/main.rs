use anyhow::Context;
use clap::Parser;
use locality_score::config::{AppConfig, Cli, Command};
use locality_score::utils::error::{ErrorSeverity, LocalityError};
use locality_score::utils::{logger, validation::Validate};
use serde::Serialize;
use std::sync::Arc;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;

    let service = locality_score::build_service(&config)
        .await
        .context("building service")?;

    match cli.command {
        Command::Areas => print_json(&service.list_areas().await?),
        Command::Infrastructure { area, refresh } => {
            print_json(&service.area_infrastructure(area, refresh).await?)
        }
        Command::Locations { area } => print_json(&service.facility_locations(area).await?),
        Command::Score { area, user } => {
            print_json(&service.area_score(area, user.as_deref()).await?)
        }
        Command::ScoreAt {
            lat,
            lon,
            radius,
            user,
        } => print_json(&service.score_at(lat, lon, radius, user.as_deref()).await?),
        Command::Recommend { area, user } => {
            print_json(&service.recommend(area, user.as_deref()).await?)
        }
        Command::ScoreAll { user } => {
            let scores = Arc::new(service).score_all(user).await?;
            print_json(&scores)
        }
    }
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI arguments: {:?}", cli);

    let Err(e) = run(cli).await else {
        return;
    };

    match e.downcast_ref::<LocalityError>() {
        Some(err) => {
            tracing::error!(
                "{:#} (Category: {:?}, Severity: {:?})",
                e,
                err.category(),
                err.severity()
            );
            eprintln!("❌ {}", err.user_friendly_message());
            eprintln!("💡 {}", err.recovery_suggestion());

            let code = exit_code(err.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
        None => {
            tracing::error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}
