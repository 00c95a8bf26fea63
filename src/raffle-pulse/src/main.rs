//! Raffle Pulse — forecasting and health monitoring for time-boxed sales
//! campaigns.
//!
//! Entry point: evaluates configured campaigns from the command line or
//! serves the forecast/evaluation REST API.

use clap::{Parser, Subcommand};
use raffle_api::ApiServer;
use raffle_core::config::CampaignBook;
use raffle_core::{AppConfig, Snapshot};
use raffle_engine::allocation::TicketCampaignParams;
use raffle_engine::{allocate, evaluate_health, forecast_campaign, plan_phase, TICKET_CAC_TABLE};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "raffle-pulse")]
#[command(about = "Forecasting and health monitoring for raffle campaigns")]
#[command(version)]
struct Cli {
    /// Campaigns file (overrides config)
    #[arg(long, env = "RAFFLE_PULSE__CAMPAIGNS_FILE")]
    campaigns: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a campaign snapshot and print the combined
    /// config/forecast/health report as JSON
    Evaluate {
        campaign_id: String,
        /// Current day, 1-based, within the campaign window
        day: u32,
        /// Cumulative GMV to date
        gmv: f64,
        /// Cumulative marketing spend to date
        spend: f64,
        /// Cumulative new customers to date
        new_customers: u64,
        /// Cumulative returning customers to date
        returning_customers: u64,
        /// Cumulative orders to date
        orders: u64,
        /// Cumulative acquisition spend (defaults to total spend)
        acquisition_spend: Option<f64>,
    },
    /// Print the per-phase customer/order plans for a campaign
    Plan { campaign_id: String },
    /// Print the ticket-phase budget allocation for a campaign
    Allocate { campaign_id: String },
    /// Run the forecast/evaluation REST API
    Serve,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "raffle_pulse=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors (including a missing campaign identifier) exit 1.
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(path) = cli.campaigns {
        config.campaigns_file = path;
    }

    match cli.command {
        Command::Evaluate {
            campaign_id,
            day,
            gmv,
            spend,
            new_customers,
            returning_customers,
            orders,
            acquisition_spend,
        } => {
            let book = CampaignBook::load(&config.campaigns_file)?;
            let campaign = book.find(&campaign_id)?;
            let snapshot = Snapshot {
                day,
                gmv,
                spend,
                new_customers,
                returning_customers,
                orders,
                acquisition_spend,
            };

            let forecast = forecast_campaign(campaign)?;
            let health = evaluate_health(campaign, &forecast, &snapshot, &book.thresholds)?;

            let report = serde_json::json!({
                "campaign": campaign,
                "forecast": forecast,
                "health": health,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }

        Command::Plan { campaign_id } => {
            let book = CampaignBook::load(&config.campaigns_file)?;
            let campaign = book.find(&campaign_id)?;

            let plans: Vec<_> = campaign.phases.iter().map(plan_phase).collect();
            println!("{}", serde_json::to_string_pretty(&plans)?);
            Ok(())
        }

        Command::Allocate { campaign_id } => {
            let book = CampaignBook::load(&config.campaigns_file)?;
            let campaign = book.find(&campaign_id)?;

            let params = TicketCampaignParams {
                target_gmv_total: campaign.target_gmv,
                aov: campaign.aov_new,
                budget_total: campaign.total_budget,
            };
            let result = allocate(&params, &campaign.ticket_phases, &TICKET_CAC_TABLE)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Command::Serve => {
            info!("Raffle Pulse starting up");
            let book = Arc::new(CampaignBook::load(&config.campaigns_file)?);

            info!(
                host = %config.api.host,
                http_port = config.api.http_port,
                campaigns = book.campaigns.len(),
                "Configuration loaded"
            );

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let server = ApiServer::new(config, book);
                server.start_metrics().await?;
                server.start_http().await
            })
        }
    }
}
