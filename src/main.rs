use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use paypal_sync::config::Config;
use paypal_sync::db::{create_pool, init_db};
use paypal_sync::import::{import_plans, import_products};
use paypal_sync::models::CreateAmount;
use paypal_sync::payments::{OrdersApi, PayPalClient, SubscriptionsApi};
use paypal_sync::sync::PlanSynchronizer;

#[derive(Parser)]
#[command(name = "paypal-sync", about = "Keep local billing data in step with PayPal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the local schema
    InitDb,
    /// Import PayPal catalog products missing locally
    ImportProducts,
    /// Import PayPal billing plans missing locally (products first)
    ImportPlans,
    /// Activate billing plans by local id
    ActivatePlans {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Deactivate billing plans by local id
    DeactivatePlans {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Subscription lifecycle calls
    Subscription {
        #[command(subcommand)]
        action: SubscriptionAction,
    },
    /// One-off checkout orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum SubscriptionAction {
    Get {
        id: String,
    },
    Cancel {
        id: String,
        #[arg(long, default_value = "Cancelled by operator")]
        reason: String,
    },
    Activate {
        id: String,
        #[arg(long, default_value = "Reactivated by operator")]
        reason: String,
    },
    Suspend {
        id: String,
        #[arg(long, default_value = "Suspended by operator")]
        reason: String,
    },
    Transactions {
        id: String,
        /// How far back to look
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    Create {
        value: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    Capture {
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paypal_sync=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    let pool = create_pool(&config.database_path)?;
    let conn = pool.get()?;
    init_db(&conn)?;

    if matches!(cli.command, Command::InitDb) {
        tracing::info!("Database ready at {}", config.database_path);
        return Ok(());
    }

    let client = PayPalClient::new(&config.paypal)?;

    match cli.command {
        Command::InitDb => {}
        Command::ImportProducts => {
            let report = import_products(&conn, &client).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ImportPlans => {
            let report = import_plans(&conn, &client).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ActivatePlans { ids } => {
            let updated = PlanSynchronizer::new(&client).activate_plans(&conn, &ids).await?;
            println!("Activated {} plans", updated);
        }
        Command::DeactivatePlans { ids } => {
            let updated = PlanSynchronizer::new(&client)
                .deactivate_plans(&conn, &ids)
                .await?;
            println!("Deactivated {} plans", updated);
        }
        Command::Subscription { action } => {
            let api = SubscriptionsApi::new(&client);
            match action {
                SubscriptionAction::Get { id } => {
                    let subscription = api.get(&id).await?;
                    println!(
                        "{} plan={} status={}",
                        subscription.id,
                        subscription.plan_id.as_deref().unwrap_or("-"),
                        subscription.status.as_deref().unwrap_or("-")
                    );
                }
                SubscriptionAction::Cancel { id, reason } => api.cancel(&id, &reason).await?,
                SubscriptionAction::Activate { id, reason } => api.activate(&id, &reason).await?,
                SubscriptionAction::Suspend { id, reason } => api.suspend(&id, &reason).await?,
                SubscriptionAction::Transactions { id, days } => {
                    let end = Utc::now();
                    let start = end - Duration::days(days);
                    for tx in api.list_transactions(&id, start, end).await? {
                        println!(
                            "{} {} {}",
                            tx.id,
                            tx.status.as_deref().unwrap_or("-"),
                            tx.time.map(|t| t.to_rfc3339()).unwrap_or_default()
                        );
                    }
                }
            }
        }
        Command::Order { action } => {
            let api = OrdersApi::new(&client);
            let order = match action {
                OrderAction::Create { value, currency } => {
                    api.create_order(&CreateAmount::new(currency, value)).await?
                }
                OrderAction::Capture { id } => api.capture_order(&id).await?,
            };
            println!(
                "{} status={} approve={}",
                order.id,
                order.status.as_deref().unwrap_or("-"),
                order.approve_url().unwrap_or("-")
            );
        }
    }

    Ok(())
}
