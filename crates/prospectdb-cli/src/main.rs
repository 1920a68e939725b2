use anyhow::Context;
use clap::{Parser, Subcommand};

use prospectdb_traffic::{estimate_business, extract_domain, normalize_site_data, TrafficClient};

#[derive(Debug, Parser)]
#[command(name = "prospectdb-cli")]
#[command(about = "prospectdb command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a traffic analysis for a website and print the normalized report.
    Analyze {
        /// Website URL or bare hostname to analyze.
        url: String,
        /// Persist the result into the prospect database.
        #[arg(long)]
        save: bool,
    },
    /// List the highest-scored prospects.
    Prospects {
        /// Maximum number of rows to print.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { url, save } => analyze(&url, save).await,
        Commands::Prospects { limit } => prospects(limit).await,
        Commands::Migrate => migrate().await,
    }
}

async fn analyze(url: &str, save: bool) -> anyhow::Result<()> {
    let config = prospectdb_core::load_app_config()?;
    let token = config
        .apify_token
        .as_deref()
        .context("APIFY_TOKEN is required for traffic analysis")?;

    let domain = extract_domain(url)?;
    let client = TrafficClient::new(token, config.traffic_timeout_secs)?;

    tracing::info!(domain = %domain, "fetching traffic analytics");
    let raw = client.fetch_site_traffic(&domain).await?;
    let report = normalize_site_data(&raw, &config.home_country);
    let estimates = estimate_business(&report);

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("{}", serde_json::to_string_pretty(&estimates)?);

    if save {
        let pool_config = prospectdb_db::PoolConfig::from_app_config(&config);
        let pool = prospectdb_db::connect_pool(&config.database_url, pool_config).await?;
        let analysis = serde_json::json!({
            "normalized": report,
            "raw": raw,
        });
        let row = prospectdb_db::upsert_from_analysis(
            &pool,
            &domain,
            report.basic.site_name.as_deref(),
            &estimates,
            analysis,
        )
        .await?;
        println!(
            "saved prospect #{} ({}) score={}",
            row.id, row.company_name, row.score
        );
    }

    Ok(())
}

async fn prospects(limit: i64) -> anyhow::Result<()> {
    let config = prospectdb_core::load_app_config()?;
    let pool_config = prospectdb_db::PoolConfig::from_app_config(&config);
    let pool = prospectdb_db::connect_pool(&config.database_url, pool_config).await?;

    let filter = prospectdb_db::ProspectFilter {
        limit,
        page: 1,
        ..prospectdb_db::ProspectFilter::default()
    };
    let page = prospectdb_db::list_prospects(&pool, &filter).await?;

    println!("{} prospects ({} total)", page.items.len(), page.total);
    for row in page.items {
        println!(
            "#{:<5} {:<40} {:<12} score={:<3} {}",
            row.id,
            row.company_name,
            row.status,
            row.score,
            row.website.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let config = prospectdb_core::load_app_config()?;
    let pool_config = prospectdb_db::PoolConfig::from_app_config(&config);
    let pool = prospectdb_db::connect_pool(&config.database_url, pool_config).await?;
    prospectdb_db::run_migrations(&pool).await?;
    println!("database schema is up to date");
    Ok(())
}
