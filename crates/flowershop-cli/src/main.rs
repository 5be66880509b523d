mod catalog;
mod managers;
mod media;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "flowershop-cli")]
#[command(about = "Flower shop operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Catalog maintenance
    Catalog {
        #[command(subcommand)]
        command: catalog::CatalogCommands,
    },
    /// Store managers
    Managers {
        #[command(subcommand)]
        command: managers::ManagersCommands,
    },
    /// Uploaded media
    Media {
        #[command(subcommand)]
        command: media::MediaCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert stores, categories, flower tags, managers and banners from a
    /// catalog file
    Seed {
        /// Catalog file; defaults to `FLOWERSHOP_CATALOG_PATH`
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("flowershop-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = flowershop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = flowershop_db::PoolConfig::from_app_config(&config);
    let pool = flowershop_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, &config, command).await,
        Commands::Catalog { command } => catalog::run(&pool, command).await,
        Commands::Managers { command } => managers::run(&pool, command).await,
        Commands::Media { command } => media::run(&pool, &config, command).await,
    }
}

async fn run_db(
    pool: &sqlx::PgPool,
    config: &flowershop_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            flowershop_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = flowershop_db::run_migrations(pool).await?;
            println!("applied {applied} migrations");
        }
        DbCommands::Seed { file } => {
            let path = file.unwrap_or_else(|| config.catalog_path.clone());
            let catalog = flowershop_core::load_catalog(&path)?;
            let summary = flowershop_db::seed_catalog(pool, &catalog).await?;
            tracing::info!(path = %path.display(), ?summary, "catalog seeded");
            println!(
                "seeded {} stores, {} categories, {} flower tags, {} managers, {} hero banners",
                summary.stores,
                summary.categories,
                summary.flower_tags,
                summary.managers,
                summary.hero_banners
            );
        }
    }
    Ok(())
}
