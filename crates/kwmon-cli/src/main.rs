mod keywords;
mod monitor;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "kwmon-cli")]
#[command(about = "Keyword monitoring command line interface")]
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
    /// Manage a user's monitored keywords
    Keywords {
        #[command(subcommand)]
        command: KeywordCommands,
    },
    /// Collect news and social data for every active keyword of a user
    Collect {
        #[arg(long)]
        user: Uuid,
        /// Print the keywords that would be collected and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-check timed-out social searches and store any that finished
    Reconcile {
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        user: Option<Uuid>,
        /// Sweep every user with a stored document
        #[arg(long)]
        all: bool,
    },
    /// Print a user's stored monitoring document as JSON
    Show {
        #[arg(long)]
        user: Uuid,
    },
    /// List recent collection and reconciliation runs for a user
    Runs {
        #[arg(long)]
        user: Uuid,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[derive(Debug, Subcommand)]
enum KeywordCommands {
    List {
        #[arg(long)]
        user: Uuid,
    },
    Add {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        keyword: String,
    },
    Remove {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("kwmon-cli: no command given; see --help");
        return Ok(());
    };

    let config = kwmon_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = kwmon_db::PoolConfig::from_app_config(&config);
    let pool = kwmon_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                kwmon_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = kwmon_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Keywords { command } => match command {
            KeywordCommands::List { user } => keywords::list(&pool, user).await?,
            KeywordCommands::Add { user, keyword } => keywords::add(&pool, user, &keyword).await?,
            KeywordCommands::Remove { user, id } => keywords::remove(&pool, user, id).await?,
        },
        Commands::Collect { user, dry_run } => {
            monitor::run_collect(&pool, &config, user, dry_run).await?;
        }
        Commands::Reconcile { user, all } => {
            monitor::run_reconcile(&pool, &config, user, all).await?;
        }
        Commands::Show { user } => monitor::run_show(&pool, user).await?,
        Commands::Runs { user, limit } => monitor::run_list_runs(&pool, user, limit).await?,
    }

    Ok(())
}
