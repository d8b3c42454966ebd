//! Tickworld - Development Tools

use clap::{Parser, Subcommand};
use rpg_core::skills::CombatLevels;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rpg-tools")]
#[command(about = "Development tools for the Tickworld server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate world config files
    Validate {
        /// Config file, or a directory of .ron files
        #[arg(default_value = "assets")]
        path: String,
    },
    /// Print the experience table
    XpTable {
        /// First level to print
        #[arg(long, default_value_t = 1)]
        from: u8,
        /// Last level to print
        #[arg(long, default_value_t = 99)]
        to: u8,
    },
    /// Compute a combat level
    CombatLevel {
        #[arg(long, default_value_t = 1)]
        attack: u32,
        #[arg(long, default_value_t = 1)]
        strength: u32,
        #[arg(long, default_value_t = 1)]
        defence: u32,
        #[arg(long, default_value_t = 10)]
        hitpoints: u32,
        #[arg(long, default_value_t = 1)]
        prayer: u32,
        #[arg(long, default_value_t = 1)]
        ranged: u32,
        #[arg(long, default_value_t = 1)]
        magic: u32,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating world configs in: {path}");
            match rpg_tools::validate::validate_path(std::path::Path::new(&path)) {
                Ok(files) => tracing::info!(files = files.len(), "Validation passed"),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::XpTable { from, to } => {
            let rows = rpg_tools::tables::xp_rows(from, to);
            print!("{}", rpg_tools::tables::format_xp_rows(&rows));
        }
        Commands::CombatLevel {
            attack,
            strength,
            defence,
            hitpoints,
            prayer,
            ranged,
            magic,
        } => {
            let levels = CombatLevels {
                attack,
                strength,
                defence,
                hitpoints,
                prayer,
                ranged,
                magic,
            };
            println!("{}", rpg_tools::tables::describe_combat_level(levels));
        }
    }
}
