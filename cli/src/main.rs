mod commands;
mod config;
mod spoonacular;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    DarkModeArg, cmd_browse, cmd_dark_mode, cmd_fav_list, cmd_fav_remove, cmd_fav_toggle,
    cmd_key_set, cmd_key_show, cmd_pantry, cmd_plan_add, cmd_plan_clear, cmd_plan_generate,
    cmd_plan_remove, cmd_plan_show, cmd_plan_start, cmd_prefs_set, cmd_prefs_show, cmd_random,
    cmd_review_add, cmd_review_list, cmd_search, cmd_show, cmd_similar, cmd_suggest,
    resolve_filters,
};
use crate::config::Config;
use crate::spoonacular::SpoonacularClient;
use ladle_core::gateway::RecipeGateway;
use ladle_core::models::NewReview;
use ladle_core::pager::DEFAULT_PAGE_SIZE;
use ladle_core::store::Store;

const LOG_ENV: &str = "LADLE_LOG";

#[derive(Parser)]
#[command(
    name = "ladle",
    version,
    about = "Find recipes, keep favorites, plan your week",
    long_about = "\n\n  ██╗      █████╗ ██████╗ ██╗     ███████╗
  ██║     ██╔══██╗██╔══██╗██║     ██╔════╝
  ██║     ███████║██║  ██║██║     █████╗
  ██║     ██╔══██║██║  ██║██║     ██╔══╝
  ███████╗██║  ██║██████╔╝███████╗███████╗
  ╚══════╝╚═╝  ╚═╝╚═════╝ ╚══════╝╚══════╝
         what's for dinner?
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search recipes
    Search {
        /// Search query
        query: String,
        /// Diet filter (e.g. vegetarian, vegan, ketogenic)
        #[arg(long)]
        diet: Option<String>,
        /// Cuisine filter (e.g. italian, thai)
        #[arg(long)]
        cuisine: Option<String>,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
        /// Results per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show random recipes
    Random {
        /// How many recipes
        #[arg(short, long, default_value = "5")]
        count: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with ingredients, steps, and nutrition
    Show {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest recipe titles for a prefix
    Suggest {
        /// At least three characters
        prefix: String,
        /// Maximum suggestions
        #[arg(short, long, default_value = "5")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recipes similar to a recipe
    Similar {
        /// Recipe ID
        id: i64,
        /// Maximum results
        #[arg(short, long, default_value = "5")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find recipes that use the ingredients you have
    Pantry {
        /// Ingredients (e.g. apples flour sugar)
        #[arg(required = true)]
        ingredients: Vec<String>,
        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive search with suggestions and paging
    Browse {
        /// Diet filter
        #[arg(long)]
        diet: Option<String>,
        /// Cuisine filter
        #[arg(long)]
        cuisine: Option<String>,
        /// Results per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Manage favorite recipes
    Fav {
        #[command(subcommand)]
        command: FavCommands,
    },
    /// Manage the weekly meal plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Read and write recipe reviews
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Show and change preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// Manage the recipe API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand)]
enum FavCommands {
    /// List favorites in the order they were added
    List {
        /// Skip this many favorites
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Show at most this many
        #[arg(long, default_value = "9")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe to favorites, or remove it if already there
    Toggle {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a recipe from favorites
    Remove {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Show a week of meals
    Show {
        /// First day (YYYY-MM-DD or today/yesterday/tomorrow, default: planner start)
        #[arg(long)]
        start: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan a recipe for a meal
    Add {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: String,
        /// Meal slot: breakfast, lunch, dinner
        slot: String,
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a planned meal by position (0-based)
    Remove {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: String,
        /// Position among the day's meals, or among the slot's meals with --slot
        index: usize,
        /// Count positions within this slot only
        #[arg(long)]
        slot: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a week of meals and add it to the plan
    Generate {
        /// First day (default: planner start)
        #[arg(long)]
        start: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the first day of the planner week
    Start {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove all meals on a date
    Clear {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// List reviews for a recipe
    List {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Post a review
    Add {
        /// Recipe ID
        id: i64,
        /// Your name
        #[arg(long)]
        name: String,
        /// Rating from 0 to 5
        #[arg(long)]
        rating: u8,
        /// Comment
        #[arg(long)]
        comment: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show all preferences
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a preference. The value is JSON; bare words are strings, null clears.
    Set {
        /// Preference key (diet and cuisine become search defaults)
        key: String,
        /// Value
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change dark mode
    DarkMode {
        /// on, off, or toggle (omit to show)
        #[arg(value_enum)]
        mode: Option<DarkModeArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Save the Spoonacular API key
    Set {
        /// API key
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which API key is in use (masked)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn connect(config: &Config) -> Result<Arc<dyn RecipeGateway>> {
    Ok(Arc::new(SpoonacularClient::new(config.gateway_config()?)?))
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = Store::open(&config.db_path)?;

    match cli.command {
        Commands::Search {
            query,
            diet,
            cuisine,
            pages,
            page_size,
            json,
        } => {
            let filters = resolve_filters(&store, diet, cuisine)?;
            cmd_search(connect(&config)?, &query, filters, pages, page_size, json).await
        }
        Commands::Random { count, json } => {
            let gateway = connect(&config)?;
            cmd_random(gateway.as_ref(), count, json).await
        }
        Commands::Show { id, json } => {
            let gateway = connect(&config)?;
            cmd_show(&store, gateway.as_ref(), id, json).await
        }
        Commands::Suggest {
            prefix,
            limit,
            json,
        } => {
            let gateway = connect(&config)?;
            cmd_suggest(gateway.as_ref(), &prefix, limit, json).await
        }
        Commands::Similar { id, limit, json } => {
            let gateway = connect(&config)?;
            cmd_similar(gateway.as_ref(), id, limit, json).await
        }
        Commands::Pantry {
            ingredients,
            limit,
            json,
        } => {
            let gateway = connect(&config)?;
            cmd_pantry(gateway.as_ref(), &ingredients, limit, json).await
        }
        Commands::Browse {
            diet,
            cuisine,
            page_size,
        } => {
            let filters = resolve_filters(&store, diet, cuisine)?;
            cmd_browse(&store, connect(&config)?, filters, page_size).await
        }
        Commands::Fav { command } => match command {
            FavCommands::List {
                offset,
                limit,
                json,
            } => cmd_fav_list(&store, offset, limit, json),
            FavCommands::Toggle { id, json } => {
                let gateway = connect(&config)?;
                cmd_fav_toggle(&store, gateway.as_ref(), id, json).await
            }
            FavCommands::Remove { id, json } => cmd_fav_remove(&store, id, json),
        },
        Commands::Plan { command } => match command {
            PlanCommands::Show { start, json } => cmd_plan_show(&store, start, json),
            PlanCommands::Add {
                date,
                slot,
                id,
                json,
            } => {
                let gateway = connect(&config)?;
                cmd_plan_add(&store, gateway.as_ref(), &date, &slot, id, json).await
            }
            PlanCommands::Remove {
                date,
                index,
                slot,
                json,
            } => cmd_plan_remove(&store, &date, index, slot.as_deref(), json),
            PlanCommands::Generate { start, json } => {
                let gateway = connect(&config)?;
                cmd_plan_generate(&store, gateway.as_ref(), start, json).await
            }
            PlanCommands::Start { date, json } => cmd_plan_start(&store, &date, json),
            PlanCommands::Clear { date, json } => cmd_plan_clear(&store, &date, json),
        },
        Commands::Review { command } => match command {
            ReviewCommands::List { id, json } => {
                let gateway = connect(&config)?;
                cmd_review_list(gateway.as_ref(), id, json).await
            }
            ReviewCommands::Add {
                id,
                name,
                rating,
                comment,
                json,
            } => {
                let gateway = connect(&config)?;
                let review = NewReview {
                    name,
                    rating,
                    comment,
                };
                cmd_review_add(gateway.as_ref(), id, review, json).await
            }
        },
        Commands::Prefs { command } => match command {
            PrefsCommands::Show { json } => cmd_prefs_show(&store, json),
            PrefsCommands::Set { key, value, json } => cmd_prefs_set(&store, &key, &value, json),
            PrefsCommands::DarkMode { mode, json } => cmd_dark_mode(&store, mode, json),
        },
        Commands::Key { command } => match command {
            KeyCommands::Set { key, json } => cmd_key_set(&config, &key, json),
            KeyCommands::Show { json } => cmd_key_show(&config, json),
        },
    }
}
