mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;

use crate::commands::{
    cmd_food_add, cmd_food_delete, cmd_food_edit, cmd_food_list, cmd_meal_list, cmd_meal_log,
    cmd_menu_create, cmd_menu_delete, cmd_menu_list, cmd_menu_remove_ingredient,
    cmd_menu_set_ingredient, cmd_menu_show, parse_date, parse_grams, parse_ingredient,
    print_notices,
};
use crate::config::Config;
use forkful_core::models::{FoodUpdate, MealType, NewFood};
use forkful_core::persist::{load_all, save_all};

#[derive(Parser)]
#[command(
    name = "forkful",
    version,
    about = "Track foods, menu items and the meals you eat"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Directory holding the catalog files (default: platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage base foods
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Manage menu items (dishes built from foods)
    Menu {
        #[command(subcommand)]
        command: MenuCommands,
    },
    /// Log and review meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food
    Add {
        /// Food name
        name: String,
        /// Fat in grams per serving
        #[arg(long)]
        fat: f64,
        /// Carbs in grams per serving
        #[arg(long)]
        carbs: f64,
        /// Protein in grams per serving
        #[arg(long)]
        protein: f64,
        /// Serving size in grams
        #[arg(long)]
        serving: f64,
        /// Calories per serving (default: 9 x fat + 4 x (carbs + protein))
        #[arg(long)]
        calories: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a food's nutrition
    Edit {
        /// Food name
        name: String,
        /// New fat in grams per serving
        #[arg(long)]
        fat: Option<f64>,
        /// New carbs in grams per serving
        #[arg(long)]
        carbs: Option<f64>,
        /// New protein in grams per serving
        #[arg(long)]
        protein: Option<f64>,
        /// New serving size in grams
        #[arg(long)]
        serving: Option<f64>,
        /// New calories per serving (re-derived from macros when omitted and macros change)
        #[arg(long)]
        calories: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food
    Delete {
        /// Food name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all foods
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MenuCommands {
    /// Create a menu item from foods
    Create {
        /// Menu item name
        name: String,
        /// Ingredients as food:weight (e.g. "oats:50g")
        #[arg(required = true, num_args = 1..)]
        ingredients: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an ingredient or change its weight
    SetIngredient {
        /// Menu item name
        item: String,
        /// Food name
        food: String,
        /// Weight in grams (e.g. "50" or "50g")
        weight: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an ingredient (deletes the menu item if it was the last one)
    RemoveIngredient {
        /// Menu item name
        item: String,
        /// Food name
        food: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a menu item
    Delete {
        /// Menu item name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a menu item's ingredients and calories
    Show {
        /// Menu item name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all menu items
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Log a meal
    Log {
        /// Meal type: breakfast, brunch, lunch, dinner, dessert, snack
        meal_type: String,
        /// Menu items eaten
        #[arg(required = true, num_args = 1..)]
        items: Vec<String>,
        /// Date (MM/DD/YYYY or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged meals
    List {
        /// Only meals on this date (MM/DD/YYYY or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether the catalogs must be saved after the command runs.
    fn mutates(&self) -> bool {
        match self {
            Commands::Food { command } => !matches!(command, FoodCommands::List { .. }),
            Commands::Menu { command } => !matches!(
                command,
                MenuCommands::Show { .. } | MenuCommands::List { .. }
            ),
            Commands::Meal { command } => matches!(command, MealCommands::Log { .. }),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir.as_deref())?;
    debug!(data_dir = %config.data_dir.display(), "using data directory");
    let report = load_all(&config.files)?;
    print_notices(&report.notices);

    let mut store = report.store;
    let mutates = cli.command.mutates();

    match cli.command {
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                fat,
                carbs,
                protein,
                serving,
                calories,
                json,
            } => {
                let new = NewFood {
                    name,
                    calories,
                    fat,
                    carbs,
                    protein,
                    serving_size_g: serving,
                };
                cmd_food_add(&mut store, &new, json)?;
            }
            FoodCommands::Edit {
                name,
                fat,
                carbs,
                protein,
                serving,
                calories,
                json,
            } => {
                let update = FoodUpdate {
                    calories,
                    fat,
                    carbs,
                    protein,
                    serving_size_g: serving,
                };
                cmd_food_edit(&mut store, &name, &update, json)?;
            }
            FoodCommands::Delete { name, json } => cmd_food_delete(&mut store, &name, json)?,
            FoodCommands::List { json } => cmd_food_list(&store, json)?,
        },
        Commands::Menu { command } => match command {
            MenuCommands::Create {
                name,
                ingredients,
                json,
            } => {
                let ingredients = ingredients
                    .iter()
                    .map(|s| parse_ingredient(s))
                    .collect::<Result<Vec<_>>>()?;
                cmd_menu_create(&mut store, &name, &ingredients, json)?;
            }
            MenuCommands::SetIngredient {
                item,
                food,
                weight,
                json,
            } => {
                let weight_g = parse_grams(&weight)?;
                cmd_menu_set_ingredient(&mut store, &item, &food, weight_g, json)?;
            }
            MenuCommands::RemoveIngredient { item, food, json } => {
                cmd_menu_remove_ingredient(&mut store, &item, &food, json)?;
            }
            MenuCommands::Delete { name, json } => cmd_menu_delete(&mut store, &name, json)?,
            MenuCommands::Show { name, json } => cmd_menu_show(&store, &name, json)?,
            MenuCommands::List { json } => cmd_menu_list(&store, json)?,
        },
        Commands::Meal { command } => match command {
            MealCommands::Log {
                meal_type,
                items,
                date,
                json,
            } => {
                let meal_type: MealType = meal_type.parse()?;
                let date = parse_date(date)?;
                cmd_meal_log(&mut store, meal_type, items, date, json)?;
            }
            MealCommands::List { date, json } => {
                let date = date.map(Some).map(parse_date).transpose()?;
                cmd_meal_list(&store, date, json)?;
            }
        },
    }

    if mutates {
        save_all(&mut store, &config.files)?;
    }
    Ok(())
}
