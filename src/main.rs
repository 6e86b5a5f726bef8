//! gymfuel - workout logging, macro tracking, food lookup and exercise image mapping

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gymfuel::catalog::ExerciseCatalog;
use gymfuel::db::Database;
use gymfuel::images::{self, FixOptions, ImageDatabase, ImageMapping};
use gymfuel::nutrition::lookup::{FoodLookup, FoodProduct};
use gymfuel::nutrition::{self, MacroProgress, MacroTargets, Macros, Meal};
use gymfuel::workout::{Analytics, MuscleBalance, Workout, WorkoutExercise, WorkoutSet};
use gymfuel::Config;

#[derive(Parser)]
#[command(name = "gymfuel")]
#[command(author, version, about = "Workout log, macro tracker and exercise image tools")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "GYMFUEL_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a workout with one exercise
    Log {
        /// Exercise name (e.g., "Bench Press")
        exercise: String,

        /// Workout name, defaults to the exercise name
        #[arg(long)]
        name: Option<String>,

        /// Number of sets
        #[arg(short, long, default_value = "3")]
        sets: u32,

        /// Number of reps per set
        #[arg(short, long, default_value = "10")]
        reps: u32,

        /// Weight in kg
        #[arg(short, long, default_value = "0")]
        weight: f64,

        /// Duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,
    },

    /// List workout history
    List {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Only workouts not yet synced
        #[arg(long)]
        unsynced: bool,
    },

    /// Show training statistics
    Stats {
        /// Filter by exercise name
        exercise: Option<String>,

        /// Exercise catalog, enables the weekly muscle group balance
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Meal log
    #[command(subcommand)]
    Meal(MealCommand),

    /// Show macro progress for a day
    Macros {
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Also show the previous N days (at most a year)
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=366))]
        days: u32,
    },

    /// Show or set daily macro targets
    Targets(TargetArgs),

    /// Food lookup
    #[command(subcommand)]
    Food(FoodCommand),

    /// Exercise image mapping tools
    #[command(subcommand)]
    Images(ImagesCommand),
}

#[derive(Subcommand)]
enum MealCommand {
    /// Add a meal with known macros
    Add {
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Time of day, HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "0")]
        calories: f64,
        #[arg(long, default_value = "0")]
        protein: f64,
        #[arg(long, default_value = "0")]
        carbs: f64,
        #[arg(long, default_value = "0")]
        fat: f64,
    },

    /// Look up a barcode and log it as a meal
    Scan {
        barcode: String,
        /// Portion in grams, defaults to one serving
        #[arg(short, long)]
        grams: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Remove a meal by id
    Remove {
        id: u64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Args)]
struct TargetArgs {
    #[arg(long)]
    calories: Option<f64>,
    #[arg(long)]
    protein: Option<f64>,
    #[arg(long)]
    carbs: Option<f64>,
    #[arg(long)]
    fat: Option<f64>,
}

#[derive(Subcommand)]
enum FoodCommand {
    /// Look up a product by barcode
    Barcode {
        barcode: String,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Search foods by name
    Search {
        query: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct MappingFiles {
    /// Exercise catalog JSON
    #[arg(long)]
    catalog: PathBuf,

    /// Exercise -> equipment -> image id JSON
    #[arg(long)]
    mapping: PathBuf,
}

#[derive(Subcommand)]
enum ImagesCommand {
    /// Check that every catalog variant maps to a known image
    Validate {
        #[command(flatten)]
        files: MappingFiles,

        /// Image database export (JSON array with ids)
        #[arg(long)]
        image_db: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply patches and fill gaps from the image database, writing the mapping back
    Fix {
        #[command(flatten)]
        files: MappingFiles,

        #[arg(long)]
        image_db: PathBuf,

        /// Hand-written corrections in mapping format
        #[arg(long)]
        patches: Option<PathBuf>,

        /// Remove entries not in the catalog
        #[arg(long)]
        prune: bool,

        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,

        /// Write here instead of overwriting the mapping
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the image id of one exercise variant
    Lookup {
        #[arg(long)]
        mapping: PathBuf,
        exercise: String,
        equipment: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Commands::Log { exercise, name, sets, reps, weight, duration } => {
            let db = Database::open(&config.db_path)?;
            let workout = Workout {
                id: 0,
                date: Utc::now(),
                name: name.unwrap_or_else(|| exercise.clone()),
                exercises: vec![WorkoutExercise {
                    name: exercise.clone(),
                    sets: (0..sets)
                        .map(|_| WorkoutSet { weight, reps, completed: true })
                        .collect(),
                }],
                duration,
                synced: false,
            };
            let id = db.add_workout(workout)?;
            println!("Logged: {} - {}x{} @ {}kg (id: {})", exercise, sets, reps, weight, id);
        }

        Commands::List { limit, unsynced } => {
            let db = Database::open(&config.db_path)?;
            let workouts = if unsynced { db.unsynced_workouts()? } else { db.get_workouts()? };
            println!("Recent workouts:");
            println!("{:-<70}", "");
            for w in workouts.iter().take(limit) {
                let exercises: Vec<_> = w.exercises.iter().map(|e| e.name.as_str()).collect();
                println!(
                    "{:>4} | {} | {:20} | {:>3} sets | {:>8.0} kg | {}{}",
                    w.id,
                    w.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    w.name,
                    w.completed_sets(),
                    w.volume(),
                    exercises.join(", "),
                    if w.synced { "" } else { " *" }
                );
            }
        }

        Commands::Stats { exercise, catalog } => {
            let db = Database::open(&config.db_path)?;
            let workouts = db.get_workouts()?;

            println!("Training Statistics");
            println!("{:-<40}", "");

            if let Some(path) = catalog {
                let catalog = ExerciseCatalog::load(path)?;
                let balance = MuscleBalance::from_workouts(&workouts, &catalog, Utc::now(), 7);
                println!("Sets per muscle group (7 days):");
                for (group, sets, bar) in balance.report() {
                    println!("  {} {:12} {}", bar, group, sets);
                }
                let underworked: Vec<_> =
                    balance.underworked(3).iter().map(|g| g.to_string()).collect();
                println!("Needs work: {}", underworked.join(", "));
                if !balance.unknown_exercises().is_empty() {
                    println!("Not in catalog: {}", balance.unknown_exercises().join(", "));
                }
                println!();
            }

            let analytics = Analytics::new(workouts);
            if let Some(ex) = exercise {
                println!("Exercise: {}", ex);
                println!("Total volume: {:.0} kg", analytics.total_volume(&ex));

                if let Some((sets, reps)) = analytics.predict_next_load(&ex) {
                    println!("Suggested next: {}x{}", sets, reps);
                }
            } else {
                let freq = analytics.weekly_frequency();
                println!("Weekly frequency: {:.1} sessions/week", freq);
            }
        }

        Commands::Meal(command) => run_meal(command, &config).await?,

        Commands::Macros { date, days } => {
            let db = Database::open(&config.db_path)?;
            let targets = db.macro_targets()?;
            let day = date.unwrap_or_else(|| Local::now().date_naive());

            let Some(dates) = nutrition::days_ending(day, days) else {
                bail!("{} days before {} is out of range", days, day);
            };
            for date in dates {
                let log = db.day_log(date)?;
                print_day(&log.date, log.totals(), &targets, log.meals.len());
            }
        }

        Commands::Targets(args) => {
            let db = Database::open(&config.db_path)?;
            let mut targets = db.macro_targets()?;
            let changed = args.calories.is_some()
                || args.protein.is_some()
                || args.carbs.is_some()
                || args.fat.is_some();

            if changed {
                let t = &mut targets.0;
                t.calories = args.calories.unwrap_or(t.calories);
                t.protein = args.protein.unwrap_or(t.protein);
                t.carbs = args.carbs.unwrap_or(t.carbs);
                t.fat = args.fat.unwrap_or(t.fat);
                db.set_macro_targets(&targets)?;
                info!("Macro targets updated");
            }

            let t = targets.0;
            println!(
                "Targets: {:.0} kcal | P {:.0} g | C {:.0} g | F {:.0} g",
                t.calories, t.protein, t.carbs, t.fat
            );
        }

        Commands::Food(command) => run_food(command, &config).await?,

        Commands::Images(command) => run_images(command)?,
    }

    Ok(())
}

async fn run_meal(command: MealCommand, config: &Config) -> Result<()> {
    let db = Database::open(&config.db_path)?;
    let today = || Local::now().date_naive();

    match command {
        MealCommand::Add { name, date, time, calories, protein, carbs, fat } => {
            let date = date.unwrap_or_else(today);
            let meal = Meal {
                id: 0,
                name: name.clone(),
                time,
                macros: Macros::new(calories, protein, carbs, fat),
                barcode: None,
            };
            let id = db.add_meal(date, meal)?;
            println!("Added {} on {} (id: {})", name, date, id);
        }

        MealCommand::Scan { barcode, grams, date } => {
            let date = date.unwrap_or_else(today);
            let lookup = FoodLookup::from_config(config)?;
            let outcome = lookup.barcode(&barcode).await;

            let Some(product) = outcome.product else {
                bail!("No product found for barcode {}", barcode);
            };
            let Some(mut meal) = product.to_meal(grams) else {
                bail!("{} ({}) has no nutrition data", product.name, product.source);
            };
            meal.time = Some(Local::now().format("%H:%M").to_string());

            let macros = meal.macros;
            let id = db.add_meal(date, meal)?;
            println!(
                "Added {} from {} (id: {}): {:.0} kcal | P {:.1} | C {:.1} | F {:.1}",
                product.name, product.source, id, macros.calories, macros.protein, macros.carbs,
                macros.fat
            );
        }

        MealCommand::Remove { id, date } => {
            let date = date.unwrap_or_else(today);
            if db.remove_meal(date, id)? {
                println!("Removed meal {} on {}", id, date);
            } else {
                bail!("No meal {} on {}", id, date);
            }
        }
    }
    Ok(())
}

async fn run_food(command: FoodCommand, config: &Config) -> Result<()> {
    let lookup = FoodLookup::from_config(config)?;

    match command {
        FoodCommand::Barcode { barcode, json } => {
            let outcome = lookup.barcode(&barcode).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if let Some(product) = &outcome.product {
                print_product(product);
            } else {
                println!("Not found: {}", barcode);
            }
        }

        FoodCommand::Search { query, limit, json } => {
            let results = lookup.search(&query, limit).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No foods match \"{}\"", query);
            } else {
                for product in &results {
                    print_product(product);
                }
            }
        }
    }
    Ok(())
}

fn run_images(command: ImagesCommand) -> Result<()> {
    match command {
        ImagesCommand::Validate { files, image_db, json } => {
            let catalog = ExerciseCatalog::load(&files.catalog)?;
            let mapping = ImageMapping::load(&files.mapping)?;
            let image_db = image_db.map(ImageDatabase::load).transpose()?;

            let report = images::validate(&catalog, &mapping, image_db.as_ref());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
            if !report.is_clean() {
                bail!("image mapping has {} problems", report.problem_count());
            }
        }

        ImagesCommand::Fix { files, image_db, patches, prune, dry_run, output } => {
            let catalog = ExerciseCatalog::load(&files.catalog)?;
            let image_db = ImageDatabase::load(&image_db)?;
            let patches = patches.map(ImageMapping::load).transpose()?;

            let run = images::fix_file(
                &catalog,
                &files.mapping,
                &image_db,
                patches.as_ref(),
                FixOptions { prune_orphans: prune, dry_run },
                output.as_deref(),
            )?;
            print!("{}", run.summary);

            match run.written {
                Some(target) => println!("Wrote {}", target.display()),
                None if dry_run => println!("Dry run, nothing written"),
                None => println!("Mapping already up to date"),
            }
        }

        ImagesCommand::Lookup { mapping, exercise, equipment } => {
            let mapping = ImageMapping::load(&mapping)?;
            match mapping.resolve(&exercise, &equipment) {
                Some(id) => println!("{}", id),
                None => bail!("no image for {} [{}]", exercise, equipment),
            }
        }
    }
    Ok(())
}

fn print_day(date: &NaiveDate, consumed: Macros, targets: &MacroTargets, meals: usize) {
    println!("{} ({} meals)", date, meals);
    println!("{:-<56}", "");
    for (label, unit, progress) in MacroProgress::new(consumed, targets).rows() {
        let note = if progress.is_over() {
            format!("over by {:.0}", progress.consumed - progress.target)
        } else {
            format!("{:.0} left", progress.remaining())
        };
        println!(
            "{:9} {} {:>6.0}/{:<6.0}{:4} {}",
            label,
            progress.bar(20),
            progress.consumed,
            progress.target,
            unit,
            note
        );
    }
    println!();
}

fn print_product(product: &FoodProduct) {
    let brand = product.brand.as_deref().map(|b| format!(" ({b})")).unwrap_or_default();
    println!("{}{} [{}]", product.name, brand, product.source);
    if let Some(code) = &product.barcode {
        println!("  barcode: {}", code);
    }
    if let Some(serving) = &product.serving_size {
        println!("  serving: {}", serving);
    }
    if let Some(m) = product.per_100g {
        println!(
            "  per 100 g: {:.0} kcal | P {:.1} | C {:.1} | F {:.1}",
            m.calories, m.protein, m.carbs, m.fat
        );
    }
    if let Some(m) = product.per_serving {
        println!(
            "  per serving: {:.0} kcal | P {:.1} | C {:.1} | F {:.1}",
            m.calories, m.protein, m.carbs, m.fat
        );
    }
    if !product.has_macros() {
        println!("  no nutrition data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_db_flag_reads_env() {
        let command = Cli::command();
        let db = command
            .get_arguments()
            .find(|arg| arg.get_id() == "db")
            .unwrap();
        assert_eq!(db.get_env(), Some(std::ffi::OsStr::new("GYMFUEL_DB")));
    }

    #[test]
    fn test_macros_days_bounded() {
        assert!(Cli::try_parse_from(["gymfuel", "macros", "--days", "7"]).is_ok());
        assert!(Cli::try_parse_from(["gymfuel", "macros", "--days", "100000000"]).is_err());
        assert!(Cli::try_parse_from(["gymfuel", "macros", "--days", "-1"]).is_err());
    }
}
