use analytics::{PredictionEngine, PredictionError, PredictionReport};
use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};
use configuration::{Config, LogLevel};
use core_types::Town;
use database::{DbRepository, SqlitePool, connect, list_tables, reset_database, run_migrations, table_columns};
use std::net::SocketAddr;
use weather::{OpenMeteoClient, WeatherGateway};

/// The main entry point for the Harvest application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment and config.toml still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = configuration::load_config().context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Migrate => {
            let pool = open_database(&config).await?;
            run_migrations(&pool).await?;
            println!("Migrations applied.");
            Ok(())
        }
        Commands::ResetDb(args) => handle_reset(args, &config).await,
        Commands::Schema(args) => handle_schema(args, &config).await,
        Commands::Predict(args) => handle_predict(args, config).await,
        Commands::Weather(args) => handle_weather(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Weather, cost/profit tracking and market forecasts for Anuradhapura farmers.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides `logging.level` from the configuration.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON API server.
    Serve(ServeArgs),
    /// Apply pending database migrations.
    Migrate,
    /// Drop every table and recreate the schema. All data is lost.
    ResetDb(ResetArgs),
    /// List the database tables, or the columns of one table.
    Schema(SchemaArgs),
    /// Fit the price/profit models over all stored submissions and print the forecast.
    Predict(PredictArgs),
    /// Print current conditions and the daily forecast for a town.
    Weather(WeatherArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Listen address, overriding `server.host` and `server.port` (e.g. "0.0.0.0:8080").
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct ResetArgs {
    /// Confirms that every user, session and submission may be deleted.
    #[arg(long)]
    yes: bool,
}

#[derive(Parser)]
struct SchemaArgs {
    #[arg(long)]
    table: Option<String>,
}

#[derive(Parser)]
struct PredictArgs {
    /// Number of future points, overriding `prediction.horizon`.
    #[arg(long)]
    horizon: Option<usize>,
}

#[derive(Parser)]
struct WeatherArgs {
    /// Town name, e.g. "Mihintale". Case-insensitive.
    town: Town,

    /// Forecast days (1-16), overriding `weather.forecast_days`.
    #[arg(long)]
    days: Option<u8>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_database(config: &Config) -> anyhow::Result<SqlitePool> {
    connect(&config.database)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.url))
}

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        config.server.host = addr.ip().to_string();
        config.server.port = addr.port();
    }
    web_server::run_server(config).await
}

async fn handle_reset(args: ResetArgs, config: &Config) -> anyhow::Result<()> {
    if !args.yes {
        bail!("Refusing to reset {} without --yes", config.database.url);
    }
    let pool = open_database(config).await?;
    tracing::warn!(url = %config.database.url, "Resetting database.");
    reset_database(&pool).await?;
    println!("Database reset: all tables recreated.");
    Ok(())
}

async fn handle_schema(args: SchemaArgs, config: &Config) -> anyhow::Result<()> {
    let pool = open_database(config).await?;
    let mut table = styled_table();

    match args.table {
        Some(name) => {
            let columns = table_columns(&pool, &name)
                .await
                .with_context(|| format!("No table named '{name}'"))?;
            table.set_header(header_cells(&["Column", "Type", "Not null", "Primary key"]));
            for column in columns {
                table.add_row(vec![
                    Cell::new(&column.name),
                    Cell::new(&column.data_type),
                    Cell::new(yes_no(column.not_null)),
                    Cell::new(yes_no(column.primary_key)),
                ]);
            }
        }
        None => {
            table.set_header(header_cells(&["Table"]));
            for name in list_tables(&pool).await? {
                table.add_row(vec![Cell::new(name)]);
            }
        }
    }

    println!("{table}");
    Ok(())
}

async fn handle_predict(args: PredictArgs, config: Config) -> anyhow::Result<()> {
    let horizon = args.horizon.unwrap_or(config.prediction.horizon);
    let engine = PredictionEngine::new(config.prediction.clone())?;

    let pool = open_database(&config).await?;
    run_migrations(&pool).await?;
    let records = DbRepository::new(pool).list_market_data().await?;

    match engine.fit_and_predict(&records, horizon) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(PredictionError::InsufficientData { required, actual }) => {
            println!("Not enough data yet: {actual} record(s) stored, at least {required} needed.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &PredictionReport) {
    let today = Utc::now().date_naive();
    let mut forecast = styled_table();
    forecast.set_header(header_cells(&["Step", "Date", "Market price", "Net profit"]));
    for (i, (price, profit)) in report
        .price_predictions
        .iter()
        .zip(&report.profit_predictions)
        .enumerate()
    {
        let date = today + Duration::days(30 * (i as i64 + 1));
        let profit_cell = Cell::new(format!("{profit:.2}"))
            .fg(if *profit >= 0.0 { Color::Green } else { Color::Red });
        forecast.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date.format("%Y-%m-%d")),
            Cell::new(format!("{price:.2}")),
            profit_cell,
        ]);
    }
    println!("{forecast}");

    let mut metrics = styled_table();
    metrics.set_header(header_cells(&["Model", "MSE", "R²"]));
    for (name, m) in [("Price", &report.price_metrics), ("Profit", &report.profit_metrics)] {
        let r2 = m.r2.map_or_else(|| "undefined".to_string(), |r| format!("{r:.4}"));
        metrics.add_row(vec![Cell::new(name), Cell::new(format!("{:.4}", m.mse)), Cell::new(r2)]);
    }
    println!("{metrics}");
    println!(
        "Method: {:?}, {} record(s) used ({} train / {} held out).",
        report.method, report.records_used, report.train_size, report.test_size
    );
}

async fn handle_weather(args: WeatherArgs, config: &Config) -> anyhow::Result<()> {
    let client = OpenMeteoClient::new(&config.weather)?;
    let days = args.days.unwrap_or(config.weather.forecast_days);

    let current = client.get_current(args.town).await?;
    println!(
        "{} at {}: {}, {:.1}°C, humidity {:.0}%, wind {:.1} km/h, precipitation {:.1} mm",
        args.town,
        current.observed_at.format("%Y-%m-%d %H:%M"),
        current.description,
        current.temperature_c,
        current.relative_humidity_pct,
        current.wind_speed_kmh,
        current.precipitation_mm
    );

    let mut table = styled_table();
    table.set_header(header_cells(&["Date", "Conditions", "Max °C", "Min °C", "Rain mm"]));
    for day in client.get_forecast(args.town, days).await? {
        table.add_row(vec![
            Cell::new(day.date),
            Cell::new(&day.description),
            Cell::new(format!("{:.1}", day.temperature_max_c)),
            Cell::new(format!("{:.1}", day.temperature_min_c)),
            Cell::new(format!("{:.1}", day.precipitation_mm)),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).fg(Color::Cyan).add_attribute(Attribute::Bold))
        .collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
