mod api;
mod cli;
mod config;
mod db;
mod error;
mod etl;
mod models;

use clap::Parser;
use cli::{App, Cli, MENU_OPTIONS};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use error::Result;
use std::env;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up `tracing`: `RUST_LOG` filter (default `info`), `LOG_FORMAT=json` for
/// structured output, and a daily-rolling file under `LOG_DIR` when set.
///
/// The returned guard must stay alive for buffered file logs to be flushed.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));

    let (json_layer, text_layer) = if json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    let (file_layer, guard) = match env::var("LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "weather-etl.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        },
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();

    guard
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = init_logging();
    let cli = Cli::parse();

    info!("Initializing weather ETL...");

    let app = match App::new().await {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            eprintln!("{} {}", "Error: Failed to initialize application:".red(), e);
            return Err(e);
        },
    };

    // Non-interactive: run the single command and surface its error to the caller.
    if let Some(command) = cli.command {
        return app.run_command(command).await.map_err(|e| {
            error!("Command execution failed: {:?}", e);
            eprintln!("{} {}", "Error executing command:".red(), e.to_string().red());
            e
        });
    }

    println!("{}", "Welcome to the Weather ETL CLI!".cyan().bold());

    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&MENU_OPTIONS)
            .default(0)
            .interact_opt()?
            .unwrap_or(MENU_OPTIONS.len() - 1);

        println!("\n---\n");

        let Some(command) = cli::menu_command(selection) else {
            println!("{}", "Exiting application. Goodbye!".green());
            break;
        };

        if let Err(e) = app.run_command(command).await {
            error!("Command execution failed: {:?}", e);
            println!(
                "{} {}",
                "Error executing command:".red(),
                e.to_string().red()
            );
        }

        println!("\n---\n");
    }

    Ok(())
}
