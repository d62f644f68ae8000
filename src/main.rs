// src/main.rs
mod cli;
mod codec;
mod config;
mod error;
mod generator;
mod menu;
mod models;
mod scorer;
mod store;

use clap::Parser;

fn main() -> Result<(), error::AppError> {
    env_logger::init(); // Initialize logger
    log::info!("Starting PassCheck-RS application");

    let cli_args = cli::Cli::parse();

    let mut app_config = config::load_config(cli_args.config.as_deref());
    if let Some(file) = cli_args.file {
        log::debug!("Store file overridden on the command line: {:?}", file);
        app_config.store_file = file;
    }

    match cli::handle_cli_command(cli_args.command, &app_config) {
        Ok(should_run_menu) => {
            if should_run_menu {
                if let Err(e) = menu::run_menu(app_config) {
                    log::error!("Menu error: {:#?}", e);
                    eprintln!("Error: {}", e);
                    return Err(e);
                }
            } else {
                log::info!("CLI command processed.");
            }
        }
        Err(e) => {
            log::error!("Application failed: {:#?}", e);
            eprintln!("Error: {}", e);
            return Err(e);
        }
    }

    log::info!("PassCheck-RS application finished successfully.");
    Ok(())
}
