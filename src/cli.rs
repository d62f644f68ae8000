// src/cli.rs
use clap::{Parser, Subcommand};
use std::io::{self, Write}; // For stdout flush
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::generator::{self, Clamped};
use crate::menu::{write_strength, write_suggestions};
use crate::models::{now_timestamp, Rating, Record};
use crate::scorer;
use log;
use rpassword;

/// Password strength checker, generator and labelled password file.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(arg_required_else_help = false)] // No subcommand opens the menu
pub struct Cli {
    /// Path to the saved passwords file (overrides the config file)
    #[clap(short, long, global = true, value_parser)]
    pub file: Option<PathBuf>,

    /// Path to the configuration file
    #[clap(long, global = true, value_parser)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive numbered menu
    Menu,
    /// Score a password from 0 to 10
    Check {
        /// Password to check; prompted without echo when omitted
        password: Option<String>,
    },
    /// Generate a password with every character class
    Generate {
        /// Length, forced into 4..=200 (defaults to the configured length)
        #[clap(short, long, allow_negative_numbers = true)]
        length: Option<i64>,
        /// Save the generated password under this label
        #[clap(long)]
        save: Option<String>,
    },
    /// Save your own password under a label
    Save {
        label: String,
        /// Password to save; prompted without echo when omitted
        password: Option<String>,
        /// Save even if the password scores as weak
        #[clap(long)]
        force: bool,
    },
    /// List every saved password
    List,
    /// Show every saved password whose line contains LABEL
    Search { label: String },
    /// Replace the first saved password matching LABEL
    Update {
        label: String,
        /// New password; prompted without echo when omitted
        password: Option<String>,
    },
    /// Delete the first saved password matching LABEL
    Delete { label: String },
    /// Delete the whole saved passwords file
    DeleteAll {
        /// Skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
}

/// Handles the parsed CLI command.
/// Returns `Ok(true)` if the menu should run, `Ok(false)` if a command was handled.
pub fn handle_cli_command(command: Option<Commands>, config: &Config) -> AppResult<bool> {
    log::debug!("Handling CLI command: {:?}", command);
    let store = config.open_store();
    let mut out = io::stdout();

    match command {
        None | Some(Commands::Menu) => {
            log::info!("No command given, preparing to open the menu.");
            Ok(true)
        }
        Some(Commands::Check { password }) => {
            let password = password_or_prompt(password, "Enter the password to evaluate: ")?;
            let score = scorer::evaluate(&password);
            write_strength(&mut out, "Score", &score)?;
            write_suggestions(&mut out, &password, &score)?;
            Ok(false)
        }
        Some(Commands::Generate { length, save }) => {
            let clamped = generator::clamp_length(length.unwrap_or(config.default_length));
            match clamped {
                Clamped::RaisedToMin(n) => eprintln!("Length too short. Using minimum length {}.", n),
                Clamped::LoweredToMax(n) => eprintln!("Length too large; limiting to {}.", n),
                Clamped::Unchanged(_) => {}
            }
            let password = generator::generate_password(clamped.length())?;
            println!("{}", password);
            write_strength(&mut io::stderr(), "Strength score", &scorer::evaluate(&password))?;

            if let Some(label) = save {
                let record = Record::new(now_timestamp(), label.as_str(), password.as_str())?;
                store.append(&record)?;
                eprintln!("Password saved with label '{}'!", label);
            }
            Ok(false)
        }
        Some(Commands::Save { label, password, force }) => {
            let password = password_or_prompt(password, "Enter the password: ")?;
            let score = scorer::evaluate(&password);
            write_strength(&mut out, "Password strength", &score)?;
            if score.rating() == Rating::Weak && !force {
                log::warn!("Refusing to save weak password for label '{}'", label);
                return Err(AppError::Cli(format!(
                    "Password is weak ({}/10). Use --force to save it anyway.",
                    score.value
                )));
            }
            let record = Record::new(now_timestamp(), label.as_str(), password.as_str())?;
            store.append(&record)?;
            println!("✓ Password saved for '{}'!", label);
            Ok(false)
        }
        Some(Commands::List) => {
            let lines = store.list()?;
            if lines.is_empty() {
                println!("No saved passwords found.");
            } else {
                for (i, line) in lines.iter().enumerate() {
                    println!("{}. {}", i + 1, line);
                }
                println!("\nTotal: {} password(s)", lines.len());
            }
            log::info!("Listed {} record(s) from {:?}.", lines.len(), store.path());
            Ok(false)
        }
        Some(Commands::Search { label }) => {
            let found = store.find_by_label_substring(&label)?;
            if found.is_empty() {
                println!("No passwords found with label '{}'.", label);
            } else {
                for line in &found {
                    println!("{}", line);
                }
                println!("\n✓ Found {} match(es).", found.len());
            }
            Ok(false)
        }
        Some(Commands::Update { label, password }) => {
            if store.first_match(&label)?.is_none() {
                println!("Label '{}' not found.", label);
                return Ok(false);
            }
            let password = password_or_prompt(password, "Enter new password: ")?;
            if store.replace_first_match(&label, &now_timestamp(), &password)? {
                println!("✓ Password updated for '{}'!", label);
            } else {
                println!("Label '{}' not found.", label);
            }
            Ok(false)
        }
        Some(Commands::Delete { label }) => {
            if store.delete_first_match(&label)? {
                println!("✓ Password deleted for '{}'!", label);
            } else {
                println!("Label '{}' not found.", label);
            }
            Ok(false)
        }
        Some(Commands::DeleteAll { yes }) => {
            let count = store.count()?;
            if count == 0 {
                println!("No saved passwords to delete.");
                return Ok(false);
            }
            if !yes {
                print!("Delete all {} saved password(s)? (y/N): ", count);
                out.flush().map_err(|e| {
                    log::error!("Failed to flush stdout for delete confirmation: {}", e);
                    AppError::Cli(format!("Failed to flush stdout: {}", e))
                })?;
                let mut confirmation = String::new();
                io::stdin().read_line(&mut confirmation).map_err(|e| {
                    log::error!("Failed to read delete confirmation: {}", e);
                    AppError::Cli(format!("Failed to read confirmation: {}", e))
                })?;
                if !confirmation.trim().to_lowercase().starts_with('y') {
                    println!("Cancelled.");
                    log::info!("Delete-all cancelled by user.");
                    return Ok(false);
                }
            }
            store.delete_all()?;
            println!("✓ All passwords deleted.");
            Ok(false)
        }
    }
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> AppResult<String> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password(prompt).map_err(|e| {
            log::error!("Failed to read password: {}", e);
            AppError::Cli(format!("Failed to read password: {}", e))
        })?,
    };
    if password.is_empty() {
        return Err(AppError::Cli("Password cannot be empty.".to_string()));
    }
    Ok(password)
}
