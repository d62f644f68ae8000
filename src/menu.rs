// src/menu.rs
use crate::config::Config;
use crate::error::{AppError, AppResult, InputError};
use crate::generator::{self, Clamped};
use crate::models::{now_timestamp, Rating, Record, Score};
use crate::scorer::{self, MIN_STRONG_LEN};
use crate::store::RecordStore;
use log;
use std::io::{self, BufRead, Write};

/// Runs the menu on the process console against the configured store.
pub fn run_menu(config: Config) -> AppResult<()> {
    let store = config.open_store();
    log::info!("Opening menu for store {:?} (temp file {:?})", store.path(), store.temp_path());
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut menu = Menu::new(stdin.lock(), stdout.lock(), store, config);
    menu.run()
}

/// Line-oriented numbered menu over any input/output pair.
pub struct Menu<R, W> {
    input: R,
    output: W,
    store: RecordStore,
    config: Config,
    should_quit: bool,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, store: RecordStore, config: Config) -> Self {
        Menu {
            input,
            output,
            store,
            config,
            should_quit: false,
        }
    }

    /// Runs until the exit choice or end of input.
    pub fn run(&mut self) -> AppResult<()> {
        writeln!(self.output, "=== Password Manager & Generator ===")?;
        match self.store.count() {
            Ok(0) => {}
            Ok(n) => writeln!(self.output, "You have {} saved password(s).", n)?,
            Err(e) => {
                log::warn!("Could not count saved records at start: {}", e);
                writeln!(self.output, "Could not read saved passwords: {}", e)?;
            }
        }
        writeln!(self.output)?;

        while !self.should_quit {
            self.show_menu()?;
            let line = match self.prompt("Enter choice: ")? {
                Some(line) => line,
                None => {
                    log::info!("Input closed, leaving menu.");
                    break;
                }
            };

            match line.trim().parse::<u32>() {
                Ok(choice) => {
                    log::debug!("Menu choice: {}", choice);
                    let result = self.on_choice(choice);
                    self.report(result)?;
                }
                Err(_) => {
                    writeln!(self.output, "Invalid input. Please enter a number.")?;
                }
            }
            writeln!(self.output)?;
        }
        Ok(())
    }

    fn show_menu(&mut self) -> AppResult<()> {
        writeln!(self.output, "===== MENU =====")?;
        writeln!(self.output, "  1. Check password strength")?;
        writeln!(self.output, "  2. Generate a strong password")?;
        writeln!(self.output, "  3. Save a new password")?;
        writeln!(self.output, "  4. View all saved passwords")?;
        writeln!(self.output, "  5. Search password by label")?;
        writeln!(self.output, "  6. Update a password")?;
        writeln!(self.output, "  7. Delete a password")?;
        writeln!(self.output, "  8. Delete all passwords")?;
        writeln!(self.output, "  9. Exit")?;
        writeln!(self.output, "================")?;
        Ok(())
    }

    fn on_choice(&mut self, choice: u32) -> AppResult<()> {
        match choice {
            1 => self.check_password(),
            2 => self.generate_password(),
            3 => self.save_user_password(),
            4 => self.view_saved_passwords(),
            5 => self.search_by_label(),
            6 => self.update_password(),
            7 => self.delete_by_label(),
            8 => self.delete_all_passwords(),
            9 => {
                writeln!(self.output, "Exiting. Stay secure!")?;
                self.should_quit = true;
                Ok(())
            }
            _ => {
                writeln!(self.output, "Invalid choice. Try again.")?;
                Ok(())
            }
        }
    }

    /// Turns a failed action into a message; only console failures escape.
    fn report(&mut self, result: AppResult<()>) -> AppResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(AppError::Input(InputError::Closed)) => {
                log::info!("Input closed during an action, leaving menu.");
                self.should_quit = true;
                Ok(())
            }
            Err(AppError::Input(e)) => {
                writeln!(self.output, "{}.", e)?;
                Ok(())
            }
            Err(AppError::Io(e)) => Err(AppError::Io(e)),
            Err(e) => {
                log::error!("Menu action failed: {}", e);
                writeln!(self.output, "Error: {}", e)?;
                Ok(())
            }
        }
    }

    fn check_password(&mut self) -> AppResult<()> {
        let password = self.prompt_password("\nEnter the password to evaluate: ")?;
        let score = scorer::evaluate(&password);

        writeln!(self.output, "\nPassword: {}", password)?;
        write_strength(&mut self.output, "Score", &score)?;
        write_suggestions(&mut self.output, &password, &score)?;
        Ok(())
    }

    fn generate_password(&mut self) -> AppResult<()> {
        let prompt = format!("\nEnter desired password length (suggested >= {}): ", MIN_STRONG_LEN);
        let raw = self.prompt_required(&prompt)?;
        let requested: i64 = raw
            .trim()
            .parse()
            .map_err(|_| InputError::NotANumber(raw.trim().to_string()))?;

        let clamped = generator::clamp_length(requested);
        match clamped {
            Clamped::RaisedToMin(n) => writeln!(self.output, "Length too short. Using minimum length {}.", n)?,
            Clamped::LoweredToMax(n) => writeln!(self.output, "Length too large; limiting to {}.", n)?,
            Clamped::Unchanged(_) => {}
        }

        let password = generator::generate_password(clamped.length())?;
        writeln!(self.output, "\n=== GENERATED PASSWORD ===")?;
        writeln!(self.output, "{}", password)?;
        writeln!(self.output, "==========================")?;

        let score = scorer::evaluate(&password);
        writeln!(self.output)?;
        write_strength(&mut self.output, "Strength score", &score)?;

        if self.ask_yes_no("\nSave this password? (y/n): ")? {
            let label = self.prompt_label("Enter a label (e.g., Gmail, Facebook): ")?;
            let record = Record::new(now_timestamp(), label.as_str(), password.as_str())?;
            self.store.append(&record)?;
            writeln!(self.output, "Password saved with label '{}'!", label)?;
        }
        Ok(())
    }

    fn save_user_password(&mut self) -> AppResult<()> {
        writeln!(self.output, "\n=== Save Your Password ===")?;
        let password = self.prompt_password("Enter the password: ")?;
        let label = self.prompt_label("Enter a label (e.g., Gmail, Facebook, Netflix): ")?;

        let score = scorer::evaluate(&password);
        writeln!(self.output)?;
        write_strength(&mut self.output, "Password strength", &score)?;

        if score.rating() == Rating::Weak {
            writeln!(self.output, "\nWARNING: This password is weak!")?;
            if !self.ask_yes_no("Save anyway? (y/n): ")? {
                writeln!(self.output, "Password not saved.")?;
                return Ok(());
            }
        }

        let record = Record::new(now_timestamp(), label.as_str(), password.as_str())?;
        self.store.append(&record)?;
        writeln!(self.output, "\n✓ Password saved for '{}'!", label)?;
        Ok(())
    }

    fn view_saved_passwords(&mut self) -> AppResult<()> {
        let lines = self.store.list()?;
        if lines.is_empty() {
            writeln!(self.output, "\nNo saved passwords found.")?;
            return Ok(());
        }

        writeln!(self.output, "\n===== ALL SAVED PASSWORDS =====")?;
        for (i, line) in lines.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, line)?;
        }
        writeln!(self.output, "\nTotal: {} password(s)", lines.len())?;
        Ok(())
    }

    fn search_by_label(&mut self) -> AppResult<()> {
        let label = self.prompt_label("\nEnter label to search (e.g., Gmail, Facebook): ")?;
        let found = self.store.find_by_label_substring(&label)?;

        writeln!(self.output, "\n=== Search Results for '{}' ===", label)?;
        if found.is_empty() {
            writeln!(self.output, "No passwords found with label '{}'.", label)?;
            return Ok(());
        }
        for line in &found {
            writeln!(self.output, "{}", line)?;
        }
        writeln!(self.output, "\n✓ Found {} match(es).", found.len())?;
        Ok(())
    }

    fn update_password(&mut self) -> AppResult<()> {
        writeln!(self.output, "\n=== Update Password ===")?;
        let label = self.prompt_label("Enter label of password to update: ")?;

        let current = match self.store.first_match(&label)? {
            Some(line) => line,
            None => {
                writeln!(self.output, "Label '{}' not found.", label)?;
                return Ok(());
            }
        };
        writeln!(self.output, "Current: {}", current)?;

        let new_password = self.prompt_password("Enter new password: ")?;
        if self.store.replace_first_match(&label, &now_timestamp(), &new_password)? {
            writeln!(self.output, "\n✓ Password updated for '{}'!", label)?;
        } else {
            writeln!(self.output, "Label '{}' not found.", label)?;
        }
        Ok(())
    }

    fn delete_by_label(&mut self) -> AppResult<()> {
        writeln!(self.output, "\n=== Delete Password ===")?;
        let label = self.prompt_label("Enter label to delete: ")?;

        if let Some(line) = self.store.first_match(&label)? {
            writeln!(self.output, "Found: {}", line)?;
        }
        if self.store.delete_first_match(&label)? {
            writeln!(self.output, "\n✓ Password deleted for '{}'!", label)?;
        } else {
            writeln!(self.output, "Label '{}' not found.", label)?;
        }
        Ok(())
    }

    fn delete_all_passwords(&mut self) -> AppResult<()> {
        let count = self.store.count()?;
        if count == 0 {
            writeln!(self.output, "\nNo saved passwords to delete.")?;
            return Ok(());
        }

        writeln!(self.output, "\nYou have {} saved password(s).", count)?;
        writeln!(self.output, "WARNING: This will delete ALL passwords!")?;
        if self.ask_yes_no("Are you sure? (y/n): ")? {
            self.store.delete_all()?;
            writeln!(self.output, "✓ All passwords deleted.")?;
        } else {
            writeln!(self.output, "Cancelled.")?;
        }
        Ok(())
    }

    /// Writes `text`, then reads one line without its terminator. `None` at end of input.
    fn prompt(&mut self, text: &str) -> AppResult<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn prompt_required(&mut self, text: &str) -> AppResult<String> {
        self.prompt(text)?.ok_or_else(|| InputError::Closed.into())
    }

    /// A password is the first whitespace-delimited word of the line.
    fn prompt_password(&mut self, text: &str) -> AppResult<String> {
        let line = self.prompt_required(text)?;
        let password = line
            .split_whitespace()
            .next()
            .ok_or(InputError::Empty("Password"))?
            .to_string();
        if password.chars().count() > self.config.max_password_len {
            return Err(InputError::TooLong {
                what: "Password",
                max: self.config.max_password_len,
            }
            .into());
        }
        Ok(password)
    }

    fn prompt_label(&mut self, text: &str) -> AppResult<String> {
        let label = self.prompt_required(text)?;
        if label.is_empty() {
            return Err(InputError::Empty("Label").into());
        }
        if label.chars().count() > self.config.max_label_len {
            return Err(InputError::TooLong {
                what: "Label",
                max: self.config.max_label_len,
            }
            .into());
        }
        Ok(label)
    }

    fn ask_yes_no(&mut self, text: &str) -> AppResult<bool> {
        let answer = self.prompt_required(text)?;
        Ok(matches!(answer.trim_start().chars().next(), Some('y') | Some('Y')))
    }
}

/// `<title>: <score>/10  [<RATING>]`
pub fn write_strength<W: Write>(out: &mut W, title: &str, score: &Score) -> std::io::Result<()> {
    writeln!(out, "{}: {}/10  [{}]", title, score.value, score.rating())
}

pub fn write_suggestions<W: Write>(out: &mut W, password: &str, score: &Score) -> std::io::Result<()> {
    writeln!(out, "\nSuggestions:")?;
    for tip in scorer::suggestions(password, score) {
        writeln!(out, "  - {}", tip)?;
    }
    Ok(())
}
