// src/scorer.rs
use crate::models::{ClassFlags, Score};

/// Length at which a password earns the full length bonus.
pub const MIN_STRONG_LEN: usize = 12;
const MAX_SCORE: u8 = 10;

/// Scores a password 0-10 and reports which character classes it uses.
///
/// Length gives up to 4 points, each class present gives 1, and a long password
/// mixing at least three classes gets one more.
pub fn evaluate(password: &str) -> Score {
    let len = password.chars().count();

    let mut score: u8 = if len >= MIN_STRONG_LEN {
        4
    } else if len >= 10 {
        3
    } else if len >= 8 {
        2
    } else if len >= 6 {
        1
    } else {
        0
    };

    let mut flags = ClassFlags::default();
    for c in password.chars() {
        // first matching class wins
        if c.is_ascii_lowercase() {
            flags.lower = true;
        } else if c.is_ascii_uppercase() {
            flags.upper = true;
        } else if c.is_ascii_digit() {
            flags.digit = true;
        } else {
            flags.special = true;
        }
    }

    let classes = flags.count();
    score += classes;
    if len >= MIN_STRONG_LEN && classes >= 3 {
        score += 1;
    }

    Score {
        value: score.min(MAX_SCORE),
        flags,
    }
}

/// Advice for making a password stronger, in display order.
pub fn suggestions(password: &str, score: &Score) -> Vec<String> {
    if score.value >= 8 {
        return vec!["Excellent! Password is strong.".to_string()];
    }

    let mut tips = Vec::new();
    if password.chars().count() < MIN_STRONG_LEN {
        tips.push(format!("Use at least {} characters.", MIN_STRONG_LEN));
    }
    if !score.flags.lower {
        tips.push("Add lowercase letters (a-z).".to_string());
    }
    if !score.flags.upper {
        tips.push("Add uppercase letters (A-Z).".to_string());
    }
    if !score.flags.digit {
        tips.push("Add digits (0-9).".to_string());
    }
    if !score.flags.special {
        tips.push("Add special characters (!@#$).".to_string());
    }
    tips.push("Avoid common patterns (1234, qwerty).".to_string());
    tips
}
