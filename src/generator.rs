// src/generator.rs
use rand::seq::SliceRandom; // For shuffle
use rand::{thread_rng, Rng}; // thread_rng is seeded from OS entropy per process

use crate::error::{GeneratorError, GeneratorResult};

const LOWERCASE_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBER_CHARS: &[u8] = b"0123456789";
const SYMBOL_CHARS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?/";

pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 200;

/// A requested length after it has been forced into `[MIN_LENGTH, MAX_LENGTH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamped {
    Unchanged(usize),
    RaisedToMin(usize),
    LoweredToMax(usize),
}

impl Clamped {
    pub fn length(&self) -> usize {
        match *self {
            Clamped::Unchanged(n) | Clamped::RaisedToMin(n) | Clamped::LoweredToMax(n) => n,
        }
    }
}

pub fn clamp_length(requested: i64) -> Clamped {
    if requested < MIN_LENGTH as i64 {
        Clamped::RaisedToMin(MIN_LENGTH)
    } else if requested > MAX_LENGTH as i64 {
        Clamped::LoweredToMax(MAX_LENGTH)
    } else {
        Clamped::Unchanged(requested as usize)
    }
}

/// Generates a password with the thread-local RNG.
pub fn generate_password(length: usize) -> GeneratorResult<String> {
    generate_password_with(length, &mut thread_rng())
}

/// Generates a password of exactly `length` characters from `rng`.
///
/// When `length >= 4` the result holds at least one lowercase letter, one
/// uppercase letter, one digit and one symbol.
pub fn generate_password_with<R: Rng + ?Sized>(length: usize, rng: &mut R) -> GeneratorResult<String> {
    if length == 0 {
        log::warn!("Refusing to generate a password of length 0");
        return Err(GeneratorError::InvalidLength(length));
    }

    let classes = [LOWERCASE_CHARS, UPPERCASE_CHARS, NUMBER_CHARS, SYMBOL_CHARS];
    let all: Vec<u8> = classes.concat();

    let mut password_bytes: Vec<u8> = Vec::with_capacity(length);
    if length >= classes.len() {
        for class in classes {
            password_bytes.push(pick(class, rng));
        }
    }
    while password_bytes.len() < length {
        password_bytes.push(pick(&all, rng));
    }

    password_bytes.shuffle(rng);

    log::debug!("Generated password of length {}", length);
    // every byte comes from the ASCII tables above
    Ok(password_bytes.into_iter().map(char::from).collect())
}

fn pick<R: Rng + ?Sized>(charset: &[u8], rng: &mut R) -> u8 {
    charset[rng.gen_range(0..charset.len())]
}
