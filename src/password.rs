//! Random passwords for BMC accounts.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::commands::PASSWORD_LEN;
use crate::error::{Error, Result};
use crate::secret::SecretString;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "~!@#$%^&*()_+-={}[]:<>?,./";

/// Shape of a generated password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConstraints {
    /// Total length.
    pub length: usize,
    /// Number of digits.
    pub digits: usize,
    /// Number of symbols.
    pub symbols: usize,
    /// Letters are lowercase only.
    pub no_upper: bool,
    /// A character may appear more than once.
    pub allow_repeat: bool,
}

impl Default for PasswordConstraints {
    fn default() -> Self {
        Self {
            length: 10,
            digits: 3,
            symbols: 0,
            no_upper: false,
            allow_repeat: false,
        }
    }
}

impl PasswordConstraints {
    /// Generate a password from the thread-local generator.
    pub fn generate(&self) -> Result<SecretString> {
        self.generate_with(&mut rand::rng())
    }

    /// Generate a password from `rng`.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SecretString> {
        self.validate()?;
        let letters = self.letters();

        let mut out: Vec<char> = Vec::with_capacity(self.length);
        self.pick(rng, &letters, self.length - self.digits - self.symbols, &mut out);
        self.pick(rng, DIGITS, self.digits, &mut out);
        self.pick(rng, SYMBOLS, self.symbols, &mut out);
        out.shuffle(rng);

        Ok(SecretString::new(out.into_iter().collect::<String>()))
    }

    fn letters(&self) -> String {
        if self.no_upper {
            LOWER.to_string()
        } else {
            format!("{LOWER}{UPPER}")
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.length == 0 || self.length > PASSWORD_LEN {
            return Err(Error::InvalidArgument(
                "password length must be between 1 and 20",
            ));
        }
        let Some(letters) = self.length.checked_sub(self.digits + self.symbols) else {
            return Err(Error::InvalidArgument(
                "digits and symbols exceed password length",
            ));
        };
        if !self.allow_repeat
            && (self.digits > DIGITS.len()
                || self.symbols > SYMBOLS.len()
                || letters > self.letters().len())
        {
            return Err(Error::InvalidArgument(
                "not enough distinct characters without repeats",
            ));
        }
        Ok(())
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R, pool: &str, count: usize, out: &mut Vec<char>) {
        let mut pool: Vec<char> = pool.chars().collect();
        for _ in 0..count {
            let index = rng.random_range(0..pool.len());
            if self.allow_repeat {
                out.push(pool[index]);
            } else {
                out.push(pool.swap_remove(index));
            }
        }
    }
}
