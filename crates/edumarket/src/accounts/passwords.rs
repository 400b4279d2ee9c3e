use rand::Rng;

const INITIAL_PASSWORD_LEN: usize = 8;
const INITIAL_PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Outcome of checking a candidate password against a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Match,
    /// Stored value was plaintext from before hashing was enforced; caller must rehash.
    LegacyMatch,
    Mismatch,
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// bcrypt hasher with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(plain, self.cost)?)
    }

    pub fn verify(&self, plain: &str, stored: &str) -> Result<PasswordCheck, PasswordError> {
        if plain.is_empty() {
            return Ok(PasswordCheck::Mismatch);
        }

        if stored.starts_with("$2") {
            return Ok(if bcrypt::verify(plain, stored)? {
                PasswordCheck::Match
            } else {
                PasswordCheck::Mismatch
            });
        }

        if stored == plain {
            Ok(PasswordCheck::LegacyMatch)
        } else {
            Ok(PasswordCheck::Mismatch)
        }
    }
}

/// Random lowercase alphanumeric password handed to newly approved institutions.
pub fn generate_initial_password() -> String {
    let mut rng = rand::thread_rng();
    (0..INITIAL_PASSWORD_LEN)
        .map(|_| {
            let index = rng.gen_range(0..INITIAL_PASSWORD_ALPHABET.len());
            char::from(INITIAL_PASSWORD_ALPHABET[index])
        })
        .collect()
}
