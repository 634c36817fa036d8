//! API key token generation

use rand::Rng;

use crate::domain::api_key::model::{KEY_DIGITS, KEY_PREFIX};

/// Source of new key tokens
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Mints `key-number-NNNNNN` from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> String {
        let number: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{}{:0width$}", KEY_PREFIX, number, width = KEY_DIGITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_format() {
        let generator = RandomKeyGenerator;
        for _ in 0..200 {
            let key = generator.generate();
            let digits = key.strip_prefix(KEY_PREFIX).unwrap();
            assert_eq!(digits.len(), 6, "unexpected key {}", key);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
