use crate::core::types::{Nonce, TokenId};

pub trait FromRandom {
    fn from_random() -> Self;
}

impl FromRandom for TokenId {
    fn from_random() -> Self {
        TokenId(random_string(32))
    }
}

// EIP-4361 nonces must be alphanumeric.
impl FromRandom for Nonce {
    fn from_random() -> Self {
        Nonce(alphanumeric(16))
    }
}

fn alphanumeric(size: usize) -> String {
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(size)
        .map(|b| b as char)
        .collect()
}

pub fn random_string(size: usize) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    URL_SAFE_NO_PAD.encode(alphanumeric(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_are_alphanumeric_and_distinct() {
        let a = Nonce::from_random();
        let b = Nonce::from_random();
        assert_eq!(a.0.len(), 16);
        assert!(a.0.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
