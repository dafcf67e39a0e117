use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the short random strings used for serials, device ids and nonces.
pub const RANDOM_STRING_LEN: usize = 13;

/**
    Source of the cosmetic identifiers handed out during a handshake.

    These only need to look like session values to the box; they are not
    security tokens. Every call must return a fresh value.
*/
pub trait TokenGenerator: Send + Sync {
    /// Session token, twice the length of a random string.
    fn token(&self) -> String {
        format!("{}{}", self.random_string(), self.random_string())
    }

    /// Short base36 string.
    fn random_string(&self) -> String;
}

/// Generator backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokens;

impl TokenGenerator for RandomTokens {
    fn random_string(&self) -> String {
        let mut rng = rand::rng();
        (0..RANDOM_STRING_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect()
    }
}
