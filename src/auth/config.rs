use std::time::Duration;

const DEFAULT_TOKEN_EXPIRATION_SECONDS: u64 = 60 * 60;
const DEFAULT_BCRYPT_COST: u32 = 10;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_expiration: Duration,
    bcrypt_cost: u32,
}

impl AuthConfig {
    /// Default config: reset tokens live for one hour, bcrypt cost 10.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token_expiration: Duration::from_secs(DEFAULT_TOKEN_EXPIRATION_SECONDS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    #[must_use]
    pub fn with_token_expiration_seconds(mut self, seconds: u64) -> Self {
        self.token_expiration = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn token_expiration(&self) -> Duration {
        self.token_expiration
    }

    /// Cost clamped to the range bcrypt accepts.
    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}
