/// Current bearer token and its expiry.
///
/// `exp_unix_ts == 0` means no token is tracked and no refresh is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub value: String,
    pub exp_unix_ts: i64, // UNIX TIMESTAMP
}

impl TokenState {
    pub fn new(value: String, exp_unix_ts: i64) -> Self {
        Self { value, exp_unix_ts }
    }

    pub fn is_tracked(&self) -> bool {
        self.exp_unix_ts > 0
    }

    pub fn has_token(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn seconds_remaining_at(&self, now: i64) -> i64 {
        self.exp_unix_ts - now
    }

    /// Check if token should be refreshed at `now`
    pub fn should_refresh_at(&self, now: i64, margin_seconds: u64) -> bool {
        self.is_tracked() && self.seconds_remaining_at(now) <= margin_seconds as i64
    }
}
