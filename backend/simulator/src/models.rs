use std::time::Duration;

pub const DEFAULT_NOTIFY_URL: &str = "http://127.0.0.1:5000/notify-new-sale";

pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

pub const DEFAULT_INTERVAL_SECS: u64 = 5;

pub const MIN_BASE_AMOUNT: f64 = 100.0;
pub const MAX_BASE_AMOUNT: f64 = 1000.0;

pub const MAX_QUANTITY: u32 = 5;

pub struct Settings {
    pub database_url: String,
    pub db_name: String,
    pub notify_url: String,
    pub interval: Duration,
    pub mode: Mode,
}

pub enum Mode {
    /// One sale per interval until interrupted
    Live,

    /// Backfill `per_day` sales for each of the last `days` days, then exit
    Seed { days: u32, per_day: u32 },
}
