/// Application name
pub const APP_NAME: &str = "msgcenter";

/// File name of the local state database inside the platform data directory
pub const DATABASE_FILE_NAME: &str = "message_store.sqlite";

/// Number of calendar days kept in the analytics weekly window
pub const WEEKLY_WINDOW_DAYS: usize = 7;

/// Date key format for daily analytics rows (`YYYY-MM-DD`)
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Date key of the lifetime analytics row
pub const TOTAL_STATS_KEY: &str = "total";

/// Default capacity of the push-arrival channel
pub const DEFAULT_PUSH_BUFFER: usize = 64;
