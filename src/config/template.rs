//! Configuration template generation

use std::fs;
use std::path::Path;

/// Generate a configuration file with comments explaining each field
pub fn generate_commented_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let toml_str = r##"# Tetherwatch Configuration
# Credentials are normally supplied through the environment (or a .env file):
#   SLACK_BOT_TOKEN, SLACK_CHANNEL, COINGECKO_API_URL, COINGECKO_API_KEY,
#   TETHERWATCH_SNAPSHOT_PATH

version = "0.1.0"

[asset]
# CoinGecko coin id
coin_id = "tether"
# Name and symbol used in the report
name = "Tether"
symbol = "USDT"
# Quote currency for prices
vs_currency = "nzd"

[market]
# CoinGecko API base URL
api_url = "https://api.coingecko.com/api/v3"

# Fear & Greed index endpoint
sentiment_url = "https://api.alternative.me/fng/"

# Days of price history for the lowest-value comparison
window_days = 30

# Timeout for HTTP requests in seconds
timeout_seconds = 30

[metrics]
# Include the Fear & Greed index in the report
sentiment = true

# Optional secondary index read from any JSON endpoint
# [metrics.secondary_index]
# label = "Volatility Index"
# url = "https://example.com/volatility.json"
# json_pointer = "/data/value"

[notify]
# Slack chat.postMessage endpoint
api_url = "https://slack.com/api/chat.postMessage"
# Target channel
channel = "#general"

[snapshot]
# JSON file holding the per-month supply snapshot
path = "supply_snapshot.json"

# Run lock file (defaults to "<path>.lock")
# lock_path = "supply_snapshot.json.lock"

# When to write the snapshot back: "always" or "on_rollover"
persist_policy = "on_rollover"

# Maximum number of months kept in the snapshot
retain_periods = 24

# Seconds after which a leftover run lock is treated as stale
lock_stale_after_secs = 21600

# IANA time zone deciding which month "now" falls in
timezone = "UTC"

[report]
# Decimal places for grouped supply figures (0-2)
supply_decimals = 0
"##;

    // Create parent directories if they don't exist
    if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, toml_str)?;
    Ok(())
}
