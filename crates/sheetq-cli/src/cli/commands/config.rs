//! `sheetq config` – print the effective configuration.

use anyhow::Result;
use sheetq_core::config::{self, SheetqConfig};
use sheetq_core::QueueConfig;

pub fn run_config(cfg: &SheetqConfig) -> Result<()> {
    if let Ok(path) = config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(cfg)?);

    let queue = QueueConfig::from(cfg);
    let worst_case_ms: u128 = (0..queue.retry_attempts)
        .map(|attempt| queue.retry.backoff(attempt).as_millis())
        .sum();
    println!(
        "# worst-case backoff before final failure: {}ms (+ up to {:.0}% jitter)",
        worst_case_ms,
        queue.retry.jitter_ratio * 100.0
    );
    Ok(())
}
