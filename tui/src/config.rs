use std::{path::PathBuf, time::Duration};

use clap::Parser;
use platform::api::{ClientConfig, Endpoints, LIVE_BASE, PASSPORT_BASE};

const APP_DIR: &str = "streamkey";
const LOG_FILE: &str = "streamkey.log";

/// Log in to the live streaming platform with a QR code, pick a category and
/// fetch the server address and stream key for your broadcast software.
#[derive(Debug, Clone, Parser)]
#[command(name = "streamkey", version, about)]
pub struct Args {
    /// Directory holding the saved login, preferences and category cache
    #[arg(long, env = "STREAMKEY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log file, defaults to streamkey.log inside the data directory
    #[arg(long, env = "STREAMKEY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Seconds before an API request is abandoned
    #[arg(long, default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Milliseconds between two QR login status checks
    #[arg(long, default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Base URL of the passport (login) host
    #[arg(long, env = "STREAMKEY_PASSPORT_BASE", default_value = PASSPORT_BASE)]
    pub passport_base: String,

    /// Base URL of the live room host
    #[arg(long, env = "STREAMKEY_LIVE_BASE", default_value = LIVE_BASE)]
    pub live_base: String,
}

impl Args {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join(LOG_FILE))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoints: Endpoints {
                passport: self.passport_base.clone(),
                live: self.live_base.clone(),
            },
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
