use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::saving::FileStore;
use crate::session::DEFAULT_EVENT;
use crate::sheets::{SheetsClient, SheetsConfig};
use crate::storage::Store;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Google Sheets, one spreadsheet file per event
    Sheets,
    /// Local gzip files under the data directory
    File,
}

/// Guest list web server
#[derive(Clone, Debug, Parser)]
#[command(name = "website", version, about = "Guest list manager backed by Google Sheets")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "GUESTLIST_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Shared password for the editor
    #[arg(long, env = "GUESTLIST_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, value_enum, env = "GUESTLIST_BACKEND", default_value_t = Backend::Sheets)]
    pub backend: Backend,

    /// Directory for the file backend
    #[arg(long, env = "GUESTLIST_DATA_DIR", default_value = "database")]
    pub data_dir: PathBuf,

    /// OAuth bearer token for the Sheets and Drive APIs
    #[arg(long, env = "GOOGLE_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,

    #[arg(long, env = "GOOGLE_SHEETS_ENDPOINT", default_value = "https://sheets.googleapis.com")]
    pub sheets_endpoint: String,

    #[arg(long, env = "GOOGLE_DRIVE_ENDPOINT", default_value = "https://www.googleapis.com")]
    pub drive_endpoint: String,

    /// Worksheet tab holding the guests
    #[arg(long, env = "GUESTLIST_WORKSHEET", default_value = "Invitados")]
    pub worksheet: String,

    /// Event opened when the URL has no `id`
    #[arg(long, env = "GUESTLIST_DEFAULT_EVENT", default_value = DEFAULT_EVENT)]
    pub default_event: String,

    /// Timeout for spreadsheet requests, in seconds
    #[arg(long, env = "GUESTLIST_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Directory served under /static
    #[arg(long, env = "GUESTLIST_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

impl Config {
    /// Build the storage backend this configuration selects.
    pub fn store(&self) -> Result<Store> {
        match self.backend {
            Backend::File => Ok(Store::File(FileStore::new(&self.data_dir))),
            Backend::Sheets => {
                let token = self
                    .sheets_token
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| {
                        Error::Connection(
                            "the sheets backend needs GOOGLE_SHEETS_TOKEN".to_string(),
                        )
                    })?;
                let client = SheetsClient::new(SheetsConfig {
                    token,
                    sheets_endpoint: self.sheets_endpoint.clone(),
                    drive_endpoint: self.drive_endpoint.clone(),
                    worksheet: self.worksheet.clone(),
                    timeout: Duration::from_secs(self.timeout_secs),
                })?;
                Ok(Store::Sheets(client))
            }
        }
    }
}
