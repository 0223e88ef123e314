use log::{error, info};

use crate::error::Result;
use crate::roster::Roster;
use crate::saving::FileStore;
#[cfg(feature = "web")]
use crate::sheets::SheetsClient;

/// Where guest lists are persisted.
#[derive(Clone, Debug)]
pub enum Store {
    #[cfg(feature = "web")]
    Sheets(SheetsClient),
    File(FileStore),
}

/// Result of loading an event at the storage boundary.
#[derive(Clone, Debug, Default)]
pub struct Loaded {
    pub roster: Roster,
    /// Set when the load failed and `roster` is an empty stand-in.
    pub diagnostic: Option<String>,
}

impl Store {
    pub async fn load(&self, event: &str) -> Result<Roster> {
        match self {
            #[cfg(feature = "web")]
            Store::Sheets(client) => client.load(event).await,
            Store::File(store) => store.load(event),
        }
    }

    /// Overwrite the event's stored guests with `roster`. Last writer wins.
    pub async fn save(&self, roster: &Roster, event: &str) -> Result<()> {
        match self {
            #[cfg(feature = "web")]
            Store::Sheets(client) => client.save(roster, event).await,
            Store::File(store) => store.save(roster, event),
        }
    }

    /// Load an event, falling back to an empty roster on any failure
    ///
    /// The failure is logged and handed back as a diagnostic for the page;
    /// the caller cannot tell an empty event from a failed load otherwise.
    pub async fn load_or_empty(&self, event: &str) -> Loaded {
        match self.load(event).await {
            Ok(roster) => {
                info!("event '{}' loaded with {} guests", event, roster.len());
                Loaded {
                    roster,
                    diagnostic: None,
                }
            }
            Err(e) => {
                error!("failed to load event '{}': {}", event, e);
                Loaded {
                    roster: Roster::new(),
                    diagnostic: Some(format!("❌ Error de conexión: {}", e)),
                }
            }
        }
    }
}
