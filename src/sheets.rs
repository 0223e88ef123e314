use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use crate::columns::{cell_text, roster_from_grid, roster_to_grid};
use crate::error::{Error, Result};
use crate::roster::Roster;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

/// Connection settings for the Google Sheets backend.
#[derive(Clone)]
pub struct SheetsConfig {
    /// OAuth bearer token with spreadsheet and drive scopes.
    pub token: String,
    pub sheets_endpoint: String,
    pub drive_endpoint: String,
    /// Tab inside each event's spreadsheet that holds the guests.
    pub worksheet: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("sheets_endpoint", &self.sheets_endpoint)
            .field("drive_endpoint", &self.drive_endpoint)
            .field("worksheet", &self.worksheet)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Guest lists stored in Google Sheets
///
/// Each event is its own spreadsheet file, found by name through Drive; the
/// guests live in a fixed worksheet tab of that file. Every save clears the
/// tab and rewrites it whole.
#[derive(Clone, Debug)]
pub struct SheetsClient {
    http: Client,
    config: SheetsConfig,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(connection)?;
        Ok(SheetsClient { http, config })
    }

    /// A1 range covering the whole worksheet tab.
    fn range(&self) -> String {
        format!("'{}'", self.config.worksheet.replace('\'', "''"))
    }

    fn values_url(&self, spreadsheet_id: &str, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.config.sheets_endpoint.trim_end_matches('/'),
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(&self.range()),
            suffix
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(connection)?;
        response.error_for_status().map_err(connection)
    }

    /// Look up the spreadsheet file named after the event.
    pub async fn resolve(&self, event: &str) -> Result<String> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            event.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let url = format!(
            "{}/drive/v3/files",
            self.config.drive_endpoint.trim_end_matches('/')
        );
        let request = self
            .http
            .get(url)
            .query(&[("q", query.as_str()), ("fields", "files(id)")]);
        let list: FileList = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(connection)?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| Error::Connection(format!("spreadsheet '{}' not found", event)))
    }

    pub async fn load(&self, event: &str) -> Result<Roster> {
        let id = self.resolve(event).await?;
        let request = self.http.get(self.values_url(&id, ""));
        let body: ValueRange = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(connection)?;

        let grid: Vec<Vec<String>> = body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        let roster = roster_from_grid(&grid);
        info!("loaded {} guests for '{}'", roster.len(), event);
        Ok(roster)
    }

    /// Clear the worksheet, then write header and guests from A1.
    pub async fn save(&self, roster: &Roster, event: &str) -> Result<()> {
        let id = self.resolve(event).await?;

        let clear = self.http.post(self.values_url(&id, ":clear")).json(&json!({}));
        self.send(clear).await?;

        let grid = roster_to_grid(roster);
        let body = json!({
            "range": self.range(),
            "majorDimension": "ROWS",
            "values": &grid,
        });
        let update = self
            .http
            .put(self.values_url(&id, ""))
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send(update).await?;

        debug!("wrote {} rows to '{}'", grid.len(), event);
        Ok(())
    }
}

fn connection(err: reqwest::Error) -> Error {
    Error::Connection(err.to_string())
}
