#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use guestlist::sheets::{SheetsClient, SheetsConfig};
use guestlist::storage::Store;
use guestlist::{Category, Error, NewGuest, Roster};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const TOKEN: &str = "test-token";

/// In-memory stand-in for the Drive and Sheets APIs.
#[derive(Default)]
struct FakeGoogle {
    values: Mutex<Vec<Vec<Value>>>,
    calls: Mutex<Vec<String>>,
}

type Shared = Arc<FakeGoogle>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", TOKEN).as_str())
}

async fn list_files(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let q = params.get("q").cloned().unwrap_or_default();
    fake.calls.lock().unwrap().push(format!("list {}", q));
    if q.contains("name = 'Boda Test'") && q.contains("trashed = false") {
        Json(json!({ "files": [{ "id": "sheet-1" }] })).into_response()
    } else {
        Json(json!({ "files": [] })).into_response()
    }
}

async fn read_values(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.calls.lock().unwrap().push(format!("get {} {}", id, range));
    let values = fake.values.lock().unwrap().clone();
    Json(json!({ "range": range, "values": values })).into_response()
}

async fn clear_values(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.calls.lock().unwrap().push(format!("post {} {}", id, range));
    if range.ends_with(":clear") {
        fake.values.lock().unwrap().clear();
    }
    Json(json!({})).into_response()
}

async fn write_values(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.calls.lock().unwrap().push(format!("put {} {}", id, range));
    let rows = body["values"].as_array().cloned().unwrap_or_default();
    let mut values = fake.values.lock().unwrap();
    *values = rows
        .into_iter()
        .map(|row| row.as_array().cloned().unwrap_or_default())
        .collect();
    Json(json!({ "updatedRows": values.len() })).into_response()
}

async fn serve(fake: Shared) -> String {
    let app = Router::new()
        .route("/drive/v3/files", get(list_files))
        .route(
            "/v4/spreadsheets/:id/values/:range",
            get(read_values).post(clear_values).put(write_values),
        )
        .with_state(fake);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(endpoint: &str, token: &str) -> SheetsClient {
    SheetsClient::new(SheetsConfig {
        token: token.to_string(),
        sheets_endpoint: endpoint.to_string(),
        drive_endpoint: endpoint.to_string(),
        worksheet: "Invitados".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn load_reads_the_guest_tab() {
    let fake = Shared::default();
    *fake.values.lock().unwrap() = vec![
        vec![json!("ID"), json!("Mesa"), json!("Nombre"), json!("Categoria"), json!("Observaciones"), json!("Asistio"), json!("Unnamed: 6")],
        vec![json!("0F0F0F"), json!(5), json!("ANA PÉREZ"), json!("MAYOR"), json!(""), json!("NO"), json!("x")],
        vec![json!("1A1A1A"), json!("2"), json!("LUIS GÓMEZ"), json!("ADOLESCENTE")],
    ];
    let endpoint = serve(fake.clone()).await;

    let roster = client(&endpoint, TOKEN).load("Boda Test").await.unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster.records()[0].table, "5");
    assert_eq!(roster.records()[1].category, Category::Teen);
    assert_eq!(roster.records()[1].notes, "");

    let calls = fake.calls.lock().unwrap().clone();
    assert!(calls.iter().any(|c| c == "get sheet-1 'Invitados'"));
}

#[tokio::test]
async fn save_clears_then_rewrites_everything() {
    let fake = Shared::default();
    *fake.values.lock().unwrap() = vec![vec![json!("old"), json!("junk")]; 10];
    let endpoint = serve(fake.clone()).await;

    let mut roster = Roster::new();
    roster
        .add_guest(NewGuest {
            table: "3".to_string(),
            name: "marta".to_string(),
            category: Category::Infant,
            notes: String::new(),
        })
        .unwrap();
    client(&endpoint, TOKEN).save(&roster, "Boda Test").await.unwrap();

    let values = fake.values.lock().unwrap().clone();
    assert_eq!(values.len(), 2);
    assert_eq!(
        values[0],
        vec![json!("ID"), json!("Mesa"), json!("Nombre"), json!("Categoria"), json!("Observaciones"), json!("Asistio")]
    );
    assert_eq!(values[1][2], json!("MARTA"));
    assert_eq!(values[1][3], json!("BEBÉ"));

    let calls = fake.calls.lock().unwrap().clone();
    let clear = calls.iter().position(|c| c.starts_with("post sheet-1")).unwrap();
    let write = calls.iter().position(|c| c.starts_with("put sheet-1")).unwrap();
    assert!(clear < write);
}

#[tokio::test]
async fn unknown_event_is_a_connection_error() {
    let endpoint = serve(Shared::default()).await;
    let err = client(&endpoint, TOKEN).load("No Existe").await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
}

#[tokio::test]
async fn rejected_token_downgrades_to_empty_roster() {
    let fake = Shared::default();
    *fake.values.lock().unwrap() = vec![vec![json!("ID")], vec![json!("AAAAAA")]];
    let endpoint = serve(fake).await;

    let store = Store::Sheets(client(&endpoint, "wrong"));
    let err = store.save(&Roster::new(), "Boda Test").await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));

    let loaded = store.load_or_empty("Boda Test").await;
    assert!(loaded.roster.is_empty());
    assert!(loaded.diagnostic.unwrap().contains("Error de conexión"));
}
