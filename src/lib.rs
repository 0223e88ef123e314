/*!
# Guest List Manager

A password-protected web form for managing the guest list of a wedding or
similar event, with the list itself kept in a Google Sheets spreadsheet.

## Overview

Guests are added through a short form, edited inline, searched by name
(ignoring case and accents), shown grouped by table, counted by age
category, and exported as PDF lists sorted by table or by name.

## Architecture

### Roster Engine
- **Technologies**: plain Rust, no I/O
- **Key Components**:
  - Guest records - six flat text fields per guest
  - Text folding - upper-case, accent-free comparison form
  - Roster operations - add, edit, delete, search, group by table, tally, export ordering
  - Commands - the explicit edit requests the web layer translates form posts into

### Storage Layer
- Google Sheets: one spreadsheet file per event, guests in the `Invitados` tab
- Local files: gzip-compressed bincode, one file per event
- Every save rewrites the whole list (last writer wins)
- Load failures fall back to an empty list plus a message for the page

### Web Layer
- **Technologies**: axum, handlebars, cookie sessions
- Single shared password, per-browser session holding the event being edited
- PDF export with lopdf

## Modules

- **guest**: Guest record, id, category and attendance types
- **text**: Text folding and table-number parsing
- **roster**: Roster engine and commands
- **columns**: Roster to spreadsheet grid conversion
- **saving**: Local file store
- **sheets**: Google Sheets store
- **storage**: Store selection and load fallback
- **downloader**: PDF export
- **session**: Sessions and the password gate
- **config**: Command-line and environment configuration
- **app**: Routing, handlers and middleware

## HTTP Endpoints

- `GET /?id={event}&q={query}` - Roster page (or password form)
- `POST /login`, `POST /logout` - Open and close the session
- `POST /guests` - Add a guest and save
- `POST /guests/{id}/field` - Edit one field
- `POST /guests/{id}/delete` - Delete a guest and save
- `POST /save` - Save the whole list
- `GET /export.pdf?mode={table|alpha}` - Download the list as PDF
- `GET /api/roster` - Guests and totals as JSON
*/

pub mod columns;
pub mod error;
pub mod guest;
pub mod roster;
pub mod saving;
pub mod storage;
pub mod text;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod downloader;
#[cfg(feature = "web")]
pub mod session;
#[cfg(feature = "web")]
pub mod sheets;

/// Re-export the engine types to make them easier to use
pub use error::{Error, Result};
pub use guest::*;
pub use roster::*;
pub use text::normalize;
