use chrono::{Local, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::ops::Range;

use crate::error::{Error, Result};
use crate::guest::GuestRecord;
use crate::roster::ExportMode;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const ROW_HEIGHT: i64 = 16;
const FONT_SIZE: i64 = 10;

/// Guest rows that fit under the title block on the first page.
pub const FIRST_PAGE_ROWS: usize = 42;
/// Guest rows on every following page.
pub const PAGE_ROWS: usize = 46;

/// Table columns: header, left edge, and how many characters fit.
const COLUMNS: [(&str, i64, usize); 4] = [
    ("MESA", 40, 6),
    ("NOMBRE", 85, 36),
    ("CATEGORÍA", 290, 15),
    ("OBSERVACIONES", 385, 31),
];

/// Render a guest list as a PDF document
///
/// Rows are printed in the order given; callers sort with
/// [`Roster::export_ordering`](crate::roster::Roster::export_ordering) first.
/// The first page carries the title `LISTA DE INVITADOS: <event>`, the sort
/// mode and the generation time; every page repeats the column header.
///
/// # Examples
/// ```
/// use guestlist::downloader::to_pdf;
/// use guestlist::roster::{ExportMode, Roster};
///
/// let roster = Roster::new();
/// let pdf = to_pdf(&roster.export_ordering(ExportMode::ByTable), "Boda", ExportMode::ByTable).unwrap();
/// assert!(pdf.starts_with(b"%PDF"));
/// ```
pub fn to_pdf(records: &[&GuestRecord], event_title: &str, mode: ExportMode) -> Result<Vec<u8>> {
    to_pdf_at(records, event_title, mode, Local::now().naive_local())
}

/// Same as [`to_pdf`] with a fixed generation timestamp.
pub fn to_pdf_at(
    records: &[&GuestRecord],
    event_title: &str,
    mode: ExportMode,
    generated: NaiveDateTime,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(font("Helvetica"));
    let bold = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let pages = paginate(records.len());
    let page_count = pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);

    for (index, range) in pages.into_iter().enumerate() {
        let mut ops = Vec::new();
        let mut y = PAGE_HEIGHT - MARGIN - 2;

        if index == 0 {
            let title = format!("LISTA DE INVITADOS: {}", event_title);
            text(&mut ops, "F2", 16, MARGIN, y, &title);
            y -= 20;
            text(&mut ops, "F1", FONT_SIZE, MARGIN, y, mode.describe());
            y -= 14;
            let stamp = format!("Generado el {}", generated.format("%d/%m/%Y %H:%M"));
            text(&mut ops, "F1", 8, MARGIN, y, &stamp);
            y -= 26;
        }

        for (header, x, _) in COLUMNS {
            text(&mut ops, "F2", FONT_SIZE, x, y, header);
        }
        rule(&mut ops, y - 4);
        y -= ROW_HEIGHT + 2;

        for record in &records[range] {
            let cells = [
                record.table.as_str(),
                record.name.as_str(),
                record.category.label(),
                record.notes.as_str(),
            ];
            for ((_, x, width), cell) in COLUMNS.iter().zip(cells) {
                text(&mut ops, "F1", FONT_SIZE, *x, y, &fit(cell, *width));
            }
            y -= ROW_HEIGHT;
        }

        let footer = format!("Página {} de {}", index + 1, page_count);
        text(&mut ops, "F1", 8, PAGE_WIDTH - MARGIN - 60, MARGIN - 10, &footer);

        let content = Content { operations: ops };
        let encoded = content.encode().map_err(pdf)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_count as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(pdf)?;
    Ok(buffer)
}

/// Split `total` rows into page-sized ranges. An empty list still gets one
/// page so the title and header are printed.
pub fn paginate(total: usize) -> Vec<Range<usize>> {
    let mut pages = vec![0..total.min(FIRST_PAGE_ROWS)];
    let mut start = pages[0].end;
    while start < total {
        let end = (start + PAGE_ROWS).min(total);
        pages.push(start..end);
        start = end;
    }
    pages
}

/// Cut a cell down to `width` characters, marking the cut with `...`.
pub fn fit(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell.to_string();
    }
    let kept: String = cell.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Encode for the standard fonts; characters outside windows-1252 print as `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (encoded, _, had_errors) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors {
            bytes.push(b'?');
        } else {
            bytes.extend_from_slice(&encoded);
        }
    }
    bytes
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, s: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(s), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, y: i64) {
    ops.push(Operation::new("w", vec![Object::Integer(1)]));
    ops.push(Operation::new(
        "m",
        vec![Object::Integer(MARGIN), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "l",
        vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)],
    ));
    ops.push(Operation::new("S", vec![]));
}

fn pdf(err: impl std::fmt::Display) -> Error {
    Error::Pdf(err.to_string())
}
