use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::text::normalize;

/// Opaque guest identifier: six upper-case hex digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(String);

impl GuestId {
    pub fn new(id: impl Into<String>) -> Self {
        GuestId(id.into())
    }

    /// Draw a random 24-bit id, formatted as `"3FA0C2"`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let n: u32 = rng.gen_range(0..=0xFF_FFFF);
        GuestId(format!("{:06X}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Age classification of a guest
///
/// Stored with the Spanish labels used in the spreadsheet. Text that matches
/// none of the four labels is kept verbatim in `Unknown` so it survives a
/// load/save cycle; such guests are counted in no category bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    #[default]
    Adult,
    Teen,
    Child,
    Infant,
    Unknown(String),
}

impl Category {
    /// The four selectable categories, in display order.
    pub const KNOWN: [Category; 4] = [
        Category::Adult,
        Category::Teen,
        Category::Child,
        Category::Infant,
    ];

    pub fn label(&self) -> &str {
        match self {
            Category::Adult => "MAYOR",
            Category::Teen => "ADOLESCENTE",
            Category::Child => "MENOR",
            Category::Infant => "BEBÉ",
            Category::Unknown(raw) => raw,
        }
    }

    /// Short label for the totals panel.
    pub fn short_label(&self) -> &str {
        match self {
            Category::Teen => "ADOL.",
            other => other.label(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown(_))
    }

    /// Parse a stored or submitted label. Only the exact spreadsheet labels
    /// are recognised; anything else, `"bebe"` or `"mayor"` included, stays
    /// `Unknown` and is written back as it was read.
    pub fn from_label(label: &str) -> Self {
        Category::KNOWN
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or_else(|| Category::Unknown(label.to_string()))
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(&label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the guest showed up. Loaded and saved, but not editable from the
/// roster page yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Attendance {
    Yes,
    #[default]
    No,
}

impl Attendance {
    pub fn label(&self) -> &'static str {
        match self {
            Attendance::Yes => "SI",
            Attendance::No => "NO",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "SI" | "YES" | "TRUE" | "1" => Attendance::Yes,
            _ => Attendance::No,
        }
    }
}

impl From<String> for Attendance {
    fn from(label: String) -> Self {
        Attendance::from_label(&label)
    }
}

impl From<Attendance> for String {
    fn from(attendance: Attendance) -> Self {
        attendance.label().to_string()
    }
}

/// One row of the guest list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub id: GuestId,
    /// Table number as entered; `"0"` means no table assigned yet.
    pub table: String,
    /// Upper-cased, accents preserved.
    pub name: String,
    pub category: Category,
    pub notes: String,
    pub attended: Attendance,
}

impl GuestRecord {
    pub fn table_number(&self) -> u32 {
        crate::text::table_number(&self.table)
    }
}

/// Editable fields of a guest record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Table,
    Name,
    Category,
    Notes,
    Attended,
}

impl Field {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "table" | "mesa" => Some(Field::Table),
            "name" | "nombre" => Some(Field::Name),
            "category" | "categoria" => Some(Field::Category),
            "notes" | "observaciones" => Some(Field::Notes),
            "attended" | "asistio" => Some(Field::Attended),
            _ => None,
        }
    }
}
