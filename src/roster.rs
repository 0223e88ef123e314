use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::guest::{Attendance, Category, Field, GuestId, GuestRecord};
use crate::text::{normalize, table_number};

/// Form data for a guest that is about to be added.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewGuest {
    pub table: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub notes: String,
}

/// All guests of one event
///
/// Insertion order carries no meaning beyond being the tie-breaker for the
/// sorted views; every view is re-derived from the records on demand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    guests: Vec<GuestRecord>,
}

/// Guests seated at one table, in roster order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableGroup<'a> {
    pub table: u32,
    pub guests: Vec<&'a GuestRecord>,
}

/// Headcounts shown in the totals panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Distinct table values other than `"0"`.
    pub table_count: usize,
    pub total: usize,
    /// One entry per known category, in `Category::KNOWN` order.
    pub per_category: Vec<(Category, usize)>,
}

impl Tally {
    pub fn count(&self, category: &Category) -> usize {
        self.per_category
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Sort order of an exported guest list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Table number first, then name.
    #[default]
    ByTable,
    Alphabetical,
}

impl ExportMode {
    pub fn from_query(mode: &str) -> Option<Self> {
        match normalize(mode).as_str() {
            "TABLE" | "BYTABLE" | "MESA" => Some(ExportMode::ByTable),
            "ALPHA" | "ALPHABETICAL" | "ALFABETICO" | "NOMBRE" => Some(ExportMode::Alphabetical),
            _ => None,
        }
    }

    pub fn query_value(&self) -> &'static str {
        match self {
            ExportMode::ByTable => "table",
            ExportMode::Alphabetical => "alpha",
        }
    }

    /// Human description printed under the title of an exported list.
    pub fn describe(&self) -> &'static str {
        match self {
            ExportMode::ByTable => "Ordenado por mesa",
            ExportMode::Alphabetical => "Orden alfabético",
        }
    }
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    pub fn from_records(guests: Vec<GuestRecord>) -> Self {
        Roster { guests }
    }

    pub fn records(&self) -> &[GuestRecord] {
        &self.guests
    }

    pub fn into_records(self) -> Vec<GuestRecord> {
        self.guests
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    pub fn get(&self, id: &GuestId) -> Option<&GuestRecord> {
        self.guests.iter().find(|g| &g.id == id)
    }

    /// Append a guest and return its new id
    ///
    /// The name must not be blank. Name and notes are upper-cased, the table
    /// is rewritten in plain integer form (`"07"` becomes `"7"`), and the
    /// guest starts out as not attended.
    pub fn add_guest(&mut self, guest: NewGuest) -> Result<GuestId> {
        self.add_guest_with_rng(guest, &mut rand::thread_rng())
    }

    pub fn add_guest_with_rng<R: Rng + ?Sized>(
        &mut self,
        guest: NewGuest,
        rng: &mut R,
    ) -> Result<GuestId> {
        if guest.name.trim().is_empty() {
            return Err(Error::Validation("guest name must not be empty".to_string()));
        }

        let id = self.fresh_id(rng);
        self.guests.push(GuestRecord {
            id: id.clone(),
            table: table_number(&guest.table).to_string(),
            name: guest.name.to_uppercase(),
            category: guest.category,
            notes: guest.notes.to_uppercase(),
            attended: Attendance::No,
        });
        Ok(id)
    }

    /// Draw ids until one is not taken.
    pub fn fresh_id<R: Rng + ?Sized>(&self, rng: &mut R) -> GuestId {
        loop {
            let id = GuestId::random(rng);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Give every guest with a blank or repeated id a fresh one. Returns how
    /// many ids were replaced.
    pub fn repair_ids(&mut self) -> usize {
        let mut rng = rand::thread_rng();
        let mut seen: HashSet<GuestId> = HashSet::new();
        let mut repaired = 0;

        for i in 0..self.guests.len() {
            let id = &self.guests[i].id;
            if !id.is_empty() && seen.insert(id.clone()) {
                continue;
            }
            let fresh = loop {
                let candidate = GuestId::random(&mut rng);
                if !seen.contains(&candidate) && self.get(&candidate).is_none() {
                    break candidate;
                }
            };
            seen.insert(fresh.clone());
            self.guests[i].id = fresh;
            repaired += 1;
        }

        repaired
    }

    /// Overwrite one field of a guest
    ///
    /// Names are upper-cased; every other value is stored as given. Returns
    /// `false` and leaves the roster untouched when the id is not present,
    /// which happens when an edit arrives for a guest that was just deleted.
    pub fn update_field(&mut self, id: &GuestId, field: Field, value: &str) -> bool {
        let Some(guest) = self.guests.iter_mut().find(|g| &g.id == id) else {
            debug!("ignoring edit of {:?} for missing guest {}", field, id);
            return false;
        };

        match field {
            Field::Table => guest.table = value.to_string(),
            Field::Name => guest.name = value.to_uppercase(),
            Field::Category => guest.category = Category::from_label(value),
            Field::Notes => guest.notes = value.to_string(),
            Field::Attended => guest.attended = Attendance::from_label(value),
        }
        true
    }

    /// Remove a guest. Missing ids are ignored.
    pub fn delete_guest(&mut self, id: &GuestId) -> Option<GuestRecord> {
        let pos = self.guests.iter().position(|g| &g.id == id)?;
        Some(self.guests.remove(pos))
    }

    /// Guests whose name contains the query, ignoring case and accents
    ///
    /// A blank query returns every guest in roster order.
    pub fn search(&self, query: &str) -> Vec<&GuestRecord> {
        let needle = normalize(query);
        if needle.is_empty() {
            return self.guests.iter().collect();
        }
        self.guests
            .iter()
            .filter(|g| normalize(&g.name).contains(&needle))
            .collect()
    }

    pub fn tally(&self) -> Tally {
        let tables: HashSet<&str> = self
            .guests
            .iter()
            .map(|g| g.table.trim())
            .filter(|t| *t != "0")
            .collect();

        let per_category = Category::KNOWN
            .iter()
            .map(|c| {
                let n = self.guests.iter().filter(|g| &g.category == c).count();
                (c.clone(), n)
            })
            .collect();

        Tally {
            table_count: tables.len(),
            total: self.guests.len(),
            per_category,
        }
    }

    /// Every guest in the order an exported list prints them. Ties keep
    /// roster order.
    pub fn export_ordering(&self, mode: ExportMode) -> Vec<&GuestRecord> {
        let mut ordered: Vec<&GuestRecord> = self.guests.iter().collect();
        match mode {
            ExportMode::ByTable => ordered.sort_by(|a, b| {
                a.table_number()
                    .cmp(&b.table_number())
                    .then_with(|| a.name.cmp(&b.name))
            }),
            ExportMode::Alphabetical => ordered.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        ordered
    }
}

/// Partition guests by table number, tables ascending
///
/// Within a table, guests keep the order they were given in. Unparseable
/// table values land in table 0, which is a regular group here.
pub fn group_by_table<'a, I>(records: I) -> Vec<TableGroup<'a>>
where
    I: IntoIterator<Item = &'a GuestRecord>,
{
    let mut groups: BTreeMap<u32, Vec<&'a GuestRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.table_number()).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(table, guests)| TableGroup { table, guests })
        .collect()
}

/// A single change requested by the user.
#[derive(Clone, Debug)]
pub enum Command {
    AddGuest(NewGuest),
    SetField {
        id: GuestId,
        field: Field,
        value: String,
    },
    DeleteGuest {
        id: GuestId,
    },
}

/// What applying a command did to the roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Added(GuestId),
    Updated,
    Deleted(GuestRecord),
    Unchanged,
}

impl Outcome {
    /// Adds and deletes are written through to storage straight away; field
    /// edits wait for an explicit save.
    pub fn needs_save(&self) -> bool {
        matches!(self, Outcome::Added(_) | Outcome::Deleted(_))
    }
}

impl Command {
    pub fn apply(self, roster: &mut Roster) -> Result<Outcome> {
        match self {
            Command::AddGuest(guest) => roster.add_guest(guest).map(Outcome::Added),
            Command::SetField { id, field, value } => {
                if roster.update_field(&id, field, &value) {
                    Ok(Outcome::Updated)
                } else {
                    Ok(Outcome::Unchanged)
                }
            }
            Command::DeleteGuest { id } => Ok(roster
                .delete_guest(&id)
                .map(Outcome::Deleted)
                .unwrap_or(Outcome::Unchanged)),
        }
    }
}
