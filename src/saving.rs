use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::columns::{roster_from_grid, roster_to_grid};
use crate::error::Result;
use crate::roster::Roster;
use crate::text::normalize;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
}

/// Guest lists kept on local disk, one gzip-compressed file per event
///
/// Files hold the same six-column grid that goes to the spreadsheet, so a
/// list can move between the two backends unchanged.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the given event's guests
    ///
    /// The readable part of the name is the folded event name; the suffix is
    /// a digest of the exact name, so events that fold to the same text
    /// (`"Boda Ñoño"` and `"Boda Nono"`) still get separate files.
    pub fn path_for(&self, event: &str) -> PathBuf {
        let folded = normalize(event);
        let stem = UNSAFE_FILENAME_CHARS.replace_all(&folded, "_");
        let digest = Sha256::digest(event.as_bytes());
        self.dir
            .join(format!("{}-{}.bin.gz", stem, hex::encode(&digest[..4])))
    }

    /// Read an event's guests. An event that was never saved is empty.
    pub fn load(&self, event: &str) -> Result<Roster> {
        let path = self.path_for(event);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no saved list at {}", path.display());
                return Ok(Roster::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(GzDecoder::new(file));
        let grid: Vec<Vec<String>> = deserialize_from(&mut reader)?;
        Ok(roster_from_grid(&grid))
    }

    /// Replace an event's saved guests with the given roster.
    pub fn save(&self, roster: &Roster, event: &str) -> Result<()> {
        create_dir_all(&self.dir)?;
        let file = File::create(self.path_for(event))?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);

        serialize_into(&mut writer, &roster_to_grid(roster))?;
        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}
