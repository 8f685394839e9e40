//! Workbook loading and the process-wide catalog cache
use crate::error::LoadError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Header text of the performer column in the source workbook.
pub const DEFAULT_HEADER_LABEL: &str = "歌手名";

const PERFORMER_COLUMN: u32 = 0;
const TITLE_COLUMN: u32 = 1;

/// Rendering of date cells, matching how the catalog was exported as text.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Record {
    pub performer: String,
    pub title: String,
}

impl Record {
    pub fn new(performer: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            performer: performer.into(),
            title: title.into(),
        }
    }
}

/// Immutable, ordered set of records built once from the data source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    /// Normalize textual rows into a catalog.
    ///
    /// Column 0 is the performer, column 1 the title, anything past that is
    /// ignored. Both fields are trimmed; rows whose performer is empty or
    /// repeats `header_label` are dropped.
    pub fn from_rows<I, R, S>(rows: I, header_label: &str) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = rows
            .into_iter()
            .filter_map(|row| {
                let mut cells = row.into_iter();
                let performer = cells
                    .next()
                    .map(|c| c.as_ref().trim().to_string())
                    .unwrap_or_default();
                let title = cells
                    .next()
                    .map(|c| c.as_ref().trim().to_string())
                    .unwrap_or_default();

                if performer.is_empty() || performer == header_label {
                    return None;
                }
                Some(Record { performer, title })
            })
            .collect();

        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `limit` records, for the listing shown before any query is typed.
    pub fn preview(&self, limit: usize) -> &[Record] {
        &self.records[..limit.min(self.records.len())]
    }
}

/// Read every sheet of the workbook at `path` into one catalog.
pub fn load(path: &Path, header_label: &str) -> Result<Catalog, LoadError> {
    if !path.exists() {
        warn!("Data file not found: {}", path.display());
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let unreadable = |reason: String| LoadError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(e.to_string()))?;
    let mut rows: Vec<[String; 2]> = Vec::new();

    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| unreadable(format!("sheet '{sheet}': {e}")))?;
        debug!("Sheet '{}': {} rows", sheet, range.height());
        rows.extend(sheet_rows(&range));
    }

    let catalog = Catalog::from_rows(rows, header_label);
    info!(
        "Loaded {} records from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

/// The performer and title cells of each row, as text.
///
/// Calamine ranges begin at the first used cell, so column indices are
/// shifted back to absolute sheet columns.
fn sheet_rows(range: &Range<Data>) -> impl Iterator<Item = [String; 2]> + '_ {
    let first_col = range.start().map(|(_, col)| col).unwrap_or(0);
    range.rows().map(move |row| {
        let cell = |col: u32| {
            col.checked_sub(first_col)
                .and_then(|offset| row.get(offset as usize))
                .map(cell_text)
                .unwrap_or_default()
        };
        [cell(PERFORMER_COLUMN), cell(TITLE_COLUMN)]
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) if !dt.is_duration() => match dt.as_datetime() {
            Some(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

type Loader = Box<dyn Fn() -> Result<Catalog, LoadError> + Send + Sync>;

/// Compute-once holder for the catalog.
///
/// The loader runs at most once; concurrent first callers wait for that
/// single run, and its outcome (including a failure) is served afterwards.
pub struct CatalogCache {
    loader: Loader,
    cell: OnceLock<Result<Arc<Catalog>, LoadError>>,
}

impl CatalogCache {
    pub fn new(path: impl Into<PathBuf>, header_label: impl Into<String>) -> Self {
        let path = path.into();
        let header_label = header_label.into();
        Self::with_loader(move || load(&path, &header_label))
    }

    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Catalog, LoadError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    /// Already-built catalog, for callers that have their own data source.
    pub fn preloaded(catalog: Catalog) -> Self {
        let cache = Self::with_loader(|| Ok(Catalog::default()));
        let _ = cache.cell.set(Ok(Arc::new(catalog)));
        cache
    }

    pub fn get(&self) -> Result<Arc<Catalog>, LoadError> {
        self.cell
            .get_or_init(|| (self.loader)().map(Arc::new))
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogCache")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
