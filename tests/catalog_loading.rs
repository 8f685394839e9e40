use karaoke_search::catalog::{load, CatalogCache, Record, DEFAULT_HEADER_LABEL};
use karaoke_search::LoadError;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Cell contents for one test sheet; numbers are written as numeric cells.
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Date(u16, u8, u8),
    Blank,
}

fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) -> Result<(), Box<dyn std::error::Error>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => {
                        sheet.write_string(r as u32, c as u16, *s)?;
                    }
                    Cell::Number(n) => {
                        sheet.write_number(r as u32, c as u16, *n)?;
                    }
                    Cell::Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d)?;
                        sheet.write_datetime_with_format(r as u32, c as u16, &date, &date_format)?;
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

#[test]
fn test_load_concatenates_all_sheets() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("data.xlsx");
    write_workbook(
        &path,
        &[
            (
                "J-POP",
                vec![
                    vec![Cell::Text("歌手名"), Cell::Text("楽曲名")],
                    vec![Cell::Text(" EXILE "), Cell::Text("Choo Choo TRAIN")],
                    vec![Cell::Blank, Cell::Text("no performer")],
                    vec![
                        Cell::Text("あいみょん"),
                        Cell::Text("マリーゴールド"),
                        Cell::Text("memo column"),
                    ],
                ],
            ),
            (
                "Numbers",
                vec![
                    vec![Cell::Text("歌手名"), Cell::Text("楽曲名")],
                    vec![Cell::Text("Perfume"), Cell::Number(1985.0)],
                ],
            ),
        ],
    )?;

    let catalog = load(&path, DEFAULT_HEADER_LABEL)?;

    assert_eq!(
        catalog.records(),
        &[
            Record::new("EXILE", "Choo Choo TRAIN"),
            Record::new("あいみょん", "マリーゴールド"),
            Record::new("Perfume", "1985"),
        ]
    );
    Ok(())
}

#[test]
fn test_date_cells_render_as_timestamps() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("data.xlsx");
    write_workbook(
        &path,
        &[(
            "Sheet1",
            vec![
                vec![Cell::Text("歌手名"), Cell::Text("楽曲名")],
                vec![Cell::Text("レミオロメン"), Cell::Date(2020, 3, 9)],
                vec![Cell::Text("EXILE"), Cell::Date(2020, 1, 1)],
            ],
        )],
    )?;

    let catalog = load(&path, DEFAULT_HEADER_LABEL)?;

    assert_eq!(
        catalog.records(),
        &[
            Record::new("レミオロメン", "2020-03-09 00:00:00"),
            Record::new("EXILE", "2020-01-01 00:00:00"),
        ]
    );
    Ok(())
}

#[test]
fn test_every_record_has_a_real_performer() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("data.xlsx");
    write_workbook(
        &path,
        &[(
            "Sheet1",
            vec![
                vec![Cell::Text("歌手名"), Cell::Text("楽曲名")],
                vec![Cell::Text("   "), Cell::Text("spaces only")],
                vec![Cell::Text("歌手名"), Cell::Text("repeated header")],
                vec![Cell::Text("Aimer"), Cell::Text("残響散歌")],
            ],
        )],
    )?;

    let catalog = load(&path, DEFAULT_HEADER_LABEL)?;

    assert_eq!(catalog.len(), 1);
    for record in catalog.records() {
        assert!(!record.performer.is_empty());
        assert_ne!(record.performer, DEFAULT_HEADER_LABEL);
    }
    Ok(())
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.xlsx");

    assert_eq!(
        load(&path, DEFAULT_HEADER_LABEL),
        Err(LoadError::NotFound(path.clone()))
    );
}

#[test]
fn test_corrupt_file_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.xlsx");
    fs::write(&path, b"this is not a workbook").unwrap();

    match load(&path, DEFAULT_HEADER_LABEL) {
        Err(LoadError::Unreadable { path: p, .. }) => assert_eq!(p, path),
        other => panic!("Expected Unreadable, got {:?}", other),
    }
}

#[test]
fn test_cache_reads_file_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("data.xlsx");
    write_workbook(
        &path,
        &[(
            "Sheet1",
            vec![vec![Cell::Text("EXILE"), Cell::Text("Ti Amo")]],
        )],
    )?;

    let cache = CatalogCache::new(path.clone(), DEFAULT_HEADER_LABEL);
    assert!(!cache.is_loaded());
    assert_eq!(cache.get()?.len(), 1);

    // Later reads come from memory even if the file is gone.
    fs::remove_file(&path)?;
    assert_eq!(cache.get()?.len(), 1);
    Ok(())
}
