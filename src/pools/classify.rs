//! Bucket spreadsheet rows into map pools
//!
//! Sheet layout: headers on row 2 starting at column 2, data from row 3.
//! Column 2 is always the file name and column 3 the map name; every other
//! column is located through its header text.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{MapPoolSet, CERTIFIED, EXTRA_LARGE, LARGE, MEDIUM, MISC, SMALL, UNCERTIFIED};
use crate::error::SchemaError;
use crate::sheets::Grid;

pub const HEADER_ROW: usize = 2;
pub const FIRST_DATA_ROW: usize = 3;
pub const FIRST_HEADER_COLUMN: usize = 2;
pub const FILE_NAME_COLUMN: usize = 2;
pub const NAME_COLUMN: usize = 3;

pub const SIZE_X_HEADER: &str = "sizeX";
pub const SIZE_Y_HEADER: &str = "sizeY";
pub const CERTIFIED_HEADER: &str = "Certified?";
pub const IN_POOL_HEADER: &str = "Is in pool";

/// Largest `sizeX + sizeY` of each bucket below extra large
pub const SMALL_MAX_SIZE: f64 = 24.0;
pub const MEDIUM_MAX_SIZE: f64 = 34.0;
pub const LARGE_MAX_SIZE: f64 = 44.0;

/// Team-composition presets that get a pool when the sheet has a column for them
pub const PRESETS: &[&str] = &[
    "1v1", "2v2", "3v3", "4v4", "5v5", "6v6", "7v7", "8v8",
    "ffa3", "ffa4", "ffa5", "ffa6", "ffa7", "ffa8", "ffa9", "ffa10",
    "ffa11", "ffa12", "ffa13", "ffa14", "ffa15", "ffa16",
    "2v2v2", "2v2v2v2", "2v2v2v2v2", "2v2v2v2v2v2", "2v2v2v2v2v2v2", "2v2v2v2v2v2v2v2",
    "3v3v3", "3v3v3v3", "3v3v3v3v3",
    "4v4v4", "4v4v4v4",
    "5v5v5",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl SizeClass {
    /// Bucket by `width + height`. Sizes that are not numbers land in extra large.
    pub fn from_total(total: f64) -> Self {
        if total <= SMALL_MAX_SIZE {
            SizeClass::Small
        } else if total <= MEDIUM_MAX_SIZE {
            SizeClass::Medium
        } else if total <= LARGE_MAX_SIZE {
            SizeClass::Large
        } else {
            SizeClass::ExtraLarge
        }
    }

    pub fn pool_name(self) -> &'static str {
        match self {
            SizeClass::Small => SMALL,
            SizeClass::Medium => MEDIUM,
            SizeClass::Large => LARGE,
            SizeClass::ExtraLarge => EXTRA_LARGE,
        }
    }
}

/// Column indexes resolved from the header row
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub width: usize,
    pub height: usize,
    pub certified: usize,
    pub in_pool: usize,
    /// Presets found in the header, in `PRESETS` order
    pub presets: Vec<(&'static str, usize)>,
}

impl ColumnLayout {
    /// Map header text to column and check the required headers exist
    pub fn resolve(grid: &Grid) -> Result<Self, SchemaError> {
        let mut headings: HashMap<String, usize> = HashMap::new();
        for col in FIRST_HEADER_COLUMN..grid.column_count() {
            if let Some(text) = grid.get(HEADER_ROW, col).as_text() {
                let text = text.trim();
                if !text.is_empty() {
                    headings.insert(text.to_string(), col);
                }
            }
        }

        let mut missing = Vec::new();
        let mut required = |header: &str| {
            headings.get(header).copied().unwrap_or_else(|| {
                missing.push(header.to_string());
                0
            })
        };
        let width = required(SIZE_X_HEADER);
        let height = required(SIZE_Y_HEADER);
        let certified = required(CERTIFIED_HEADER);
        let in_pool = required(IN_POOL_HEADER);

        if !missing.is_empty() {
            return Err(SchemaError { missing });
        }

        let presets = PRESETS
            .iter()
            .filter_map(|preset| headings.get(*preset).map(|col| (*preset, *col)))
            .collect();

        Ok(Self {
            width,
            height,
            certified,
            in_pool,
            presets,
        })
    }
}

/// One spreadsheet row, read through a `ColumnLayout`
#[derive(Debug, Clone, PartialEq)]
pub struct MapRow {
    pub file_name: Option<String>,
    pub name: Option<String>,
    pub width: f64,
    pub height: f64,
    pub certified: bool,
    pub in_pool: bool,
    /// Presets whose cell is truthy for this row
    pub presets: Vec<&'static str>,
}

impl MapRow {
    pub fn read(grid: &Grid, layout: &ColumnLayout, row: usize) -> Self {
        Self {
            file_name: grid.get(row, FILE_NAME_COLUMN).as_text(),
            name: grid.get(row, NAME_COLUMN).as_text(),
            width: grid.get(row, layout.width).as_number(),
            height: grid.get(row, layout.height).as_number(),
            certified: grid.get(row, layout.certified).is_one(),
            in_pool: grid.get(row, layout.in_pool).is_one(),
            presets: layout
                .presets
                .iter()
                .filter(|(_, col)| grid.get(row, *col).is_truthy())
                .map(|(preset, _)| *preset)
                .collect(),
        }
    }

    pub fn size_class(&self) -> SizeClass {
        SizeClass::from_total(self.width + self.height)
    }
}

/// Reduce the sheet to pools. Pure and order preserving.
pub fn classify(grid: &Grid) -> Result<MapPoolSet, SchemaError> {
    let layout = ColumnLayout::resolve(grid)?;
    debug!(?layout, "Resolved spreadsheet columns");

    let mut pools = MapPoolSet::with_fixed_pools();
    for (preset, _) in &layout.presets {
        pools.add_pool(preset);
    }

    for y in FIRST_DATA_ROW..grid.row_count() {
        let row = MapRow::read(grid, &layout, y);

        if !row.in_pool {
            if let Some(name) = row.name {
                pools.push(MISC, name);
            }
            continue;
        }

        let Some(name) = row.name.clone() else {
            warn!(row = y, file_name = ?row.file_name, "Skipping pooled row without a map name");
            continue;
        };

        pools.push(if row.certified { CERTIFIED } else { UNCERTIFIED }, name.clone());
        pools.push(row.size_class().pool_name(), name.clone());

        for preset in &row.presets {
            pools.push(preset, name.clone());
        }
        if row.presets.is_empty() {
            pools.push(MISC, name);
        }
    }

    Ok(pools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    /// Two banner rows, the header row, then one row per map
    fn sheet(headers: &[&str], rows: &[Vec<CellValue>]) -> Grid {
        let mut all = vec![vec![text("Map list")], vec![]];
        let mut header_row = vec![CellValue::Empty, CellValue::Empty];
        header_row.extend(headers.iter().map(|h| text(h)));
        all.push(header_row);
        for row in rows {
            let mut cells = vec![CellValue::Empty, CellValue::Empty];
            cells.extend(row.iter().cloned());
            all.push(cells);
        }
        Grid::from_rows(all)
    }

    const HEADERS: &[&str] = &["fileName", "name", "sizeX", "sizeY", "Certified?", "Is in pool", "1v1", "ffa8"];

    fn row(name: &str, x: f64, y: f64, certified: CellValue, in_pool: CellValue, v1: bool, ffa: bool) -> Vec<CellValue> {
        vec![
            text(&format!("{}.sd7", name.to_lowercase())),
            text(name),
            num(x),
            num(y),
            certified,
            in_pool,
            if v1 { num(1.0) } else { CellValue::Empty },
            if ffa { CellValue::Bool(true) } else { CellValue::Empty },
        ]
    }

    #[test]
    fn test_size_boundaries() {
        assert_eq!(SizeClass::from_total(24.0), SizeClass::Small);
        assert_eq!(SizeClass::from_total(25.0), SizeClass::Medium);
        assert_eq!(SizeClass::from_total(34.0), SizeClass::Medium);
        assert_eq!(SizeClass::from_total(35.0), SizeClass::Large);
        assert_eq!(SizeClass::from_total(44.0), SizeClass::Large);
        assert_eq!(SizeClass::from_total(45.0), SizeClass::ExtraLarge);
        assert_eq!(SizeClass::from_total(f64::NAN), SizeClass::ExtraLarge);
    }

    #[test]
    fn test_resolve_layout() {
        let grid = sheet(HEADERS, &[]);
        let layout = ColumnLayout::resolve(&grid).unwrap();
        assert_eq!(layout.width, 4);
        assert_eq!(layout.height, 5);
        assert_eq!(layout.certified, 6);
        assert_eq!(layout.in_pool, 7);
        assert_eq!(layout.presets, vec![("1v1", 8), ("ffa8", 9)]);
    }

    #[test]
    fn test_missing_headers() {
        let grid = sheet(&["fileName", "name", "sizeX", "Certified?"], &[]);
        let err = ColumnLayout::resolve(&grid).unwrap_err();
        assert_eq!(err.missing, vec!["sizeY", "Is in pool"]);
    }

    #[test]
    fn test_certified_small_no_preset() {
        let grid = sheet(HEADERS, &[row("Tiny", 10.0, 10.0, num(1.0), num(1.0), false, false)]);
        let pools = classify(&grid).unwrap();

        let containing: Vec<&str> = pools
            .iter()
            .filter(|(_, maps)| maps.iter().any(|m| m == "Tiny"))
            .map(|(name, _)| name)
            .collect();
        assert_eq!(containing, vec!["certified", "small", "misc"]);
    }

    #[test]
    fn test_not_in_pool_goes_to_misc_only() {
        let grid = sheet(
            HEADERS,
            &[row("Outcast", 10.0, 10.0, num(1.0), text("nil"), true, true)],
        );
        let pools = classify(&grid).unwrap();

        for (name, maps) in pools.iter() {
            let expected: &[&str] = if name == MISC { &["Outcast"] } else { &[] };
            assert_eq!(maps, expected, "pool {}", name);
        }
    }

    #[test]
    fn test_presets_and_order() {
        let grid = sheet(
            HEADERS,
            &[
                row("Alpha", 12.0, 12.0, text("nil"), num(1.0), true, false),
                row("Beta", 20.0, 20.0, num(1.0), num(1.0), true, true),
                row("Gamma", 30.0, 16.0, num(1.0), num(1.0), false, true),
            ],
        );
        let pools = classify(&grid).unwrap();

        assert_eq!(pools.get("certified").unwrap(), ["Beta", "Gamma"]);
        assert_eq!(pools.get("uncertified").unwrap(), ["Alpha"]);
        assert_eq!(pools.get("small").unwrap(), ["Alpha"]);
        assert_eq!(pools.get("large").unwrap(), ["Beta"]);
        assert_eq!(pools.get("extraLarge").unwrap(), ["Gamma"]);
        assert_eq!(pools.get("1v1").unwrap(), ["Alpha", "Beta"]);
        assert_eq!(pools.get("ffa8").unwrap(), ["Beta", "Gamma"]);
        assert!(pools.get("misc").unwrap().is_empty());
        assert!(pools.get("2v2").is_none());

        let names: Vec<&str> = pools.iter().map(|(n, _)| n).collect();
        assert_eq!(&names[7..], ["1v1", "ffa8"]);
    }

    #[test]
    fn test_pooled_row_without_name_is_skipped() {
        let mut nameless = row("X", 10.0, 10.0, num(1.0), num(1.0), true, false);
        nameless[1] = CellValue::Empty;
        let grid = sheet(HEADERS, &[nameless]);

        let pools = classify(&grid).unwrap();
        assert!(pools.iter().all(|(_, maps)| maps.is_empty()));
    }

    #[test]
    fn test_blank_rows_are_ignored() {
        let grid = sheet(HEADERS, &[vec![], vec![CellValue::Empty; 4]]);
        let pools = classify(&grid).unwrap();
        assert!(pools.iter().all(|(_, maps)| maps.is_empty()));
    }

    #[test]
    fn test_idempotent() {
        let grid = sheet(
            HEADERS,
            &[
                row("Alpha", 12.0, 12.0, num(1.0), num(1.0), true, false),
                row("Beta", 20.0, 20.0, num(1.0), num(0.0), true, true),
            ],
        );
        assert_eq!(classify(&grid).unwrap(), classify(&grid).unwrap());
    }
}
