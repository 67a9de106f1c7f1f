use std::fmt;

/// A scalar spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Spreadsheet truthiness: non-zero numbers, non-empty text and `TRUE`
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Bool(b) => *b,
        }
    }

    /// Loose numeric reading: empty cells count as zero, unparseable text as NaN
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Empty => 0.0,
            CellValue::Number(n) => *n,
            CellValue::Text(s) if s.trim().is_empty() => 0.0,
            CellValue::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            CellValue::Bool(b) => f64::from(u8::from(*b)),
        }
    }

    /// Whether the cell holds a 1 (as a number, the text "1" or `TRUE`)
    pub fn is_one(&self) -> bool {
        !self.is_empty() && self.as_number() == 1.0
    }

    /// Display text, or `None` for an empty cell
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// A rows × columns matrix of cells. Reads outside the stored cells are empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    row_count: usize,
    column_count: usize,
    cells: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            row_count,
            column_count,
            cells: Vec::new(),
        }
    }

    /// Build a grid sized to fit `rows`
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            row_count: rows.len(),
            column_count,
            cells: rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Store a cell, growing the backing rows as needed
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.cells.len() <= row {
            self.cells.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.cells[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
        self.row_count = self.row_count.max(row + 1);
        self.column_count = self.column_count.max(col + 1);
    }
}
