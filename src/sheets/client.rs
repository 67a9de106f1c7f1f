use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::grid::{CellValue, Grid};
use crate::error::FetchError;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Only the first sheet's size and effective cell values are requested
const GRID_FIELDS: &str = "sheets(properties(gridProperties(rowCount,columnCount)),\
data(startRow,startColumn,rowData(values(effectiveValue))))";

/// Source of a spreadsheet's cell matrix
pub trait MatrixReader {
    fn load_grid(&self, sheet_id: &str, api_key: &str) -> Result<Grid, FetchError>;
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    grid_properties: GridProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: usize,
    #[serde(default)]
    column_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    start_row: usize,
    #[serde(default)]
    start_column: usize,
    #[serde(default)]
    row_data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    #[serde(default)]
    values: Vec<CellData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    effective_value: Option<ExtendedValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendedValue {
    number_value: Option<f64>,
    string_value: Option<String>,
    bool_value: Option<bool>,
    formula_value: Option<String>,
}

impl From<ExtendedValue> for CellValue {
    fn from(v: ExtendedValue) -> Self {
        if let Some(n) = v.number_value {
            CellValue::Number(n)
        } else if let Some(b) = v.bool_value {
            CellValue::Bool(b)
        } else if let Some(s) = v.string_value.or(v.formula_value) {
            CellValue::Text(s)
        } else {
            CellValue::Empty
        }
    }
}

/// Parse a Sheets v4 `spreadsheets.get` response into the first sheet's grid
pub fn grid_from_response(body: &str) -> Result<Grid, FetchError> {
    let response: SpreadsheetResponse = serde_json::from_str(body)?;
    let sheet = response.sheets.into_iter().next().ok_or(FetchError::NoSheets)?;

    let props = &sheet.properties.grid_properties;
    let mut grid = Grid::new(props.row_count, props.column_count);

    for data in sheet.data {
        for (r, row) in data.row_data.into_iter().enumerate() {
            for (c, cell) in row.values.into_iter().enumerate() {
                if let Some(value) = cell.effective_value {
                    grid.set(data.start_row + r, data.start_column + c, value.into());
                }
            }
        }
    }

    Ok(grid)
}

/// Reads spreadsheets through the Google Sheets v4 REST API using an API key
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(SHEETS_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("spring-maps/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl MatrixReader for GoogleSheetsClient {
    fn load_grid(&self, sheet_id: &str, api_key: &str) -> Result<Grid, FetchError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), sheet_id);
        debug!(%url, "Fetching spreadsheet");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", api_key),
                ("includeGridData", "true"),
                ("fields", GRID_FIELDS),
            ])
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text()?;
        let grid = grid_from_response(&text)?;
        debug!(
            rows = grid.row_count(),
            columns = grid.column_count(),
            "Spreadsheet loaded"
        );
        Ok(grid)
    }
}
