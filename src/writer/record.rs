use std::collections::HashMap;

use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::map::CanonicalMap;
use crate::schema::TableSchema;

/// A map flattened into column values ready for binding
pub struct ParsedRow {
    pub values: HashMap<&'static str, SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(v: Option<f64>) -> Self {
        v.map(SqlValue::Real).unwrap_or(SqlValue::Null)
    }
}

impl From<Option<bool>> for SqlValue {
    fn from(v: Option<bool>) -> Self {
        v.map(|b| SqlValue::Integer(if b { 1 } else { 0 }))
            .unwrap_or(SqlValue::Null)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        v.map(SqlValue::Text).unwrap_or(SqlValue::Null)
    }
}

fn json_value<T: Serialize>(column: &'static str, value: Option<&T>) -> Result<SqlValue, StoreError> {
    match value {
        None => Ok(SqlValue::Null),
        Some(v) => serde_json::to_string(v)
            .map(SqlValue::Text)
            .map_err(|source| StoreError::Json { column, source }),
    }
}

/// Flatten a map into its column values
pub fn map_to_row(map: &CanonicalMap) -> Result<ParsedRow, StoreError> {
    let mut values = HashMap::new();

    values.insert("file_name", SqlValue::Text(map.file_name.clone()));
    values.insert("script_name", SqlValue::Text(map.script_name.clone()));
    values.insert("description", map.description.clone().into());
    values.insert("map_hardness", map.map_hardness.into());
    values.insert("gravity", map.gravity.into());
    values.insert("tidal_strength", map.tidal_strength.into());
    values.insert("max_metal", map.max_metal.into());
    values.insert("extractor_radius", map.extractor_radius.into());
    values.insert("min_wind", map.min_wind.into());
    values.insert("max_wind", map.max_wind.into());
    values.insert(
        "start_positions",
        json_value("start_positions", map.start_positions.as_ref())?,
    );
    values.insert("width", SqlValue::Integer(map.width as i64));
    values.insert("height", SqlValue::Integer(map.height as i64));
    values.insert("min_depth", map.min_depth.into());
    values.insert("max_depth", map.max_depth.into());
    values.insert("name", map.name.clone().into());
    values.insert("shortname", map.shortname.clone().into());
    values.insert("author", map.author.clone().into());
    values.insert("version", map.version.clone().into());
    values.insert("mapfile", map.mapfile.clone().into());
    values.insert("modtype", map.modtype.into());
    values.insert("not_deformable", map.not_deformable.into());
    values.insert("void_water", map.void_water.into());
    values.insert("void_ground", map.void_ground.into());
    values.insert("auto_show_metal", map.auto_show_metal.into());
    values.insert("map_info", json_value("map_info", map.map_info.as_ref())?);

    Ok(ParsedRow { values })
}

/// Bind every data column of `schema` from `row`, starting at parameter 1
pub fn bind_row(
    stmt: &mut rusqlite::Statement,
    schema: &TableSchema,
    row: &ParsedRow,
) -> rusqlite::Result<usize> {
    let mut idx = 0;
    for col in schema.data_columns() {
        idx += 1;
        let value = row.values.get(col.name).unwrap_or(&SqlValue::Null);
        value.bind_to(idx, stmt)?;
    }
    Ok(idx)
}

fn json_column<T: DeserializeOwned>(row: &Row, column: &'static str) -> Result<Option<T>, StoreError> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| serde_json::from_str(&t))
        .transpose()
        .map_err(|source| StoreError::Json { column, source })
}

/// Rebuild a map from a row selected with every data column
pub fn map_from_row(row: &Row) -> Result<CanonicalMap, StoreError> {
    let bool_column = |column: &str| -> rusqlite::Result<Option<bool>> {
        Ok(row.get::<_, Option<i64>>(column)?.map(|v| v != 0))
    };

    Ok(CanonicalMap {
        file_name: row.get("file_name")?,
        script_name: row.get("script_name")?,
        description: row.get("description")?,
        map_hardness: row.get("map_hardness")?,
        gravity: row.get("gravity")?,
        tidal_strength: row.get("tidal_strength")?,
        max_metal: row.get("max_metal")?,
        extractor_radius: row.get("extractor_radius")?,
        min_wind: row.get("min_wind")?,
        max_wind: row.get("max_wind")?,
        start_positions: json_column(row, "start_positions")?,
        width: row.get("width")?,
        height: row.get("height")?,
        min_depth: row.get("min_depth")?,
        max_depth: row.get("max_depth")?,
        name: row.get("name")?,
        shortname: row.get("shortname")?,
        author: row.get("author")?,
        version: row.get("version")?,
        mapfile: row.get("mapfile")?,
        modtype: row.get("modtype")?,
        not_deformable: bool_column("not_deformable")?,
        void_water: bool_column("void_water")?,
        void_ground: bool_column("void_ground")?,
        auto_show_metal: bool_column("auto_show_metal")?,
        map_info: json_column(row, "map_info")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MAPS;

    #[test]
    fn test_row_covers_every_column() {
        let row = map_to_row(&CanonicalMap::default()).unwrap();
        for col in MAPS.data_columns() {
            assert!(row.values.contains_key(col.name), "missing {}", col.name);
        }
        assert_eq!(row.values.len(), MAPS.columns.len() - 1);
    }

    #[test]
    fn test_option_conversions() {
        assert_eq!(SqlValue::from(Some(true)), SqlValue::Integer(1));
        assert_eq!(SqlValue::from(None::<bool>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(1.5)), SqlValue::Real(1.5));
        assert_eq!(SqlValue::from(Some("a".to_string())), SqlValue::Text("a".to_string()));
    }
}
