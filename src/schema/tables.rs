//! Table schema definitions for the map catalogue

use super::types::*;

pub static MAPS: TableSchema = TableSchema {
    name: "maps",
    columns: &[
        Column::id(),
        Column::not_null("file_name", ColumnType::Text),
        Column::not_null("script_name", ColumnType::Text),
        Column::optional("description", ColumnType::Text),
        Column::optional("map_hardness", ColumnType::Real),
        Column::optional("gravity", ColumnType::Real),
        Column::optional("tidal_strength", ColumnType::Real),
        Column::optional("max_metal", ColumnType::Real),
        Column::optional("extractor_radius", ColumnType::Real),
        Column::optional("min_wind", ColumnType::Real),
        Column::optional("max_wind", ColumnType::Real),
        Column::optional("start_positions", ColumnType::Json),
        Column::not_null("width", ColumnType::Integer),
        Column::not_null("height", ColumnType::Integer),
        Column::optional("min_depth", ColumnType::Real),
        Column::optional("max_depth", ColumnType::Real),
        Column::optional("name", ColumnType::Text),
        Column::optional("shortname", ColumnType::Text),
        Column::optional("author", ColumnType::Text),
        Column::optional("version", ColumnType::Text),
        Column::optional("mapfile", ColumnType::Text),
        Column::optional("modtype", ColumnType::Real),
        Column::optional("not_deformable", ColumnType::Boolean),
        Column::optional("void_water", ColumnType::Boolean),
        Column::optional("void_ground", ColumnType::Boolean),
        Column::optional("auto_show_metal", ColumnType::Boolean),
        Column::optional("map_info", ColumnType::Json),
    ],
    indexes: &[Index::unique(&["script_name"]), Index::lookup(&["file_name"])],
};

pub static ALL_TABLES: &[&TableSchema] = &[&MAPS];
