use crate::schema::TableSchema;

/// `CREATE TABLE IF NOT EXISTS` for a schema, one column per line
pub fn generate_create_table(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            let mut def = format!("    {} {}", col.name, col.col_type.affinity());
            if col.primary_key {
                def.push_str(" PRIMARY KEY AUTOINCREMENT");
            } else if !col.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        schema.name,
        columns.join(",\n")
    )
}

pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {}({})",
                if index.unique { "UNIQUE " } else { "" },
                index.name(schema.name),
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

/// Comma-separated column list, excluding `id`
pub fn data_column_list(schema: &TableSchema) -> String {
    schema
        .data_columns()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT INTO t (a, b) VALUES (?, ?)` for every data column
pub fn generate_insert(schema: &TableSchema) -> String {
    let placeholders: Vec<&str> = schema.data_columns().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        data_column_list(schema),
        placeholders.join(", ")
    )
}

/// `UPDATE t SET a = ?, b = ? WHERE id = ?` for every data column
pub fn generate_update(schema: &TableSchema) -> String {
    let assignments: Vec<String> = schema
        .data_columns()
        .map(|c| format!("{} = ?", c.name))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE id = ?",
        schema.name,
        assignments.join(", ")
    )
}
