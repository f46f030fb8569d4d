//! SQL text generation for the PostGIS backend.

use std::fmt::Display;

use super::error::StoreError;
use crate::model::LayerSchema;

/// Scalar columns that always exist in the output table, in insert order.
const SCALAR_COLUMNS: [&str; 3] = ["cd_mun", "cd_uf", "n_car"];

/// Accept only `[A-Za-z0-9_.]` so names can be spliced into SQL text.
pub fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if ok {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// PostgreSQL array literal for numbers: `{1,2,3}`.
pub fn array_literal<T: Display>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("{{{}}}", items.join(","))
}

/// PostgreSQL array literal for text with every element quoted.
pub fn text_array_literal(values: &[String]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Statements creating the output schema, table and indexes.
pub fn output_table_ddl(
    schema_name: &str,
    table: &str,
    srid: i32,
    layers: &LayerSchema,
) -> Result<Vec<String>, StoreError> {
    let schema_name = validate_identifier(schema_name)?;
    let table = validate_identifier(table)?;
    let qualified = format!("{}.{}", schema_name, table);
    let flag_columns = flag_columns(layers);

    let mut columns = vec![
        "gid serial PRIMARY KEY".to_string(),
        "id_layer text[]".to_string(),
        "id_feature integer[]".to_string(),
    ];
    columns.extend(SCALAR_COLUMNS.iter().map(|c| format!("{} integer", c)));
    columns.extend(flag_columns.iter().map(|c| format!("{} boolean", c)));
    columns.push("area_ha numeric".to_string());
    columns.push(format!("geometry geometry(Polygon, {})", srid));

    let mut statements = vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", schema_name),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            qualified,
            columns.join(",\n    ")
        ),
    ];

    let indexed = SCALAR_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(flag_columns)
        .chain(std::iter::once("area_ha".to_string()));
    for column in indexed {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {}_{}_idx ON {} ({})",
            table, column, qualified, column
        ));
    }
    statements.push(format!(
        "CREATE INDEX IF NOT EXISTS {}_geometry_gist ON {} USING GIST (geometry)",
        table, qualified
    ));

    Ok(statements)
}

/// Parameterized insert matching [`output_table_ddl`]'s column order.
pub(super) fn insert_statement(
    schema_name: &str,
    table: &str,
    srid: i32,
    layers: &LayerSchema,
) -> Result<String, StoreError> {
    let qualified = format!(
        "{}.{}",
        validate_identifier(schema_name)?,
        validate_identifier(table)?
    );
    let flag_columns = flag_columns(layers);

    let mut columns = vec!["id_layer", "id_feature"];
    columns.extend(SCALAR_COLUMNS);
    columns.extend(flag_columns.iter().map(String::as_str));
    columns.push("area_ha");
    columns.push("geometry");

    let mut values = vec![
        "$1::text::text[]".to_string(),
        "$2::text::integer[]".to_string(),
        "$3::int8".to_string(),
        "$4::int8".to_string(),
        "$5::int8".to_string(),
    ];
    let mut n = values.len();
    for _ in &flag_columns {
        n += 1;
        values.push(format!("${}::bool", n));
    }
    values.push(format!("${}::float8", n + 1));
    values.push(format!("ST_GeomFromText(${}::text, {})", n + 2, srid));

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified,
        columns.join(", "),
        values.join(", ")
    ))
}

fn flag_columns(layers: &LayerSchema) -> Vec<String> {
    layers.tags().iter().map(|t| LayerSchema::column_name(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("split").is_ok());
        assert!(validate_identifier("public.grid_10km").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("grid; DROP TABLE x").is_err());
        assert!(validate_identifier("\"quoted\"").is_err());
    }

    #[test]
    fn test_array_literal() {
        assert_eq!(array_literal(&[18_i64, 3, 99]), "{18,3,99}");
        assert_eq!(array_literal::<i64>(&[]), "{}");
    }

    #[test]
    fn test_text_array_literal_quotes_elements() {
        let tags = vec!["GRID".to_string(), "CAR".to_string(), "a\"b".to_string()];
        assert_eq!(text_array_literal(&tags), r#"{"GRID","CAR","a\"b"}"#);
    }

    #[test]
    fn test_ddl_columns_and_indexes() {
        let layers = LayerSchema::new(["CAR", "MUN"]);
        let ddl = output_table_ddl("split", "shards", 4674, &layers).unwrap();

        assert_eq!(ddl[0], "CREATE SCHEMA IF NOT EXISTS split");
        let create = &ddl[1];
        assert!(create.contains("gid serial PRIMARY KEY"));
        assert!(create.contains("id_layer text[]"));
        assert!(create.contains("id_feature integer[]"));
        assert!(create.contains("is_car boolean"));
        assert!(create.contains("is_mun boolean"));
        assert!(create.contains("area_ha numeric"));
        assert!(create.contains("geometry geometry(Polygon, 4674)"));

        // cd_mun, cd_uf, n_car, two flags, area_ha, plus the GiST index
        let indexes: Vec<_> = ddl.iter().filter(|s| s.starts_with("CREATE INDEX")).collect();
        assert_eq!(indexes.len(), 7);
        assert!(indexes.iter().any(|s| s.contains("USING GIST (geometry)")));
    }

    #[test]
    fn test_ddl_rejects_bad_names() {
        let layers = LayerSchema::new(["CAR"]);
        assert!(output_table_ddl("split", "shards;--", 4674, &layers).is_err());
    }

    #[test]
    fn test_insert_statement_placeholders() {
        let layers = LayerSchema::new(["CAR", "MUN"]);
        let sql = insert_statement("split", "shards", 4674, &layers).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO split.shards (id_layer, id_feature, cd_mun, cd_uf, n_car, is_car, is_mun, area_ha, geometry) \
             VALUES ($1::text::text[], $2::text::integer[], $3::int8, $4::int8, $5::int8, $6::bool, $7::bool, $8::float8, ST_GeomFromText($9::text, 4674))"
        );
    }
}
