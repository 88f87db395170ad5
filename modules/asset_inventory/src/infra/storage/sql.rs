//! Dynamic statements for category tables
//!
//! Category tables have no entity, so statements are assembled with
//! sea-query and rendered for whichever backend the connection speaks.
//! Every identifier passed in here has already been through
//! `canonical_identifier`; sea-query quotes it on top of that.

use crate::contract::AssetRow;
use crate::domain::schema::{CellValue, ColumnInfo, ColumnKind, ColumnSpec, TableSpec};
use anyhow::{bail, Result};
use sea_orm::sea_query::{
    Alias, ColumnDef, Cond, Expr, Keyword, Query, SimpleExpr, Table,
};
use sea_orm::{DbBackend, DbErr, QueryResult, SqlErr, Statement};

// ===== Values =====

/// Bindable expression for a cell; nulls are emitted as a literal so no
/// parameter type has to be guessed
pub fn value_expr(value: &CellValue) -> SimpleExpr {
    match value {
        CellValue::Null => SimpleExpr::Keyword(Keyword::Null),
        CellValue::Text(s) => Expr::val(s.clone()).into(),
        CellValue::Integer(i) => Expr::val(*i).into(),
        CellValue::Float(f) => Expr::val(*f).into(),
        CellValue::Boolean(b) => Expr::val(*b).into(),
        CellValue::Date(d) => Expr::val(*d).into(),
    }
}

fn column_def(column: &ColumnSpec) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(column.name.as_str()));
    match column.kind {
        ColumnKind::Text | ColumnKind::Other => def.text(),
        ColumnKind::Integer => def.big_integer(),
        ColumnKind::Float => def.double(),
        ColumnKind::Boolean => def.boolean(),
        ColumnKind::Date => def.date(),
    };
    if column.primary_key {
        def.not_null().primary_key();
    }
    def
}

// ===== DDL =====

pub fn create_table(backend: DbBackend, spec: &TableSpec) -> Result<Statement> {
    if spec.columns.is_empty() {
        bail!("table '{}' needs at least one column", spec.name);
    }

    let mut stmt = Table::create();
    stmt.table(Alias::new(spec.name.as_str()));
    for column in &spec.columns {
        stmt.col(column_def(column));
    }
    Ok(backend.build(&stmt))
}

pub fn add_column(backend: DbBackend, table: &str, column: &ColumnSpec) -> Statement {
    let stmt = Table::alter()
        .table(Alias::new(table))
        .add_column(column_def(column))
        .to_owned();
    backend.build(&stmt)
}

pub fn drop_column(backend: DbBackend, table: &str, column: &str) -> Statement {
    let stmt = Table::alter()
        .table(Alias::new(table))
        .drop_column(Alias::new(column))
        .to_owned();
    backend.build(&stmt)
}

pub fn drop_table(backend: DbBackend, table: &str) -> Statement {
    let stmt = Table::drop().table(Alias::new(table)).if_exists().to_owned();
    backend.build(&stmt)
}

// ===== Rows =====

pub fn insert(
    backend: DbBackend,
    table: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<Statement> {
    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(table))
        .columns(columns.iter().map(|c| Alias::new(c.as_str())));
    for row in rows {
        if row.len() != columns.len() {
            bail!(
                "row has {} values for {} columns in '{}'",
                row.len(),
                columns.len(),
                table
            );
        }
        stmt.values(row.iter().map(value_expr))?;
    }
    Ok(backend.build(&stmt))
}

/// Select listed columns; `filter` restricts to `column = value`
pub fn select(
    backend: DbBackend,
    table: &str,
    columns: &[ColumnInfo],
    filter: Option<(&str, &CellValue)>,
) -> Statement {
    let mut stmt = Query::select();
    stmt.columns(columns.iter().map(|c| Alias::new(c.name.as_str())))
        .from(Alias::new(table));
    if let Some((column, value)) = filter {
        stmt.and_where(Expr::col(Alias::new(column)).eq(value_expr(value)));
    }
    backend.build(&stmt)
}

/// `UPDATE table SET column = value WHERE k1 = v1 OR k2 = v2 ...`
pub fn update_by_keys(
    backend: DbBackend,
    table: &str,
    keys: &[(String, CellValue)],
    column: &str,
    value: &CellValue,
) -> Statement {
    let scope = keys.iter().fold(Cond::any(), |cond, (key, id)| {
        cond.add(Expr::col(Alias::new(key.as_str())).eq(value_expr(id)))
    });

    let stmt = Query::update()
        .table(Alias::new(table))
        .value(Alias::new(column), value_expr(value))
        .cond_where(scope)
        .to_owned();
    backend.build(&stmt)
}

pub fn delete(backend: DbBackend, table: &str, column: &str, value: &CellValue) -> Statement {
    let stmt = Query::delete()
        .from_table(Alias::new(table))
        .and_where(Expr::col(Alias::new(column)).eq(value_expr(value)))
        .to_owned();
    backend.build(&stmt)
}

pub fn count(backend: DbBackend, table: &str, filter: Option<(&str, &CellValue)>) -> Statement {
    let mut stmt = Query::select();
    stmt.expr_as(Expr::cust("COUNT(*)"), Alias::new("count"))
        .from(Alias::new(table));
    if let Some((column, value)) = filter {
        stmt.and_where(Expr::col(Alias::new(column)).eq(value_expr(value)));
    }
    backend.build(&stmt)
}

// ===== Introspection =====

/// Column names and types of a table in physical order
pub fn table_columns(backend: DbBackend, table: &str) -> Result<Statement> {
    let sql = match backend {
        DbBackend::Postgres => {
            "SELECT column_name::text AS name, data_type::text AS type \
             FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position"
        }
        DbBackend::Sqlite => "SELECT name, type FROM pragma_table_info(?)",
        other => bail!("unsupported database backend: {:?}", other),
    };
    Ok(Statement::from_sql_and_values(backend, sql, [table.into()]))
}

/// Decode introspection rows; an empty result means the table is absent
pub fn column_infos(rows: &[QueryResult]) -> Result<Option<Vec<ColumnInfo>>> {
    if rows.is_empty() {
        return Ok(None);
    }
    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("", "name")?;
        let sql_type: String = row.try_get("", "type")?;
        columns.push(ColumnInfo::new(name, sql_type));
    }
    Ok(Some(columns))
}

// ===== Decoding =====

/// Decode a row into JSON values following the live column kinds
pub fn decode_row(row: &QueryResult, columns: &[ColumnInfo]) -> AssetRow {
    columns
        .iter()
        .map(|c| (c.name.clone(), decode_cell(row, &c.name, c.kind)))
        .collect()
}

fn decode_cell(row: &QueryResult, column: &str, kind: ColumnKind) -> serde_json::Value {
    use serde_json::Value;

    let typed = match kind {
        ColumnKind::Integer => row
            .try_get::<Option<i64>>("", column)
            .map(|v| v.map(Value::from))
            .or_else(|_| row.try_get::<Option<i32>>("", column).map(|v| v.map(Value::from))),
        ColumnKind::Float => row
            .try_get::<Option<f64>>("", column)
            .map(|v| v.map(Value::from))
            .or_else(|_| row.try_get::<Option<f32>>("", column).map(|v| v.map(Value::from))),
        ColumnKind::Boolean => row
            .try_get::<Option<bool>>("", column)
            .map(|v| v.map(Value::from)),
        ColumnKind::Date => row
            .try_get::<Option<chrono::NaiveDate>>("", column)
            .map(|v| v.map(|d| Value::from(d.format("%Y-%m-%d").to_string()))),
        ColumnKind::Text | ColumnKind::Other => row
            .try_get::<Option<String>>("", column)
            .map(|v| v.map(Value::from)),
    };

    match typed {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(_) => decode_untyped(row, column),
    }
}

/// Fallback for values stored under a different type than declared
fn decode_untyped(row: &QueryResult, column: &str) -> serde_json::Value {
    use serde_json::Value;

    if let Ok(Some(s)) = row.try_get::<Option<String>>("", column) {
        return Value::from(s);
    }
    if let Ok(Some(i)) = row.try_get::<Option<i64>>("", column) {
        return Value::from(i);
    }
    if let Ok(Some(f)) = row.try_get::<Option<f64>>("", column) {
        return Value::from(f);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>>("", column) {
        return Value::from(b);
    }
    tracing::debug!(column, "undecodable value, returned as null");
    Value::Null
}

pub fn decode_count(row: Option<QueryResult>) -> Result<u64> {
    let count: i64 = match row {
        Some(row) => row.try_get("", "count")?,
        None => 0,
    };
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Whether a database error is a primary key / unique violation
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldType;

    fn laptop() -> TableSpec {
        TableSpec {
            name: "laptop".to_string(),
            columns: vec![
                ColumnSpec {
                    name: "asset_tag".to_string(),
                    kind: ColumnKind::Text,
                    primary_key: true,
                },
                ColumnSpec::new("ram_gb", ColumnKind::for_field(FieldType::Integer)),
                ColumnSpec::new("purchased", ColumnKind::Date),
            ],
        }
    }

    #[test]
    fn test_create_table_quotes_identifiers() {
        let stmt = create_table(DbBackend::Postgres, &laptop()).unwrap();
        assert!(stmt.sql.starts_with(r#"CREATE TABLE "laptop""#));
        assert!(stmt.sql.contains(r#""asset_tag" text"#));
        assert!(stmt.sql.contains("PRIMARY KEY"));
        assert!(stmt.sql.contains(r#""ram_gb" bigint"#));
        assert!(stmt.sql.contains(r#""purchased" date"#));
    }

    #[test]
    fn test_create_table_requires_columns() {
        let spec = TableSpec {
            name: "empty".to_string(),
            columns: Vec::new(),
        };
        assert!(create_table(DbBackend::Sqlite, &spec).is_err());
    }

    #[test]
    fn test_insert_binds_values() {
        let stmt = insert(
            DbBackend::Postgres,
            "laptop",
            &["asset_tag".to_string(), "ram_gb".to_string()],
            &[vec![CellValue::Text("LT-1".to_string()), CellValue::Null]],
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "laptop" ("asset_tag", "ram_gb") VALUES ($1, NULL)"#
        );
        assert_eq!(stmt.values.map(|v| v.0.len()), Some(1));
    }

    #[test]
    fn test_insert_rejects_ragged_rows() {
        let result = insert(
            DbBackend::Sqlite,
            "laptop",
            &["asset_tag".to_string()],
            &[vec![CellValue::Null, CellValue::Null]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_scope_is_any_key() {
        let stmt = update_by_keys(
            DbBackend::Postgres,
            "laptop",
            &[
                ("asset_tag".to_string(), CellValue::Text("X".to_string())),
                ("asset_code".to_string(), CellValue::Text("X".to_string())),
            ],
            "remarks",
            &CellValue::Text("ok".to_string()),
        );
        assert_eq!(
            stmt.sql,
            r#"UPDATE "laptop" SET "remarks" = $1 WHERE "asset_tag" = $2 OR "asset_code" = $3"#
        );
    }

    #[test]
    fn test_introspection_per_backend() {
        let pg = table_columns(DbBackend::Postgres, "laptop").unwrap();
        assert!(pg.sql.contains("information_schema.columns"));
        let sqlite = table_columns(DbBackend::Sqlite, "laptop").unwrap();
        assert!(sqlite.sql.contains("pragma_table_info"));
        assert!(table_columns(DbBackend::MySql, "laptop").is_err());
    }
}
