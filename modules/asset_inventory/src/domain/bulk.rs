//! Spreadsheet import into category tables, and export back out

use crate::contract::{
    Category, FieldDef, FieldType, ImportSummary, ImportedSheet, InventoryError, TableSnapshot,
};
use std::collections::HashSet;

use super::naming::{canonical_identifier, is_asset_key};
use super::registry;
use super::schema::{CellValue, ColumnInfo, ColumnKind, ColumnSpec, TableSpec};
use super::service::{commit, table_columns, Service};
use super::spreadsheet::{self, Cell, Sheet};
use super::validation::check_not_reserved;
use super::{storage_error, CatalogTx, DuplicateKey};

/// Column type suggested by the first non-empty sample.
///
/// Whole-number floats count as integers since spreadsheets store every
/// number as a float.
pub fn infer_field_type<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> FieldType {
    match cells.into_iter().find(|c| !c.is_empty()) {
        Some(Cell::Bool(_)) => FieldType::Boolean,
        Some(Cell::Int(_)) => FieldType::Integer,
        Some(Cell::Float(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            FieldType::Integer
        }
        Some(Cell::Float(_)) => FieldType::Float,
        Some(Cell::DateTime(_)) => FieldType::Date,
        _ => FieldType::String,
    }
}

/// Convert a cell for a column of the given kind; empty cells become null
pub fn cell_value(cell: &Cell, kind: ColumnKind) -> CellValue {
    if cell.is_empty() {
        return CellValue::Null;
    }

    match (kind, cell) {
        (ColumnKind::Integer, Cell::Int(i)) => CellValue::Integer(*i),
        (ColumnKind::Integer, Cell::Float(f)) if f.fract() == 0.0 => CellValue::Integer(*f as i64),
        (ColumnKind::Float, Cell::Int(i)) => CellValue::Float(*i as f64),
        (ColumnKind::Float, Cell::Float(f)) => CellValue::Float(*f),
        (ColumnKind::Boolean, Cell::Bool(b)) => CellValue::Boolean(*b),
        (ColumnKind::Date, Cell::DateTime(dt)) => CellValue::Date(dt.date()),
        (kind, cell) => kind.coerce_text(&cell.render()),
    }
}

/// A sheet resolved to canonical names and inferred types
#[derive(Debug)]
struct SheetPlan {
    table: String,
    fields: Vec<FieldDef>,
    primary_key: Option<String>,
}

impl SheetPlan {
    fn from_sheet(sheet: &Sheet) -> Result<Self, InventoryError> {
        let table = canonical_identifier(&sheet.name)?;
        check_not_reserved(&table)?;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(sheet.headers.len());
        for (i, header) in sheet.headers.iter().enumerate() {
            let name = canonical_identifier(header)?;
            if !seen.insert(name.clone()) {
                return Err(InventoryError::validation(format!(
                    "Sheet '{}' has duplicate column '{}'",
                    sheet.name, name
                )));
            }
            let field_type = infer_field_type(sheet.rows.iter().filter_map(|row| row.get(i)));
            fields.push(FieldDef::new(name, field_type));
        }

        let primary_key = fields
            .iter()
            .find(|f| is_asset_key(&f.name))
            .map(|f| f.name.clone());

        Ok(Self {
            table,
            fields,
            primary_key,
        })
    }

    fn table_spec(&self) -> TableSpec {
        TableSpec {
            name: self.table.clone(),
            columns: self
                .fields
                .iter()
                .map(|f| ColumnSpec {
                    name: f.name.clone(),
                    kind: ColumnKind::for_field(f.field_type),
                    primary_key: self.primary_key.as_deref() == Some(f.name.as_str()),
                })
                .collect(),
        }
    }
}

impl Service {
    /// Import every non-empty sheet of a workbook.
    ///
    /// Each sheet is one transaction: the table is created (or extended
    /// with the columns it lacks), the registry entry is written, and the
    /// rows are inserted. A failing sheet aborts the import; sheets
    /// committed before it stay.
    pub async fn import_workbook(&self, bytes: Vec<u8>) -> Result<ImportSummary, InventoryError> {
        let sheets = spreadsheet::read_workbook(bytes).map_err(|e| {
            tracing::warn!(error = %e, "unreadable workbook");
            InventoryError::validation(format!("Could not read spreadsheet: {}", e))
        })?;

        let mut summary = ImportSummary::default();
        for sheet in &sheets {
            if sheet.headers.is_empty() || sheet.rows.is_empty() {
                tracing::warn!(sheet = %sheet.name, "empty sheet, skipped");
                summary.skipped.push(sheet.name.clone());
                continue;
            }
            summary.imported.push(self.import_sheet(sheet).await?);
        }

        Ok(summary)
    }

    async fn import_sheet(&self, sheet: &Sheet) -> Result<ImportedSheet, InventoryError> {
        let plan = SheetPlan::from_sheet(sheet)?;
        let table = plan.table.clone();

        let mut tx = self.begin().await?;

        let existing = table_columns(tx.as_mut(), &table).await?;
        let created = existing.is_none();

        // Target kind for every sheet column: live type if the column exists
        let kinds: Vec<ColumnKind> = match &existing {
            None => {
                tx.create_table(&plan.table_spec())
                    .await
                    .map_err(storage_error("table creation failed"))?;
                plan.fields
                    .iter()
                    .map(|f| ColumnKind::for_field(f.field_type))
                    .collect()
            }
            Some(columns) => {
                let mut kinds = Vec::with_capacity(plan.fields.len());
                for field in &plan.fields {
                    match columns.iter().find(|c| c.name == field.name) {
                        Some(info) => kinds.push(info.kind),
                        None => {
                            let kind = ColumnKind::for_field(field.field_type);
                            tx.add_column(&table, &ColumnSpec::new(&field.name, kind))
                                .await
                                .map_err(storage_error("add imported column failed"))?;
                            kinds.push(kind);
                        }
                    }
                }
                kinds
            }
        };

        register_import(tx.as_mut(), &plan, existing.as_deref()).await?;

        let columns: Vec<String> = plan.fields.iter().map(|f| f.name.clone()).collect();
        let rows: Vec<Vec<CellValue>> = sheet
            .rows
            .iter()
            .map(|row| {
                kinds
                    .iter()
                    .enumerate()
                    .map(|(i, kind)| row.get(i).map_or(CellValue::Null, |c| cell_value(c, *kind)))
                    .collect()
            })
            .collect();

        let inserted = tx
            .insert_rows(&table, &columns, &rows)
            .await
            .map_err(|e| {
                if e.downcast_ref::<DuplicateKey>().is_some() {
                    InventoryError::conflict(format!(
                        "Sheet '{}' contains assets already present in '{}'",
                        sheet.name, table
                    ))
                } else {
                    InventoryError::internal("row import failed", e)
                }
            })?;

        commit(tx).await?;

        tracing::info!(
            sheet = %sheet.name,
            table = %table,
            created,
            rows = inserted,
            "sheet imported"
        );
        Ok(ImportedSheet {
            table,
            created,
            rows: rows.len(),
            primary_key: plan.primary_key,
        })
    }

    /// Full contents of one table, columns in physical order
    pub async fn snapshot_table(&self, name: &str) -> Result<TableSnapshot, InventoryError> {
        let name = canonical_identifier(name)?;
        if check_not_reserved(&name).is_err() {
            return Err(InventoryError::validation(format!(
                "Export of '{}' is not allowed",
                name
            )));
        }

        let columns = self.live_columns(&name).await?;
        let rows = self
            .assets
            .fetch_all(&name, &columns)
            .await
            .map_err(storage_error("table read failed"))?;

        Ok(TableSnapshot {
            name,
            columns: columns.into_iter().map(|c| c.name).collect(),
            rows,
        })
    }

    /// One-sheet workbook holding the whole table
    pub async fn export_table(&self, name: &str) -> Result<Vec<u8>, InventoryError> {
        let snapshot = self.snapshot_table(name).await?;
        let bytes = spreadsheet::write_workbook(std::slice::from_ref(&snapshot))
            .map_err(|e| InventoryError::internal("workbook encoding failed", e))?;

        tracing::debug!(table = %snapshot.name, rows = snapshot.rows.len(), "table exported");
        Ok(bytes)
    }

    /// Workbook with one sheet per registered category.
    ///
    /// Categories whose table is missing are left out.
    pub async fn export_all(&self) -> Result<Vec<u8>, InventoryError> {
        let categories = registry::list_all(self.catalog.as_ref()).await?;

        let mut snapshots = Vec::with_capacity(categories.len());
        for category in &categories {
            match self.snapshot_table(&category.name).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(InventoryError::NotFound { .. }) => {
                    tracing::warn!(category = %category.name, "table missing, left out of export");
                }
                Err(e) => return Err(e),
            }
        }

        let bytes = spreadsheet::write_workbook(&snapshots)
            .map_err(|e| InventoryError::internal("workbook encoding failed", e))?;

        tracing::debug!(sheets = snapshots.len(), "all tables exported");
        Ok(bytes)
    }
}

/// Create or extend the registry record so it lists every imported column
async fn register_import(
    tx: &mut dyn CatalogTx,
    plan: &SheetPlan,
    existing: Option<&[ColumnInfo]>,
) -> Result<(), InventoryError> {
    let record = tx
        .find(&plan.table)
        .await
        .map_err(storage_error("registry lookup failed"))?;

    match record {
        Some(category) => {
            let missing: Vec<FieldDef> = plan
                .fields
                .iter()
                .filter(|f| category.field(&f.name).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                registry::append_fields(tx, &plan.table, &missing).await?;
            }
        }
        None => {
            // A table that predates its registry record keeps its own columns first
            let mut fields: Vec<FieldDef> = existing
                .unwrap_or_default()
                .iter()
                .map(|c| FieldDef::new(&c.name, c.kind.field_type()))
                .collect();
            for field in &plan.fields {
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field.clone());
                }
            }
            tx.insert(&Category {
                name: plan.table.clone(),
                fields,
            })
            .await
            .map_err(storage_error("registry insert failed"))?;
        }
    }

    Ok(())
}
