//! Integration tests for spreadsheet import and export

use asset_inventory::contract::{FieldType, InventoryError};
use asset_inventory::domain::spreadsheet::{read_workbook, Cell};
use rust_xlsxwriter::Workbook;
use serde_json::json;

mod common;
use common::{laptop_fields, print_test_header, TestContext};

/// Workbook with one `Monitors` sheet: asset tag, user, screen size
fn monitors_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Monitors").unwrap();
    sheet.write_string(0, 0, "Asset Tag").unwrap();
    sheet.write_string(0, 1, "User").unwrap();
    sheet.write_string(0, 2, "Screen Size").unwrap();

    sheet.write_string(1, 0, "MN-1").unwrap();
    sheet.write_string(1, 1, "Asha").unwrap();
    sheet.write_number(1, 2, 27).unwrap();

    sheet.write_string(2, 0, "MN-2").unwrap();
    sheet.write_string(2, 1, "Ravi").unwrap();
    sheet.write_number(2, 2, 24).unwrap();

    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn test_import_creates_category() {
    print_test_header(
        "test_import_creates_category",
        &[
            "Each sheet becomes a table and a registry entry",
            "Column types are inferred from the first data row",
        ],
    );
    let ctx = TestContext::new().await;
    let service = ctx.service();

    let summary = service.import_workbook(monitors_workbook()).await.unwrap();
    println!("   summary: {:?}", summary);

    assert_eq!(summary.imported.len(), 1);
    let sheet = &summary.imported[0];
    assert_eq!(sheet.table, "monitors");
    assert!(sheet.created);
    assert_eq!(sheet.rows, 2);
    assert_eq!(sheet.primary_key.as_deref(), Some("asset_tag"));

    let category = service.get_category("monitors").await.unwrap();
    let names: Vec<&str> = category.field_names().collect();
    assert_eq!(names, vec!["asset_tag", "user", "screen_size"]);
    assert_eq!(
        category.field("screen_size").map(|f| f.field_type),
        Some(FieldType::Integer)
    );

    let rows = service.search_asset("monitors", "MN-1").await.unwrap();
    assert_eq!(rows[0]["user"], json!("Asha"));
    assert_eq!(rows[0]["screen_size"], json!(27));
}

#[tokio::test]
async fn test_import_duplicate_rows_conflict() {
    let ctx = TestContext::new().await;
    let service = ctx.service();
    service.import_workbook(monitors_workbook()).await.unwrap();

    let err = service
        .import_workbook(monitors_workbook())
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Conflict { .. }));

    // The failed sheet rolled back as a whole
    let stats = service.dashboard_stats().await.unwrap();
    assert_eq!(stats.asset_counts_by_category["monitors"], 2);
}

#[tokio::test]
async fn test_import_extends_existing_table() {
    print_test_header(
        "test_import_extends_existing_table",
        &["Columns missing from an existing table are added and registered"],
    );
    let ctx = TestContext::new().await;
    let service = ctx.service();
    service.import_workbook(monitors_workbook()).await.unwrap();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Monitors").unwrap();
    sheet.write_string(0, 0, "Asset Tag").unwrap();
    sheet.write_string(0, 1, "Vendor").unwrap();
    sheet.write_string(1, 0, "MN-3").unwrap();
    sheet.write_string(1, 1, "Dell").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let summary = service.import_workbook(bytes).await.unwrap();
    assert!(!summary.imported[0].created);

    let category = service.get_category("monitors").await.unwrap();
    assert!(category.field("vendor").is_some());
    assert!(service.check_drift("monitors").await.unwrap().is_clean());

    let rows = service.search_asset("monitors", "MN-3").await.unwrap();
    assert_eq!(rows[0]["vendor"], json!("Dell"));
    assert_eq!(rows[0]["user"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_import_skips_empty_sheets() {
    let ctx = TestContext::new().await;

    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Blank").unwrap();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Keyboards").unwrap();
    sheet.write_string(0, 0, "Asset Code").unwrap();
    sheet.write_string(1, 0, "KB-1").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let summary = ctx.service().import_workbook(bytes).await.unwrap();
    assert_eq!(summary.skipped, vec!["Blank"]);
    assert_eq!(summary.imported[0].table, "keyboards");
}

#[tokio::test]
async fn test_import_rejects_garbage() {
    let ctx = TestContext::new().await;

    let err = ctx
        .service()
        .import_workbook(b"not a spreadsheet".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Validation { .. }));
}

#[tokio::test]
async fn test_export_table_round_trip() {
    print_test_header(
        "test_export_table_round_trip",
        &["An exported table reads back with its header row and every asset"],
    );
    let ctx = TestContext::new().await;
    let service = ctx.service();
    service.import_workbook(monitors_workbook()).await.unwrap();

    let bytes = service.export_table("Monitors").await.unwrap();
    let sheets = read_workbook(bytes).unwrap();

    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "monitors");
    assert_eq!(sheets[0].headers, vec!["asset_tag", "user", "screen_size"]);

    let mut tags: Vec<String> = sheets[0].rows.iter().map(|r| r[0].render()).collect();
    tags.sort();
    assert_eq!(tags, vec!["MN-1", "MN-2"]);
}

#[tokio::test]
async fn test_export_rejects_reserved_tables() {
    let ctx = TestContext::new().await;
    let service = ctx.service();

    for reserved in ["users", "category_info"] {
        let err = service.export_table(reserved).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation { .. }));
    }

    let err = service.export_table("ghost").await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_export_all_skips_missing_tables() {
    let ctx = TestContext::new().await;
    let service = ctx.service();
    service.import_workbook(monitors_workbook()).await.unwrap();
    service
        .create_category("Laptop", &laptop_fields())
        .await
        .unwrap();
    ctx.execute(r#"DROP TABLE "laptop""#).await;

    let sheets = read_workbook(service.export_all().await.unwrap()).unwrap();

    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["monitors"]);
    assert!(sheets[0]
        .rows
        .iter()
        .all(|row| matches!(row[2], Cell::Int(_) | Cell::Float(_))));
}

#[tokio::test]
async fn test_export_all_with_long_category_names() {
    print_test_header(
        "test_export_all_with_long_category_names",
        &["Tables sharing a 31-character prefix still export to distinct sheets"],
    );
    let ctx = TestContext::new().await;
    let service = ctx.service();
    for name in [
        "Office Equipment Main Building Floor A",
        "Office Equipment Main Building Floor B",
    ] {
        service.create_category(name, &laptop_fields()).await.unwrap();
    }

    let sheets = read_workbook(service.export_all().await.unwrap()).unwrap();

    let mut names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["office_equipment_main_buildin~2", "office_equipment_main_building_"]
    );
    assert!(sheets
        .iter()
        .all(|s| s.headers == vec!["asset_tag", "ram_gb", "purchase_date", "asset_status"]));
}
