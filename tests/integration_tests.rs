//! Integration tests for the depot CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a depot command
fn depot() -> Command {
    Command::cargo_bin("depot").unwrap()
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    depot().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Run a `new` command and return the short ID from "✓ Created <kind> @N"
fn create(tmp: &TempDir, args: &[&str]) -> String {
    let output = depot().current_dir(tmp.path()).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find(|l| l.contains("Created"))
        .and_then(|l| l.split_whitespace().find(|w| w.starts_with('@')))
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn create_part(tmp: &TempDir, number: &str, extra: &[&str]) -> String {
    let mut args = vec!["part", "new", "--number", number, "--title", "Test part"];
    args.extend_from_slice(extra);
    create(tmp, &args)
}

/// Resolve a short ID to the full record ID
fn full_id(tmp: &TempDir, kind: &str, short: &str) -> String {
    let output = depot()
        .current_dir(tmp.path())
        .args([kind, "show", short, "-f", "id"])
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn part_json(tmp: &TempDir, short: &str) -> serde_json::Value {
    let output = depot()
        .current_dir(tmp.path())
        .args(["part", "show", short, "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    depot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Track spare parts, machines and purchasing"))
        .stdout(predicate::str::contains("order"));
}

#[test]
fn test_short_help_displays_about() {
    depot()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Maintenance warehouse toolkit"));
}

#[test]
fn test_version_displays() {
    depot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("depot"));
}

#[test]
fn test_unknown_command_fails() {
    depot().arg("frobnicate").assert().failure();
}

#[test]
fn test_completions_bash() {
    depot()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depot"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();
    depot()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized depot project"));

    assert!(tmp.path().join(".depot").is_dir());
    assert!(tmp.path().join("inventory/parts").is_dir());
    assert!(tmp.path().join("purchasing/orders").is_dir());
}

#[test]
fn test_init_twice_keeps_existing_project() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "KEEP-1", &["--qty", "2"]);

    depot()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"))
        .stdout(predicate::str::contains("depot init --force"));

    depot()
        .current_dir(tmp.path())
        .args(["init", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized depot project"));

    // Records survive a forced reinitialization
    let json = part_json(&tmp, &short);
    assert_eq!(json["part_number"], "KEEP-1");
}

#[test]
fn test_command_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    depot()
        .current_dir(tmp.path())
        .args(["part", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a Depot project"));
}

// ============================================================================
// Part Tests
// ============================================================================

#[test]
fn test_part_new_and_list() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "BRG-6204", &["--qty", "12", "--min", "2"]);
    assert_eq!(short, "@1");

    let files: Vec<_> = fs::read_dir(tmp.path().join("inventory/parts"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("PART-"));
    assert!(name.ends_with(".depot.yaml"));

    depot()
        .current_dir(tmp.path())
        .args(["part", "list", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BRG-6204"))
        .stdout(predicate::str::contains("healthy"));
}

#[test]
fn test_part_new_rejects_negative_usage() {
    let tmp = setup_test_project();
    depot()
        .current_dir(tmp.path())
        .args([
            "part", "new", "--number", "X-1", "--title", "Bad", "--weekly=-2",
        ])
        .assert()
        .failure();
}

#[test]
fn test_part_reorder_analysis() {
    let tmp = setup_test_project();
    // 5/week over 2 weeks lead + 3 safety gives a reorder level of 13
    let short = create_part(
        &tmp,
        "FLT-001",
        &["--qty", "10", "--min", "2", "--weekly", "5", "--lead", "2", "--safety", "3"],
    );

    let json = part_json(&tmp, &short);
    assert_eq!(json["stock"]["reorder_level"], 13);
    assert_eq!(json["stock"]["status"], "reorder_needed");
    assert_eq!(json["stock"]["suggested_order_qty"], 3);
}

#[test]
fn test_monthly_usage_fallback() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "OIL-5L", &["--qty", "50", "--monthly", "13", "--lead", "2"]);

    let json = part_json(&tmp, &short);
    // 13 / 4.33 = 3.0023/week, 2 weeks lead rounds up to 7
    assert_eq!(json["stock"]["reorder_level"], 7);
    assert_eq!(json["stock"]["status"], "healthy");
}

#[test]
fn test_part_use_and_receive() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "BLT-M8", &["--qty", "10"]);

    depot()
        .current_dir(tmp.path())
        .args(["part", "use", &short, "4", "--reason", "PM job"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Used 4"))
        .stdout(predicate::str::contains("10 → 6"));

    depot()
        .current_dir(tmp.path())
        .args(["part", "receive", &short, "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 → 26"));

    let json = part_json(&tmp, &short);
    assert_eq!(json["quantity"], 26);

    depot()
        .current_dir(tmp.path())
        .args(["movement", "list", "--part", &short, "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn test_part_use_more_than_stock_fails() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "SEAL-40", &["--qty", "3"]);

    depot()
        .current_dir(tmp.path())
        .args(["part", "use", &short, "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only 3 in stock"));

    // Nothing changed and no movement recorded
    let json = part_json(&tmp, &short);
    assert_eq!(json["quantity"], 3);
    assert!(fs::read_dir(tmp.path().join("inventory/movements"))
        .unwrap()
        .next()
        .is_none());
}

#[test]
fn test_part_use_zero_fails() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "SEAL-41", &["--qty", "3"]);
    depot()
        .current_dir(tmp.path())
        .args(["part", "use", &short, "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn test_part_adjust_to_count() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "FUSE-10A", &["--qty", "8"]);

    depot()
        .current_dir(tmp.path())
        .args(["part", "adjust", &short, "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8 → 5"));

    let json = part_json(&tmp, &short);
    assert_eq!(json["quantity"], 5);
}

#[test]
fn test_part_list_reorder_filter() {
    let tmp = setup_test_project();
    create_part(&tmp, "OK-1", &["--qty", "100", "--weekly", "1", "--lead", "1"]);
    create_part(&tmp, "LOW-1", &["--qty", "1", "--min", "2"]);

    depot()
        .current_dir(tmp.path())
        .args(["part", "list", "--reorder", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LOW-1"))
        .stdout(predicate::str::contains("OK-1").not());
}

#[test]
fn test_part_set_updates_fields() {
    let tmp = setup_test_project();
    let short = create_part(&tmp, "V-BELT", &["--qty", "4"]);

    depot()
        .current_dir(tmp.path())
        .args(["part", "set", &short, "--price", "12.5", "--location", "A-03"])
        .assert()
        .success();

    let json = part_json(&tmp, &short);
    assert_eq!(json["unit_price"], 12.5);
    assert_eq!(json["location"], "A-03");
}

// ============================================================================
// Assembly and BOM Tests
// ============================================================================

#[test]
fn test_assembly_bom_cost_and_where_used() {
    let tmp = setup_test_project();
    let mch = create(&tmp, &["machine", "new", "--name", "Press 1"]);
    let part = create_part(&tmp, "BRG-6204", &["--qty", "1", "--price", "12.5"]);
    let asm = create(&tmp, &["asm", "new", "--title", "Main spindle", "--machine", &mch]);

    depot()
        .current_dir(tmp.path())
        .args(["asm", "add", &asm, &format!("{}:2", part)])
        .assert()
        .success();

    let output = depot()
        .current_dir(tmp.path())
        .args(["asm", "cost", &asm, "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["cost"], 25.0);
    assert_eq!(json["short_parts"][0]["needed"], 2);
    assert_eq!(json["short_parts"][0]["on_hand"], 1);

    depot()
        .current_dir(tmp.path())
        .args(["where-used", &part, "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ASM-"));

    depot()
        .current_dir(tmp.path())
        .args(["report", "bom", &mch])
        .assert()
        .success()
        .stdout(predicate::str::contains("BRG-6204"));
}

#[test]
fn test_asm_add_rejects_zero_quantity() {
    let tmp = setup_test_project();
    let part = create_part(&tmp, "P-1", &[]);
    let asm = create(&tmp, &["asm", "new", "--title", "Gearbox"]);

    depot()
        .current_dir(tmp.path())
        .args(["asm", "add", &asm, &format!("{}:0", part)])
        .assert()
        .failure();
}

#[test]
fn test_hotspot_coordinates_validated() {
    let tmp = setup_test_project();
    let part = create_part(&tmp, "P-2", &[]);
    let asm = create(&tmp, &["asm", "new", "--title", "Conveyor"]);

    depot()
        .current_dir(tmp.path())
        .args(["hotspot", "new", &asm, "-x", "150", "-y", "20", "--part", &part])
        .assert()
        .failure();

    depot()
        .current_dir(tmp.path())
        .args(["hotspot", "new", &asm, "-x", "40", "-y", "20", "--part", &part])
        .assert()
        .success();

    depot()
        .current_dir(tmp.path())
        .args(["hotspot", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn test_hotspot_cycle_rejected() {
    let tmp = setup_test_project();
    let outer = create(&tmp, &["asm", "new", "--title", "Outer"]);
    let inner = create(&tmp, &["asm", "new", "--title", "Inner", "--parent", &outer]);

    depot()
        .current_dir(tmp.path())
        .args(["hotspot", "new", &inner, "-x", "10", "-y", "10", "--subassembly", &outer])
        .assert()
        .failure();
}

#[test]
fn test_delete_referenced_part_requires_force() {
    let tmp = setup_test_project();
    let part = create_part(&tmp, "REF-1", &[]);
    let asm = create(&tmp, &["asm", "new", "--title", "Holder"]);
    depot()
        .current_dir(tmp.path())
        .args(["asm", "add", &asm, &part])
        .assert()
        .success();

    depot()
        .current_dir(tmp.path())
        .args(["part", "delete", &part, "-y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    depot()
        .current_dir(tmp.path())
        .args(["part", "delete", &part, "-y", "--force"])
        .assert()
        .success();
}

// ============================================================================
// Purchasing Tests
// ============================================================================

#[test]
fn test_order_workflow_receives_stock() {
    let tmp = setup_test_project();
    let sup = create(&tmp, &["sup", "new", "--name", "Acme Bearings"]);
    let part = create_part(&tmp, "BRG-6205", &["--qty", "2", "--supplier", &sup, "--price", "9"]);
    let order = create(&tmp, &["order", "new", "--supplier", &sup]);

    depot()
        .current_dir(tmp.path())
        .args(["order", "add-line", &order, &part, "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 10"));

    depot()
        .current_dir(tmp.path())
        .args(["order", "submit", &order])
        .assert()
        .success()
        .stdout(predicate::str::contains("placed"));

    // Lines are frozen once the order is placed
    depot()
        .current_dir(tmp.path())
        .args(["order", "add-line", &order, &part, "1"])
        .assert()
        .failure();

    depot()
        .current_dir(tmp.path())
        .args(["order", "receive", &order, "--line", "1", "--qty", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("partially_received"));

    depot()
        .current_dir(tmp.path())
        .args(["order", "receive", &order])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order is now received"));

    let json = part_json(&tmp, &part);
    assert_eq!(json["quantity"], 12);

    let order_id = full_id(&tmp, "order", &order);
    depot()
        .current_dir(tmp.path())
        .args(["movement", "list", "--reference", &order_id, "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn test_order_receive_more_than_outstanding_fails() {
    let tmp = setup_test_project();
    let sup = create(&tmp, &["sup", "new", "--name", "Overflow Ltd"]);
    let first = create_part(&tmp, "GSK-0", &["--qty", "0"]);
    let part = create_part(&tmp, "GSK-1", &["--qty", "0"]);
    let order = create(&tmp, &["order", "new", "--supplier", &sup]);
    depot()
        .current_dir(tmp.path())
        .args(["order", "add-line", &order, &first, "2", "--price", "1"])
        .assert()
        .success();
    depot()
        .current_dir(tmp.path())
        .args(["order", "add-line", &order, &part, "3", "--price", "1.5"])
        .assert()
        .success();
    depot()
        .current_dir(tmp.path())
        .args(["order", "submit", &order])
        .assert()
        .success();

    depot()
        .current_dir(tmp.path())
        .args(["order", "receive", &order, "--line", "2", "--qty", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("on line 2"))
        .stderr(predicate::str::contains("only 3 outstanding"));

    depot()
        .current_dir(tmp.path())
        .args(["order", "receive", &order, "--line", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no line 3"));

    let json = part_json(&tmp, &part);
    assert_eq!(json["quantity"], 0);
}

#[test]
fn test_submit_empty_order_fails() {
    let tmp = setup_test_project();
    let sup = create(&tmp, &["sup", "new", "--name", "Empty Co"]);
    let order = create(&tmp, &["order", "new", "--supplier", &sup]);

    depot()
        .current_dir(tmp.path())
        .args(["order", "submit", &order])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no lines"));
}

#[test]
fn test_order_from_reorder_drafts_lines() {
    let tmp = setup_test_project();
    let sup = create(&tmp, &["sup", "new", "--name", "Filters Inc"]);
    create_part(&tmp, "FLT-A", &["--qty", "1", "--min", "4", "--supplier", &sup]);
    create_part(&tmp, "FLT-B", &["--qty", "50", "--supplier", &sup]);

    depot()
        .current_dir(tmp.path())
        .args(["order", "from-reorder", "--supplier", &sup])
        .assert()
        .success()
        .stdout(predicate::str::contains("FLT-A"))
        .stdout(predicate::str::contains("FLT-B").not());

    depot()
        .current_dir(tmp.path())
        .args(["order", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn test_duplicate_supplier_name_rejected() {
    let tmp = setup_test_project();
    create(&tmp, &["sup", "new", "--name", "Acme"]);
    depot()
        .current_dir(tmp.path())
        .args(["sup", "new", "--name", "ACME"])
        .assert()
        .failure();
}

#[test]
fn test_quote_compare_marks_best() {
    let tmp = setup_test_project();
    let a = create(&tmp, &["sup", "new", "--name", "Alpha"]);
    let b = create(&tmp, &["sup", "new", "--name", "Beta"]);
    let part = create_part(&tmp, "MTR-1", &[]);

    create(&tmp, &["quote", "new", "--supplier", &a, "--part", &part, "--price", "120"]);
    create(&tmp, &["quote", "new", "--supplier", &b, "--part", &part, "--price", "95"]);

    depot()
        .current_dir(tmp.path())
        .args(["quote", "compare", &part])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beta"))
        .stdout(predicate::str::contains("★"));
}

// ============================================================================
// Report, Export and Status Tests
// ============================================================================

#[test]
fn test_report_reorder_lists_low_parts() {
    let tmp = setup_test_project();
    create_part(&tmp, "LOW-9", &["--qty", "0"]);
    create_part(&tmp, "FINE-9", &["--qty", "40"]);

    depot()
        .current_dir(tmp.path())
        .args(["report", "reorder"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Reorder Report"))
        .stdout(predicate::str::contains("LOW-9"))
        .stdout(predicate::str::contains("FINE-9").not());
}

#[test]
fn test_report_inventory_to_file() {
    let tmp = setup_test_project();
    create_part(&tmp, "INV-1", &["--qty", "3", "--price", "2"]);
    let out = tmp.path().join("inventory.md");

    depot()
        .current_dir(tmp.path())
        .args(["report", "inventory", "-o", out.to_str().unwrap()])
        .assert()
        .success();

    let content = fs::read_to_string(out).unwrap();
    assert!(content.contains("INV-1") || content.contains("Inventory"));
}

#[test]
fn test_export_parts_csv() {
    let tmp = setup_test_project();
    create_part(&tmp, "CSV-1", &["--qty", "7"]);

    depot()
        .current_dir(tmp.path())
        .args(["export", "parts"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,part_number,title"))
        .stdout(predicate::str::contains("CSV-1"));
}

#[test]
fn test_status_json() {
    let tmp = setup_test_project();
    create_part(&tmp, "ST-1", &["--qty", "0"]);

    let output = depot()
        .current_dir(tmp.path())
        .args(["status", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["records"]["parts"], 1);
    assert_eq!(json["inventory"]["by_status"]["out_of_stock"], 1);
    assert_eq!(json["reorder"][0]["part_number"], "ST-1");
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_clean_project() {
    let tmp = setup_test_project();
    create_part(&tmp, "VAL-1", &["--qty", "1"]);

    depot()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("All records passed validation"));
}

#[test]
fn test_validate_reports_broken_file() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path()
            .join("inventory/parts/PART-01ARZ3NDEKTSV4RRFFQ69G5FAV.depot.yaml"),
        "id: PART-01ARZ3NDEKTSV4RRFFQ69G5FAV\npart_number: [unclosed\n",
    )
    .unwrap();

    depot()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_validate_reports_missing_link() {
    let tmp = setup_test_project();
    let sup = create(&tmp, &["sup", "new", "--name", "Gone Ltd"]);
    create_part(&tmp, "LNK-1", &["--supplier", &sup]);

    let sup_id = full_id(&tmp, "sup", &sup);
    let sup_file = tmp
        .path()
        .join("purchasing/suppliers")
        .join(format!("{}.depot.yaml", sup_id));
    fs::remove_file(sup_file).unwrap();

    depot()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing record"));
}
