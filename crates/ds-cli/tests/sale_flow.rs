//! End-to-end integration tests for the complete point-of-sale flow.
//!
//! Tests the full pipeline: register tax periods -> seed the catalog ->
//! record a sale -> query it back, all through the spawned binary.

use std::path::Path;
use std::process::Command;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn ds_binary() -> String {
    env!("CARGO_BIN_EXE_ds").to_string()
}

/// Runs the binary against the given database file and asserts success.
fn run(db_path: &Path, args: &[&str]) -> String {
    let output = Command::new(ds_binary())
        .env("DS_DATABASE_PATH", db_path)
        .args(args)
        .output()
        .expect("failed to run ds");
    assert!(
        output.status.success(),
        "ds {args:?} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be UTF-8")
}

/// Pulls the id out of an `Added item: <id>`-style line.
fn id_after(output: &str, prefix: &str) -> String {
    output
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("no line starts with {prefix:?} in {output:?}"))
        .trim()
        .to_string()
}

#[test]
fn test_full_sale_flow() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("drugstore.db");

    // The first registered period covers the whole axis by itself; the
    // second splices a 15% window into it.
    run(
        &db_path,
        &[
            "tax", "add", "--begin", "2024-04-01", "--end", "2024-06-01", "--rate", "0.10",
        ],
    );
    let output = run(
        &db_path,
        &[
            "tax", "add", "--begin", "2024-06-01", "--end", "2024-09-01", "--rate", "0.15",
        ],
    );
    assert!(
        output.contains("Tax schedule now has 3 period(s)"),
        "unexpected tax add output: {output}"
    );

    let output = run(&db_path, &["tax", "list", "--json"]);
    let periods: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(periods.as_array().unwrap().len(), 3);

    // Seed the catalog and a member customer.
    let output = run(&db_path, &["item", "add", "Vantelin", "--price", "999"]);
    let vantelin = id_after(&output, "Added item: ");
    let output = run(&db_path, &["item", "add", "Bufferin", "--price", "500"]);
    let bufferin = id_after(&output, "Added item: ");
    let output = run(
        &db_path,
        &["customer", "add", "Yamada Taro", "--membership", "general"],
    );
    let customer = id_after(&output, "Added customer: ");

    // May 1 falls in the 10% period. Subtotal 2,999 earns the 5% member
    // discount: 2,999 - 149 = 2,850 taxable, 285 tax, 3,135 total.
    let receipt = run(
        &db_path,
        &[
            "sale",
            "record",
            "--customer",
            &customer,
            "--item",
            &format!("{vantelin}:1"),
            "--item",
            &format!("{bufferin}:4"),
            "--at",
            "2024-05-01",
        ],
    );
    assert!(receipt.contains("Recorded sale:"), "receipt: {receipt}");
    assert!(receipt.contains("3135"), "receipt: {receipt}");

    let output = run(&db_path, &["sale", "list", "--json"]);
    let sales: serde_json::Value = serde_json::from_str(&output).unwrap();
    let sales = sales.as_array().unwrap();
    assert_eq!(sales.len(), 1);
    let total: Decimal = sales[0]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(3135));
    let tax_rate: Decimal = sales[0]["tax_rate"].as_str().unwrap().parse().unwrap();
    assert_eq!(tax_rate, dec!(0.10));
    assert_eq!(sales[0]["customer"].as_str().unwrap(), "Yamada Taro");
}

#[test]
fn test_recording_inside_the_spliced_period_uses_its_rate() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("drugstore.db");

    run(
        &db_path,
        &[
            "tax", "add", "--begin", "2024-04-01", "--end", "2024-06-01", "--rate", "0.10",
        ],
    );
    run(
        &db_path,
        &[
            "tax", "add", "--begin", "2024-06-01", "--end", "2024-09-01", "--rate", "0.15",
        ],
    );

    let output = run(&db_path, &["item", "add", "Seirogan", "--price", "300"]);
    let seirogan = id_after(&output, "Added item: ");

    // Anonymous sale on July 15: no discount, 15% tax on 600 -> 690.
    let receipt = run(
        &db_path,
        &[
            "sale",
            "record",
            "--item",
            &format!("{seirogan}:2"),
            "--at",
            "2024-07-15",
        ],
    );
    assert!(receipt.contains("690"), "receipt: {receipt}");

    let output = run(&db_path, &["sale", "list", "--json"]);
    let sales: serde_json::Value = serde_json::from_str(&output).unwrap();
    let tax_rate: Decimal = sales.as_array().unwrap()[0]["tax_rate"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(tax_rate, dec!(0.15));
}

#[test]
fn test_removing_a_period_heals_the_schedule() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("drugstore.db");

    run(
        &db_path,
        &[
            "tax", "add", "--begin", "2024-04-01", "--end", "2024-06-01", "--rate", "0.10",
        ],
    );
    run(
        &db_path,
        &[
            "tax", "add", "--begin", "2024-06-01", "--end", "2024-09-01", "--rate", "0.15",
        ],
    );

    let output = run(&db_path, &["tax", "list", "--json"]);
    let periods: serde_json::Value = serde_json::from_str(&output).unwrap();
    let middle = periods.as_array().unwrap()[1]["id"].as_str().unwrap().to_string();

    // Both surviving neighbors carry 10%, so they merge back into one
    // period spanning the whole axis.
    let output = run(&db_path, &["tax", "remove", &middle]);
    assert!(
        output.contains("Tax schedule now has 1 period(s)"),
        "unexpected remove output: {output}"
    );
}
