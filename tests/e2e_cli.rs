//! End-to-end CLI tests, fully offline via the `--prices` file.

use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn basic_ledger() -> NamedTempFile {
    write_file("Symbol,Type,Open date,Qty,Adj cost\nABC,Buy,02/01/2020,10,1000\n")
}

fn flat_prices() -> NamedTempFile {
    let mut contents = String::from("symbol,date,close\n");
    for day in [2, 3, 6, 7, 8, 9, 10] {
        contents.push_str(&format!("ABC,2020-01-{:02},110\n", day));
        contents.push_str(&format!("SPY,2020-01-{:02},200\n", day));
    }
    write_file(&contents)
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::new(cargo::cargo_bin!("alpha"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("summary"));
}

#[test]
fn summary_json_reports_latest_fully_defined_day() {
    let ledger = basic_ledger();
    let prices = flat_prices();

    let mut cmd = Command::new(cargo::cargo_bin!("alpha"));
    cmd.arg("summary")
        .arg("-p")
        .arg(ledger.path())
        .arg("-s")
        .arg("2020-01-02")
        .arg("-e")
        .arg("2020-01-10")
        .arg("--prices")
        .arg(prices.path())
        .arg("--cost-basis")
        .arg("purchase")
        .arg("--json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("summary should be valid JSON");

    assert_eq!(value["date"], "2020-01-10");
    assert_eq!(value["total_value_currently_invested"], "1000");
    assert_eq!(value["current_portfolio_valuation"], "1100");
    assert_eq!(value["current_pl"], "100");
    assert_eq!(value["current_roi"], "0.1");
    assert!(!value["estimated_annual_roi"].is_null());
}

#[test]
fn history_prints_one_row_per_trading_day() {
    let ledger = basic_ledger();
    let prices = flat_prices();

    let mut cmd = Command::new(cargo::cargo_bin!("alpha"));
    cmd.arg("--no-color")
        .arg("history")
        .arg("-p")
        .arg(ledger.path())
        .arg("-s")
        .arg("2020-01-02")
        .arg("-e")
        .arg("2020-01-10")
        .arg("--prices")
        .arg(prices.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2020-01-02"))
        .stdout(predicate::str::contains("2020-01-10"))
        .stdout(predicate::str::contains("1100.00"));
}

#[test]
fn history_falls_back_to_weekday_calendar_without_benchmark_quotes() {
    let ledger = basic_ledger();
    // Price file carries the position's closes but no benchmark rows
    let mut contents = String::from("symbol,date,close\n");
    for day in [2, 3, 6, 7, 8, 9, 10] {
        contents.push_str(&format!("ABC,2020-01-{:02},110\n", day));
    }
    let prices = write_file(&contents);

    let mut cmd = Command::new(cargo::cargo_bin!("alpha"));
    cmd.arg("--no-color")
        .arg("history")
        .arg("-p")
        .arg(ledger.path())
        .arg("-s")
        .arg("2020-01-02")
        .arg("-e")
        .arg("2020-01-10")
        .arg("--prices")
        .arg(prices.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2020-01-02"))
        .stdout(predicate::str::contains("2020-01-10"))
        .stdout(predicate::str::contains("1100.00"));
}

#[test]
fn malformed_ledger_row_is_reported_with_row_number() {
    let ledger = write_file("Symbol,Type,Open date,Qty,Adj cost\nABC,Hold,02/01/2020,10,1000\n");
    let prices = flat_prices();

    let mut cmd = Command::new(cargo::cargo_bin!("alpha"));
    cmd.arg("summary")
        .arg("-p")
        .arg(ledger.path())
        .arg("--prices")
        .arg(prices.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("row 2"))
        .stderr(predicate::str::contains("unknown transaction type"));
}

#[test]
fn oversell_is_reported_with_symbol_and_unmatched_quantity() {
    let ledger = write_file(
        "Symbol,Type,Open date,Qty,Adj cost\n\
         ABC,Buy,02/01/2020,10,1000\n\
         ABC,Sell.FIFO,07/01/2020,11,1210\n",
    );
    let prices = flat_prices();

    let mut cmd = Command::new(cargo::cargo_bin!("alpha"));
    cmd.arg("summary")
        .arg("-p")
        .arg(ledger.path())
        .arg("-s")
        .arg("2020-01-02")
        .arg("-e")
        .arg("2020-01-10")
        .arg("--prices")
        .arg(prices.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("oversell of ABC"))
        .stderr(predicate::str::contains("1 shares"));
}
