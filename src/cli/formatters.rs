//! Output formatting for CLI display.
//!
//! Separates presentation from the calculation pipeline: these functions
//! take finished portfolio rows and render tables, summaries, or JSON.

use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::engine::portfolio::PortfolioDayRow;
use crate::error::Result;

fn fmt_money(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn fmt_pct(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * Decimal::from(100)),
        None => "n/a".to_string(),
    }
}

#[derive(Tabled)]
struct DayRowDisplay {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Invested")]
    invested: String,
    #[tabled(rename = "Valuation")]
    valuation: String,
    #[tabled(rename = "ROI")]
    roi: String,
    #[tabled(rename = "P/L")]
    pl: String,
    #[tabled(rename = "Est. annual ROI")]
    annual_roi: String,
}

/// Render the per-day portfolio table, date-ordered.
pub fn format_history_table(rows: &[PortfolioDayRow]) -> String {
    let display: Vec<DayRowDisplay> = rows
        .iter()
        .map(|row| DayRowDisplay {
            date: row.date.to_string(),
            invested: fmt_money(row.total_value_currently_invested),
            valuation: fmt_money(row.current_portfolio_valuation),
            roi: fmt_pct(row.current_roi),
            pl: fmt_money(row.current_pl),
            annual_roi: fmt_pct(row.estimated_annual_roi),
        })
        .collect();

    Table::new(display)
        .with(Style::rounded())
        .modify(Columns::new(1..), Alignment::right())
        .to_string()
}

/// Render the "as of" summary for the latest fully defined day.
pub fn format_summary(row: &PortfolioDayRow) -> String {
    let pl_line = match row.current_pl {
        Some(pl) if pl >= Decimal::ZERO => fmt_money(row.current_pl).green().to_string(),
        Some(_) => fmt_money(row.current_pl).red().to_string(),
        None => "n/a".to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("Portfolio as of {}\n", row.date.to_string().bold()));
    out.push_str(&format!(
        "  Invested:        {}\n",
        fmt_money(row.total_value_currently_invested)
    ));
    out.push_str(&format!(
        "  Valuation:       {}\n",
        fmt_money(row.current_portfolio_valuation)
    ));
    out.push_str(&format!("  ROI:             {}\n", fmt_pct(row.current_roi)));
    out.push_str(&format!("  P/L:             {}\n", pl_line));
    out.push_str(&format!(
        "  Est. annual ROI: {}\n",
        fmt_pct(row.estimated_annual_roi)
    ));
    out
}

/// Summary serialized for `--json` output.
pub fn format_summary_json(row: &PortfolioDayRow) -> Result<String> {
    #[derive(Serialize)]
    struct JsonSummary {
        date: NaiveDate,
        total_value_currently_invested: Option<Decimal>,
        current_portfolio_valuation: Option<Decimal>,
        current_roi: Option<Decimal>,
        current_pl: Option<Decimal>,
        estimated_annual_roi: Option<Decimal>,
    }

    let summary = JsonSummary {
        date: row.date,
        total_value_currently_invested: row.total_value_currently_invested,
        current_portfolio_valuation: row.current_portfolio_valuation,
        current_roi: row.current_roi,
        current_pl: row.current_pl,
        estimated_annual_roi: row.estimated_annual_roi,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day_row() -> PortfolioDayRow {
        PortfolioDayRow {
            date: NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
            total_value_currently_invested: Some(dec!(1000)),
            current_portfolio_valuation: Some(dec!(1100)),
            current_roi: Some(dec!(0.1)),
            current_pl: Some(dec!(100)),
            estimated_annual_roi: None,
        }
    }

    #[test]
    fn test_history_table_contains_values_and_na() {
        let table = format_history_table(&[day_row()]);
        assert!(table.contains("2020-01-10"));
        assert!(table.contains("1000.00"));
        assert!(table.contains("10.00%"));
        assert!(table.contains("n/a"));
    }

    #[test]
    fn test_summary_json_round_trips() {
        let json = format_summary_json(&day_row()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["date"], "2020-01-10");
        // Decimal serializes as a string to preserve precision
        assert_eq!(value["current_pl"], "100");
        assert!(value["estimated_annual_roi"].is_null());
    }
}
