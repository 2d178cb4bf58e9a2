//! Yahoo Finance chart API client for historical daily closes.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use super::PriceSeries;

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

/// Historical close for one trading day.
#[derive(Debug, Clone)]
pub struct HistoricalPrice {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// Fetch daily historical closes for one symbol. Days the API reports with
/// no close are skipped; the resulting gap propagates as undefined metrics
/// downstream rather than aborting the run.
pub async fn fetch_historical_prices(
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<HistoricalPrice>> {
    info!("fetching historical prices for {} from {} to {}", symbol, from, to);

    let client = Client::builder()
        .user_agent("Mozilla/5.0 (compatible; AlphaBot/1.0)")
        .build()?;

    let from_timestamp = from
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid from date"))?
        .and_utc()
        .timestamp();
    let to_timestamp = to
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow!("invalid to date"))?
        .and_utc()
        .timestamp();

    let url = format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
        symbol, from_timestamp, to_timestamp
    );

    let response = client
        .get(&url)
        .send()
        .await
        .context("failed to send request to Yahoo Finance")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Yahoo Finance returned error status: {}",
            response.status()
        ));
    }

    let data: YahooQuoteResponse = response
        .json()
        .await
        .context("failed to parse Yahoo Finance response")?;

    if let Some(error) = data.chart.error {
        return Err(anyhow!(
            "Yahoo Finance API error: {} - {}",
            error.code,
            error.description
        ));
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("no data returned from Yahoo Finance for {}", symbol))?;

    let timestamps = result
        .timestamp
        .ok_or_else(|| anyhow!("no timestamp data for {}", symbol))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no quote data for {}", symbol))?;
    let closes = quote.close.unwrap_or_default();

    let mut prices = Vec::new();
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow!("invalid timestamp"))?
            .date_naive();

        match closes.get(i).and_then(|&v| v) {
            Some(close) => prices.push(HistoricalPrice {
                date,
                close: Decimal::from_f64_retain(close)
                    .ok_or_else(|| anyhow!("invalid close price for {}", date))?,
            }),
            None => debug!("no close for {} on {}, skipping", symbol, date),
        }
    }

    debug!("fetched {} historical prices for {}", prices.len(), symbol);
    Ok(prices)
}

/// Fetch closes for every symbol into one series. Symbols are independent;
/// a failure for any of them fails the whole run, since the joiner requires
/// complete retrieval before it starts.
pub async fn fetch_series(
    symbols: &[String],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<PriceSeries> {
    let mut series = PriceSeries::new();
    for symbol in symbols {
        let history = fetch_historical_prices(symbol, from, to)
            .await
            .with_context(|| format!("price retrieval failed for {}", symbol))?;
        series.add_history(symbol, &history);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn should_skip_online_tests() -> bool {
        std::env::var("ALPHA_SKIP_ONLINE_TESTS")
            .map(|v| v != "0")
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_fetch_historical_prices() {
        if should_skip_online_tests() {
            return;
        }

        let from = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let result = fetch_historical_prices("SPY", from, to).await;
        if let Err(e) = &result {
            eprintln!("Skipping Yahoo historical prices test: {}", e);
            return;
        }
        let prices = result.unwrap();

        assert!(!prices.is_empty());
        assert!(prices.iter().all(|p| p.close > Decimal::ZERO));
    }
}
