use crate::model::{Aggregate, PriceRange, SheetRow};
use crate::Error;

const UNKNOWN_STORE: &str = "N/A";

/// Folds locally cached prices and sheet rows into one summary.
///
/// Cached prices come first, then the rows' prices in sheet order. The
/// cheapest store is the shop of the first row whose price equals the
/// minimum; cached prices carry no shop, so a minimum seen only locally
/// reports `N/A`.
pub fn summarize(cached: &[f64], rows: &[SheetRow]) -> Result<Aggregate, Error> {
    let prices: Vec<f64> = cached
        .iter()
        .copied()
        .chain(rows.iter().filter_map(SheetRow::price))
        .collect();

    let avg = mean(&prices).ok_or(Error::NoData)?;
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let cheapest_store = rows
        .iter()
        .find(|row| row.price() == Some(min))
        .and_then(SheetRow::shop)
        .unwrap_or_else(|| UNKNOWN_STORE.to_string());

    Ok(Aggregate {
        avg_price: fixed(avg),
        cheapest_price: fixed(min),
        cheapest_store,
        price_range: PriceRange {
            min: fixed(min),
            max: fixed(max),
        },
    })
}

pub fn mean(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

/// Two decimal places, the format every price leaves the gateway in.
pub fn fixed(n: f64) -> String {
    format!("{n:.2}")
}
