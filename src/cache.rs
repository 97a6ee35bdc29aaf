use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

type PriceMap = Arc<Mutex<HashMap<String, Vec<f64>>>>;

/// Prices recorded by this process, keyed by product.
///
/// Append-only and unbounded; lives as long as the process. The sheet stays
/// the system of record, this only lets a fresh POST show up in the next GET
/// before the sheet reflects it.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    prices: PriceMap,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `price` and returns every price now held for `product`.
    pub async fn append(&self, product: &str, price: f64) -> Vec<f64> {
        let mut map = self.prices.lock().await;
        let list = map.entry(product.to_string()).or_default();
        list.push(price);
        list.clone()
    }

    pub async fn prices(&self, product: &str) -> Vec<f64> {
        self.prices
            .lock()
            .await
            .get(product)
            .cloned()
            .unwrap_or_default()
    }
}
