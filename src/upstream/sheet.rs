use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::SheetClient;
use crate::{
    config::SheetSchema,
    model::{PriceObservation, PriceQuery, SheetRow},
    Error,
};

/// What a GET against the sheet produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Row-array schema: aggregate these together with the local cache.
    Rows(Vec<SheetRow>),
    /// Hand this back to the caller untouched.
    Raw(Value),
}

/// What the gateway should answer to a POST once the sheet has the record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordReply {
    /// Report the running average of locally cached prices.
    RunningAverage,
    /// Relay the sheet's response body.
    Upstream(Value),
    /// Fixed acknowledgement, the sheet's body is ignored.
    Acknowledged,
}

/// One implementation per deployed sheet schema.
#[async_trait]
pub trait PriceSheet: Send + Sync {
    async fn lookup(&self, query: &PriceQuery) -> Result<Lookup, Error>;
    async fn record(&self, observation: &PriceObservation) -> Result<RecordReply, Error>;
}

pub fn sheet_for(schema: SheetSchema, client: SheetClient) -> Arc<dyn PriceSheet> {
    match schema {
        SheetSchema::Rows => Arc::new(RowSheet::new(client)),
        SheetSchema::Object => Arc::new(ObjectSheet::new(client, false)),
        SheetSchema::Ack => Arc::new(ObjectSheet::new(client, true)),
    }
}

/// Sheet that answers lookups with `[{city, shop, price}, ..]`.
#[derive(Debug, Clone)]
pub struct RowSheet {
    client: SheetClient,
}

impl RowSheet {
    pub fn new(client: SheetClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceSheet for RowSheet {
    async fn lookup(&self, query: &PriceQuery) -> Result<Lookup, Error> {
        let rows = self
            .client
            .get(&query.as_params())
            .await?
            .json::<Value>()
            .await?;

        // Anything but an array is a broken deployment, not "no rows".
        let rows: Vec<SheetRow> = serde_json::from_value(rows)?;
        Ok(Lookup::Rows(rows))
    }

    async fn record(&self, observation: &PriceObservation) -> Result<RecordReply, Error> {
        self.client.post(observation).await?;
        Ok(RecordReply::RunningAverage)
    }
}

/// Sheet whose responses are opaque JSON objects.
#[derive(Debug, Clone)]
pub struct ObjectSheet {
    client: SheetClient,
    acknowledge: bool,
}

impl ObjectSheet {
    pub fn new(client: SheetClient, acknowledge: bool) -> Self {
        Self { client, acknowledge }
    }
}

#[async_trait]
impl PriceSheet for ObjectSheet {
    async fn lookup(&self, query: &PriceQuery) -> Result<Lookup, Error> {
        let body = self
            .client
            .get(&query.as_params())
            .await?
            .json::<Value>()
            .await?;
        Ok(Lookup::Raw(body))
    }

    async fn record(&self, observation: &PriceObservation) -> Result<RecordReply, Error> {
        let res = self.client.post(observation).await?;
        if self.acknowledge {
            return Ok(RecordReply::Acknowledged);
        }
        Ok(RecordReply::Upstream(res.json::<Value>().await?))
    }
}
