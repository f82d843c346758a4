//! Brokerage endpoints: request parameters and response payloads
//!
//! Plain serde schema. Date fields use the crate's [`Date`] and
//! [`DateTimeMilliOffset`] so payloads decode the same on every machine.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::temporal::{Date, DateTimeMilliOffset};
use crate::transport::{HttpRequest, TransportError};

/// Base URL of the bank's web API
pub const API_BASE_URL: &str = "https://www.tbank.ru";

/// Layout of timestamps sent as query parameters
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A GET endpoint with typed input and output
pub trait Endpoint {
    /// Path relative to the API base URL
    const PATH: &'static str;

    /// Payload the endpoint answers with
    type Out: DeserializeOwned;

    /// Query parameters, in order
    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Builds the GET request for this endpoint against `base_url`
    fn request(&self, base_url: &str) -> Result<HttpRequest, TransportError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), Self::PATH);
        Ok(self
            .query()
            .into_iter()
            .fold(HttpRequest::get(&url)?, |request, (key, value)| {
                request.with_query(key, &value)
            }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradeOperationTypesIn;

impl Endpoint for TradeOperationTypesIn {
    const PATH: &'static str = "/invest-gw/ca-operations/api/v1/operations/types";
    type Out = TradeOperationTypesOut;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOperationType {
    pub category: String,
    pub operation_name: String,
    pub operation_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOperationTypesOut {
    pub operation_types: Vec<TradeOperationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAmount {
    pub currency: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct TradeAccountsIn {
    pub currency: String,
}

impl Endpoint for TradeAccountsIn {
    const PATH: &'static str = "/invest-gw/invest-portfolio/portfolios/accounts";
    type Out = TradeAccountsOut;

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("currency", self.currency.clone())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeTotals {
    pub expected_average_yield: TradeAmount,
    pub expected_average_yield_relative: f64,
    pub expected_yield: TradeAmount,
    pub expected_yield_per_day: TradeAmount,
    pub expected_yield_per_day_relative: f64,
    pub expected_yield_relative: f64,
    pub total_amount: TradeAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeAccount {
    pub auto_app: bool,
    pub broker_account_id: String,
    pub broker_account_type: String,
    pub buy_by_default: bool,
    pub is_visible: bool,
    pub name: String,
    pub opened_date: Date,
    pub order: i32,
    pub organization: String,
    pub status: String,
    #[serde(flatten)]
    pub totals: TradeTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAccounts {
    pub count: i32,
    pub list: Vec<TradeAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAccountsOut {
    pub accounts: TradeAccounts,
    pub totals: TradeTotals,
}

/// Operations of a brokerage account, newest first, paginated by cursor
#[derive(Debug, Clone, Default)]
pub struct TradeOperationsIn {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub broker_account_id: Option<String>,
    pub overnights_disabled: Option<bool>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl Endpoint for TradeOperationsIn {
    const PATH: &'static str = "/invest-gw/ca-operations/api/v1/user/operations";
    type Out = TradeOperationsOut;

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(from) = self.from {
            query.push(("from", from.format(QUERY_TIME_FORMAT).to_string()));
        }
        if let Some(to) = self.to {
            query.push(("to", to.format(QUERY_TIME_FORMAT).to_string()));
        }
        if let Some(id) = &self.broker_account_id {
            query.push(("brokerAccountId", id.clone()));
        }
        if let Some(disabled) = self.overnights_disabled {
            query.push(("overnightsDisabled", disabled.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            query.push(("cursor", cursor.clone()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: DateTimeMilliOffset,
    pub num: String,
    pub price: TradeAmount,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesInfo {
    pub trades: Vec<Trade>,
    pub trades_size: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOperation {
    pub account_id: String,
    pub account_name: String,
    pub asset_uid: String,
    pub best_executed: bool,
    pub broker_account_id: String,
    pub class_code: String,
    pub cursor: String,
    pub date: DateTimeMilliOffset,
    pub description: String,
    pub done_rest: i64,
    pub id: String,
    pub instrument_type: String,
    pub instrument_uid: String,
    pub internal_id: String,
    pub is_blocked_trade_clearing_account: bool,
    pub isin: String,
    pub name: String,
    pub payment: TradeAmount,
    pub payment_eur: TradeAmount,
    pub payment_rub: TradeAmount,
    pub payment_usd: TradeAmount,
    pub position_uid: String,
    #[serde(default)]
    pub price: Option<TradeAmount>,
    pub quantity: i64,
    pub short_description: String,
    pub show_name: String,
    pub status: String,
    pub ticker: String,
    #[serde(default)]
    pub trades_info: Option<TradesInfo>,
    #[serde(rename = "type")]
    pub kind: String,
    pub yield_relative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOperationsOut {
    pub has_next: bool,
    pub items: Vec<TradeOperation>,
    #[serde(default)]
    pub next_cursor: String,
}
