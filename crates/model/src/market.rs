//! Markets: a venue's listing of an instrument with venue-local
//! microstructure.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::instrument::{Instrument, InstrumentDetail};

/// A venue listing. `(venue_id, venue_symbol)` is unique — it is the key the
/// hot resolution path looks up by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: Uuid,
    pub instrument_id: Uuid,
    pub venue_id: String,
    pub venue_symbol: String,
    pub settlement_asset_id: Option<Uuid>,
    pub price_currency_id: Option<Uuid>,
    pub tick_size: Option<Decimal>,
    pub lot_size: Option<Decimal>,
    pub min_order_size: Option<Decimal>,
    pub max_order_size: Option<Decimal>,
    pub min_notional: Option<Decimal>,
    pub maker_fee: Option<Decimal>,
    pub taker_fee: Option<Decimal>,
    pub funding_interval_secs: Option<i64>,
    pub status: String,
    pub listed_at: Option<DateTime<Utc>>,
    pub delisted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMarket {
    pub instrument_id: Uuid,
    pub venue_id: String,
    pub venue_symbol: String,
    #[serde(default)]
    pub settlement_asset_id: Option<Uuid>,
    #[serde(default)]
    pub price_currency_id: Option<Uuid>,
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    #[serde(default)]
    pub min_order_size: Option<Decimal>,
    #[serde(default)]
    pub max_order_size: Option<Decimal>,
    #[serde(default)]
    pub min_notional: Option<Decimal>,
    #[serde(default)]
    pub maker_fee: Option<Decimal>,
    #[serde(default)]
    pub taker_fee: Option<Decimal>,
    #[serde(default)]
    pub funding_interval_secs: Option<i64>,
    #[serde(default)]
    pub listed_at: Option<DateTime<Utc>>,
}

/// Partial market update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPatch {
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    #[serde(default)]
    pub min_order_size: Option<Decimal>,
    #[serde(default)]
    pub max_order_size: Option<Decimal>,
    #[serde(default)]
    pub min_notional: Option<Decimal>,
    #[serde(default)]
    pub maker_fee: Option<Decimal>,
    #[serde(default)]
    pub taker_fee: Option<Decimal>,
    #[serde(default)]
    pub funding_interval_secs: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl MarketPatch {
    pub fn is_empty(&self) -> bool {
        self.tick_size.is_none()
            && self.lot_size.is_none()
            && self.min_order_size.is_none()
            && self.max_order_size.is_none()
            && self.min_notional.is_none()
            && self.maker_fee.is_none()
            && self.taker_fee.is_none()
            && self.funding_interval_secs.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketFilter {
    #[serde(default)]
    pub instrument_id: Option<Uuid>,
    #[serde(default)]
    pub venue_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The hot-path answer: the market joined with its canonical instrument and,
/// when present, the instrument's subtype row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMarket {
    pub market: Market,
    pub instrument: Instrument,
    pub detail: Option<InstrumentDetail>,
}
