//! Market operations, including the hot resolution path.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use atlas_model::{
    EventType, Market, MarketPatch, NewMarket, Page, PageRequest, ResolvedMarket,
};

use crate::asset::non_empty;
use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// Fee bound, inclusive. Wider than any sane schedule because observed
/// promotional schedules go above 100%; a policy knob, not physics.
static MAX_FEE: Lazy<Decimal> = Lazy::new(|| dec!(1.5));

fn check_positive(field: &'static str, value: Option<Decimal>) -> Result<()> {
    if let Some(v) = value {
        if v <= Decimal::ZERO {
            return Err(RegistryError::invalid(field, "must be positive"));
        }
    }
    Ok(())
}

fn check_fee(field: &'static str, value: Option<Decimal>) -> Result<()> {
    if let Some(v) = value {
        if v < Decimal::ZERO || v > *MAX_FEE {
            return Err(RegistryError::invalid(
                field,
                format!("must be between 0 and {}", *MAX_FEE),
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_market_values(
    tick_size: Option<Decimal>,
    lot_size: Option<Decimal>,
    min_order_size: Option<Decimal>,
    max_order_size: Option<Decimal>,
    min_notional: Option<Decimal>,
    maker_fee: Option<Decimal>,
    taker_fee: Option<Decimal>,
    funding_interval_secs: Option<i64>,
) -> Result<()> {
    check_positive("tick_size", tick_size)?;
    check_positive("lot_size", lot_size)?;
    check_positive("min_order_size", min_order_size)?;
    check_positive("max_order_size", max_order_size)?;
    check_positive("min_notional", min_notional)?;
    if let (Some(min), Some(max)) = (min_order_size, max_order_size) {
        if min >= max {
            return Err(RegistryError::invalid(
                "min_order_size",
                "must be below max_order_size",
            ));
        }
    }
    check_fee("maker_fee", maker_fee)?;
    check_fee("taker_fee", taker_fee)?;
    if let Some(interval) = funding_interval_secs {
        if interval <= 0 {
            return Err(RegistryError::invalid(
                "funding_interval_secs",
                "must be positive",
            ));
        }
    }
    Ok(())
}

impl Registry {
    pub async fn create_market(&self, input: NewMarket) -> Result<Market> {
        let input = NewMarket {
            venue_symbol: non_empty("venue_symbol", &input.venue_symbol)?,
            ..input
        };
        validate_market_values(
            input.tick_size,
            input.lot_size,
            input.min_order_size,
            input.max_order_size,
            input.min_notional,
            input.maker_fee,
            input.taker_fee,
            input.funding_interval_secs,
        )?;

        self.get_venue(&input.venue_id).await?;
        self.get_instrument(input.instrument_id).await?;
        if let Some(settlement) = input.settlement_asset_id {
            self.get_asset(settlement).await?;
        }
        if let Some(price_currency) = input.price_currency_id {
            self.get_asset(price_currency).await?;
        }

        let market = self
            .stores
            .markets
            .insert(Uuid::new_v4(), &input)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => RegistryError::already_exists(
                    format!("market {}:{}", input.venue_id, input.venue_symbol),
                ),
                other => other.into(),
            })?;

        self.publish(EventType::MarketListed, &market);
        Ok(market)
    }

    pub async fn get_market(&self, id: Uuid) -> Result<Market> {
        self.cached_fetch("market", keys::market(id), self.ttl.market, || async move {
            Ok(self.stores.markets.get(id).await?)
        })
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("market {id}")))
    }

    pub async fn update_market(&self, id: Uuid, patch: MarketPatch) -> Result<Market> {
        validate_market_values(
            patch.tick_size,
            patch.lot_size,
            patch.min_order_size,
            patch.max_order_size,
            patch.min_notional,
            patch.maker_fee,
            patch.taker_fee,
            patch.funding_interval_secs,
        )?;

        let updated = self
            .stores
            .markets
            .update(id, &patch)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("market {id}")))?;

        self.invalidate_market(&updated).await;
        self.publish(EventType::MarketUpdated, &updated);
        Ok(updated)
    }

    pub async fn delist_market(&self, id: Uuid) -> Result<Market> {
        let delisted = self
            .stores
            .markets
            .delist(id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("market {id}")))?;

        self.invalidate_market(&delisted).await;
        self.publish(EventType::MarketDelisted, &delisted);
        Ok(delisted)
    }

    /// The hot path: venue plus venue-local symbol to the market, its
    /// canonical instrument, and the instrument's subtype row. Each leg is
    /// cache-aside with its own TTL.
    pub async fn resolve_market(
        &self,
        venue_id: &str,
        venue_symbol: &str,
    ) -> Result<ResolvedMarket> {
        let key = keys::market_by_symbol(venue_id, venue_symbol);
        let market = self
            .cached_fetch("market", key, self.ttl.market, || async move {
                Ok(self
                    .stores
                    .markets
                    .get_by_venue_symbol(venue_id, venue_symbol)
                    .await?)
            })
            .await?
            .ok_or_else(|| {
                RegistryError::not_found(format!("market {venue_id}:{venue_symbol}"))
            })?;

        let instrument = self.get_instrument(market.instrument_id).await?;
        let detail = self.load_detail(&instrument).await?;

        Ok(ResolvedMarket {
            market,
            instrument,
            detail,
        })
    }

    pub async fn list_markets_by_instrument(
        &self,
        instrument_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Market>> {
        self.cache.record_skip("market");
        let items = self
            .stores
            .markets
            .list_by_instrument(instrument_id, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }

    pub async fn list_markets_by_venue(
        &self,
        venue_id: &str,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Market>> {
        self.cache.record_skip("market");
        let items = self
            .stores
            .markets
            .list_by_venue(venue_id, status, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }

    /// Both key shapes point at the same row; drop both.
    async fn invalidate_market(&self, market: &Market) {
        self.invalidate(
            "market",
            vec![
                keys::market(market.id),
                keys::market_by_symbol(&market.venue_id, &market.venue_symbol),
            ],
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_values() -> Result<()> {
        validate_market_values(
            Some(dec!(0.01)),
            Some(dec!(0.0001)),
            Some(dec!(0.001)),
            Some(dec!(1000)),
            Some(dec!(10)),
            Some(dec!(0.001)),
            Some(dec!(0.001)),
            Some(28800),
        )
    }

    #[test]
    fn sane_microstructure_accepted() {
        assert!(ok_values().is_ok());
        // Everything optional is also fine.
        assert!(validate_market_values(None, None, None, None, None, None, None, None).is_ok());
    }

    #[test]
    fn non_positive_sizes_rejected() {
        let err = validate_market_values(
            Some(Decimal::ZERO),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("tick_size"));
    }

    #[test]
    fn min_must_stay_below_max() {
        let err = validate_market_values(
            None,
            None,
            Some(dec!(10)),
            Some(dec!(5)),
            None,
            None,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("min_order_size"));
    }

    #[test]
    fn fee_bounds() {
        // 150% promotional fee is inside the policy bound, just.
        assert!(
            validate_market_values(None, None, None, None, None, Some(dec!(1.5)), None, None)
                .is_ok()
        );
        assert!(
            validate_market_values(None, None, None, None, None, Some(dec!(0)), None, None)
                .is_ok()
        );
        let err = validate_market_values(
            None,
            None,
            None,
            None,
            None,
            Some(dec!(1.51)),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("maker_fee"));
        let err = validate_market_values(
            None,
            None,
            None,
            None,
            None,
            None,
            Some(dec!(-0.01)),
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("taker_fee"));
    }
}
