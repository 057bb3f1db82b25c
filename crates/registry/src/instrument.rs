//! Instrument operations: one transaction writes the base row and its
//! subtype row, with subtype-specific validation up front.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use atlas_model::{
    instrument::EXERCISE_STYLES, EventType, FutureContract, Instrument, InstrumentDetail,
    InstrumentType, LendingPosition, NewFutureContract, NewLendingPosition, NewOptionSeries,
    NewPerpContract, NewSpotInstrument, OptionSeries, PerpContract, SpotInstrument,
};

use crate::asset::non_empty;
use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

pub(crate) fn validate_multiplier(multiplier: Decimal) -> Result<()> {
    if multiplier <= Decimal::ZERO {
        return Err(RegistryError::invalid(
            "contract_multiplier",
            "must be positive",
        ));
    }
    Ok(())
}

pub(crate) fn validate_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if expires_at <= now {
        return Err(RegistryError::invalid(
            "expires_at",
            "must be in the future",
        ));
    }
    Ok(())
}

pub(crate) fn validate_exercise_style(style: &str) -> Result<()> {
    if EXERCISE_STYLES.contains(&style) {
        Ok(())
    } else {
        Err(RegistryError::invalid(
            "exercise_style",
            format!("must be one of {EXERCISE_STYLES:?}"),
        ))
    }
}

impl Registry {
    pub async fn create_spot_instrument(
        &self,
        input: NewSpotInstrument,
    ) -> Result<(Instrument, SpotInstrument)> {
        let input = NewSpotInstrument {
            code: non_empty("code", &input.code)?,
            ..input
        };
        self.get_asset(input.base_asset_id).await?;
        self.get_asset(input.quote_asset_id).await?;

        let created = self
            .stores
            .instruments
            .insert_spot(Uuid::new_v4(), &input)
            .await
            .map_err(instrument_exists(&input.code))?;

        self.publish(EventType::InstrumentCreated, &created.0);
        Ok(created)
    }

    pub async fn create_perp_contract(
        &self,
        input: NewPerpContract,
    ) -> Result<(Instrument, PerpContract)> {
        let input = NewPerpContract {
            code: non_empty("code", &input.code)?,
            ..input
        };
        validate_multiplier(input.contract_multiplier)?;
        self.get_asset(input.underlying_asset_id).await?;

        let created = self
            .stores
            .instruments
            .insert_perp(Uuid::new_v4(), &input)
            .await
            .map_err(instrument_exists(&input.code))?;

        self.publish(EventType::InstrumentCreated, &created.0);
        Ok(created)
    }

    pub async fn create_future_contract(
        &self,
        input: NewFutureContract,
    ) -> Result<(Instrument, FutureContract)> {
        let input = NewFutureContract {
            code: non_empty("code", &input.code)?,
            ..input
        };
        validate_multiplier(input.contract_multiplier)?;
        validate_expiry(input.expires_at, Utc::now())?;
        self.get_asset(input.underlying_asset_id).await?;

        let created = self
            .stores
            .instruments
            .insert_future(Uuid::new_v4(), &input)
            .await
            .map_err(instrument_exists(&input.code))?;

        self.publish(EventType::InstrumentCreated, &created.0);
        Ok(created)
    }

    pub async fn create_option_series(
        &self,
        input: NewOptionSeries,
    ) -> Result<(Instrument, OptionSeries)> {
        let input = NewOptionSeries {
            code: non_empty("code", &input.code)?,
            exercise_style: input.exercise_style.to_lowercase(),
            ..input
        };
        validate_expiry(input.expires_at, Utc::now())?;
        validate_exercise_style(&input.exercise_style)?;
        if input.strike <= Decimal::ZERO {
            return Err(RegistryError::invalid("strike", "must be positive"));
        }
        self.get_asset(input.underlying_asset_id).await?;

        let created = self
            .stores
            .instruments
            .insert_option(Uuid::new_v4(), &input)
            .await
            .map_err(instrument_exists(&input.code))?;

        self.publish(EventType::InstrumentCreated, &created.0);
        Ok(created)
    }

    pub async fn create_lending_position(
        &self,
        instrument_type: InstrumentType,
        input: NewLendingPosition,
    ) -> Result<(Instrument, LendingPosition)> {
        if !matches!(
            instrument_type,
            InstrumentType::LendingDeposit | InstrumentType::LendingBorrow
        ) {
            return Err(RegistryError::invalid(
                "instrument_type",
                "must be lending_deposit or lending_borrow",
            ));
        }
        let input = NewLendingPosition {
            code: non_empty("code", &input.code)?,
            ..input
        };
        self.get_asset(input.underlying_asset_id).await?;

        let created = self
            .stores
            .instruments
            .insert_lending(Uuid::new_v4(), instrument_type, &input)
            .await
            .map_err(instrument_exists(&input.code))?;

        self.publish(EventType::InstrumentCreated, &created.0);
        Ok(created)
    }

    pub async fn get_instrument(&self, id: Uuid) -> Result<Instrument> {
        self.cached_fetch(
            "instrument",
            keys::instrument(id),
            self.ttl.instrument,
            || async move { Ok(self.stores.instruments.get(id).await?) },
        )
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("instrument {id}")))
    }

    pub async fn get_spot_instrument(&self, instrument_id: Uuid) -> Result<SpotInstrument> {
        self.cached_fetch(
            "instrument",
            keys::instrument_detail(InstrumentType::Spot, instrument_id),
            self.ttl.instrument,
            || async move { Ok(self.stores.instruments.get_spot(instrument_id).await?) },
        )
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("spot instrument {instrument_id}")))
    }

    pub async fn get_perp_contract(&self, instrument_id: Uuid) -> Result<PerpContract> {
        self.cached_fetch(
            "instrument",
            keys::instrument_detail(InstrumentType::Perpetual, instrument_id),
            self.ttl.instrument,
            || async move { Ok(self.stores.instruments.get_perp(instrument_id).await?) },
        )
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("perp contract {instrument_id}")))
    }

    pub async fn get_future_contract(&self, instrument_id: Uuid) -> Result<FutureContract> {
        self.cached_fetch(
            "instrument",
            keys::instrument_detail(InstrumentType::Future, instrument_id),
            self.ttl.instrument,
            || async move { Ok(self.stores.instruments.get_future(instrument_id).await?) },
        )
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("future contract {instrument_id}")))
    }

    pub async fn get_option_series(&self, instrument_id: Uuid) -> Result<OptionSeries> {
        self.cached_fetch(
            "instrument",
            keys::instrument_detail(InstrumentType::Option, instrument_id),
            self.ttl.instrument,
            || async move { Ok(self.stores.instruments.get_option(instrument_id).await?) },
        )
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("option series {instrument_id}")))
    }

    pub async fn get_lending_position(
        &self,
        instrument_type: InstrumentType,
        instrument_id: Uuid,
    ) -> Result<LendingPosition> {
        self.cached_fetch(
            "instrument",
            keys::instrument_detail(instrument_type, instrument_id),
            self.ttl.instrument,
            || async move {
                Ok(self
                    .stores
                    .instruments
                    .get_lending(instrument_type, instrument_id)
                    .await?)
            },
        )
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("lending position {instrument_id}")))
    }

    /// The instrument joined with its subtype row, each leg cache-aside.
    pub async fn get_instrument_detail(
        &self,
        id: Uuid,
    ) -> Result<(Instrument, Option<InstrumentDetail>)> {
        let instrument = self.get_instrument(id).await?;
        let detail = self.load_detail(&instrument).await?;
        Ok((instrument, detail))
    }

    pub(crate) async fn load_detail(
        &self,
        instrument: &Instrument,
    ) -> Result<Option<InstrumentDetail>> {
        let id = instrument.id;
        let detail = match instrument.instrument_type {
            InstrumentType::Spot => self
                .get_spot_instrument(id)
                .await
                .map(InstrumentDetail::Spot),
            InstrumentType::Perpetual => self
                .get_perp_contract(id)
                .await
                .map(InstrumentDetail::Perpetual),
            InstrumentType::Future => self
                .get_future_contract(id)
                .await
                .map(InstrumentDetail::Future),
            InstrumentType::Option => self
                .get_option_series(id)
                .await
                .map(InstrumentDetail::Option),
            InstrumentType::LendingDeposit => self
                .get_lending_position(InstrumentType::LendingDeposit, id)
                .await
                .map(InstrumentDetail::LendingDeposit),
            InstrumentType::LendingBorrow => self
                .get_lending_position(InstrumentType::LendingBorrow, id)
                .await
                .map(InstrumentDetail::LendingBorrow),
        };
        match detail {
            Ok(detail) => Ok(Some(detail)),
            // A base row without its subtype would be an integrity break; it
            // cannot happen through this crate's transactional writes, but a
            // missing row degrades to "no detail" rather than failing the
            // resolution.
            Err(RegistryError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn instrument_exists(code: &str) -> impl FnOnce(atlas_store::StoreError) -> RegistryError + '_ {
    move |e| match e {
        atlas_store::StoreError::AlreadyExists { .. } => {
            RegistryError::already_exists(format!("instrument {code:?}"))
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn multiplier_must_be_positive() {
        assert!(validate_multiplier(dec!(1)).is_ok());
        assert!(validate_multiplier(dec!(0.001)).is_ok());
        assert!(validate_multiplier(Decimal::ZERO).is_err());
        assert!(validate_multiplier(dec!(-1)).is_err());
    }

    #[test]
    fn expiry_boundary() {
        let now = Utc::now();
        assert!(validate_expiry(now + Duration::seconds(1), now).is_ok());
        assert!(validate_expiry(now, now).is_err());
        assert!(validate_expiry(now - Duration::seconds(1), now).is_err());
    }

    #[test]
    fn exercise_styles_validated() {
        assert!(validate_exercise_style("european").is_ok());
        assert!(validate_exercise_style("american").is_ok());
        assert!(validate_exercise_style("bermudan").is_ok());
        assert!(validate_exercise_style("asian").is_err());
        assert!(validate_exercise_style("").is_err());
    }
}
