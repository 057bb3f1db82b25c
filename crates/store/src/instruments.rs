//! Instrument persistence. An instrument row and its subtype row are written
//! in one transaction; a base row without its subtype never becomes visible.

use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use atlas_model::{
    FutureContract, Instrument, InstrumentDetail, InstrumentType, LendingPosition,
    NewFutureContract, NewLendingPosition, NewOptionSeries, NewPerpContract, NewSpotInstrument,
    OptionSeries, PerpContract, SpotInstrument,
};

use crate::error::{Result, StoreError};
use crate::row::parse_enum;

const INSTRUMENT_COLUMNS: &str = "id, instrument_type, code, created_at, updated_at";

#[derive(Clone)]
pub struct InstrumentStore {
    pool: PgPool,
}

impl InstrumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_spot(
        &self,
        id: Uuid,
        input: &NewSpotInstrument,
    ) -> Result<(Instrument, SpotInstrument)> {
        let mut tx = self.pool.begin().await?;
        let instrument =
            insert_base(&mut tx, id, InstrumentType::Spot, &input.code).await?;

        let row = sqlx::query(
            r#"
            insert into spot_instruments (instrument_id, base_asset_id, quote_asset_id)
            values ($1, $2, $3)
            returning instrument_id, base_asset_id, quote_asset_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.base_asset_id)
        .bind(input.quote_asset_id)
        .fetch_one(&mut *tx)
        .await?;
        let spot = map_spot(&row)?;

        tx.commit().await?;
        Ok((instrument, spot))
    }

    pub async fn insert_perp(
        &self,
        id: Uuid,
        input: &NewPerpContract,
    ) -> Result<(Instrument, PerpContract)> {
        let mut tx = self.pool.begin().await?;
        let instrument =
            insert_base(&mut tx, id, InstrumentType::Perpetual, &input.code).await?;

        let row = sqlx::query(
            r#"
            insert into perp_contracts (instrument_id, underlying_asset_id, is_inverse,
                                        is_quanto, contract_multiplier)
            values ($1, $2, $3, $4, $5)
            returning instrument_id, underlying_asset_id, is_inverse, is_quanto,
                      contract_multiplier, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.underlying_asset_id)
        .bind(input.is_inverse)
        .bind(input.is_quanto)
        .bind(input.contract_multiplier)
        .fetch_one(&mut *tx)
        .await?;
        let perp = map_perp(&row)?;

        tx.commit().await?;
        Ok((instrument, perp))
    }

    pub async fn insert_future(
        &self,
        id: Uuid,
        input: &NewFutureContract,
    ) -> Result<(Instrument, FutureContract)> {
        let mut tx = self.pool.begin().await?;
        let instrument =
            insert_base(&mut tx, id, InstrumentType::Future, &input.code).await?;

        let row = sqlx::query(
            r#"
            insert into future_contracts (instrument_id, underlying_asset_id, expires_at,
                                          is_inverse, is_quanto, contract_multiplier)
            values ($1, $2, $3, $4, $5, $6)
            returning instrument_id, underlying_asset_id, expires_at, is_inverse,
                      is_quanto, contract_multiplier, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.underlying_asset_id)
        .bind(input.expires_at)
        .bind(input.is_inverse)
        .bind(input.is_quanto)
        .bind(input.contract_multiplier)
        .fetch_one(&mut *tx)
        .await?;
        let future = map_future(&row)?;

        tx.commit().await?;
        Ok((instrument, future))
    }

    pub async fn insert_option(
        &self,
        id: Uuid,
        input: &NewOptionSeries,
    ) -> Result<(Instrument, OptionSeries)> {
        let mut tx = self.pool.begin().await?;
        let instrument =
            insert_base(&mut tx, id, InstrumentType::Option, &input.code).await?;

        let row = sqlx::query(
            r#"
            insert into option_series (instrument_id, underlying_asset_id, expires_at,
                                       strike, option_type, exercise_style)
            values ($1, $2, $3, $4, $5, $6)
            returning instrument_id, underlying_asset_id, expires_at, strike,
                      option_type, exercise_style, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.underlying_asset_id)
        .bind(input.expires_at)
        .bind(input.strike)
        .bind(input.option_type.as_str())
        .bind(&input.exercise_style)
        .fetch_one(&mut *tx)
        .await?;
        let option = map_option(&row)?;

        tx.commit().await?;
        Ok((instrument, option))
    }

    /// Lending deposits and borrows share a row shape; `instrument_type`
    /// picks the table.
    pub async fn insert_lending(
        &self,
        id: Uuid,
        instrument_type: InstrumentType,
        input: &NewLendingPosition,
    ) -> Result<(Instrument, LendingPosition)> {
        let table = lending_table(instrument_type)?;

        let mut tx = self.pool.begin().await?;
        let instrument = insert_base(&mut tx, id, instrument_type, &input.code).await?;

        let row = sqlx::query(&format!(
            r#"
            insert into {table} (instrument_id, underlying_asset_id)
            values ($1, $2)
            returning instrument_id, underlying_asset_id, created_at, updated_at
            "#,
        ))
        .bind(id)
        .bind(input.underlying_asset_id)
        .fetch_one(&mut *tx)
        .await?;
        let lending = map_lending(&row)?;

        tx.commit().await?;
        Ok((instrument, lending))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Instrument>> {
        let row = sqlx::query(&format!(
            "select {INSTRUMENT_COLUMNS} from instruments where id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_instrument).transpose()
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<Instrument>> {
        let row = sqlx::query(&format!(
            "select {INSTRUMENT_COLUMNS} from instruments where code = $1",
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_instrument).transpose()
    }

    pub async fn get_spot(&self, instrument_id: Uuid) -> Result<Option<SpotInstrument>> {
        let row = sqlx::query(
            r#"
            select instrument_id, base_asset_id, quote_asset_id, created_at, updated_at
            from spot_instruments where instrument_id = $1
            "#,
        )
        .bind(instrument_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_spot).transpose()
    }

    pub async fn get_perp(&self, instrument_id: Uuid) -> Result<Option<PerpContract>> {
        let row = sqlx::query(
            r#"
            select instrument_id, underlying_asset_id, is_inverse, is_quanto,
                   contract_multiplier, created_at, updated_at
            from perp_contracts where instrument_id = $1
            "#,
        )
        .bind(instrument_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_perp).transpose()
    }

    pub async fn get_future(&self, instrument_id: Uuid) -> Result<Option<FutureContract>> {
        let row = sqlx::query(
            r#"
            select instrument_id, underlying_asset_id, expires_at, is_inverse,
                   is_quanto, contract_multiplier, created_at, updated_at
            from future_contracts where instrument_id = $1
            "#,
        )
        .bind(instrument_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_future).transpose()
    }

    pub async fn get_option(&self, instrument_id: Uuid) -> Result<Option<OptionSeries>> {
        let row = sqlx::query(
            r#"
            select instrument_id, underlying_asset_id, expires_at, strike,
                   option_type, exercise_style, created_at, updated_at
            from option_series where instrument_id = $1
            "#,
        )
        .bind(instrument_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_option).transpose()
    }

    pub async fn get_lending(
        &self,
        instrument_type: InstrumentType,
        instrument_id: Uuid,
    ) -> Result<Option<LendingPosition>> {
        let table = lending_table(instrument_type)?;
        let row = sqlx::query(&format!(
            r#"
            select instrument_id, underlying_asset_id, created_at, updated_at
            from {table} where instrument_id = $1
            "#,
        ))
        .bind(instrument_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_lending).transpose()
    }

    /// The subtype row for an already-loaded instrument.
    pub async fn get_detail(&self, instrument: &Instrument) -> Result<Option<InstrumentDetail>> {
        let detail = match instrument.instrument_type {
            InstrumentType::Spot => self
                .get_spot(instrument.id)
                .await?
                .map(InstrumentDetail::Spot),
            InstrumentType::Perpetual => self
                .get_perp(instrument.id)
                .await?
                .map(InstrumentDetail::Perpetual),
            InstrumentType::Future => self
                .get_future(instrument.id)
                .await?
                .map(InstrumentDetail::Future),
            InstrumentType::Option => self
                .get_option(instrument.id)
                .await?
                .map(InstrumentDetail::Option),
            InstrumentType::LendingDeposit => self
                .get_lending(InstrumentType::LendingDeposit, instrument.id)
                .await?
                .map(InstrumentDetail::LendingDeposit),
            InstrumentType::LendingBorrow => self
                .get_lending(InstrumentType::LendingBorrow, instrument.id)
                .await?
                .map(InstrumentDetail::LendingBorrow),
        };
        Ok(detail)
    }
}

async fn insert_base(
    conn: &mut PgConnection,
    id: Uuid,
    instrument_type: InstrumentType,
    code: &str,
) -> Result<Instrument> {
    let row = sqlx::query(&format!(
        r#"
        insert into instruments (id, instrument_type, code)
        values ($1, $2, $3)
        returning {INSTRUMENT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(instrument_type.as_str())
    .bind(code)
    .fetch_one(conn)
    .await?;

    map_instrument(&row)
}

fn lending_table(instrument_type: InstrumentType) -> Result<&'static str> {
    match instrument_type {
        InstrumentType::LendingDeposit => Ok("lending_deposits"),
        InstrumentType::LendingBorrow => Ok("lending_borrows"),
        other => Err(StoreError::Decode(format!(
            "{other} is not a lending instrument type"
        ))),
    }
}

fn map_instrument(row: &PgRow) -> Result<Instrument> {
    Ok(Instrument {
        id: row.try_get("id")?,
        instrument_type: parse_enum(row, "instrument_type")?,
        code: row.try_get("code")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_spot(row: &PgRow) -> Result<SpotInstrument> {
    Ok(SpotInstrument {
        instrument_id: row.try_get("instrument_id")?,
        base_asset_id: row.try_get("base_asset_id")?,
        quote_asset_id: row.try_get("quote_asset_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_perp(row: &PgRow) -> Result<PerpContract> {
    Ok(PerpContract {
        instrument_id: row.try_get("instrument_id")?,
        underlying_asset_id: row.try_get("underlying_asset_id")?,
        is_inverse: row.try_get("is_inverse")?,
        is_quanto: row.try_get("is_quanto")?,
        contract_multiplier: row.try_get("contract_multiplier")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_future(row: &PgRow) -> Result<FutureContract> {
    Ok(FutureContract {
        instrument_id: row.try_get("instrument_id")?,
        underlying_asset_id: row.try_get("underlying_asset_id")?,
        expires_at: row.try_get("expires_at")?,
        is_inverse: row.try_get("is_inverse")?,
        is_quanto: row.try_get("is_quanto")?,
        contract_multiplier: row.try_get("contract_multiplier")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_option(row: &PgRow) -> Result<OptionSeries> {
    Ok(OptionSeries {
        instrument_id: row.try_get("instrument_id")?,
        underlying_asset_id: row.try_get("underlying_asset_id")?,
        expires_at: row.try_get("expires_at")?,
        strike: row.try_get("strike")?,
        option_type: parse_enum(row, "option_type")?,
        exercise_style: row.try_get("exercise_style")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_lending(row: &PgRow) -> Result<LendingPosition> {
    Ok(LendingPosition {
        instrument_id: row.try_get("instrument_id")?,
        underlying_asset_id: row.try_get("underlying_asset_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
