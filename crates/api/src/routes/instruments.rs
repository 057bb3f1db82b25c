//! Instrument endpoints: one create route per subtype, one joined read.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use atlas_model::{
    FutureContract, Instrument, InstrumentDetail, InstrumentType, LendingPosition,
    NewFutureContract, NewLendingPosition, NewOptionSeries, NewPerpContract, NewSpotInstrument,
    OptionSeries, PerpContract, SpotInstrument,
};

use crate::error::Result;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct CreatedInstrument<T> {
    pub instrument: Instrument,
    pub detail: T,
}

pub async fn create_spot(
    State(state): State<SharedState>,
    Json(input): Json<NewSpotInstrument>,
) -> Result<Json<CreatedInstrument<SpotInstrument>>> {
    let (instrument, detail) = state.registry.create_spot_instrument(input).await?;
    Ok(Json(CreatedInstrument { instrument, detail }))
}

pub async fn create_perp(
    State(state): State<SharedState>,
    Json(input): Json<NewPerpContract>,
) -> Result<Json<CreatedInstrument<PerpContract>>> {
    let (instrument, detail) = state.registry.create_perp_contract(input).await?;
    Ok(Json(CreatedInstrument { instrument, detail }))
}

pub async fn create_future(
    State(state): State<SharedState>,
    Json(input): Json<NewFutureContract>,
) -> Result<Json<CreatedInstrument<FutureContract>>> {
    let (instrument, detail) = state.registry.create_future_contract(input).await?;
    Ok(Json(CreatedInstrument { instrument, detail }))
}

pub async fn create_option(
    State(state): State<SharedState>,
    Json(input): Json<NewOptionSeries>,
) -> Result<Json<CreatedInstrument<OptionSeries>>> {
    let (instrument, detail) = state.registry.create_option_series(input).await?;
    Ok(Json(CreatedInstrument { instrument, detail }))
}

pub async fn create_lending_deposit(
    State(state): State<SharedState>,
    Json(input): Json<NewLendingPosition>,
) -> Result<Json<CreatedInstrument<LendingPosition>>> {
    let (instrument, detail) = state
        .registry
        .create_lending_position(InstrumentType::LendingDeposit, input)
        .await?;
    Ok(Json(CreatedInstrument { instrument, detail }))
}

pub async fn create_lending_borrow(
    State(state): State<SharedState>,
    Json(input): Json<NewLendingPosition>,
) -> Result<Json<CreatedInstrument<LendingPosition>>> {
    let (instrument, detail) = state
        .registry
        .create_lending_position(InstrumentType::LendingBorrow, input)
        .await?;
    Ok(Json(CreatedInstrument { instrument, detail }))
}

#[derive(Debug, Serialize)]
pub struct InstrumentResponse {
    pub instrument: Instrument,
    pub detail: Option<InstrumentDetail>,
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InstrumentResponse>> {
    let (instrument, detail) = state.registry.get_instrument_detail(id).await?;
    Ok(Json(InstrumentResponse { instrument, detail }))
}
