use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::{date_range, finite, optional_range, ApiError};
use crate::query::{
    CardUsageRow, CardVictoryRow, ComboDefeatsRow, ComboWinRow, DeckWinRow, SpecificVictoriesRow,
    WinRateShiftRow,
};

type Params<T> = Result<Query<T>, QueryRejection>;

fn non_empty(name: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", name)));
    }
    Ok(value.to_string())
}

/// `A,B` into `["A", "B"]`, keeping the given order.
fn parse_combo(raw: &str) -> Result<Vec<String>, ApiError> {
    let combo: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if combo.is_empty() {
        return Err(ApiError::BadRequest("combo must name at least one card".to_string()));
    }
    Ok(combo)
}

// ── Card win/loss share ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VictoryParams {
    pub card: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn victory_percentage(
    State(state): State<AppState>,
    params: Params<VictoryParams>,
) -> Result<Json<Vec<CardVictoryRow>>, ApiError> {
    let Query(params) = params?;
    let card = non_empty("card", &params.card)?;
    let range = date_range(params.start, params.end)?;

    let row = state.queries.victory_percentage(&card, &range).await;
    Ok(Json(vec![row]))
}

// ── Winning decks ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HighWinDecksParams {
    pub min_win_percentage: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn high_win_decks(
    State(state): State<AppState>,
    params: Params<HighWinDecksParams>,
) -> Result<Json<Vec<DeckWinRow>>, ApiError> {
    let Query(params) = params?;
    let threshold = finite("min_win_percentage", params.min_win_percentage)?;
    let range = date_range(params.start, params.end)?;

    let rows = state.queries.high_win_decks(threshold, &range).await;
    debug!("high_win_decks: {} rows", rows.len());
    Ok(Json(rows))
}

// ── Losses with a combo ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DefeatsParams {
    pub combo: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn defeats_with_combo(
    State(state): State<AppState>,
    params: Params<DefeatsParams>,
) -> Result<Json<Vec<ComboDefeatsRow>>, ApiError> {
    let Query(params) = params?;
    let combo = parse_combo(&params.combo)?;
    let range = date_range(params.start, params.end)?;

    let row = state.queries.defeats_with_combo(&combo, &range).await;
    Ok(Json(vec![row]))
}

// ── Underdog victories ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SpecificVictoriesParams {
    pub card: String,
    pub trophy_diff: f64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub async fn specific_victories(
    State(state): State<AppState>,
    params: Params<SpecificVictoriesParams>,
) -> Result<Json<Vec<SpecificVictoriesRow>>, ApiError> {
    let Query(params) = params?;
    let card = non_empty("card", &params.card)?;
    let trophy_diff = finite("trophy_diff", params.trophy_diff)?;
    let range = optional_range(params.start, params.end)?;

    let row = state
        .queries
        .specific_victories(&card, trophy_diff, range.as_ref())
        .await;
    Ok(Json(vec![row]))
}

// ── Winning combos ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HighWinCombosParams {
    pub combo_size: usize,
    pub min_win_percentage: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn high_win_combos(
    State(state): State<AppState>,
    params: Params<HighWinCombosParams>,
) -> Result<Json<Vec<ComboWinRow>>, ApiError> {
    let Query(params) = params?;
    if params.combo_size == 0 {
        return Err(ApiError::BadRequest("combo_size must be at least 1".to_string()));
    }
    let threshold = finite("min_win_percentage", params.min_win_percentage)?;
    let range = date_range(params.start, params.end)?;

    let rows = state
        .queries
        .high_win_combos(params.combo_size, threshold, &range)
        .await;
    debug!("high_win_combos: {} rows", rows.len());
    Ok(Json(rows))
}

// ── Balance update shift ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WinRateShiftParams {
    pub card: String,
    pub update_date: NaiveDate,
}

pub async fn win_rate_shift(
    State(state): State<AppState>,
    params: Params<WinRateShiftParams>,
) -> Result<Json<Vec<WinRateShiftRow>>, ApiError> {
    let Query(params) = params?;
    let card = non_empty("card", &params.card)?;

    let row = state.queries.win_rate_shift(&card, params.update_date).await;
    Ok(Json(vec![row]))
}

// ── Win rate versus usage ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WinUsageParams {
    pub min_win_rate: f64,
    pub max_usage_rate: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn win_usage_scatter(
    State(state): State<AppState>,
    params: Params<WinUsageParams>,
) -> Result<Json<Vec<CardUsageRow>>, ApiError> {
    let Query(params) = params?;
    let min_win_rate = finite("min_win_rate", params.min_win_rate)?;
    let max_usage_rate = finite("max_usage_rate", params.max_usage_rate)?;
    let range = date_range(params.start, params.end)?;

    let rows = state
        .queries
        .win_usage_scatter(min_win_rate, max_usage_rate, &range)
        .await;
    Ok(Json(rows))
}
