use axum::extract::State;
use axum::response::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::aggregator::RefreshJob;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::{ApiError, AppState};
use crate::config::load_leagues;
use crate::error::AppError;
use crate::filter::CardThreshold;
use crate::models::{DateRange, EnrichedMatch, Fixture, FixtureScope, LeagueSeason, TeamStatistics};
use crate::monitoring::health::HealthData;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct LeagueSeasonParams {
    pub league_id: i64,
    pub season: i32,
}

#[derive(Debug, Deserialize)]
pub struct WeekParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TeamParams {
    pub league_id: i64,
    pub season: i32,
    pub team_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CardFilterParams {
    pub season: i32,
    pub cartoes_min_por_time: f64,
    pub cartoes_media_somada: f64,
    #[serde(default)]
    pub scope: FixtureScope,
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub matches: Vec<Fixture>,
}

#[derive(Debug, Serialize)]
pub struct CardFilterResponse {
    pub confrontos_filtrados: Vec<Fixture>,
}

// -- Route Handlers --

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Football insights API" }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthData> {
    Json(state.health.snapshot().await)
}

pub async fn bulk_update_standings(State(state): State<AppState>) -> ApiResult<Value> {
    run_batch(&state, RefreshJob::Standings).await?;
    Ok(Json(json!({ "message": "Data updated successfully for all leagues" })))
}

pub async fn manual_update_standings(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LeagueSeasonParams>,
) -> ApiResult<Value> {
    let scope = LeagueSeason {
        league_id: params.league_id,
        season: params.season,
    };
    let teams = state.aggregator.refresh_standings(scope).await?;
    Ok(Json(json!({ "message": "Data updated successfully", "teams": teams })))
}

pub async fn update_today_matches_for_all_leagues(State(state): State<AppState>) -> ApiResult<Value> {
    let job = RefreshJob::Fixtures {
        scope: FixtureScope::Today,
        range: None,
    };
    run_batch(&state, job).await?;
    Ok(Json(json!({ "message": "Today's matches updated for all leagues" })))
}

pub async fn update_week_matches_for_all_leagues(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WeekParams>,
) -> ApiResult<Value> {
    // Checked here: the batch below only logs per-league failures.
    let range = match (params.start_date, params.end_date) {
        (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
        (None, None) => None,
        _ => {
            return Err(AppError::InvalidInput(
                "start_date and end_date must be given together".to_string(),
            )
            .into())
        }
    };

    let job = RefreshJob::Fixtures {
        scope: FixtureScope::Week,
        range,
    };
    run_batch(&state, job).await?;
    Ok(Json(json!({ "message": "Week's matches updated for all leagues" })))
}

pub async fn update_team_statistics(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TeamParams>,
) -> ApiResult<TeamStatistics> {
    let scope = LeagueSeason {
        league_id: params.league_id,
        season: params.season,
    };
    let stats = state
        .aggregator
        .refresh_team_statistics(scope, params.team_id)
        .await?;
    Ok(Json(stats))
}

pub async fn today_quartile_matches(
    State(state): State<AppState>,
    ApiPath((league_id, season)): ApiPath<(i64, i32)>,
) -> ApiResult<MatchesResponse> {
    quartile_matches(&state, LeagueSeason { league_id, season }, FixtureScope::Today).await
}

pub async fn week_quartile_matches(
    State(state): State<AppState>,
    ApiPath((league_id, season)): ApiPath<(i64, i32)>,
) -> ApiResult<MatchesResponse> {
    quartile_matches(&state, LeagueSeason { league_id, season }, FixtureScope::Week).await
}

pub async fn detailed_match_data(
    State(state): State<AppState>,
    ApiPath(match_id): ApiPath<i64>,
) -> ApiResult<EnrichedMatch> {
    Ok(Json(state.aggregator.get_enriched_match(match_id).await?))
}

pub async fn card_filtered_matches(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CardFilterParams>,
) -> ApiResult<CardFilterResponse> {
    let threshold = CardThreshold {
        min_per_team: params.cartoes_min_por_time,
        min_summed: params.cartoes_media_somada,
    };
    let confrontos_filtrados = state
        .aggregator
        .get_card_filtered(params.season, threshold, params.scope)
        .await?;
    Ok(Json(CardFilterResponse {
        confrontos_filtrados,
    }))
}

// -- Helpers --

async fn quartile_matches(
    state: &AppState,
    scope: LeagueSeason,
    fixture_scope: FixtureScope,
) -> ApiResult<MatchesResponse> {
    let matches = state.aggregator.get_mismatches(scope, fixture_scope).await?;
    Ok(Json(MatchesResponse { matches }))
}

/// Run a batch over the configured leagues. Per-league failures only reach
/// the logs and the health view; the caller sees overall success.
async fn run_batch(state: &AppState, job: RefreshJob) -> Result<(), ApiError> {
    let leagues = load_leagues(&state.leagues_path).map_err(|e| AppError::Config(format!("{e:#}")))?;
    let report = state.aggregator.refresh_all_leagues(&leagues, &job).await;
    state.health.record_batch(&report).await;
    Ok(())
}
