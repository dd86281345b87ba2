//! Team analysis endpoints.
//!
//! `GET /api/analyzeTeam` aggregates seasons for an explicit team or, by
//! default, for the caller's own team's next opponent. Per-season
//! aggregations run concurrently with no shared mutable state; within one
//! season, boxscore fetches stay strictly sequential.
//!
//! "No schedule data" and "no future match" are recoverable empty states
//! reported as JSON error payloads with HTTP 200; an upstream schedule
//! fetch failure is a real error and maps to 502.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analysis::filter::{recompute, DefenseFilter, OffenseFilter};
use crate::analysis::models::{MatchRecord, SeasonAnalysis};
use crate::analysis::SeasonContext;
use crate::history::calendar;
use crate::history::store::TeamRecord;
use crate::server::{cookie_value, upstream_session, AppState, USER_COOKIE};
use crate::upstream::schedule;
use crate::upstream::GameApi;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeQuery {
    pub team_id: Option<String>,
    pub number_of_seasons: Option<String>,
}

/// One season's result. A failed schedule fetch for one season does not
/// abort its siblings; it is reported in place.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SeasonOutcome {
    Analysis(Box<SeasonAnalysis>),
    Failed { error: String },
}

impl SeasonOutcome {
    fn team_name(&self) -> Option<&str> {
        match self {
            SeasonOutcome::Analysis(analysis) if !analysis.team_name.is_empty() => {
                Some(&analysis.team_name)
            }
            _ => None,
        }
    }
}

pub async fn analyze_team(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(user) = cookie_value(&headers, USER_COOKIE)
        .and_then(|raw| urlencoding::decode(&raw).ok().map(|s| s.into_owned()))
        .and_then(|login| state.config.active_user(&login).cloned())
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Not authenticated"})),
        )
            .into_response();
    };

    let session = upstream_session(&headers);
    let now = Utc::now();

    match (&query.team_id, &query.number_of_seasons) {
        (Some(team_id), Some(count)) => {
            explicit_analysis(state, team_id.clone(), count, session, now).await
        }
        _ => default_analysis(state, user.main_team_id, session, now).await,
    }
}

/// Explicit mode: aggregate `numberOfSeasons` seasons (clamped to [1, 10],
/// unparseable falls back to 2) for the requested team, newest first.
async fn explicit_analysis(
    state: AppState,
    team_id: String,
    count_param: &str,
    session: String,
    now: DateTime<Utc>,
) -> axum::response::Response {
    let count = match count_param.trim().parse::<i64>() {
        Ok(count) => count.clamp(1, 10) as u32,
        Err(_) => 2,
    };
    let current = state.config.season.current;
    let seasons: Vec<u32> = (0..count).map(|i| current.saturating_sub(i)).collect();

    info!(team_id = %team_id, ?seasons, "Analyzing team");

    let mut tasks = JoinSet::new();
    for (index, &season) in seasons.iter().enumerate() {
        let state = state.clone();
        let team_id = team_id.clone();
        let session = session.clone();
        tasks.spawn(async move {
            (index, aggregate_one(state, team_id, season, session, now).await)
        });
    }

    let mut slots: Vec<Option<SeasonOutcome>> = seasons.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(err) => warn!(error = %err, "Season aggregation task failed"),
        }
    }
    let seasons_data: Vec<SeasonOutcome> = slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or(SeasonOutcome::Failed {
                error: "Aggregation task failed".to_string(),
            })
        })
        .collect();

    let opponent_name = seasons_data
        .iter()
        .find_map(SeasonOutcome::team_name)
        .unwrap_or_default()
        .to_string();

    Json(serde_json::json!({
        "opponentName": opponent_name,
        "opponentId": team_id,
        "seasons": seasons,
        "seasonsData": seasons_data,
    }))
    .into_response()
}

/// Default mode: find the caller's own team's next opponent and aggregate
/// the current and previous season for it.
async fn default_analysis(
    state: AppState,
    main_team_id: String,
    session: String,
    now: DateTime<Utc>,
) -> axum::response::Response {
    let current = state.config.season.current;

    let doc = match state.client.schedule(&main_team_id, current, &session).await {
        Ok(doc) => doc,
        Err(err) => {
            warn!(team_id = %main_team_id, error = %err, "Own schedule fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": "Failed to fetch team schedule"})),
            )
                .into_response();
        }
    };

    let scheduled = schedule::matches(&doc);
    if scheduled.is_empty() {
        return Json(serde_json::json!({"error": "Team schedule not found or empty"}))
            .into_response();
    }

    ensure_team_record(&state, &main_team_id, &doc);

    let Some(next) = scheduled
        .iter()
        .filter(|entry| entry.start.is_some_and(|start| start > now))
        .min_by_key(|entry| entry.start)
    else {
        return Json(serde_json::json!({"error": "No future match scheduled"})).into_response();
    };

    let opponent_id = next
        .opponent_of(&main_team_id)
        .unwrap_or(&next.home_id)
        .to_string();
    let opponent_name = next.opponent_name_of(&main_team_id).to_string();

    info!(opponent_id = %opponent_id, next_match = %next.id, "Analyzing next opponent");

    let previous = current.saturating_sub(1);
    let (curr, prev) = tokio::join!(
        aggregate_one(state.clone(), opponent_id.clone(), current, session.clone(), now),
        aggregate_one(state.clone(), opponent_id.clone(), previous, session.clone(), now),
    );

    let curr = serde_json::to_value(&curr).unwrap_or_default();
    let prev = serde_json::to_value(&prev).unwrap_or_default();

    Json(serde_json::json!({
        "opponentName": opponent_name,
        "opponentId": opponent_id,
        "curr": curr,
        "prev": prev,
        "season": current,
        "prevSeason": previous,
        "seasons": [current, previous],
        "seasonsData": [curr, prev],
    }))
    .into_response()
}

/// Lazily create the team's roster record on first successful schedule
/// fetch. Never overwrites an existing record.
fn ensure_team_record(state: &AppState, team_id: &str, doc: &crate::upstream::XmlNode) {
    match state.store.load_team(team_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            let Ok(id) = team_id.trim().parse::<i64>() else {
                warn!(team_id, "Team id is not numeric, skipping record creation");
                return;
            };
            let players = schedule::roster_ids(doc, team_id).into_iter().collect();
            if let Err(err) = state.store.save_team(&TeamRecord::new(id, players)) {
                warn!(team_id, error = %err, "Failed to create team record");
            }
        }
        Err(err) => warn!(team_id, error = %err, "Failed to read team record"),
    }
}

async fn aggregate_one(
    state: AppState,
    team_id: String,
    season: u32,
    session: String,
    now: DateTime<Utc>,
) -> SeasonOutcome {
    let week = calendar::current_week(now, &state.config.season);
    let context = SeasonContext {
        api: state.client.as_ref(),
        store: state.store.as_ref(),
        session: &session,
        current_season: state.config.season.current,
        current_week_id: week.id,
        now,
    };

    match context.aggregate(&team_id, season).await {
        Ok(analysis) => SeasonOutcome::Analysis(Box::new(analysis)),
        Err(err) => {
            warn!(team_id = %team_id, season, error = %err, "Season aggregation failed");
            SeasonOutcome::Failed {
                error: format!("Failed to fetch schedule for season {season}"),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeRequest {
    pub matches: Vec<MatchRecord>,
    #[serde(default = "default_filter")]
    pub offense_filter: String,
    #[serde(default = "default_filter")]
    pub defense_filter: String,
}

fn default_filter() -> String {
    "all".to_string()
}

/// Re-derive the filtered aggregates from a ledger the client already
/// holds. Pure computation; nothing is fetched.
pub async fn recompute_ledger(Json(request): Json<RecomputeRequest>) -> impl IntoResponse {
    let offense = OffenseFilter::parse(&request.offense_filter);
    let defense = DefenseFilter::parse(&request.defense_filter);
    Json(recompute(&request.matches, &offense, &defense))
}
