// src/api.rs
// Router, shared state, and one handler per dashboard endpoint. The paths
// and response shapes are frozen for front-end compatibility.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::error;

use crate::cache::HourlyCache;
use crate::clock::Clock;
use crate::config::{AppConfig, UPSTREAM_TIMEOUT};
use crate::error::FeedError;
use crate::feeds::{self, BundesligaRow, ChampionsLeagueRow, MatchOut};
use crate::ingest::providers::espn::EspnClient;
use crate::ingest::providers::openliga::OpenLigaClient;
use crate::reconcile::{self, Reconciled};
use crate::timeutil::hour_key;

#[derive(Clone)]
pub struct AppState {
    pub clock: Arc<dyn Clock>,
    pub openliga: Arc<OpenLigaClient>,
    pub espn: Arc<EspnClient>,
    caches: Arc<FeedCaches>,
}

struct FeedCaches {
    bundesliga: HourlyCache<Vec<MatchOut>>,
    champions_league: HourlyCache<Vec<MatchOut>>,
    dfb_pokal: HourlyCache<Reconciled>,
    germany: HourlyCache<Vec<MatchOut>>,
    bundesliga_table: HourlyCache<Vec<BundesligaRow>>,
    champions_league_table: HourlyCache<Vec<ChampionsLeagueRow>>,
}

impl AppState {
    pub fn new(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self {
            clock,
            openliga: Arc::new(OpenLigaClient::new(http.clone(), &config.openliga_base)),
            espn: Arc::new(EspnClient::new(
                http,
                &config.espn_scoreboard_base,
                &config.espn_standings_base,
            )),
            caches: Arc::new(FeedCaches {
                bundesliga: HourlyCache::new("bundesliga"),
                champions_league: HourlyCache::new("champions_league"),
                dfb_pokal: HourlyCache::new("dfb_pokal"),
                germany: HourlyCache::new("germany"),
                bundesliga_table: HourlyCache::new("bundesliga_table"),
                champions_league_table: HourlyCache::new("champions_league_table"),
            }),
        }
    }

    fn bucket(&self) -> String {
        hour_key(self.clock.now_berlin())
    }

    async fn bundesliga(&self) -> Result<Arc<Vec<MatchOut>>, FeedError> {
        let now = self.clock.now_berlin();
        self.caches
            .bundesliga
            .get_or_try_compute(&self.bucket(), || feeds::bundesliga(&self.openliga, now))
            .await
    }

    async fn champions_league(&self) -> Result<Arc<Vec<MatchOut>>, FeedError> {
        let now = self.clock.now_berlin();
        self.caches
            .champions_league
            .get_or_try_compute(&self.bucket(), || feeds::champions_league(&self.espn, now))
            .await
    }

    async fn dfb_pokal(&self) -> Result<Arc<Reconciled>, FeedError> {
        let now = self.clock.now_berlin();
        self.caches
            .dfb_pokal
            .get_or_try_compute(&self.bucket(), || {
                feeds::dfb_pokal(&self.openliga, &self.espn, now)
            })
            .await
    }

    // Best-effort feeds resolve to an empty list inside the computation, so
    // a broken hour is memoized instead of hammering the upstream per request.

    async fn germany(&self) -> Arc<Vec<MatchOut>> {
        self.caches
            .germany
            .get_or_try_compute(&self.bucket(), || async {
                Ok(feeds::germany(&self.openliga).await)
            })
            .await
            .unwrap_or_default()
    }

    async fn bundesliga_table(&self) -> Arc<Vec<BundesligaRow>> {
        let now = self.clock.now_berlin();
        self.caches
            .bundesliga_table
            .get_or_try_compute(&self.bucket(), || async {
                Ok(feeds::bundesliga_table(&self.openliga, now).await)
            })
            .await
            .unwrap_or_default()
    }

    async fn champions_league_table(&self) -> Arc<Vec<ChampionsLeagueRow>> {
        let now = self.clock.now_berlin();
        self.caches
            .champions_league_table
            .get_or_try_compute(&self.bucket(), || async {
                Ok(feeds::champions_league_table(&self.espn, now).await)
            })
            .await
            .unwrap_or_default()
    }
}

pub fn create_router(state: AppState, web_dir: &Path) -> Router {
    crate::ingest::ensure_metrics_described();

    Router::new()
        .route("/health", get(health))
        .route("/api/bundesliga", get(get_bundesliga))
        .route("/api/bundesliga/table", get(get_bundesliga_table))
        .route("/api/champions-league", get(get_champions_league))
        .route("/api/champions-league/table", get(get_champions_league_table))
        .route("/api/dfb-pokal", get(get_dfb_pokal))
        .route("/api/dfb-pokal/teams", get(get_dfb_pokal_teams))
        .route("/api/germany", get(get_germany))
        .route("/api/all", get(get_all))
        // Static dashboard for everything the API does not claim.
        .fallback_service(ServeDir::new(web_dir))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Required-source failures surface as a 500 with a JSON message.
pub struct ApiError(FeedError);

impl From<FeedError> for ApiError {
    fn from(e: FeedError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "feed request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct CompetitionMatches {
    competition: &'static str,
    matches: Vec<MatchOut>,
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": state.clock.now_berlin().to_rfc3339(),
    }))
}

async fn get_bundesliga(
    State(state): State<AppState>,
) -> Result<Json<CompetitionMatches>, ApiError> {
    let matches = state.bundesliga().await?;
    Ok(Json(CompetitionMatches {
        competition: "1. Bundesliga",
        matches: (*matches).clone(),
    }))
}

async fn get_champions_league(
    State(state): State<AppState>,
) -> Result<Json<CompetitionMatches>, ApiError> {
    let matches = state.champions_league().await?;
    Ok(Json(CompetitionMatches {
        competition: "Champions League",
        matches: (*matches).clone(),
    }))
}

async fn get_dfb_pokal(
    State(state): State<AppState>,
) -> Result<Json<CompetitionMatches>, ApiError> {
    let rec = state.dfb_pokal().await?;
    Ok(Json(CompetitionMatches {
        competition: "DFB-Pokal",
        matches: feeds::cup_matches(&rec),
    }))
}

async fn get_dfb_pokal_teams(State(state): State<AppState>) -> Json<serde_json::Value> {
    // Best-effort: the dashboard widget prefers an empty list to an error.
    let (teams, round) = match state.dfb_pokal().await {
        Ok(rec) => (
            reconcile::remaining_teams(&rec),
            reconcile::next_round_label(&rec),
        ),
        Err(e) => {
            error!(error = %e, "teams feed failed");
            (Vec::new(), String::new())
        }
    };
    Json(json!({
        "competition": "DFB-Pokal",
        "teams": teams,
        "round": round,
    }))
}

async fn get_germany(State(state): State<AppState>) -> Json<CompetitionMatches> {
    let matches = state.germany().await;
    Json(CompetitionMatches {
        competition: "Deutschland",
        matches: (*matches).clone(),
    })
}

#[derive(Serialize)]
struct CompetitionStandings<T> {
    competition: &'static str,
    standings: Vec<T>,
}

async fn get_bundesliga_table(
    State(state): State<AppState>,
) -> Json<CompetitionStandings<BundesligaRow>> {
    let standings = state.bundesliga_table().await;
    Json(CompetitionStandings {
        competition: "1. Bundesliga",
        standings: (*standings).clone(),
    })
}

async fn get_champions_league_table(
    State(state): State<AppState>,
) -> Json<CompetitionStandings<ChampionsLeagueRow>> {
    let standings = state.champions_league_table().await;
    Json(CompetitionStandings {
        competition: "Champions League",
        standings: (*standings).clone(),
    })
}

#[derive(Serialize)]
struct AllOut {
    generated_at: String,
    bundesliga: Vec<MatchOut>,
    champions_league: Vec<MatchOut>,
    dfb_pokal: Vec<MatchOut>,
    germany: Vec<MatchOut>,
    tables: TablesOut,
}

#[derive(Serialize)]
struct TablesOut {
    bundesliga: Vec<BundesligaRow>,
    champions_league: Vec<ChampionsLeagueRow>,
    dfb_pokal_teams: Vec<String>,
}

async fn get_all(State(state): State<AppState>) -> Result<Json<AllOut>, ApiError> {
    let bundesliga = state.bundesliga().await?;
    let champions_league = state.champions_league().await?;
    let pokal = state.dfb_pokal().await?;
    let germany = state.germany().await;
    let bundesliga_table = state.bundesliga_table().await;
    let champions_league_table = state.champions_league_table().await;

    Ok(Json(AllOut {
        generated_at: state.clock.now_berlin().to_rfc3339(),
        bundesliga: (*bundesliga).clone(),
        champions_league: (*champions_league).clone(),
        dfb_pokal: feeds::cup_matches(&pokal),
        germany: (*germany).clone(),
        tables: TablesOut {
            bundesliga: (*bundesliga_table).clone(),
            champions_league: (*champions_league_table).clone(),
            dfb_pokal_teams: reconcile::remaining_teams(&pokal),
        },
    }))
}
