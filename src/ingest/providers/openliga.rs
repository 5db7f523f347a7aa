// src/ingest/providers/openliga.rs
//
// OpenLigaDB adapter: structured fixture data with typed sub-objects
// (`team1`/`team2`/`group`/`location`/`matchResults`). Also serves the
// Bundesliga standings table (`getbltable`).

use metrics::counter;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::FeedError;
use crate::ingest::types::{Provider, SourceEvent};
use crate::timeutil::to_berlin;

/// Team-name sentinel when the source omits a name. Never empty, never null.
pub const TEAM_UNKNOWN: &str = "Unbekannt";

// --- OpenLigaDB JSON shapes ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLigaMatch {
    #[serde(default)]
    pub match_date_time: Option<String>,
    #[serde(default)]
    pub team1: Option<OpenLigaTeam>,
    #[serde(default)]
    pub team2: Option<OpenLigaTeam>,
    #[serde(default)]
    pub group: Option<OpenLigaGroup>,
    #[serde(default)]
    pub location: Option<OpenLigaLocation>,
    #[serde(default)]
    pub match_is_finished: bool,
    #[serde(default)]
    pub match_results: Vec<OpenLigaResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLigaTeam {
    #[serde(default)]
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLigaGroup {
    #[serde(rename = "groupName", default)]
    pub group_name: Option<String>,
    #[serde(rename = "groupOrderID", default)]
    pub group_order_id: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLigaLocation {
    #[serde(default)]
    pub location_city: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLigaResult {
    #[serde(default)]
    pub points_team1: Option<i32>,
    #[serde(default)]
    pub points_team2: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLigaTableEntry {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub team_icon_url: Option<String>,
    #[serde(default)]
    pub matches: u32,
    #[serde(default)]
    pub won: u32,
    #[serde(default)]
    pub draw: u32,
    #[serde(default)]
    pub lost: u32,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub opponent_goals: u32,
    #[serde(default)]
    pub goal_diff: i32,
    #[serde(default)]
    pub points: u32,
}

// --- Normalization ---

/// Maps one raw match into a `SourceEvent`. Returns `None` (and logs) for
/// malformed entries; a bad event never aborts the batch.
pub fn normalize_match(raw: &OpenLigaMatch) -> Option<SourceEvent> {
    let raw_ts = raw.match_date_time.as_deref()?;
    let kickoff = match to_berlin(raw_ts) {
        Ok(dt) => dt,
        Err(e) => {
            warn!(error = %e, "dropping OpenLigaDB match with bad kickoff");
            counter!("ingest_parse_errors_total", "provider" => "openliga").increment(1);
            return None;
        }
    };

    let team_name = |team: &Option<OpenLigaTeam>| {
        team.as_ref()
            .and_then(|t| t.team_name.clone())
            .unwrap_or_else(|| TEAM_UNKNOWN.to_string())
    };

    let finished = raw.match_is_finished;
    let score = if finished {
        final_score(&raw.match_results)
    } else {
        None
    };

    Some(SourceEvent {
        provider: Provider::OpenLiga,
        native_id: None,
        kickoff,
        home_team: team_name(&raw.team1),
        away_team: team_name(&raw.team2),
        venue: raw
            .location
            .as_ref()
            .and_then(|l| l.location_city.clone())
            .unwrap_or_default(),
        round_label: raw
            .group
            .as_ref()
            .and_then(|g| g.group_name.clone())
            .unwrap_or_default(),
        matchday: raw.group.as_ref().and_then(|g| g.group_order_id),
        finished,
        score,
        status: None,
    })
}

/// The results list is append-only with in-progress updates; the last entry
/// is the final score.
fn final_score(results: &[OpenLigaResult]) -> Option<String> {
    let last = results.last()?;
    match (last.points_team1, last.points_team2) {
        (Some(home), Some(away)) => Some(format!("{home}:{away}")),
        _ => None,
    }
}

// --- Client ---

pub struct OpenLigaClient {
    http: reqwest::Client,
    base: String,
}

impl OpenLigaClient {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }

    pub async fn match_data(
        &self,
        league: &str,
        season: i32,
    ) -> Result<Vec<OpenLigaMatch>, FeedError> {
        let url = format!("{}/getmatchdata/{}/{}", self.base, league, season);
        info!(%url, "fetching OpenLigaDB matches");
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Fetch + normalize in one step; malformed events are dropped.
    pub async fn fixtures(&self, league: &str, season: i32) -> Result<Vec<SourceEvent>, FeedError> {
        let raw = self.match_data(league, season).await?;
        let events: Vec<SourceEvent> = raw.iter().filter_map(normalize_match).collect();
        counter!("ingest_events_total", "provider" => "openliga").increment(events.len() as u64);
        Ok(events)
    }

    pub async fn league_table(
        &self,
        league: &str,
        season: i32,
    ) -> Result<Vec<OpenLigaTableEntry>, FeedError> {
        let url = format!("{}/getbltable/{}/{}", self.base, league, season);
        info!(%url, "fetching OpenLigaDB table");
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(json: &str) -> OpenLigaMatch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn normalizes_a_full_match() {
        let m = sample_match(
            r#"{
                "matchDateTime": "2025-08-15T20:45:00",
                "team1": {"teamName": "FC Bayern München"},
                "team2": {"teamName": "VfB Stuttgart"},
                "group": {"groupName": "1. Runde", "groupOrderID": 1},
                "location": {"locationCity": "Wiesbaden"},
                "matchIsFinished": true,
                "matchResults": [
                    {"pointsTeam1": 1, "pointsTeam2": 0},
                    {"pointsTeam1": 3, "pointsTeam2": 2}
                ]
            }"#,
        );
        let ev = normalize_match(&m).unwrap();
        assert_eq!(ev.home_team, "FC Bayern München");
        assert_eq!(ev.away_team, "VfB Stuttgart");
        assert_eq!(ev.venue, "Wiesbaden");
        assert_eq!(ev.round_label, "1. Runde");
        assert_eq!(ev.matchday, Some(1));
        assert!(ev.finished);
        // Last results entry wins, not the half-time one.
        assert_eq!(ev.score.as_deref(), Some("3:2"));
    }

    #[test]
    fn missing_team_names_become_unbekannt() {
        let m = sample_match(r#"{"matchDateTime": "2025-08-15T20:45:00", "team1": {}}"#);
        let ev = normalize_match(&m).unwrap();
        assert_eq!(ev.home_team, TEAM_UNKNOWN);
        assert_eq!(ev.away_team, TEAM_UNKNOWN);
    }

    #[test]
    fn unfinished_matches_never_carry_a_score() {
        let m = sample_match(
            r#"{
                "matchDateTime": "2025-08-15T20:45:00",
                "matchIsFinished": false,
                "matchResults": [{"pointsTeam1": 1, "pointsTeam2": 0}]
            }"#,
        );
        let ev = normalize_match(&m).unwrap();
        assert_eq!(ev.score, None);
    }

    #[test]
    fn incomplete_result_entries_yield_no_score() {
        let m = sample_match(
            r#"{
                "matchDateTime": "2025-08-15T20:45:00",
                "matchIsFinished": true,
                "matchResults": [{"pointsTeam1": 2}]
            }"#,
        );
        let ev = normalize_match(&m).unwrap();
        assert!(ev.finished);
        assert_eq!(ev.score, None);
    }

    #[test]
    fn events_without_kickoff_are_dropped() {
        let missing = sample_match(r#"{"team1": {"teamName": "A"}}"#);
        let garbage = sample_match(r#"{"matchDateTime": "soon"}"#);
        assert!(normalize_match(&missing).is_none());
        assert!(normalize_match(&garbage).is_none());
    }

    #[test]
    fn table_entry_parses() {
        let entry: OpenLigaTableEntry = serde_json::from_str(
            r#"{
                "teamName": "FC Bayern München",
                "shortName": "Bayern",
                "teamIconUrl": "https://example.org/fcb.png",
                "matches": 34, "won": 25, "draw": 7, "lost": 2,
                "goals": 94, "opponentGoals": 32, "goalDiff": 62, "points": 82
            }"#,
        )
        .unwrap();
        assert_eq!(entry.short_name.as_deref(), Some("Bayern"));
        assert_eq!(entry.goal_diff, 62);
    }
}
