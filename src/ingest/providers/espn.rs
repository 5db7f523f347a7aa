// src/ingest/providers/espn.rs
//
// ESPN adapter: event/competition-shaped scoreboard payloads
// (events → competitions → competitors) plus the league calendar used for
// placeholder rounds and the Champions League standings feed.

use metrics::counter;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::FeedError;
use crate::ingest::types::{CupCalendar, Provider, RoundEntry, SourceEvent};
use crate::timeutil::to_berlin;

// --- ESPN JSON shapes ---

#[derive(Debug, Clone, Deserialize)]
pub struct Scoreboard {
    #[serde(default)]
    pub events: Vec<EspnEvent>,
    #[serde(default)]
    pub leagues: Vec<EspnLeague>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub competitions: Vec<EspnCompetition>,
    #[serde(default)]
    pub season: Option<EspnEventSeason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnEventSeason {
    #[serde(rename = "type", default)]
    pub season_type: Option<EspnSeasonType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EspnSeasonType {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnCompetition {
    #[serde(default)]
    pub competitors: Vec<EspnCompetitor>,
    #[serde(default)]
    pub status: Option<EspnStatus>,
    #[serde(default)]
    pub venue: Option<EspnVenue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnCompetitor {
    #[serde(rename = "homeAway", default)]
    pub home_away: Option<String>,
    #[serde(default)]
    pub team: Option<EspnTeamRef>,
    #[serde(default)]
    pub score: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnTeamRef {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EspnStatus {
    #[serde(rename = "type", default)]
    pub status_type: EspnStatusType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EspnStatusType {
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "shortDetail", default)]
    pub short_detail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnVenue {
    #[serde(rename = "fullName", default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnLeague {
    #[serde(default)]
    pub calendar: Vec<EspnCalendarBlock>,
    #[serde(default)]
    pub season: Option<EspnLeagueSeason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EspnCalendarBlock {
    #[serde(default)]
    pub entries: Vec<EspnCalendarEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnCalendarEntry {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnLeagueSeason {
    #[serde(rename = "type", default)]
    pub season_type: Option<EspnSeasonType>,
}

// Standings (site.api.espn.com /standings) --------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStandings {
    #[serde(default)]
    pub children: Vec<EspnStandingsChild>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStandingsChild {
    #[serde(default)]
    pub standings: Option<EspnStandingsBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EspnStandingsBlock {
    #[serde(default)]
    pub entries: Vec<EspnStandingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStandingEntry {
    #[serde(default)]
    pub team: Option<EspnStandingTeam>,
    #[serde(default)]
    pub stats: Vec<EspnStat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStandingTeam {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub logos: Vec<EspnLogo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnLogo {
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(rename = "displayValue", default)]
    pub display_value: Option<String>,
}

impl EspnStat {
    /// ESPN reports stats both as typed values and display strings; prefer
    /// the display string like the dashboard always has.
    pub fn as_string(&self) -> String {
        if let Some(dv) = &self.display_value {
            return dv.clone();
        }
        match &self.value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => String::new(),
        }
    }
}

// --- Normalization ---

/// Maps one scoreboard event into a `SourceEvent`.
///
/// Home/away come from the `homeAway` tag, falling back to positional
/// `competitors[0]`/`[1]` when the tag is absent. The fallback carries a
/// known inversion risk and is kept bit-for-bit to match the observed feed.
pub fn normalize_event(event: &EspnEvent) -> Option<SourceEvent> {
    if event.date.is_empty() {
        return None;
    }
    let kickoff = match to_berlin(&event.date) {
        Ok(dt) => dt,
        Err(e) => {
            warn!(error = %e, event_id = %event.id, "dropping ESPN event with bad date");
            counter!("ingest_parse_errors_total", "provider" => "espn").increment(1);
            return None;
        }
    };

    let competition = event.competitions.first()?;
    if competition.competitors.len() < 2 {
        return None;
    }

    let home = competition
        .competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("home"))
        .unwrap_or(&competition.competitors[0]);
    let away = competition
        .competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("away"))
        .unwrap_or(&competition.competitors[1]);

    let team_name =
        |c: &EspnCompetitor| c.team.as_ref().map(|t| t.display_name.clone()).unwrap_or_default();

    let status_type = competition
        .status
        .as_ref()
        .map(|s| s.status_type.clone())
        .unwrap_or_default();
    let finished = status_type.completed;

    let score = match (finished, home.score.as_deref(), away.score.as_deref()) {
        (true, Some(h), Some(a)) if !h.is_empty() && !a.is_empty() => Some(format!("{h}:{a}")),
        _ => None,
    };

    Some(SourceEvent {
        provider: Provider::Espn,
        native_id: Some(event.id.clone()),
        kickoff,
        home_team: team_name(home),
        away_team: team_name(away),
        venue: competition
            .venue
            .as_ref()
            .map(|v| v.full_name.clone())
            .unwrap_or_default(),
        round_label: event
            .season
            .as_ref()
            .and_then(|s| s.season_type.as_ref())
            .and_then(|t| t.name.clone())
            .unwrap_or_default(),
        matchday: None,
        finished,
        score,
        status: Some(
            status_type
                .short_detail
                .unwrap_or_else(|| "Scheduled".to_string()),
        ),
    })
}

pub fn normalize_events(scoreboard: &Scoreboard) -> Vec<SourceEvent> {
    let events: Vec<SourceEvent> = scoreboard.events.iter().filter_map(normalize_event).collect();
    counter!("ingest_events_total", "provider" => "espn").increment(events.len() as u64);
    events
}

/// Extracts the round calendar and the currently active round ordinal from
/// the scoreboard's league metadata. Missing metadata yields an empty
/// calendar, which disables placeholder synthesis downstream.
pub fn cup_calendar(scoreboard: &Scoreboard) -> CupCalendar {
    let Some(league) = scoreboard.leagues.first() else {
        return CupCalendar::default();
    };

    let current_round = league
        .season
        .as_ref()
        .and_then(|s| s.season_type.as_ref())
        .and_then(|t| t.id.as_deref())
        .and_then(|id| id.parse().ok())
        .unwrap_or(0);

    let rounds = league
        .calendar
        .first()
        .map(|block| {
            block
                .entries
                .iter()
                .filter_map(|e| {
                    Some(RoundEntry {
                        label: e.label.clone(),
                        detail: e.detail.clone(),
                        ordinal: e.value.parse().ok()?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    CupCalendar {
        current_round,
        rounds,
    }
}

// --- Client ---

pub struct EspnClient {
    http: reqwest::Client,
    scoreboard_base: String,
    standings_base: String,
}

impl EspnClient {
    pub fn new(
        http: reqwest::Client,
        scoreboard_base: impl Into<String>,
        standings_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            scoreboard_base: scoreboard_base.into(),
            standings_base: standings_base.into(),
        }
    }

    pub async fn scoreboard(&self, league: &str) -> Result<Scoreboard, FeedError> {
        let url = format!("{}/{}/scoreboard", self.scoreboard_base, league);
        info!(%url, "fetching ESPN scoreboard");
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Fetch + normalize in one step; malformed events are dropped.
    pub async fn fixtures(&self, league: &str) -> Result<Vec<SourceEvent>, FeedError> {
        let scoreboard = self.scoreboard(league).await?;
        Ok(normalize_events(&scoreboard))
    }

    pub async fn standings(&self, league: &str, season: i32) -> Result<EspnStandings, FeedError> {
        let url = format!(
            "{}/{}/standings?season={}",
            self.standings_base, league, season
        );
        info!(%url, "fetching ESPN standings");
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}
