// src/feeds.rs
// Per-competition fetch/normalize/format pipelines and the JSON records the
// dashboard front end consumes. Field names here are frozen — the front end
// depends on them.

use chrono::DateTime;
use chrono_tz::Tz;
use metrics::counter;
use serde::Serialize;
use tracing::warn;

use crate::error::FeedError;
use crate::ingest::providers::espn::{self, EspnClient};
use crate::ingest::providers::openliga::OpenLigaClient;
use crate::ingest::types::SourceEvent;
use crate::reconcile::{self, Fixture, Reconciled};
use crate::timeutil::{season_year, weekday_german};

pub const BUNDESLIGA: &str = "bl1";
pub const DFB_POKAL: &str = "dfb";
pub const CHAMPIONS_LEAGUE: &str = "uefa.champions";
pub const DFB_POKAL_ESPN: &str = "ger.dfb_pokal";
/// OpenLigaDB keeps the national team under a per-cycle league key.
pub const GERMANY_LEAGUE: &str = "DFBNAT2526";
pub const GERMANY_SEASON: i32 = 2025;

const MAX_LEAGUE_MATCHES: usize = 20;

// --- Output records ---

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchOut {
    pub date: String,
    pub date_readable: String,
    pub time: String,
    pub weekday: String,
    pub team_home: String,
    pub team_away: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchday: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    pub finished: bool,
    /// Tri-state: the key is absent for feeds that never report a score,
    /// an explicit `null` for unfinished cup fixtures, `""` for the germany
    /// feed, otherwise `"home:away"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_placeholder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition: Option<String>,
}

impl MatchOut {
    fn base(kickoff: DateTime<Tz>, home: &str, away: &str, location: &str) -> Self {
        Self {
            date: kickoff.to_rfc3339(),
            date_readable: kickoff.format("%d.%m.%Y").to_string(),
            time: kickoff.format("%H:%M").to_string(),
            weekday: kickoff.format("%A").to_string(),
            team_home: home.to_string(),
            team_away: away.to_string(),
            location: location.to_string(),
            matchday: None,
            round: None,
            finished: false,
            score: None,
            status: None,
            is_placeholder: None,
            sort_order: None,
            competition: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BundesligaRow {
    pub position: u32,
    pub team: String,
    pub logo: String,
    pub matches: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub goals: String,
    pub goal_diff: i32,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChampionsLeagueRow {
    pub position: u32,
    pub team: String,
    pub logo: String,
    pub matches: String,
    pub wins: String,
    pub draws: String,
    pub losses: String,
    pub goal_diff: String,
    pub points: String,
}

// --- Fixture feeds ---

/// Next Bundesliga matchdays: future fixtures only, kickoff-sorted, capped.
pub async fn bundesliga(
    openliga: &OpenLigaClient,
    now: DateTime<Tz>,
) -> Result<Vec<MatchOut>, FeedError> {
    let mut events = openliga.fixtures(BUNDESLIGA, season_year(now)).await?;
    let today = now.date_naive();
    events.retain(|ev| ev.kickoff.date_naive() >= today);
    events.sort_by(|a, b| a.kickoff.cmp(&b.kickoff));
    events.truncate(MAX_LEAGUE_MATCHES);

    Ok(events
        .iter()
        .map(|ev| {
            let mut m = MatchOut::base(ev.kickoff, &ev.home_team, &ev.away_team, &ev.venue);
            m.matchday = Some(ev.matchday.unwrap_or(0));
            m.finished = ev.finished;
            m
        })
        .collect())
}

/// Next Champions League fixtures from the ESPN scoreboard.
pub async fn champions_league(
    espn: &EspnClient,
    now: DateTime<Tz>,
) -> Result<Vec<MatchOut>, FeedError> {
    let mut events = espn.fixtures(CHAMPIONS_LEAGUE).await?;
    let today = now.date_naive();
    events.retain(|ev| ev.kickoff.date_naive() >= today);
    events.sort_by(|a, b| a.kickoff.cmp(&b.kickoff));
    events.truncate(MAX_LEAGUE_MATCHES);

    Ok(events
        .iter()
        .map(|ev| {
            let mut m = MatchOut::base(ev.kickoff, &ev.home_team, &ev.away_team, &ev.venue);
            m.finished = ev.finished;
            m.status = ev.status.clone();
            m
        })
        .collect())
}

/// The hybrid DFB-Pokal pipeline: OpenLigaDB is best-effort (it lags behind
/// the draw), ESPN is required since it also supplies the round calendar.
/// Both providers down means nothing to reconcile — that is fatal.
pub async fn dfb_pokal(
    openliga: &OpenLigaClient,
    espn: &EspnClient,
    now: DateTime<Tz>,
) -> Result<Reconciled, FeedError> {
    let (primary, primary_failed): (Vec<SourceEvent>, bool) =
        match openliga.fixtures(DFB_POKAL, season_year(now)).await {
            Ok(events) => (events, false),
            Err(e) => {
                warn!(error = %e, "OpenLigaDB unavailable, continuing with ESPN only");
                counter!("ingest_provider_errors_total", "provider" => "openliga").increment(1);
                (Vec::new(), true)
            }
        };

    let scoreboard = match espn.scoreboard(DFB_POKAL_ESPN).await {
        Ok(sb) => sb,
        Err(e) => {
            counter!("ingest_provider_errors_total", "provider" => "espn").increment(1);
            if primary_failed {
                return Err(FeedError::Aggregation(format!(
                    "both fixture providers unavailable: {e}"
                )));
            }
            return Err(e);
        }
    };

    let secondary = espn::normalize_events(&scoreboard);
    let calendar = espn::cup_calendar(&scoreboard);
    Ok(reconcile::reconcile(now, &primary, &secondary, &calendar))
}

/// The externally visible cup fixture list.
pub fn cup_matches(rec: &Reconciled) -> Vec<MatchOut> {
    rec.upcoming.iter().map(cup_match).collect()
}

fn cup_match(f: &Fixture) -> MatchOut {
    let mut m = MatchOut::base(f.kickoff, &f.home_team, &f.away_team, &f.venue);
    m.round = Some(f.round_label.clone());
    m.finished = f.finished;
    m.status = Some(f.status.clone());
    if f.is_placeholder {
        // Undrawn round: the provider's free-text detail stands in for a date.
        m.date_readable = f.date_detail.clone().unwrap_or_else(|| "TBD".to_string());
        m.time = "TBD".to_string();
        m.weekday = String::new();
        m.is_placeholder = Some(true);
        m.sort_order = f.sort_order;
    } else {
        // Real fixtures always carry the key, as `null` until the final
        // whistle; placeholders never do.
        m.score = Some(f.score.clone());
    }
    m
}

/// National team feed (World Cup qualification). Best-effort: a dead
/// upstream degrades to an empty list, which the hourly cache memoizes just
/// like a successful fetch.
pub async fn germany(openliga: &OpenLigaClient) -> Vec<MatchOut> {
    let mut events = match openliga.fixtures(GERMANY_LEAGUE, GERMANY_SEASON).await {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "Germany feed unavailable");
            counter!("ingest_provider_errors_total", "provider" => "openliga").increment(1);
            return Vec::new();
        }
    };
    events.sort_by(|a, b| a.kickoff.cmp(&b.kickoff));

    events
        .iter()
        .map(|ev| {
            let mut m = MatchOut::base(ev.kickoff, &ev.home_team, &ev.away_team, &ev.venue);
            m.weekday = weekday_german(ev.kickoff).to_string();
            m.round = Some(if ev.round_label.is_empty() {
                "WM-Qualifikation".to_string()
            } else {
                ev.round_label.clone()
            });
            m.finished = ev.finished;
            m.score = Some(Some(ev.score.clone().unwrap_or_default()));
            m.status = Some(if ev.finished { "Beendet" } else { "Anstehend" }.to_string());
            m.competition = Some("germany".to_string());
            m
        })
        .collect()
}

// --- Standings feeds ---

/// Bundesliga table from OpenLigaDB. Best-effort.
pub async fn bundesliga_table(openliga: &OpenLigaClient, now: DateTime<Tz>) -> Vec<BundesligaRow> {
    let table = match openliga.league_table(BUNDESLIGA, season_year(now)).await {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "Bundesliga table unavailable");
            return Vec::new();
        }
    };

    table
        .iter()
        .enumerate()
        .map(|(i, entry)| BundesligaRow {
            position: (i + 1) as u32,
            team: entry
                .short_name
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| entry.team_name.clone())
                .unwrap_or_default(),
            logo: entry.team_icon_url.clone().unwrap_or_default(),
            matches: entry.matches,
            won: entry.won,
            draw: entry.draw,
            lost: entry.lost,
            goals: format!("{}:{}", entry.goals, entry.opponent_goals),
            goal_diff: entry.goal_diff,
            points: entry.points,
        })
        .collect()
}

/// Champions League league-phase standings from ESPN. Best-effort.
pub async fn champions_league_table(
    espn: &EspnClient,
    now: DateTime<Tz>,
) -> Vec<ChampionsLeagueRow> {
    let standings = match espn.standings(CHAMPIONS_LEAGUE, season_year(now)).await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Champions League standings unavailable");
            return Vec::new();
        }
    };

    let entries = standings
        .children
        .first()
        .and_then(|c| c.standings.as_ref())
        .map(|b| b.entries.as_slice())
        .unwrap_or_default();

    entries
        .iter()
        .take(18)
        .enumerate()
        .map(|(i, entry)| {
            let stat = |name: &str| {
                entry
                    .stats
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| s.as_string())
                    .unwrap_or_else(|| "0".to_string())
            };
            let team = entry.team.as_ref();
            ChampionsLeagueRow {
                position: (i + 1) as u32,
                team: team.map(|t| t.display_name.clone()).unwrap_or_default(),
                logo: team
                    .and_then(|t| t.logos.first())
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                matches: stat("gamesPlayed"),
                wins: stat("wins"),
                draws: stat("ties"),
                losses: stat("losses"),
                goal_diff: stat("pointDifferential"),
                points: stat("points"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Provider;
    use crate::timeutil::to_berlin;

    fn event(kickoff: &str) -> SourceEvent {
        SourceEvent {
            provider: Provider::OpenLiga,
            native_id: None,
            kickoff: to_berlin(kickoff).unwrap(),
            home_team: "Heim".into(),
            away_team: "Gast".into(),
            venue: "Berlin".into(),
            round_label: String::new(),
            matchday: Some(3),
            finished: false,
            score: None,
            status: None,
        }
    }

    #[test]
    fn match_out_formats_berlin_wall_clock() {
        let ev = event("2025-08-23T14:30:00Z");
        let m = MatchOut::base(ev.kickoff, &ev.home_team, &ev.away_team, &ev.venue);
        assert_eq!(m.date_readable, "23.08.2025");
        assert_eq!(m.time, "16:30"); // CEST
        assert_eq!(m.weekday, "Saturday");
        assert_eq!(m.location, "Berlin");
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let m = MatchOut::base(
            to_berlin("2025-08-23T14:30:00Z").unwrap(),
            "A",
            "B",
            "",
        );
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("is_placeholder").is_none());
        assert!(json.get("sort_order").is_none());
        assert!(json.get("score").is_none());
        assert_eq!(json["finished"], serde_json::json!(false));
    }

    #[test]
    fn placeholder_rows_use_the_detail_text() {
        let rec = Reconciled {
            upcoming: vec![Fixture {
                kickoff: to_berlin("2025-08-23T00:00:00Z").unwrap(),
                home_team: reconcile::TEAM_NOT_DRAWN.into(),
                away_team: reconcile::TEAM_NOT_DRAWN.into(),
                venue: String::new(),
                round_label: "Viertelfinale".into(),
                finished: false,
                score: None,
                status: "📅 Termin: Feb 3-4".into(),
                is_placeholder: true,
                sort_order: Some(4),
                date_detail: Some("Feb 3-4".into()),
            }],
            finished: Vec::new(),
        };
        let rows = cup_matches(&rec);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date_readable, "Feb 3-4");
        assert_eq!(rows[0].time, "TBD");
        assert_eq!(rows[0].weekday, "");
        assert_eq!(rows[0].is_placeholder, Some(true));
        assert_eq!(rows[0].sort_order, Some(4));
        assert_eq!(rows[0].round.as_deref(), Some("Viertelfinale"));
        // Placeholders never carry the score key.
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert!(json.get("score").is_none());
    }

    #[test]
    fn cup_scores_stay_an_explicit_null_until_the_final_whistle() {
        let mut fixture = Fixture {
            kickoff: to_berlin("2025-12-02T19:45:00Z").unwrap(),
            home_team: "Leipzig".into(),
            away_team: "HSV".into(),
            venue: "Leipzig".into(),
            round_label: "Achtelfinale".into(),
            finished: false,
            score: None,
            status: "Scheduled".into(),
            is_placeholder: false,
            sort_order: None,
            date_detail: None,
        };

        let json = serde_json::to_value(cup_match(&fixture)).unwrap();
        assert_eq!(json.get("score"), Some(&serde_json::Value::Null));

        fixture.finished = true;
        fixture.score = Some("2:1".into());
        let json = serde_json::to_value(cup_match(&fixture)).unwrap();
        assert_eq!(json["score"], "2:1");
    }
}
