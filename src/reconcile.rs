// src/reconcile.rs
//! # Reconciliation engine
//! Pure, testable logic that merges the two cup fixture streams, synthesizes
//! placeholders for undrawn rounds, and orders the result. No I/O.
//!
//! Policy notes:
//! - The primary (OpenLigaDB) stream is ingested unfiltered, past and future.
//! - The secondary (ESPN) stream is self-deduplicated by
//!   `(local kickoff date, native event id)`. It is never matched against the
//!   primary stream: the two ID spaces are disjoint, so the same physical
//!   match can appear once per provider. Consumers tolerate that; attempting
//!   semantic cross-provider identity would change observable behavior.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use metrics::counter;

use crate::ingest::types::{CupCalendar, RoundEntry, SourceEvent};
use crate::timeutil::start_of_day;

/// Team sentinel for rounds whose draw has not happened yet.
pub const TEAM_NOT_DRAWN: &str = "Noch nicht ausgelost";

/// Canonical merged fixture. Either a real fixture (concrete teams) or a
/// placeholder (sentinel teams, no score, no venue).
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub kickoff: DateTime<Tz>,
    pub home_team: String,
    pub away_team: String,
    pub venue: String,
    pub round_label: String,
    pub finished: bool,
    /// `"home:away"`, present only when `finished` is true.
    pub score: Option<String>,
    pub status: String,
    pub is_placeholder: bool,
    /// Round ordinal; orders placeholders among each other. Real fixtures
    /// carry none.
    pub sort_order: Option<u32>,
    /// Provider free-text date detail for placeholders ("Feb 3-4", "TBD").
    pub date_detail: Option<String>,
}

impl Fixture {
    fn from_event(ev: &SourceEvent) -> Self {
        let status = ev.status.clone().unwrap_or_else(|| {
            if ev.finished { "Final" } else { "Scheduled" }.to_string()
        });
        Self {
            kickoff: ev.kickoff,
            home_team: ev.home_team.clone(),
            away_team: ev.away_team.clone(),
            venue: ev.venue.clone(),
            round_label: ev.round_label.clone(),
            finished: ev.finished,
            score: ev.score.clone(),
            status,
            is_placeholder: false,
            sort_order: None,
            date_detail: None,
        }
    }
}

/// Engine output: the externally visible `upcoming` list (unfinished only)
/// plus the finished fixtures, retained for the remaining-teams heuristic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub upcoming: Vec<Fixture>,
    pub finished: Vec<Fixture>,
}

/// Merges the two normalized streams for one competition window.
pub fn reconcile(
    now: DateTime<Tz>,
    primary: &[SourceEvent],
    secondary: &[SourceEvent],
    calendar: &CupCalendar,
) -> Reconciled {
    let mut all: Vec<Fixture> = Vec::with_capacity(primary.len() + secondary.len());

    // 1. Primary goes in unfiltered.
    all.extend(primary.iter().map(Fixture::from_event));

    // 2. Secondary with self-dedup.
    let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();
    for ev in secondary {
        let key = (
            ev.kickoff.date_naive(),
            ev.native_id.clone().unwrap_or_default(),
        );
        if !seen.insert(key) {
            counter!("reconcile_dedup_total").increment(1);
            continue;
        }
        all.push(Fixture::from_event(ev));
    }

    // 3./4. Placeholders only when every known fixture is already finished:
    // an unfinished real fixture means the draw has produced concrete
    // matchups and nothing needs synthesizing.
    let any_unfinished = all.iter().any(|f| !f.finished);
    if !any_unfinished && !all.is_empty() {
        for round in &calendar.rounds {
            if round.ordinal < calendar.current_round {
                continue;
            }
            all.push(placeholder(now, round));
            counter!("reconcile_placeholders_total").increment(1);
        }
    }

    // 5. Composite ordering.
    sort_fixtures(&mut all);

    // 6. Only unfinished entries are externally visible.
    let (finished, upcoming): (Vec<_>, Vec<_>) = all.into_iter().partition(|f| f.finished);
    Reconciled { upcoming, finished }
}

/// Composite ordering: unfinished before finished, then placeholder round
/// ordinal (real fixtures rank as 0), then kickoff. The sort is stable, so
/// equal keys keep ingest order and repeated runs agree.
pub fn sort_fixtures(fixtures: &mut [Fixture]) {
    fixtures.sort_by(|a, b| {
        a.finished
            .cmp(&b.finished)
            .then_with(|| placeholder_rank(a).cmp(&placeholder_rank(b)))
            .then_with(|| a.kickoff.cmp(&b.kickoff))
    });
}

fn placeholder_rank(f: &Fixture) -> u32 {
    if f.is_placeholder {
        f.sort_order.unwrap_or(u32::MAX)
    } else {
        0
    }
}

fn placeholder(now: DateTime<Tz>, round: &RoundEntry) -> Fixture {
    Fixture {
        kickoff: start_of_day(now),
        home_team: TEAM_NOT_DRAWN.to_string(),
        away_team: TEAM_NOT_DRAWN.to_string(),
        venue: String::new(),
        round_label: translate_round(&round.label),
        finished: false,
        score: None,
        status: format!("📅 Termin: {}", round.detail),
        is_placeholder: true,
        sort_order: Some(round.ordinal),
        date_detail: Some(round.detail.clone()),
    }
}

/// German labels for the ESPN round vocabulary; unknown labels pass through.
pub fn translate_round(label: &str) -> String {
    match label {
        "Rd of 16" | "Round of 16" => "Achtelfinale".to_string(),
        "Quarterfinals" => "Viertelfinale".to_string(),
        "Semifinals" => "Halbfinale".to_string(),
        "Final" => "Finale".to_string(),
        other => other.to_string(),
    }
}

/// Teams still in the cup: everyone named in a real upcoming fixture, or —
/// when no future fixtures remain — the winners of the last completed round.
pub fn remaining_teams(rec: &Reconciled) -> Vec<String> {
    let mut teams: BTreeSet<String> = BTreeSet::new();

    for f in rec.upcoming.iter().filter(|f| !f.is_placeholder) {
        for name in [&f.home_team, &f.away_team] {
            if !name.is_empty() {
                teams.insert(name.clone());
            }
        }
    }

    if teams.is_empty() {
        if let Some(last) = rec.finished.iter().max_by_key(|f| round_rank(&f.round_label)) {
            let last_label = last.round_label.clone();
            for f in rec.finished.iter().filter(|f| f.round_label == last_label) {
                if let Some(winner) = winner(f) {
                    teams.insert(winner);
                }
            }
        }
    }

    teams.into_iter().collect()
}

/// Label of the next round the feed knows about, for the teams endpoint.
pub fn next_round_label(rec: &Reconciled) -> String {
    rec.upcoming
        .first()
        .map(|f| f.round_label.clone())
        .unwrap_or_default()
}

fn round_rank(label: &str) -> u32 {
    match label {
        "1. Runde" => 1,
        "2. Runde" => 2,
        "Achtelfinale" => 3,
        "Viertelfinale" => 4,
        "Halbfinale" => 5,
        "Finale" => 6,
        _ => 0,
    }
}

fn winner(f: &Fixture) -> Option<String> {
    let (home, away) = f.score.as_deref()?.split_once(':')?;
    let home: i32 = home.trim().parse().ok()?;
    let away: i32 = away.trim().parse().ok()?;
    match home.cmp(&away) {
        Ordering::Greater => Some(f.home_team.clone()),
        Ordering::Less => Some(f.away_team.clone()),
        Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_translation_covers_the_known_vocabulary() {
        assert_eq!(translate_round("Rd of 16"), "Achtelfinale");
        assert_eq!(translate_round("Round of 16"), "Achtelfinale");
        assert_eq!(translate_round("Quarterfinals"), "Viertelfinale");
        assert_eq!(translate_round("Semifinals"), "Halbfinale");
        assert_eq!(translate_round("Final"), "Finale");
        assert_eq!(translate_round("Matchday 3"), "Matchday 3");
    }

    fn finished_fixture(round: &str, home: &str, away: &str, score: &str) -> Fixture {
        Fixture {
            kickoff: crate::timeutil::to_berlin("2025-10-29T20:45:00Z").unwrap(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            venue: String::new(),
            round_label: round.to_string(),
            finished: true,
            score: Some(score.to_string()),
            status: "Final".to_string(),
            is_placeholder: false,
            sort_order: None,
            date_detail: None,
        }
    }

    #[test]
    fn winner_handles_draws_and_bad_scores() {
        let mut f = finished_fixture("Finale", "A", "B", "2:1");
        assert_eq!(winner(&f).as_deref(), Some("A"));
        f.score = Some("1:3".into());
        assert_eq!(winner(&f).as_deref(), Some("B"));
        f.score = Some("2:2".into());
        assert_eq!(winner(&f), None);
        f.score = Some("n/a".into());
        assert_eq!(winner(&f), None);
        f.score = None;
        assert_eq!(winner(&f), None);
    }

    #[test]
    fn teams_fall_back_to_last_round_winners() {
        let rec = Reconciled {
            upcoming: Vec::new(),
            finished: vec![
                finished_fixture("1. Runde", "Early", "Out", "5:0"),
                finished_fixture("Achtelfinale", "Bayern", "Köln", "2:1"),
                finished_fixture("Achtelfinale", "Leipzig", "HSV", "0:1"),
                finished_fixture("Achtelfinale", "Bochum", "Mainz", "1:1"),
            ],
        };
        // Only winners of the highest-ranked completed round; draws skipped.
        assert_eq!(remaining_teams(&rec), vec!["Bayern", "HSV"]);
    }
}
