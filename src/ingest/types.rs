// src/ingest/types.rs
use chrono::DateTime;
use chrono_tz::Tz;

/// Upstream provider tag. The two ID spaces are disjoint; no cross-provider
/// identity is ever attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenLiga,
    Espn,
}

/// One normalized fixture as reported by a single provider. Intermediate
/// representation only — the reconciliation engine turns these into the
/// canonical output records.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub provider: Provider,
    /// Provider-native event identifier, used by the dedup heuristic.
    pub native_id: Option<String>,
    pub kickoff: DateTime<Tz>,
    pub home_team: String,
    pub away_team: String,
    pub venue: String,
    pub round_label: String,
    pub matchday: Option<u32>,
    pub finished: bool,
    /// `"home:away"`, present only when the source reports a final result.
    pub score: Option<String>,
    /// Human-readable status text, where the provider supplies one.
    pub status: Option<String>,
}

/// One calendar round of a knockout competition, as reported by the
/// secondary provider's season metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundEntry {
    pub label: String,
    /// Free-text date detail; may itself be a date or a vague label.
    pub detail: String,
    pub ordinal: u32,
}

/// Round calendar plus the ordinal of the currently active round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CupCalendar {
    pub current_round: u32,
    pub rounds: Vec<RoundEntry>,
}
