// Identity reconciliation: maps contest-provided team identifiers and
// free-text player names onto league abbreviations and roster entries.
//
// A curated override table is always consulted first. After that, team
// names are compared accent-folded, and players are matched on normalized
// name, then on jersey number plus last name, then on jersey number plus a
// fuzzy name score. Failures are non-fatal and return `None` so the caller
// can log and drop the candidate.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DataPaths;
use crate::names::{normalize_name, normalized_last_name, parse_jersey};
use crate::player::{LeagueTeam, RosterEntry};

/// Minimum skim score for a fuzzy name match among jersey-number matches.
const FUZZY_MIN_SCORE: i64 = 60;

// ---------------------------------------------------------------------------
// Override tables
// ---------------------------------------------------------------------------

/// A string-to-string correction table.
pub type OverrideTable = HashMap<String, String>;

/// The two manually maintained correction tables.
#[derive(Debug, Clone, Default)]
pub struct OverrideTables {
    /// Contest team display name -> league team full name.
    pub team_names: OverrideTable,
    /// Player full name -> jersey number.
    pub jersey_numbers: OverrideTable,
}

impl OverrideTables {
    /// Load both tables. A missing or unreadable table becomes empty.
    pub fn load(paths: &DataPaths) -> Self {
        OverrideTables {
            team_names: load_override_table(Path::new(&paths.team_name_fixes)),
            jersey_numbers: load_override_table(Path::new(&paths.jersey_number_fixes)),
        }
    }
}

/// Read a JSON object of string (or numeric) values. Never fails.
pub fn load_override_table(path: &Path) -> OverrideTable {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("override table {} unavailable ({e}); using empty table", path.display());
            return OverrideTable::new();
        }
    };
    match parse_override_table(&text) {
        Some(table) => {
            debug!("loaded {} overrides from {}", table.len(), path.display());
            table
        }
        None => {
            warn!("override table {} is not a JSON object; using empty table", path.display());
            OverrideTable::new()
        }
    }
}

/// Parse the JSON text of an override table. Non-scalar values are skipped.
pub fn parse_override_table(text: &str) -> Option<OverrideTable> {
    let Value::Object(map) = serde_json::from_str::<Value>(text).ok()? else {
        return None;
    };
    let mut table = OverrideTable::new();
    for (key, value) in map {
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => {
                warn!("ignoring override for '{key}': unsupported value {other}");
                continue;
            }
        };
        table.insert(key, value);
    }
    Some(table)
}

/// Exact key lookup, then a lookup on the normalized key.
fn lookup_override<'a>(table: &'a OverrideTable, key: &str) -> Option<&'a str> {
    if let Some(v) = table.get(key) {
        return Some(v.as_str());
    }
    let wanted = normalize_name(key);
    table
        .iter()
        .find(|(k, _)| normalize_name(k) == wanted)
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Contest team ids and names alongside the league's team list.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    contest_names: HashMap<String, String>,
    league_teams: Vec<LeagueTeam>,
}

impl TeamDirectory {
    pub fn new(contest_names: HashMap<String, String>, league_teams: Vec<LeagueTeam>) -> Self {
        TeamDirectory {
            contest_names,
            league_teams,
        }
    }

    /// Resolve a contest team identifier to a league abbreviation.
    ///
    /// The contest's display name is corrected through `team_fixes` when an
    /// entry exists, then compared accent-folded against league full names
    /// and abbreviations. An identifier that already is a league
    /// abbreviation resolves to itself.
    pub fn resolve_team_abbrev(&self, contest_team_id: &str, team_fixes: &OverrideTable) -> Option<String> {
        if let Some(name) = self.contest_names.get(contest_team_id) {
            let corrected = lookup_override(team_fixes, name).unwrap_or(name);
            if let Some(abbrev) = self.find_league_team(corrected) {
                return Some(abbrev);
            }
            warn!(contest_team_id, name = %name, "no league team matches contest team name");
        }
        self.find_league_team(contest_team_id)
    }

    fn find_league_team(&self, name_or_abbrev: &str) -> Option<String> {
        let wanted = normalize_name(name_or_abbrev);
        if wanted.is_empty() {
            return None;
        }
        self.league_teams
            .iter()
            .find(|t| normalize_name(&t.full_name) == wanted || normalize_name(&t.abbrev) == wanted)
            .map(|t| t.abbrev.clone())
    }
}

// ---------------------------------------------------------------------------
// Jersey numbers
// ---------------------------------------------------------------------------

/// Work out the jersey number to match a contest candidate on.
///
/// Order: the jersey override table, then the number the contest supplied,
/// then the roster entry whose normalized name equals the candidate's.
pub fn resolve_jersey_number(
    candidate_name: &str,
    contest_number: Option<u32>,
    roster: &[RosterEntry],
    jersey_fixes: &OverrideTable,
) -> Option<u32> {
    if let Some(fixed) = lookup_override(jersey_fixes, candidate_name) {
        match parse_jersey(fixed) {
            Some(n) => return Some(n),
            None => warn!("jersey override for '{candidate_name}' is not a number: '{fixed}'"),
        }
    }
    if contest_number.is_some() {
        return contest_number;
    }
    let wanted = normalize_name(candidate_name);
    roster
        .iter()
        .find(|e| normalize_name(&e.full_name) == wanted)
        .and_then(|e| e.jersey_number)
}

// ---------------------------------------------------------------------------
// Roster matching
// ---------------------------------------------------------------------------

/// How a roster entry was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    ExactName,
    NameAndJersey,
    LastNameAndJersey,
    FuzzyNameAndJersey,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchMethod::ExactName => "exact name",
            MatchMethod::NameAndJersey => "name + jersey",
            MatchMethod::LastNameAndJersey => "last name + jersey",
            MatchMethod::FuzzyNameAndJersey => "fuzzy name + jersey",
        };
        f.write_str(s)
    }
}

/// A successful roster match.
#[derive(Debug, Clone, Copy)]
pub struct RosterMatch<'a> {
    pub entry: &'a RosterEntry,
    pub method: MatchMethod,
}

/// Find the roster entry for a contest candidate.
pub fn match_roster_entry<'a>(
    full_name: &str,
    jersey_number: Option<u32>,
    roster: &'a [RosterEntry],
) -> Option<RosterMatch<'a>> {
    let wanted = normalize_name(full_name);
    if wanted.is_empty() {
        return None;
    }

    let by_name: Vec<&RosterEntry> = roster
        .iter()
        .filter(|e| normalize_name(&e.full_name) == wanted)
        .collect();
    match by_name.as_slice() {
        [only] => {
            return Some(RosterMatch {
                entry: *only,
                method: MatchMethod::ExactName,
            })
        }
        [] => {}
        several => {
            // Two players sharing a name on one roster: the jersey decides.
            return jersey_number
                .and_then(|n| several.iter().find(|e| e.jersey_number == Some(n)))
                .map(|entry| RosterMatch {
                    entry: *entry,
                    method: MatchMethod::NameAndJersey,
                });
        }
    }

    let number = jersey_number?;
    let same_number: Vec<&RosterEntry> = roster
        .iter()
        .filter(|e| e.jersey_number == Some(number))
        .collect();

    let last = normalized_last_name(full_name);
    if let Some(entry) = same_number
        .iter()
        .find(|e| normalized_last_name(&e.full_name) == last)
    {
        return Some(RosterMatch {
            entry: *entry,
            method: MatchMethod::LastNameAndJersey,
        });
    }

    let matcher = SkimMatcherV2::default();
    same_number
        .into_iter()
        .filter_map(|e| {
            let candidate = normalize_name(&e.full_name);
            let score = matcher
                .fuzzy_match(&candidate, &wanted)
                .max(matcher.fuzzy_match(&wanted, &candidate))?;
            (score >= FUZZY_MIN_SCORE).then_some((e, score))
        })
        .max_by_key(|(_, score)| *score)
        .map(|(entry, _)| RosterMatch {
            entry,
            method: MatchMethod::FuzzyNameAndJersey,
        })
}
