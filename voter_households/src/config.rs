// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

/// A voter record, as returned by the backend.
///
/// The record is kept as a raw JSON value: the backend has shipped several
/// schema variants over time and the canonical fields are only resolved by
/// the normalizer.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterRecord(pub JSValue);

impl VoterRecord {
    pub fn new(value: JSValue) -> VoterRecord {
        VoterRecord(value)
    }

    pub fn value(&self) -> &JSValue {
        &self.0
    }
}

impl From<JSValue> for VoterRecord {
    fn from(value: JSValue) -> Self {
        VoterRecord(value)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// The canonical shape of a voter, after resolving all the legacy field names.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVoter {
    /// Position of the record in the list it was read from.
    pub index: usize,
    pub id: Option<String>,
    /// EPIC number
    pub voter_id: Option<String>,
    pub name: String,
    pub name_tamil: Option<String>,
    pub age: u32,
    pub gender: Gender,
    pub house_number: String,
    pub street: String,
    pub mobile: Option<String>,
    pub family_id: Option<String>,
    pub verified: bool,
    pub surveyed: bool,
}

impl NormalizedVoter {
    /// The key used to group voters that have no family id.
    /// Returns None for the degenerate keys.
    pub fn address_key(&self) -> Option<String> {
        let key = format!("{}-{}", self.house_number, self.street);
        let key = key.trim();
        if key.is_empty() || key == "-" {
            None
        } else {
            Some(key.to_string())
        }
    }

    /// A label for logs and reports: the EPIC number, else the backend id, else the position.
    pub fn label(&self) -> String {
        self.voter_id
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseholdKind {
    /// Grouped by an operator-assigned family id.
    Explicit,
    /// Inferred from the house number and the street.
    Address,
}

/// A group of voters living together.
///
/// Households only exist for the duration of a computation. They are rebuilt
/// every time the roster is loaded.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub id: String,
    pub kind: HouseholdKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_key: Option<String>,
    /// Sorted by age, oldest first. Ties keep the roster order.
    pub members: Vec<NormalizedVoter>,
}

impl Household {
    pub fn head_of_family(&self) -> Option<&NormalizedVoter> {
        self.members.first()
    }

    /// Indices of the members in the original roster, in member order.
    pub fn member_indices(&self) -> Vec<usize> {
        self.members.iter().map(|m| m.index).collect()
    }

    pub fn total_members(&self) -> usize {
        self.members.len()
    }

    pub fn verified_members(&self) -> usize {
        self.members.iter().filter(|m| m.verified).count()
    }

    pub fn surveyed_members(&self) -> usize {
        self.members.iter().filter(|m| m.surveyed).count()
    }

    /// Share of verified members, rounded to the nearest integer.
    pub fn verified_percentage(&self) -> u32 {
        let total = self.total_members();
        if total == 0 {
            return 0;
        }
        ((self.verified_members() as f64 * 100.0) / total as f64).round() as u32
    }

    pub fn is_fully_verified(&self) -> bool {
        self.verified_members() == self.total_members()
    }
}

/// The partition of a roster into households.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Grouping {
    pub households: Vec<Household>,
    /// Roster positions of the voters with neither a family id nor a usable address.
    pub ungrouped: Vec<usize>,
}

/// Booth-level statistics.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothStatistics {
    pub total_voters: u64,
    pub total_families: u64,
    pub verified_voters: u64,
    pub surveys_completed: u64,
    pub visits_pending: u64,
    pub male_voters: u64,
    pub female_voters: u64,
    pub others_voters: u64,
    #[serde(rename = "age60Plus")]
    pub age_60_plus: u64,
    #[serde(rename = "age80Plus")]
    pub age_80_plus: u64,
    pub ungrouped_voters: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RollupResult {
    pub households: Vec<Household>,
    pub ungrouped: Vec<NormalizedVoter>,
    pub stats: BoothStatistics,
}

// ******** Roster pages *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "currentPage", default)]
    pub current_page: u32,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
    #[serde(rename = "totalVoters", default)]
    pub total_voters: u32,
}

/// One page of the voter list endpoint.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoterPage {
    pub success: bool,
    #[serde(default)]
    pub voters: Vec<VoterRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Errors raised while fetching a roster.
///
/// The aggregation itself never fails. Only the data-fetch layer does.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RosterError {
    /// The backend answered with `success: false`.
    Unsuccessful { booth_id: String, page: u32 },
    /// The source itself failed (network, file, decoding).
    Source(String),
    /// The backend announced more voters than it eventually returned.
    Incomplete { expected: u32, received: u32 },
}

impl Error for RosterError {}

impl Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Unsuccessful { booth_id, page } => {
                write!(f, "unsuccessful response for booth {} (page {})", booth_id, page)
            }
            RosterError::Source(msg) => write!(f, "roster source error: {}", msg),
            RosterError::Incomplete { expected, received } => write!(
                f,
                "incomplete roster: expected {} voters, received {}",
                expected, received
            ),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RollupRules {
    /// Number of survey forms currently active. Every voter is expected to
    /// answer each of them once.
    pub active_survey_forms: u32,
    /// The total number of voters announced by the server, if it should be
    /// used instead of the length of the roster.
    pub reported_total: Option<u64>,
}

impl RollupRules {
    pub const DEFAULT_RULES: RollupRules = RollupRules {
        active_survey_forms: 1,
        reported_total: None,
    };
}

impl Default for RollupRules {
    fn default() -> Self {
        RollupRules::DEFAULT_RULES
    }
}
