pub use crate::config::*;

/// A builder for assembling a roster before computing the rollup.
///
/// Voters can be added one at a time or page by page, in any order. The survey
/// side (number of active forms) can be set after the voters are known.
///
/// ```
/// pub use voter_households::builder::Builder;
/// pub use voter_households::RollupRules;
/// use serde_json::json;
///
/// let mut builder = Builder::new(&RollupRules::DEFAULT_RULES).active_survey_forms(2);
///
/// builder.add_voter(json!({"familyId": "F1", "age": 40, "surveyed": true}));
/// builder.add_voter(json!({"familyId": "F1", "age": 10}));
///
/// let res = builder.build();
/// assert_eq!(res.stats.total_voters, 2);
/// assert_eq!(res.stats.visits_pending, 3);
/// ```
pub struct Builder {
    pub(crate) _rules: RollupRules,
    pub(crate) _voters: Vec<VoterRecord>,
}

impl Builder {
    pub fn new(rules: &RollupRules) -> Builder {
        Builder {
            _rules: *rules,
            _voters: Vec::new(),
        }
    }

    pub fn active_survey_forms(self, count: u32) -> Builder {
        Builder {
            _rules: RollupRules {
                active_survey_forms: count,
                ..self._rules
            },
            _voters: self._voters,
        }
    }

    /// Uses the total announced by the server instead of the number of voters added.
    pub fn reported_total(self, total: u64) -> Builder {
        Builder {
            _rules: RollupRules {
                reported_total: Some(total),
                ..self._rules
            },
            _voters: self._voters,
        }
    }

    /// Adds a raw voter record, as returned by the backend.
    pub fn add_voter(&mut self, record: serde_json::Value) {
        self._voters.push(VoterRecord(record));
    }

    pub fn add_voters(&mut self, records: &[VoterRecord]) {
        self._voters.extend_from_slice(records);
    }

    /// Adds all the voters of a page.
    ///
    /// Unsuccessful pages are ignored, in the same way as a failed fetch
    /// results in an empty roster.
    pub fn add_page(&mut self, page: &VoterPage) {
        if page.success {
            self.add_voters(&page.voters);
        } else {
            log::warn!(
                "add_page: skipping unsuccessful page {}",
                page.pagination.current_page
            );
        }
    }

    pub fn voters(&self) -> &[VoterRecord] {
        &self._voters
    }

    pub fn build(&self) -> RollupResult {
        crate::rollup(&self._voters, &self._rules)
    }
}
