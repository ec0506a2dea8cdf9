/*!
Household grouping and progress rollups over booth voter rosters.

A roster is a flat list of voter records, as returned by the backend. This crate
partitions it into households (by explicit family id, else by address), and
computes the verification and survey statistics displayed for a booth.

```
use serde_json::json;
use voter_households::*;

let voters: Vec<VoterRecord> = vec![
    json!({"familyId": "F1", "age": 40, "verified": true}).into(),
    json!({"familyId": "F1", "age": 10}).into(),
    json!({"Door_No": "12", "Street": "Main", "age": 30, "surveyed": true}).into(),
];
let res = rollup(&voters, &RollupRules::DEFAULT_RULES);
assert_eq!(res.stats.total_families, 2);
assert_eq!(res.households[0].id, "F1");
assert_eq!(res.households[0].verified_percentage(), 50);
```

More details in the [manual].
*/
mod config;
pub mod builder;
pub mod cache;
pub mod manual;
pub mod normalizer;
pub mod roster;

use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::config::*;
use crate::normalizer::normalize_all;

pub const ADDRESS_FAMILY_PREFIX: &str = "address-family-";

// Number of hex characters of the address hash kept in the household id.
const ADDRESS_HASH_LEN: usize = 12;

// **** Private structures ****

/// Buckets that remember the order in which their keys were first seen.
struct OrderedBuckets {
    keys: Vec<String>,
    members: HashMap<String, Vec<usize>>,
}

impl OrderedBuckets {
    fn new() -> OrderedBuckets {
        OrderedBuckets {
            keys: Vec::new(),
            members: HashMap::new(),
        }
    }

    fn push(&mut self, key: &str, idx: usize) {
        if let Some(v) = self.members.get_mut(key) {
            v.push(idx);
        } else {
            self.keys.push(key.to_string());
            self.members.insert(key.to_string(), vec![idx]);
        }
    }

    fn into_ordered(mut self) -> Vec<(String, Vec<usize>)> {
        let mut res = Vec::with_capacity(self.keys.len());
        for k in self.keys {
            let v = self.members.remove(&k).unwrap_or_default();
            res.push((k, v));
        }
        res
    }
}

/// The stable identifier of a household inferred from an address.
///
/// It only depends on the address key, so it survives reordering of the roster.
pub fn address_household_id(address_key: &str) -> String {
    let digest = sha256::digest(address_key);
    format!(
        "{}{}",
        ADDRESS_FAMILY_PREFIX,
        &digest[..ADDRESS_HASH_LEN.min(digest.len())]
    )
}

fn make_household(
    id: String,
    kind: HouseholdKind,
    address_key: Option<String>,
    idxs: &[usize],
    normalized: &[NormalizedVoter],
) -> Household {
    let mut members: Vec<NormalizedVoter> = idxs.iter().map(|i| normalized[*i].clone()).collect();
    // Stable: ties keep the roster order.
    members.sort_by(|a, b| b.age.cmp(&a.age));
    Household {
        id,
        kind,
        address_key,
        members,
    }
}

fn group_normalized(normalized: &[NormalizedVoter]) -> Grouping {
    let mut by_family = OrderedBuckets::new();
    let mut by_address = OrderedBuckets::new();
    let mut ungrouped: Vec<usize> = Vec::new();

    for nv in normalized.iter() {
        if let Some(fid) = &nv.family_id {
            by_family.push(fid, nv.index);
        } else if let Some(key) = nv.address_key() {
            by_address.push(&key, nv.index);
        } else {
            debug!(
                "group_households: voter {} has no family id and no address",
                nv.label()
            );
            ungrouped.push(nv.index);
        }
    }

    let mut households: Vec<Household> = Vec::new();
    for (fid, idxs) in by_family.into_ordered() {
        households.push(make_household(
            fid,
            HouseholdKind::Explicit,
            None,
            &idxs,
            normalized,
        ));
    }

    let mut seen_ids: HashMap<String, u32> = households.iter().map(|h| (h.id.clone(), 1)).collect();
    for (key, idxs) in by_address.into_ordered() {
        let base_id = address_household_id(&key);
        let id = match seen_ids.get_mut(&base_id) {
            Some(n) => {
                *n += 1;
                warn!(
                    "group_households: household id collision on {} (address {:?})",
                    base_id, key
                );
                format!("{}-{}", base_id, n)
            }
            None => {
                seen_ids.insert(base_id.clone(), 1);
                base_id
            }
        };
        households.push(make_household(
            id,
            HouseholdKind::Address,
            Some(key),
            &idxs,
            normalized,
        ));
    }

    if !ungrouped.is_empty() {
        warn!(
            "group_households: {} voter(s) could not be assigned to a household",
            ungrouped.len()
        );
    }
    Grouping {
        households,
        ungrouped,
    }
}

/// Partitions a roster into households.
///
/// Voters with a family id are grouped by that id. The other ones are grouped by
/// their address. Voters with neither are reported in `ungrouped`.
/// Households with a family id come first, then the address households, each in
/// the order in which they first appear in the roster.
pub fn group_households(voters: &[VoterRecord]) -> Grouping {
    let normalized = normalize_all(voters);
    let g = group_normalized(&normalized);
    info!(
        "group_households: {} voters -> {} households, {} ungrouped",
        voters.len(),
        g.households.len(),
        g.ungrouped.len()
    );
    g
}

fn count_where(normalized: &[NormalizedVoter], f: impl Fn(&NormalizedVoter) -> bool) -> u64 {
    normalized.iter().filter(|nv| f(nv)).count() as u64
}

fn stats_from_normalized(
    normalized: &[NormalizedVoter],
    grouping: &Grouping,
    rules: &RollupRules,
) -> BoothStatistics {
    let total_voters = rules.reported_total.unwrap_or(normalized.len() as u64);
    let surveys_completed = count_where(normalized, |nv| nv.surveyed);
    let visits_pending = total_voters
        .saturating_mul(rules.active_survey_forms as u64)
        .saturating_sub(surveys_completed);

    BoothStatistics {
        total_voters,
        total_families: grouping.households.len() as u64,
        verified_voters: count_where(normalized, |nv| nv.verified),
        surveys_completed,
        visits_pending,
        male_voters: count_where(normalized, |nv| nv.gender == Gender::Male),
        female_voters: count_where(normalized, |nv| nv.gender == Gender::Female),
        others_voters: count_where(normalized, |nv| nv.gender == Gender::Other),
        age_60_plus: count_where(normalized, |nv| (60..80).contains(&nv.age)),
        age_80_plus: count_where(normalized, |nv| nv.age >= 80),
        ungrouped_voters: grouping.ungrouped.len() as u64,
    }
}

/// Computes the booth statistics for a roster and its partition.
pub fn compute_booth_stats(
    voters: &[VoterRecord],
    grouping: &Grouping,
    rules: &RollupRules,
) -> BoothStatistics {
    let normalized = normalize_all(voters);
    stats_from_normalized(&normalized, grouping, rules)
}

/// Groups the roster and computes all the statistics in one go.
pub fn rollup(voters: &[VoterRecord], rules: &RollupRules) -> RollupResult {
    info!(
        "rollup: processing {} voters, rules: {:?}",
        voters.len(),
        rules
    );
    let normalized = normalize_all(voters);
    let grouping = group_normalized(&normalized);
    let stats = stats_from_normalized(&normalized, &grouping, rules);
    info!("rollup: stats: {:?}", stats);
    let ungrouped = grouping
        .ungrouped
        .iter()
        .map(|i| normalized[*i].clone())
        .collect();
    RollupResult {
        households: grouping.households,
        ungrouped,
        stats,
    }
}

/// Like `rollup`, but a roster that failed to load counts as an empty one.
pub fn rollup_or_empty(voters: Option<&[VoterRecord]>, rules: &RollupRules) -> RollupResult {
    match voters {
        Some(vs) => rollup(vs, rules),
        None => {
            warn!("rollup_or_empty: no roster available, using an empty one");
            rollup(&[], rules)
        }
    }
}

/// Filters households for the family manager view.
///
/// The query matches (ignoring case) the household id, the member names, the EPIC
/// numbers, the addresses and the mobile numbers. An empty query matches everything.
pub fn search_households<'a>(households: &'a [Household], query: &str) -> Vec<&'a Household> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return households.iter().collect();
    }
    let matches = |s: &str| s.to_lowercase().contains(&q);
    households
        .iter()
        .filter(|h| {
            matches(&h.id)
                || h.members.iter().any(|m| {
                    matches(&m.name)
                        || m.voter_id.as_deref().map_or(false, matches)
                        || matches(&m.house_number)
                        || matches(&m.street)
                        || m.mobile.as_deref().map_or(false, matches)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JSValue};

    fn roster(vs: Vec<JSValue>) -> Vec<VoterRecord> {
        vs.into_iter().map(VoterRecord).collect()
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn explicit_family() {
        init();
        let vs = roster(vec![
            json!({"familyId": "F1", "age": 40}),
            json!({"familyId": "F1", "age": 10}),
        ]);
        let g = group_households(&vs);
        assert_eq!(g.households.len(), 1);
        let h = &g.households[0];
        assert_eq!(h.id, "F1");
        assert_eq!(h.kind, HouseholdKind::Explicit);
        assert_eq!(h.total_members(), 2);
        assert_eq!(h.head_of_family().map(|m| m.age), Some(40));
        assert_eq!(h.head_of_family().map(|m| m.index), Some(0));
    }

    #[test]
    fn family_ids_are_keyed_literally() {
        init();
        let vs = roster(vec![
            json!({"familyId": " F1 ", "age": 40}),
            json!({"familyId": "F1", "age": 10}),
            json!({"familyId": "  ", "Door_No": "3", "Street": "X"}),
        ]);
        let g = group_households(&vs);
        let ids: Vec<(&str, HouseholdKind, usize)> = g
            .households
            .iter()
            .map(|h| (h.id.as_str(), h.kind, h.total_members()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (" F1 ", HouseholdKind::Explicit, 1),
                ("F1", HouseholdKind::Explicit, 1),
                ("  ", HouseholdKind::Explicit, 1),
            ]
        );
        assert!(g.ungrouped.is_empty());
    }

    #[test]
    fn address_family() {
        init();
        let vs = roster(vec![
            json!({"Door_No": "12", "Street": "Main", "age": 30}),
            json!({"Door_No": "12", "Street": "Main", "age": 5}),
        ]);
        let g = group_households(&vs);
        assert_eq!(g.households.len(), 1);
        let h = &g.households[0];
        assert_eq!(h.kind, HouseholdKind::Address);
        assert_eq!(h.address_key.as_deref(), Some("12-Main"));
        assert!(h.id.starts_with(ADDRESS_FAMILY_PREFIX));
        assert_eq!(h.total_members(), 2);
    }

    #[test]
    fn degenerate_address_is_ungrouped() {
        init();
        let vs = roster(vec![json!({"Door_No": "", "Street": "", "age": 20})]);
        let res = rollup(&vs, &RollupRules::DEFAULT_RULES);
        assert!(res.households.is_empty());
        assert_eq!(res.stats.total_voters, 1);
        assert_eq!(res.stats.total_families, 0);
        assert_eq!(res.stats.ungrouped_voters, 1);
        assert_eq!(res.ungrouped.len(), 1);
    }

    #[test]
    fn visits_pending() {
        let mut vs: Vec<JSValue> = Vec::new();
        for i in 0..100 {
            vs.push(json!({"familyId": format!("F{}", i % 10), "surveyed": i < 75}));
        }
        let vs = roster(vs);
        let g = group_households(&vs);
        let rules = RollupRules {
            active_survey_forms: 2,
            reported_total: None,
        };
        let stats = compute_booth_stats(&vs, &g, &rules);
        assert_eq!(stats.surveys_completed, 75);
        assert_eq!(stats.visits_pending, 125);

        // Completed surveys may outnumber the target.
        let rules = RollupRules {
            active_survey_forms: 0,
            reported_total: None,
        };
        assert_eq!(compute_booth_stats(&vs, &g, &rules).visits_pending, 0);
    }

    #[test]
    fn visits_pending_with_reported_total() {
        // 100 voters announced by the server, 2 active forms, 150 completed surveys.
        let vs = roster((0..150).map(|_| json!({"surveyed": true})).collect());
        let rules = RollupRules {
            active_survey_forms: 2,
            reported_total: Some(100),
        };
        let res = rollup(&vs, &rules);
        assert_eq!(res.stats.total_voters, 100);
        assert_eq!(res.stats.surveys_completed, 150);
        assert_eq!(res.stats.visits_pending, 50);
    }

    #[test]
    fn empty_roster() {
        init();
        let res = rollup(&[], &RollupRules::DEFAULT_RULES);
        assert_eq!(res.stats, BoothStatistics::default());
        assert!(res.households.is_empty());
        let res = rollup_or_empty(None, &RollupRules::DEFAULT_RULES);
        assert_eq!(res.stats, BoothStatistics::default());
    }

    #[test]
    fn family_id_wins_over_address() {
        let vs = roster(vec![
            json!({"familyId": "F9", "Door_No": "1", "Street": "A"}),
            json!({"familyId": "F9", "Door_No": "2", "Street": "B"}),
            json!({"Door_No": "1", "Street": "A"}),
        ]);
        let g = group_households(&vs);
        assert_eq!(g.households.len(), 2);
        assert_eq!(g.households[0].id, "F9");
        assert_eq!(g.households[0].member_indices(), vec![0, 1]);
        assert_eq!(g.households[1].member_indices(), vec![2]);
    }

    #[test]
    fn explicit_households_come_first() {
        let vs = roster(vec![
            json!({"Door_No": "4", "Street": "East"}),
            json!({"familyId": "F2"}),
            json!({"familyId": "F1"}),
            json!({"Door_No": "3", "Street": "West"}),
        ]);
        let g = group_households(&vs);
        let kinds: Vec<HouseholdKind> = g.households.iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HouseholdKind::Explicit,
                HouseholdKind::Explicit,
                HouseholdKind::Address,
                HouseholdKind::Address
            ]
        );
        assert_eq!(g.households[0].id, "F2");
        assert_eq!(g.households[1].id, "F1");
        assert_eq!(g.households[2].address_key.as_deref(), Some("4-East"));
    }

    #[test]
    fn head_of_family_ties_keep_roster_order() {
        let vs = roster(vec![
            json!({"familyId": "F", "name": "a", "age": 30}),
            json!({"familyId": "F", "name": "b", "age": 50}),
            json!({"familyId": "F", "name": "c", "age": 50}),
            json!({"familyId": "F", "name": "d", "age": "x"}),
        ]);
        let g = group_households(&vs);
        let names: Vec<&str> = g.households[0].members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a", "d"]);
        assert_eq!(g.households[0].head_of_family().map(|m| m.name.as_str()), Some("b"));
    }

    #[test]
    fn address_ids_are_stable_across_reordering() {
        let vs = vec![
            json!({"Door_No": "1", "Street": "A", "name": "x"}),
            json!({"Door_No": "2", "Street": "A", "name": "y"}),
            json!({"Door_No": "1", "Street": "A", "name": "z"}),
        ];
        let g1 = group_households(&roster(vs.clone()));
        let mut rev = vs;
        rev.reverse();
        let g2 = group_households(&roster(rev));
        let mut ids1: Vec<String> = g1.households.iter().map(|h| h.id.clone()).collect();
        let mut ids2: Vec<String> = g2.households.iter().map(|h| h.id.clone()).collect();
        ids1.sort();
        ids2.sort();
        assert_eq!(ids1, ids2);
        assert_eq!(address_household_id("1-A"), address_household_id("1-A"));
        assert_ne!(address_household_id("1-A"), address_household_id("2-A"));
    }

    #[test]
    fn grouping_is_idempotent() {
        let vs = roster(vec![
            json!({"familyId": "F1", "age": 40}),
            json!({"Door_No": "7", "Street": "Lake", "age": 22}),
            json!({"Door_No": "7", "Street": "Lake", "age": 61}),
            json!({}),
        ]);
        assert_eq!(group_households(&vs), group_households(&vs));
    }

    #[test]
    fn membership_invariants() {
        let vs = roster(vec![
            json!({"familyId": "F1", "age": 40, "verified": true}),
            json!({"familyId": "F1", "age": 41, "status": "verified"}),
            json!({"Door_No": "7", "Street": "Lake", "age": 22}),
            json!({"Door_No": "7", "Street": "Lake", "age": 61, "verified": true}),
            json!({"age": 33}),
            json!({"HouseNo": "9"}),
        ]);
        let g = group_households(&vs);
        let grouped: usize = g.households.iter().map(|h| h.total_members()).sum();
        assert_eq!(grouped + g.ungrouped.len(), vs.len());
        assert!(grouped <= vs.len());
        for h in g.households.iter() {
            assert!(h.verified_members() <= h.total_members());
            let max_age = h.members.iter().map(|m| m.age).max();
            assert_eq!(h.head_of_family().map(|m| m.age), max_age);
        }
        assert!(g.households[0].is_fully_verified());
        assert_eq!(g.households[1].verified_percentage(), 50);
        assert!(!g.households[1].is_fully_verified());
    }

    #[test]
    fn breakdowns() {
        let vs = roster(vec![
            json!({"gender": "male", "age": 59}),
            json!({"gender": "Male", "age": 60}),
            json!({"gender": "female", "age": 79}),
            json!({"Gender": "F", "age": 80}),
            json!({"age": 95, "verified": true}),
        ]);
        let res = rollup(&vs, &RollupRules::DEFAULT_RULES);
        assert_eq!(res.stats.male_voters, 2);
        assert_eq!(res.stats.female_voters, 2);
        assert_eq!(res.stats.others_voters, 1);
        assert_eq!(res.stats.age_60_plus, 2);
        assert_eq!(res.stats.age_80_plus, 2);
        assert_eq!(res.stats.verified_voters, 1);
        assert_eq!(res.stats.visits_pending, 5);
    }

    #[test]
    fn percentage_rounding() {
        let vs = roster(vec![
            json!({"familyId": "F", "verified": true}),
            json!({"familyId": "F", "verified": true}),
            json!({"familyId": "F"}),
        ]);
        let g = group_households(&vs);
        assert_eq!(g.households[0].verified_percentage(), 67);
    }

    #[test]
    fn search() {
        let vs = roster(vec![
            json!({"familyId": "F1", "name": {"english": "Lakshmi"}, "voterID": "TNX0001"}),
            json!({"Door_No": "12", "Street": "Main", "Name": "Arun", "mobile": "9000000001"}),
        ]);
        let g = group_households(&vs);
        assert_eq!(search_households(&g.households, "").len(), 2);
        assert_eq!(search_households(&g.households, "lakSHMI").len(), 1);
        assert_eq!(search_households(&g.households, "tnx").len(), 1);
        assert_eq!(search_households(&g.households, "9000").len(), 1);
        assert_eq!(search_households(&g.households, "main")[0].kind, HouseholdKind::Address);
        assert_eq!(search_households(&g.households, "f1")[0].id, "F1");
        assert!(search_households(&g.households, "nobody").is_empty());
    }

    #[test]
    fn statistics_serialize_in_camel_case() {
        let stats = BoothStatistics {
            total_voters: 3,
            age_60_plus: 1,
            ..Default::default()
        };
        let js = serde_json::to_value(stats).unwrap();
        assert_eq!(js["totalVoters"], json!(3));
        assert_eq!(js["age60Plus"], json!(1));
        assert_eq!(js["visitsPending"], json!(0));
        assert_eq!(js["ungroupedVoters"], json!(0));
    }
}
