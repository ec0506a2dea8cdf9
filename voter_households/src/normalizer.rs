//! Resolution of the legacy field names of voter records.
//!
//! The backend has accumulated several schema variants for the same concept
//! (`Door_No`, `HouseNo`, `Address-House no`, ...). Each logical field has an
//! ordered list of candidate keys; the first key holding a usable value wins.
//! Nested keys are written with a dot (`name.english`).

use log::debug;
use serde_json::Value as JSValue;

use crate::config::*;

pub const UNKNOWN_NAME: &str = "Unknown";

pub const NAME_KEYS: &[&str] = &["name.english", "Name", "name"];
pub const NAME_TAMIL_KEYS: &[&str] = &["name.tamil"];
pub const AGE_KEYS: &[&str] = &["age", "Age"];
pub const GENDER_KEYS: &[&str] = &["gender", "Gender", "sex"];
pub const HOUSE_NUMBER_KEYS: &[&str] = &[
    "Address-House no",
    "HouseNo",
    "Door_No",
    "Door_no",
    "door_no",
];
pub const STREET_KEYS: &[&str] = &["Address-Street", "Street", "Anubhag_name", "address"];
pub const MOBILE_KEYS: &[&str] = &["mobile", "Mobile", "phone"];
pub const VOTER_ID_KEYS: &[&str] = &["voterID", "voterId", "epic", "EPIC_No"];
pub const ID_KEYS: &[&str] = &["_id", "id"];
pub const FAMILY_ID_KEYS: &[&str] = &["familyId"];

fn lookup<'a>(record: &'a JSValue, key: &str) -> Option<&'a JSValue> {
    // A literal key always wins over a dotted path.
    if let Some(v) = record.get(key) {
        return Some(v);
    }
    let mut cur = record;
    for part in key.split('.') {
        cur = cur.get(part)?;
    }
    Some(cur)
}

fn is_present(v: &JSValue) -> bool {
    match v {
        JSValue::Null => false,
        JSValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Returns the first value that is present under one of the candidate keys.
///
/// A value is present when the key exists, and the value is neither `null` nor an
/// empty string.
pub fn first_present<'a>(record: &'a JSValue, keys: &[&str]) -> Option<&'a JSValue> {
    keys.iter()
        .filter_map(|k| lookup(record, k))
        .find(|v| is_present(v))
}

fn as_text(v: &JSValue) -> Option<String> {
    match v {
        JSValue::String(s) => Some(s.clone()),
        JSValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like `first_present` but only considers values that can be read as text.
pub fn first_text(record: &JSValue, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| lookup(record, k))
        .filter(|v| is_present(v))
        .find_map(as_text)
}

/// Lenient integer parsing: leading whitespace, an optional sign and the
/// longest run of digits. Anything else is None.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let x: i64 = digits[..end].parse().ok()?;
    Some(if neg { -x } else { x })
}

fn parse_age(v: Option<&JSValue>) -> u32 {
    let parsed = match v {
        Some(JSValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(JSValue::String(s)) => parse_leading_int(s),
        _ => None,
    };
    match parsed {
        Some(x) if x > 0 => x.min(u32::MAX as i64) as u32,
        _ => 0,
    }
}

fn parse_gender(v: Option<String>) -> Gender {
    match v.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("male") | Some("m") => Gender::Male,
        Some("female") | Some("f") => Gender::Female,
        _ => Gender::Other,
    }
}

pub fn display_name(record: &JSValue) -> String {
    first_text(record, NAME_KEYS).unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn is_zero(v: &JSValue) -> bool {
    v.as_f64() == Some(0.0)
}

/// A numeric zero counts as missing, so `{"age": 0, "Age": 71}` is 71.
pub fn age(record: &JSValue) -> u32 {
    let v = AGE_KEYS
        .iter()
        .filter_map(|k| lookup(record, k))
        .find(|v| is_present(v) && !is_zero(v));
    parse_age(v)
}

pub fn house_number(record: &JSValue) -> String {
    first_text(record, HOUSE_NUMBER_KEYS).unwrap_or_default()
}

pub fn street(record: &JSValue) -> String {
    first_text(record, STREET_KEYS).unwrap_or_default()
}

pub fn is_verified(record: &JSValue) -> bool {
    record.get("verified") == Some(&JSValue::Bool(true))
        || record.get("status").and_then(|s| s.as_str()) == Some("verified")
}

pub fn is_surveyed(record: &JSValue) -> bool {
    record.get("surveyed") == Some(&JSValue::Bool(true))
}

/// The literal family id. Only a missing, `null` or empty value is absent:
/// `" F1 "` and `"F1"` are two different families.
pub fn family_id(record: &JSValue) -> Option<String> {
    first_text(record, FAMILY_ID_KEYS)
}

/// Resolves all the canonical fields of a record.
///
/// This never fails: missing or malformed fields fall back to their defaults.
pub fn normalize(index: usize, record: &VoterRecord) -> NormalizedVoter {
    let r = record.value();
    let nv = NormalizedVoter {
        index,
        id: first_text(r, ID_KEYS),
        voter_id: first_text(r, VOTER_ID_KEYS),
        name: display_name(r),
        name_tamil: first_text(r, NAME_TAMIL_KEYS),
        age: age(r),
        gender: parse_gender(first_text(r, GENDER_KEYS)),
        house_number: house_number(r),
        street: street(r),
        mobile: first_text(r, MOBILE_KEYS),
        family_id: family_id(r),
        verified: is_verified(r),
        surveyed: is_surveyed(r),
    };
    debug!("normalize: {} -> {:?}", index, nv);
    nv
}

pub fn normalize_all(voters: &[VoterRecord]) -> Vec<NormalizedVoter> {
    voters
        .iter()
        .enumerate()
        .map(|(idx, v)| normalize(idx, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(v: JSValue) -> NormalizedVoter {
        normalize(0, &VoterRecord(v))
    }

    #[test]
    fn empty_record_gets_defaults() {
        let nv = norm(json!({}));
        assert_eq!(nv.name, "Unknown");
        assert_eq!(nv.age, 0);
        assert!(!nv.verified);
        assert!(!nv.surveyed);
        assert_eq!(nv.gender, Gender::Other);
        assert_eq!(nv.house_number, "");
        assert_eq!(nv.street, "");
        assert_eq!(nv.mobile, None);
        assert_eq!(nv.family_id, None);
    }

    #[test]
    fn non_object_records_get_defaults() {
        for v in [json!(null), json!(12), json!("voter"), json!([1, 2])] {
            let nv = norm(v);
            assert_eq!(nv.name, "Unknown");
            assert_eq!(nv.age, 0);
            assert!(!nv.verified);
        }
    }

    #[test]
    fn name_resolution_order() {
        assert_eq!(
            norm(json!({"name": {"english": "Ravi", "tamil": "ரவி"}, "Name": "R"})).name,
            "Ravi"
        );
        assert_eq!(norm(json!({"name": {"tamil": "ரவி"}, "Name": "R"})).name, "R");
        assert_eq!(norm(json!({"name": "Kumar"})).name, "Kumar");
        assert_eq!(norm(json!({"name": {"tamil": "ரவி"}})).name, "Unknown");
        assert_eq!(
            norm(json!({"name": {"tamil": "ரவி"}})).name_tamil.as_deref(),
            Some("ரவி")
        );
        assert_eq!(norm(json!({"Name": "", "name": "Kumar"})).name, "Kumar");
    }

    #[test]
    fn age_parsing() {
        assert_eq!(norm(json!({"age": 40})).age, 40);
        assert_eq!(norm(json!({"Age": "63"})).age, 63);
        assert_eq!(norm(json!({"age": " 42 yrs"})).age, 42);
        assert_eq!(norm(json!({"age": "abc"})).age, 0);
        assert_eq!(norm(json!({"age": -3})).age, 0);
        assert_eq!(norm(json!({"age": 40.9})).age, 40);
        assert_eq!(norm(json!({"age": "", "Age": 71})).age, 71);
        assert_eq!(norm(json!({"age": true})).age, 0);
        assert_eq!(norm(json!({"age": 0, "Age": 71})).age, 71);
        assert_eq!(norm(json!({"age": 0.0, "Age": "64"})).age, 64);
        assert_eq!(norm(json!({"age": 0})).age, 0);
    }

    #[test]
    fn address_aliases() {
        let nv = norm(json!({"Door_No": "12", "Anubhag_name": "Main"}));
        assert_eq!(nv.house_number, "12");
        assert_eq!(nv.street, "Main");

        let nv = norm(json!({"Address-House no": 7, "HouseNo": "9", "Address-Street": "North", "Street": "South"}));
        assert_eq!(nv.house_number, "7");
        assert_eq!(nv.street, "North");

        let nv = norm(json!({"door_no": "3B", "address": "Lake Road"}));
        assert_eq!(nv.address_key().as_deref(), Some("3B-Lake Road"));
    }

    #[test]
    fn degenerate_address_key() {
        assert_eq!(norm(json!({"Door_No": "", "Street": ""})).address_key(), None);
        assert_eq!(norm(json!({"Door_No": " ", "Street": " "})).address_key(), None);
        assert_eq!(norm(json!({"Door_No": "5"})).address_key().as_deref(), Some("5-"));
    }

    #[test]
    fn status_flags() {
        assert!(norm(json!({"verified": true})).verified);
        assert!(norm(json!({"status": "verified"})).verified);
        assert!(!norm(json!({"status": "pending"})).verified);
        assert!(!norm(json!({"verified": "true"})).verified);
        assert!(norm(json!({"surveyed": true})).surveyed);
        assert!(!norm(json!({"surveyed": 1})).surveyed);
    }

    #[test]
    fn gender_and_contact() {
        let nv = norm(json!({"Gender": "F", "Mobile": "9876543210", "voterID": "ABC1234567"}));
        assert_eq!(nv.gender, Gender::Female);
        assert_eq!(nv.mobile.as_deref(), Some("9876543210"));
        assert_eq!(nv.voter_id.as_deref(), Some("ABC1234567"));
        assert_eq!(norm(json!({"gender": "Male"})).gender, Gender::Male);
        assert_eq!(norm(json!({"sex": "transgender"})).gender, Gender::Other);
    }

    #[test]
    fn family_id_is_literal() {
        assert_eq!(norm(json!({"familyId": " F1 "})).family_id.as_deref(), Some(" F1 "));
        assert_eq!(norm(json!({"familyId": "   "})).family_id.as_deref(), Some("   "));
        assert_eq!(norm(json!({"familyId": ""})).family_id, None);
        assert_eq!(norm(json!({"familyId": null})).family_id, None);
    }
}
