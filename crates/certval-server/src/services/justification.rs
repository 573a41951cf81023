// SPDX-License-Identifier: Apache-2.0

//! Builds a one-line rejection reason from a stored evaluation payload.
//!
//! Payload shapes drift between evaluation pipeline versions, so every
//! level accepts several key spellings and any mismatch falls through to
//! the next candidate instead of failing.

use certval_model::CertNo;
use serde_json::{Map, Value};

const PAYLOAD_WRAPPERS: &[&str] = &["evaluation", "result", "data"];

const REQUIREMENT_CONTAINERS: &[&str] = &[
    "requirements_evaluation",
    "requirementsEvaluation",
    "requirement_groups",
    "requirementGroups",
    "requirements",
];
const GROUP_LIST_KEYS: &[&str] = &["groups", "requirement_groups", "items"];
const GROUP_LABEL_KEYS: &[&str] = &["group", "group_name", "groupName", "name", "title", "label"];
const GROUP_ITEM_KEYS: &[&str] = &["requirements", "items", "checks", "results"];

const TOLERANCE_CONTAINERS: &[&str] = &[
    "tolerance_checks",
    "toleranceChecks",
    "tolerance_evaluation",
    "toleranceEvaluation",
    "tolerances",
];
const CHECK_LIST_KEYS: &[&str] = &["checks", "items", "results"];
const CHECK_DESCRIPTION_KEYS: &[&str] = &["description", "name", "parameter", "check", "title"];
const CHECK_SPEC_KEYS: &[&str] = &["specification", "spec", "tolerance", "limit"];

const CMC_MESSAGE_KEYS: &[&str] = &[
    "cmc_message",
    "cmcMessage",
    "cmc_messages",
    "cmcMessages",
    "cmc_issues",
];
const CMC_OBJECT_KEYS: &[&str] = &["message", "summary"];

const STATUS_KEYS: &[&str] = &["status", "result", "compliance"];
const NOTES_KEYS: &[&str] = &["notes", "note", "comment", "comments", "details"];

/// Justification for a reject that arrived without a reviewer comment.
///
/// Priority: failed requirements, then failed tolerance checks, then a CMC
/// message, then a generic line naming the certificate.
#[must_use]
pub fn synthesize_justification(cert_no: &CertNo, payload: Option<&Value>) -> String {
    let parsed;
    let root = match payload {
        Some(Value::String(raw)) => {
            parsed = serde_json::from_str::<Value>(raw).ok();
            parsed.as_ref()
        }
        other => other,
    };
    root.and_then(from_payload)
        .unwrap_or_else(|| format!("Rejection recorded for certificate {cert_no}"))
}

fn from_payload(root: &Value) -> Option<String> {
    let roots = payload_roots(root);
    roots
        .iter()
        .find_map(|r| requirements_message(r))
        .or_else(|| roots.iter().find_map(|r| tolerance_message(r)))
        .or_else(|| roots.iter().find_map(|r| cmc_message(r)))
}

fn payload_roots(root: &Value) -> Vec<&Map<String, Value>> {
    let Some(map) = root.as_object() else {
        return Vec::new();
    };
    let mut roots = vec![map];
    roots.extend(
        PAYLOAD_WRAPPERS
            .iter()
            .filter_map(|k| map.get(*k).and_then(Value::as_object)),
    );
    roots
}

fn requirements_message(root: &Map<String, Value>) -> Option<String> {
    let container = first_present(root, REQUIREMENT_CONTAINERS)?;
    let groups = requirement_groups(container);
    groups.into_iter().enumerate().find_map(|(idx, (label, items))| {
        let failed: Vec<&Map<String, Value>> = items
            .iter()
            .filter_map(Value::as_object)
            .filter(|item| status_of(item).is_some_and(|s| s.eq_ignore_ascii_case("non-compliant")))
            .collect();
        let first = failed.first()?;
        let label = label.unwrap_or_else(|| format!("Group {}", idx + 1));
        let mut message = format!("{} requirement(s) failed — group: {label}.", failed.len());
        if let Some(notes) = text_field(first, NOTES_KEYS) {
            message.push_str(&format!(" Notes: {notes}"));
        }
        Some(message)
    })
}

/// Groups as `(label, requirements)`. Accepts a list of group objects, an
/// object holding such a list, or a map from label to requirement list.
fn requirement_groups(container: &Value) -> Vec<(Option<String>, &Vec<Value>)> {
    match container {
        Value::Array(groups) => groups.iter().filter_map(group_entry).collect(),
        Value::Object(map) => {
            if let Some(groups) = GROUP_LIST_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_array))
            {
                return groups.iter().filter_map(group_entry).collect();
            }
            map.iter()
                .filter_map(|(label, items)| {
                    items.as_array().map(|items| (Some(label.clone()), items))
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn group_entry(group: &Value) -> Option<(Option<String>, &Vec<Value>)> {
    let map = group.as_object()?;
    let items = GROUP_ITEM_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_array))?;
    Some((text_field(map, GROUP_LABEL_KEYS), items))
}

fn tolerance_message(root: &Map<String, Value>) -> Option<String> {
    let checks = match first_present(root, TOLERANCE_CONTAINERS)? {
        Value::Array(checks) => checks,
        Value::Object(map) => CHECK_LIST_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))?,
        _ => return None,
    };
    let failed = checks.iter().filter_map(Value::as_object).find(|check| {
        status_of(check).is_some_and(|s| {
            s.eq_ignore_ascii_case("fail") || s.eq_ignore_ascii_case("failed")
        })
    })?;
    let description = text_field(failed, CHECK_DESCRIPTION_KEYS)
        .unwrap_or_else(|| "unspecified check".to_string());
    let mut message = format!("Tolerance failures detected: {description}");
    if let Some(spec) = text_field(failed, CHECK_SPEC_KEYS) {
        message.push_str(&format!(" (spec: {spec})"));
    }
    if let Some(notes) = text_field(failed, NOTES_KEYS) {
        message.push_str(&format!(" — {notes}"));
    }
    Some(message)
}

fn cmc_message(root: &Map<String, Value>) -> Option<String> {
    text_field(root, CMC_MESSAGE_KEYS)
        .or_else(|| {
            root.get("cmc")
                .and_then(Value::as_object)
                .and_then(|cmc| text_field(cmc, CMC_OBJECT_KEYS))
        })
        .map(|msg| format!("CMC issues detected: {msg}"))
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn status_of(item: &Map<String, Value>) -> Option<&str> {
    STATUS_KEYS
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
}

/// First non-blank scalar among `keys`, rendered as text.
fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match map.get(*k)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cert() -> CertNo {
        CertNo::parse("CAL-001").expect("cert")
    }

    #[test]
    fn requirements_win_over_tolerance() {
        let payload = json!({
            "tolerance_checks": [{"description": "Torque", "status": "FAIL"}],
            "requirements_evaluation": [
                {"group": "Docs", "requirements": [{"status": "compliant"}]},
                {"group": "Traceability", "requirements": [
                    {"status": "Non-Compliant", "notes": "no reference standard"},
                    {"status": "non-compliant"}
                ]}
            ]
        });
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "2 requirement(s) failed — group: Traceability. Notes: no reference standard"
        );
    }

    #[test]
    fn requirement_groups_keyed_by_label() {
        let payload = json!({"requirements": {"Environment": [{"result": "NON-COMPLIANT"}]}});
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "1 requirement(s) failed — group: Environment."
        );
    }

    #[test]
    fn label_keyed_groups_follow_document_order() {
        let raw = r#"{"requirements": {
            "Zeta": [{"status": "non-compliant"}],
            "Alpha": [{"status": "non-compliant"}, {"status": "non-compliant"}]
        }}"#;
        let payload = Value::String(raw.to_string());
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "1 requirement(s) failed — group: Zeta."
        );
    }

    #[test]
    fn unlabelled_group_gets_positional_label() {
        let payload = json!({"requirementGroups": [
            {"items": [{"compliance": "compliant"}]},
            {"items": [{"compliance": "non-compliant"}]}
        ]});
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "1 requirement(s) failed — group: Group 2."
        );
    }

    #[test]
    fn tolerance_message_includes_spec_and_notes() {
        let payload = json!({"evaluation": {"toleranceChecks": {"checks": [
            {"name": "Zero offset", "status": "pass"},
            {"name": "Span", "status": "failed", "spec": "±0.5%", "notes": "drift"}
        ]}}});
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "Tolerance failures detected: Span (spec: ±0.5%) — drift"
        );
    }

    #[test]
    fn cmc_message_used_when_nothing_structured_failed() {
        let payload = json!({"tolerance_checks": [{"status": "pass"}], "cmc": {"summary": "CMC exceeded"}});
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "CMC issues detected: CMC exceeded"
        );
    }

    #[test]
    fn string_payload_is_parsed() {
        let payload = Value::String(r#"{"cmc_message":"scope gap"}"#.to_string());
        assert_eq!(
            synthesize_justification(&cert(), Some(&payload)),
            "CMC issues detected: scope gap"
        );
    }

    #[test]
    fn unreadable_payload_falls_back() {
        let fallback = "Rejection recorded for certificate CAL-001";
        assert_eq!(synthesize_justification(&cert(), None), fallback);
        let garbage = Value::String("{not json".to_string());
        assert_eq!(synthesize_justification(&cert(), Some(&garbage)), fallback);
        let odd = json!({"requirements": 12, "tolerance_checks": "x"});
        assert_eq!(synthesize_justification(&cert(), Some(&odd)), fallback);
    }
}
