//! Turns `display qlocal` responses into a canonical list of queue depths.
//!
//! The admin REST API has answered this command in several shapes across MQ
//! releases. Extraction tries each known shape in priority order and keeps the
//! first one that produces anything; only then are the candidates merged,
//! filtered and sorted.

use crate::natural_order::natural_cmp;
use crate::types::QueueDepthEntry;
use serde_json::{Map, Value};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Depth field aliases in probe order; the first one present wins.
pub const DEPTH_KEYS: [&str; 7] = [
    "CURDEPTH",
    "curdepth",
    "CurrentDepth",
    "currentdepth",
    "QDEPTH",
    "qDepth",
    "depth",
];

pub const DEFAULT_IGNORE_PREFIXES: [&str; 2] = ["AMQ", "SYSTEM."];

/// A raw (name, depth) candidate before merging.
type Candidate = (String, Option<u64>);

type Extractor = fn(&Value) -> Vec<Candidate>;

const EXTRACTORS: [(&str, Extractor); 3] = [
    ("command_response", extract_command_response),
    ("legacy_mqsc", extract_legacy_mqsc),
    ("generic_walk", extract_generic_walk),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    ignore_prefixes: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_PREFIXES.iter().map(|p| p.to_string()))
    }
}

impl Normalizer {
    pub fn new(ignore_prefixes: impl IntoIterator<Item = String>) -> Self {
        Self {
            ignore_prefixes: ignore_prefixes
                .into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn ignore_prefixes(&self) -> &[String] {
        &self.ignore_prefixes
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        let folded = name.to_lowercase();
        self.ignore_prefixes
            .iter()
            .any(|prefix| folded.starts_with(prefix.as_str()))
    }

    /// Extracts, merges, filters and naturally sorts queue depths from a
    /// parsed response body.
    pub fn normalize(&self, data: Option<&Value>) -> Vec<QueueDepthEntry> {
        let Some(data) = data else {
            return Vec::new();
        };
        let mut entries = merge_candidates(extract_candidates(data))
            .into_iter()
            .filter(|entry| !self.is_ignored(&entry.name))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        entries
    }
}

/// Runs the extractors in priority order and returns the candidates of the
/// first one that yields anything.
pub fn extract_candidates(data: &Value) -> Vec<Candidate> {
    for (_, extract) in EXTRACTORS {
        let found = extract(data);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Name of the response shape that `extract_candidates` would use.
pub fn detect_shape(data: &Value) -> Option<&'static str> {
    EXTRACTORS
        .iter()
        .find(|(_, extract)| !extract(data).is_empty())
        .map(|(name, _)| *name)
}

/// `{"commandResponse": [{"parameters": {"queue": .., "CURDEPTH": ..}}]}`
fn extract_command_response(data: &Value) -> Vec<Candidate> {
    let Some(items) = data.get("commandResponse").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("parameters").and_then(Value::as_object))
        .filter_map(|params| candidate(params, ["queue", "name"]))
        .collect()
}

/// `{"response": [{"mqsc": [{"name": .., "CURDEPTH": ..}]}]}`
fn extract_legacy_mqsc(data: &Value) -> Vec<Candidate> {
    let Some(responses) = data.get("response").and_then(Value::as_array) else {
        return Vec::new();
    };
    responses
        .iter()
        .filter_map(|resp| resp.get("mqsc").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|ent| candidate(ent, ["name", "queue"]))
        .collect()
}

/// Visits every mapping in the document, nested ones included, and records a
/// candidate wherever a name-like field is present.
fn extract_generic_walk(data: &Value) -> Vec<Candidate> {
    let mut out = Vec::new();
    walk(data, &mut out);
    out
}

fn walk(value: &Value, out: &mut Vec<Candidate>) {
    match value {
        Value::Object(map) => {
            if let Some(found) = candidate(map, ["queue", "name"]) {
                out.push(found);
            }
            for child in map.values() {
                walk(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

fn candidate(map: &Map<String, Value>, name_keys: [&str; 2]) -> Option<Candidate> {
    let raw_name = name_keys
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| is_truthy(value))?;
    let name = normalize_name(raw_name)?;
    let depth = DEPTH_KEYS
        .iter()
        .find_map(|key| map.get(*key))
        .and_then(coerce_depth);
    Some((name, depth))
}

/// JSON values that count as "present" when choosing between name fields.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// NFC-normalizes and trims a queue name; non-strings and blank names yield
/// `None`.
pub fn normalize_name(value: &Value) -> Option<String> {
    let raw = value.as_str()?;
    let composed = raw.nfc().collect::<String>();
    let trimmed = composed.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Best-effort integer depth. Anything that is not a non-negative integer (or
/// a numeric string or float that truncates to one) becomes unknown.
pub fn coerce_depth(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Some(v);
            }
            if n.is_i64() {
                return None;
            }
            let f = n.as_f64()?;
            if f.is_finite() && f > -1.0 && f < u64::MAX as f64 {
                Some(f.trunc().max(0.0) as u64)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Depth merge rule: a later integer replaces the earlier value, a later
/// unknown never erases a known depth.
pub fn merge(existing: Option<u64>, incoming: Option<u64>) -> Option<u64> {
    incoming.or(existing)
}

/// Collapses candidates case-insensitively. The first spelling of a name is
/// kept, depths are folded with `merge` in traversal order.
pub fn merge_candidates(candidates: Vec<Candidate>) -> Vec<QueueDepthEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<QueueDepthEntry> = Vec::new();
    for (name, depth) in candidates {
        let key = name.to_lowercase();
        match index.get(&key) {
            Some(&pos) => out[pos].depth = merge(out[pos].depth, depth),
            None => {
                index.insert(key, out.len());
                out.push(QueueDepthEntry::new(name, depth));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        coerce_depth, detect_shape, extract_candidates, merge, merge_candidates, Normalizer,
    };
    use crate::types::QueueDepthEntry;
    use serde_json::json;

    fn entry(name: &str, depth: Option<u64>) -> QueueDepthEntry {
        QueueDepthEntry::new(name, depth)
    }

    #[test]
    fn current_schema_single_queue() {
        let data = json!({"commandResponse":[{"parameters":{"queue":"DEV.INPUT","CURDEPTH":3}}]});
        let out = Normalizer::default().normalize(Some(&data));
        assert_eq!(out, vec![entry("DEV.INPUT", Some(3))]);
    }

    #[test]
    fn three_shapes_yield_same_listing() {
        let current = json!({"commandResponse": [
            {"completionCode": 0, "parameters": {"queue": "Q10", "curdepth": 4}},
            {"parameters": {"queue": "AMQ.INTERNAL", "curdepth": 1}},
            {"parameters": {"name": "Q2", "CURDEPTH": "7"}},
            {"parameters": {"queue": "Q1"}}
        ]});
        let legacy = json!({"response": [
            {"mqsc": [{"name": "Q2", "CURDEPTH": 7}, {"name": "AMQ.INTERNAL", "depth": 1}]},
            {"mqsc": [{"queue": "Q1"}, {"name": "Q10", "qDepth": 4}]}
        ]});
        let generic = json!({"data": {"queues": [
            {"queue": "Q1"},
            {"name": "Q10", "currentdepth": 4},
            {"name": "AMQ.INTERNAL", "CURDEPTH": 1},
            {"name": "Q2", "QDEPTH": 7}
        ]}});

        let normalizer = Normalizer::default();
        let expected = vec![entry("Q1", None), entry("Q2", Some(7)), entry("Q10", Some(4))];
        assert_eq!(normalizer.normalize(Some(&current)), expected);
        assert_eq!(normalizer.normalize(Some(&legacy)), expected);
        assert_eq!(normalizer.normalize(Some(&generic)), expected);

        assert_eq!(detect_shape(&current), Some("command_response"));
        assert_eq!(detect_shape(&legacy), Some("legacy_mqsc"));
        assert_eq!(detect_shape(&generic), Some("generic_walk"));
    }

    #[test]
    fn renormalizing_output_is_idempotent() {
        let data = json!({"commandResponse": [
            {"parameters": {"queue": "DEV.B", "CURDEPTH": 2}},
            {"parameters": {"queue": "dev.a"}},
            {"parameters": {"queue": "DEV.A", "CURDEPTH": 9}}
        ]});
        let normalizer = Normalizer::default();
        let first = normalizer.normalize(Some(&data));
        let wrapped = serde_json::to_value(&first).expect("serialize");
        let second = normalizer.normalize(Some(&wrapped));
        assert_eq!(first, second);
        assert_eq!(first, vec![entry("dev.a", Some(9)), entry("DEV.B", Some(2))]);
    }

    #[test]
    fn unknown_depth_never_overwrites_known_depth() {
        assert_eq!(merge(Some(5), None), Some(5));
        assert_eq!(merge(Some(5), Some(7)), Some(7));
        assert_eq!(merge(None, Some(0)), Some(0));

        let data = json!({"commandResponse": [
            {"parameters": {"queue": "DEV.Q", "CURDEPTH": 5}},
            {"parameters": {"queue": "dev.q", "CURDEPTH": "n/a"}},
            {"parameters": {"queue": "DEV.R", "CURDEPTH": 5}},
            {"parameters": {"queue": "DEV.R", "CURDEPTH": 7}}
        ]});
        let out = Normalizer::default().normalize(Some(&data));
        assert_eq!(out, vec![entry("DEV.Q", Some(5)), entry("DEV.R", Some(7))]);
    }

    #[test]
    fn ignore_prefixes_apply_case_insensitively_after_dedup() {
        let data = json!({"commandResponse": [
            {"parameters": {"queue": "AMQ.SYSTEM.QUEUE", "CURDEPTH": 1}},
            {"parameters": {"queue": "system.admin.command.queue", "CURDEPTH": 0}},
            {"parameters": {"queue": "DEV.QUEUE.1", "CURDEPTH": 0}}
        ]});
        let normalizer = Normalizer::default();
        assert!(normalizer.is_ignored("amq.foo"));
        assert!(!normalizer.is_ignored("SYSTEMX"));
        assert_eq!(
            normalizer.normalize(Some(&data)),
            vec![entry("DEV.QUEUE.1", Some(0))]
        );

        let custom = Normalizer::new(vec![" dev. ".to_string(), String::new()]);
        assert_eq!(custom.ignore_prefixes(), ["dev.".to_string()]);
        assert_eq!(
            custom.normalize(Some(&data)),
            vec![entry("AMQ.SYSTEM.QUEUE", Some(1)), entry("system.admin.command.queue", Some(0))]
        );
    }

    #[test]
    fn filtered_first_shape_does_not_fall_through() {
        let data = json!({
            "commandResponse": [{"parameters": {"queue": "AMQ.ONLY", "CURDEPTH": 1}}],
            "response": [{"mqsc": [{"name": "DEV.LEGACY", "CURDEPTH": 2}]}]
        });
        assert!(Normalizer::default().normalize(Some(&data)).is_empty());
    }

    #[test]
    fn empty_current_shape_falls_through_to_legacy() {
        let data = json!({
            "commandResponse": [{"parameters": {"queue": "   "}}, "junk"],
            "response": [{"mqsc": [{"name": "DEV.LEGACY", "CURDEPTH": 2}]}]
        });
        assert_eq!(
            Normalizer::default().normalize(Some(&data)),
            vec![entry("DEV.LEGACY", Some(2))]
        );
    }

    #[test]
    fn names_are_composed_and_trimmed() {
        let data = json!({"commandResponse": [
            {"parameters": {"queue": "  CAFE\u{0301}.IN  ", "CURDEPTH": 1}},
            {"parameters": {"queue": "CAF\u{00C9}.IN", "CURDEPTH": 2}},
            {"parameters": {"queue": "\t\n"}}
        ]});
        assert_eq!(
            Normalizer::default().normalize(Some(&data)),
            vec![entry("CAF\u{00C9}.IN", Some(2))]
        );
    }

    #[test]
    fn name_field_fallback_follows_presence_rules() {
        let data = json!({"commandResponse": [
            {"parameters": {"queue": "", "name": "FROM.NAME"}},
            {"parameters": {"queue": null, "name": "ALSO.NAME"}},
            {"parameters": {"queue": {"nested": true}, "name": "SKIPPED"}}
        ]});
        let names = extract_candidates(&data)
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["FROM.NAME", "ALSO.NAME"]);
    }

    #[test]
    fn depth_coercion_is_lenient() {
        assert_eq!(coerce_depth(&json!(0)), Some(0));
        assert_eq!(coerce_depth(&json!(" 42 ")), Some(42));
        assert_eq!(coerce_depth(&json!(3.9)), Some(3));
        assert_eq!(coerce_depth(&json!(-1)), None);
        assert_eq!(coerce_depth(&json!("1.5")), None);
        assert_eq!(coerce_depth(&json!(true)), None);
        assert_eq!(coerce_depth(&json!(null)), None);
        assert_eq!(coerce_depth(&json!([1])), None);
    }

    #[test]
    fn first_present_depth_alias_wins_even_when_not_numeric() {
        let data = json!({"commandResponse": [
            {"parameters": {"queue": "DEV.Q", "CURDEPTH": "", "depth": 8}}
        ]});
        assert_eq!(extract_candidates(&data), vec![("DEV.Q".to_string(), None)]);
    }

    #[test]
    fn generic_walk_records_nested_mappings() {
        let data = json!({"name": "OUTER", "items": [
            {"queue": "DEV.A", "CURDEPTH": 1, "meta": {"name": "NESTED.LABEL"}}
        ]});
        assert_eq!(
            extract_candidates(&data),
            vec![
                ("OUTER".to_string(), None),
                ("DEV.A".to_string(), Some(1)),
                ("NESTED.LABEL".to_string(), None),
            ]
        );
    }

    #[test]
    fn null_or_nameless_payloads_produce_nothing() {
        let normalizer = Normalizer::default();
        assert!(normalizer.normalize(None).is_empty());
        assert!(normalizer.normalize(Some(&json!({"overallCompletionCode": 2}))).is_empty());
        assert!(normalizer.normalize(Some(&json!("text"))).is_empty());
        assert_eq!(detect_shape(&json!([])), None);
    }

    #[test]
    fn merge_keeps_first_spelling() {
        let out = merge_candidates(vec![
            ("Dev.Q".to_string(), Some(1)),
            ("DEV.Q".to_string(), Some(2)),
        ]);
        assert_eq!(out, vec![entry("Dev.Q", Some(2))]);
    }
}
