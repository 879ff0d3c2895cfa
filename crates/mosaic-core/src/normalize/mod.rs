//! Converts heterogeneous backend JSON into the canonical [`TileData`] shape.
//!
//! Backends wrap payloads inconsistently (under a tile-kind-named key, under
//! `data`, or not at all), spell fields differently per function, and mix
//! confidence scales. Everything tolerant lives here so the rest of the
//! engine only ever sees one shape. Deterministic and pure: no I/O, same
//! input always yields the same output, missing fields degrade to defaults.

mod rules;

use crate::tiles::TileKind;
use crate::types::{Chart, Citation, DataQuality, Explanation, TileData};
use rules::TileRule;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Top-level fields every rule lifts, regardless of kind.
const COMMON_FIELDS: &[&str] = &[
    "explanation",
    "summary",
    "citations",
    "sources",
    "charts",
    "confidence",
    "dataQuality",
    "data_quality",
];

/// Normalize a raw backend response for one tile kind.
pub fn normalize(kind: &TileKind, raw: &Value) -> TileData {
    let rule = rules::rule_for(kind);
    let payload = unwrap_envelope(kind, rule, raw);
    build(rule, payload)
}

/// Peel a response envelope: try the tile-kind-named key (snake and camel
/// spellings), then `data`, then the value itself. The first candidate
/// carrying a recognizable payload marker wins.
fn unwrap_envelope<'a>(kind: &TileKind, rule: &TileRule, raw: &'a Value) -> &'a Value {
    let Some(obj) = raw.as_object() else {
        return raw;
    };
    let camel = camel_case(kind.as_str());
    for key in [kind.as_str(), camel.as_str(), "data"] {
        if let Some(inner) = obj.get(key) {
            if looks_like_payload(rule, inner) {
                return inner;
            }
        }
    }
    raw
}

/// A candidate is a payload when it carries `metrics`, `score`, or any
/// field the kind's rule knows.
fn looks_like_payload(rule: &TileRule, value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.contains_key("metrics") || obj.contains_key("score") || obj.keys().any(|k| rule.knows(k))
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn build(rule: &TileRule, payload: &Value) -> TileData {
    let empty = Map::new();
    let obj = payload.as_object().unwrap_or(&empty);
    let mut consumed: HashSet<&str> = HashSet::new();

    let mut data = TileData {
        metrics: extract_metrics(rule, obj, &mut consumed),
        explanation: lift_explanation(obj, &mut consumed),
        citations: lift_citations(obj, &mut consumed),
        charts: lift_charts(rule, obj, &mut consumed),
        confidence: lift_confidence(obj, &mut consumed),
        data_quality: lift_quality(obj, &mut consumed),
        extra: Map::new(),
    };

    // Data arrived but nothing structured could be extracted: emit one
    // placeholder metric so downstream can tell this apart from "no data".
    if data.metrics.is_empty() {
        data.metrics.insert("unstructured".into(), Value::Bool(true));
    }

    // Everything the rule did not recognize passes through verbatim.
    for (key, value) in obj {
        if !consumed.contains(key.as_str()) {
            data.extra.insert(key.clone(), value.clone());
        }
    }

    data
}

fn extract_metrics<'a>(
    rule: &'a TileRule,
    obj: &'a Map<String, Value>,
    consumed: &mut HashSet<&'a str>,
) -> Map<String, Value> {
    let mut metrics = Map::new();

    // A payload already carrying a canonical metrics object seeds the map.
    if let Some(seed) = obj.get("metrics").and_then(Value::as_object) {
        metrics.extend(seed.clone());
        consumed.insert("metrics");
    }

    for field in rule.fields {
        let found = field
            .aliases
            .iter()
            .find_map(|alias| obj.get(*alias).map(|v| (*alias, v)));
        match found {
            Some((alias, value)) => {
                consumed.insert(alias);
                metrics.insert(field.name.to_string(), value.clone());
            }
            None => {
                if field.default_zero && !metrics.contains_key(field.name) {
                    metrics.insert(field.name.to_string(), Value::from(0));
                }
            }
        }
    }

    metrics
}

fn lift_explanation<'a>(
    obj: &'a Map<String, Value>,
    consumed: &mut HashSet<&'a str>,
) -> Explanation {
    if let Some(value) = obj.get("explanation") {
        consumed.insert("explanation");
        return match value {
            Value::String(s) => Explanation::from(s.clone()),
            Value::Object(m) => Explanation {
                summary: str_field(m, "summary").unwrap_or_default(),
                meaning: str_field(m, "meaning"),
            },
            _ => Explanation::default(),
        };
    }
    if let Some(summary) = obj.get("summary").and_then(Value::as_str) {
        consumed.insert("summary");
        return Explanation::from(summary.to_string());
    }
    Explanation::default()
}

fn lift_citations<'a>(
    obj: &'a Map<String, Value>,
    consumed: &mut HashSet<&'a str>,
) -> Vec<Citation> {
    let source = ["citations", "sources"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array).map(|a| (*key, a)));
    let Some((key, items)) = source else {
        return Vec::new();
    };
    consumed.insert(key);

    items
        .iter()
        .filter_map(|item| {
            let m = item.as_object()?;
            let url = str_field(m, "url").or_else(|| str_field(m, "link"));
            let title = str_field(m, "title");
            // A citation needs something to point at
            if url.is_none() && title.is_none() {
                return None;
            }
            Some(Citation {
                url: url.unwrap_or_default(),
                title: title.unwrap_or_default(),
                source: str_field(m, "source")
                    .or_else(|| str_field(m, "site"))
                    .unwrap_or_default(),
                relevance: num_field(m, "relevance").map(unit_scale).unwrap_or(0.0),
            })
        })
        .collect()
}

fn lift_charts<'a>(
    rule: &'a TileRule,
    obj: &'a Map<String, Value>,
    consumed: &mut HashSet<&'a str>,
) -> Vec<Chart> {
    let mut charts = Vec::new();

    if let Some(items) = obj.get("charts").and_then(Value::as_array) {
        consumed.insert("charts");
        for item in items {
            let Some(m) = item.as_object() else { continue };
            let chart_type = str_field(m, "type")
                .or_else(|| str_field(m, "chart_type"))
                .unwrap_or_else(|| "line".to_string());
            charts.push(Chart {
                chart_type,
                title: str_field(m, "title").unwrap_or_default(),
                series: m
                    .get("series")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                labels: string_array(m.get("labels")),
            });
        }
    }

    // Kind-specific time series lift into a line chart.
    for series in rule.series {
        if let Some(points) = obj.get(series.key).and_then(Value::as_array) {
            consumed.insert(series.key);
            if let Some(chart) = chart_from_points(series.title, points) {
                charts.push(chart);
            }
        }
    }

    charts
}

/// Build a line chart from a raw series: either plain numbers, or point
/// objects carrying a value and an optional label.
fn chart_from_points(title: &str, points: &[Value]) -> Option<Chart> {
    if points.is_empty() {
        return None;
    }

    let mut series = Vec::with_capacity(points.len());
    let mut labels = Vec::new();
    for point in points {
        match point {
            Value::Number(_) => series.push(point.clone()),
            Value::Object(m) => {
                let value = m.get("value").or_else(|| m.get("count"))?;
                series.push(value.clone());
                if let Some(label) = str_field(m, "label")
                    .or_else(|| str_field(m, "date"))
                    .or_else(|| str_field(m, "name"))
                {
                    labels.push(label);
                }
            }
            _ => return None,
        }
    }

    Some(Chart {
        chart_type: "line".to_string(),
        title: title.to_string(),
        series,
        labels,
    })
}

fn lift_confidence<'a>(obj: &'a Map<String, Value>, consumed: &mut HashSet<&'a str>) -> f64 {
    let Some(value) = obj.get("confidence").and_then(Value::as_f64) else {
        return 0.0;
    };
    consumed.insert("confidence");
    unit_scale(value)
}

/// Canonicalize onto 0.0–1.0: values above 1 are treated as percentages.
fn unit_scale(value: f64) -> f64 {
    let scaled = if value > 1.0 { value / 100.0 } else { value };
    scaled.clamp(0.0, 1.0)
}

fn lift_quality<'a>(obj: &'a Map<String, Value>, consumed: &mut HashSet<&'a str>) -> DataQuality {
    for key in ["dataQuality", "data_quality"] {
        if let Some(s) = obj.get(key).and_then(Value::as_str) {
            consumed.insert(key);
            return DataQuality::parse(s);
        }
    }
    DataQuality::Unknown
}

fn str_field(m: &Map<String, Value>, key: &str) -> Option<String> {
    m.get(key).and_then(Value::as_str).map(str::to_string)
}

fn num_field(m: &Map<String, Value>, key: &str) -> Option<f64> {
    m.get(key).and_then(Value::as_f64)
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
