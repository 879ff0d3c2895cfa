use crate::tiles::TileKind;
use crate::types::TileRequest;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum idea-text length carried into a cache key. Idea descriptions can
/// run to paragraphs; keys must stay bounded.
pub const MAX_IDEA_KEY_LEN: usize = 120;

/// Deterministic cache key for one (idea, kind, filters) tuple.
///
/// Format: `<kind>-cache:<idea>|k=v|k2=v2`. Filter keys are sorted before
/// serialization, so two requests with equal semantic parameters always
/// produce the same key. Idea text is lowercased, whitespace-collapsed and
/// truncated to [`MAX_IDEA_KEY_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn build(kind: &TileKind, idea_text: &str, filters: &BTreeMap<String, Value>) -> Self {
        let mut key = format!("{}-cache:{}", kind.as_str(), fold_idea(idea_text));
        for (name, value) in filters {
            key.push('|');
            key.push_str(name);
            key.push('=');
            key.push_str(&render_value(value));
        }
        CacheKey(key)
    }

    pub fn for_request(request: &TileRequest) -> Self {
        Self::build(&request.kind, &request.idea_text, &request.filters)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-fold and bound the idea text so trivial input variations (casing,
/// runs of whitespace) hit the same entry.
fn fold_idea(text: &str) -> String {
    let folded = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    folded.chars().take(MAX_IDEA_KEY_LEN).collect()
}

/// Strings render bare (`region=eu`); everything else uses its JSON form.
/// JSON objects serialize with sorted keys, so nested values stay stable.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
