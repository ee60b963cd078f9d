//! Best-effort structured decode of free-form model text.
//!
//! Models asked for "only a JSON object" still wrap it in prose, code
//! fences, or trailing commentary often enough that every extraction site
//! needs the same recovery: take the span from the first `{` to the last
//! `}` and parse only that.  This module is the single home for that
//! contract.

use serde_json::Value;

/// Extract and parse the outermost JSON object embedded in `raw`.
///
/// Contract: the candidate span runs from the first `{` to the last `}`
/// (inclusive).  Returns `None` when no such span exists, when the span is
/// not valid JSON, or when it parses to something other than an object.
/// Callers treat `None` as "apply the documented fallback", never as an
/// error.
pub fn decode_object(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let candidate = &raw[start..=end];
    match serde_json::from_str::<Value>(candidate) {
        Ok(v) if v.is_object() => Some(v),
        _ => None,
    }
}

/// Fetch a string field from a decoded object, trimmed, `None` when the
/// field is absent, null, or blank.
pub fn string_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_decodes() {
        let v = decode_object(r#"{"text": "Buy milk", "due": null}"#).unwrap();
        assert_eq!(v["text"], "Buy milk");
    }

    #[test]
    fn surrounding_commentary_is_tolerated() {
        let raw = "Sure! Here is the JSON you asked for:\n{\"title\": \"Coffee\"}\nLet me know!";
        let v = decode_object(raw).unwrap();
        assert_eq!(v["title"], "Coffee");
    }

    #[test]
    fn code_fences_are_tolerated() {
        let raw = "```json\n{\"text\": \"Pay rent\"}\n```";
        let v = decode_object(raw).unwrap();
        assert_eq!(v["text"], "Pay rent");
    }

    #[test]
    fn no_braces_yields_none() {
        assert!(decode_object("I could not produce JSON for that.").is_none());
        assert!(decode_object("").is_none());
    }

    #[test]
    fn malformed_span_yields_none() {
        assert!(decode_object("{not json at all}").is_none());
    }

    #[test]
    fn reversed_braces_yield_none() {
        assert!(decode_object("} oops {").is_none());
    }

    #[test]
    fn non_object_json_yields_none() {
        // The span is valid JSON but not an object; still a fallback case.
        assert!(decode_object("[1, 2, 3]").is_none());
    }

    #[test]
    fn stray_brace_after_object_spoils_the_span() {
        // The span runs to the LAST `}`, so trailing braces break the parse.
        // This is the documented contract, matching the extraction sites'
        // tolerance for fenced output but not for arbitrary brace noise.
        assert!(decode_object("{\"a\": 1} trailing }").is_none());
    }

    #[test]
    fn string_field_filters_blank_and_null() {
        let v = decode_object(r#"{"a": "  x ", "b": "", "c": null}"#).unwrap();
        assert_eq!(string_field(&v, "a").as_deref(), Some("x"));
        assert_eq!(string_field(&v, "b"), None);
        assert_eq!(string_field(&v, "c"), None);
        assert_eq!(string_field(&v, "missing"), None);
    }
}
