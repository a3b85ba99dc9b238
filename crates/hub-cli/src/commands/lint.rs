//! Lint command implementation
//!
//! Validates a remote-config template before it is published: shape of the
//! context table, typed keys, and gzipped size.

use std::fmt;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use flate2::Compression;
use flate2::write::GzEncoder;
use hub_core::{RemoteValues, is_valid_hex_color, keys};
use serde_json::Value;

use crate::error::{CliError, Result};
use crate::template::{CONTEXTS_KEY, read_document};

/// One problem found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Slash-separated location, `<root>` for the document itself
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Check the structure and typed keys of a template.
pub fn validate_template(document: &Value) -> Vec<Violation> {
    let Some(root) = document.as_object() else {
        return vec![Violation::new("<root>", "template must be a JSON object")];
    };
    let Some(contexts) = root.get(CONTEXTS_KEY) else {
        return vec![Violation::new("<root>", "missing \"contexts\" object")];
    };
    let Some(contexts) = contexts.as_object() else {
        return vec![Violation::new(CONTEXTS_KEY, "must be an object")];
    };

    let mut violations = Vec::new();
    for (id, entry) in contexts {
        let at = format!("{CONTEXTS_KEY}/{id}");
        match entry.as_object() {
            Some(entry) => {
                let values: RemoteValues = entry
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                check_entry(&at, &values, &mut violations);
            }
            None => violations.push(Violation::new(at, "context entry must be an object")),
        }
    }
    violations
}

fn check_entry(at: &str, values: &RemoteValues, violations: &mut Vec<Violation>) {
    if let Some(color) = values.get(keys::THEME_COLOR) {
        let valid = color.as_str().is_some_and(is_valid_hex_color);
        if !valid {
            violations.push(Violation::new(
                format!("{at}/{}", keys::THEME_COLOR),
                format!("{color} is not a #RRGGBB color"),
            ));
        }
    }

    if values.get(keys::FEATURE_LIST).is_some_and(|list| !is_string_array(list)) {
        violations.push(Violation::new(
            format!("{at}/{}", keys::FEATURE_LIST),
            "must be a JSON array of strings",
        ));
    }

    for key in [keys::DATA_LIMIT, keys::TTL_SECONDS] {
        if values.get(key).is_some() && values.int(key).is_none() {
            violations.push(Violation::new(format!("{at}/{key}"), "must be an integer"));
        }
    }
    for key in [keys::PRIORITY_SUPPORT, keys::KILL_SWITCH] {
        if values.get(key).is_some() && values.bool(key).is_none() {
            violations.push(Violation::new(format!("{at}/{key}"), "must be a boolean"));
        }
    }
}

/// An inline array of strings, or a string holding one.
fn is_string_array(value: &Value) -> bool {
    let all_strings = |items: &Vec<Value>| items.iter().all(Value::is_string);
    match value {
        Value::Array(items) => all_strings(items),
        Value::String(raw) => matches!(
            serde_json::from_str::<Value>(raw),
            Ok(Value::Array(items)) if all_strings(&items)
        ),
        _ => false,
    }
}

/// Set `meta_config_version` at the top level and in every context entry.
///
/// Returns the version written.
pub fn bump_version(document: &mut Value, now: DateTime<Utc>) -> String {
    let version = now.to_rfc3339_opts(SecondsFormat::Secs, false);

    if let Some(root) = document.as_object_mut() {
        root.insert(keys::META_VERSION.to_string(), Value::from(version.clone()));
        if let Some(contexts) = root.get_mut(CONTEXTS_KEY).and_then(Value::as_object_mut) {
            for entry in contexts.values_mut().filter_map(Value::as_object_mut) {
                entry.insert(keys::META_VERSION.to_string(), Value::from(version.clone()));
            }
        }
    }
    version
}

/// Size in bytes of the gzipped compact serialization, as the backend
/// measures a published template.
pub fn gzipped_size(document: &Value) -> Result<usize> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(document)?)?;
    Ok(encoder.finish()?.len())
}

/// Run the lint command.
pub fn run_lint(template: &Path, bump: bool, write: bool, max_bytes: usize) -> Result<()> {
    let mut document = read_document(template)?;

    let mut violations = validate_template(&document);
    if violations.is_empty() {
        println!("{} Template structure is valid", "ok".green().bold());
    } else {
        println!("{} Template validation failed:", "x".red().bold());
        for violation in &violations {
            println!("  - {}", violation);
        }
    }

    if bump {
        let version = bump_version(&mut document, Utc::now());
        println!("{} Bumped {} to {}", "^".cyan(), keys::META_VERSION, version.cyan());
    }

    let size = gzipped_size(&document)?;
    if size <= max_bytes {
        println!(
            "{} Gzipped size = {} bytes (limit {})",
            "ok".green().bold(),
            size,
            max_bytes
        );
    } else {
        println!(
            "{} Gzipped size = {} bytes (limit {})",
            "x".red().bold(),
            size,
            max_bytes
        );
        violations.push(Violation::new(
            "<root>",
            format!("{size} gzipped bytes exceeds the {max_bytes} byte limit"),
        ));
    }

    if !violations.is_empty() {
        return Err(CliError::user(format!(
            "{} problem(s) found in {}",
            violations.len(),
            template.display()
        )));
    }

    if write {
        let content = serde_json::to_string_pretty(&document)?;
        hub_fs::write_atomic(template, content.as_bytes())?;
        tracing::debug!(path = %template.display(), "Wrote template");
        println!("{} Wrote {}", "+".green(), template.display());
    } else if bump {
        println!("  {} (use {} to save)", "Not written".dimmed(), "--write".cyan());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DEFAULT_MAX_TEMPLATE_BYTES;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn paths(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn valid_template_has_no_violations() {
        let doc = json!({
            "contexts": {
                "acme_business": {
                    "plan_displayName": "Acme",
                    "plan_themeColor": "#0A84FF",
                    "plan_data_limit": "500",
                    "plan_priority_support": "true",
                    "kill_switch": false,
                    "meta_ttl_seconds": 3600,
                    "plan_feature_list": "[\"billing_portal\"]"
                },
                "acme_personal": {
                    "plan_feature_list": ["support_chat"]
                }
            }
        });
        assert!(validate_template(&doc).is_empty());
    }

    #[rstest]
    #[case(json!([]), "<root>")]
    #[case(json!({}), "<root>")]
    #[case(json!({ "contexts": [] }), "contexts")]
    fn malformed_root(#[case] doc: Value, #[case] at: &str) {
        assert_eq!(paths(&validate_template(&doc)), vec![at]);
    }

    #[test]
    fn reports_each_bad_key() {
        let doc = json!({
            "contexts": {
                "a": 7,
                "b": {
                    "plan_themeColor": "blue",
                    "plan_feature_list": "[1, 2]",
                    "plan_data_limit": "lots",
                    "kill_switch": "maybe"
                }
            }
        });
        assert_eq!(
            paths(&validate_template(&doc)),
            vec![
                "contexts/a",
                "contexts/b/plan_themeColor",
                "contexts/b/plan_feature_list",
                "contexts/b/plan_data_limit",
                "contexts/b/kill_switch",
            ]
        );
    }

    #[test]
    fn bump_sets_top_level_and_per_context() {
        let mut doc = json!({
            "contexts": { "a": {}, "b": { "meta_config_version": "old" }, "c": 1 }
        });
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();

        let version = bump_version(&mut doc, now);

        assert_eq!(version, "2026-03-04T05:06:07+00:00");
        assert_eq!(doc["meta_config_version"], version);
        assert_eq!(doc["contexts"]["a"]["meta_config_version"], version);
        assert_eq!(doc["contexts"]["b"]["meta_config_version"], version);
        assert_eq!(doc["contexts"]["c"], 1);
    }

    fn gzip_len(bytes: &[u8]) -> usize {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap().len()
    }

    /// Many near-identical contexts: large when compact, small once gzipped.
    fn repetitive_template(count: usize) -> Value {
        let contexts: serde_json::Map<String, Value> = (0..count)
            .map(|i| {
                (
                    format!("tenant_{i:04}"),
                    json!({
                        "plan_displayName": "Acme Business",
                        "plan_themeColor": "#0A84FF",
                        "plan_data_limit": 500,
                        "plan_feature_list": "[\"billing_portal\", \"support_chat\"]",
                        "meta_config_version": "biz-v7"
                    }),
                )
            })
            .collect();
        json!({ "contexts": contexts })
    }

    #[test]
    fn gzipped_size_measures_the_compact_form() {
        let doc: Value = serde_json::from_str("{ \"a\" :  [1, 2] }").unwrap();
        assert_eq!(gzipped_size(&doc).unwrap(), gzip_len(b"{\"a\":[1,2]}"));
    }

    #[test]
    fn repetitive_template_fits_limit_once_compressed() {
        let doc = repetitive_template(200);
        let limit = DEFAULT_MAX_TEMPLATE_BYTES;

        assert!(serde_json::to_vec(&doc).unwrap().len() > limit);
        assert!(gzipped_size(&doc).unwrap() <= limit);
    }

    #[test]
    fn lint_accepts_template_over_limit_only_before_compression() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.json");
        std::fs::write(&path, serde_json::to_vec(&repetitive_template(200)).unwrap()).unwrap();

        run_lint(&path, false, false, DEFAULT_MAX_TEMPLATE_BYTES).unwrap();
    }
}
