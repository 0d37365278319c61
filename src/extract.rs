// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Locates the `Drupal.settings` object embedded in a profile page.
//!
//! Profile pages initialise their frontend with
//! `jQuery.extend(Drupal.settings, { ... });`. The object literal is captured
//! with a depth-tracking scan rather than a greedy pattern so trailing scripts
//! never leak into the capture.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ExtractError;

static SETTINGS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"jQuery\.extend\(\s*Drupal\.settings\s*,\s*").expect("valid regex")
});

/// Key that identifies the settings block carrying rating data.
const RATING_KEY: &str = "date_versus_rating";

/// Extract the embedded settings object from `page`.
///
/// Pages may carry several `Drupal.settings` extensions; the first one holding
/// rating data wins, otherwise the first one found. A marker whose argument is
/// not an object literal is skipped. Any captured object that is not valid
/// JSON fails the extraction.
pub fn extract_settings(page: &str) -> Result<Value, ExtractError> {
    let mut first_parsed: Option<Value> = None;

    for marker in SETTINGS_MARKER.find_iter(page) {
        let rest = &page[marker.end()..];
        let Some(object) = extract_balanced_object(rest) else {
            continue;
        };

        let value = serde_json::from_str::<Value>(object).map_err(|err| {
            tracing::debug!(error = %err, "embedded settings block is not valid JSON");
            ExtractError::JsonParseFailure(err)
        })?;

        if value.get(RATING_KEY).is_some() {
            return Ok(value);
        }
        first_parsed.get_or_insert(value);
    }

    first_parsed.ok_or(ExtractError::MarkerNotFound)
}

/// Return the shortest prefix of `s` that forms a complete `{...}` object.
///
/// Tracks brace depth while skipping over string literals and their escape
/// sequences. `None` when `s` does not start with `{` or never closes.
fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
