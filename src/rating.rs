// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Interpretation of the embedded rating history.
//!
//! The settings object is validated once into a [`RatingHistory`]; the
//! summary numbers are then derived from the already-coerced ratings.

use serde_json::Value;

use crate::error::InterpretError;
use crate::model::{RatingStatus, RatingSummary};

/// Validated view of `date_versus_rating.all`.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingHistory {
    Unrated,
    Rated {
        /// Contest entries exactly as they appeared upstream, oldest first.
        entries: Vec<Value>,
        /// Coerced `rating` of each entry, same order as `entries`.
        ratings: Vec<i64>,
    },
}

impl RatingHistory {
    /// Validate the settings object. Missing or empty history is `Unrated`.
    pub fn from_settings(settings: &Value) -> Result<Self, InterpretError> {
        let section = match settings.get("date_versus_rating") {
            None | Some(Value::Null) => return Ok(Self::Unrated),
            Some(Value::Object(section)) => section,
            Some(_) => {
                return Err(InterpretError::MalformedData(
                    "date_versus_rating is not an object".to_string(),
                ))
            }
        };

        let entries = match section.get("all") {
            None | Some(Value::Null) => return Ok(Self::Unrated),
            Some(Value::Array(entries)) if entries.is_empty() => return Ok(Self::Unrated),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(InterpretError::MalformedData(
                    "date_versus_rating.all is not an array".to_string(),
                ))
            }
        };

        let ratings = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .get("rating")
                    .and_then(coerce_rating)
                    .ok_or_else(|| {
                        InterpretError::MalformedData(format!(
                            "contest entry {index} has no usable rating"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Rated {
            entries: entries.clone(),
            ratings,
        })
    }

    /// Build the response payload for `username`.
    pub fn into_summary(self, username: &str) -> RatingSummary {
        match self {
            Self::Unrated => RatingSummary::unrated(username),
            Self::Rated { entries, ratings } => {
                // `Rated` is only built from a non-empty history.
                let current_rating = ratings.last().copied().unwrap_or_default();
                let peak_rating = ratings.iter().copied().max().unwrap_or_default();

                RatingSummary {
                    username: username.to_string(),
                    status: RatingStatus::Success,
                    current_rating,
                    peak_rating,
                    rating_history: Some(entries),
                }
            }
        }
    }
}

/// Interpret the settings object into a summary for `username`.
pub fn interpret(settings: &Value, username: &str) -> Result<RatingSummary, InterpretError> {
    RatingHistory::from_settings(settings).map(|history| history.into_summary(username))
}

/// Coerce an upstream rating to an integer.
///
/// Accepts JSON integers, floats without a fractional part, and strings holding
/// a base-10 integer. Everything else is rejected.
pub fn coerce_rating(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Some(int);
            }
            let float = number.as_f64()?;
            (float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64)
                .then_some(float as i64)
        }
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn settings_with(all: Value) -> Value {
        json!({ "date_versus_rating": { "all": all } })
    }

    #[test]
    fn summarises_string_ratings() {
        let settings = settings_with(json!([
            {"rating": "1200"},
            {"rating": "1450"},
            {"rating": "1380"}
        ]));

        let summary = interpret(&settings, "gennady").expect("interpreted");

        assert_eq!(summary.status, RatingStatus::Success);
        assert_eq!(summary.current_rating, 1380);
        assert_eq!(summary.peak_rating, 1450);
        assert_eq!(summary.rating_history.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn passes_entries_through_verbatim() {
        let entries = json!([
            {"code": "START01", "rating": 1500, "rank": "12", "name": "Starters 1"},
            {"code": "START02", "rating": "1620", "color": "#ffbf00"}
        ]);

        let summary = interpret(&settings_with(entries.clone()), "tourist").expect("interpreted");

        assert_eq!(summary.current_rating, 1620);
        assert_eq!(summary.peak_rating, 1620);
        assert_eq!(
            summary.rating_history,
            Some(entries.as_array().cloned().unwrap())
        );
    }

    #[test]
    fn single_entry_is_both_current_and_peak() {
        let summary =
            interpret(&settings_with(json!([{"rating": 1000}])), "solo").expect("interpreted");
        assert_eq!(summary.current_rating, 1000);
        assert_eq!(summary.peak_rating, 1000);
    }

    #[test]
    fn missing_or_empty_history_is_unrated() {
        for settings in [
            json!({}),
            json!({"date_versus_rating": null}),
            json!({"date_versus_rating": {}}),
            json!({"date_versus_rating": {"all": null}}),
            json!({"date_versus_rating": {"all": []}}),
        ] {
            let history = RatingHistory::from_settings(&settings).expect("valid shape");
            assert_eq!(history, RatingHistory::Unrated, "settings: {settings}");
        }

        let summary = interpret(&json!({"date_versus_rating": {}}), "newuser").expect("ok");
        assert_eq!(summary.status, RatingStatus::Unrated);
        assert_eq!(summary.current_rating, 0);
        assert_eq!(summary.peak_rating, 0);
        assert!(summary.rating_history.is_none());
    }

    #[test]
    fn unusable_ratings_are_malformed() {
        for all in [
            json!([{"rating": "1200"}, {"code": "X"}]),
            json!([{"rating": "twelve hundred"}]),
            json!([{"rating": 1200.5}]),
            json!([{"rating": null}]),
            json!([{"rating": true}]),
            json!(["1200"]),
        ] {
            let err = interpret(&settings_with(all.clone()), "broken").expect_err("malformed");
            assert!(matches!(err, InterpretError::MalformedData(_)), "all: {all}");
        }
    }

    #[test]
    fn wrong_container_types_are_malformed() {
        assert!(RatingHistory::from_settings(&json!({"date_versus_rating": []})).is_err());
        assert!(RatingHistory::from_settings(&settings_with(json!({"0": {}}))).is_err());
    }

    #[test]
    fn coercion_accepts_integer_forms() {
        assert_eq!(coerce_rating(&json!(1450)), Some(1450));
        assert_eq!(coerce_rating(&json!(1450.0)), Some(1450));
        assert_eq!(coerce_rating(&json!("1450")), Some(1450));
        assert_eq!(coerce_rating(&json!(" -7 ")), Some(-7));
        assert_eq!(coerce_rating(&json!("+12")), Some(12));
        assert_eq!(coerce_rating(&json!("")), None);
        assert_eq!(coerce_rating(&json!("14.5")), None);
    }

    #[test]
    fn coercion_rejects_floats_outside_i64() {
        // 2^63 is exactly representable as f64 but not as i64.
        assert_eq!(coerce_rating(&json!(9_223_372_036_854_775_808.0_f64)), None);
        assert_eq!(coerce_rating(&json!(-9_223_372_036_854_775_808.0_f64)), Some(i64::MIN));
        assert_eq!(coerce_rating(&json!(1e19)), None);
    }

    #[test]
    fn current_is_last_and_peak_is_max() {
        let ratings = [1500, 1720, 1690, 1455, 1801, 1600];
        let all: Vec<Value> = ratings.iter().map(|r| json!({"rating": r})).collect();

        let summary = interpret(&settings_with(Value::Array(all)), "climber").expect("ok");

        assert_eq!(summary.current_rating, 1600);
        assert_eq!(summary.peak_rating, 1801);
    }
}
