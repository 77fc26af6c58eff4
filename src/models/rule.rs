use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ConfigError;
use crate::models::date_key::{DateKey, EvaluationDay};

/// A single date → destination mapping as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectRule {
    pub key: String,
    pub destination: String,
}

/// A rule picked for a particular day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub key: DateKey,
    pub destination: &'a str,
}

/// Validated, read-only rule set keyed by normalized date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<DateKey, RedirectRule>,
}

impl RuleSet {
    /// Build a rule set from configured `(date key, destination)` pairs.
    ///
    /// Every key must be a calendar-valid date, and no two keys may name the
    /// same day (`12-03-2024` and `2024-12-03` collide). Destinations are not
    /// checked here; an unusable destination only matters on the day it is
    /// picked.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut rules: BTreeMap<DateKey, RedirectRule> = BTreeMap::new();
        for (key, destination) in entries {
            let key = key.into();
            let parsed = DateKey::parse(&key)?;
            let rule = RedirectRule {
                key,
                destination: destination.into(),
            };
            if let Some(existing) = rules.get(&parsed) {
                return Err(ConfigError::DuplicateDateKey {
                    first: existing.key.clone(),
                    second: rule.key,
                });
            }
            rules.insert(parsed, rule);
        }
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &RedirectRule)> {
        self.rules.iter()
    }

    /// Configured keys as written, for diagnostics.
    pub fn configured_keys(&self) -> Vec<&str> {
        self.rules.values().map(|rule| rule.key.as_str()).collect()
    }

    /// Find the rule for `day`. An exact key beats a recurring key for the
    /// same month and day.
    pub fn lookup(&self, day: &EvaluationDay) -> Option<RuleMatch<'_>> {
        day.exact_key()
            .into_iter()
            .chain(std::iter::once(day.recurring_key()))
            .find_map(|key| {
                self.rules.get(&key).map(|rule| RuleMatch {
                    key,
                    destination: rule.destination.as_str(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::date_key::DateFormat;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> EvaluationDay {
        EvaluationDay::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_exact_key_beats_recurring() {
        let rules = RuleSet::from_entries([
            ("12-03", "https://example.org/recurring"),
            ("12-03-2024", "https://example.org/exact"),
        ])
        .unwrap();

        let hit = rules.lookup(&day(2024, 12, 3)).unwrap();
        assert_eq!(hit.destination, "https://example.org/exact");
        assert!(hit.key.is_exact());

        let other_year = rules.lookup(&day(2025, 12, 3)).unwrap();
        assert_eq!(other_year.destination, "https://example.org/recurring");
    }

    #[test]
    fn test_no_match() {
        let rules = RuleSet::from_entries([("2024-12-03", "https://example.org/a")]).unwrap();
        assert!(rules.lookup(&day(2024, 12, 4)).is_none());
        assert!(rules.lookup(&day(2025, 12, 3)).is_none());
    }

    #[test]
    fn test_simulated_month_day_only_matches_recurring() {
        let rules = RuleSet::from_entries([("2024-12-03", "https://example.org/exact")]).unwrap();
        let simulated = EvaluationDay::parse("12-03", DateFormat::Recurring).unwrap();
        assert!(rules.lookup(&simulated).is_none());
    }

    #[test]
    fn test_duplicate_day_in_two_shapes() {
        let err = RuleSet::from_entries([
            ("12-03-2024", "https://example.org/a"),
            ("2024-12-03", "https://example.org/b"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDateKey { .. }));
    }

    #[test]
    fn test_duplicate_reports_first_and_second_key() {
        let err = RuleSet::from_entries([
            ("12-31", "https://example.org/a"),
            ("2024-01-01", "https://example.org/b"),
            ("12-31", "https://example.org/c"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateDateKey {
                first: "12-31".to_string(),
                second: "12-31".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = RuleSet::from_entries([("02-30", "https://example.org/a")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDateKey(_)));
    }

    #[test]
    fn test_empty() {
        let rules = RuleSet::from_entries(Vec::<(String, String)>::new()).unwrap();
        assert!(rules.is_empty());
        assert!(rules.lookup(&day(2024, 1, 1)).is_none());
    }
}
