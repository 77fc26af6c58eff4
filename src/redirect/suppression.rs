use serde::Serialize;

use crate::config::DispatcherConfig;
use crate::models::EvaluationDay;
use crate::protocol;

/// What the page told us before any date logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuppressionSignals {
    /// `no-redirect` is in the current URL.
    pub opt_out: bool,
    /// The suppression cookie is live.
    pub suppressed: bool,
}

/// Outcome of one dispatcher evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum DispatchDecision {
    /// No rules configured; nothing is read or written.
    NoRules,
    /// Visitor opted out. Suppression cookie is (re)written.
    OptOut,
    /// Suppression cookie already present.
    Suppressed,
    /// Today matches a rule with a usable destination.
    Redirect {
        day: String,
        key: String,
        destination: String,
    },
    /// Today matches a rule, but its destination is not an http(s) URL.
    InvalidDestination {
        day: String,
        key: String,
        destination: String,
    },
    NoMatch {
        day: String,
    },
}

impl DispatchDecision {
    /// Decisions that must leave a suppression cookie behind.
    pub fn writes_suppression(&self) -> bool {
        matches!(self, Self::OptOut | Self::Redirect { .. })
    }
}

/// Walk the suppression table in order. `today` is only evaluated once both
/// suppression checks have passed.
pub fn decide(
    config: &DispatcherConfig,
    signals: SuppressionSignals,
    today: impl FnOnce() -> EvaluationDay,
) -> DispatchDecision {
    if config.rules.is_empty() {
        return DispatchDecision::NoRules;
    }
    if signals.opt_out {
        return DispatchDecision::OptOut;
    }
    if signals.suppressed {
        return DispatchDecision::Suppressed;
    }

    let today = today();
    let day = today.format(config.date_format);
    match config.rules.lookup(&today) {
        Some(hit) if protocol::navigable_url(hit.destination).is_some() => {
            DispatchDecision::Redirect {
                day,
                key: hit.key.to_string(),
                destination: hit.destination.to_string(),
            }
        }
        Some(hit) => DispatchDecision::InvalidDestination {
            day,
            key: hit.key.to_string(),
            destination: hit.destination.to_string(),
        },
        None => DispatchDecision::NoMatch { day },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatcherSettings;
    use crate::models::DateFormat;

    fn config() -> DispatcherConfig {
        DispatcherSettings::with_rules([
            ("2024-12-03", "https://support.example.org/donate?tx=ABC"),
            ("12-31", "javascript:alert(1)"),
        ])
        .try_into()
        .unwrap()
    }

    fn day(input: &str) -> EvaluationDay {
        EvaluationDay::parse(input, DateFormat::Iso).unwrap()
    }

    #[test]
    fn test_opt_out_wins_over_match() {
        let signals = SuppressionSignals {
            opt_out: true,
            suppressed: true,
        };
        let decision = decide(&config(), signals, || day("2024-12-03"));
        assert_eq!(decision, DispatchDecision::OptOut);
        assert!(decision.writes_suppression());
    }

    #[test]
    fn test_suppressed_skips_date_logic() {
        let signals = SuppressionSignals {
            opt_out: false,
            suppressed: true,
        };
        let decision = decide(&config(), signals, || panic!("date must not be evaluated"));
        assert_eq!(decision, DispatchDecision::Suppressed);
        assert!(!decision.writes_suppression());
    }

    #[test]
    fn test_match_redirects() {
        let decision = decide(&config(), SuppressionSignals::default(), || day("2024-12-03"));
        assert_eq!(
            decision,
            DispatchDecision::Redirect {
                day: "2024-12-03".to_string(),
                key: "2024-12-03".to_string(),
                destination: "https://support.example.org/donate?tx=ABC".to_string(),
            }
        );
        assert!(decision.writes_suppression());
    }

    #[test]
    fn test_non_http_destination_is_not_a_match() {
        let decision = decide(&config(), SuppressionSignals::default(), || day("2025-12-31"));
        assert!(matches!(decision, DispatchDecision::InvalidDestination { .. }));
        assert!(!decision.writes_suppression());
    }

    #[test]
    fn test_no_match() {
        let decision = decide(&config(), SuppressionSignals::default(), || day("2024-12-04"));
        assert_eq!(
            decision,
            DispatchDecision::NoMatch {
                day: "2024-12-04".to_string()
            }
        );
    }

    #[test]
    fn test_empty_rules_ignore_opt_out() {
        let empty: DispatcherConfig =
            DispatcherSettings::with_rules(Vec::<(String, String)>::new())
                .try_into()
                .unwrap();
        let signals = SuppressionSignals {
            opt_out: true,
            suppressed: false,
        };
        assert_eq!(decide(&empty, signals, || day("2024-12-03")), DispatchDecision::NoRules);
    }
}
