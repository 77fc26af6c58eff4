use chrono::NaiveDate;
use tracing::{debug, info};
use url::Url;

use crate::host::Clock;
use crate::models::{DateFormat, EvaluationDay};
use crate::protocol::{self, SIMULATE_DATE_PARAM};

/// Pick the day to evaluate: a valid `simulated` value in the active format,
/// otherwise `real`. An unusable override never fails the caller.
pub fn select_day(simulated: Option<&str>, format: DateFormat, real: NaiveDate) -> EvaluationDay {
    if let Some(raw) = simulated {
        match EvaluationDay::parse(raw, format) {
            Ok(day) => {
                info!(simulate_date = %raw, "using simulated date");
                return day;
            }
            Err(err) => {
                debug!(simulate_date = %raw, error = %err, "ignoring simulate-date, using real date");
            }
        }
    }
    EvaluationDay::from_date(real)
}

/// Resolve "today" for a page at `location`.
pub fn resolve_today(location: &Url, format: DateFormat, clock: &dyn Clock) -> EvaluationDay {
    let simulated = protocol::param(location, SIMULATE_DATE_PARAM);
    select_day(simulated.as_deref(), format, clock.local_date())
}
