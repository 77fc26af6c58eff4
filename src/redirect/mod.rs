//! Entry-page dispatcher: date matching, suppression and the redirect itself.

pub mod builder;
pub mod dispatcher;
pub mod suppression;
pub mod today;

pub use builder::{build_redirect_url, BuildError};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use suppression::{decide, DispatchDecision, SuppressionSignals};
pub use today::{resolve_today, select_day};
