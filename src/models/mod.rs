pub mod cookie;
pub mod date_key;
pub mod rule;

pub use cookie::{parse_cookie_header, Cookie};
pub use date_key::{is_valid_date, DateFormat, DateKey, DateKeyError, EvaluationDay};
pub use rule::{RedirectRule, RuleMatch, RuleSet};
