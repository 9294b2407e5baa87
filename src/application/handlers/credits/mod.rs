//! Credit balance handlers: the decay sweep and the summary query.

mod consume_credits;
mod get_credit_summary;

pub use consume_credits::{ConsumeCreditsHandler, SweepReport};
pub use get_credit_summary::{CreditSummary, GetCreditSummaryHandler, GetCreditSummaryQuery};
