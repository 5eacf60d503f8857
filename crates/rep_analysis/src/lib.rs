pub mod aggregate;
pub mod alert;
pub mod pipeline;
pub mod relevance;

pub use aggregate::{aggregate, aggregate_at};
pub use alert::{decide, render_message, AlertDispatcher};
pub use pipeline::{Collaborators, Pipeline, RunReport};
pub use relevance::{FilterOutcome, RelevanceFilter};

pub mod prelude {
    pub use super::pipeline::{Collaborators, Pipeline, RunReport};
    pub use rep_core::{AlertOutcome, Degradation, ReputationScore, StopReason};
}
