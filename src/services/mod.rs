pub mod assist;

pub use assist::{AssistClient, ProfileFacts, ProfileSummary};
