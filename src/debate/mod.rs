// Debate domain: wire types and provider message construction

pub mod compose;
pub mod types;

pub use compose::{plan, ComposeError, DebatePlan};
pub use types::{
    Action, DebateRequest, DebateResponse, DebateSetup, ErrorBody, Lens, QuickAction, Template,
    Turn, TurnRole,
};
