// Provider message list construction
//
// Turns a validated `DebateRequest` into the ordered role-tagged list sent to
// the completion provider. The list always starts with exactly one system
// entry, followed by one synthesized user instruction, then (for continue and
// quick) the history mapped turn by turn, then (for quick) the fixed
// quick-action instruction.

use thiserror::Error;

use super::types::{Action, DebateRequest, QuickAction, Turn, TurnRole};
use crate::config::{SamplingConfig, SamplingParams};
use crate::prompts;
use crate::providers::{ProviderMessage, ProviderRequest};

/// Reasons a request is rejected before any provider call
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No messages")]
    EmptyHistory,

    #[error("Missing quickAction for action \"quick\"")]
    MissingQuickAction,

    #[error("Unrecognized quickAction: {0}")]
    UnknownQuickAction(String),
}

/// A request resolved into everything needed for dispatch
#[derive(Debug, Clone)]
pub struct DebatePlan {
    pub action: Action,
    pub quick_action: Option<QuickAction>,
    pub messages: Vec<ProviderMessage>,
    pub sampling: SamplingParams,
}

impl DebatePlan {
    /// Build the provider request for this plan
    pub fn into_provider_request(self, model: &str, stream: bool) -> ProviderRequest {
        ProviderRequest::new(self.messages)
            .with_model(model)
            .with_temperature(self.sampling.temperature)
            .with_max_tokens(self.sampling.max_tokens)
            .with_stream(stream)
    }
}

/// Validate a request and build its provider message list
pub fn plan(request: &DebateRequest, sampling: &SamplingConfig) -> Result<DebatePlan, ComposeError> {
    validate_setup(request)?;

    let action = request.action();
    let history = request.history();

    match action {
        Action::Start => Ok(DebatePlan {
            action,
            quick_action: None,
            messages: start_messages(request),
            sampling: sampling.debate,
        }),
        Action::Continue => {
            if history.is_empty() {
                return Err(ComposeError::EmptyHistory);
            }
            Ok(DebatePlan {
                action,
                quick_action: None,
                messages: continue_messages(request),
                sampling: sampling.debate,
            })
        }
        Action::Quick => {
            let tag = request
                .quick_action
                .as_deref()
                .ok_or(ComposeError::MissingQuickAction)?;
            let quick = QuickAction::from_tag(tag)
                .ok_or_else(|| ComposeError::UnknownQuickAction(tag.to_string()))?;
            Ok(DebatePlan {
                action,
                quick_action: Some(quick),
                messages: quick_messages(request, quick),
                sampling: sampling.quick,
            })
        }
    }
}

fn validate_setup(request: &DebateRequest) -> Result<(), ComposeError> {
    if request.setup.topic.trim().is_empty() {
        return Err(ComposeError::MissingField("setup.topic"));
    }
    if request.setup.position.trim().is_empty() {
        return Err(ComposeError::MissingField("setup.position"));
    }
    Ok(())
}

fn system_message(request: &DebateRequest) -> ProviderMessage {
    ProviderMessage::system(prompts::system_prompt(request.setup.resolved_lens()))
}

/// Map history turns onto provider roles, preserving order
pub fn map_history(history: &[Turn]) -> impl Iterator<Item = ProviderMessage> + '_ {
    history.iter().map(|turn| match turn.role {
        TurnRole::Opponent => ProviderMessage::assistant(turn.content.clone()),
        TurnRole::User => ProviderMessage::user(turn.content.clone()),
    })
}

fn start_messages(request: &DebateRequest) -> Vec<ProviderMessage> {
    vec![
        system_message(request),
        ProviderMessage::user(prompts::opening_instruction(&request.setup)),
    ]
}

fn continue_messages(request: &DebateRequest) -> Vec<ProviderMessage> {
    let history = request.history();
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(system_message(request));
    messages.push(ProviderMessage::user(prompts::scene_instruction(&request.setup)));
    messages.extend(map_history(history));
    messages
}

fn quick_messages(request: &DebateRequest, quick: QuickAction) -> Vec<ProviderMessage> {
    let history = request.history();
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(system_message(request));
    messages.push(ProviderMessage::user(prompts::quick_scene(&request.setup)));
    messages.extend(map_history(history));
    messages.push(ProviderMessage::user(prompts::quick_instruction(quick)));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::types::DebateSetup;
    use crate::providers::MessageRole;

    fn setup() -> DebateSetup {
        DebateSetup::new("X", "Y")
            .with_template("idea")
            .with_lens("customer")
    }

    fn history(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::opponent(format!("opponent {}", i))
                } else {
                    Turn::user(format!("user {}", i))
                }
            })
            .collect()
    }

    fn roles(messages: &[ProviderMessage]) -> Vec<MessageRole> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn test_start_has_system_and_single_opening() {
        let plan = plan(&DebateRequest::start(setup()), &SamplingConfig::default()).unwrap();

        assert_eq!(roles(&plan.messages), vec![MessageRole::System, MessageRole::User]);
        assert!(plan.messages[1].content.contains("stress-test their thinking"));
        assert_eq!(plan.sampling, SamplingConfig::default().debate);
    }

    #[test]
    fn test_start_ignores_supplied_history() {
        let mut request = DebateRequest::start(setup());
        request.messages = Some(history(4));
        let plan = plan(&request, &SamplingConfig::default()).unwrap();
        assert_eq!(plan.messages.len(), 2);
    }

    #[test]
    fn test_continue_maps_history_in_order() {
        let turns = history(5);
        let request = DebateRequest::continue_with(setup(), turns.clone());
        let plan = plan(&request, &SamplingConfig::default()).unwrap();

        assert_eq!(plan.messages.len(), 1 + 1 + turns.len());
        assert_eq!(plan.messages[0].role, MessageRole::System);
        assert_eq!(plan.messages[1].role, MessageRole::User);
        assert!(plan.messages[1].content.starts_with("We're in an active debate"));

        for (turn, message) in turns.iter().zip(&plan.messages[2..]) {
            let expected = match turn.role {
                TurnRole::Opponent => MessageRole::Assistant,
                TurnRole::User => MessageRole::User,
            };
            assert_eq!(message.role, expected);
            assert_eq!(message.content, turn.content);
        }
    }

    #[test]
    fn test_continue_requires_history() {
        let request = DebateRequest::continue_with(setup(), vec![]);
        assert_eq!(
            plan(&request, &SamplingConfig::default()).unwrap_err(),
            ComposeError::EmptyHistory
        );

        // Unknown action tags take the continue path and inherit its rule
        let mut request = DebateRequest::start(setup());
        request.action = "reply".to_string();
        assert_eq!(
            plan(&request, &SamplingConfig::default()).unwrap_err(),
            ComposeError::EmptyHistory
        );
    }

    #[test]
    fn test_quick_rate_on_three_turns_has_six_messages() {
        let request = DebateRequest::quick(setup(), history(3), QuickAction::Rate);
        let plan = plan(&request, &SamplingConfig::default()).unwrap();

        assert_eq!(plan.messages.len(), 6);
        let last = plan.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, prompts::quick_instruction(QuickAction::Rate));
        assert_eq!(plan.sampling, SamplingConfig::default().quick);
        assert_eq!(plan.quick_action, Some(QuickAction::Rate));
    }

    #[test]
    fn test_quick_matches_history_plus_trailing_instruction() {
        let turns = history(4);
        for quick in QuickAction::ALL {
            let request = DebateRequest::quick(setup(), turns.clone(), quick);
            let plan = plan(&request, &SamplingConfig::default()).unwrap();
            let mapped: Vec<ProviderMessage> = map_history(&turns).collect();

            assert_eq!(plan.messages.len(), 2 + turns.len() + 1);
            assert_eq!(&plan.messages[2..2 + turns.len()], mapped.as_slice());
            assert_eq!(
                plan.messages.last().map(|m| m.content.as_str()),
                Some(prompts::quick_instruction(quick))
            );
        }
    }

    #[test]
    fn test_quick_rejects_unknown_or_missing_tag() {
        let mut request = DebateRequest::quick(setup(), history(2), QuickAction::Rate);
        request.quick_action = Some("roast".to_string());
        assert_eq!(
            plan(&request, &SamplingConfig::default()).unwrap_err(),
            ComposeError::UnknownQuickAction("roast".to_string())
        );

        request.quick_action = None;
        assert_eq!(
            plan(&request, &SamplingConfig::default()).unwrap_err(),
            ComposeError::MissingQuickAction
        );
    }

    #[test]
    fn test_blank_setup_fields_rejected() {
        let request = DebateRequest::start(DebateSetup::new("  ", "Y"));
        assert_eq!(
            plan(&request, &SamplingConfig::default()).unwrap_err(),
            ComposeError::MissingField("setup.topic")
        );
        let request = DebateRequest::start(DebateSetup::new("X", ""));
        assert_eq!(
            plan(&request, &SamplingConfig::default()).unwrap_err(),
            ComposeError::MissingField("setup.position")
        );
    }

    #[test]
    fn test_unknown_lens_same_system_prompt_as_missing() {
        let unknown = DebateRequest::start(DebateSetup::new("X", "Y").with_lens("regulator"));
        let missing = DebateRequest::start(DebateSetup::new("X", "Y"));
        let a = plan(&unknown, &SamplingConfig::default()).unwrap();
        let b = plan(&missing, &SamplingConfig::default()).unwrap();
        assert_eq!(a.messages[0], b.messages[0]);
    }

    #[test]
    fn test_provider_request_carries_sampling() {
        let request = DebateRequest::quick(setup(), history(1), QuickAction::Summary);
        let provider_request = plan(&request, &SamplingConfig::default())
            .unwrap()
            .into_provider_request("gpt-4o", true);

        assert_eq!(provider_request.model, "gpt-4o");
        assert_eq!(provider_request.temperature, Some(0.7));
        assert_eq!(provider_request.max_tokens, 2000);
        assert!(provider_request.stream);
    }
}
