// Debate domain types
//
// The wire envelope accepted by the gateway and the value objects the client
// keeps in its transcript. Tags that select prompt text (lens, template) stay
// as raw strings on the wire and are resolved with explicit defaults; the
// quick-action tag is resolved strictly.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The person defending their position
    User,
    /// The adversary (the provider's side of the conversation)
    Opponent,
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Assigned at creation time; only used for rendering keys
    #[serde(default)]
    pub id: String,
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    /// Create a turn with a fresh identifier
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn opponent(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Opponent, content)
    }
}

/// Static parameters of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateSetup {
    pub topic: String,
    pub position: String,
    /// Optional free-text background; empty means "no context"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: String,
    /// Template tag (see [`Template`]); unknown values fall back to a generic label
    #[serde(default, deserialize_with = "null_as_empty")]
    pub template: String,
    /// Lens tag (see [`Lens`]); unknown values fall back to the investor lens
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lens: String,
}

/// Optional setup fields arrive as `null` from browser clients
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl DebateSetup {
    pub fn new(topic: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            position: position.into(),
            context: String::new(),
            template: String::new(),
            lens: String::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_lens(mut self, lens: impl Into<String>) -> Self {
        self.lens = lens.into();
        self
    }

    /// Resolved lens (never fails)
    pub fn resolved_lens(&self) -> Lens {
        Lens::from_tag(&self.lens)
    }

    /// Resolved template (never fails)
    pub fn resolved_template(&self) -> Template {
        Template::from_tag(&self.template)
    }

    /// Context with surrounding whitespace removed, or `None` when blank
    pub fn context(&self) -> Option<&str> {
        let trimmed = self.context.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Persona modifier that flavors the critique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lens {
    #[default]
    Investor,
    Customer,
    Competitor,
    Postmortem,
}

impl Lens {
    pub const ALL: [Lens; 4] = [
        Lens::Investor,
        Lens::Customer,
        Lens::Competitor,
        Lens::Postmortem,
    ];

    /// Resolve a wire tag. Unknown or empty tags resolve to the default lens.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "investor" => Lens::Investor,
            "customer" => Lens::Customer,
            "competitor" => Lens::Competitor,
            "postmortem" => Lens::Postmortem,
            _ => Lens::default(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Lens::Investor => "investor",
            Lens::Customer => "customer",
            Lens::Competitor => "competitor",
            Lens::Postmortem => "postmortem",
        }
    }

    /// Human-readable name embedded in instruction messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Lens::Investor => "Skeptical Investor",
            Lens::Customer => "Skeptical Customer",
            Lens::Competitor => "Ruthless Competitor",
            Lens::Postmortem => "Future Failure Analyst",
        }
    }
}

/// Debate category; advisory only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Template {
    Feature,
    Strategy,
    Idea,
    Gtm,
    Validate,
    Devils,
    Open,
    #[default]
    General,
}

impl Template {
    pub const ALL: [Template; 8] = [
        Template::Feature,
        Template::Strategy,
        Template::Idea,
        Template::Gtm,
        Template::Validate,
        Template::Devils,
        Template::Open,
        Template::General,
    ];

    /// Resolve a wire tag. Unknown or empty tags resolve to [`Template::General`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "feature" => Template::Feature,
            "strategy" => Template::Strategy,
            "idea" => Template::Idea,
            "gtm" => Template::Gtm,
            "validate" => Template::Validate,
            "devils" => Template::Devils,
            "open" => Template::Open,
            _ => Template::General,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Template::Feature => "feature",
            Template::Strategy => "strategy",
            Template::Idea => "idea",
            Template::Gtm => "gtm",
            Template::Validate => "validate",
            Template::Devils => "devils",
            Template::Open => "open",
            Template::General => "general",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Template::Feature => "Feature Prioritization — deciding what to build next",
            Template::Strategy => "Strategic Decision — major business direction choice",
            Template::Idea => "New Product Idea — evaluating if something is worth building",
            Template::Gtm => "Go-to-Market Strategy — how to launch and grow",
            Template::Validate => {
                "Idea Validation — comprehensive stress-test of a business idea's viability"
            }
            Template::Devils => "Devil's Advocate — pure adversarial challenge on any position",
            Template::Open => "Open Debate — general argumentation on any topic",
            Template::General => "General debate",
        }
    }
}

/// Named follow-up instruction appended after the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Steelman,
    Framework,
    Summary,
    DevilsAdvocate,
    Rate,
    BlindSpots,
}

impl QuickAction {
    pub const ALL: [QuickAction; 6] = [
        QuickAction::Steelman,
        QuickAction::Framework,
        QuickAction::Summary,
        QuickAction::DevilsAdvocate,
        QuickAction::Rate,
        QuickAction::BlindSpots,
    ];

    /// Resolve a wire tag. Unlike lens and template there is no fallback.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "steelman" => Some(QuickAction::Steelman),
            "framework" => Some(QuickAction::Framework),
            "summary" => Some(QuickAction::Summary),
            "devils-advocate" => Some(QuickAction::DevilsAdvocate),
            "rate" => Some(QuickAction::Rate),
            "blind-spots" => Some(QuickAction::BlindSpots),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            QuickAction::Steelman => "steelman",
            QuickAction::Framework => "framework",
            QuickAction::Summary => "summary",
            QuickAction::DevilsAdvocate => "devils-advocate",
            QuickAction::Rate => "rate",
            QuickAction::BlindSpots => "blind-spots",
        }
    }

    /// Short label shown in the transcript when the user picks this action
    pub fn label(&self) -> &'static str {
        match self {
            QuickAction::Steelman => "Steelman my position",
            QuickAction::Framework => "Give me a decision framework",
            QuickAction::Summary => "Summarize the debate",
            QuickAction::DevilsAdvocate => "Argue the opposite",
            QuickAction::Rate => "Rate my argument",
            QuickAction::BlindSpots => "Show my blind spots",
        }
    }
}

/// Which kind of turn the caller is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Continue,
    Quick,
}

impl Action {
    /// Resolve a wire tag. Anything that is not `start` or `quick` takes the
    /// continue path, which then requires a non-empty history.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "start" => Action::Start,
            "quick" => Action::Quick,
            _ => Action::Continue,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Continue => "continue",
            Action::Quick => "quick",
        }
    }
}

fn default_stream() -> bool {
    true
}

/// Request body for `POST /api/debate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateRequest {
    pub action: String,
    pub setup: DebateSetup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Turn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_action: Option<String>,
    /// Stream tokens as `text/event-stream` (default) or return one JSON body
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl DebateRequest {
    pub fn start(setup: DebateSetup) -> Self {
        Self {
            action: Action::Start.tag().to_string(),
            setup,
            messages: None,
            quick_action: None,
            stream: true,
        }
    }

    pub fn continue_with(setup: DebateSetup, messages: Vec<Turn>) -> Self {
        Self {
            action: Action::Continue.tag().to_string(),
            setup,
            messages: Some(messages),
            quick_action: None,
            stream: true,
        }
    }

    pub fn quick(setup: DebateSetup, messages: Vec<Turn>, quick_action: QuickAction) -> Self {
        Self {
            action: Action::Quick.tag().to_string(),
            setup,
            messages: Some(messages),
            quick_action: Some(quick_action.tag().to_string()),
            stream: true,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn action(&self) -> Action {
        Action::from_tag(&self.action)
    }

    /// History as a slice (absent history is empty)
    pub fn history(&self) -> &[Turn] {
        self.messages.as_deref().unwrap_or(&[])
    }
}

/// Non-streaming success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateResponse {
    pub response: String,
}

/// Error body returned for every failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_lens_falls_back_to_investor() {
        assert_eq!(Lens::from_tag("regulator"), Lens::Investor);
        assert_eq!(Lens::from_tag(""), Lens::Investor);
        assert_eq!(Lens::from_tag("customer"), Lens::Customer);
    }

    #[test]
    fn test_null_optional_setup_fields_default() {
        let setup: DebateSetup = serde_json::from_str(
            r#"{"topic":"X","position":"Y","context":null,"template":null,"lens":null}"#,
        )
        .unwrap();
        assert_eq!(setup.context(), None);
        assert_eq!(setup.resolved_template(), Template::General);
        assert_eq!(setup.resolved_lens(), Lens::Investor);

        let setup: DebateSetup = serde_json::from_str(r#"{"topic":"X","position":"Y"}"#).unwrap();
        assert_eq!(setup.lens, "");
    }

    #[test]
    fn test_unknown_template_falls_back_to_general() {
        assert_eq!(Template::from_tag("nonsense"), Template::General);
        assert_eq!(Template::General.label(), "General debate");
        assert_eq!(Template::from_tag("gtm"), Template::Gtm);
    }

    #[test]
    fn test_quick_action_tags_are_strict() {
        for action in QuickAction::ALL {
            assert_eq!(QuickAction::from_tag(action.tag()), Some(action));
        }
        assert_eq!(QuickAction::from_tag("Rate"), None);
        assert_eq!(QuickAction::from_tag("devils_advocate"), None);
    }

    #[test]
    fn test_unknown_action_takes_continue_path() {
        assert_eq!(Action::from_tag("start"), Action::Start);
        assert_eq!(Action::from_tag("quick"), Action::Quick);
        assert_eq!(Action::from_tag("whatever"), Action::Continue);
    }

    #[test]
    fn test_request_wire_format() {
        let json = r#"{
            "action": "quick",
            "setup": {"topic": "X", "position": "Y", "context": "", "template": "idea", "lens": "customer"},
            "messages": [{"id": "1", "role": "opponent", "content": "Why now?"}],
            "quickAction": "blind-spots"
        }"#;
        let request: DebateRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.action(), Action::Quick);
        assert_eq!(request.quick_action.as_deref(), Some("blind-spots"));
        assert_eq!(request.history().len(), 1);
        assert_eq!(request.history()[0].role, TurnRole::Opponent);
        assert!(request.stream, "stream should default to true");
    }

    #[test]
    fn test_setup_optional_fields_default_empty() {
        let setup: DebateSetup =
            serde_json::from_str(r#"{"topic": "X", "position": "Y"}"#).unwrap();
        assert_eq!(setup.context(), None);
        assert_eq!(setup.resolved_lens(), Lens::Investor);
        assert_eq!(setup.resolved_template(), Template::General);
    }

    #[test]
    fn test_turn_ids_are_unique() {
        let a = Turn::user("a");
        let b = Turn::user("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_quick_request_serializes_camel_case() {
        let request = DebateRequest::quick(DebateSetup::new("X", "Y"), vec![], QuickAction::Rate);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["quickAction"], "rate");
        assert_eq!(value["action"], "quick");
    }
}
