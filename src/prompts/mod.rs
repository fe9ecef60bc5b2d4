// Prompt text
//
// All persona, lens, and quick-action text is static data compiled into the
// binary from data/prompts/. Nothing here is mutable at runtime; lookups that
// take a tag resolve it through the enums in `debate::types`, which carry the
// defaulting rules.

use crate::debate::types::{DebateSetup, Lens, QuickAction};

const BASE_PERSONA: &str = include_str!("../../data/prompts/persona.md");

const LENS_INVESTOR: &str = include_str!("../../data/prompts/lens/investor.md");
const LENS_CUSTOMER: &str = include_str!("../../data/prompts/lens/customer.md");
const LENS_COMPETITOR: &str = include_str!("../../data/prompts/lens/competitor.md");
const LENS_POSTMORTEM: &str = include_str!("../../data/prompts/lens/postmortem.md");

const QUICK_STEELMAN: &str = include_str!("../../data/prompts/quick/steelman.md");
const QUICK_FRAMEWORK: &str = include_str!("../../data/prompts/quick/framework.md");
const QUICK_SUMMARY: &str = include_str!("../../data/prompts/quick/summary.md");
const QUICK_DEVILS_ADVOCATE: &str = include_str!("../../data/prompts/quick/devils-advocate.md");
const QUICK_RATE: &str = include_str!("../../data/prompts/quick/rate.md");
const QUICK_BLIND_SPOTS: &str = include_str!("../../data/prompts/quick/blind-spots.md");

/// Substituted whenever the provider produces no text, so a client never
/// renders an empty opponent turn.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str =
    "I have nothing sharp to add yet. Restate your strongest point and I'll go after it.";

/// Persona modifier text for a lens
pub fn lens_modifier(lens: Lens) -> &'static str {
    match lens {
        Lens::Investor => LENS_INVESTOR,
        Lens::Customer => LENS_CUSTOMER,
        Lens::Competitor => LENS_COMPETITOR,
        Lens::Postmortem => LENS_POSTMORTEM,
    }
}

/// The single system prompt for a conversation: base persona + lens modifier
pub fn system_prompt(lens: Lens) -> String {
    format!("{}\n\n{}", BASE_PERSONA.trim_end(), lens_modifier(lens).trim_end())
}

/// Fixed instruction appended after the history for a quick action
pub fn quick_instruction(action: QuickAction) -> &'static str {
    let text = match action {
        QuickAction::Steelman => QUICK_STEELMAN,
        QuickAction::Framework => QUICK_FRAMEWORK,
        QuickAction::Summary => QUICK_SUMMARY,
        QuickAction::DevilsAdvocate => QUICK_DEVILS_ADVOCATE,
        QuickAction::Rate => QUICK_RATE,
        QuickAction::BlindSpots => QUICK_BLIND_SPOTS,
    };
    text.trim_end()
}

/// Opening instruction for a fresh debate (no history)
pub fn opening_instruction(setup: &DebateSetup) -> String {
    let mut text = format!(
        "Someone has come to you to stress-test their thinking:\n\n\
         **Debate Type:** {}\n\
         **Your Lens:** {}\n\n\
         **Their position:** \"{}\"\n\n\
         **Their reasoning:**\n{}\n\n",
        setup.resolved_template().label(),
        setup.resolved_lens().display_name(),
        setup.topic,
        setup.position,
    );
    if let Some(context) = setup.context() {
        text.push_str(&format!("**Context:** {}\n\n", context));
    }
    text.push_str(
        "Give them your honest, sharp reaction THROUGH YOUR CURRENT LENS. Find the weakest \
         point in their reasoning and go straight for it. Use your thinking arsenal — apply the \
         most relevant stress test. Be direct, be specific, be incisive. They came to you because \
         they want to be challenged, not coddled.\n\n\
         Start with your sharpest observation. End with the question they need to answer.",
    );
    text
}

/// Scene-setting instruction that precedes the history on the continue path
pub fn scene_instruction(setup: &DebateSetup) -> String {
    let mut text = format!(
        "We're in an active debate:\n\n\
         Topic: \"{}\"\n\
         Type: {}\n\
         Your Lens: {}\n\
         Their original reasoning: {}\n",
        setup.topic,
        setup.resolved_template().label(),
        setup.resolved_lens().display_name(),
        setup.position,
    );
    if let Some(context) = setup.context() {
        text.push_str(&format!("Context: {}\n", context));
    }
    text.push_str(
        "\nContinue challenging them through your lens. Track the evolution of their argument — \
         acknowledge when they improve a point, but keep pushing on remaining weaknesses. \
         Reference their earlier statements when relevant. Stay sharp, stay specific.",
    );
    text
}

/// Compact scene message used ahead of the history on the quick path
pub fn quick_scene(setup: &DebateSetup) -> String {
    let mut text = format!(
        "Debate topic: \"{}\"\nOriginal position: {}",
        setup.topic, setup.position
    );
    if let Some(context) = setup.context() {
        text.push_str(&format!("\nContext: {}", context));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_lens_has_distinct_modifier() {
        let prompts: Vec<String> = Lens::ALL.iter().map(|l| system_prompt(*l)).collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert!(system_prompt(Lens::Customer).contains("SKEPTICAL CUSTOMER"));
    }

    #[test]
    fn test_unknown_lens_matches_default_system_prompt() {
        let unknown = DebateSetup::new("X", "Y").with_lens("regulator");
        let missing = DebateSetup::new("X", "Y");
        assert_eq!(
            system_prompt(unknown.resolved_lens()),
            system_prompt(missing.resolved_lens())
        );
        assert!(system_prompt(missing.resolved_lens()).contains("SKEPTICAL INVESTOR"));
    }

    #[test]
    fn test_quick_instructions_are_non_empty() {
        for action in QuickAction::ALL {
            assert!(!quick_instruction(action).trim().is_empty(), "{:?}", action);
        }
        assert!(quick_instruction(QuickAction::Rate).contains("/10"));
    }

    #[test]
    fn test_context_line_omitted_when_blank() {
        let setup = DebateSetup::new("Ship it", "Users asked").with_context("   ");
        assert!(!opening_instruction(&setup).contains("**Context:**"));
        assert!(!scene_instruction(&setup).contains("Context:"));
        assert!(!quick_scene(&setup).contains("Context:"));

        let setup = setup.with_context("Two engineers");
        assert!(opening_instruction(&setup).contains("**Context:** Two engineers"));
        assert!(scene_instruction(&setup).contains("Context: Two engineers"));
        assert!(quick_scene(&setup).contains("Context: Two engineers"));
    }

    #[test]
    fn test_opening_instruction_embeds_labels() {
        let setup = DebateSetup::new("X", "Y")
            .with_template("idea")
            .with_lens("postmortem");
        let text = opening_instruction(&setup);
        assert!(text.contains("New Product Idea"));
        assert!(text.contains("Future Failure Analyst"));
        assert!(text.contains("\"X\""));
    }
}
