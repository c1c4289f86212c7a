//! Prompt assembly from accumulated session knowledge
//!
//! Builders embed the change context and a bounded decision-context view
//! into a single textual question. Every prompt ends with an explicit JSON
//! response contract so the recovery ladder has a predictable shape to
//! work with.

use changescout_core_types::ChangeContext;
use context_store::DecisionContext;
use std::fmt::Write;

/// Prompt asking the oracle to rank candidate navigation targets against a
/// change context. Candidates are numbered; the response refers to them by
/// index.
pub fn build_ranking_prompt(change: &ChangeContext, candidates: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are ranking parts of a web application for exploratory testing.\n\n");
    write_change_context(&mut prompt, change);

    prompt.push_str("\n## Candidate navigation targets\n");
    for (index, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(prompt, "{index}. {candidate}");
    }

    prompt.push_str(
        "\n## Task\n\
         Score each candidate by how likely the described change affects it \
         (0.0 = unrelated, 1.0 = directly affected).\n\n\
         Respond with JSON only:\n\
         {\"rankings\": [{\"index\": 0, \"score\": 0.9, \"reason\": \"...\"}]}\n",
    );
    prompt
}

/// Prompt asking for a single navigation/interaction decision about a
/// component, given everything the session has learned so far.
pub fn build_decision_prompt(question: &str, context: &DecisionContext) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are guiding exploratory testing of a web application.\n\n");

    if let Some(change) = context.change_context.as_ref() {
        write_change_context(&mut prompt, change);
    }

    if let Some(page) = context.current_page.as_ref() {
        let _ = writeln!(
            prompt,
            "\n## Current page\nurl: {}\ntitle: {}\nvisits: {}",
            page.url, page.title, page.visit_count
        );
        if !page.elements.is_empty() {
            prompt.push_str("interactive elements:\n");
            for element in page.elements.iter().take(20) {
                let _ = writeln!(
                    prompt,
                    "- <{}> {} ({})",
                    element.tag,
                    truncate(&element.text, 60),
                    element.selector
                );
            }
        }
    }

    if !context.recent_navigation.is_empty() {
        prompt.push_str("\n## Recent navigation (newest first)\n");
        for step in &context.recent_navigation {
            let _ = writeln!(prompt, "- {} {} -> {:?}", step.action, step.target, step.outcome);
        }
    }

    if !context.recent_decisions.is_empty() {
        prompt.push_str("\n## Recent decisions (newest first)\n");
        for decision in &context.recent_decisions {
            let _ = writeln!(
                prompt,
                "- {} on {} (confidence {:.2})",
                decision.action, decision.component, decision.confidence
            );
        }
    }

    if let Some(route) = context.known_route.as_ref() {
        let _ = writeln!(prompt, "\n## Known route\n{} -> {}", route.name, route.url);
    }
    if !context.similar_components.is_empty() {
        let _ = writeln!(
            prompt,
            "similar components: {}",
            context.similar_components.join(", ")
        );
    }

    let _ = writeln!(prompt, "\n## Question\n{question}");
    prompt.push_str(
        "\nRespond with JSON only:\n\
         {\"should_act\": true, \"target\": \"<css selector or url>\", \
         \"reasoning\": \"...\", \"confidence\": 0.0, \
         \"alternatives\": [{\"target\": \"...\", \"score\": 0.0}], \
         \"next_steps\": [\"...\"]}\n",
    );
    prompt
}

/// Prompt asking the oracle to propose follow-up test steps for a component.
pub fn build_step_generation_prompt(component: &str, context: &DecisionContext) -> String {
    let question = format!(
        "Propose up to 3 concrete follow-up steps (action + target selector + \
         optional input value) to exercise the '{component}' component on the \
         current page. List them in next_steps as \"action|selector|value\" \
         strings, most valuable first."
    );
    build_decision_prompt(&question, context)
}

fn write_change_context(prompt: &mut String, change: &ChangeContext) {
    let _ = writeln!(
        prompt,
        "## Change under test\ntitle: {}\nbranch: {}",
        change.title, change.branch
    );
    if !change.files.is_empty() {
        prompt.push_str("changed files:\n");
        for file in &change.files {
            let _ = writeln!(
                prompt,
                "- {} ({}, {} lines)",
                file.filename, file.status, file.change_count
            );
        }
    }
    if !change.components.is_empty() {
        prompt.push_str("affected components:\n");
        for component in &change.components {
            let _ = writeln!(prompt, "- {} ({})", component.name, component.file);
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}
