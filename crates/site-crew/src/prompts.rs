//! Prompt rendering for the reasoning service.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever the rendered layout
//! changes, so logged runs can be tied to the prompt shape that produced them.

use crate::reasoning::ReasoningRequest;

/// Prompt version. Bump on any layout change below.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Separator placed between upstream task outputs.
pub const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

/// System preamble: who the agent is and how it may act.
pub fn system_preamble(request: &ReasoningRequest) -> String {
    let mut preamble = format!(
        "You are {role}. {backstory}\n\nYour personal goal is: {goal}",
        role = request.role,
        backstory = request.backstory,
        goal = request.goal,
    );
    if request.toolbox.is_empty() {
        preamble.push_str(
            "\n\nYou have no tools. Answer from your own reasoning and the context you are given.",
        );
    } else {
        preamble.push_str("\n\nYou can use these tools: ");
        preamble.push_str(&request.toolbox.names().join(", "));
        preamble.push_str(
            ".\nTool results starting with ERROR describe a failure; read them and adjust \
             (for example fix the path) instead of repeating the same call.",
        );
    }
    preamble
}

/// User prompt: the task, the expected output, and upstream context.
pub fn task_prompt(request: &ReasoningRequest) -> String {
    let mut prompt = format!(
        "Current Task: {description}\n\n\
         This is the expected criteria for your final answer: {expected}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        description = request.description,
        expected = request.expected_output,
    );
    if !request.context.is_empty() {
        prompt.push_str(
            "\n\nThis is the context you're working with (results of earlier tasks):\n",
        );
        prompt.push_str(&request.context.join(CONTEXT_SEPARATOR));
    }
    prompt.push_str("\n\nBegin! This is VERY important to you, use the tools available and give your best Final Answer.");
    prompt
}
