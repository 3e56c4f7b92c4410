// Shared prompt fragments used across features.
// Each feature defines its own prompts alongside it in `features::prompts`.

/// Appended to the system prompt of every JSON-mode call.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Reminds the model that every generated claim must come from the inputs.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Base every statement on the resume, CV or job description provided. \
    Do NOT invent employers, dates, credentials or metrics. \
    If the input does not support a claim, omit it.";
