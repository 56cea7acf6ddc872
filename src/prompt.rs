//! Prompt construction
//!
//! Wraps one user utterance in the fixed support instructions sent to the
//! model. Pure: the same text always yields the same prompt.

const PREAMBLE: &str = "The user is feeling sad or down and has shared the following:";

const INSTRUCTIONS: &str = "Please provide a thoughtful, empathetic, and uplifting response that:
1. Acknowledges their feelings without dismissing them
2. Offers genuine encouragement and perspective
3. Suggests positive actions they might take
4. Includes a motivational quote or insight if appropriate";

const TONE: &str = "Keep your response warm, supportive, and authentic - avoid being overly cheerful \
in a way that might seem insensitive. Your goal is to help them feel heard and \
offer gentle support.";

/// Build the model prompt for one user message.
///
/// The text is embedded verbatim, including surrounding whitespace.
pub fn build_prompt(user_text: &str) -> String {
    format!("{PREAMBLE}\n\n\"{user_text}\"\n\n{INSTRUCTIONS}\n\n{TONE}\n")
}
