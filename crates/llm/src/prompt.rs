use dermai_core::{Role, Transcript};

/// Flatten a conversation into the single prompt string the generative API
/// receives:
///
/// ```text
/// <system prompt>
///
/// User: ...
/// Assistant: ...
/// User: <new message>
/// ```
///
/// System messages stored in the transcript extend the preamble instead of
/// becoming turns.
pub fn flatten_prompt(system_prompt: &str, transcript: &Transcript, new_message: &str) -> String {
    let mut preamble = system_prompt.to_string();
    let mut lines = Vec::with_capacity(transcript.len() + 1);

    for message in transcript.messages() {
        match message.role {
            Role::System => {
                if !preamble.is_empty() {
                    preamble.push('\n');
                }
                preamble.push_str(&message.content);
            }
            role => lines.push(format!("{}: {}", role.label(), message.content)),
        }
    }
    lines.push(format!("{}: {}", Role::User.label(), new_message));

    format!("{}\n\n{}", preamble, lines.join("\n"))
}
