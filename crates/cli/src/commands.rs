use dermai_llm::QuickAction;

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Action(QuickAction),
    Questions,
    Conditions,
    /// `/ask <condition>`
    Ask(String),
    Message(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ChatCommand::Message(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "help" => ChatCommand::Action(QuickAction::Help),
            "capabilities" => ChatCommand::Action(QuickAction::Capabilities),
            "new" | "new-chat" | "reset" => ChatCommand::Action(QuickAction::NewChat),
            "questions" => ChatCommand::Questions,
            "conditions" => ChatCommand::Conditions,
            "ask" if !arg.is_empty() => ChatCommand::Ask(arg.to_string()),
            _ => ChatCommand::Message(line.to_string()),
        }
    }
}
