//! Bot command parsing.

/// Commands the flow reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/start [param]`; `param` is empty when absent.
    Start { param: &'a str },
    /// `/id`: report the caller's user and chat ids.
    Id,
}

/// Parse a message text as a command.
///
/// Any text beginning with `/start` is a start command, so `/start_ref42`
/// restarts with an empty parameter. The parameter is the rest of the text
/// after the whitespace run that follows the first token, kept verbatim
/// otherwise. `/id` must be the whole first token, optionally suffixed with
/// `@botname` as group chats send it.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    let (head, rest) = match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (text, ""),
    };

    if head.starts_with("/start") {
        return Some(Command::Start { param: rest });
    }

    let name = head.split_once('@').map_or(head, |(name, _bot)| name);
    (name == "/id").then_some(Command::Id)
}
