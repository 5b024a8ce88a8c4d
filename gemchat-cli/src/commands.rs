use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  /help            Show this help
  /image <path>    Attach an image to your next message
  /clear-image     Drop the attached image
  /send            Send the attached image without a caption
  /recipe          Ask for a recipe based on the conversation
  /listen [n]      Read model message n aloud (latest if omitted)
  /history         Show the conversation with message numbers
  /voices          List the available voices
  /quit, /exit     Leave
Anything else is sent as a chat message.";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Image(PathBuf),
    ClearImage,
    Recipe,
    Listen(Option<usize>),
    History,
    Voices,
    Exit,
    /// Not a command; sent to the model as is
    Chat(String),
}

/// Parses one line of input. Errors are usage messages for the user.
pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let Some(rest) = input.strip_prefix('/') else {
        return Ok(Command::Chat(input.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "help" => Ok(Command::Help),
        "image" if arg.is_empty() => Err("Usage: /image <path>".to_string()),
        "image" => Ok(Command::Image(PathBuf::from(arg))),
        "clear-image" => Ok(Command::ClearImage),
        "send" => Ok(Command::Chat(String::new())),
        "recipe" => Ok(Command::Recipe),
        "listen" if arg.is_empty() => Ok(Command::Listen(None)),
        "listen" => arg
            .parse()
            .map(|n| Command::Listen(Some(n)))
            .map_err(|_| format!("Usage: /listen [n] (got {arg:?})")),
        "history" => Ok(Command::History),
        "voices" => Ok(Command::Voices),
        "exit" | "quit" => Ok(Command::Exit),
        _ => Err(format!("Unknown command /{name}. Type /help for commands.")),
    }
}

/// Parses a line read from the prompt. A blank line is skipped, unless an
/// image is waiting to be sent, in which case it sends the image alone.
pub fn parse_line(line: &str, image_pending: bool) -> Option<Result<Command, String>> {
    if line.trim().is_empty() {
        return image_pending.then(|| Ok(Command::Chat(String::new())));
    }
    Some(parse_command(line))
}
