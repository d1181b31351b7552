//! Chat command parsing.

/// Commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Start,
	Help,
	Subscribe,
	Unsubscribe,
	/// `/block [height|hash]`
	Block(Option<String>),
}

impl Command {
	/// Parses a message text.
	///
	/// The command must be the first word. An `@botname` suffix is accepted and
	/// ignored. Returns `None` for plain text and unknown commands.
	pub fn parse(text: &str) -> Option<Self> {
		let mut words = text.split_whitespace();
		let head = words.next()?.strip_prefix('/')?;
		let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

		match name.as_str() {
			"start" => Some(Command::Start),
			"help" => Some(Command::Help),
			"subscribe" => Some(Command::Subscribe),
			"unsubscribe" => Some(Command::Unsubscribe),
			"block" => Some(Command::Block(words.next().map(str::to_string))),
			_ => None,
		}
	}
}
