use std::fmt::Display;

/// Tokens of a directive body, i.e. everything after the directive marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// `def`
	Def,
	/// `*`
	Global,
	/// `=`
	Assign,
	/// `:`
	Colon,
	/// `,`
	Comma,
	/// ` ` | `\t` | `\r` | `\n`
	Whitespace(u8),
	/// Any other run of characters, e.g. `minecraft` or `@a[tag`
	Text(String),
}

impl Token {
	pub fn is_whitespace(&self) -> bool {
		matches!(self, Token::Whitespace(_))
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Def => write!(f, "def"),
			Token::Global => write!(f, "*"),
			Token::Assign => write!(f, "="),
			Token::Colon => write!(f, ":"),
			Token::Comma => write!(f, ","),
			Token::Whitespace(byte) => write!(f, "{}", char::from(*byte)),
			Token::Text(text) => write!(f, "{text}"),
		}
	}
}

/// Render a slice of tokens back into the text they were lexed from.
pub fn tokens_to_string(tokens: &[Token]) -> String {
	tokens.iter().map(ToString::to_string).collect()
}
