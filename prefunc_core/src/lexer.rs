use logos::Logos;

use crate::tokens::Token;

/// Raw tokens produced by logos for the text that follows a directive marker.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[token("def")]
	Def,
	#[token("*")]
	Star,
	#[token("=")]
	Equals,
	#[token(":")]
	Colon,
	#[token(",")]
	Comma,
	#[regex(r"[ \t\r\n]")]
	Whitespace,
	#[regex(r"[^ \t\r\n*=:,]+")]
	Text,
}

/// Tokenize a directive body. The lexer is total: every byte of `source`
/// ends up in exactly one token, so `tokens_to_string(&tokenize(s)) == s`.
pub fn tokenize(source: &str) -> Vec<Token> {
	RawToken::lexer(source)
		.spanned()
		.map(|(result, span)| {
			let slice = &source[span];

			match result {
				Ok(RawToken::Def) => Token::Def,
				Ok(RawToken::Star) => Token::Global,
				Ok(RawToken::Equals) => Token::Assign,
				Ok(RawToken::Colon) => Token::Colon,
				Ok(RawToken::Comma) => Token::Comma,
				Ok(RawToken::Whitespace) => Token::Whitespace(slice.as_bytes()[0]),
				// Unrecognized input is kept verbatim so values never lose bytes.
				Ok(RawToken::Text) | Err(()) => Token::Text(slice.to_string()),
			}
		})
		.collect()
}
