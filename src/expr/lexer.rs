use super::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let bytes = source.as_bytes();
    let mut idx = 0usize;
    let mut tokens = Vec::new();

    while idx < bytes.len() {
        let b = bytes[idx];
        if b.is_ascii_whitespace() {
            idx += 1;
            continue;
        }

        let offset = idx;
        let token = match b {
            b'+' => {
                idx += 1;
                Token::Plus
            }
            b'-' => {
                idx += 1;
                Token::Minus
            }
            b'*' if bytes.get(idx + 1) == Some(&b'*') => {
                idx += 2;
                Token::Power
            }
            b'*' => {
                idx += 1;
                Token::Star
            }
            b'/' => {
                idx += 1;
                Token::Slash
            }
            b'(' => {
                idx += 1;
                Token::LParen
            }
            b')' => {
                idx += 1;
                Token::RParen
            }
            _ if b.is_ascii_digit() || b == b'.' => {
                idx += 1;
                while idx < bytes.len() {
                    let c = bytes[idx];
                    if c.is_ascii_digit() || c == b'.' || matches!(c, b'e' | b'E') {
                        idx += 1;
                    } else if matches!(c, b'+' | b'-') && matches!(bytes[idx - 1], b'e' | b'E') {
                        idx += 1;
                    } else {
                        break;
                    }
                }
                let raw = &source[offset..idx];
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber {
                        literal: raw.to_string(),
                        offset,
                    })?;
                Token::Number(value)
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                idx += 1;
                while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_')
                {
                    idx += 1;
                }
                Token::Ident(source[offset..idx].to_string())
            }
            _ => {
                let ch = source[offset..].chars().next().unwrap_or('?');
                return Err(ParseError::UnexpectedCharacter { ch, offset });
            }
        };

        tokens.push(Spanned { token, offset });
    }

    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(tokens)
}
