use std::ops::Range;

use crate::errors::{raw_error, ParseError};
use crate::span::LineIndex;
use crate::tokens::{keyword, Token};

fn symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

/// Line-oriented lexer. Indentation is significant: a deeper line opens a
/// block with a synthetic `Indent` token, a shallower one closes blocks
/// with `Dedent`s, and each non-blank line ends in `Newline`. A dedent
/// must land exactly on an enclosing indentation level.
pub(crate) fn lex(
    source: &str,
    file: &str,
    line_index: &LineIndex,
) -> Result<Vec<(Token, Range<usize>)>, Vec<ParseError>> {
    let mut tokens: Vec<(Token, Range<usize>)> = Vec::new();
    let mut errors: Vec<ParseError> = Vec::new();
    let mut indents: Vec<usize> = vec![0];

    let mut line_start = 0usize;
    for line in source.split('\n') {
        let line_end = line_start + line.len();
        lex_line(
            line,
            line_start,
            line_end,
            file,
            line_index,
            &mut indents,
            &mut tokens,
            &mut errors,
        );
        line_start = line_end + 1;
    }

    let eof = source.len()..source.len();
    while indents.len() > 1 {
        indents.pop();
        tokens.push((Token::Dedent, eof.clone()));
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[allow(clippy::too_many_arguments)]
fn lex_line(
    line: &str,
    line_start: usize,
    line_end: usize,
    file: &str,
    line_index: &LineIndex,
    indents: &mut Vec<usize>,
    tokens: &mut Vec<(Token, Range<usize>)>,
    errors: &mut Vec<ParseError>,
) {
    let mut chars = line.char_indices().peekable();

    let mut indent = 0usize;
    while let Some((idx, ch)) = chars.peek().copied() {
        match ch {
            ' ' => {
                indent += 1;
                chars.next();
            }
            '\t' => {
                errors.push(raw_error(
                    "tab in indentation (use spaces)",
                    file,
                    line_start + idx..line_start + idx + 1,
                    line_index,
                ));
                return;
            }
            _ => break,
        }
    }

    // Blank and comment-only lines do not participate in indentation.
    match chars.peek() {
        None => return,
        Some((_, '#')) => return,
        Some(_) => {}
    }

    let indent_span = line_start..line_start + indent;
    let current = *indents.last().unwrap_or(&0);
    if indent > current {
        indents.push(indent);
        tokens.push((Token::Indent, indent_span));
    } else if indent < current {
        while indents.last().is_some_and(|top| *top > indent) {
            indents.pop();
            tokens.push((Token::Dedent, indent_span.clone()));
        }
        if indents.last() != Some(&indent) {
            errors.push(raw_error(
                "dedent does not match any enclosing indentation level",
                file,
                indent_span,
                line_index,
            ));
            return;
        }
    }

    while let Some((idx, ch)) = chars.next() {
        let at = line_start + idx;
        match ch {
            ' ' => {}
            '#' => break,
            ':' => tokens.push((Token::Colon, at..at + 1)),
            '|' => tokens.push((Token::Pipe, at..at + 1)),
            '(' => tokens.push((Token::LParen, at..at + 1)),
            ')' => tokens.push((Token::RParen, at..at + 1)),
            ',' => tokens.push((Token::Comma, at..at + 1)),
            '"' => {
                let mut text = String::new();
                let mut closed = false;
                let mut end = at + 1;
                for (idx, ch) in chars.by_ref() {
                    end = line_start + idx + ch.len_utf8();
                    if ch == '"' {
                        closed = true;
                        break;
                    }
                    text.push(ch);
                }
                if closed {
                    tokens.push((Token::Str(text), at..end));
                } else {
                    errors.push(raw_error("unterminated string", file, at..end, line_index));
                    return;
                }
            }
            ch if symbol_char(ch) => {
                let mut symbol = String::from(ch);
                let mut end = at + ch.len_utf8();
                while let Some((idx, ch)) = chars.peek().copied() {
                    if !symbol_char(ch) {
                        break;
                    }
                    symbol.push(ch);
                    end = line_start + idx + ch.len_utf8();
                    chars.next();
                }
                let token = keyword(&symbol).unwrap_or(Token::Ident(symbol));
                tokens.push((token, at..end));
            }
            other => {
                errors.push(raw_error(
                    format!("unexpected character `{}`", other),
                    file,
                    at..at + other.len_utf8(),
                    line_index,
                ));
                return;
            }
        }
    }

    tokens.push((Token::Newline, line_end..line_end + 1));
}
