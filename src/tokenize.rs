use crate::stage::Stage;

/// Characters removed from a line before it is split
pub const PUNCTUATION: [char; 6] = [',', '.', ';', '?', '!', '\''];

/// Splits lines into word tokens.
///
/// Punctuation from [`PUNCTUATION`] is removed and the line is split on the
/// space character only. Case is left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Tokens of one line, in order
    pub fn tokens(line: &str) -> impl Iterator<Item = String> + '_ {
        strip_line_break(line)
            .split(' ')
            .map(|word| word.replace(PUNCTUATION, ""))
            .filter(|word| !word.is_empty())
    }
}

/// Drop a trailing `\n`, `\r\n` or bare `\r`
fn strip_line_break(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl Stage for Tokenizer {
    type Input = String;
    type Output = String;

    fn process(&mut self, line: String, out: &mut Vec<String>) {
        out.extend(Self::tokens(&line));
    }

    fn name(&self) -> &str {
        "tokenizer"
    }
}
