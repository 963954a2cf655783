// ==========================================
// Invoice Ingest - Row Tokenizer
// ==========================================
// Responsibility: split one raw text line into ordered string cells.
// The exports are fixed-width reports mechanically converted to CSV,
// so quoting does not follow RFC 4180: a double quote toggles quoted
// state wherever it appears, a doubled quote inside a quoted field is
// a literal quote, and an unterminated quoted field at end of line is
// treated as closed.
// ==========================================

/// Tokenize one raw line. Never fails; always returns at least one
/// cell (possibly empty).
pub fn tokenize(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    // Escaped literal quote.
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    // An unterminated quote simply ends here.
    cells.push(current);
    cells
}
