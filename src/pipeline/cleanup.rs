//! Optional noise reduction of the final Markdown (`limpar_texto`).
//!
//! Off by default: the marker writer's output is already valid. When enabled,
//! these deterministic passes run in order:
//!
//! 1. Normalise line endings (CRLF → LF)
//! 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 3. Collapse runs of spaces / tabs to one space, trim line ends
//! 4. Collapse runs of the same punctuation character (`!!!` → `!`)
//! 5. Collapse 3+ consecutive newlines to one blank line
//! 6. End with exactly one newline
//!
//! `<PAGINA:nnn>` / `<IMAGEM:nnn>` markers contain no repeated characters or
//! whitespace, so no pass can alter them.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters whose repeated runs collapse to one.
const NOISY_PUNCTUATION: &str = ".,;:!?+-_()[]{}|@#$%^&*=~`'\"";

/// Apply every cleanup pass.
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = collapse_horizontal_whitespace(&s);
    let s = collapse_repeated_punctuation(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Pass 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Pass 2: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Pass 3: Horizontal whitespace ────────────────────────────────────────────

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_horizontal_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| RE_HSPACE.replace_all(line, " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Pass 4: Repeated punctuation ─────────────────────────────────────────────
//
// Table separator rows and thematic breaks (`---`, `***`) are left alone:
// collapsing them would turn a rule into a list bullet.

fn collapse_repeated_punctuation(input: &str) -> String {
    input
        .lines()
        .map(|line| {
            if is_structural_line(line) {
                line.to_string()
            } else {
                collapse_runs(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_runs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev: Option<char> = None;
    for c in line.chars() {
        if prev == Some(c) && NOISY_PUNCTUATION.contains(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn is_structural_line(line: &str) -> bool {
    let t = line.trim();
    if t.is_empty() {
        return false;
    }
    let table_separator = t.starts_with('|')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '));
    let thematic_break = t.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|m| t.chars().all(|c| c == *m || c == ' '));
    table_separator || thematic_break
}

// ── Pass 5: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Pass 6: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_horizontal_whitespace() {
        assert_eq!(
            collapse_horizontal_whitespace("a  \t b   \nc\t\t"),
            "a b\nc"
        );
    }

    #[test]
    fn test_repeated_punctuation() {
        assert_eq!(collapse_runs("Wait!!! What??? ...ok,,"), "Wait! What? .ok,");
        assert_eq!(collapse_runs("letters stay: aaa 111"), "letters stay: aaa 111");
    }

    #[test]
    fn test_structural_lines_untouched() {
        let input = "| a | b |\n| --- | --- |\n\n---\n\n* * *";
        assert_eq!(collapse_repeated_punctuation(input), input);
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_markers_survive_full_pipeline() {
        let input = "<PAGINA:001>\r\n\r\n\r\n\r\nNoisy   text!!!\u{200B}\n\n\n\n<IMAGEM:001>\n\n<PAGINA:002>";
        assert_eq!(
            clean_text(input),
            "<PAGINA:001>\n\nNoisy text!\n\n<IMAGEM:001>\n\n<PAGINA:002>\n"
        );
    }
}
