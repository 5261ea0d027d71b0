use std::sync::LazyLock;

use regex::Regex;

static BOLD_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*([^*]+?)\*\*\s*:?\s*(.*)$").unwrap());
static HEADING_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.+?)\s*#*$").unwrap());
static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s+\[([ xX])\]\s+(.+)$").unwrap());

/// Placeholder GitHub issue forms render for an optional field left blank.
const NO_RESPONSE: &str = "_No response_";

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `**Label**: inline value` or `### Label`.
    Label { name: String, inline: String },
    Checkbox { checked: bool, text: String },
    Text(String),
    Empty,
}

/// Classify every line of an issue body. Never fails: anything unrecognised
/// becomes `Text`.
pub fn classify_lines(body: &str) -> Vec<Block> {
    let body = body.replace("\r\n", "\n").replace('\r', "\n");
    if body.trim().is_empty() {
        return vec![Block::Empty];
    }

    body.lines().map(classify_line).collect()
}

fn classify_line(raw: &str) -> Block {
    let line = raw.trim();

    if line.is_empty() || line == NO_RESPONSE {
        return Block::Empty;
    }

    // Label markers only count at the start of a line, before indentation is
    // stripped, so an indented "**bold**" inside a description stays text.
    if raw.starts_with("**") {
        if let Some(caps) = BOLD_LABEL_RE.captures(line) {
            let inline = caps[2].trim();
            return Block::Label {
                name: caps[1].trim().to_string(),
                inline: if inline == NO_RESPONSE {
                    String::new()
                } else {
                    inline.to_string()
                },
            };
        }
    }

    if raw.starts_with('#') {
        if let Some(caps) = HEADING_LABEL_RE.captures(line) {
            return Block::Label {
                name: caps[1].trim().to_string(),
                inline: String::new(),
            };
        }
    }

    if let Some(caps) = CHECKBOX_RE.captures(line) {
        return Block::Checkbox {
            checked: caps[1].eq_ignore_ascii_case("x"),
            text: caps[2].trim().to_string(),
        };
    }

    Block::Text(line.to_string())
}
