//! Structured Markup
//!
//! Parses the lightweight markup used in answers into a block tree so a
//! renderer can display it without interpreting raw text as HTML.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Bold(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    ListItem { inlines: Vec<Inline> },
    /// Consecutive non-blank lines, joined with newlines
    Paragraph { inlines: Vec<Inline> },
}

/// Parse answer text into blocks.
///
/// `#`..`######` followed by a space start a heading, `- ` or `* ` a list
/// item, blank lines end a paragraph. `**x**` marks bold text; an unmatched
/// marker is kept as literal text.
pub fn parse(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();

        if trimmed.trim_end().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if let Some((level, text)) = heading(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level,
                inlines: parse_inlines(text.trim()),
            });
        } else if let Some(text) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem {
                inlines: parse_inlines(text.trim()),
            });
        } else {
            paragraph.push(line.trim());
        }
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let text = line[hashes..].strip_prefix(' ')?;
    u8::try_from(hashes).ok().map(|level| (level, text))
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if lines.is_empty() {
        return;
    }
    blocks.push(Block::Paragraph {
        inlines: parse_inlines(&lines.join("\n")),
    });
    lines.clear();
}

/// Split text into plain and bold runs
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };

        if open > 0 {
            inlines.push(Inline::Text(rest[..open].to_string()));
        }
        if close > 0 {
            inlines.push(Inline::Bold(after_open[..close].to_string()));
        }
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        inlines.push(Inline::Text(rest.to_string()));
    }
    inlines
}
