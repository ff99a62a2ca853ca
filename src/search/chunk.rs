//! Splitting material pages into searchable chunks
//!
//! Each heading starts a new chunk. Code blocks, tables and directive lines
//! (`:::challenge`, `:::solution`, ...) are left out of the indexed text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::material::frontmatter;

/// A heading-delimited slice of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Heading text, empty for content before the first heading
    pub title: String,
    /// Fragment id used to link into the page
    pub anchor: String,
    /// `title:` followed by the chunk's prose
    pub text: String,
}

/// Strip front matter and the lines the search index should never see
pub fn clean_page(markdown: &str) -> String {
    let body = match frontmatter::split_raw(markdown) {
        Ok((_, body)) => body,
        Err(_) => markdown,
    };

    body.lines()
        .filter(|line| !line.contains("::"))
        .filter(|line| !is_table_row(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_table_row(line: &str) -> bool {
    line.len() > 3 && line.starts_with("| ") && line.ends_with(" |")
}

/// Anchor for a heading: spaces to dashes, colons and backticks dropped
pub fn anchor_for(title: &str) -> String {
    title.replace(' ', "-").replace([':', '`'], "")
}

/// Split a page into chunks at each heading
pub fn split_page(markdown: &str) -> Vec<Chunk> {
    let cleaned = clean_page(markdown);
    let parser = Parser::new_ext(&cleaned, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

    let mut chunks = Vec::new();
    let mut title = String::new();
    let mut body = String::new();
    let mut heading: Option<String> = None;
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                flush_chunk(&mut chunks, &title, &mut body);
                heading = Some(String::new());
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = heading.take() {
                    title = text.trim().to_string();
                }
            }
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) | Event::Code(text) => {
                if in_code_block {
                    continue;
                }
                match heading.as_mut() {
                    Some(h) => h.push_str(&text),
                    None => body.push_str(&text),
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if heading.is_none() && !in_code_block {
                    body.push(' ');
                }
            }
            Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::BlockQuote(_)) => {
                body.push('\n');
            }
            _ => {}
        }
    }
    flush_chunk(&mut chunks, &title, &mut body);

    chunks
}

fn flush_chunk(chunks: &mut Vec<Chunk>, title: &str, body: &mut String) {
    let text = std::mem::take(body);
    let text = text.trim();
    if title.is_empty() && text.is_empty() {
        return;
    }
    chunks.push(Chunk {
        title: title.to_string(),
        anchor: anchor_for(title),
        text: format!("{title}:\n{text}").trim_end().to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"---
name: Loops
---
Preamble text.

# For loops

Iterate with `for`.

```cpp
for (int i = 0; i < n; ++i) {}
```

:::challenge{id=ex1 title="Sum"}
Sum the numbers.
:::

| a | b |
| - | - |

## Ranges: `auto`

Use ranges.
"#;

    #[test]
    fn clean_page_drops_front_matter_directives_and_tables() {
        let cleaned = clean_page(PAGE);
        assert!(!cleaned.contains("name: Loops"));
        assert!(!cleaned.contains(":::"));
        assert!(!cleaned.contains("| a | b |"));
        assert!(cleaned.contains("Sum the numbers."));
    }

    #[test]
    fn splits_at_headings_and_skips_code() {
        let chunks = split_page(PAGE);
        let titles: Vec<_> = chunks.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["", "For loops", "Ranges: auto"]);

        assert_eq!(chunks[0].text, ":\nPreamble text.");
        assert!(chunks[1].text.starts_with("For loops:\n"));
        assert!(chunks[1].text.contains("Iterate with for."));
        assert!(chunks[1].text.contains("Sum the numbers."));
        assert!(!chunks[1].text.contains("int i"));
    }

    #[test]
    fn anchors_are_slugged() {
        assert_eq!(anchor_for("Ranges: `auto`"), "Ranges-auto");
        assert_eq!(anchor_for("For loops"), "For-loops");
    }

    #[test]
    fn empty_page_has_no_chunks() {
        assert!(split_page("---\nname: x\n---\n").is_empty());
    }
}
