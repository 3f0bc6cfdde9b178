//! Ticket Description Markdown
//!
//! Extends pulldown-cmark with:
//! - Custom color syntax: %r%red%r%
//! - Syntax highlighting (syntect)
//! - Plain-text summaries for compact ticket cards

use pulldown_cmark::{html::push_html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Syntax highlighter resources (lazy loaded)
static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Option<Theme>> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme() -> Option<&'static Theme> {
    THEME
        .get_or_init(|| ThemeSet::load_defaults().themes.remove("InspiredGitHub"))
        .as_ref()
}

/// Color codes and their hex values
const COLORS: &[(&str, &str)] = &[
    ("r", "#e74c3c"), // red
    ("g", "#27ae60"), // green
    ("b", "#3498db"), // blue
    ("y", "#f1c40f"), // yellow
    ("o", "#e67e22"), // orange
    ("p", "#9b59b6"), // purple
];

/// Render a ticket description to HTML
pub fn parse_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, get_options());
    let events = transform_events(parser);
    let mut html_output = String::new();
    push_html(&mut html_output, events.into_iter());
    html_output
}

/// First `max_chars` characters of the description's text, markup removed
pub fn summary(text: &str, max_chars: usize) -> String {
    let mut plain = String::new();
    for event in Parser::new_ext(text, get_options()) {
        match event {
            Event::Text(t) | Event::Code(t) => plain.push_str(&strip_color_markers(&t)),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item) => plain.push(' '),
            _ => {}
        }
    }
    let plain = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if plain.chars().count() <= max_chars {
        plain
    } else {
        let cut: String = plain.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut.trim_end())
    }
}

fn get_options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS
}

enum State {
    Normal,
    InCodeBlock { lang: Option<String>, content: String },
}

/// Transform parser events to handle code blocks and colors
fn transform_events<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut state = State::Normal;

    for event in parser {
        match state {
            State::Normal => match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(l) if !l.is_empty() => Some(l.to_string()),
                        _ => None,
                    };
                    state = State::InCodeBlock { lang, content: String::new() };
                }
                Event::Text(text) if contains_color_syntax(&text) => events.extend(process_color_events(&text)),
                // Raw HTML in descriptions is shown, not rendered
                Event::Html(html) | Event::InlineHtml(html) => events.push(Event::Text(html)),
                other => events.push(other),
            },

            State::InCodeBlock { ref lang, ref mut content } => match event {
                Event::Text(t) => content.push_str(&t),
                Event::End(TagEnd::CodeBlock) => {
                    let html = highlight_code(content, lang.as_deref());
                    events.push(Event::Html(CowStr::from(html)));
                    state = State::Normal;
                }
                _ => {}
            },
        }
    }

    events
}

fn highlight_code(code: &str, lang: Option<&str>) -> String {
    let ss = get_syntax_set();
    let syntax = lang
        .and_then(|l| ss.find_syntax_by_token(l))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    get_theme()
        .and_then(|theme| highlighted_html_for_string(code, ss, syntax, theme).ok())
        .unwrap_or_else(|| format!("<pre><code>{}</code></pre>", escape_html(code)))
}

fn contains_color_syntax(text: &str) -> bool {
    COLORS.iter().any(|(code, _)| text.contains(&format!("%{}%", code)))
}

fn strip_color_markers(text: &str) -> String {
    COLORS
        .iter()
        .fold(text.to_string(), |acc, (code, _)| acc.replace(&format!("%{}%", code), ""))
}

/// Split text into spans for %c%...%c% color markers
fn process_color_events(text: &str) -> Vec<Event<'static>> {
    let mut events = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let earliest = COLORS
            .iter()
            .filter_map(|(code, color)| {
                let pattern = format!("%{}%", code);
                remaining.find(&pattern).map(|pos| (pos, pattern, *color))
            })
            .min_by_key(|(pos, _, _)| *pos);

        let Some((pos, pattern, color)) = earliest else {
            events.push(Event::Text(CowStr::from(remaining.to_string())));
            break;
        };

        if pos > 0 {
            events.push(Event::Text(CowStr::from(remaining[..pos].to_string())));
        }
        remaining = &remaining[pos + pattern.len()..];
        match remaining.find(&pattern) {
            Some(end_pos) => {
                events.push(Event::Html(CowStr::from(format!("<span style=\"color: {}\">", color))));
                if end_pos > 0 {
                    events.push(Event::Text(CowStr::from(remaining[..end_pos].to_string())));
                }
                events.push(Event::Html(CowStr::from("</span>")));
                remaining = &remaining[end_pos + pattern.len()..];
            }
            // Unclosed marker stays literal
            None => events.push(Event::Text(CowStr::from(pattern))),
        }
    }
    events
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_spans() {
        let html = parse_markdown("Call %r%before noon%r% please");
        assert!(html.contains("<span style=\"color: #e74c3c\">before noon</span>"));
        assert!(html.starts_with("<p>Call "));
    }

    #[test]
    fn test_unclosed_color_marker_is_literal() {
        let html = parse_markdown("50%g% done");
        assert!(html.contains("50%g% done"));
    }

    #[test]
    fn test_code_block_is_highlighted() {
        let html = parse_markdown("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre"));
        assert!(html.contains("main"));
        assert!(!html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = parse_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_task_lists() {
        let html = parse_markdown("- [x] book room\n- [ ] send agenda");
        assert!(html.contains("checked"));
        assert!(html.contains("send agenda"));
    }

    #[test]
    fn test_summary() {
        let text = "# Plan\n\nReview **%b%budget%b%** and `numbers`\n\n- first\n- second";
        assert_eq!(summary(text, 100), "Plan Review budget and numbers first second");
        assert_eq!(summary(text, 11), "Plan Revie…");
        assert_eq!(summary("", 10), "");
    }
}
