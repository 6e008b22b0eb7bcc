use std::ops::Range;

use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd, html,
};
use tracing::warn;

use crate::classify::classify;
use crate::example::Example;

// ---------------------------------------------------------------------------
// Markdown tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    SoftBreak,
    HardBreak,
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link { dest: String, content: Vec<Inline> },
    Image { dest: String, alt: Vec<Inline> },
    Html(String),
}

/// A block-level markdown node.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkdownNode {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    /// Fenced or indented; `content` is the raw text.
    CodeBlock {
        info: Option<String>,
        content: String,
        /// Byte range within the parsed text.
        span: Range<usize>,
    },
    BlockQuote(Vec<MarkdownNode>),
    List { ordered: bool, items: Vec<Vec<MarkdownNode>> },
    Html(String),
    Rule,
}

impl MarkdownNode {
    /// All text content, depth first, with formatting dropped.
    pub fn plain_text(&self) -> String {
        match self {
            MarkdownNode::Paragraph(inlines) | MarkdownNode::Heading { content: inlines, .. } => {
                inlines_text(inlines)
            }
            MarkdownNode::CodeBlock { content, .. } => content.clone(),
            MarkdownNode::BlockQuote(children) => blocks_text(children),
            MarkdownNode::List { items, .. } => items
                .iter()
                .map(|item| blocks_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
            MarkdownNode::Html(raw) => raw.clone(),
            MarkdownNode::Rule => String::new(),
        }
    }
}

fn blocks_text(nodes: &[MarkdownNode]) -> String {
    nodes
        .iter()
        .map(MarkdownNode::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn inlines_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(s) | Inline::Code(s) | Inline::Html(s) => text.push_str(s),
            Inline::SoftBreak | Inline::HardBreak => text.push('\n'),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link {
                content: children, ..
            }
            | Inline::Image { alt: children, .. } => text.push_str(&inlines_text(children)),
        }
    }
    text
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn options() -> Options {
    Options::ENABLE_STRIKETHROUGH
}

// ---------------------------------------------------------------------------
// Parsing: pulldown-cmark events → MarkdownNode sequence
// ---------------------------------------------------------------------------

/// Parse markdown into its top-level block nodes, in document order.
pub fn parse(text: &str) -> Vec<MarkdownNode> {
    let events: Vec<(Event<'_>, Range<usize>)> =
        CmarkParser::new_ext(text, options()).into_offset_iter().collect();
    let mut i = 0;
    collect_blocks(&events, &mut i, &|_| false)
}

/// Render markdown to HTML.
pub fn to_html(text: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, CmarkParser::new_ext(text, options()));
    out
}

/// Collect block nodes until a matching End tag (consumed) or the end of input.
fn collect_blocks(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<MarkdownNode> {
    let mut nodes = Vec::new();

    while *i < events.len() {
        let (ref ev, ref range) = events[*i];
        match ev {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Paragraph) => {
                *i += 1;
                let inlines = collect_inlines(events, i, &|e| matches!(e, TagEnd::Paragraph));
                nodes.push(MarkdownNode::Paragraph(inlines));
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let level = heading_level_to_u8(level);
                *i += 1;
                let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Heading(_)));
                nodes.push(MarkdownNode::Heading { level, content });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                let span = range.clone();
                *i += 1;
                let content = collect_text(events, i, &|e| matches!(e, TagEnd::CodeBlock));
                nodes.push(MarkdownNode::CodeBlock {
                    info,
                    content,
                    span,
                });
            }
            Event::Start(Tag::BlockQuote(_)) => {
                *i += 1;
                let children = collect_blocks(events, i, &|e| matches!(e, TagEnd::BlockQuote(_)));
                nodes.push(MarkdownNode::BlockQuote(children));
            }
            Event::Start(Tag::List(start)) => {
                let ordered = start.is_some();
                *i += 1;
                let items = collect_list_items(events, i);
                nodes.push(MarkdownNode::List { ordered, items });
            }
            Event::Start(Tag::HtmlBlock) => {
                *i += 1;
                let raw = collect_text(events, i, &|e| matches!(e, TagEnd::HtmlBlock));
                nodes.push(MarkdownNode::Html(raw));
            }
            Event::Rule => {
                nodes.push(MarkdownNode::Rule);
                *i += 1;
            }
            // Tight list items hold their inlines directly, with no paragraph.
            _ if starts_inline(ev) => {
                let mut inlines = Vec::new();
                while *i < events.len() && starts_inline(&events[*i].0) {
                    if let Some(inline) = collect_inline(events, i) {
                        inlines.push(inline);
                    }
                }
                nodes.push(MarkdownNode::Paragraph(inlines));
            }
            _ => {
                *i += 1;
            }
        }
    }

    nodes
}

fn collect_list_items(events: &[(Event<'_>, Range<usize>)], i: &mut usize) -> Vec<Vec<MarkdownNode>> {
    let mut items = Vec::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::List(_)) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Item) => {
                *i += 1;
                items.push(collect_blocks(events, i, &|e| matches!(e, TagEnd::Item)));
            }
            _ => {
                *i += 1;
            }
        }
    }

    items
}

/// Concatenate raw text until a matching End tag.
fn collect_text(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::Html(s) => text.push_str(s),
            _ => {}
        }
        *i += 1;
    }

    text
}

fn starts_inline(ev: &Event<'_>) -> bool {
    matches!(
        ev,
        Event::Text(_)
            | Event::Code(_)
            | Event::InlineHtml(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::Start(
                Tag::Emphasis
                    | Tag::Strong
                    | Tag::Strikethrough
                    | Tag::Link { .. }
                    | Tag::Image { .. }
            )
    )
}

/// Collect inline nodes until a matching End tag.
fn collect_inlines(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<Inline> {
    let mut inlines = Vec::new();

    while *i < events.len() {
        if let Event::End(tag_end) = &events[*i].0 {
            if is_end(tag_end) {
                *i += 1;
                break;
            }
        }
        match collect_inline(events, i) {
            Some(inline) => inlines.push(inline),
            None => *i += 1,
        }
    }

    inlines
}

/// One inline node starting at `events[*i]`, or None (nothing consumed) if
/// the event does not start one.
fn collect_inline(events: &[(Event<'_>, Range<usize>)], i: &mut usize) -> Option<Inline> {
    let (ref ev, _) = events[*i];
    let inline = match ev {
        Event::Text(s) => {
            *i += 1;
            Inline::Text(s.to_string())
        }
        Event::Code(s) => {
            *i += 1;
            Inline::Code(s.to_string())
        }
        Event::InlineHtml(s) => {
            *i += 1;
            Inline::Html(s.to_string())
        }
        Event::SoftBreak => {
            *i += 1;
            Inline::SoftBreak
        }
        Event::HardBreak => {
            *i += 1;
            Inline::HardBreak
        }
        Event::Start(Tag::Emphasis) => {
            *i += 1;
            Inline::Emphasis(collect_inlines(events, i, &|e| matches!(e, TagEnd::Emphasis)))
        }
        Event::Start(Tag::Strong) => {
            *i += 1;
            Inline::Strong(collect_inlines(events, i, &|e| matches!(e, TagEnd::Strong)))
        }
        Event::Start(Tag::Strikethrough) => {
            *i += 1;
            Inline::Strikethrough(collect_inlines(events, i, &|e| {
                matches!(e, TagEnd::Strikethrough)
            }))
        }
        Event::Start(Tag::Link { dest_url, .. }) => {
            let dest = dest_url.to_string();
            *i += 1;
            let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Link));
            Inline::Link { dest, content }
        }
        Event::Start(Tag::Image { dest_url, .. }) => {
            let dest = dest_url.to_string();
            *i += 1;
            let alt = collect_inlines(events, i, &|e| matches!(e, TagEnd::Image));
            Inline::Image { dest, alt }
        }
        _ => return None,
    };
    Some(inline)
}

// ---------------------------------------------------------------------------
// Examples
// ---------------------------------------------------------------------------

/// Pair every top-level code block with the node just before it.
///
/// `first_line` is the source line on which `text` begins; example line
/// numbers are counted from it.
pub fn examples_in_markdown(text: &str, first_line: usize) -> Vec<Example> {
    let nodes = parse(text);
    let mut examples = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        let MarkdownNode::CodeBlock { content, span, .. } = node else {
            continue;
        };
        let line = first_line + text[..span.start].matches('\n').count();
        let description = match idx.checked_sub(1).and_then(|prev| nodes.get(prev)) {
            Some(prev) => prev.plain_text(),
            None => {
                warn!(line, "code block has no preceding description");
                String::new()
            }
        };
        let mut raw: Vec<&str> = content
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        // Blank trailing lines go; trailing spaces on the last real line stay.
        while raw.last().is_some_and(|l| l.trim().is_empty()) {
            raw.pop();
        }
        let lines = raw.into_iter().map(classify).collect();
        examples.push(Example::new(description, lines, line));
    }

    examples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LineKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraphs_headings_and_code() {
        let nodes = parse("# Title\n\nSome *text*.\n\n    > 1\n    1\n");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[0], MarkdownNode::Heading { level: 1, .. }));
        assert_eq!(nodes[1].plain_text(), "Some text.");
        let MarkdownNode::CodeBlock { content, info, .. } = &nodes[2] else {
            panic!("expected a code block, got {:?}", nodes[2]);
        };
        assert_eq!(content, "> 1\n1\n");
        assert_eq!(info, &None);
    }

    #[test]
    fn fenced_blocks_keep_their_info_string() {
        let nodes = parse("```js\n> 1\n```\n");
        assert!(matches!(
            &nodes[0],
            MarkdownNode::CodeBlock { info: Some(info), .. } if info == "js"
        ));
    }

    #[test]
    fn plain_text_flattens_inline_markup() {
        let nodes = parse("Returns `obj[name]`, see [docs](http://x) and **bold**\nnext line");
        assert_eq!(
            nodes[0].plain_text(),
            "Returns obj[name], see docs and bold\nnext line"
        );
    }

    #[test]
    fn tight_lists_flatten_to_item_text() {
        let nodes = parse("- one\n- two\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].plain_text(), "one\ntwo");
    }

    #[test]
    fn block_quotes_nest() {
        let nodes = parse("> quoted\n");
        assert!(matches!(&nodes[0], MarkdownNode::BlockQuote(children) if children.len() == 1));
        assert_eq!(nodes[0].plain_text(), "quoted");
    }

    #[test]
    fn html_rendering() {
        assert_eq!(to_html("*hi*"), "<p><em>hi</em></p>\n");
    }

    #[test]
    fn examples_pair_code_with_previous_node() {
        let text = "\nadd(x, y)\n\nAdds numbers.\n\n    > add(1, 2)\n    3\n\nAgain\n\n    > add(2, 2)\n    4\n";
        let examples = examples_in_markdown(text, 10);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].description, "Adds numbers.");
        assert_eq!(examples[0].line, 15);
        assert_eq!(examples[0].code(), "\nadd(1, 2)");
        assert_eq!(examples[0].expectation(), Some("3"));
        assert_eq!(examples[1].description, "Again");
        assert_eq!(examples[1].line, 20);
    }

    #[test]
    fn trailing_blank_lines_are_not_expectations() {
        let examples = examples_in_markdown("Desc\n\n```\n> 1\n1\n\n\n```\n", 1);
        let kinds: Vec<LineKind> = examples[0].lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineKind::CodeStart, LineKind::Expectation]);
    }

    #[test]
    fn trailing_spaces_on_the_last_line_are_kept() {
        let examples = examples_in_markdown("Desc\n\n```\n> 'a '\n'a' \n  \n```\n", 1);
        assert_eq!(examples[0].lines.len(), 2);
        assert_eq!(examples[0].expectation(), Some("'a' "));
    }

    #[test]
    fn code_block_first_has_empty_description() {
        let examples = examples_in_markdown("    > 1\n    1\n", 1);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].description, "");
    }

    #[test]
    fn nested_code_blocks_are_not_examples() {
        let examples = examples_in_markdown("- item\n\n      > 1\n      1\n", 1);
        assert!(examples.is_empty());
    }
}
