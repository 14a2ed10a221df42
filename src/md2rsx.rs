//! Markdown to RSX conversion for message bodies.
//!
//! Model replies are markdown. This walks the `pulldown-cmark` event stream
//! and builds the matching Dioxus element tree. Raw HTML in a reply is shown
//! as text, never injected.

use dioxus::prelude::*;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

/// One open container and the children collected for it so far.
struct Frame<'a> {
    tag: Option<Tag<'a>>,
    children: Vec<Element>,
}

impl<'a> Frame<'a> {
    fn root() -> Self {
        Self {
            tag: None,
            children: vec![],
        }
    }
}

pub fn markdown_to_rsx(md: &str) -> Element {
    let parser = Parser::new_ext(md, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

    let mut stack: Vec<Frame> = vec![Frame::root()];
    let mut in_table_head = false;

    for ev in parser {
        match ev {
            Event::Start(tag) => {
                if matches!(tag, Tag::TableHead) {
                    in_table_head = true;
                }
                stack.push(Frame {
                    tag: Some(tag),
                    children: vec![],
                });
            }
            Event::End(_) => {
                // The root frame is never popped, unbalanced input just flattens.
                if stack.len() < 2 {
                    continue;
                }
                let Some(frame) = stack.pop() else { continue };
                let Some(tag) = frame.tag else { continue };
                if matches!(tag, Tag::TableHead) {
                    in_table_head = false;
                }
                let node = container(tag, frame.children, in_table_head);
                push(&mut stack, node);
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                push(&mut stack, rsx! { "{text}" });
            }
            Event::Code(code) => push(&mut stack, rsx! { code { "{code}" } }),
            Event::Rule => push(&mut stack, rsx! { hr {} }),
            Event::SoftBreak => push(&mut stack, rsx! { " " }),
            Event::HardBreak => push(&mut stack, rsx! { br {} }),
            _ => {}
        }
    }

    let children = stack.into_iter().flat_map(|f| f.children);
    rsx! {
        div { class: "markdown", {children} }
    }
}

fn push(stack: &mut [Frame], node: Element) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn container(tag: Tag, children: Vec<Element>, in_table_head: bool) -> Element {
    let children = children.into_iter();
    match tag {
        Tag::Paragraph => rsx! { p { {children} } },
        Tag::Heading { level, .. } => match level {
            HeadingLevel::H1 => rsx! { h1 { {children} } },
            HeadingLevel::H2 => rsx! { h2 { {children} } },
            HeadingLevel::H3 => rsx! { h3 { {children} } },
            HeadingLevel::H4 => rsx! { h4 { {children} } },
            HeadingLevel::H5 => rsx! { h5 { {children} } },
            HeadingLevel::H6 => rsx! { h6 { {children} } },
        },
        Tag::BlockQuote(_) => rsx! { blockquote { {children} } },
        Tag::CodeBlock(kind) => {
            let lang = match kind {
                CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or("").to_string(),
                CodeBlockKind::Indented => String::new(),
            };
            if lang.is_empty() {
                rsx! { pre { code { {children} } } }
            } else {
                rsx! { pre { code { class: "language-{lang}", {children} } } }
            }
        }
        Tag::HtmlBlock => rsx! { pre { {children} } },
        Tag::List(Some(_)) => rsx! { ol { {children} } },
        Tag::List(None) => rsx! { ul { {children} } },
        Tag::Item => rsx! { li { {children} } },
        Tag::Table(_) => rsx! { table { {children} } },
        Tag::TableHead => rsx! { thead { tr { {children} } } },
        Tag::TableRow => rsx! { tr { {children} } },
        Tag::TableCell if in_table_head => rsx! { th { {children} } },
        Tag::TableCell => rsx! { td { {children} } },
        Tag::Emphasis => rsx! { em { {children} } },
        Tag::Strong => rsx! { strong { {children} } },
        Tag::Strikethrough => rsx! { del { {children} } },
        Tag::Link { dest_url, title, .. } => rsx! {
            a {
                href: "{dest_url}",
                title: "{title}",
                target: "_blank",
                rel: "noopener noreferrer",
                {children}
            }
        },
        // Images are not fetched, the alt text is enough.
        Tag::Image { .. } => rsx! { span { {children} } },
        _ => rsx! { span { {children} } },
    }
}
