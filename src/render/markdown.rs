//! Markdown to HTML conversion.
//!
//! Markdown is converted with pulldown-cmark (tables, footnotes, strikethrough
//! and task lists enabled). The event stream is adjusted before rendering to
//! implement hard wraps, bare-URL linking and new-tab links.

use crate::config::BuildConfig;
use crate::constants::MAX_HEADING_LEVEL;
use pulldown_cmark::{html as md_html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream};
use pulldown_cmark_escape::{escape_href, escape_html};
use regex::Regex;
use std::sync::LazyLock;

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'`]+"#).expect("bare URL pattern is a valid regex")
});

/// One opening-tag and one closing-tag pattern per heading level (index 0 is `h1`).
static HEADING_TAGS: LazyLock<Vec<(Regex, Regex)>> = LazyLock::new(|| {
    (1..=MAX_HEADING_LEVEL)
        .map(|level| {
            (
                Regex::new(&format!(r"<h{}(\s|>)", level)).expect("heading pattern is a valid regex"),
                Regex::new(&format!(r"</h{}>", level)).expect("heading pattern is a valid regex"),
            )
        })
        .collect()
});

/// Rendering switches, usually taken from the `[build]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Render single newlines inside paragraphs as `<br />`.
    pub hard_wraps: bool,
    /// Turn bare `http(s)://` URLs into links.
    pub linkify: bool,
    /// Open absolute links in a new tab.
    pub link_target_blank: bool,
    /// Heading levels added by [`MarkdownRenderer::render_entry`].
    pub heading_shift: u8,
}

impl From<&BuildConfig> for MarkdownOptions {
    fn from(build: &BuildConfig) -> Self {
        MarkdownOptions {
            hard_wraps: build.hard_wraps,
            linkify: build.linkify,
            link_target_blank: build.link_target_blank,
            heading_shift: build.heading_shift,
        }
    }
}

/// Converts entry Markdown to HTML.
///
/// # Examples
///
/// ```
/// use daybook::render::markdown::{MarkdownOptions, MarkdownRenderer};
///
/// let renderer = MarkdownRenderer::new(MarkdownOptions {
///     heading_shift: 2,
///     ..MarkdownOptions::default()
/// });
/// assert_eq!(renderer.render("# Hello"), "<h1>Hello</h1>\n");
/// assert_eq!(renderer.render_entry("# Hello"), "<h3>Hello</h3>\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        MarkdownRenderer { options }
    }

    /// Converts `markdown` to HTML without shifting headings.
    pub fn render(&self, markdown: &str) -> String {
        let mut extensions = Options::empty();
        extensions.insert(Options::ENABLE_TABLES);
        extensions.insert(Options::ENABLE_FOOTNOTES);
        extensions.insert(Options::ENABLE_STRIKETHROUGH);
        extensions.insert(Options::ENABLE_TASKLISTS);

        let parser = TextMergeStream::new(Parser::new_ext(markdown, extensions));
        let events = self.adjust_events(parser);

        let mut html_output = String::with_capacity(markdown.len() * 2);
        md_html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Converts `markdown` to HTML and applies the configured heading shift.
    pub fn render_entry(&self, markdown: &str) -> String {
        shift_headings(&self.render(markdown), self.options.heading_shift)
    }

    fn adjust_events<'a>(&self, events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::new();
        let mut in_link = false;
        let mut in_code_block = false;
        let mut raw_link_open = false;

        for event in events {
            match event {
                Event::SoftBreak if self.options.hard_wraps => out.push(Event::HardBreak),
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    out.push(Event::Start(Tag::CodeBlock(kind)));
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    out.push(Event::End(TagEnd::CodeBlock));
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    in_link = true;
                    if self.options.link_target_blank && is_absolute_url(&dest_url) {
                        raw_link_open = true;
                        out.push(Event::InlineHtml(new_tab_anchor(&dest_url, &title).into()));
                    } else {
                        out.push(Event::Start(Tag::Link {
                            link_type,
                            dest_url,
                            title,
                            id,
                        }));
                    }
                }
                Event::End(TagEnd::Link) => {
                    in_link = false;
                    if raw_link_open {
                        raw_link_open = false;
                        out.push(Event::InlineHtml("</a>".into()));
                    } else {
                        out.push(Event::End(TagEnd::Link));
                    }
                }
                Event::Text(text) if self.options.linkify && !in_link && !in_code_block => {
                    self.push_linkified(&mut out, text);
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Splits a text event around bare URLs, emitting link events for each.
    fn push_linkified<'a>(&self, out: &mut Vec<Event<'a>>, text: CowStr<'a>) {
        let mut last = 0;
        let mut found_any = false;

        for found in BARE_URL.find_iter(&text) {
            let url = trim_url_end(found.as_str());
            if url.len() <= "https://".len() {
                continue;
            }
            found_any = true;
            let start = found.start();
            let end = start + url.len();

            if start > last {
                out.push(Event::Text(text[last..start].to_string().into()));
            }
            if self.options.link_target_blank {
                out.push(Event::InlineHtml(new_tab_anchor(url, "").into()));
                out.push(Event::Text(url.to_string().into()));
                out.push(Event::InlineHtml("</a>".into()));
            } else {
                let dest: CowStr<'a> = url.to_string().into();
                out.push(Event::Start(Tag::Link {
                    link_type: LinkType::Autolink,
                    dest_url: dest.clone(),
                    title: "".into(),
                    id: "".into(),
                }));
                out.push(Event::Text(dest));
                out.push(Event::End(TagEnd::Link));
            }
            last = end;
        }

        if !found_any {
            out.push(Event::Text(text));
        } else if last < text.len() {
            out.push(Event::Text(text[last..].to_string().into()));
        }
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Drops trailing punctuation from a bare URL match.
///
/// A closing parenthesis is kept while it balances an opening one in the URL.
fn trim_url_end(url: &str) -> &str {
    let mut url = url;
    loop {
        if let Some(stripped) = url.strip_suffix(['.', ',', ';', ':', '!', '?']) {
            url = stripped;
        } else if url.ends_with(')') && url.matches(')').count() > url.matches('(').count() {
            url = &url[..url.len() - 1];
        } else {
            return url;
        }
    }
}

/// Builds an opening anchor escaped the same way pulldown-cmark escapes links.
fn new_tab_anchor(href: &str, title: &str) -> String {
    let mut anchor = String::from("<a href=\"");
    let _ = escape_href(&mut anchor, href);
    if !title.is_empty() {
        anchor.push_str("\" title=\"");
        let _ = escape_html(&mut anchor, title);
    }
    anchor.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
    anchor
}

/// Shifts every HTML heading by `shift` levels, clamping at `h6`.
///
/// Levels are rewritten from `h6` down to `h1` so a heading moved to a deeper
/// level is never matched again. Attributes on opening tags are kept. A shift
/// of 0 returns the input unchanged.
///
/// # Examples
///
/// ```
/// use daybook::render::markdown::shift_headings;
///
/// assert_eq!(shift_headings("<h1>x</h1>", 4), "<h5>x</h5>");
/// assert_eq!(shift_headings("<h3 id=\"a\">x</h3>", 4), "<h6 id=\"a\">x</h6>");
/// assert_eq!(shift_headings("<h2>x</h2>", 0), "<h2>x</h2>");
/// ```
pub fn shift_headings(html: &str, shift: u8) -> String {
    let mut result = html.to_string();
    if shift == 0 {
        return result;
    }

    for level in (1..=MAX_HEADING_LEVEL).rev() {
        let new_level = level.saturating_add(shift).min(MAX_HEADING_LEVEL);
        if new_level == level {
            continue;
        }
        let (open, close) = &HEADING_TAGS[usize::from(level - 1)];
        result = open
            .replace_all(&result, format!("<h{}${{1}}", new_level).as_str())
            .into_owned();
        result = close
            .replace_all(&result, format!("</h{}>", new_level).as_str())
            .into_owned();
    }
    result
}
