//! HTML rendering for the journal.
//!
//! - [`markdown`] converts entry Markdown to HTML and shifts headings
//! - [`page`] produces the index page with maud
//! - [`css`] resolves the configured stylesheet
//!
//! All dynamic text placed in the page by maud is escaped; entry HTML produced
//! by pulldown-cmark is inserted as-is.

pub mod css;
pub mod markdown;
pub mod page;

pub use markdown::{shift_headings, MarkdownOptions, MarkdownRenderer};
pub use page::{IndexData, TemplateEntry, YearNav};
