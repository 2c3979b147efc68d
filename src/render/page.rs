//! The journal index page.
//!
//! The page is produced with maud from an [`IndexData`] value. Both the preview
//! server and the static builder render through [`index`], so a built site and
//! a served page are byte-identical for the same entries (apart from the
//! live-reload script).

use crate::constants::EVENTS_ROUTE;
use crate::dates::DateLayout;
use crate::journal::JournalEntry;
use chrono::{Datelike, NaiveDate};
use maud::{html, Markup, PreEscaped, DOCTYPE};

/// An entry prepared for the page, with year/month section markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub date: NaiveDate,
    /// The date formatted with the configured display layout.
    pub date_label: String,
    /// Rendered HTML; empty when the entry could not be loaded.
    pub content: String,
    pub show_year: bool,
    /// `yyyy`
    pub year_label: String,
    pub show_month: bool,
    /// `yyyy-mm`
    pub month_label: String,
}

/// Navigation for one year: the year and its months (`mm`) in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearNav {
    pub year: String,
    pub months: Vec<String>,
}

/// Everything the index page needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexData {
    pub title: String,
    pub entries: Vec<TemplateEntry>,
    pub year_navs: Vec<YearNav>,
    pub css: String,
    pub live_reload: bool,
}

/// Marks year and month boundaries while walking already sorted entries.
///
/// A year (or month) section starts whenever the year (or year-month)
/// differs from the previous entry's, so the markers follow the sort order.
/// A new year opens a navigation group with its first month; a new month
/// within the same year is appended to the current group.
pub fn convert_to_template_entries(
    entries: &[JournalEntry],
    date_layout: &DateLayout,
) -> (Vec<TemplateEntry>, Vec<YearNav>) {
    let mut template_entries = Vec::with_capacity(entries.len());
    let mut year_navs: Vec<YearNav> = Vec::new();
    let mut last_year = String::new();
    let mut last_month = String::new();

    for entry in entries {
        let date = entry.date();
        let year = format!("{:04}", date.year());
        let month = format!("{:02}", date.month());
        let year_month = format!("{}-{}", year, month);

        let show_year = year != last_year;
        let show_month = year_month != last_month;

        if show_year {
            year_navs.push(YearNav {
                year: year.clone(),
                months: vec![month],
            });
            last_year = year.clone();
        } else if show_month {
            if let Some(nav) = year_navs.last_mut() {
                nav.months.push(month);
            }
        }
        last_month = year_month.clone();

        template_entries.push(TemplateEntry {
            date,
            date_label: date_layout.format(date),
            content: entry.rendered_html().unwrap_or_default().to_string(),
            show_year,
            year_label: year,
            show_month,
            month_label: year_month,
        });
    }

    (template_entries, year_navs)
}

const LIVE_RELOAD_SCRIPT: &str = r#"
(function () {
  var source = new EventSource("__EVENTS__");
  source.onmessage = function (event) {
    if (event.data === "reload") {
      window.location.reload();
    }
  };
})();
"#;

/// Renders the full index page.
pub fn index(data: &IndexData) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (data.title) }
                style { (PreEscaped(&data.css)) }
            }
            body {
                header {
                    h1 { (data.title) }
                    @if !data.year_navs.is_empty() {
                        nav {
                            @for year_nav in &data.year_navs {
                                div class="year-nav" {
                                    a href={ "#y" (year_nav.year) } { (year_nav.year) }
                                    " "
                                    @for month in &year_nav.months {
                                        a class="month-link" href={ "#m" (year_nav.year) "-" (month) } { (month) }
                                        " "
                                    }
                                }
                            }
                        }
                    }
                }
                main {
                    @for entry in &data.entries {
                        @if entry.show_year {
                            h2 id={ "y" (entry.year_label) } { (entry.year_label) }
                        }
                        @if entry.show_month {
                            h3 id={ "m" (entry.month_label) } { (entry.month_label) }
                        }
                        @let day = entry.date.to_string();
                        article id={ "d" (day) } {
                            h4 {
                                a href={ "#d" (day) } { (entry.date_label) }
                            }
                            (PreEscaped(&entry.content))
                        }
                    }
                }
                @if data.live_reload {
                    script { (PreEscaped(LIVE_RELOAD_SCRIPT.replace("__EVENTS__", EVENTS_ROUTE))) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(y: i32, m: u32, d: u32) -> JournalEntry {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        JournalEntry::new(format!("{}.md", date), date)
            .with_rendered_html(format!("<p>entry {}</p>", date))
    }

    fn layout() -> DateLayout {
        DateLayout::new("2006-01-02")
    }

    #[test]
    fn test_markers_follow_sort_order() {
        let entries = vec![
            entry(2024, 2, 10),
            entry(2024, 2, 1),
            entry(2024, 1, 31),
            entry(2023, 12, 25),
            entry(2023, 11, 2),
        ];
        let (items, navs) = convert_to_template_entries(&entries, &layout());

        let flags: Vec<(bool, bool)> = items.iter().map(|e| (e.show_year, e.show_month)).collect();
        assert_eq!(
            flags,
            vec![(true, true), (false, false), (false, true), (true, true), (false, true)]
        );
        assert_eq!(items[2].month_label, "2024-01");
        assert_eq!(items[3].year_label, "2023");
        assert_eq!(
            navs,
            vec![
                YearNav {
                    year: "2024".to_string(),
                    months: vec!["02".to_string(), "01".to_string()],
                },
                YearNav {
                    year: "2023".to_string(),
                    months: vec!["12".to_string(), "11".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_same_month_different_year_starts_new_sections() {
        let entries = vec![entry(2023, 5, 1), entry(2024, 5, 1)];
        let (items, navs) = convert_to_template_entries(&entries, &layout());
        assert!(items[1].show_year);
        assert!(items[1].show_month);
        assert_eq!(navs.len(), 2);
    }

    #[test]
    fn test_missing_content_renders_empty() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = vec![JournalEntry::new("2024-01-01.md", date)];
        let (items, _) = convert_to_template_entries(&entries, &DateLayout::new("Jan 2, 2006"));
        assert_eq!(items[0].content, "");
        assert_eq!(items[0].date_label, "Jan 1, 2024");
    }

    #[test]
    fn test_index_page_contents() {
        let entries = vec![entry(2024, 1, 2), entry(2024, 1, 1)];
        let (items, navs) = convert_to_template_entries(&entries, &layout());
        let data = IndexData {
            title: "My <Journal>".to_string(),
            entries: items,
            year_navs: navs,
            css: "body { color: red; }".to_string(),
            live_reload: false,
        };

        let page = index(&data).into_string();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>My &lt;Journal&gt;</title>"));
        assert!(page.contains("body { color: red; }"));
        assert!(page.contains("<h2 id=\"y2024\">2024</h2>"));
        assert!(page.contains("<h3 id=\"m2024-01\">2024-01</h3>"));
        assert!(page.contains("href=\"#m2024-01\""));
        let first = page.find("<p>entry 2024-01-02</p>").unwrap();
        let second = page.find("<p>entry 2024-01-01</p>").unwrap();
        assert!(first < second);
        assert!(!page.contains("EventSource"));
    }

    #[test]
    fn test_index_page_live_reload_script() {
        let data = IndexData {
            title: "J".to_string(),
            entries: Vec::new(),
            year_navs: Vec::new(),
            css: String::new(),
            live_reload: true,
        };
        let page = index(&data).into_string();
        assert!(page.contains("new EventSource(\"/events\")"));
        assert!(!page.contains("<nav>"));
    }
}
