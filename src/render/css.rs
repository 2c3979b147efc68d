//! Stylesheet resolution for the journal page.

use crate::errors::ServerError;
use tracing::{debug, info};

/// Stylesheet used when `[build] css` is empty.
pub const DEFAULT_CSS: &str = r#"
* { box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    line-height: 1.6;
    max-width: 800px;
    margin: 0 auto;
    padding: 20px;
    background-color: #fafafa;
    color: #333;
}
header h1 { border-bottom: 2px solid #333; padding-bottom: 10px; }
a { color: #007acc; text-decoration: none; }
a:hover { text-decoration: underline; }
nav { border-bottom: 1px solid #ddd; margin-bottom: 20px; padding-bottom: 10px; }
nav .year-nav a { margin-right: 6px; }
nav .month-link { font-size: 0.9em; color: #555; }
article {
    background: white;
    padding: 20px;
    border-radius: 5px;
    box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1);
    margin-bottom: 20px;
}
article h4 { margin-top: 0; }
article pre, article code { background: #f4f4f4; }
article pre { padding: 15px; border-radius: 5px; overflow-x: auto; }
article code { padding: 2px 6px; border-radius: 3px; }
article pre code { background: none; padding: 0; }
article blockquote { border-left: 4px solid #ddd; margin: 0; padding-left: 20px; color: #666; }
article table { border-collapse: collapse; }
article th, article td { border: 1px solid #ddd; padding: 4px 8px; }
"#;

/// Resolves a `[build] css` value into stylesheet text.
///
/// - empty: the built-in stylesheet
/// - `http://` or `https://` URL: fetched once, must answer with a success status
/// - anything else: used verbatim as inline CSS
///
/// This performs blocking I/O and must not be called from inside an async runtime.
///
/// # Errors
///
/// Returns `ServerError::Css` if a URL cannot be fetched.
pub fn load_css(source: &str) -> Result<String, ServerError> {
    if source.is_empty() {
        debug!("using built-in stylesheet");
        return Ok(DEFAULT_CSS.to_string());
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        info!(url = source, "fetching stylesheet");
        return fetch_css(source);
    }

    Ok(source.to_string())
}

fn fetch_css(url: &str) -> Result<String, ServerError> {
    let css_error = |message: String| ServerError::Css {
        location: url.to_string(),
        message,
    };

    let response = reqwest::blocking::get(url).map_err(|e| css_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(css_error(format!("status {}", status.as_u16())));
    }
    response.text().map_err(|e| css_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_uses_default() {
        assert_eq!(load_css("").unwrap(), DEFAULT_CSS);
    }

    #[test]
    fn test_inline_css_is_verbatim() {
        let css = "body { background: black; }";
        assert_eq!(load_css(css).unwrap(), css);
    }

    #[test]
    fn test_unreachable_url_is_css_error() {
        let result = load_css("http://127.0.0.1:1/style.css");
        match result {
            Err(ServerError::Css { location, .. }) => {
                assert_eq!(location, "http://127.0.0.1:1/style.css")
            }
            other => panic!("expected Css error, got {:?}", other),
        }
    }
}
