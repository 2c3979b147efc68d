//! Template expansion for entry content and shell commands.
//!
//! Templates use a small action syntax:
//!
//! - `{{ .Date }}`, `{{ .BaseDir }}`, `{{ .File }}`, `{{ .Pattern }}` insert a variable
//!   (`BaseDirectory`, `TodayFile` and `DayFile` are accepted as aliases)
//! - `{{ .Env.HOME }}` or `{{ index .Env "HOME" }}` insert an environment variable
//! - `{{/* comment */}}` expands to nothing
//! - `{{- ` and ` -}}` trim the whitespace before or after the action
//!
//! Anything else inside `{{ }}` is rejected when the template is parsed, so a
//! malformed template never expands to a partially substituted string.

use crate::errors::TemplateError;
use std::collections::BTreeMap;

/// A variable reference resolved at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Date,
    BaseDir,
    File,
    Pattern,
    Env(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// The closed set of values a template may reference.
///
/// # Examples
///
/// ```
/// use daybook::template::{expand, TemplateVars};
///
/// let vars = TemplateVars::new("2024-03-05")
///     .with_file("/tmp/j/2024-03-05.md")
///     .with_env_var("EDITOR", "nano");
/// let command = expand("{{ .Env.EDITOR }} \"{{ .File }}\"", &vars).unwrap();
/// assert_eq!(command, "nano \"/tmp/j/2024-03-05.md\"");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    /// The entry date, already formatted with the configured date layout
    pub date: String,
    /// The journal root
    pub base_dir: String,
    /// The resolved entry path
    pub file: String,
    /// The search term, empty outside of `search`
    pub pattern: String,
    /// Environment variables available through `.Env`
    pub env: BTreeMap<String, String>,
}

impl TemplateVars {
    /// Creates a variable set for `date` with an empty environment.
    pub fn new(date: impl Into<String>) -> Self {
        TemplateVars {
            date: date.into(),
            ..TemplateVars::default()
        }
    }

    /// Sets the journal root.
    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Sets the resolved entry path.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Sets the search term.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Adds a single environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Replaces the environment with the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are left out.
    pub fn with_process_env(mut self) -> Self {
        self.env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        self
    }

    fn resolve(&self, field: &Field) -> &str {
        match field {
            Field::Date => &self.date,
            Field::BaseDir => &self.base_dir,
            Field::File => &self.file,
            Field::Pattern => &self.pattern,
            Field::Env(key) => self.env.get(key).map(String::as_str).unwrap_or(""),
        }
    }
}

/// A parsed template, ready to be rendered any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses template text.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Syntax` for unclosed, empty or unsupported actions
    /// and `TemplateError::UnknownField` for variables outside the supported set.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut trim_next_text = false;
        let mut offset = 0;

        while let Some(open) = source[offset..].find("{{") {
            let start = offset + open;
            let inner_start = start + 2;
            let close = source[inner_start..]
                .find("}}")
                .ok_or_else(|| TemplateError::Syntax {
                    position: start,
                    message: "unclosed action".to_string(),
                })?;
            let inner_end = inner_start + close;

            push_text(&mut text, &source[offset..start], trim_next_text);
            let (inner, trim_left, trim_right) = strip_trim_markers(&source[inner_start..inner_end]);
            if trim_left {
                let kept = text.trim_end().len();
                text.truncate(kept);
            }

            if let Some(field) = parse_action(inner, start)? {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Field(field));
            }

            trim_next_text = trim_right;
            offset = inner_end + 2;
        }

        push_text(&mut text, &source[offset..], trim_next_text);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Template { segments })
    }

    /// Renders the template against `vars`.
    pub fn render(&self, vars: &TemplateVars) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(vars.resolve(field)),
            }
        }
        out
    }
}

/// Parses and renders `template` in one step.
///
/// # Errors
///
/// See [`Template::parse`].
pub fn expand(template: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
    Ok(Template::parse(template)?.render(vars))
}

fn push_text(buffer: &mut String, text: &str, trim_start: bool) {
    if trim_start {
        buffer.push_str(text.trim_start());
    } else {
        buffer.push_str(text);
    }
}

/// Splits `{{- x -}}` markers off an action body.
fn strip_trim_markers(inner: &str) -> (&str, bool, bool) {
    let mut body = inner;
    let mut trim_left = false;
    let mut trim_right = false;

    if let Some(rest) = body.strip_prefix('-') {
        if rest.starts_with(|c: char| c.is_ascii_whitespace()) {
            body = rest;
            trim_left = true;
        }
    }
    if let Some(rest) = body.strip_suffix('-') {
        if rest.ends_with(|c: char| c.is_ascii_whitespace()) {
            body = rest;
            trim_right = true;
        }
    }
    (body.trim(), trim_left, trim_right)
}

/// Parses a trimmed action body. Comments yield `None`.
fn parse_action(body: &str, position: usize) -> Result<Option<Field>, TemplateError> {
    let syntax = |message: &str| TemplateError::Syntax {
        position,
        message: message.to_string(),
    };

    if body.is_empty() {
        return Err(syntax("empty action"));
    }
    if body.starts_with("/*") {
        return if body.ends_with("*/") && body.len() >= 4 {
            Ok(None)
        } else {
            Err(syntax("unterminated comment"))
        };
    }
    if let Some(args) = body.strip_prefix("index") {
        if args.starts_with(|c: char| c.is_ascii_whitespace()) {
            return parse_index(args.trim(), position).map(Some);
        }
    }
    if let Some(path) = body.strip_prefix('.') {
        return parse_field_path(path, position).map(Some);
    }

    Err(syntax(&format!("unsupported action {:?}", body)))
}

fn parse_field_path(path: &str, position: usize) -> Result<Field, TemplateError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| !is_identifier(p)) {
        return Err(TemplateError::Syntax {
            position,
            message: format!("invalid field reference \".{}\"", path),
        });
    }

    match parts.as_slice() {
        ["Date"] => Ok(Field::Date),
        ["BaseDir"] | ["BaseDirectory"] => Ok(Field::BaseDir),
        ["File"] | ["TodayFile"] | ["DayFile"] => Ok(Field::File),
        ["Pattern"] => Ok(Field::Pattern),
        ["Env", key] => Ok(Field::Env((*key).to_string())),
        ["Env"] => Err(TemplateError::Syntax {
            position,
            message: "Env needs a variable name, as in .Env.HOME".to_string(),
        }),
        _ => Err(TemplateError::UnknownField {
            field: path.to_string(),
        }),
    }
}

/// Parses the arguments of `index .Env "KEY"`.
fn parse_index(args: &str, position: usize) -> Result<Field, TemplateError> {
    let syntax = |message: &str| TemplateError::Syntax {
        position,
        message: message.to_string(),
    };

    let rest = args
        .strip_prefix(".Env")
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_whitespace()))
        .ok_or_else(|| syntax("index is only supported on .Env"))?
        .trim();

    let key = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| rest.strip_prefix('`').and_then(|r| r.strip_suffix('`')))
        .filter(|key| !key.contains(['"', '`']))
        .ok_or_else(|| syntax("index key must be a quoted string"))?;

    Ok(Field::Env(key.to_string()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
