//! Notebook (nbformat 4) to static HTML, following the layout of the basic export template.
//!
//! Cells are emitted in document order. Markdown cells go through CommonMark with
//! math spans protected so the math bootstrap in the post header can typeset them.
//! Code cells get an `In [n]:` prompt and their outputs; rich outputs pick the
//! first available representation from [`MIME_PREFERENCE`]. Interactive widget
//! state is never rendered.

use std::borrow::Cow;
use std::sync::OnceLock;

use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Representations tried for `display_data` / `execute_result`, best first.
pub const MIME_PREFERENCE: [&str; 6] = [
    "text/html",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "text/markdown",
    "text/plain",
];

const DEFAULT_LANGUAGE: &str = "python";

/// Private-use codepoints bracketing math placeholders; notebook text never carries them.
const MATH_OPEN: char = '\u{E000}';
const MATH_CLOSE: char = '\u{E001}';

#[derive(Debug, Deserialize)]
struct Notebook {
    #[serde(default)]
    metadata: NotebookMetadata,
    cells: Vec<Cell>,
}

#[derive(Debug, Default, Deserialize)]
struct NotebookMetadata {
    #[serde(default)]
    language_info: Option<LanguageInfo>,
}

#[derive(Debug, Deserialize)]
struct LanguageInfo {
    #[serde(default)]
    name: Option<String>,
}

/// Multiline text: either one string or a list of lines that already carry their newlines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    One(String),
    Lines(Vec<String>),
}

impl Default for Text {
    fn default() -> Self {
        Text::One(String::new())
    }
}

impl Text {
    fn joined(&self) -> Cow<'_, str> {
        match self {
            Text::One(s) => Cow::Borrowed(s),
            Text::Lines(lines) => Cow::Owned(lines.concat()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
enum Cell {
    Markdown {
        #[serde(default)]
        source: Text,
    },
    Code {
        #[serde(default)]
        source: Text,
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Raw {
        #[serde(default)]
        source: Text,
        #[serde(default)]
        metadata: RawMetadata,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    raw_mimetype: Option<String>,
}

impl RawMetadata {
    fn is_html(&self) -> bool {
        [&self.format, &self.raw_mimetype]
            .into_iter()
            .flatten()
            .any(|mime| mime.eq_ignore_ascii_case("text/html"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
enum Output {
    Stream {
        #[serde(default)]
        name: String,
        #[serde(default)]
        text: Text,
    },
    DisplayData {
        #[serde(default)]
        data: Map<String, Value>,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        data: Map<String, Value>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// Convert raw notebook JSON into HTML. The error string describes what was malformed.
pub fn notebook_to_html(raw: &[u8]) -> Result<String, String> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| format!("notebook is not valid JSON: {e}"))?;
    let Some(object) = value.as_object() else {
        return Err("notebook top level is not a JSON object".to_string());
    };
    match object.get("nbformat").and_then(Value::as_u64) {
        Some(major) if major >= 4 => {}
        Some(major) => return Err(format!("nbformat {major} is not supported (need 4 or later)")),
        None => return Err("notebook has no nbformat version".to_string()),
    }

    let notebook: Notebook =
        serde_json::from_value(value).map_err(|e| format!("malformed notebook structure: {e}"))?;
    let language = notebook
        .metadata
        .language_info
        .as_ref()
        .and_then(|info| info.name.as_deref())
        .unwrap_or(DEFAULT_LANGUAGE);

    let mut out = String::new();
    for cell in &notebook.cells {
        match cell {
            Cell::Markdown { source } => render_markdown_cell(&mut out, &source.joined()),
            Cell::Code {
                source,
                execution_count,
                outputs,
            } => render_code_cell(&mut out, &source.joined(), *execution_count, outputs, language),
            Cell::Raw { source, metadata } => {
                if metadata.is_html() {
                    out.push_str(&source.joined());
                    out.push('\n');
                }
            }
        }
    }
    Ok(out)
}

fn render_markdown_cell(out: &mut String, source: &str) {
    out.push_str("<div class=\"cell border-box-sizing text_cell rendered\">\n");
    out.push_str("<div class=\"prompt input_prompt\"></div>\n");
    out.push_str("<div class=\"inner_cell\">\n");
    out.push_str("<div class=\"text_cell_render border-box-sizing rendered_html\">\n");
    out.push_str(&markdown_to_html(source));
    out.push_str("</div>\n</div>\n</div>\n");
}

fn render_code_cell(
    out: &mut String,
    source: &str,
    execution_count: Option<u64>,
    outputs: &[Output],
    language: &str,
) {
    out.push_str("<div class=\"cell border-box-sizing code_cell rendered\">\n");
    out.push_str("<div class=\"input\">\n");
    out.push_str(&format!(
        "<div class=\"prompt input_prompt\">In&nbsp;[{}]:</div>\n",
        prompt_number(execution_count)
    ));
    out.push_str("<div class=\"inner_cell\">\n<div class=\"input_area\">\n");
    out.push_str(&format!(
        "<div class=\"highlight\"><pre><code class=\"language-{}\">{}</code></pre></div>\n",
        html_escape(language),
        html_escape(source)
    ));
    out.push_str("</div>\n</div>\n</div>\n");

    if !outputs.is_empty() {
        out.push_str("<div class=\"output_wrapper\">\n<div class=\"output\">\n");
        for output in outputs {
            render_output(out, output);
        }
        out.push_str("</div>\n</div>\n");
    }
    out.push_str("</div>\n");
}

fn render_output(out: &mut String, output: &Output) {
    match output {
        Output::Stream { name, text } => {
            let stream = if name == "stderr" { "stderr" } else { "stdout" };
            output_area(
                out,
                "",
                &format!("output_stream output_{stream} output_text"),
                &format!("<pre>{}</pre>", html_escape(&text.joined())),
            );
        }
        Output::DisplayData { data } => {
            if let Some((class, body)) = render_mime_bundle(data) {
                output_area(out, "", class, &body);
            }
        }
        Output::ExecuteResult {
            execution_count,
            data,
        } => {
            if let Some((class, body)) = render_mime_bundle(data) {
                let prompt = format!("Out[{}]:", prompt_number(*execution_count));
                output_area(out, &prompt, &format!("output_execute_result {class}"), &body);
            }
        }
        Output::Error {
            ename,
            evalue,
            traceback,
        } => {
            let text = if traceback.is_empty() {
                format!("{ename}: {evalue}")
            } else {
                strip_ansi(&traceback.join("\n")).into_owned()
            };
            output_area(
                out,
                "",
                "output_text output_error",
                &format!("<pre>{}</pre>", html_escape(&text)),
            );
        }
    }
}

fn output_area(out: &mut String, prompt: &str, class: &str, body: &str) {
    out.push_str("<div class=\"output_area\">\n");
    out.push_str(&format!("<div class=\"prompt output_prompt\">{prompt}</div>\n"));
    out.push_str(&format!("<div class=\"output_subarea {class}\">\n"));
    out.push_str(body);
    out.push_str("\n</div>\n</div>\n");
}

/// Pick the preferred representation from a MIME bundle. `None` when nothing renderable is present.
fn render_mime_bundle(data: &Map<String, Value>) -> Option<(&'static str, String)> {
    let (mime, content) = MIME_PREFERENCE
        .iter()
        .find_map(|mime| data.get(*mime).and_then(mime_text).map(|c| (*mime, c)))?;
    let rendered = match mime {
        "text/html" => ("output_html rendered_html", content),
        "image/svg+xml" => ("output_svg", content),
        "image/png" | "image/jpeg" => {
            let encoded: String = content.split_whitespace().collect();
            let class = if mime == "image/png" {
                "output_png"
            } else {
                "output_jpeg"
            };
            (class, format!("<img src=\"data:{mime};base64,{encoded}\">"))
        }
        "text/markdown" => ("output_markdown rendered_html", markdown_to_html(&content)),
        _ => ("output_text", format!("<pre>{}</pre>", html_escape(&content))),
    };
    Some(rendered)
}

fn mime_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => lines
            .iter()
            .map(|line| line.as_str())
            .collect::<Option<Vec<_>>>()
            .map(|lines| lines.concat()),
        _ => None,
    }
}

fn prompt_number(execution_count: Option<u64>) -> String {
    execution_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "&nbsp;".to_string())
}

/// Render CommonMark, keeping TeX spans out of the markdown parser's reach.
fn markdown_to_html(source: &str) -> String {
    let mut spans: Vec<String> = Vec::new();
    let protected = math_regex()
        .replace_all(source, |caps: &Captures| {
            let placeholder = format!("{MATH_OPEN}{}{MATH_CLOSE}", spans.len());
            spans.push(caps[0].to_string());
            placeholder
        })
        .into_owned();

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    let mut rendered = String::with_capacity(protected.len() * 3 / 2);
    html::push_html(&mut rendered, Parser::new_ext(&protected, options));

    for (i, span) in spans.iter().enumerate() {
        rendered = rendered.replace(&format!("{MATH_OPEN}{i}{MATH_CLOSE}"), &html_escape(span));
    }
    rendered
}

fn math_regex() -> &'static Regex {
    static MATH: OnceLock<Regex> = OnceLock::new();
    MATH.get_or_init(|| {
        Regex::new(r"(?s)\$\$.+?\$\$|\\\[.+?\\\]|\\\(.+?\\\)|\$[^$\n]+?\$")
            .expect("math span pattern is valid")
    })
}

fn strip_ansi(text: &str) -> Cow<'_, str> {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ANSI pattern is valid"))
        .replace_all(text, "")
}

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}
