//! HTML page construction shared by the interactive documents and the
//! dashboard. Data reaches the browser as JSON script blocks, never as text
//! spliced into JavaScript.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::ArtifactError;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Make serialized JSON safe to place inside a `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
}

/// `<script type="application/json" id=..>` holding `value`.
pub fn json_block<T: Serialize + ?Sized>(id: &str, value: &T) -> Result<String, ArtifactError> {
    let json = serde_json::to_string(value)?;
    Ok(raw_json_block(id, &json))
}

/// Same as [`json_block`] for JSON that is already serialized.
pub fn raw_json_block(id: &str, json: &str) -> String {
    format!(
        "<script type=\"application/json\" id=\"{}\">{}</script>\n",
        html_escape(id),
        script_safe(json)
    )
}

/// Parses the embedded figure and draws it into `#chart`.
const FIGURE_PRELUDE: &str = r#"
const readJson = id => JSON.parse(document.getElementById(id).textContent);
const figure = readJson('figure');
Plotly.newPlot('chart', figure.data, figure.layout, Object.assign({responsive: true}, figure.config || {}));
"#;

const BASE_STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 16px; color: #222; }
h2 { margin: 0 0 12px 0; font-weight: 600; }
.controls { display: flex; flex-wrap: wrap; gap: 12px; align-items: center; margin-bottom: 12px; }
.controls label { font-size: 0.9rem; }
.controls select, .controls button { padding: 4px 8px; font-size: 0.9rem; }
.status { color: #b00020; font-size: 0.9rem; min-height: 1.2em; }
.chart { width: 100%; min-height: 600px; }
"#;

/// A single-figure document: heading, optional controls, one plotly chart.
#[derive(Debug, Default)]
pub struct FigurePage {
    pub title: String,
    pub controls: String,
    pub figure_json: String,
    data_blocks: Vec<String>,
    script: &'static str,
}

impl FigurePage {
    pub fn new(title: impl Into<String>, figure_json: String) -> Self {
        Self {
            title: title.into(),
            figure_json,
            ..Self::default()
        }
    }

    pub fn controls(mut self, html: String) -> Self {
        self.controls = html;
        self
    }

    pub fn data<T: Serialize + ?Sized>(mut self, id: &str, value: &T) -> Result<Self, ArtifactError> {
        self.data_blocks.push(json_block(id, value)?);
        Ok(self)
    }

    /// Page script run after the figure is drawn; `figure` and `readJson`
    /// are in scope.
    pub fn script(mut self, script: &'static str) -> Self {
        self.script = script;
        self
    }

    pub fn render(&self) -> String {
        let title = html_escape(&self.title);
        let controls = if self.controls.is_empty() {
            String::new()
        } else {
            format!("<div class=\"controls\">\n{}\n</div>\n", self.controls)
        };
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <script src="{cdn}" charset="utf-8"></script>
  <style>{style}</style>
</head>
<body>
<h2>{title}</h2>
{controls}<div id="chart" class="chart"></div>
{figure}{data}<script>{prelude}{script}</script>
</body>
</html>
"#,
            title = title,
            cdn = PLOTLY_CDN,
            style = BASE_STYLE,
            controls = controls,
            figure = raw_json_block("figure", &self.figure_json),
            data = self.data_blocks.concat(),
            prelude = FIGURE_PRELUDE,
            script = self.script,
        )
    }
}

/// `<option>` elements for `(value, label)` pairs.
pub fn options<V: AsRef<str>, L: AsRef<str>>(items: impl IntoIterator<Item = (V, L)>) -> String {
    items
        .into_iter()
        .map(|(v, l)| {
            format!(
                "<option value=\"{}\">{}</option>",
                html_escape(v.as_ref()),
                html_escape(l.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Write a whole document, flushing before the handle is released.
pub fn write_document(path: &Path, html: &str) -> Result<(), ArtifactError> {
    let file = File::create(path).map_err(|e| ArtifactError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(html.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| ArtifactError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn json_block_cannot_close_script() {
        let block = json_block("names", &vec!["</script><b>"]).unwrap();
        assert!(!block.contains("</script><b>"));
        assert!(block.contains("\\u003c/script>"));
        assert!(block.ends_with("</script>\n"));
    }

    #[test]
    fn page_embeds_figure_and_data() {
        let page = FigurePage::new("Côte d'Ivoire trips", "{\"data\":[],\"layout\":{}}".to_string())
            .controls(format!("<select id=\"pick\">{}</select>", options([("0", "A → B")])))
            .data("origins", &["A", "B"])
            .unwrap()
            .script("/* noop */")
            .render();
        assert!(page.contains("<title>Côte d&#x27;Ivoire trips</title>"));
        assert!(page.contains(PLOTLY_CDN));
        assert!(page.contains("id=\"figure\">{\"data\":[],\"layout\":{}}"));
        assert!(page.contains("id=\"origins\">[\"A\",\"B\"]"));
        assert!(page.contains("<option value=\"0\">A → B</option>"));
        assert!(page.contains("/* noop */"));
    }

    #[test]
    fn write_document_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.html");
        write_document(&path, "<p>ok</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>ok</p>");
        assert!(write_document(&dir.path().join("missing/doc.html"), "x").is_err());
    }
}
