//! Self-contained HTML page: status badge, analysis, prediction, line chart
//! and tile strip.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::present::ChartSeries;
use crate::session::App;

const CHART_W: f64 = 720.0;
const CHART_H: f64 = 260.0;
const PAD: f64 = 32.0;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Line chart as inline SVG. The y axis starts at zero.
pub fn chart_svg(chart: &ChartSeries) -> String {
    let points = chart.points();
    if points.is_empty() {
        return r#"<p class="empty">No results yet</p>"#.to_string();
    }
    let max = points.iter().copied().fold(0.0_f64, f64::max).max(f64::MIN_POSITIVE);
    let span = (points.len().max(2) - 1) as f64;
    let x_of = |i: usize| PAD + (CHART_W - 2.0 * PAD) * (i as f64 / span);
    let y_of = |v: f64| CHART_H - PAD - (CHART_H - 2.0 * PAD) * (v / max);

    let path: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{:.1},{:.1}", x_of(i), y_of(*v)))
        .collect();
    let labels: String = chart
        .labels()
        .iter()
        .enumerate()
        .map(|(i, label)| {
            format!(
                r#"<text x="{:.1}" y="{:.1}" class="lbl">{}</text>"#,
                x_of(i),
                CHART_H - PAD / 3.0,
                label
            )
        })
        .collect();

    format!(
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <line x1="{pad}" y1="{base:.1}" x2="{right:.1}" y2="{base:.1}" class="axis"/>
  <text x="4" y="{base:.1}" class="lbl">0</text>
  <text x="4" y="{top:.1}" class="lbl">{max:.2}</text>
  <polyline fill="none" stroke="rgba(75, 192, 192, 1)" stroke-width="1" points="{path}"/>
  {labels}
</svg>"##,
        w = CHART_W,
        h = CHART_H,
        pad = PAD,
        base = CHART_H - PAD,
        right = CHART_W - PAD,
        top = PAD,
        max = max,
        path = path.join(" "),
        labels = labels,
    )
}

pub fn render(app: &App) -> String {
    let tiles: String = app
        .tiles()
        .iter()
        .map(|t| {
            format!(
                r#"<div class="result-block" style="background-color:{}">{}</div>"#,
                t.color(),
                escape(&t.text)
            )
        })
        .collect();

    TEMPLATE
        .replace("__STATUS_CLASS__", app.status.as_str())
        .replace("__STATUS__", &escape(app.status.label()))
        .replace("__ANALYSIS__", &escape(app.analysis_line()))
        .replace("__PREDICTION__", &escape(app.prediction_line()))
        .replace("__CHART__", &chart_svg(app.chart()))
        .replace("__TILES__", &tiles)
}

pub fn write(app: &App, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(path, render(app)).with_context(|| format!("writing {}", path.display()))
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Results</title>
  <style>
    body { font-family: sans-serif; margin: 24px; background: #fafafa; color: #222; }
    .api-status { display: inline-block; padding: 4px 10px; border-radius: 4px; color: #fff; }
    .api-status.online { background: #2e7d32; }
    .api-status.offline { background: #c62828; }
    .api-status.unknown { background: #757575; }
    .axis { stroke: #999; }
    .lbl { font-size: 10px; fill: #555; }
    .empty { color: #888; }
    #resultsContainer { display: flex; flex-wrap: wrap; gap: 4px; max-height: 240px; overflow-y: auto; }
    .result-block { color: #fff; padding: 6px 8px; border-radius: 4px; font-weight: bold; }
  </style>
</head>
<body>
  <div id="apiStatus" class="api-status __STATUS_CLASS__">__STATUS__</div>
  <div id="resultsChart">__CHART__</div>
  <div id="resultsContainer">__TILES__</div>
  <p id="analysis-output">__ANALYSIS__</p>
  <p id="prediction-output">__PREDICTION__</p>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ApiStatus, Config};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }

    #[test]
    fn test_render_includes_tiles_and_status() {
        let mut app = App::new(&Config::default());
        app.status = ApiStatus::Offline;
        for raw in ["1.5", "4", "12"] {
            app.submit(raw).unwrap();
        }
        let html = render(&app);
        assert!(html.contains(r#"class="api-status offline""#));
        assert_eq!(html.matches(r#"class="result-block""#).count(), 3);
        assert!(html.contains("#00BFFF") && html.contains("#8A2BE2") && html.contains("#FF00FF"));
        assert!(html.contains("<polyline"));
        assert!(!html.contains("__"));
    }

    #[test]
    fn test_empty_chart_placeholder() {
        let app = App::new(&Config::default());
        assert!(render(&app).contains("No results yet"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/dash.html");
        write(&App::new(&Config::default()), &path).unwrap();
        assert!(path.exists());
    }
}
