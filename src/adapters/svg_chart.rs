//! SVG performance chart writer.
//!
//! Draws the buy-and-hold and strategy cumulative multiples on one shared
//! y axis, with the title above and the first/last timestamps below.

use crate::domain::error::BacktestError;
use crate::ports::chart_port::{ChartPort, PerformanceChart};
use std::fs;
use std::path::PathBuf;
use tracing::info;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 420.0;
const PADDING: f64 = 50.0;
const BUY_AND_HOLD_COLOR: &str = "#1f77b4";
const STRATEGY_COLOR: &str = "#d62728";

pub struct SvgChartAdapter {
    output_path: PathBuf,
}

impl SvgChartAdapter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }
}

impl ChartPort for SvgChartAdapter {
    fn render(&self, chart: &PerformanceChart) -> Result<(), BacktestError> {
        let svg = render_svg(chart)?;
        fs::write(&self.output_path, svg)?;
        info!(path = %self.output_path.display(), "chart written");
        Ok(())
    }
}

pub fn render_svg(chart: &PerformanceChart) -> Result<String, BacktestError> {
    let n = chart.timestamps.len();
    if n == 0 {
        return Err(BacktestError::Render {
            reason: "chart has no points".into(),
        });
    }
    if chart.buy_and_hold.len() != n || chart.strategy.len() != n {
        return Err(BacktestError::Render {
            reason: format!(
                "series lengths differ: {} timestamps, {} buy-and-hold, {} strategy",
                n,
                chart.buy_and_hold.len(),
                chart.strategy.len()
            ),
        });
    }

    let all = chart.buy_and_hold.iter().chain(&chart.strategy);
    let min = all.clone().copied().fold(f64::INFINITY, f64::min);
    let max = all.copied().fold(f64::NEG_INFINITY, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if n > 1 {
        plot_width / (n - 1) as f64
    } else {
        0.0
    };

    let polyline = |values: &[f64]| -> String {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = PADDING + i as f64 * scale_x;
                let y = if range > 0.0 {
                    HEIGHT - PADDING - (v - min) * scale_y
                } else {
                    HEIGHT / 2.0
                };
                format!("{:.1},{:.1}", x, y)
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    let curves = [
        ("buy and hold", BUY_AND_HOLD_COLOR, &chart.buy_and_hold),
        ("strategy", STRATEGY_COLOR, &chart.strategy),
    ];
    let polylines: Vec<String> = curves
        .iter()
        .map(|(name, color, values)| {
            format!(
                r#"<polyline class="{}" fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                name.replace(' ', "-"),
                color,
                polyline(values.as_slice())
            )
        })
        .collect();
    let legend: Vec<String> = curves
        .iter()
        .enumerate()
        .map(|(i, (name, color, _))| {
            format!(
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12" fill="{}">{}</text>"#,
                PADDING + 10.0,
                PADDING + 15.0 + i as f64 * 16.0,
                color,
                name
            )
        })
        .collect();
    let axis_labels: Vec<String> = [(max, PADDING), (min, HEIGHT - PADDING)]
        .iter()
        .map(|(label, y)| {
            format!(
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" text-anchor="end">{:.3}</text>"#,
                PADDING - 5.0,
                y + 4.0,
                label
            )
        })
        .collect();

    let bottom = HEIGHT - PADDING;
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">
<rect width="100%" height="100%" fill="white"/>
<text x="{cx:.1}" y="{ty:.1}" font-family="sans-serif" font-size="16" text-anchor="middle">{title}</text>
<line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{b:.0}" stroke="black"/>
<line x1="{p:.0}" y1="{b:.0}" x2="{r:.0}" y2="{b:.0}" stroke="black"/>
{axis_labels}
<text x="{p:.1}" y="{dy:.1}" font-family="sans-serif" font-size="11">{first}</text>
<text x="{r:.1}" y="{dy:.1}" font-family="sans-serif" font-size="11" text-anchor="end">{last}</text>
{polylines}
{legend}
</svg>
"#,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        ty = PADDING / 2.0,
        title = escape(&chart.title),
        p = PADDING,
        b = bottom,
        r = WIDTH - PADDING,
        dy = bottom + 18.0,
        first = chart.timestamps[0],
        last = chart.timestamps[n - 1],
        axis_labels = axis_labels.join("\n"),
        polylines = polylines.join("\n"),
        legend = legend.join("\n"),
    );
    Ok(svg)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_chart(strategy: Vec<f64>) -> PerformanceChart {
        let n = strategy.len();
        PerformanceChart {
            title: "EUR_USD | SMA | 2024-01-01 | 2024-01-03 | D".into(),
            timestamps: (0..n)
                .map(|i| {
                    NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap()
                })
                .collect(),
            buy_and_hold: vec![1.0; n],
            strategy,
        }
    }

    #[test]
    fn renders_both_curves_and_title() {
        let svg = render_svg(&sample_chart(vec![1.0, 1.1, 1.2])).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("EUR_USD | SMA | 2024-01-01 | 2024-01-03 | D"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains(r#"class="buy-and-hold""#));
        assert!(svg.contains(r#"class="strategy""#));
    }

    #[test]
    fn renders_axis_labels_dates_and_legend() {
        let svg = render_svg(&sample_chart(vec![1.0, 1.1, 1.2])).unwrap();
        assert!(svg.contains(">1.200</text>"));
        assert!(svg.contains(">1.000</text>"));
        assert!(svg.contains(">2024-01-01 00:00:00</text>"));
        assert!(svg.contains(">2024-01-03 00:00:00</text>"));
        assert!(svg.contains(">buy and hold</text>"));
        assert!(svg.contains(">strategy</text>"));
        assert_eq!(svg.lines().count(), 14);
    }

    #[test]
    fn flat_curves_render() {
        let svg = render_svg(&sample_chart(vec![1.0, 1.0])).unwrap();
        assert!(svg.contains("210.0"));
    }

    #[test]
    fn title_is_escaped() {
        let mut chart = sample_chart(vec![1.0, 1.1]);
        chart.title = "A&B <x>".into();
        let svg = render_svg(&chart).unwrap();
        assert!(svg.contains("A&amp;B &lt;x&gt;"));
    }

    #[test]
    fn empty_chart_is_an_error() {
        let err = render_svg(&sample_chart(vec![])).unwrap_err();
        assert!(matches!(err, BacktestError::Render { .. }));
    }

    #[test]
    fn mismatched_lengths_are_an_error() {
        let mut chart = sample_chart(vec![1.0, 1.1]);
        chart.buy_and_hold.pop();
        assert!(matches!(render_svg(&chart), Err(BacktestError::Render { .. })));
    }

    #[test]
    fn adapter_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.svg");
        SvgChartAdapter::new(path.clone())
            .render(&sample_chart(vec![1.0, 0.9, 1.2]))
            .unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("<polyline"));
    }
}
