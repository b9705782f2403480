//! Standalone SVG comparison chart.
//!
//! Two panels side by side: mean test R² against mean fit time, then against
//! mean score time. Each model is one coloured series with ±std error bars,
//! and each point is annotated with its swept parameter value.

use std::fmt::Write;

use crate::bench::BenchmarkReport;

const PANEL_WIDTH: f64 = 520.0;
const PANEL_HEIGHT: f64 = 420.0;
const LEGEND_HEIGHT: f64 = 40.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 52.0;
const N_TICKS: usize = 5;

const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    FitTime,
    ScoreTime,
}

impl Axis {
    fn title(self) -> &'static str {
        match self {
            Axis::FitTime => "Mean fit time (s)",
            Axis::ScoreTime => "Mean score time (s)",
        }
    }
}

#[derive(Debug, Clone)]
struct Point {
    x: f64,
    y: f64,
    err: f64,
    label: String,
}

#[derive(Debug, Clone)]
struct Series<'a> {
    name: &'a str,
    color: &'static str,
    points: Vec<Point>,
}

/// Linear map from a data interval onto a pixel interval.
#[derive(Debug, Clone, Copy)]
struct Scale {
    min: f64,
    max: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn new((min, max): (f64, f64), from: f64, to: f64) -> Self {
        Self { min, max, from, to }
    }

    fn map(&self, v: f64) -> f64 {
        self.from + (v - self.min) / (self.max - self.min) * (self.to - self.from)
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let step = (self.max - self.min) / (N_TICKS - 1) as f64;
        (0..N_TICKS).map(move |i| self.min + step * i as f64)
    }
}

/// Padded data range of the finite values; `(0, 1)` when there are none.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.08 } else { lo.abs().max(1.0) * 0.1 };
    (lo - pad, hi + pad)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else if v.abs() >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.3}")
    }
}

fn collect_series(report: &BenchmarkReport, axis: Axis) -> Vec<Series<'_>> {
    report
        .models
        .iter()
        .enumerate()
        .map(|(m, result)| {
            let points = result
                .cv_results
                .iter()
                .enumerate()
                .map(|(i, c)| Point {
                    x: match axis {
                        Axis::FitTime => c.mean_fit_time,
                        Axis::ScoreTime => c.mean_score_time,
                    },
                    y: c.mean_test_score,
                    err: if c.std_test_score.is_finite() { c.std_test_score } else { 0.0 },
                    label: result.candidate_label(i),
                })
                .filter(|p| p.x.is_finite() && p.y.is_finite())
                .collect();
            Series {
                name: &result.model,
                color: PALETTE[m % PALETTE.len()],
                points,
            }
        })
        .collect()
}

fn draw_panel(out: &mut String, series: &[Series<'_>], axis: Axis, offset_x: f64, y_range: (f64, f64)) {
    let left = offset_x + MARGIN_LEFT;
    let right = offset_x + PANEL_WIDTH - MARGIN_RIGHT;
    let top = LEGEND_HEIGHT + MARGIN_TOP;
    let bottom = LEGEND_HEIGHT + PANEL_HEIGHT - MARGIN_BOTTOM;

    let x_scale = Scale::new(
        bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.x))),
        left,
        right,
    );
    let y_scale = Scale::new(y_range, bottom, top);

    let _ = writeln!(
        out,
        r##"<rect x="{left:.1}" y="{top:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#444"/>"##,
        right - left,
        bottom - top
    );

    for tick in x_scale.ticks() {
        let x = x_scale.map(tick);
        let _ = writeln!(
            out,
            r##"<line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="#e5e5e5"/>"##
        );
        let _ = writeln!(
            out,
            r#"<text x="{x:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"#,
            bottom + 16.0,
            format_tick(tick)
        );
    }
    for tick in y_scale.ticks() {
        let y = y_scale.map(tick);
        let _ = writeln!(
            out,
            r##"<line x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}" stroke="#e5e5e5"/>"##
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{}</text>"#,
            left - 6.0,
            y + 4.0,
            format_tick(tick)
        );
    }

    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">{}</text>"#,
        (left + right) / 2.0,
        bottom + 38.0,
        axis.title()
    );
    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle" transform="rotate(-90 {:.1} {:.1})">Mean test R²</text>"#,
        offset_x + 18.0,
        (top + bottom) / 2.0,
        offset_x + 18.0,
        (top + bottom) / 2.0
    );

    for s in series {
        let path: Vec<String> = s
            .points
            .iter()
            .map(|p| format!("{:.1},{:.1}", x_scale.map(p.x), y_scale.map(p.y)))
            .collect();
        if path.len() > 1 {
            let _ = writeln!(
                out,
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5"/>"#,
                path.join(" "),
                s.color
            );
        }
        for p in &s.points {
            let x = x_scale.map(p.x);
            let y = y_scale.map(p.y);
            let y_lo = y_scale.map(p.y - p.err);
            let y_hi = y_scale.map(p.y + p.err);
            let _ = writeln!(
                out,
                r#"<path d="M{x:.1},{y_lo:.1} V{y_hi:.1} M{:.1},{y_lo:.1} H{:.1} M{:.1},{y_hi:.1} H{:.1}" stroke="{}"/>"#,
                x - 4.0,
                x + 4.0,
                x - 4.0,
                x + 4.0,
                s.color
            );
            let _ = writeln!(
                out,
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="{}"/>"#,
                s.color
            );
            let _ = writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="10" fill="{}">{}</text>"#,
                x + 6.0,
                y - 6.0,
                s.color,
                escape_xml(&p.label)
            );
        }
    }
}

fn draw_legend(out: &mut String, series: &[Series<'_>]) {
    let mut x = MARGIN_LEFT;
    for s in series {
        let _ = writeln!(
            out,
            r#"<rect x="{x:.1}" y="14" width="14" height="14" fill="{}"/>"#,
            s.color
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="26" font-size="13">{}</text>"#,
            x + 20.0,
            escape_xml(s.name)
        );
        x += 40.0 + 8.0 * s.name.chars().count() as f64;
    }
}

/// Render the two-panel comparison chart as an SVG document.
pub fn svg_chart(report: &BenchmarkReport) -> String {
    let fit = collect_series(report, Axis::FitTime);
    let score = collect_series(report, Axis::ScoreTime);

    // Shared y range so both panels read the same.
    let y_range = bounds(fit.iter().flat_map(|s| {
        s.points
            .iter()
            .flat_map(|p| [p.y - p.err, p.y + p.err])
    }));

    let width = 2.0 * PANEL_WIDTH;
    let height = LEGEND_HEIGHT + PANEL_HEIGHT;
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" font-family="sans-serif">"#
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);
    draw_legend(&mut out, &fit);
    draw_panel(&mut out, &fit, Axis::FitTime, 0.0, y_range);
    draw_panel(&mut out, &score, Axis::ScoreTime, PANEL_WIDTH, y_range);
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_chart_structure() {
        let svg = svg_chart(&sample_report());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Mean fit time (s)"));
        assert!(svg.contains("Mean score time (s)"));
        // Two candidates per model, drawn once per panel.
        assert_eq!(svg.matches("<circle").count(), 8);
        assert_eq!(svg.matches("<polyline").count(), 4);
        assert!(svg.contains(">Random Forest</text>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bounds(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = bounds([1.0, 3.0, f64::NAN].into_iter());
        assert!(lo < 1.0 && hi > 3.0);
        let (lo, hi) = bounds([2.0].into_iter());
        assert!(lo < 2.0 && hi > 2.0);
    }

    #[test]
    fn test_scale_maps_endpoints() {
        let scale = Scale::new((0.0, 10.0), 100.0, 0.0);
        assert_eq!(scale.map(0.0), 100.0);
        assert_eq!(scale.map(10.0), 0.0);
        assert_eq!(scale.ticks().count(), N_TICKS);
    }
}
