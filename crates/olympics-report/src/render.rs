//! SVG rendering of chart specs.
//!
//! Hand-built markup, no layout engine: fixed canvas sizes, a five-step
//! y axis for series charts, and rotated category labels.

use std::f64::consts::{FRAC_PI_2, TAU};

use quick_xml::escape::escape;

use crate::chart::{ChartKind, ChartSpec};

const SERIES_WIDTH: f64 = 1000.0;
const SERIES_HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 140.0;
const Y_TICKS: i64 = 5;

const PIE_SIZE: f64 = 800.0;
const PIE_RADIUS: f64 = 260.0;

const LINE_COLOR: &str = "#1f3bff";
const BAR_COLOR: &str = "#87ceeb";
const AXIS_COLOR: &str = "#333333";
const GRID_COLOR: &str = "#dddddd";
/// First colors of the "Paired" qualitative palette.
const PIE_COLORS: [&str; 4] = ["#a6cee3", "#1f78b4", "#b2df8a", "#33a02c"];

/// Render a chart to a standalone SVG document.
pub fn render_svg(chart: &ChartSpec) -> String {
    match chart.kind {
        ChartKind::Line | ChartKind::Bar => render_series(chart),
        ChartKind::Pie => render_pie(chart),
    }
}

fn open_svg(svg: &mut String, width: f64, height: f64, title: &str) {
    svg.push_str(&format!(
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg" font-family="sans-serif">"#
    ));
    svg.push_str(&format!(
        r##"<rect width="{width}" height="{height}" fill="#ffffff"/>"##
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="40" text-anchor="middle" font-size="20">{}</text>"#,
        width / 2.0,
        escape(title)
    ));
}

fn render_series(chart: &ChartSpec) -> String {
    let mut svg = String::new();
    open_svg(&mut svg, SERIES_WIDTH, SERIES_HEIGHT, &chart.title);

    let plot_w = SERIES_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = SERIES_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let bottom = MARGIN_TOP + plot_h;

    let max = chart.values.iter().copied().max().unwrap_or(0).max(1);
    let step = max.saturating_add(Y_TICKS - 1) / Y_TICKS;
    let top_value = step.saturating_mul(Y_TICKS) as f64;
    let y_of = |v: i64| bottom - (v.max(0) as f64 / top_value) * plot_h;

    // Y ticks and grid.
    for i in 0..=Y_TICKS {
        let value = step.saturating_mul(i);
        let y = y_of(value);
        if chart.kind == ChartKind::Line {
            svg.push_str(&format!(
                r#"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-width="1"/>"#,
                MARGIN_LEFT + plot_w
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12">{value}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0
        ));
    }

    // Axes.
    svg.push_str(&format!(
        r#"<line x1="{MARGIN_LEFT:.1}" y1="{MARGIN_TOP:.1}" x2="{MARGIN_LEFT:.1}" y2="{bottom:.1}" stroke="{AXIS_COLOR}" stroke-width="1"/>"#
    ));
    svg.push_str(&format!(
        r#"<line x1="{MARGIN_LEFT:.1}" y1="{bottom:.1}" x2="{:.1}" y2="{bottom:.1}" stroke="{AXIS_COLOR}" stroke-width="1"/>"#,
        MARGIN_LEFT + plot_w
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">{}</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        SERIES_HEIGHT - 15.0,
        escape(chart.x_label.as_str())
    ));
    svg.push_str(&format!(
        r#"<text x="25" y="{:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 25 {:.1})">{}</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0,
        escape(chart.y_label.as_str())
    ));

    if chart.is_empty() {
        svg.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="16" fill="#888888">no data</text>"##,
            MARGIN_LEFT + plot_w / 2.0,
            MARGIN_TOP + plot_h / 2.0
        ));
        svg.push_str("</svg>");
        return svg;
    }

    let slot = plot_w / chart.values.len() as f64;
    let x_of = |i: usize| MARGIN_LEFT + slot * (i as f64 + 0.5);

    match chart.kind {
        ChartKind::Bar => {
            let bar_w = slot * 0.8;
            for (i, value) in chart.values.iter().enumerate() {
                let y = y_of(*value);
                svg.push_str(&format!(
                    r#"<rect x="{:.1}" y="{y:.1}" width="{bar_w:.1}" height="{:.1}" fill="{BAR_COLOR}"/>"#,
                    x_of(i) - bar_w / 2.0,
                    bottom - y
                ));
            }
        }
        _ => {
            let points: Vec<String> = chart
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("{:.1},{:.1}", x_of(i), y_of(*v)))
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" fill="none" stroke="{LINE_COLOR}" stroke-width="2"/>"#,
                points.join(" ")
            ));
            for (i, value) in chart.values.iter().enumerate() {
                svg.push_str(&format!(
                    r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{LINE_COLOR}"/>"#,
                    x_of(i),
                    y_of(*value)
                ));
            }
        }
    }

    // Category labels, rotated 45 degrees.
    for (i, category) in chart.categories.iter().enumerate() {
        let x = x_of(i);
        let y = bottom + 18.0;
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" font-size="12" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
            escape(category.as_str())
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn render_pie(chart: &ChartSpec) -> String {
    let mut svg = String::new();
    open_svg(&mut svg, PIE_SIZE, PIE_SIZE, &chart.title);

    let cx = PIE_SIZE / 2.0;
    let cy = PIE_SIZE / 2.0 + 30.0;
    let total = chart
        .values
        .iter()
        .fold(0_i64, |acc, v| acc.saturating_add((*v).max(0)));

    if total == 0 {
        svg.push_str(&format!(
            r##"<text x="{cx:.1}" y="{cy:.1}" text-anchor="middle" font-size="16" fill="#888888">no data</text>"##
        ));
        svg.push_str("</svg>");
        return svg;
    }

    let mut start = -FRAC_PI_2;
    for (i, (label, value)) in chart.categories.iter().zip(&chart.values).enumerate() {
        let value = (*value).max(0);
        let fraction = value as f64 / total as f64;
        let color = PIE_COLORS[i % PIE_COLORS.len()];
        let end = start + fraction * TAU;

        if value > 0 {
            if fraction >= 1.0 {
                svg.push_str(&format!(
                    r##"<circle cx="{cx:.1}" cy="{cy:.1}" r="{PIE_RADIUS:.1}" fill="{color}" stroke="#ffffff" stroke-width="1"/>"##
                ));
            } else {
                let (x0, y0) = polar(cx, cy, PIE_RADIUS, start);
                let (x1, y1) = polar(cx, cy, PIE_RADIUS, end);
                let large_arc = u8::from(fraction > 0.5);
                svg.push_str(&format!(
                    r##"<path d="M {cx:.1} {cy:.1} L {x0:.1} {y0:.1} A {PIE_RADIUS:.1} {PIE_RADIUS:.1} 0 {large_arc} 1 {x1:.1} {y1:.1} Z" fill="{color}" stroke="#ffffff" stroke-width="1"/>"##
                ));
            }

            let mid = (start + end) / 2.0;
            let (px, py) = polar(cx, cy, PIE_RADIUS * 0.6, mid);
            svg.push_str(&format!(
                r#"<text x="{px:.1}" y="{py:.1}" text-anchor="middle" font-size="14">{:.1}%</text>"#,
                fraction * 100.0
            ));
            let (lx, ly) = polar(cx, cy, PIE_RADIUS * 1.12, mid);
            let anchor = if lx < cx { "end" } else { "start" };
            svg.push_str(&format!(
                r#"<text x="{lx:.1}" y="{ly:.1}" text-anchor="{anchor}" font-size="14">{}</text>"#,
                escape(label.as_str())
            ));
        }

        start = end;
    }

    svg.push_str("</svg>");
    svg
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}
