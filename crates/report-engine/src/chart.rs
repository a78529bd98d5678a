//! Trend chart rasterization
//!
//! The chart is a static illustration: two filled line series over six
//! months. Its geometry is computed here in points and emitted as Typst
//! drawing markup, which is then rasterized to PNG above the embed size so
//! it stays sharp when the report scales it down.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::compiler::{self, RenderError};
use crate::world::{FontCache, ReportWorld};

/// Chart width on the report page (full A4 width)
pub const CHART_WIDTH_MM: f64 = 210.0;

/// Chart height on the report page
pub const CHART_HEIGHT_MM: f64 = 80.0;

/// 96 DPI base resolution, doubled
pub const CHART_PIXELS_PER_POINT: f32 = 96.0 / 72.0 * 2.0;

const PT_PER_MM: f64 = 72.0 / 25.4;

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

// Plot area insets in points
const PLOT_LEFT: f64 = 64.0;
const PLOT_RIGHT: f64 = 16.0;
const PLOT_TOP: f64 = 58.0;
const PLOT_BOTTOM: f64 = 46.0;

const TITLE_SIZE: f64 = 16.0;
const LEGEND_SIZE: f64 = 10.0;
const TICK_SIZE: f64 = 9.0;
const AXIS_TITLE_SIZE: f64 = 10.0;
const POINT_RADIUS: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn typst(self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    /// Translucent variant used under the line
    fn typst_fill(self) -> String {
        format!("rgb({}, {}, {}, 51)", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl TrendChart {
    /// The fixed sample chart, with month labels suffixed by `year`'s last
    /// two digits ("Jan 26").
    pub fn sample(year: i32) -> Self {
        let suffix = format!("{:02}", year.rem_euclid(100));

        Self {
            title: "Todo Completion Trends".to_string(),
            x_title: "Month".to_string(),
            y_title: "Number of Todos".to_string(),
            labels: MONTHS.iter().map(|m| format!("{} {}", m, suffix)).collect(),
            series: vec![
                Series {
                    name: "Completed Todos".to_string(),
                    values: vec![1200.0, 1900.0, 2500.0, 3200.0, 4100.0, 5500.0],
                    color: Rgb(75, 192, 192),
                },
                Series {
                    name: "Pending Todos".to_string(),
                    values: vec![800.0, 1200.0, 1500.0, 1800.0, 2200.0, 2800.0],
                    color: Rgb(255, 99, 132),
                },
            ],
        }
    }

    /// Emit a standalone Typst document drawing the chart on a page of
    /// exactly the embed size.
    pub fn to_typst(&self) -> String {
        let width = CHART_WIDTH_MM * PT_PER_MM;
        let height = CHART_HEIGHT_MM * PT_PER_MM;
        let plot = Plot {
            left: PLOT_LEFT,
            top: PLOT_TOP,
            width: width - PLOT_LEFT - PLOT_RIGHT,
            height: height - PLOT_TOP - PLOT_BOTTOM,
        };
        let axis = AxisScale::for_max(self.max_value());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "#set page(width: {}, height: {}, margin: 0pt, fill: white)",
            pt(width),
            pt(height)
        );

        // Title
        let _ = writeln!(
            out,
            "#place(top + left, dy: 6pt, box(width: {}, align(center, text(size: {}, weight: \"bold\", {}))))",
            pt(width),
            pt(TITLE_SIZE),
            typst_str(&self.title)
        );

        self.write_legend(&mut out, width);

        // Horizontal grid lines and y ticks
        for tick in axis.ticks() {
            let y = plot.y(tick, axis.max);
            let _ = writeln!(
                out,
                "#place(top + left, line(start: ({}, {}), end: ({}, {}), stroke: 0.5pt + luma(225)))",
                pt(plot.left),
                pt(y),
                pt(plot.left + plot.width),
                pt(y)
            );
            let _ = writeln!(
                out,
                "#place(top + left, dx: {}, dy: {}, box(width: 40pt, height: 12pt, align(right + horizon, text(size: {}, {}))))",
                pt(plot.left - 46.0),
                pt(y - 6.0),
                pt(TICK_SIZE),
                typst_str(&format_tick(tick))
            );
        }

        // X tick labels
        for (i, label) in self.labels.iter().enumerate() {
            let x = plot.x(i, self.labels.len());
            let _ = writeln!(
                out,
                "#place(top + left, dx: {}, dy: {}, box(width: 60pt, align(center, text(size: {}, {}))))",
                pt(x - 30.0),
                pt(plot.top + plot.height + 4.0),
                pt(TICK_SIZE),
                typst_str(label)
            );
        }

        // Axis lines
        let _ = writeln!(
            out,
            "#place(top + left, line(start: ({}, {}), end: ({}, {}), stroke: 0.75pt + luma(120)))",
            pt(plot.left),
            pt(plot.top),
            pt(plot.left),
            pt(plot.top + plot.height)
        );
        let _ = writeln!(
            out,
            "#place(top + left, line(start: ({}, {}), end: ({}, {}), stroke: 0.75pt + luma(120)))",
            pt(plot.left),
            pt(plot.top + plot.height),
            pt(plot.left + plot.width),
            pt(plot.top + plot.height)
        );

        // Axis titles
        let _ = writeln!(
            out,
            "#place(top + left, dy: {}, box(width: {}, align(center, text(size: {}, {}))))",
            pt(height - 18.0),
            pt(width),
            pt(AXIS_TITLE_SIZE),
            typst_str(&self.x_title)
        );
        let _ = writeln!(
            out,
            "#place(top + left, dx: 4pt, dy: {}, box(height: {}, align(horizon, rotate(-90deg, reflow: true, text(size: {}, {})))))",
            pt(plot.top),
            pt(plot.height),
            pt(AXIS_TITLE_SIZE),
            typst_str(&self.y_title)
        );

        for series in &self.series {
            self.write_series(&mut out, series, &plot, axis.max);
        }

        out
    }

    fn write_legend(&self, out: &mut String, width: f64) {
        let entries: Vec<String> = self
            .series
            .iter()
            .map(|s| {
                format!(
                    "box(rect(width: 18pt, height: 8pt, fill: {}, stroke: 1pt + {})); h(4pt); text(size: {}, {})",
                    s.color.typst_fill(),
                    s.color.typst(),
                    pt(LEGEND_SIZE),
                    typst_str(&s.name)
                )
            })
            .collect();

        let _ = writeln!(
            out,
            "#place(top + left, dy: 30pt, box(width: {}, align(center, {{ {} }})))",
            pt(width),
            entries.join("; h(14pt); ")
        );
    }

    fn write_series(&self, out: &mut String, series: &Series, plot: &Plot, max: f64) {
        let count = self.labels.len();
        let points: Vec<(f64, f64)> = series
            .values
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, &v)| (plot.x(i, count), plot.y(v, max)))
            .collect();

        if points.is_empty() {
            return;
        }

        let vertices = |pts: &[(f64, f64)]| {
            pts.iter()
                .map(|&(x, y)| format!("({}, {})", pt(x), pt(y)))
                .collect::<Vec<_>>()
                .join(", ")
        };

        // Filled area down to the x axis
        let base = plot.top + plot.height;
        let mut area = points.clone();
        if let (Some(&(last_x, _)), Some(&(first_x, _))) = (points.last(), points.first()) {
            area.push((last_x, base));
            area.push((first_x, base));
        }
        let _ = writeln!(
            out,
            "#place(top + left, polygon(fill: {}, stroke: none, {}))",
            series.color.typst_fill(),
            vertices(&area)
        );

        let _ = writeln!(
            out,
            "#place(top + left, path(stroke: 1.5pt + {}, {}))",
            series.color.typst(),
            vertices(&points)
        );

        for &(x, y) in &points {
            let _ = writeln!(
                out,
                "#place(top + left, dx: {}, dy: {}, circle(radius: {}, fill: {}, stroke: 1pt + {}))",
                pt(x - POINT_RADIUS),
                pt(y - POINT_RADIUS),
                pt(POINT_RADIUS),
                series.color.typst_fill(),
                series.color.typst()
            );
        }
    }

    fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Render `chart` to PNG bytes using `fonts`
pub fn rasterize(chart: &TrendChart, fonts: &FontCache) -> Result<Vec<u8>, RenderError> {
    let world = ReportWorld::new(fonts, chart.to_typst(), HashMap::new())?;
    let (document, _) = compiler::compile(&world)?;
    compiler::rasterize_first_page(&document, CHART_PIXELS_PER_POINT)
}

/// Abbreviate a y-axis tick: `1.2k`, `1.5M`, plain below a thousand.
pub fn format_tick(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Plot {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Plot {
    /// Category `index` of `count`, spread edge to edge
    fn x(&self, index: usize, count: usize) -> f64 {
        if count <= 1 {
            return self.left + self.width / 2.0;
        }
        self.left + self.width * index as f64 / (count - 1) as f64
    }

    fn y(&self, value: f64, max: f64) -> f64 {
        if max <= 0.0 {
            return self.top + self.height;
        }
        self.top + self.height * (1.0 - value / max)
    }
}

/// A y axis starting at zero with round tick steps
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisScale {
    step: f64,
    max: f64,
}

impl AxisScale {
    const TARGET_TICKS: f64 = 5.0;

    fn for_max(value: f64) -> Self {
        if value <= 0.0 {
            return Self { step: 1.0, max: 1.0 };
        }

        let step = nice_step(value / Self::TARGET_TICKS);
        let max = (value / step).ceil() * step;
        Self { step, max }
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let count = (self.max / self.step).round() as usize;
        (0..=count).map(move |i| i as f64 * self.step)
    }
}

/// Round `raw` up to 1, 2, 5 or 10 times a power of ten
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let normalized = raw / magnitude;

    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

fn pt(value: f64) -> String {
    format!("{:.2}pt", value)
}

/// Quote `text` as a Typst string literal
fn typst_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
