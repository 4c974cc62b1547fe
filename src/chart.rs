use crate::table::{Table, TableError};
use crate::ui::escape_html;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Scatter,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ColorKey {
    Scale(f64),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub size: Option<f64>,
    pub color: Option<ColorKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

/// Which columns of a table feed which visual channel.
#[derive(Debug, Clone)]
pub struct ChartRequest<'a> {
    pub kind: ChartKind,
    pub title: &'a str,
    pub x: &'a str,
    pub y: &'a str,
    pub size: Option<&'a str>,
    pub color: Option<&'a str>,
    pub hover: Option<&'a str>,
}

impl<'a> ChartRequest<'a> {
    pub fn new(kind: ChartKind, title: &'a str, x: &'a str, y: &'a str) -> Self {
        Self {
            kind,
            title,
            x,
            y,
            size: None,
            color: None,
            hover: None,
        }
    }

    pub fn size(mut self, column: &'a str) -> Self {
        self.size = Some(column);
        self
    }

    pub fn color(mut self, column: &'a str) -> Self {
        self.color = Some(column);
        self
    }

    pub fn hover(mut self, column: &'a str) -> Self {
        self.hover = Some(column);
        self
    }
}

pub fn build_chart(table: &Table, request: &ChartRequest<'_>) -> Result<Chart, TableError> {
    let x_index = table.column_index(request.x)?;
    let y_values = table.numeric_column(request.y)?;
    let sizes = request
        .size
        .map(|column| table.numeric_column(column))
        .transpose()?;
    let color_index = request
        .color
        .map(|column| table.column_index(column))
        .transpose()?;
    let hover_index = request
        .hover
        .map(|column| table.column_index(column))
        .transpose()?;

    let mut points = Vec::with_capacity(table.len());
    for (row_index, row) in table.rows.iter().enumerate() {
        let x_cell = &row[x_index];
        let x = match request.kind {
            ChartKind::Scatter => x_cell
                .as_f64()
                .ok_or_else(|| TableError::NotNumeric(request.x.to_string()))?,
            ChartKind::Bar | ChartKind::Pie => row_index as f64,
        };
        let label = match hover_index {
            Some(index) => row[index].to_string(),
            None => x_cell.to_string(),
        };
        let color = color_index.map(|index| match row[index].as_f64() {
            Some(value) => ColorKey::Scale(value),
            None => ColorKey::Category(row[index].to_string()),
        });

        points.push(ChartPoint {
            label,
            x,
            y: y_values[row_index],
            size: sizes.as_ref().map(|values| values[row_index]),
            color,
        });
    }

    Ok(Chart {
        kind: request.kind,
        title: request.title.to_string(),
        x_label: request.x.to_string(),
        y_label: request.y.to_string(),
        points,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn unit(self) -> (f64, f64, f64) {
        (
            f64::from(self.0) / 255.0,
            f64::from(self.1) / 255.0,
            f64::from(self.2) / 255.0,
        )
    }
}

const PALETTE: [Rgb; 8] = [
    Rgb(0x63, 0x6e, 0xfa),
    Rgb(0xef, 0x55, 0x3b),
    Rgb(0x00, 0xcc, 0x96),
    Rgb(0xab, 0x63, 0xfa),
    Rgb(0xff, 0xa1, 0x5a),
    Rgb(0x19, 0xd3, 0xf3),
    Rgb(0xff, 0x66, 0x92),
    Rgb(0xb6, 0xe8, 0x80),
];

const VIRIDIS: [Rgb; 5] = [
    Rgb(0x44, 0x01, 0x54),
    Rgb(0x3b, 0x52, 0x8b),
    Rgb(0x21, 0x91, 0x8c),
    Rgb(0x5e, 0xc9, 0x62),
    Rgb(0xfd, 0xe7, 0x25),
];

fn viridis(t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let low = t.floor() as usize;
    let high = (low + 1).min(VIRIDIS.len() - 1);
    let frac = t - low as f64;
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
    let (a, b) = (VIRIDIS[low], VIRIDIS[high]);
    Rgb(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

impl Chart {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Categories in first-seen order; drives both colours and legends.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for point in &self.points {
            let name = match (&point.color, self.kind) {
                (Some(ColorKey::Category(name)), _) => name.clone(),
                (None, ChartKind::Pie) => point.label.clone(),
                _ => continue,
            };
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// One colour per point: continuous keys use a viridis ramp, categories the palette.
    pub fn point_colors(&self) -> Vec<Rgb> {
        let scale: Vec<f64> = self
            .points
            .iter()
            .filter_map(|point| match point.color {
                Some(ColorKey::Scale(value)) => Some(value),
                _ => None,
            })
            .collect();
        let (min, max) = bounds(&scale);
        let categories = self.categories();

        self.points
            .iter()
            .enumerate()
            .map(|(index, point)| match &point.color {
                Some(ColorKey::Scale(value)) => {
                    if max > min {
                        viridis((value - min) / (max - min))
                    } else {
                        viridis(0.5)
                    }
                }
                Some(ColorKey::Category(name)) => category_color(&categories, name),
                None if self.kind == ChartKind::Pie => category_color(&categories, &point.label),
                None => PALETTE[index % PALETTE.len()],
            })
            .collect()
    }

    /// Marker radius between `min_r` and `max_r`, proportional to sqrt(size).
    pub fn marker_radius(&self, point: &ChartPoint, min_r: f64, max_r: f64) -> f64 {
        let Some(size) = point.size else {
            return min_r;
        };
        let largest = self
            .points
            .iter()
            .filter_map(|p| p.size)
            .fold(0.0f64, f64::max);
        if largest <= 0.0 {
            return min_r;
        }
        min_r + (max_r - min_r) * (size.max(0.0) / largest).sqrt()
    }
}

fn category_color(categories: &[String], name: &str) -> Rgb {
    let index = categories.iter().position(|c| c == name).unwrap_or(0);
    PALETTE[index % PALETTE.len()]
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// Numeric axis range with a little headroom; bar charts always include zero.
pub fn axis_range(values: &[f64], include_zero: bool) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let (mut min, mut max) = bounds(values);
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    } else {
        let pad = (max - min).abs() * 0.1;
        min -= pad;
        max += pad;
    }
    if min == max {
        min -= 1.0;
        max += 1.0;
    }
    (min, max)
}

pub fn format_tick(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

/// Maps a data interval onto a pixel (or millimetre) interval.
#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn at(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

pub trait ChartRenderer {
    type Output;

    fn render(&self, chart: &Chart) -> Self::Output;
}

pub struct SvgRenderer {
    pub width: f64,
    pub height: f64,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 360.0,
        }
    }
}

const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 24.0;
const PAD_TOP: f64 = 40.0;
const PAD_BOTTOM: f64 = 56.0;
const TICKS: usize = 4;

impl ChartRenderer for SvgRenderer {
    type Output = String;

    fn render(&self, chart: &Chart) -> String {
        let mut svg = format!(
            r#"<svg class="chart" viewBox="0 0 {w} {h}" role="img" aria-label="{title}"><text class="chart-title" x="{cx}" y="22" text-anchor="middle">{title}</text>"#,
            w = self.width,
            h = self.height,
            cx = self.width / 2.0,
            title = escape_html(&chart.title),
        );

        if chart.is_empty() {
            let _ = write!(
                svg,
                r#"<text class="chart-label" x="{}" y="{}" text-anchor="middle">No data</text>"#,
                self.width / 2.0,
                self.height / 2.0
            );
        } else {
            match chart.kind {
                ChartKind::Bar => self.bars(chart, &mut svg),
                ChartKind::Scatter => self.scatter(chart, &mut svg),
                ChartKind::Pie => self.pie(chart, &mut svg),
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

impl SvgRenderer {
    fn plot_bottom(&self) -> f64 {
        self.height - PAD_BOTTOM
    }

    fn plot_width(&self) -> f64 {
        self.width - PAD_LEFT - PAD_RIGHT
    }

    fn y_axis(&self, chart: &Chart, svg: &mut String, min: f64, max: f64) -> LinearScale {
        let scale = LinearScale {
            domain: (min, max),
            range: (self.plot_bottom(), PAD_TOP),
        };

        for tick in 0..=TICKS {
            let value = min + (max - min) * tick as f64 / TICKS as f64;
            let y = scale.at(value);
            let _ = write!(
                svg,
                r#"<line class="chart-grid" x1="{PAD_LEFT}" y1="{y:.1}" x2="{x2}" y2="{y:.1}"/><text class="chart-label" x="{lx}" y="{ty:.1}" text-anchor="end">{label}</text>"#,
                x2 = self.width - PAD_RIGHT,
                lx = PAD_LEFT - 8.0,
                ty = y + 4.0,
                label = format_tick(value),
            );
        }
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="14" y="{cy}" transform="rotate(-90 14 {cy})" text-anchor="middle">{label}</text>"#,
            cy = (PAD_TOP + self.plot_bottom()) / 2.0,
            label = escape_html(&chart.y_label),
        );
        scale
    }

    fn x_caption(&self, chart: &Chart, svg: &mut String) {
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="{cx}" y="{y}" text-anchor="middle">{label}</text>"#,
            cx = PAD_LEFT + self.plot_width() / 2.0,
            y = self.height - 10.0,
            label = escape_html(&chart.x_label),
        );
    }

    fn bars(&self, chart: &Chart, svg: &mut String) {
        let ys: Vec<f64> = chart.points.iter().map(|p| p.y).collect();
        let (min, max) = axis_range(&ys, true);
        let y = self.y_axis(chart, svg, min, max);
        let colors = chart.point_colors();

        let slot = self.plot_width() / chart.points.len() as f64;
        let bar_width = slot * 0.7;
        for (index, point) in chart.points.iter().enumerate() {
            let x = PAD_LEFT + slot * index as f64 + (slot - bar_width) / 2.0;
            let (top, bottom) = (y.at(point.y.max(0.0)), y.at(point.y.min(0.0)));
            let _ = write!(
                svg,
                r#"<rect class="chart-bar" x="{x:.1}" y="{top:.1}" width="{bar_width:.1}" height="{h:.1}" fill="{fill}"><title>{label}: {value}</title></rect><text class="chart-label" x="{cx:.1}" y="{ly:.1}" text-anchor="middle">{label}</text>"#,
                h = (bottom - top).max(0.0),
                fill = colors[index].hex(),
                label = escape_html(&point.label),
                value = format_tick(point.y),
                cx = x + bar_width / 2.0,
                ly = self.plot_bottom() + 16.0,
            );
        }
        self.x_caption(chart, svg);
    }

    fn scatter(&self, chart: &Chart, svg: &mut String) {
        let xs: Vec<f64> = chart.points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = chart.points.iter().map(|p| p.y).collect();
        let (x_min, x_max) = axis_range(&xs, false);
        let (y_min, y_max) = axis_range(&ys, false);
        let y = self.y_axis(chart, svg, y_min, y_max);
        let x = LinearScale {
            domain: (x_min, x_max),
            range: (PAD_LEFT, PAD_LEFT + self.plot_width()),
        };

        for tick in 0..=TICKS {
            let value = x_min + (x_max - x_min) * tick as f64 / TICKS as f64;
            let _ = write!(
                svg,
                r#"<text class="chart-label" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                x.at(value),
                self.plot_bottom() + 16.0,
                format_tick(value)
            );
        }

        let colors = chart.point_colors();
        for (index, point) in chart.points.iter().enumerate() {
            let _ = write!(
                svg,
                r#"<circle class="chart-point" cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" fill-opacity="0.75"><title>{} ({}, {})</title></circle>"#,
                x.at(point.x),
                y.at(point.y),
                chart.marker_radius(point, 6.0, 22.0),
                colors[index].hex(),
                escape_html(&point.label),
                format_tick(point.x),
                format_tick(point.y),
            );
        }
        self.legend(chart, svg, self.width - PAD_RIGHT - 130.0, PAD_TOP);
        self.x_caption(chart, svg);
    }

    fn pie(&self, chart: &Chart, svg: &mut String) {
        let total: f64 = chart.points.iter().map(|p| p.y.max(0.0)).sum();
        let colors = chart.point_colors();
        let radius = (self.height - PAD_TOP - 24.0) / 2.0;
        let (cx, cy) = (self.width * 0.38, PAD_TOP + radius + 4.0);

        let mut angle = -PI / 2.0;
        for (index, point) in chart.points.iter().enumerate() {
            let share = if total > 0.0 { point.y.max(0.0) / total } else { 0.0 };
            if share <= 0.0 {
                continue;
            }
            let fill = colors[index].hex();
            if share >= 1.0 {
                let _ = write!(
                    svg,
                    r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{radius:.1}" fill="{fill}"/>"#
                );
                continue;
            }
            let end = angle + share * 2.0 * PI;
            let large = if share > 0.5 { 1 } else { 0 };
            let _ = write!(
                svg,
                r#"<path class="chart-slice" d="M {cx:.1} {cy:.1} L {x1:.2} {y1:.2} A {radius:.1} {radius:.1} 0 {large} 1 {x2:.2} {y2:.2} Z" fill="{fill}"><title>{label}: {pct:.1}%</title></path>"#,
                x1 = cx + radius * angle.cos(),
                y1 = cy + radius * angle.sin(),
                x2 = cx + radius * end.cos(),
                y2 = cy + radius * end.sin(),
                label = escape_html(&point.label),
                pct = share * 100.0,
            );
            angle = end;
        }
        self.legend(chart, svg, self.width * 0.72, PAD_TOP + 10.0);
    }

    fn legend(&self, chart: &Chart, svg: &mut String, x: f64, y: f64) {
        let categories = chart.categories();
        for (index, name) in categories.iter().enumerate() {
            let row_y = y + index as f64 * 20.0;
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{ry:.1}" width="12" height="12" fill="{fill}"/><text class="chart-label" x="{tx:.1}" y="{ty:.1}">{name}</text>"#,
                ry = row_y,
                fill = PALETTE[index % PALETTE.len()].hex(),
                tx = x + 18.0,
                ty = row_y + 10.0,
                name = escape_html(name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn league_table() -> Table {
        Table::new(
            vec!["team".into(), "against".into(), "for".into(), "wins".into(), "league".into()],
            vec![
                vec![
                    Value::Text("A".into()),
                    Value::Int(30),
                    Value::Int(80),
                    Value::Int(20),
                    Value::Text("L1".into()),
                ],
                vec![
                    Value::Text("B".into()),
                    Value::Int(40),
                    Value::Int(60),
                    Value::Int(10),
                    Value::Text("L2".into()),
                ],
                vec![
                    Value::Text("C".into()),
                    Value::Int(35),
                    Value::Int(70),
                    Value::Int(15),
                    Value::Text("L1".into()),
                ],
            ],
        )
    }

    #[test]
    fn scatter_maps_every_channel() {
        let request = ChartRequest::new(ChartKind::Scatter, "Perf", "against", "for")
            .size("wins")
            .color("league")
            .hover("team");
        let chart = build_chart(&league_table(), &request).unwrap();

        assert_eq!(chart.points.len(), 3);
        let first = &chart.points[0];
        assert_eq!(first.label, "A");
        assert_eq!((first.x, first.y), (30.0, 80.0));
        assert_eq!(first.size, Some(20.0));
        assert_eq!(first.color, Some(ColorKey::Category("L1".into())));
        assert_eq!(chart.categories(), vec!["L1", "L2"]);

        let colors = chart.point_colors();
        assert_eq!(colors[0], colors[2]);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn scatter_needs_numeric_x() {
        let request = ChartRequest::new(ChartKind::Scatter, "Bad", "team", "for");
        assert_eq!(
            build_chart(&league_table(), &request),
            Err(TableError::NotNumeric("team".into()))
        );
    }

    #[test]
    fn bar_uses_category_labels_and_value_scale() {
        let request = ChartRequest::new(ChartKind::Bar, "Goals", "team", "for").color("for");
        let chart = build_chart(&league_table(), &request).unwrap();
        let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C"]);

        let colors = chart.point_colors();
        assert_eq!(colors[0], viridis(1.0));
        assert_eq!(colors[1], viridis(0.0));
    }

    #[test]
    fn svg_contains_one_mark_per_point() {
        let renderer = SvgRenderer::default();
        let bar = build_chart(
            &league_table(),
            &ChartRequest::new(ChartKind::Bar, "Goals", "team", "for"),
        )
        .unwrap();
        let svg = renderer.render(&bar);
        assert_eq!(svg.matches("<rect class=\"chart-bar\"").count(), 3);

        let pie = build_chart(
            &league_table(),
            &ChartRequest::new(ChartKind::Pie, "Wins", "team", "wins"),
        )
        .unwrap();
        let svg = renderer.render(&pie);
        assert_eq!(svg.matches("<path class=\"chart-slice\"").count(), 3);
    }

    #[test]
    fn empty_chart_renders_placeholder() {
        let empty = Table::new(vec!["team".into(), "for".into()], Vec::new());
        let chart = build_chart(&empty, &ChartRequest::new(ChartKind::Bar, "None", "team", "for")).unwrap();
        assert!(SvgRenderer::default().render(&chart).contains("No data"));
    }

    #[test]
    fn titles_are_escaped() {
        let chart = Chart {
            kind: ChartKind::Bar,
            title: "<b>&</b>".into(),
            x_label: String::new(),
            y_label: String::new(),
            points: Vec::new(),
        };
        let svg = SvgRenderer::default().render(&chart);
        assert!(svg.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }
}
