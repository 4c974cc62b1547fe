use crate::chart::{axis_range, format_tick, Chart, ChartKind, LinearScale, Rgb};
use crate::errors::ExportError;
use chrono::{Local, NaiveDate};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use std::f64::consts::PI;
use std::io::BufWriter;

const PAGE_WIDTH: f64 = 297.0;
const PAGE_HEIGHT: f64 = 210.0;
const MARGIN: f64 = 20.0;

pub trait ChartExporter {
    fn export_pdf(&self, chart: &Chart) -> Result<Vec<u8>, ExportError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExporter;

impl ChartExporter for PdfExporter {
    fn export_pdf(&self, chart: &Chart) -> Result<Vec<u8>, ExportError> {
        let title = pdf_text(&chart.title);
        let (doc, page, layer) =
            PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "chart");
        let fonts = Fonts::load(&doc)?;
        let canvas = Canvas {
            layer: doc.get_page(page).get_layer(layer),
            fonts,
        };

        canvas.text(&title, 18.0, MARGIN, PAGE_HEIGHT - MARGIN, true);
        if chart.is_empty() {
            canvas.text("No data", 12.0, MARGIN, PAGE_HEIGHT / 2.0, false);
        } else {
            match chart.kind {
                ChartKind::Bar => draw_bars(&canvas, chart),
                ChartKind::Scatter => draw_scatter(&canvas, chart),
                ChartKind::Pie => draw_pie(&canvas, chart),
            }
        }

        save(doc)
    }
}

/// Tabular report with a banner header and a dated footer.
pub fn export_table_report(
    title: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, ExportError> {
    export_table_report_on(Local::now().date_naive(), title, headers, rows)
}

pub fn export_table_report_on(
    date: NaiveDate,
    title: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, ExportError> {
    if headers.is_empty() {
        return Err(ExportError::Empty(title.to_string()));
    }

    const LINE_HEIGHT: f64 = 7.0;
    const HEADER_SPACE: f64 = 42.0;
    const FOOTER_SPACE: f64 = 24.0;

    let col_width = ((PAGE_WIDTH - 2.0 * MARGIN) / headers.len() as f64).min(45.0);
    let rows_per_page =
        (((PAGE_HEIGHT - HEADER_SPACE - FOOTER_SPACE) / LINE_HEIGHT) as usize).saturating_sub(1).max(1);
    let footer = format!("Report generated on {}", date.format("%d/%m/%Y"));

    let (doc, first_page, first_layer) =
        PdfDocument::new(pdf_text(title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "report");
    let fonts = Fonts::load(&doc)?;

    let chunks: Vec<&[Vec<String>]> = if rows.is_empty() {
        vec![rows]
    } else {
        rows.chunks(rows_per_page).collect()
    };

    for (index, chunk) in chunks.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "report");
            doc.get_page(page).get_layer(layer)
        };
        let canvas = Canvas {
            layer,
            fonts: fonts.clone(),
        };

        let banner = "=".repeat(60);
        canvas.centered(&banner, 12.0, PAGE_HEIGHT - 14.0, true);
        canvas.centered("Sports Analysis", 12.0, PAGE_HEIGHT - 21.0, true);
        canvas.centered(&banner, 12.0, PAGE_HEIGHT - 27.0, true);
        canvas.text(&pdf_text(title), 11.0, MARGIN, PAGE_HEIGHT - 36.0, true);

        let mut y = PAGE_HEIGHT - HEADER_SPACE;
        canvas.table_row(headers, MARGIN, y, col_width, LINE_HEIGHT, true);
        for row in chunk.iter() {
            y -= LINE_HEIGHT;
            canvas.table_row(row, MARGIN, y, col_width, LINE_HEIGHT, false);
        }

        canvas.centered(&"*".repeat(90), 8.0, 16.0, false);
        canvas.centered(&footer, 8.0, 10.0, false);
    }

    save(doc)
}

/// ASCII-only copy of `input`; anything else becomes `?`.
pub fn pdf_text(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn save(doc: PdfDocumentReference) -> Result<Vec<u8>, ExportError> {
    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|err| ExportError::Render(format!("{err:?}")))?;
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

#[derive(Clone)]
struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ExportError> {
        let load = |font| {
            doc.add_builtin_font(font)
                .map_err(|err| ExportError::Render(format!("{err:?}")))
        };
        Ok(Self {
            regular: load(BuiltinFont::Helvetica)?,
            bold: load(BuiltinFont::HelveticaBold)?,
        })
    }
}

struct Canvas {
    layer: PdfLayerReference,
    fonts: Fonts,
}

impl Canvas {
    fn text(&self, text: &str, size: f64, x: f64, y: f64, bold: bool) {
        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        self.fill(Rgb(0x20, 0x20, 0x20));
        self.layer.use_text(pdf_text(text), size, Mm(x), Mm(y), font);
    }

    /// Rough centring from Helvetica's average glyph width.
    fn centered(&self, text: &str, size: f64, y: f64, bold: bool) {
        let width = text_width(text, size);
        self.text(text, size, (PAGE_WIDTH - width) / 2.0, y, bold);
    }

    fn fill(&self, color: Rgb) {
        let (r, g, b) = color.unit();
        self.layer
            .set_fill_color(Color::Rgb(printpdf::Rgb::new(r, g, b, None)));
    }

    fn stroke(&self, color: Rgb, thickness: f64) {
        let (r, g, b) = color.unit();
        self.layer
            .set_outline_color(Color::Rgb(printpdf::Rgb::new(r, g, b, None)));
        self.layer.set_outline_thickness(thickness);
    }

    fn shape(&self, points: Vec<(f64, f64)>, closed: bool, filled: bool) {
        self.layer.add_shape(Line {
            points: points
                .into_iter()
                .map(|(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed: closed,
            has_fill: filled,
            has_stroke: !filled,
            is_clipping_path: false,
        });
    }

    fn rect(&self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        self.fill(color);
        self.shape(
            vec![(x, y), (x + width, y), (x + width, y + height), (x, y + height)],
            true,
            true,
        );
    }

    fn segment(&self, from: (f64, f64), to: (f64, f64)) {
        self.shape(vec![from, to], false, false);
    }

    fn table_row(
        &self,
        cells: &[String],
        x: f64,
        y: f64,
        col_width: f64,
        height: f64,
        bold: bool,
    ) {
        self.stroke(Rgb(0x40, 0x40, 0x40), 0.3);
        for (index, cell) in cells.iter().enumerate() {
            let left = x + col_width * index as f64;
            self.shape(
                vec![
                    (left, y),
                    (left + col_width, y),
                    (left + col_width, y + height),
                    (left, y + height),
                ],
                true,
                false,
            );
            let size = if bold { 10.0 } else { 9.0 };
            let text = truncate_to_width(&pdf_text(cell), size, col_width - 2.0);
            let text_x = left + (col_width - text_width(&text, size)) / 2.0;
            self.text(&text, size, text_x, y + 2.0, bold);
        }
    }
}

fn text_width(text: &str, size: f64) -> f64 {
    // Helvetica averages roughly half an em per glyph; 1pt = 0.3528mm.
    text.chars().count() as f64 * size * 0.5 * 0.3528
}

fn truncate_to_width(text: &str, size: f64, width: f64) -> String {
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if text_width(&out, size) > width {
            out.pop();
            break;
        }
    }
    out
}

struct PlotArea {
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
}

const PLOT: PlotArea = PlotArea {
    left: MARGIN + 18.0,
    right: PAGE_WIDTH - MARGIN - 50.0,
    bottom: MARGIN + 20.0,
    top: PAGE_HEIGHT - MARGIN - 16.0,
};

fn draw_y_axis(canvas: &Canvas, chart: &Chart, min: f64, max: f64) -> LinearScale {
    let scale = LinearScale {
        domain: (min, max),
        range: (PLOT.bottom, PLOT.top),
    };
    canvas.stroke(Rgb(0xdd, 0xdd, 0xdd), 0.2);
    for tick in 0..=4 {
        let value = min + (max - min) * f64::from(tick) / 4.0;
        let y = scale.at(value);
        canvas.segment((PLOT.left, y), (PLOT.right, y));
        let label = format_tick(value);
        canvas.text(&label, 8.0, PLOT.left - 3.0 - text_width(&label, 8.0), y - 1.0, false);
    }
    canvas.text(&chart.y_label, 9.0, MARGIN - 8.0, PLOT.top + 6.0, true);
    canvas.text(
        &chart.x_label,
        9.0,
        (PLOT.left + PLOT.right) / 2.0,
        MARGIN - 4.0,
        true,
    );
    scale
}

fn draw_bars(canvas: &Canvas, chart: &Chart) {
    let ys: Vec<f64> = chart.points.iter().map(|p| p.y).collect();
    let (min, max) = axis_range(&ys, true);
    let y = draw_y_axis(canvas, chart, min, max);
    let colors = chart.point_colors();

    let slot = (PLOT.right - PLOT.left) / chart.points.len() as f64;
    let width = slot * 0.7;
    for (index, point) in chart.points.iter().enumerate() {
        let x = PLOT.left + slot * index as f64 + (slot - width) / 2.0;
        let (low, high) = (y.at(point.y.min(0.0)), y.at(point.y.max(0.0)));
        canvas.rect(x, low, width, high - low, colors[index]);

        let label = truncate_to_width(&pdf_text(&point.label), 8.0, slot);
        let label_x = x + (width - text_width(&label, 8.0)) / 2.0;
        canvas.text(&label, 8.0, label_x, PLOT.bottom - 6.0, false);
        let value = format_tick(point.y);
        canvas.text(&value, 8.0, x + (width - text_width(&value, 8.0)) / 2.0, high + 2.0, false);
    }
}

fn draw_scatter(canvas: &Canvas, chart: &Chart) {
    let xs: Vec<f64> = chart.points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = chart.points.iter().map(|p| p.y).collect();
    let (x_min, x_max) = axis_range(&xs, false);
    let (y_min, y_max) = axis_range(&ys, false);
    let y = draw_y_axis(canvas, chart, y_min, y_max);
    let x = LinearScale {
        domain: (x_min, x_max),
        range: (PLOT.left, PLOT.right),
    };
    for tick in 0..=4 {
        let value = x_min + (x_max - x_min) * f64::from(tick) / 4.0;
        let label = format_tick(value);
        canvas.text(&label, 8.0, x.at(value) - text_width(&label, 8.0) / 2.0, PLOT.bottom - 6.0, false);
    }

    let colors = chart.point_colors();
    for (index, point) in chart.points.iter().enumerate() {
        let radius = chart.marker_radius(point, 2.0, 7.0);
        canvas.fill(colors[index]);
        canvas.shape(circle((x.at(point.x), y.at(point.y)), radius, 24), true, true);
        canvas.text(
            &point.label,
            7.0,
            x.at(point.x) + radius + 1.0,
            y.at(point.y) - 1.0,
            false,
        );
    }
    draw_legend(canvas, chart);
}

fn draw_pie(canvas: &Canvas, chart: &Chart) {
    let total: f64 = chart.points.iter().map(|p| p.y.max(0.0)).sum();
    if total <= 0.0 {
        canvas.text("No data", 12.0, MARGIN, PAGE_HEIGHT / 2.0, false);
        return;
    }
    let colors = chart.point_colors();
    let radius = (PLOT.top - PLOT.bottom) / 2.0;
    let center = (PLOT.left + radius + 10.0, (PLOT.top + PLOT.bottom) / 2.0);

    let mut angle = PI / 2.0;
    for (index, point) in chart.points.iter().enumerate() {
        let share = point.y.max(0.0) / total;
        if share <= 0.0 {
            continue;
        }
        let sweep = share * 2.0 * PI;
        let steps = ((sweep / (2.0 * PI)) * 72.0).ceil().max(2.0) as usize;
        let mut outline = vec![center];
        for step in 0..=steps {
            let a = angle - sweep * step as f64 / steps as f64;
            outline.push((center.0 + radius * a.cos(), center.1 + radius * a.sin()));
        }
        canvas.fill(colors[index]);
        canvas.shape(outline, true, true);

        let mid = angle - sweep / 2.0;
        let label = format!("{:.1}%", share * 100.0);
        canvas.text(
            &label,
            9.0,
            center.0 + radius * 0.6 * mid.cos() - text_width(&label, 9.0) / 2.0,
            center.1 + radius * 0.6 * mid.sin(),
            true,
        );
        angle -= sweep;
    }
    draw_legend(canvas, chart);
}

fn draw_legend(canvas: &Canvas, chart: &Chart) {
    let colors = chart.point_colors();
    let mut y = PLOT.top;
    let mut drawn: Vec<String> = Vec::new();
    for (point, color) in chart.points.iter().zip(colors) {
        let name = match (&point.color, chart.kind) {
            (Some(crate::chart::ColorKey::Category(name)), _) => name.clone(),
            (None, ChartKind::Pie) => point.label.clone(),
            _ => continue,
        };
        if drawn.contains(&name) {
            continue;
        }
        canvas.rect(PLOT.right + 8.0, y - 3.0, 4.0, 4.0, color);
        canvas.text(&name, 9.0, PLOT.right + 14.0, y - 2.5, false);
        drawn.push(name);
        y -= 7.0;
    }
}

fn circle(center: (f64, f64), radius: f64, steps: usize) -> Vec<(f64, f64)> {
    (0..steps)
        .map(|step| {
            let a = 2.0 * PI * step as f64 / steps as f64;
            (center.0 + radius * a.cos(), center.1 + radius * a.sin())
        })
        .collect()
}
