//! Chart descriptions and the renderers that consume them.
//!
//! The analysis never draws anything itself. Each stage describes what it
//! would plot as a [`Chart`] and hands it to a [`Renderer`]; the default
//! [`NullRenderer`] discards it.

use crate::error::Result;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Chart model
// ---------------------------------------------------------------------------

/// X coordinate of a plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XValue {
    Date(NaiveDate),
    Lag(usize),
}

impl std::fmt::Display for XValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            XValue::Lag(l) => write!(f, "{}", l),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Connected lines over dates.
    Line,
    /// Vertical stems over integer lags (correlograms).
    Stem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub dashed: bool,
    pub points: Vec<(XValue, f64)>,
}

impl ChartSeries {
    pub fn dated(label: &str, dates: &[NaiveDate], values: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            dashed: false,
            points: dates
                .iter()
                .zip(values)
                .map(|(d, v)| (XValue::Date(*d), *v))
                .collect(),
        }
    }

    pub fn lagged(label: &str, values: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            dashed: false,
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (XValue::Lag(i), *v))
                .collect(),
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Everything needed to draw one figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub series: Vec<ChartSeries>,
}

impl Chart {
    pub fn line(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            kind: ChartKind::Line,
            series: Vec::new(),
        }
    }

    pub fn stem(title: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: "Lag".to_string(),
            y_label: "Correlation".to_string(),
            kind: ChartKind::Stem,
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    /// Lowercase, dash-separated form of the title, for file names.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for c in self.title.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.trim_matches('-').to_string()
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Receives charts as the pipeline produces them.
pub trait Renderer {
    fn render(&mut self, chart: &Chart) -> Result<()>;
}

/// Discards every chart.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _chart: &Chart) -> Result<()> {
        Ok(())
    }
}

/// Writes each chart to `<dir>/<NN>-<slug>.csv` as `series,x,y` rows.
pub struct CsvChartRenderer {
    dir: PathBuf,
    count: usize,
    written: Vec<PathBuf>,
}

impl CsvChartRenderer {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            count: 0,
            written: Vec::new(),
        })
    }

    /// Paths written so far, in render order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Renderer for CsvChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        self.count += 1;
        let path = self.dir.join(format!("{:02}-{}.csv", self.count, chart.slug()));
        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        writer.write_record(["series", "x", "y"])?;
        for series in &chart.series {
            for (x, y) in &series.points {
                writer.write_record([series.label.clone(), x.to_string(), y.to_string()])?;
            }
        }
        writer.flush()?;
        self.written.push(path);
        Ok(())
    }
}

/// Draws a terse terminal view of each chart.
///
/// Stem charts become horizontal bar correlograms; line charts are reduced
/// to a first/last/min/max summary per series.
pub struct TextRenderer<W: Write> {
    out: W,
    bar_width: usize,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, bar_width: 40 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_stem(&mut self, series: &ChartSeries) -> io::Result<()> {
        writeln!(self.out, "  {} (n={}):", series.label, series.points.len())?;
        let max_val = series
            .points
            .iter()
            .map(|(_, v)| v.abs())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
            .max(1.0);
        let half = self.bar_width / 2;
        for (x, value) in &series.points {
            let len = ((value.abs() / max_val) * half as f64).round() as usize;
            let (left, right) = if *value >= 0.0 {
                (" ".repeat(half), "#".repeat(len))
            } else {
                (format!("{}{}", " ".repeat(half - len), "#".repeat(len)), String::new())
            };
            writeln!(self.out, "  {:>4} | {:>7.3} |{}|{}", x.to_string(), value, left, right)?;
        }
        Ok(())
    }

    fn render_line(&mut self, series: &ChartSeries) -> io::Result<()> {
        let finite: Vec<&(XValue, f64)> = series.points.iter().filter(|(_, v)| v.is_finite()).collect();
        let (Some(first), Some(last)) = (finite.first(), finite.last()) else {
            return writeln!(self.out, "  {}: no finite values", series.label);
        };
        let min = finite.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        let max = finite.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
        writeln!(
            self.out,
            "  {}: {} points, {} = {:.4} .. {} = {:.4}, min {:.4}, max {:.4}",
            series.label,
            series.points.len(),
            first.0,
            first.1,
            last.0,
            last.1,
            min,
            max
        )
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        writeln!(self.out, "\n[{}]", chart.title)?;
        for series in &chart.series {
            match chart.kind {
                ChartKind::Stem => self.render_stem(series)?,
                ChartKind::Line => self.render_line(series)?,
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
