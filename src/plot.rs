//! Comparison chart of threshold-aligned series.

use anyhow::Result;
use plotters::prelude::*;
use rand::Rng;
use std::path::Path;
use tracing::info;

use crate::dataset::Dataset;
use crate::series::align_all;

pub const X_LABEL: &str = "days since threshold surpassed";
pub const CHART_SIZE: (u32, u32) = (1600, 900);
const LINE_ALPHA: f64 = 0.8;

/// One country's line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub country: String,
    pub points: Vec<(usize, u64)>,
    /// RGB components.
    pub color: (u8, u8, u8),
}

/// Everything needed to draw the chart, computed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub y_label: String,
    /// Exclusive upper bound of the x axis.
    pub x_end: usize,
    /// Exclusive upper bound of the y axis.
    pub y_end: u64,
    pub lines: Vec<ChartLine>,
}

impl ChartLayout {
    /// Aligns each requested country and assigns it a random color. Countries
    /// with no samples above `threshold` get no line.
    pub fn build<'a, I, R>(
        dataset: &Dataset,
        countries: I,
        threshold: u64,
        y_label: &str,
        rng: &mut R,
    ) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        R: Rng,
    {
        let lines: Vec<ChartLine> = align_all(dataset, countries, threshold)
            .into_iter()
            .map(|s| ChartLine {
                points: s.points().collect(),
                country: s.country,
                color: (rng.r#gen(), rng.r#gen(), rng.r#gen()),
            })
            .collect();

        let x_end = lines.iter().map(|l| l.points.len()).max().unwrap_or(0).max(1);
        let y_max = lines
            .iter()
            .flat_map(|l| l.points.iter().map(|&(_, y)| y))
            .max()
            .unwrap_or(0);
        // 5% headroom above the highest line
        let y_end = y_max.saturating_add(y_max / 20).saturating_add(1);

        ChartLayout {
            y_label: y_label.to_string(),
            x_end,
            y_end,
            lines,
        }
    }

    /// Draws the chart as SVG at `path`.
    pub fn draw(&self, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(30)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(0usize..self.x_end, 0u64..self.y_end)?;

        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(&RGBColor(100, 100, 100).mix(0.3))
            .x_desc(X_LABEL)
            .y_desc(self.y_label.as_str())
            .axis_desc_style(("sans-serif", 22))
            .label_style(("sans-serif", 18))
            .draw()?;

        for line in &self.lines {
            let (r, g, b) = line.color;
            let color = RGBColor(r, g, b);
            chart
                .draw_series(LineSeries::new(
                    line.points.iter().copied(),
                    color.mix(LINE_ALPHA).stroke_width(2),
                ))?
                .label(line.country.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        if !self.lines.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(("sans-serif", 18))
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

/// Renders one line per country in `countries` to an SVG file.
#[tracing::instrument(skip(dataset, countries, path), fields(path = %path.display()))]
pub fn render_comparison(
    dataset: &Dataset,
    countries: &[String],
    threshold: u64,
    y_label: &str,
    path: &Path,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let layout = ChartLayout::build(
        dataset,
        countries.iter().map(String::as_str),
        threshold,
        y_label,
        &mut rng,
    );
    layout.draw(path)?;
    info!(lines = layout.lines.len(), "Chart written");
    Ok(())
}
