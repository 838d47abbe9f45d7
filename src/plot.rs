//! SVG chart rendering: the faceted expression/accessibility scatter, the
//! per-chromosome diagnostic boxplots, and the explicit placeholder chart
//! used whenever there is nothing to plot.

use std::path::Path;

use indexmap::IndexMap;
use plotters::prelude::*;

use crate::error::MultiomeError;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 720;

fn chart_error(e: impl std::fmt::Display) -> MultiomeError {
    MultiomeError::Plot(e.to_string())
}

/// Render a placeholder chart: a titled, empty canvas with an explanatory
/// message. Used for every degenerate-data path instead of failing.
pub fn placeholder(path: &Path, title: &str, message: &str) -> Result<(), MultiomeError> {
    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    root.draw(&Text::new(
        title.to_string(),
        (40, 40),
        ("sans-serif", 28).into_font().color(&BLACK),
    ))
    .map_err(chart_error)?;
    root.draw(&Text::new(
        message.to_string(),
        ((WIDTH / 2 - 140) as i32, (HEIGHT / 2) as i32),
        ("sans-serif", 20).into_font().color(&full_palette::GREY_600),
    ))
    .map_err(chart_error)?;
    root.present().map_err(chart_error)?;
    Ok(())
}

/// Render a boxplot of `values` grouped by chromosome. An empty input
/// renders the "nothing to plot" placeholder.
pub fn boxplot_by_chrom(
    path: &Path,
    title: &str,
    y_label: &str,
    values: &[(String, f64)],
) -> Result<(), MultiomeError> {
    if values.is_empty() {
        return placeholder(path, title, "nothing to plot");
    }

    let mut groups: IndexMap<String, Vec<f64>> = IndexMap::new();
    for (chrom, value) in values {
        groups.entry(chrom.clone()).or_default().push(*value);
    }
    let labels: Vec<&str> = groups.keys().map(String::as_str).collect();

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, value) in values {
        y_min = y_min.min(*value);
        y_max = y_max.max(*value);
    }
    let pad = ((y_max - y_min) * 0.1).max(1.0);
    let y_range = (y_min - pad) as f32..(y_max + pad) as f32;

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(60)
        .build_cartesian_2d(labels[..].into_segmented(), y_range)
        .map_err(chart_error)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("chromosome")
        .y_desc(y_label)
        .draw()
        .map_err(chart_error)?;
    chart
        .draw_series(labels.iter().map(|label| {
            let quartiles = Quartiles::new(&groups[*label]);
            Boxplot::new_vertical(SegmentValue::CenterOf(label), &quartiles)
                .width(18)
                .style(BLUE)
        }))
        .map_err(chart_error)?;
    root.present().map_err(chart_error)?;
    Ok(())
}

/// Render the expression-versus-accessibility scatter, one facet per
/// chromosome. The caller is responsible for ensuring `points` is
/// non-empty; each point is `(chromosome, mean expression, aggregated
/// accessibility)`.
pub fn scatter_by_chrom(
    path: &Path,
    title: &str,
    points: &[(String, f64, f64)],
) -> Result<(), MultiomeError> {
    let mut groups: IndexMap<String, Vec<(f64, f64)>> = IndexMap::new();
    for (chrom, x, y) in points {
        groups.entry(chrom.clone()).or_default().push((*x, *y));
    }

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    let (title_area, plot_area) = root.split_vertically(48);
    title_area
        .draw(&Text::new(
            title.to_string(),
            (24, 16),
            ("sans-serif", 26).into_font().color(&BLACK),
        ))
        .map_err(chart_error)?;

    let facets = groups.len();
    let columns = (facets as f64).sqrt().ceil() as usize;
    let rows = facets.div_ceil(columns);
    let panels = plot_area.split_evenly((rows, columns));

    for (panel, (chrom, facet_points)) in panels.iter().zip(groups.iter()) {
        let (x_range, y_range) = facet_ranges(facet_points);
        let mut chart = ChartBuilder::on(panel)
            .caption(chrom, ("sans-serif", 16))
            .margin(8)
            .x_label_area_size(28)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)
            .map_err(chart_error)?;
        chart
            .configure_mesh()
            .x_labels(4)
            .y_labels(4)
            .draw()
            .map_err(chart_error)?;
        chart
            .draw_series(
                facet_points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, BLUE.mix(0.6).filled())),
            )
            .map_err(chart_error)?;
    }
    root.present().map_err(chart_error)?;
    Ok(())
}

/// Padded axis ranges for one scatter facet.
fn facet_ranges(points: &[(f64, f64)]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (x, y) in points {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    let x_pad = ((x_max - x_min) * 0.1).max(0.5);
    let y_pad = ((y_max - y_min) * 0.1).max(0.5);
    (
        x_min - x_pad..x_max + x_pad,
        y_min - y_pad..y_max + y_pad,
    )
}

#[cfg(test)]
mod tests {
    use super::{boxplot_by_chrom, placeholder, scatter_by_chrom};
    use std::fs;

    #[test]
    fn placeholder_writes_an_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        placeholder(&path, "Scatter", "nothing to plot").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
        assert!(content.contains("nothing to plot"));
    }

    #[test]
    fn empty_boxplot_input_renders_the_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxplot.svg");
        boxplot_by_chrom(&path, "Unmapped peaks", "total counts", &[]).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("nothing to plot"));
    }

    #[test]
    fn boxplot_and_scatter_render_with_data() {
        let dir = tempfile::tempdir().unwrap();

        let boxplot_path = dir.path().join("boxplot.svg");
        let values = vec![
            ("chr1".to_string(), 10.0),
            ("chr1".to_string(), 12.0),
            ("chr2".to_string(), 3.0),
        ];
        boxplot_by_chrom(&boxplot_path, "Unmapped peaks", "total counts", &values).unwrap();
        assert!(fs::read_to_string(&boxplot_path).unwrap().contains("<svg"));

        let scatter_path = dir.path().join("scatter.svg");
        let points = vec![
            ("chr1".to_string(), 1.0, 2.0),
            ("chr1".to_string(), 2.0, 4.0),
            ("chr2".to_string(), 0.5, 0.25),
        ];
        scatter_by_chrom(&scatter_path, "Expression vs accessibility", &points).unwrap();
        assert!(fs::read_to_string(&scatter_path).unwrap().contains("<svg"));
    }
}
