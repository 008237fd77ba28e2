//! Confusion matrix heatmap rendered to PNG with plotters

use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::metrics::{ensure_parent, ConfusionMatrix};
use crate::pipeline::PriceBucket;

/// Default location of the heatmap image
pub const DEFAULT_HEATMAP_PATH: &str = "confusion_matrix.png";

const IMAGE_SIZE: (u32, u32) = (480, 460);
const FONT: &str = "sans-serif";

type HeatmapChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Write the confusion matrix as an annotated blue heatmap (true labels on
/// the vertical axis, predicted labels on the horizontal axis)
pub fn write_heatmap(matrix: &ConfusionMatrix, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let n = PriceBucket::ALL.len() as f64;
    let max = matrix.iter().flatten().copied().max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin_top(50)
        .margin_bottom(60)
        .margin_left(100)
        .margin_right(20)
        .build_cartesian_2d(0.0..n, 0.0..n)?;

    chart.draw_series(cells(matrix).map(|(i, j, value)| {
        let color = cell_colors(value as f64 / max as f64).0;
        Rectangle::new(cell_corners(i, j, n), color.filled())
    }))?;
    chart.draw_series(
        cells(matrix).map(|(i, j, _)| Rectangle::new(cell_corners(i, j, n), WHITE.stroke_width(2))),
    )?;

    // Text needs a system font; the colored grid is still written without one
    if let Err(e) = annotate(&root, &chart, matrix, max) {
        tracing::warn!(error = %e, "Heatmap labels could not be drawn");
    }

    root.present()
        .with_context(|| format!("Failed to write heatmap: {}", path.display()))?;
    Ok(())
}

/// `(true index, predicted index, count)` for every cell
fn cells(matrix: &ConfusionMatrix) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    matrix
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &value)| (i, j, value)))
}

/// Row 0 sits at the top of the grid
fn cell_corners(i: usize, j: usize, n: f64) -> [(f64, f64); 2] {
    let top = n - i as f64;
    [(j as f64, top), (j as f64 + 1.0, top - 1.0)]
}

/// Counts inside the cells, class names along both axes and the title
fn annotate(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    chart: &HeatmapChart<'_, '_>,
    matrix: &ConfusionMatrix,
    max: usize,
) -> Result<()> {
    let n = PriceBucket::ALL.len() as f64;
    let centered = Pos::new(HPos::Center, VPos::Center);

    for (i, j, value) in cells(matrix) {
        let text_color = cell_colors(value as f64 / max as f64).1;
        let center = chart.backend_coord(&(j as f64 + 0.5, n - i as f64 - 0.5));
        let style = (FONT, 20).into_font().color(&text_color).pos(centered);
        root.draw(&Text::new(value.to_string(), center, style))?;
    }

    let label_style = (FONT, 15).into_font().color(&BLACK);
    for (k, bucket) in PriceBucket::ALL.iter().enumerate() {
        let (x, y) = chart.backend_coord(&(k as f64 + 0.5, 0.0));
        root.draw(&Text::new(bucket.to_string(), (x, y + 18), label_style.pos(centered)))?;

        let (x, y) = chart.backend_coord(&(0.0, n - k as f64 - 0.5));
        let right = Pos::new(HPos::Right, VPos::Center);
        root.draw(&Text::new(bucket.to_string(), (x - 10, y), label_style.pos(right)))?;
    }

    let (width, height) = root.dim_in_pixel();
    let (left, _) = chart.backend_coord(&(0.0, 0.0));
    let (right, _) = chart.backend_coord(&(n, 0.0));
    let middle = (left + right) / 2;
    root.draw(&Text::new(
        "Confusion Matrix",
        (width as i32 / 2, 25),
        (FONT, 20).into_font().color(&BLACK).pos(centered),
    ))?;
    root.draw(&Text::new("Predicted", (middle, height as i32 - 18), label_style.pos(centered)))?;
    root.draw(&Text::new("True", (12, height as i32 / 2), label_style.pos(Pos::new(HPos::Left, VPos::Center))))?;
    Ok(())
}

/// Linear white-to-blue fill, with dark text on light cells
fn cell_colors(intensity: f64) -> (RGBColor, RGBColor) {
    let t = intensity.clamp(0.0, 1.0);
    let lerp = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    let fill = RGBColor(lerp(247.0, 8.0), lerp(251.0, 48.0), lerp(255.0, 107.0));
    let text = if t > 0.5 { WHITE } else { BLACK };
    (fill, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_write_heatmap_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plots").join(DEFAULT_HEATMAP_PATH);

        write_heatmap(&[[5, 1, 0], [2, 7, 3], [0, 4, 9]], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > PNG_SIGNATURE.len());
        assert_eq!(bytes[..8], PNG_SIGNATURE);
    }

    #[test]
    fn test_all_zero_matrix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.png");

        write_heatmap(&[[0; 3]; 3], &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap()[..8], PNG_SIGNATURE);
    }

    #[test]
    fn test_cells_row_major() {
        let matrix = [[5, 1, 0], [2, 7, 3], [0, 4, 9]];
        let all: Vec<_> = cells(&matrix).collect();

        assert_eq!(all.len(), 9);
        assert_eq!(all[5], (1, 2, 3));
    }

    #[test]
    fn test_first_row_drawn_at_top() {
        assert_eq!(cell_corners(0, 0, 3.0), [(0.0, 3.0), (1.0, 2.0)]);
        assert_eq!(cell_corners(2, 1, 3.0), [(1.0, 1.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_cell_colors_bounds() {
        assert_eq!(cell_colors(0.0), (RGBColor(247, 251, 255), BLACK));
        assert_eq!(cell_colors(1.0), (RGBColor(8, 48, 107), WHITE));
    }
}
