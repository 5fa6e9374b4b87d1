use anyhow::{Context, Result};
use ndarray::Array2;
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::info;

const COLOUR_BAR_WIDTH: u32 = 110;
const COLOUR_BAR_STEPS: usize = 128;

/// Renders potential snapshots as PNG heat maps, row 0 at the bottom, with a
/// colour bar on the right.
pub struct PotentialVisualiser {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    gradient: Box<dyn colorgrad::Gradient>,
}

impl PotentialVisualiser {
    pub fn new(output_dir: &str, width: u32, height: u32) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory '{}'", output_dir))?;

        // Red-grey diverging map
        let gradient = Box::new(colorgrad::preset::rd_gy());

        Ok(Self {
            output_dir: PathBuf::from(output_dir),
            width,
            height,
            gradient,
        })
    }

    pub fn frame_path(&self, sweep: usize) -> PathBuf {
        self.output_dir.join(format!("potential_{:06}.png", sweep))
    }

    pub fn plot_potential(
        &self,
        data: &Array2<f64>,
        sweep: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let filename = self.frame_path(sweep);
        let (low, high) = colour_range(data);

        {
            let root =
                BitMapBackend::new(&filename, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let split = self.width.saturating_sub(COLOUR_BAR_WIDTH) as i32;
            let (field_area, bar_area) = root.split_horizontally(split);

            let (nx, ny) = data.dim();
            let title = format!("Potential after {} sweeps", sweep);
            let mut chart = ChartBuilder::on(&field_area)
                .caption(&title, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(40)
                .build_cartesian_2d(0..ny, 0..nx)?;

            chart
                .configure_mesh()
                .x_desc("Column")
                .y_desc("Row")
                .draw()?;

            chart.draw_series(data.indexed_iter().map(|((row, col), &value)| {
                let color = self.colour_at(normalise(value, low, high));
                Rectangle::new([(col, row), (col + 1, row + 1)], color.filled())
            }))?;

            let mut bar = ChartBuilder::on(&bar_area)
                .margin_top(50)
                .margin_bottom(50)
                .margin_right(10)
                .y_label_area_size(60)
                .build_cartesian_2d(0..1, low..high)?;

            bar.configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(6)
                .draw()?;

            bar.draw_series(colour_bar_bands(low, high).into_iter().map(|(v0, v1)| {
                let color = self.colour_at(normalise(0.5 * (v0 + v1), low, high));
                Rectangle::new([(0, v0), (1, v1)], color.filled())
            }))?;

            root.present()?;
        }

        info!("Saved frame: {}", filename.display());
        Ok(filename)
    }

    fn colour_at(&self, t: f64) -> RGBColor {
        let [r, g, b, _] = self.gradient.at(t as f32).to_rgba8();
        RGBColor(r, g, b)
    }
}

/// Value range the colour map spans. A flat field gets a unit-wide range
/// around its value so the colour bar axis is never empty.
fn colour_range(data: &Array2<f64>) -> (f64, f64) {
    let low = data.iter().copied().fold(f64::INFINITY, f64::min);
    let high = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        (0.0, 1.0)
    } else if high > low {
        (low, high)
    } else {
        (low - 0.5, high + 0.5)
    }
}

/// Position of `value` in `[low, high]`, clamped to `[0, 1]`.
fn normalise(value: f64, low: f64, high: f64) -> f64 {
    if high > low {
        ((value - low) / (high - low)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Contiguous bands covering `[low, high]` for the colour bar.
fn colour_bar_bands(low: f64, high: f64) -> Vec<(f64, f64)> {
    let step = (high - low) / COLOUR_BAR_STEPS as f64;
    (0..COLOUR_BAR_STEPS)
        .map(|k| (low + step * k as f64, low + step * (k + 1) as f64))
        .collect()
}
