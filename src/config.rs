use crate::grid::Cavity;
use crate::solver::{CavityFootprint, UpdateScheme};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        if self.nx < 3 || self.ny < 3 {
            return Err(anyhow!(
                "Grid must be at least 3x3 to have an interior (nx={}, ny={})",
                self.nx,
                self.ny
            ));
        }
        Ok(())
    }
}

/// Inner conductor rectangle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CavityConfig {
    pub x: usize, // First row
    pub w: usize, // Rows covered
    pub y: usize, // First column
    pub h: usize, // Columns covered
}

impl CavityConfig {
    pub fn cavity(&self) -> Cavity {
        Cavity::new(self.x, self.w, self.y, self.h)
    }

    fn validate(&self, nx: usize, ny: usize) -> Result<()> {
        if self.w == 0 || self.h == 0 {
            return Err(anyhow!(
                "Cavity extent must be positive (w={}, h={})",
                self.w,
                self.h
            ));
        }
        let inside = |origin: usize, extent: usize, limit: usize| {
            origin > 0 && origin.checked_add(extent).is_some_and(|end| end < limit)
        };
        if !inside(self.x, self.w, nx) || !inside(self.y, self.h, ny) {
            return Err(anyhow!(
                "Cavity at ({}, {}) with extent {}x{} must lie strictly inside the {}x{} grid",
                self.x,
                self.y,
                self.w,
                self.h,
                nx,
                ny
            ));
        }
        Ok(())
    }
}

/// Conductor potentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialConfig {
    #[serde(default)]
    pub outer: f64,
    #[serde(default = "default_inner")]
    pub inner: f64,
}

fn default_inner() -> f64 {
    100.0
}

impl Default for PotentialConfig {
    fn default() -> Self {
        Self {
            outer: 0.0,
            inner: default_inner(),
        }
    }
}

impl PotentialConfig {
    fn validate(&self) -> Result<()> {
        if !self.outer.is_finite() || !self.inner.is_finite() {
            return Err(anyhow!(
                "Potentials must be finite (outer={}, inner={})",
                self.outer,
                self.inner
            ));
        }
        Ok(())
    }
}

/// Relaxation run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationConfig {
    #[serde(default = "default_n_runs")]
    pub n_runs: usize, // The run performs n_runs + 1 sweeps
    #[serde(default = "default_report_period")]
    pub report_period: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>, // Optional: stop once no cell moves more than this
    #[serde(default)]
    pub scheme: UpdateScheme,
    #[serde(default)]
    pub footprint: CavityFootprint,
}

fn default_n_runs() -> usize {
    1000
}

fn default_report_period() -> usize {
    100
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            n_runs: default_n_runs(),
            report_period: default_report_period(),
            tolerance: None,
            scheme: UpdateScheme::default(),
            footprint: CavityFootprint::default(),
        }
    }
}

impl RelaxationConfig {
    fn validate(&self) -> Result<()> {
        if self.report_period == 0 {
            return Err(anyhow!("report_period must be positive"));
        }
        if let Some(tolerance) = self.tolerance {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(anyhow!("tolerance must be positive, got {}", tolerance));
            }
        }
        Ok(())
    }

    /// Total number of sweeps under the fixed-count policy.
    pub fn sweeps(&self) -> usize {
        self.n_runs.saturating_add(1)
    }
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_interval: Option<usize>, // Optional: also render every n sweeps
}

fn default_enabled() -> bool {
    true
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_image_width() -> u32 {
    800
}

fn default_image_height() -> u32 {
    700
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            output_dir: default_output_dir(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            frame_interval: None,
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        if self.frame_interval == Some(0) {
            return Err(anyhow!("frame_interval must be positive"));
        }
        Ok(())
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub cavity: CavityConfig,
    #[serde(default)]
    pub potentials: PotentialConfig,
    #[serde(default)]
    pub relaxation: RelaxationConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Default for Config {
    /// 10x10 box with a 4x4 conductor at (3, 3), held at 0 and 100.
    fn default() -> Self {
        Self {
            grid: GridConfig { nx: 10, ny: 10 },
            cavity: CavityConfig {
                x: 3,
                w: 4,
                y: 3,
                h: 4,
            },
            potentials: PotentialConfig::default(),
            relaxation: RelaxationConfig::default(),
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.cavity.validate(self.grid.nx, self.grid.ny)?;
        self.potentials.validate()?;
        self.relaxation.validate()?;
        self.visualization.validate()?;

        if self.relaxation.footprint == CavityFootprint::Reference
            && self.cavity.w > self.cavity.h
        {
            warn!(
                "Reference cavity footprint skips columns {}..{} beyond the cavity (w={} > h={})",
                self.cavity.y + self.cavity.h,
                self.cavity.y + self.cavity.w,
                self.cavity.w,
                self.cavity.h
            );
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn print_summary(&self) {
        let cavity = self.cavity.cavity();
        info!("=== Relaxation Configuration ===");
        info!("Grid: {}x{}", self.grid.nx, self.grid.ny);
        info!(
            "Cavity: rows {}..={}, columns {}..={}",
            cavity.x,
            cavity.x_end(),
            cavity.y,
            cavity.y_end()
        );
        info!(
            "Potentials: outer={}, inner={}",
            self.potentials.outer, self.potentials.inner
        );
        match self.relaxation.tolerance {
            Some(tolerance) => info!(
                "Relaxation: {:?}, up to {} sweeps, tolerance={}",
                self.relaxation.scheme,
                self.relaxation.sweeps(),
                tolerance
            ),
            None => info!(
                "Relaxation: {:?}, {} sweeps",
                self.relaxation.scheme,
                self.relaxation.sweeps()
            ),
        }
        info!("Cavity footprint: {:?}", self.relaxation.footprint);
        if self.visualization.enabled {
            info!(
                "Visualization: {}x{} into '{}'",
                self.visualization.image_width,
                self.visualization.image_height,
                self.visualization.output_dir
            );
        }
        info!("================================");
    }
}
