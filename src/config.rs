//! Cheatsheet configuration
//!
//! Defaults reproduce the historical 40mm cheatsheet. A JSON file may override any
//! field, its path is given explicitly or by the `DOF_CONFIG` environment variable.

use std::{
    env::{self, VarError},
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    optics::{OpticalConfig, OpticsError},
    table::Rounding,
    APERTURES, CIRCLE_OF_CONFUSION_MM, DISTANCES, FOCAL_LENGTH_MM,
};

/// Default plot image path
pub const PLOT_FILENAME: &str = "near_and_far_points_cheatsheet.png";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(r#""DOF_CONFIG" env var is not set"#)]
    Env(#[from] VarError),
    #[error("failed to read {1:?}")]
    ReadFile(#[source] io::Error, PathBuf),
    #[error("failed to parse {1:?}")]
    Parse(#[source] serde_json::Error, PathBuf),
    #[error("invalid optical configuration")]
    Optics(#[from] OpticsError),
}
type Result<T> = std::result::Result<T, ConfigError>;

/// Plot rendering policy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Larger physical apertures (smaller f-numbers) on the right
    pub invert_aperture_axis: bool,
    /// Logarithmic distance axis
    pub log_scale: bool,
    /// Distance axis range [m], derived from the data if not set
    pub y_limit: Option<(f64, f64)>,
    pub dpi: u32,
    /// Figure width and height in inches
    pub figure_size_in: (f64, f64),
}
impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            invert_aperture_axis: true,
            log_scale: true,
            y_limit: None,
            dpi: 300,
            figure_size_in: (12f64, 8f64),
        }
    }
}
impl PlotOptions {
    /// Image size in pixels
    pub fn pixels(&self) -> (u32, u32) {
        let (width, height) = self.figure_size_in;
        (
            (width * self.dpi as f64).round() as u32,
            (height * self.dpi as f64).round() as u32,
        )
    }
    /// Scales a size given in points at 72 DPI to the plot resolution
    pub fn scaled(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72f64
    }
}

/// Parameters of a cheatsheet run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub focal_length_mm: f64,
    pub circle_of_confusion_mm: f64,
    pub apertures: Vec<f64>,
    pub distances: Vec<f64>,
    /// Number of decimals of the reported values, full precision if not set
    pub decimals: Option<u32>,
    #[serde(flatten)]
    pub plot_options: PlotOptions,
    /// Plot image path, no plot if not set
    pub plot: Option<PathBuf>,
    /// Markdown report path
    pub markdown: Option<PathBuf>,
    /// CSV table path
    pub csv: Option<PathBuf>,
}
impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            focal_length_mm: FOCAL_LENGTH_MM,
            circle_of_confusion_mm: CIRCLE_OF_CONFUSION_MM,
            apertures: APERTURES.to_vec(),
            distances: DISTANCES.to_vec(),
            decimals: None,
            plot_options: PlotOptions::default(),
            plot: Some(PathBuf::from(PLOT_FILENAME)),
            markdown: None,
            csv: None,
        }
    }
}
impl ReportConfig {
    /// Loads the configuration from a JSON file, missing fields take their default values
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadFile(e, path.to_path_buf()))?;
        let this = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::Parse(e, path.to_path_buf()))?;
        log::info!("configuration loaded from {:?}", path);
        Ok(this)
    }
    /// Loads the configuration from the file which path is given by the env variable `DOF_CONFIG`
    pub fn from_env() -> Result<Self> {
        let path = env::var("DOF_CONFIG")?;
        Self::from_path(path)
    }
    /// Loads the configuration from `path` if given, else from `DOF_CONFIG` if set,
    /// else returns the defaults
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => match Self::from_env() {
                Err(ConfigError::Env(VarError::NotPresent)) => Ok(Self::default()),
                result => result,
            },
        }
    }
    pub fn focal_length_mm(self, focal_length_mm: f64) -> Self {
        Self {
            focal_length_mm,
            ..self
        }
    }
    pub fn circle_of_confusion_mm(self, circle_of_confusion_mm: f64) -> Self {
        Self {
            circle_of_confusion_mm,
            ..self
        }
    }
    pub fn apertures(self, apertures: Vec<f64>) -> Self {
        Self { apertures, ..self }
    }
    pub fn distances(self, distances: Vec<f64>) -> Self {
        Self { distances, ..self }
    }
    pub fn decimals(self, decimals: u32) -> Self {
        Self {
            decimals: Some(decimals),
            ..self
        }
    }
    pub fn invert_aperture_axis(mut self, invert: bool) -> Self {
        self.plot_options.invert_aperture_axis = invert;
        self
    }
    pub fn log_scale(mut self, log_scale: bool) -> Self {
        self.plot_options.log_scale = log_scale;
        self
    }
    pub fn y_limit(mut self, lower: f64, upper: f64) -> Self {
        self.plot_options.y_limit = Some((lower, upper));
        self
    }
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.plot_options.dpi = dpi;
        self
    }
    pub fn plot<P: Into<PathBuf>>(self, path: P) -> Self {
        Self {
            plot: Some(path.into()),
            ..self
        }
    }
    pub fn no_plot(self) -> Self {
        Self { plot: None, ..self }
    }
    pub fn markdown<P: Into<PathBuf>>(self, path: P) -> Self {
        Self {
            markdown: Some(path.into()),
            ..self
        }
    }
    pub fn csv<P: Into<PathBuf>>(self, path: P) -> Self {
        Self {
            csv: Some(path.into()),
            ..self
        }
    }
    /// Validated lens parameters
    pub fn optics(&self) -> Result<OpticalConfig> {
        Ok(OpticalConfig::new(
            self.focal_length_mm,
            self.circle_of_confusion_mm,
        )?)
    }
    pub fn rounding(&self) -> Rounding {
        self.decimals.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.focal_length_mm, 40f64);
        assert_eq!(config.apertures.len(), 10);
        assert_eq!(config.distances, vec![0.5, 1., 2., 5., 10., 20.]);
        assert_eq!(config.rounding(), Rounding::Full);
        assert_eq!(config.plot_options.pixels(), (3600, 2400));
        assert!(config.plot_options.invert_aperture_axis);
        assert!(config.plot_options.log_scale);
    }

    #[test]
    fn builder() {
        let config = ReportConfig::default()
            .focal_length_mm(50.)
            .decimals(2)
            .log_scale(false)
            .y_limit(0., 30.)
            .invert_aperture_axis(false)
            .markdown("cheatsheet.md")
            .no_plot();
        assert_eq!(config.focal_length_mm, 50f64);
        assert_eq!(config.rounding(), Rounding::Decimals(2));
        assert_eq!(config.plot_options.y_limit, Some((0., 30.)));
        assert!(!config.plot_options.log_scale);
        assert!(!config.plot_options.invert_aperture_axis);
        assert_eq!(config.markdown, Some(PathBuf::from("cheatsheet.md")));
        assert_eq!(config.plot, None);
    }

    #[test]
    fn partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dof.json");
        fs::write(
            &path,
            r#"{"focal_length_mm": 85, "decimals": 2, "log_scale": false, "y_limit": [0, 30]}"#,
        )
        .unwrap();
        let config = ReportConfig::from_path(&path).unwrap();
        assert_eq!(config.focal_length_mm, 85f64);
        assert_eq!(config.circle_of_confusion_mm, CIRCLE_OF_CONFUSION_MM);
        assert_eq!(config.decimals, Some(2));
        assert_eq!(config.plot_options.y_limit, Some((0., 30.)));
        assert!(!config.plot_options.log_scale);
        assert!(config.plot_options.invert_aperture_axis);
        assert_eq!(config.apertures, APERTURES.to_vec());
    }

    #[test]
    fn malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dof.json");
        fs::write(&path, r#"{"focal_length_mm": "forty"}"#).unwrap();
        let result = ReportConfig::from_path(&path);
        assert!(matches!(result, Err(ConfigError::Parse(..))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            ReportConfig::load(Some("/nonexistent/dof.json")),
            Err(ConfigError::ReadFile(..))
        ));
    }

    #[test]
    fn invalid_optics() {
        assert!(matches!(
            ReportConfig::default().circle_of_confusion_mm(0.).optics(),
            Err(ConfigError::Optics(OpticsError::InvalidConfiguration { .. }))
        ));
    }
}
