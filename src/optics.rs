//! Depth of field optics
//!
//! Closed-form thin lens expressions for the hyperfocal distance and the near and far
//! limits of acceptable sharpness. Focal length and circle of confusion are given in
//! millimeters, distances are returned in meters.

use std::fmt;

/// Optical parameter validated before any computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    FocalLength,
    CircleOfConfusion,
    Aperture,
    Distance,
}
impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::FocalLength => write!(f, "focal length [mm]"),
            Parameter::CircleOfConfusion => write!(f, "circle of confusion [mm]"),
            Parameter::Aperture => write!(f, "aperture [f-number]"),
            Parameter::Distance => write!(f, "subject distance [m]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpticsError {
    #[error("invalid configuration: {parameter} must be a positive finite number, found {value}")]
    InvalidConfiguration { parameter: Parameter, value: f64 },
    #[error("invalid configuration: the list of {0} is empty")]
    EmptyInput(&'static str),
    #[error("degenerate geometry at {distance_m}m and f/{aperture}: subject is too close to the lens")]
    DegenerateGeometry { distance_m: f64, aperture: f64 },
}
type Result<T> = std::result::Result<T, OpticsError>;

/// Checks that `value` is strictly positive and finite
pub fn validate(parameter: Parameter, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0f64 {
        Ok(value)
    } else {
        Err(OpticsError::InvalidConfiguration { parameter, value })
    }
}

/// A distance in meters that may lie at infinity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    Finite(f64),
    Infinite,
}
impl Distance {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Distance::Infinite)
    }
    /// Returns the finite value or `None` at infinity
    pub fn finite(&self) -> Option<f64> {
        match self {
            Distance::Finite(value) => Some(*value),
            Distance::Infinite => None,
        }
    }
    /// Rounds half away from zero to `decimals` places, infinity is left as is
    pub fn round(self, decimals: u32) -> Self {
        match self {
            Distance::Finite(value) => Distance::Finite(round(value, decimals)),
            Distance::Infinite => Distance::Infinite,
        }
    }
}
impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match (self, f.precision()) {
            (Distance::Finite(value), Some(precision)) => format!("{:.*}", precision, value),
            (Distance::Finite(value), None) => value.to_string(),
            (Distance::Infinite, _) => String::from("inf"),
        };
        match f.width() {
            Some(width) => write!(f, "{:>width$}", value, width = width),
            None => f.write_str(&value),
        }
    }
}

/// Rounds half away from zero to `decimals` places
///
/// Values are returned unchanged when `decimals` is beyond the `f64` precision.
pub fn round(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals.min(i32::MAX as u32) as i32);
    let scaled = value * scale;
    if scale.is_finite() && scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    }
}

/// Lens focal length and sharpness tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalConfig {
    focal_length_mm: f64,
    circle_of_confusion_mm: f64,
}
impl OpticalConfig {
    pub fn new(focal_length_mm: f64, circle_of_confusion_mm: f64) -> Result<Self> {
        Ok(Self {
            focal_length_mm: validate(Parameter::FocalLength, focal_length_mm)?,
            circle_of_confusion_mm: validate(Parameter::CircleOfConfusion, circle_of_confusion_mm)?,
        })
    }
    pub fn focal_length_mm(&self) -> f64 {
        self.focal_length_mm
    }
    pub fn circle_of_confusion_mm(&self) -> f64 {
        self.circle_of_confusion_mm
    }
    /// Focal length [m]
    pub fn focal_length_m(&self) -> f64 {
        self.focal_length_mm * 1e-3
    }
    /// Hyperfocal distance [m] at the given f-number
    pub fn hyperfocal_distance(&self, aperture: f64) -> f64 {
        hyperfocal_distance(self.focal_length_mm, aperture, self.circle_of_confusion_mm)
    }
}

/// Hyperfocal distance [m]
///
/// `H = f² / (N c) / 1000 + f / 1000` with the focal length `f` and the circle of
/// confusion `c` in millimeters.
pub fn hyperfocal_distance(
    focal_length_mm: f64,
    aperture: f64,
    circle_of_confusion_mm: f64,
) -> f64 {
    focal_length_mm.powi(2) / (aperture * circle_of_confusion_mm) * 1e-3 + focal_length_mm * 1e-3
}

/// Near limit of sharpness [m] when focused at `distance_m`
///
/// Returns `None` if the denominator `H + (D - f)` is not positive.
pub fn near_point(hyperfocal_m: f64, distance_m: f64, focal_length_mm: f64) -> Option<f64> {
    let denominator = hyperfocal_m + (distance_m - focal_length_mm * 1e-3);
    if denominator > 0f64 {
        Some(hyperfocal_m * distance_m / denominator)
    } else {
        None
    }
}

/// Far limit of sharpness [m] when focused at `distance_m`
///
/// The far point is at infinity when the subject is at or beyond the hyperfocal
/// distance, or whenever the denominator `H - (D - f)` is not positive.
pub fn far_point(hyperfocal_m: f64, distance_m: f64, focal_length_mm: f64) -> Distance {
    if distance_m >= hyperfocal_m {
        return Distance::Infinite;
    }
    let denominator = hyperfocal_m - (distance_m - focal_length_mm * 1e-3);
    if denominator > 0f64 {
        Distance::Finite(hyperfocal_m * distance_m / denominator)
    } else {
        Distance::Infinite
    }
}

/// Depth of field [m], the span between the near and the far points
pub fn depth_of_field(near_point_m: f64, far_point: Distance) -> Distance {
    match far_point {
        Distance::Finite(far_point_m) => Distance::Finite(far_point_m - near_point_m),
        Distance::Infinite => Distance::Infinite,
    }
}
