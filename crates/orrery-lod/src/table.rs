//! Lookup tables mapping the normalized on-screen size of a body to LOD levels.

use orrery_config::ResolutionBand;

use crate::error::LodError;

/// Clamp a screen-size metric into `[0, 1]`. NaN maps to 0 (coarsest).
pub fn normalize_metric(metric: f32) -> f32 {
    if metric.is_nan() {
        0.0
    } else {
        metric.clamp(0.0, 1.0)
    }
}

fn check_unit_range(table: &'static str, value: f32) -> Result<(), LodError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LodError::OutOfRange { table, value })
    }
}

// ---------------------------------------------------------------------------
// ScreenSizeThresholds
// ---------------------------------------------------------------------------

/// Screen-size thresholds for mesh LOD selection.
///
/// `thresholds[i]` is the smallest on-screen size that still selects level `i`.
/// Sizes below the last threshold select `len()` (the coarsest mesh).
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenSizeThresholds {
    thresholds: Vec<f32>,
}

impl ScreenSizeThresholds {
    /// Validate a list of strictly decreasing thresholds in `[0, 1]`.
    pub fn new(thresholds: Vec<f32>) -> Result<Self, LodError> {
        const NAME: &str = "mesh";
        if thresholds.is_empty() {
            return Err(LodError::EmptyTable(NAME));
        }
        for (i, &t) in thresholds.iter().enumerate() {
            check_unit_range(NAME, t)?;
            if i > 0 && t >= thresholds[i - 1] {
                return Err(LodError::NotMonotonic(NAME, "decreasing"));
            }
        }
        Ok(Self { thresholds })
    }

    /// The coarsest mesh level.
    pub fn max_level(&self) -> usize {
        self.thresholds.len()
    }

    /// Select the mesh level for a screen-size metric. 0 is full detail.
    pub fn select(&self, metric: f32) -> usize {
        let metric = normalize_metric(metric);
        self.thresholds
            .iter()
            .position(|&t| metric >= t)
            .unwrap_or(self.thresholds.len())
    }
}

// ---------------------------------------------------------------------------
// ResolutionTable
// ---------------------------------------------------------------------------

/// Screen-size to texture-resolution table used by the distance-based strategies.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionTable {
    bands: Vec<ResolutionBand>,
}

impl ResolutionTable {
    /// Validate bands ordered by strictly decreasing `min_screen_size`.
    pub fn new(name: &'static str, bands: Vec<ResolutionBand>) -> Result<Self, LodError> {
        if bands.is_empty() {
            return Err(LodError::EmptyTable(name));
        }
        for (i, band) in bands.iter().enumerate() {
            check_unit_range(name, band.min_screen_size)?;
            if band.resolution == 0 {
                return Err(LodError::ZeroResolution(name));
            }
            if i > 0 && band.min_screen_size >= bands[i - 1].min_screen_size {
                return Err(LodError::NotMonotonic(name, "decreasing"));
            }
        }
        Ok(Self { bands })
    }

    /// Band index for a screen-size metric. Falls back to the last band.
    pub fn level(&self, metric: f32) -> usize {
        let metric = normalize_metric(metric);
        self.bands
            .iter()
            .position(|band| metric >= band.min_screen_size)
            .unwrap_or(self.bands.len() - 1)
    }

    /// Resolution of a band (clamped to the last band).
    pub fn resolution(&self, level: usize) -> u32 {
        self.bands[level.min(self.bands.len() - 1)].resolution
    }
}

// ---------------------------------------------------------------------------
// StepTable
// ---------------------------------------------------------------------------

/// Monotonically increasing resolution steps for the progressive strategies.
#[derive(Clone, Debug, PartialEq)]
pub struct StepTable {
    steps: Vec<u32>,
}

impl StepTable {
    /// Validate a non-empty, strictly increasing list of resolutions.
    pub fn new(name: &'static str, steps: Vec<u32>) -> Result<Self, LodError> {
        if steps.is_empty() {
            return Err(LodError::EmptyTable(name));
        }
        if steps.contains(&0) {
            return Err(LodError::ZeroResolution(name));
        }
        if steps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(LodError::NotMonotonic(name, "increasing"));
        }
        Ok(Self { steps })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`; construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Resolution at `step`, holding the last value past the end.
    pub fn resolution(&self, step: usize) -> u32 {
        self.steps[step.min(self.steps.len() - 1)]
    }
}
