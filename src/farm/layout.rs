//! Turbine layouts and the layout-optimizer seam.
//!
//! The search itself (a genetic algorithm over positions inside a boundary)
//! runs in an external engine behind [`LayoutOptimizer`]; this module owns the
//! inputs handed to it and checks what comes back.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AssessmentError, Result};

/// Position of one turbine in projected metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurbinePosition {
    pub x: f64,
    pub y: f64,
}

impl TurbinePosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &TurbinePosition) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub positions: Vec<TurbinePosition>,
}

impl Layout {
    pub fn new(name: impl Into<String>, positions: Vec<TurbinePosition>) -> Self {
        Self {
            name: name.into(),
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Join several layouts into one cluster, positions in input order
    pub fn concat(name: impl Into<String>, layouts: &[Layout]) -> Self {
        Self {
            name: name.into(),
            positions: layouts.iter().flat_map(|l| l.positions.iter().copied()).collect(),
        }
    }

    /// Smallest distance between any two turbines, `None` below two turbines
    pub fn min_spacing(&self) -> Option<f64> {
        self.positions
            .iter()
            .tuple_combinations()
            .map(|(a, b)| a.distance_to(b))
            .min_by(f64::total_cmp)
    }

    pub fn contains_position(&self, p: &TurbinePosition, tolerance: f64) -> bool {
        self.positions.iter().any(|q| q.distance_to(p) <= tolerance)
    }
}

/// Simple polygon enclosing the area turbines may be placed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPolygon {
    vertices: Vec<TurbinePosition>,
}

impl BoundaryPolygon {
    /// A repeated closing vertex is accepted and dropped.
    pub fn new(mut vertices: Vec<TurbinePosition>) -> Result<Self> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(AssessmentError::Domain(format!(
                "boundary polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(AssessmentError::Domain("boundary polygon has a non-finite vertex".into()));
        }
        let polygon = Self { vertices };
        if polygon.area() <= 0.0 {
            return Err(AssessmentError::Domain("boundary polygon has zero area".into()));
        }
        Ok(polygon)
    }

    pub fn vertices(&self) -> &[TurbinePosition] {
        &self.vertices
    }

    /// Enclosed area (shoelace formula)
    pub fn area(&self) -> f64 {
        let twice: f64 = self
            .vertices
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum();
        twice.abs() / 2.0
    }

    /// Even-odd point-in-polygon test. Points exactly on an edge may fall either way.
    pub fn contains(&self, p: &TurbinePosition) -> bool {
        self.vertices
            .iter()
            .circular_tuple_windows()
            .filter(|(a, b)| {
                (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x
            })
            .count()
            % 2
            == 1
    }
}

/// Parameters handed to the layout optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LayoutOptimizerConfig {
    #[validate(range(min = 1))]
    pub n_turbines: u32,
    #[validate(range(exclusive_min = 0.0))]
    pub rotor_diameter_m: f64,
    /// Minimum distance between turbines as a multiple of the rotor diameter
    #[validate(range(exclusive_min = 0.0))]
    pub min_spacing_diameters: f64,
    #[validate(range(min = 1))]
    pub population_size: u32,
    #[validate(range(min = 1))]
    pub generations: u32,
    pub seed: u64,
    #[validate(range(exclusive_min = 0.0))]
    pub ftol: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub xtol: f64,
}

impl Default for LayoutOptimizerConfig {
    fn default() -> Self {
        Self {
            n_turbines: 1,
            rotor_diameter_m: 240.0,
            min_spacing_diameters: 3.0,
            population_size: 50,
            generations: 100,
            seed: 42,
            ftol: 5e-3,
            xtol: 5e-3,
        }
    }
}

impl LayoutOptimizerConfig {
    pub fn min_distance_m(&self) -> f64 {
        self.min_spacing_diameters * self.rotor_diameter_m
    }
}

/// What the optimizer engine hands back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedLayout {
    pub layout: Layout,
    /// The engine's own verdict on whether all constraints are met
    pub valid: bool,
}

#[cfg_attr(test, mockall::automock)]
pub trait LayoutOptimizer {
    fn optimize(
        &self,
        name: &str,
        boundary: &BoundaryPolygon,
        config: &LayoutOptimizerConfig,
    ) -> Result<OptimizedLayout>;
}

/// Validate the config, run the optimizer, and check its result against
/// the boundary, turbine count and spacing. A result that breaks a
/// constraint is returned with `valid = false`.
pub fn optimize_layout(
    optimizer: &dyn LayoutOptimizer,
    name: &str,
    boundary: &BoundaryPolygon,
    config: &LayoutOptimizerConfig,
) -> Result<OptimizedLayout> {
    config.validate()?;
    info!(
        name,
        n_turbines = config.n_turbines,
        min_distance_m = config.min_distance_m(),
        area_km2 = boundary.area() / 1e6,
        "optimizing layout"
    );

    let mut result = optimizer.optimize(name, boundary, config)?;
    let layout = &result.layout;

    let outside = layout.positions.iter().filter(|p| !boundary.contains(p)).count();
    let spacing = layout.min_spacing();
    let too_close = spacing.is_some_and(|s| s < config.min_distance_m());
    let wrong_count = layout.len() != config.n_turbines as usize;

    if outside > 0 || too_close || wrong_count {
        warn!(
            name,
            outside,
            min_spacing_m = spacing,
            turbines = layout.len(),
            "optimized layout violates its constraints"
        );
        result.valid = false;
    }
    info!(name, turbines = layout.len(), valid = result.valid, "layout optimization finished");
    Ok(result)
}
