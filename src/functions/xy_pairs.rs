//! Tabulated (x, y) points and linear table lookup.

use serde::Deserialize;

use crate::core::error::{Result, SimError};
use crate::functions::{EvalScope, Function, Lookup};
use crate::tree::{Model, Properties, Property, Value};

/// Piecewise-linear interpolation over non-decreasing `xs`, clamped to the
/// end points outside the table. A repeated X is a step: at the step itself
/// the right-hand Y applies. `xs` and `ys` must be non-empty and of equal
/// length.
pub fn linear_interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return f64::NAN;
    }
    if x < xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    // First index with xs[i] > x; guaranteed to be in 1..n here
    let i = xs[..n].partition_point(|&v| v <= x);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPairs {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl TryFrom<RawPairs> for XyPairs {
    type Error = SimError;

    fn try_from(raw: RawPairs) -> Result<Self> {
        XyPairs::new(raw.x, raw.y)
    }
}

/// A validated lookup table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPairs")]
pub struct XyPairs {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl XyPairs {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let invalid = |message: String| SimError::Configuration {
            node: "XYPairs".into(),
            message,
        };
        if x.len() != y.len() {
            return Err(invalid(format!(
                "X has {} values but Y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(invalid("at least one point is required".into()));
        }
        if x.iter().chain(&y).any(|v| !v.is_finite()) {
            return Err(invalid("values must be finite".into()));
        }
        if let Some(w) = x.windows(2).find(|w| w[1] < w[0]) {
            return Err(invalid(format!(
                "X must be ascending ({} is followed by {})",
                w[0], w[1]
            )));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

impl Function for XyPairs {
    /// A table has no scalar value of its own
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        Err(SimError::NotScalar { node: scope.path() })
    }
}

impl Lookup for XyPairs {
    fn value_at(&self, x: f64, scope: &EvalScope<'_>) -> Result<f64> {
        if x.is_nan() {
            return Err(scope.computation_error("lookup argument is NaN"));
        }
        Ok(linear_interp(x, &self.x, &self.y))
    }
}

impl Model for XyPairs {
    fn kind(&self) -> &'static str {
        "XYPairs"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }

    fn as_lookup(&self) -> Option<&dyn Lookup> {
        Some(self)
    }
}

const XY_PAIRS_PROPERTIES: &[Property<XyPairs>] = &[
    Property::read_only("X", |p: &XyPairs| Value::Array(p.x.clone())),
    Property::read_only("Y", |p: &XyPairs| Value::Array(p.y.clone())),
];

impl Properties for XyPairs {
    fn property_table() -> &'static [Property<Self>] {
        XY_PAIRS_PROPERTIES
    }
}
