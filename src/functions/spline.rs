//! Clamped cubic spline interpolation.
//!
//! The spline is fitted with zero first derivative at both end points. Knots
//! are solved for their second derivatives with the Thomas algorithm; each
//! segment is then a cubic in `t = x - x[i]`. Arguments beyond the table use
//! the cubic of the nearest boundary segment.

use std::cell::OnceCell;

use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::functions::{EvalScope, Function, XyPairs};
use crate::lifecycle::{events, EventContext};
use crate::links::{LinkScope, LinkSpec};
use crate::tree::{Model, Properties, Property, Target, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    x: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Segment {
    fn eval(&self, x: f64) -> f64 {
        let t = x - self.x;
        self.a + t * (self.b + t * (self.c + t * self.d))
    }
}

/// A fitted clamped cubic spline
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    segments: Vec<Segment>,
}

impl CubicSpline {
    /// Fit through `(xs[i], ys[i])`; xs must be strictly ascending with at
    /// least two points.
    pub fn fit(xs: &[f64], ys: &[f64]) -> std::result::Result<Self, String> {
        let n = xs.len();
        if n != ys.len() {
            return Err(format!("X has {} values but Y has {}", n, ys.len()));
        }
        if n < 2 {
            return Err("a spline needs at least two points".into());
        }
        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        if h.iter().any(|&step| step <= 0.0) {
            return Err("X must be strictly ascending".into());
        }
        let slope = |i: usize| (ys[i + 1] - ys[i]) / h[i];

        // Tridiagonal system for the second derivatives m[i]
        let mut lower = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut upper = vec![0.0; n];
        let mut rhs = vec![0.0; n];

        diag[0] = 2.0 * h[0];
        upper[0] = h[0];
        rhs[0] = 6.0 * slope(0);
        for i in 1..n - 1 {
            lower[i] = h[i - 1];
            diag[i] = 2.0 * (h[i - 1] + h[i]);
            upper[i] = h[i];
            rhs[i] = 6.0 * (slope(i) - slope(i - 1));
        }
        lower[n - 1] = h[n - 2];
        diag[n - 1] = 2.0 * h[n - 2];
        rhs[n - 1] = -6.0 * slope(n - 2);

        // Forward sweep
        for i in 1..n {
            let w = lower[i] / diag[i - 1];
            diag[i] -= w * upper[i - 1];
            rhs[i] -= w * rhs[i - 1];
        }
        // Back substitution
        let mut m = vec![0.0; n];
        m[n - 1] = rhs[n - 1] / diag[n - 1];
        for i in (0..n - 1).rev() {
            m[i] = (rhs[i] - upper[i] * m[i + 1]) / diag[i];
        }

        let segments = (0..n - 1)
            .map(|i| Segment {
                x: xs[i],
                a: ys[i],
                b: slope(i) - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0,
                c: m[i] / 2.0,
                d: (m[i + 1] - m[i]) / (6.0 * h[i]),
            })
            .collect();
        Ok(Self { segments })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let after = self.segments.partition_point(|s| s.x <= x);
        let index = after.saturating_sub(1).min(self.segments.len() - 1);
        self.segments[index].eval(x)
    }
}

/// Reads `x_property` by path and evaluates a spline through the `XYPairs`
/// child. The fit happens on first use and is kept until the next
/// `Commencing`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplineInterpolation {
    pub x_property: String,
    #[serde(skip)]
    spline: OnceCell<CubicSpline>,
    #[serde(skip)]
    xy_pairs: Option<NodeId>,
}

impl SplineInterpolation {
    pub fn new(x_property: impl Into<String>) -> Self {
        Self {
            x_property: x_property.into(),
            ..Self::default()
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.spline.get().is_some()
    }

    fn spline(&self, scope: &EvalScope<'_>) -> Result<&CubicSpline> {
        if let Some(spline) = self.spline.get() {
            return Ok(spline);
        }
        let node = scope.linked(self.xy_pairs, "xy_pairs")?;
        let table = scope
            .tree()
            .model_as::<XyPairs>(node)
            .ok_or_else(|| scope.computation_error("xy_pairs link is not an XYPairs table"))?;
        let fitted = CubicSpline::fit(table.x(), table.y())
            .map_err(|message| scope.computation_error(message))?;
        tracing::debug!(node = %scope.path(), points = table.len(), "spline fitted");
        Ok(self.spline.get_or_init(|| fitted))
    }
}

impl Function for SplineInterpolation {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        let x = scope.require_number(&self.x_property)?;
        let y = self.spline(scope)?.eval(x);
        scope.finite(y, "Spline interpolation")
    }
}

impl Model for SplineInterpolation {
    fn kind(&self) -> &'static str {
        "SplineInterpolation"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }

    fn links(&self) -> Vec<LinkSpec> {
        vec![LinkSpec::required(
            "xy_pairs",
            Target::Kind("XYPairs"),
            LinkScope::Child,
        )]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        if slot == "xy_pairs" {
            self.xy_pairs = target;
        }
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        &[events::COMMENCING]
    }

    fn handle_event(&mut self, event: &str, _ctx: &mut EventContext<'_>) -> Result<()> {
        if event == events::COMMENCING {
            self.spline.take();
        }
        Ok(())
    }
}

const SPLINE_INTERPOLATION_PROPERTIES: &[Property<SplineInterpolation>] =
    &[Property::read_only("XProperty", |s: &SplineInterpolation| {
        Value::Text(s.x_property.clone())
    })];

impl Properties for SplineInterpolation {
    fn property_table() -> &'static [Property<Self>] {
        SPLINE_INTERPOLATION_PROPERTIES
    }
}
