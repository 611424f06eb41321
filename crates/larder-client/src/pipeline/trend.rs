//! Piecewise-linear trend with automatic changepoints.
//!
//! Candidate changepoints sit on evenly spaced history points inside the
//! first 80% of the series. Each one may change the slope; those changes get
//! a Laplace prior whose scale is the trend flexibility. The MAP fit under
//! Gaussian noise minimises
//!
//! ```text
//! 0.5 * sum(residual^2) + (noise_variance / flexibility) * sum(|delta|)
//! ```
//!
//! where the noise variance comes from a plain least-squares line. The base
//! intercept and slope are unpenalised.
//!
//! Neighbouring hinge columns are nearly collinear, so coordinate descent
//! crawls once the series is long and the prior is loose. The fit instead
//! takes active-set steps: solve the normal equations on the current set of
//! bends with their signs fixed, walk towards that solution until a bend
//! would change sign, and add the bend that most violates optimality. It
//! stops at the exact optimum. Coordinate descent remains for designs whose
//! normal equations are singular.

use thiserror::Error;

const CHANGEPOINT_RANGE: f64 = 0.8;
const MAX_CHANGEPOINTS: usize = 25;
const CONVERGENCE_TOLERANCE: f64 = 1e-10;
const MAX_ACTIVE_SET_STEPS: usize = 8 * MAX_CHANGEPOINTS;
const OPTIMALITY_SLACK: f64 = 1e-9;
const NOISE_VARIANCE_FLOOR: f64 = 1e-6;
const DEGENERATE_SCALE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSettings {
    pub flexibility: f64,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("usage series is empty")]
    EmptySeries,
    #[error("time and value columns differ in length")]
    LengthMismatch,
    #[error("usage series contains non-finite values")]
    NonFinite,
    #[error("trend flexibility must be a positive number")]
    InvalidFlexibility,
    #[error("trend fit did not converge within {0} iterations")]
    NotConverged(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendModel {
    time_origin: f64,
    time_scale: f64,
    value_scale: f64,
    intercept: f64,
    slope: f64,
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
}

impl TrendModel {
    pub fn fit(times: &[f64], values: &[f64], settings: TrendSettings) -> Result<Self, FitError> {
        if values.is_empty() {
            return Err(FitError::EmptySeries);
        }
        if times.len() != values.len() {
            return Err(FitError::LengthMismatch);
        }
        if times.iter().chain(values).any(|value| !value.is_finite()) {
            return Err(FitError::NonFinite);
        }
        if !settings.flexibility.is_finite() || settings.flexibility <= 0.0 {
            return Err(FitError::InvalidFlexibility);
        }

        let mut observations = times
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect::<Vec<(f64, f64)>>();
        observations.sort_by(|left, right| left.0.total_cmp(&right.0));

        let time_origin = observations[0].0;
        let span = observations[observations.len() - 1].0 - time_origin;
        let time_scale = if span > DEGENERATE_SCALE { span } else { 1.0 };
        let largest = observations
            .iter()
            .map(|(_, value)| value.abs())
            .fold(0.0_f64, f64::max);
        let value_scale = if largest > DEGENERATE_SCALE {
            largest
        } else {
            1.0
        };

        let t = observations
            .iter()
            .map(|(time, _)| (time - time_origin) / time_scale)
            .collect::<Vec<f64>>();
        let y = observations
            .iter()
            .map(|(_, value)| value / value_scale)
            .collect::<Vec<f64>>();

        let changepoints = changepoint_locations(&t);
        let columns = changepoints
            .iter()
            .map(|location| hinge_column(&t, *location))
            .collect::<Vec<Vec<f64>>>();
        let column_norms = columns
            .iter()
            .map(|column| column.iter().map(|value| value * value).sum::<f64>())
            .collect::<Vec<f64>>();

        let noise_variance = line_residual_variance(&t, &y).max(NOISE_VARIANCE_FLOOR);
        let penalty = noise_variance / settings.flexibility;

        let design = HingeDesign {
            t: &t,
            y: &y,
            columns: &columns,
            column_norms: &column_norms,
            penalty,
        };
        let (intercept, slope, deltas) = match design.solve_active_set() {
            Some(solution) => solution,
            None => design.coordinate_descent(settings.max_iterations)?,
        };

        Ok(Self {
            time_origin,
            time_scale,
            value_scale,
            intercept,
            slope,
            changepoints,
            deltas,
        })
    }

    pub fn predict(&self, time: f64) -> f64 {
        let t = (time - self.time_origin) / self.time_scale;
        let bends = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(location, delta)| delta * (t - location).max(0.0))
            .sum::<f64>();
        (self.intercept + self.slope * t + bends) * self.value_scale
    }

    /// Number of changepoints whose slope change survived the prior.
    pub fn active_changepoints(&self) -> usize {
        self.deltas.iter().filter(|delta| **delta != 0.0).count()
    }
}

type LineWithBends = (f64, f64, Vec<f64>);

/// Scaled series plus hinge columns for one penalised fit.
struct HingeDesign<'a> {
    t: &'a [f64],
    y: &'a [f64],
    columns: &'a [Vec<f64>],
    column_norms: &'a [f64],
    penalty: f64,
}

impl HingeDesign<'_> {
    fn residuals(&self, intercept: f64, slope: f64, deltas: &[f64]) -> Vec<f64> {
        let mut residuals = self
            .t
            .iter()
            .zip(self.y)
            .map(|(time, value)| value - intercept - slope * time)
            .collect::<Vec<f64>>();
        for (column, delta) in self.columns.iter().zip(deltas) {
            if *delta != 0.0 {
                for (residual, value) in residuals.iter_mut().zip(column) {
                    *residual -= value * delta;
                }
            }
        }
        residuals
    }

    /// Exact optimum by active-set steps, or `None` when the normal equations
    /// turn singular or the step budget runs out.
    fn solve_active_set(&self) -> Option<LineWithBends> {
        let (mut intercept, mut slope) = least_squares_line(self.t, self.y);
        let mut deltas = vec![0.0; self.columns.len()];
        let mut active: Vec<(usize, f64)> = Vec::new();
        let ones = vec![1.0; self.t.len()];

        for _ in 0..MAX_ACTIVE_SET_STEPS {
            let mut features: Vec<&[f64]> = Vec::with_capacity(active.len() + 2);
            features.push(&ones);
            features.push(self.t);
            let mut offsets = vec![0.0, 0.0];
            for (index, sign) in &active {
                features.push(&self.columns[*index]);
                offsets.push(self.penalty * sign);
            }
            let gram = features
                .iter()
                .map(|row| features.iter().map(|column| dot(row, column)).collect())
                .collect::<Vec<Vec<f64>>>();
            let targets = features
                .iter()
                .zip(&offsets)
                .map(|(feature, offset)| dot(feature, self.y) - offset)
                .collect::<Vec<f64>>();
            let solution = solve_linear_system(gram, targets)?;

            let mut fraction = 1.0_f64;
            let mut blocked = None;
            for (position, (index, sign)) in active.iter().enumerate() {
                let target = solution[position + 2];
                if target * sign > 0.0 {
                    continue;
                }
                let current = deltas[*index];
                let gap = current - target;
                let reach = if gap != 0.0 { current / gap } else { 0.0 };
                if reach < fraction {
                    fraction = reach;
                    blocked = Some(position);
                }
            }

            intercept += fraction * (solution[0] - intercept);
            slope += fraction * (solution[1] - slope);
            for (position, (index, _)) in active.iter().enumerate() {
                deltas[*index] += fraction * (solution[position + 2] - deltas[*index]);
            }
            if let Some(position) = blocked {
                let (index, _) = active.remove(position);
                deltas[index] = 0.0;
                continue;
            }

            let residuals = self.residuals(intercept, slope, &deltas);
            let limit = self.penalty * (1.0 + OPTIMALITY_SLACK) + DEGENERATE_SCALE;
            let violator = self
                .columns
                .iter()
                .enumerate()
                .filter(|(index, _)| {
                    self.column_norms[*index] > DEGENERATE_SCALE
                        && active.iter().all(|(member, _)| member != index)
                })
                .map(|(index, column)| (index, dot(column, &residuals)))
                .filter(|(_, correlation)| correlation.abs() > limit)
                .max_by(|left, right| left.1.abs().total_cmp(&right.1.abs()));
            match violator {
                Some((index, correlation)) => active.push((index, correlation.signum())),
                None => return Some((intercept, slope, deltas)),
            }
        }

        None
    }

    /// Cyclic coordinate descent, updating the base line as one block.
    fn coordinate_descent(&self, max_iterations: usize) -> Result<LineWithBends, FitError> {
        let (mut intercept, mut slope) = least_squares_line(self.t, self.y);
        let mut deltas = vec![0.0; self.columns.len()];
        let mut residuals = self.residuals(intercept, slope, &deltas);

        for _ in 0..max_iterations {
            let partial = residuals
                .iter()
                .zip(self.t)
                .map(|(residual, time)| residual + intercept + slope * time)
                .collect::<Vec<f64>>();
            let (next_intercept, next_slope) = least_squares_line(self.t, &partial);
            let mut largest_step =
                (next_intercept - intercept).abs().max((next_slope - slope).abs());
            intercept = next_intercept;
            slope = next_slope;
            for (residual, (value, time)) in residuals.iter_mut().zip(partial.iter().zip(self.t)) {
                *residual = value - intercept - slope * time;
            }

            for (index, column) in self.columns.iter().enumerate() {
                let norm = self.column_norms[index];
                if norm <= DEGENERATE_SCALE {
                    continue;
                }
                let correlation = dot(column, &residuals) + norm * deltas[index];
                let next = soft_threshold(correlation, self.penalty) / norm;
                let step = next - deltas[index];
                if step != 0.0 {
                    for (residual, value) in residuals.iter_mut().zip(column) {
                        *residual -= value * step;
                    }
                    deltas[index] = next;
                }
                largest_step = largest_step.max(step.abs());
            }

            if largest_step < CONVERGENCE_TOLERANCE {
                return Ok((intercept, slope, deltas));
            }
        }

        Err(FitError::NotConverged(max_iterations))
    }
}

fn dot(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).map(|(a, b)| a * b).sum()
}

/// Gaussian elimination with partial pivoting; `None` for a singular system.
fn solve_linear_system(mut matrix: Vec<Vec<f64>>, mut targets: Vec<f64>) -> Option<Vec<f64>> {
    let size = targets.len();
    for pivot in 0..size {
        let best = (pivot..size).max_by(|left, right| {
            matrix[*left][pivot]
                .abs()
                .total_cmp(&matrix[*right][pivot].abs())
        })?;
        if matrix[best][pivot].abs() <= DEGENERATE_SCALE {
            return None;
        }
        matrix.swap(pivot, best);
        targets.swap(pivot, best);

        let (upper, lower) = matrix.split_at_mut(pivot + 1);
        let pivot_row = &upper[pivot];
        let pivot_target = targets[pivot];
        for (row, target) in lower.iter_mut().zip(targets.iter_mut().skip(pivot + 1)) {
            let factor = row[pivot] / pivot_row[pivot];
            if factor == 0.0 {
                continue;
            }
            for (entry, pivot_entry) in row.iter_mut().zip(pivot_row).skip(pivot) {
                *entry -= factor * pivot_entry;
            }
            *target -= factor * pivot_target;
        }
    }

    let mut solution = vec![0.0; size];
    for (row, coefficients) in matrix.iter().enumerate().rev() {
        let known = coefficients
            .iter()
            .zip(&solution)
            .skip(row + 1)
            .map(|(coefficient, value)| coefficient * value)
            .sum::<f64>();
        solution[row] = (targets[row] - known) / coefficients[row];
    }
    Some(solution)
}

fn changepoint_locations(t: &[f64]) -> Vec<f64> {
    let history = (t.len() as f64 * CHANGEPOINT_RANGE).floor() as usize;
    if history < 2 {
        return Vec::new();
    }
    let count = MAX_CHANGEPOINTS.min(history - 1);
    let last_index = (history - 1) as f64;

    let mut locations: Vec<f64> = Vec::with_capacity(count);
    for step in 1..=count {
        let index = (step as f64 * last_index / count as f64).round() as usize;
        let location = t[index.min(t.len() - 1)];
        if locations.last() != Some(&location) {
            locations.push(location);
        }
    }
    locations
}

fn hinge_column(t: &[f64], location: f64) -> Vec<f64> {
    t.iter().map(|time| (time - location).max(0.0)).collect()
}

fn least_squares_line(t: &[f64], y: &[f64]) -> (f64, f64) {
    let count = t.len() as f64;
    let mean_t = t.iter().sum::<f64>() / count;
    let mean_y = y.iter().sum::<f64>() / count;
    let spread = t.iter().map(|time| (time - mean_t).powi(2)).sum::<f64>();
    if spread <= DEGENERATE_SCALE {
        return (mean_y, 0.0);
    }
    let covariance = t
        .iter()
        .zip(y)
        .map(|(time, value)| (time - mean_t) * (value - mean_y))
        .sum::<f64>();
    let slope = covariance / spread;
    (mean_y - slope * mean_t, slope)
}

fn line_residual_variance(t: &[f64], y: &[f64]) -> f64 {
    let (intercept, slope) = least_squares_line(t, y);
    let squared = t
        .iter()
        .zip(y)
        .map(|(time, value)| (value - intercept - slope * time).powi(2))
        .sum::<f64>();
    let degrees_of_freedom = t.len().saturating_sub(2).max(1) as f64;
    squared / degrees_of_freedom
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}
