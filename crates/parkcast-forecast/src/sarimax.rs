//! Seasonal ARIMA fitted by conditional sum of squares
//!
//! The model is `phi(B) Phi(B^s) (1-B)^d (1-B^s)^D y_t = theta(B) Theta(B^s) e_t`
//! with no intercept. Coefficients are searched inside a box wider than
//! the unit interval, so non-stationary or non-invertible estimates are
//! accepted rather than rejected.

use crate::optimizer::{nelder_mead, Bounds};
use crate::{ModelError, ModelResult, SeasonalModel};
use tracing::debug;

/// `(p, d, q)(P, D, Q, s)` orders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SarimaxOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaxOrder {
    /// (1,1,1)(1,1,1,24): daily seasonality on hourly data
    pub const DAILY: Self = Self {
        p: 1,
        d: 1,
        q: 1,
        seasonal_p: 1,
        seasonal_d: 1,
        seasonal_q: 1,
        period: 24,
    };

    pub fn param_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Points consumed by differencing
    pub fn diff_lag(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Largest autoregressive lag of the expanded polynomial
    pub fn ar_lag(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }
}

impl std::fmt::Display for SarimaxOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SARIMAX({},{},{})({},{},{},{})",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

const PARAM_BOUND: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct Sarimax {
    order: SarimaxOrder,
    max_iter: usize,
    tol: f64,
}

impl Default for Sarimax {
    fn default() -> Self {
        Self::new(SarimaxOrder::DAILY)
    }
}

impl Sarimax {
    pub fn new(order: SarimaxOrder) -> Self {
        Self {
            order,
            max_iter: 500,
            tol: 1e-6,
        }
    }

    pub fn fit(&self, values: &[f64]) -> ModelResult<FittedSarimax> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteInput);
        }
        let required = self.min_observations();
        if values.len() < required {
            return Err(ModelError::InsufficientData {
                required,
                actual: values.len(),
            });
        }

        let order = self.order;
        let delta = differencing_poly(&order);
        let diffed = apply_differencing(values, &delta);

        let bounds = Bounds {
            lower: -PARAM_BOUND,
            upper: PARAM_BOUND,
        };
        let initial = vec![0.1; order.param_count()];
        let params = nelder_mead(
            |params| {
                let (ar, ma) = lag_polys(&order, params);
                conditional_residuals(&diffed, &ar, &ma).1
            },
            &initial,
            &bounds,
            self.max_iter,
            self.tol,
        );

        let (ar, ma) = lag_polys(&order, &params);
        let (residuals, sse) = conditional_residuals(&diffed, &ar, &ma);
        debug!(order = %order, ?params, sse, "fitted seasonal model");

        Ok(FittedSarimax {
            params,
            ar,
            ma,
            delta,
            history: values.to_vec(),
            diffed,
            residuals,
            sse,
        })
    }
}

impl SeasonalModel for Sarimax {
    fn description(&self) -> String {
        self.order.to_string()
    }

    fn min_observations(&self) -> usize {
        self.order.diff_lag() + self.order.ar_lag() + 2 * self.order.param_count() + 1
    }

    fn fit_predict(&self, values: &[f64], steps: usize) -> ModelResult<Vec<f64>> {
        Ok(self.fit(values)?.forecast(steps))
    }
}

/// A fitted model, ready to forecast past the end of its history
#[derive(Debug, Clone)]
pub struct FittedSarimax {
    params: Vec<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    delta: Vec<f64>,
    history: Vec<f64>,
    diffed: Vec<f64>,
    residuals: Vec<f64>,
    sse: f64,
}

impl FittedSarimax {
    /// `[phi.., theta.., Phi.., Theta..]`
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Forecast `steps` values; future shocks are taken as zero
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let mut w = self.diffed.clone();
        let mut e = self.residuals.clone();
        for _ in 0..steps {
            let t = w.len();
            let next = lagged_sum(&self.ar, &w, t) + lagged_sum(&self.ma, &e, t);
            w.push(next);
            e.push(0.0);
        }

        let offset = self.delta.len() - 1;
        let mut y = self.history.clone();
        for j in self.diffed.len()..w.len() {
            let t = j + offset;
            let carried: f64 = (1..self.delta.len())
                .map(|k| self.delta[k] * y[t - k])
                .sum();
            y.push(w[j] - carried);
        }
        y.split_off(self.history.len())
    }
}

/// `sum_k coeffs[k] * series[t - k]` over lags `k >= 1` that exist
fn lagged_sum(coeffs: &[f64], series: &[f64], t: usize) -> f64 {
    (1..coeffs.len())
        .filter(|k| *k <= t && coeffs[*k] != 0.0)
        .map(|k| coeffs[k] * series[t - k])
        .sum()
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * sum_i coeffs[i] B^(step * (i + 1))`
fn lag_poly(coeffs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Expanded AR and MA lag coefficients for a parameter vector.
///
/// Returned so that `w_t = sum ar[k] w_{t-k} + e_t + sum ma[k] e_{t-k}`.
fn lag_polys(order: &SarimaxOrder, params: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let (phi, rest) = params.split_at(order.p);
    let (theta, rest) = rest.split_at(order.q);
    let (seasonal_phi, seasonal_theta) = rest.split_at(order.seasonal_p);

    let ar_poly = poly_mul(
        &lag_poly(phi, 1, -1.0),
        &lag_poly(seasonal_phi, order.period, -1.0),
    );
    let ma = poly_mul(
        &lag_poly(theta, 1, 1.0),
        &lag_poly(seasonal_theta, order.period, 1.0),
    );
    let ar = ar_poly.iter().map(|c| -c).collect();
    (ar, ma)
}

/// Coefficients of `(1 - B)^d (1 - B^s)^D`
fn differencing_poly(order: &SarimaxOrder) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..order.d {
        poly = poly_mul(&poly, &lag_poly(&[1.0], 1, -1.0));
    }
    for _ in 0..order.seasonal_d {
        poly = poly_mul(&poly, &lag_poly(&[1.0], order.period, -1.0));
    }
    poly
}

fn apply_differencing(values: &[f64], delta: &[f64]) -> Vec<f64> {
    let offset = delta.len() - 1;
    (offset..values.len())
        .map(|t| delta.iter().enumerate().map(|(k, c)| c * values[t - k]).sum())
        .collect()
}

/// Residuals and their sum of squares, conditioning on zero pre-sample
/// shocks. Infinite once the recursion diverges.
fn conditional_residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> (Vec<f64>, f64) {
    let start = ar.len() - 1;
    let mut e = vec![0.0; w.len()];
    let mut sse = 0.0;
    for t in start..w.len() {
        e[t] = w[t] - lagged_sum(ar, w, t) - lagged_sum(ma, &e, t);
        sse += e[t] * e[t];
        if !sse.is_finite() {
            return (e, f64::INFINITY);
        }
    }
    (e, sse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn daily_pattern(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| 100.0 + 0.5 * t as f64 + 20.0 * (2.0 * PI * t as f64 / 24.0).sin())
            .collect()
    }

    #[test]
    fn test_description() {
        assert_eq!(Sarimax::default().description(), "SARIMAX(1,1,1)(1,1,1,24)");
    }

    #[test]
    fn test_differencing_poly() {
        let delta = differencing_poly(&SarimaxOrder::DAILY);
        assert_eq!(delta.len(), 26);
        assert_eq!(delta[0], 1.0);
        assert_eq!(delta[1], -1.0);
        assert_eq!(delta[24], -1.0);
        assert_eq!(delta[25], 1.0);
        assert_eq!(delta.iter().filter(|c| **c != 0.0).count(), 4);
    }

    #[test]
    fn test_lag_polys_expand_seasonal_product() {
        let (ar, ma) = lag_polys(&SarimaxOrder::DAILY, &[0.5, 0.2, 0.3, -0.4]);
        assert_eq!(ar[1], 0.5);
        assert_eq!(ar[24], 0.3);
        assert!((ar[25] + 0.15).abs() < 1e-12);
        assert_eq!(ma[1], 0.2);
        assert_eq!(ma[24], -0.4);
        assert!((ma[25] + 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_continues_trend_plus_daily_cycle() {
        let full = daily_pattern(24 * 10);
        let (train, test) = full.split_at(24 * 9);

        let forecast = Sarimax::default().fit_predict(train, 24).unwrap();
        assert_eq!(forecast.len(), 24);
        for (f, actual) in forecast.iter().zip(test) {
            assert!((f - actual).abs() < 1e-6, "forecast {f} vs actual {actual}");
        }
    }

    #[test]
    fn test_noisy_series_forecast_is_finite() {
        let values: Vec<f64> = daily_pattern(24 * 8)
            .into_iter()
            .enumerate()
            .map(|(t, v)| v + ((t * 37 + 11) % 17) as f64 - 8.0)
            .collect();
        let fitted = Sarimax::default().fit(&values).unwrap();
        assert_eq!(fitted.params().len(), 4);
        assert!(fitted.params().iter().all(|p| p.abs() <= PARAM_BOUND));
        assert!(fitted.sse().is_finite());

        let forecast = fitted.forecast(24);
        assert_eq!(forecast.len(), 24);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_insufficient_data() {
        let model = Sarimax::default();
        let err = model.fit(&daily_pattern(30)).unwrap_err();
        assert_eq!(
            err,
            ModelError::InsufficientData {
                required: model.min_observations(),
                actual: 30
            }
        );
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut values = daily_pattern(100);
        values[50] = f64::NAN;
        assert_eq!(
            Sarimax::default().fit(&values).unwrap_err(),
            ModelError::NonFiniteInput
        );
    }
}
