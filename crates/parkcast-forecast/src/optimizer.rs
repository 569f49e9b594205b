//! Box-bounded Nelder-Mead minimizer

use std::cmp::Ordering;

pub(crate) struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    fn clamp(&self, point: &mut [f64]) {
        for v in point.iter_mut() {
            *v = v.clamp(self.lower, self.upper);
        }
    }
}

/// Minimize `f` from `initial`, staying inside `bounds` on every axis.
///
/// Non-finite objective values rank worst, so the search backs away from
/// regions where the objective blows up.
pub(crate) fn nelder_mead<F>(
    f: F,
    initial: &[f64],
    bounds: &Bounds,
    max_iter: usize,
    tol: f64,
) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let objective = |p: &[f64]| {
        let v = f(p);
        if v.is_finite() {
            v
        } else {
            f64::MAX
        }
    };

    let dim = initial.len();
    let step = (bounds.upper - bounds.lower) * 0.05;

    let mut start = initial.to_vec();
    bounds.clamp(&mut start);
    let mut simplex = vec![start.clone()];
    for i in 0..dim {
        let mut vertex = start.clone();
        vertex[i] = if vertex[i] + step <= bounds.upper {
            vertex[i] + step
        } else {
            vertex[i] - step
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|p| objective(p)).collect();

    for _ in 0..max_iter {
        let mut order: Vec<usize> = (0..simplex.len()).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let best = order[0];
        let worst = order[dim];
        let second_worst = order[dim - 1];

        let spread = simplex[best]
            .iter()
            .zip(&simplex[worst])
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        if spread < tol {
            break;
        }

        let mut centroid = vec![0.0; dim];
        for &idx in &order[..dim] {
            for (c, v) in centroid.iter_mut().zip(&simplex[idx]) {
                *c += v / dim as f64;
            }
        }
        let toward = |from: &[f64], t: f64| -> Vec<f64> {
            let mut p: Vec<f64> = centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + t * (x - c))
                .collect();
            bounds.clamp(&mut p);
            p
        };

        let reflected = toward(&simplex[worst], -1.0);
        let f_reflected = objective(&reflected);

        if f_reflected < values[best] {
            let expanded = toward(&simplex[worst], -2.0);
            let f_expanded = objective(&expanded);
            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            }
            continue;
        }
        if f_reflected < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = f_reflected;
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < values[worst] {
            let p = toward(&reflected, 0.5);
            let fp = objective(&p);
            (p, fp)
        } else {
            let p = toward(&simplex[worst], 0.5);
            let fp = objective(&p);
            (p, fp)
        };
        if f_contracted < values[worst].min(f_reflected) {
            simplex[worst] = contracted;
            values[worst] = f_contracted;
            continue;
        }

        // Shrink toward the best vertex
        let anchor = simplex[best].clone();
        for &idx in &order[1..] {
            for (v, a) in simplex[idx].iter_mut().zip(&anchor) {
                *v = a + 0.5 * (*v - a);
            }
            values[idx] = objective(&simplex[idx]);
        }
    }

    let best = (0..simplex.len())
        .min_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal))
        .unwrap_or(0);
    simplex.swap_remove(best)
}
