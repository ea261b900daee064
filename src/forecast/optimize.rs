//! Derivative-free minimization used for coefficient estimation.

/// Tuning knobs for the downhill simplex search.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Reflection coefficient.
    pub reflection: f64,
    /// Expansion coefficient.
    pub expansion: f64,
    /// Contraction coefficient.
    pub contraction: f64,
    /// Shrink coefficient.
    pub shrink: f64,
    /// Relative step used to seed the initial simplex.
    pub initial_step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Where the search ended up.
#[derive(Debug, Clone)]
pub struct SimplexOutcome {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `objective` with the Nelder-Mead simplex, keeping every probe
/// inside the per-dimension `bounds` when given.
pub fn minimize<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    options: SimplexOptions,
) -> SimplexOutcome
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return SimplexOutcome {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial.to_vec(), bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            options.initial_step * initial[i].abs()
        } else {
            options.initial_step
        };
        vertex[i] += step;
        simplex.push(clamp(vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst] - values[best] < options.tolerance {
            converged = true;
            break;
        }

        // Centroid of every vertex except the worst.
        let mut centroid = vec![0.0; n];
        for (i, vertex) in simplex.iter().enumerate() {
            if i == worst {
                continue;
            }
            for (c, &x) in centroid.iter_mut().zip(vertex) {
                *c += x / n as f64;
            }
        }

        let reflected = clamp(
            blend(&centroid, &simplex[worst], 1.0 + options.reflection, -options.reflection),
            bounds,
        );
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            let expanded = clamp(
                blend(&centroid, &reflected, 1.0 - options.expansion, options.expansion),
                bounds,
            );
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction toward the better of the reflected and worst points.
        let anchor = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = clamp(
            blend(&centroid, anchor, 1.0 - options.contraction, options.contraction),
            bounds,
        );
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink everything toward the best vertex.
        let best_vertex = simplex[best].clone();
        for (i, vertex) in simplex.iter_mut().enumerate() {
            if i == best {
                continue;
            }
            let shrunk = blend(&best_vertex, vertex, 1.0 - options.shrink, options.shrink);
            *vertex = clamp(shrunk, bounds);
            values[i] = objective(vertex);
        }
    }

    let mut best = 0;
    for i in 1..=n {
        if values[i] < values[best] {
            best = i;
        }
    }

    SimplexOutcome {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// `wa * a + wb * b`, elementwise.
fn blend(a: &[f64], b: &[f64], wa: f64, wb: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| wa * x + wb * y).collect()
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_quadratic_minimum() {
        let outcome = minimize(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            SimplexOptions::default(),
        );
        assert!(outcome.converged);
        assert!((outcome.point[0] - 2.0).abs() < 0.01);
        assert!((outcome.point[1] - 3.0).abs() < 0.01);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained minimum at x = 5, bound caps it at 1.
        let outcome = minimize(
            |x| (x[0] - 5.0).powi(2),
            &[0.0],
            Some(&[(-1.0, 1.0)]),
            SimplexOptions::default(),
        );
        assert!(outcome.point[0] <= 1.0 + 1e-12);
        assert!((outcome.point[0] - 1.0).abs() < 0.05);
    }

    #[test]
    fn empty_input_does_not_converge() {
        let outcome = minimize(|_| 0.0, &[], None, SimplexOptions::default());
        assert!(!outcome.converged);
        assert!(outcome.point.is_empty());
    }

    #[test]
    fn handles_rosenbrock() {
        let options = SimplexOptions {
            max_iterations: 5000,
            ..Default::default()
        };
        let outcome = minimize(
            |x| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2),
            &[-1.2, 1.0],
            None,
            options,
        );
        assert!(outcome.value < 1e-3);
    }
}
