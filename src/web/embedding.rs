// Embedding comparison and 2-D projection for the embedding endpoints.
//
// The projection is a two-component PCA fitted with power iteration, enough
// to scatter-plot example embeddings without pulling in a linear algebra
// stack.

const POWER_ITERATIONS: usize = 60;

/// Cosine similarity between two embeddings. Zero-norm inputs score 0.0
/// rather than NaN so example lists with degenerate embeddings stay sortable.
pub fn calculate_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A fitted 2-D projection: the training mean plus two principal axes.
#[derive(Clone, Debug)]
pub struct Projection {
    mean: Vec<f64>,
    axes: [Vec<f64>; 2],
}

impl Projection {
    /// Fit a projection to `samples` and return it together with the
    /// projected training set. Returns `None` when there is nothing to fit
    /// (no samples, or empty vectors).
    pub fn fit(samples: &[Vec<f64>]) -> Option<(Projection, Vec<[f64; 2]>)> {
        let dim = samples.first()?.len();
        if dim == 0 || samples.iter().any(|s| s.len() != dim) {
            return None;
        }

        let n = samples.len() as f64;
        let mut mean = vec![0.0; dim];
        for sample in samples {
            for (m, v) in mean.iter_mut().zip(sample) {
                *m += v / n;
            }
        }

        let centered: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| s.iter().zip(&mean).map(|(v, m)| v - m).collect())
            .collect();

        let first = principal_axis(&centered, None, dim);
        let second = principal_axis(&centered, Some(&first), dim);
        let projection = Projection {
            mean,
            axes: [first, second],
        };

        let projected = samples.iter().map(|s| projection.transform(s)).collect();
        Some((projection, projected))
    }

    /// Project a new embedding into the fitted 2-D space. Dimension
    /// mismatches project only the overlapping prefix.
    pub fn transform(&self, sample: &[f64]) -> [f64; 2] {
        let centered: Vec<f64> = sample
            .iter()
            .zip(&self.mean)
            .map(|(v, m)| v - m)
            .collect();
        [dot(&centered, &self.axes[0]), dot(&centered, &self.axes[1])]
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Power iteration on the (implicit) covariance of `centered`, deflating the
/// component along `deflate` when computing the second axis.
fn principal_axis(centered: &[Vec<f64>], deflate: Option<&Vec<f64>>, dim: usize) -> Vec<f64> {
    // Deterministic non-degenerate start vector
    let mut axis: Vec<f64> = (0..dim).map(|i| 1.0 / (i as f64 + 1.0)).collect();
    if let Some(prev) = deflate {
        remove_component(&mut axis, prev);
    }

    for _ in 0..POWER_ITERATIONS {
        let mut next = vec![0.0; dim];
        for row in centered {
            let scale = dot(row, &axis);
            for (n, v) in next.iter_mut().zip(row) {
                *n += scale * v;
            }
        }
        if let Some(prev) = deflate {
            remove_component(&mut next, prev);
        }
        let norm = dot(&next, &next).sqrt();
        if norm < 1e-12 {
            // No variance along any remaining direction; keep the previous
            // (normalized) axis so transform stays well defined.
            break;
        }
        for v in &mut next {
            *v /= norm;
        }
        axis = next;
    }

    let norm = dot(&axis, &axis).sqrt();
    if norm > 1e-12 {
        for v in &mut axis {
            *v /= norm;
        }
    }
    axis
}

fn remove_component(v: &mut [f64], direction: &[f64]) {
    let scale = dot(v, direction);
    for (x, d) in v.iter_mut().zip(direction) {
        *x -= scale * d;
    }
}
