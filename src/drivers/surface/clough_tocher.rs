//! Piecewise cubic, C1-continuous interpolation over a Delaunay triangulation.
//!
//! Each triangle is split at its centroid into three cubic Bézier patches.
//! Vertex gradients come from a global curvature-minimizing estimate, and the
//! cross-boundary derivative along every edge is made linear so neighbouring
//! triangles join smoothly.
use log::warn;
use super::delaunay::Triangulation;
use super::InterpolationError;
const GRADIENT_TOLERANCE: f64 = 1e-6;
const GRADIENT_MAX_ITER: usize = 400;
const EPS: f64 = 100.0 * f64::EPSILON;
/// Bézier ordinates `c[i][j][k][l]` with `i + j + k + l == 3`; the first three
/// indices belong to the triangle vertices, the last to the centroid.
type Ordinates = [[[[f64; 4]; 4]; 4]; 4];
pub(crate) struct CloughTocher {
    tri: Triangulation,
    values: Vec<f64>,
    gradients: Vec<[f64; 2]>,
    /// `[x_min, y_min, x_max, y_max]` of the sites.
    bounds: [f64; 4],
}
impl CloughTocher {
    pub fn new(sites: &[[f64; 2]], values: &[f64]) -> Result<Self, InterpolationError> {
        let tri = Triangulation::build(sites)?;
        if tri.len() == 0 {
            return Err(InterpolationError::Collinear);
        }
        let gradients = estimate_gradients(&tri, values)?;
        Ok(Self {
            bounds: site_bounds(sites),
            tri,
            values: values.to_vec(),
            gradients,
        })
    }
    /// Interpolated value at `p`, `None` outside the convex hull.
    ///
    /// `hint` is the triangle the previous lookup ended in; scanning a grid
    /// row by row keeps the walk short.
    pub fn evaluate(&self, p: [f64; 2], hint: &mut usize) -> Option<f64> {
        let (t, b) = self.locate(p, hint)?;
        Some(self.evaluate_in(t, b))
    }
    fn locate(&self, p: [f64; 2], hint: &mut usize) -> Option<(usize, [f64; 3])> {
        let mut steps = 0;
        self.locate_counted(p, hint, &mut steps)
    }
    /// Directed walk from `hint`. Leaving through a hull edge means `p` is
    /// outside (the hull is convex), so only a degenerate triangle or the
    /// step cap falls back to scanning every triangle. `steps` counts the
    /// barycentric evaluations.
    fn locate_counted(
        &self,
        p: [f64; 2],
        hint: &mut usize,
        steps: &mut usize,
    ) -> Option<(usize, [f64; 3])> {
        if !self.in_bounds(p) {
            return None;
        }
        let count = self.tri.len();
        let mut t = (*hint).min(count - 1);
        for _ in 0..=count {
            *steps += 1;
            let Some(b) = self.tri.barycentric(t, p) else {
                break;
            };
            if b.iter().all(|&v| v >= -EPS) {
                *hint = t;
                return Some((t, b));
            }
            let k = (0..3)
                .min_by(|&i, &j| b[i].total_cmp(&b[j]))
                .unwrap_or(0);
            match self.tri.neighbor(t, k) {
                Some(next) => t = next,
                None if b[k] >= -EPS.sqrt() => {
                    *hint = t;
                    return Some((t, b));
                }
                None => {
                    *hint = t;
                    return None;
                }
            }
        }
        for eps in [EPS, EPS.sqrt()] {
            for t in 0..count {
                *steps += 1;
                if let Some(b) = self.tri.barycentric(t, p) {
                    if b.iter().all(|&v| v >= -eps) {
                        *hint = t;
                        return Some((t, b));
                    }
                }
            }
        }
        None
    }
    fn in_bounds(&self, p: [f64; 2]) -> bool {
        let [x_min, y_min, x_max, y_max] = self.bounds;
        let slack_x = (x_max - x_min) * EPS.sqrt();
        let slack_y = (y_max - y_min) * EPS.sqrt();
        p[0] >= x_min - slack_x
            && p[0] <= x_max + slack_x
            && p[1] >= y_min - slack_y
            && p[1] <= y_max + slack_y
    }
    fn evaluate_in(&self, t: usize, b: [f64; 3]) -> f64 {
        let c = self.ordinates(t);
        let min = b[0].min(b[1]).min(b[2]);
        let e = [b[0] - min, b[1] - min, b[2] - min, 3.0 * min];
        let mut w = 0.0;
        for i in 0..=3 {
            for j in 0..=(3 - i) {
                for k in 0..=(3 - i - j) {
                    let l = 3 - i - j - k;
                    let term = c[i][j][k][l];
                    if term == 0.0 {
                        continue;
                    }
                    w += multinomial(i, j, k, l)
                        * e[0].powi(i as i32)
                        * e[1].powi(j as i32)
                        * e[2].powi(k as i32)
                        * e[3].powi(l as i32)
                        * term;
                }
            }
        }
        w
    }
    fn ordinates(&self, t: usize) -> Ordinates {
        let [v1, v2, v3] = self.tri.vertices(t);
        let [p1, p2, p3] = self.tri.corners(t);
        let (f1, f2, f3) = (self.values[v1], self.values[v2], self.values[v3]);
        let (g1, g2, g3) = (self.gradients[v1], self.gradients[v2], self.gradients[v3]);
        let e12 = [p2[0] - p1[0], p2[1] - p1[1]];
        let e23 = [p3[0] - p2[0], p3[1] - p2[1]];
        let e31 = [p1[0] - p3[0], p1[1] - p3[1]];
        let df12 = dot(g1, e12);
        let df21 = -dot(g2, e12);
        let df23 = dot(g2, e23);
        let df32 = -dot(g3, e23);
        let df31 = dot(g3, e31);
        let df13 = -dot(g1, e31);
        let mut c: Ordinates = [[[[0.0; 4]; 4]; 4]; 4];
        c[3][0][0][0] = f1;
        c[0][3][0][0] = f2;
        c[0][0][3][0] = f3;
        c[2][1][0][0] = (df12 + 3.0 * f1) / 3.0;
        c[2][0][1][0] = (df13 + 3.0 * f1) / 3.0;
        c[1][2][0][0] = (df21 + 3.0 * f2) / 3.0;
        c[0][2][1][0] = (df23 + 3.0 * f2) / 3.0;
        c[1][0][2][0] = (df31 + 3.0 * f3) / 3.0;
        c[0][1][2][0] = (df32 + 3.0 * f3) / 3.0;
        c[2][0][0][1] = (c[2][1][0][0] + c[2][0][1][0] + f1) / 3.0;
        c[0][2][0][1] = (c[1][2][0][0] + f2 + c[0][2][1][0]) / 3.0;
        c[0][0][2][1] = (c[1][0][2][0] + c[0][1][2][0] + f3) / 3.0;
        let g = self.edge_directions(t);
        c[0][1][1][1] = (g[0]
            * (-f2 + 3.0 * c[0][2][1][0] - 3.0 * c[0][1][2][0] + f3)
            + (-f2 + 2.0 * c[0][2][1][0] - c[0][1][2][0] + c[0][0][2][1] + c[0][2][0][1]))
            / 2.0;
        c[1][0][1][1] = (g[1]
            * (-f3 + 3.0 * c[1][0][2][0] - 3.0 * c[2][0][1][0] + f1)
            + (-f3 + 2.0 * c[1][0][2][0] - c[2][0][1][0] + c[2][0][0][1] + c[0][0][2][1]))
            / 2.0;
        c[1][1][0][1] = (g[2]
            * (-f1 + 3.0 * c[2][1][0][0] - 3.0 * c[1][2][0][0] + f2)
            + (-f1 + 2.0 * c[2][1][0][0] - c[1][2][0][0] + c[2][0][0][1] + c[0][2][0][1]))
            / 2.0;
        c[1][0][0][2] = (c[1][1][0][1] + c[1][0][1][1] + c[2][0][0][1]) / 3.0;
        c[0][1][0][2] = (c[1][1][0][1] + c[0][1][1][1] + c[0][2][0][1]) / 3.0;
        c[0][0][1][2] = (c[1][0][1][1] + c[0][1][1][1] + c[0][0][2][1]) / 3.0;
        c[0][0][0][3] = (c[1][0][0][2] + c[0][1][0][2] + c[0][0][1][2]) / 3.0;
        c
    }
    /// Per-edge direction weights. The direction for the edge opposite vertex
    /// `k` points from this centroid to the neighbour's centroid, expressed in
    /// barycentric terms so the patch stays affine invariant. Hull edges use
    /// the direction towards the opposite vertex.
    fn edge_directions(&self, t: usize) -> [f64; 3] {
        let mut g = [-0.5; 3];
        for (k, slot) in g.iter_mut().enumerate() {
            let Some(n) = self.tri.neighbor(t, k) else {
                continue;
            };
            let [a, b, c] = self.tri.corners(n);
            let centroid = [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0];
            let Some(y) = self.tri.barycentric(t, centroid) else {
                continue;
            };
            let (num, den) = match k {
                0 => (2.0 * y[2] + y[1] - 1.0, 2.0 - 3.0 * y[2] - 3.0 * y[1]),
                1 => (2.0 * y[0] + y[2] - 1.0, 2.0 - 3.0 * y[0] - 3.0 * y[2]),
                _ => (2.0 * y[1] + y[0] - 1.0, 2.0 - 3.0 * y[1] - 3.0 * y[0]),
            };
            let weight = num / den;
            if weight.is_finite() {
                *slot = weight;
            }
        }
        g
    }
}
fn site_bounds(sites: &[[f64; 2]]) -> [f64; 4] {
    sites.iter().fold(
        [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
        |[x0, y0, x1, y1], p| [x0.min(p[0]), y0.min(p[1]), x1.max(p[0]), y1.max(p[1])],
    )
}
fn dot(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}
fn multinomial(i: usize, j: usize, k: usize, l: usize) -> f64 {
    const FACTORIAL: [f64; 4] = [1.0, 1.0, 2.0, 6.0];
    6.0 / (FACTORIAL[i] * FACTORIAL[j] * FACTORIAL[k] * FACTORIAL[l])
}
/// Gauss-Seidel sweep over the vertices minimizing the curvature of the
/// piecewise cubic along every triangulation edge.
///
/// Sites the triangulation skipped (no incident edges) keep a zero gradient.
/// Stopping at the iteration cap is logged but not fatal.
pub(crate) fn estimate_gradients(
    tri: &Triangulation,
    values: &[f64],
) -> Result<Vec<[f64; 2]>, InterpolationError> {
    let adjacency = tri.vertex_neighbors();
    let points = &tri.points;
    let mut grad = vec![[0.0f64; 2]; points.len()];
    for _ in 0..GRADIENT_MAX_ITER {
        let mut err = 0.0f64;
        for (ipoint, neighbors) in adjacency.iter().enumerate() {
            if neighbors.is_empty() {
                continue;
            }
            let mut q = [0.0f64; 3];
            let mut s = [0.0f64; 2];
            for &jpoint in neighbors {
                let ex = points[jpoint][0] - points[ipoint][0];
                let ey = points[jpoint][1] - points[ipoint][1];
                let len = (ex * ex + ey * ey).sqrt();
                let l3 = len * len * len;
                let df = values[ipoint] - values[jpoint];
                let df2 = -ex * grad[jpoint][0] - ey * grad[jpoint][1];
                q[0] += 4.0 * ex * ex / l3;
                q[1] += 4.0 * ex * ey / l3;
                q[2] += 4.0 * ey * ey / l3;
                s[0] += (6.0 * df - 2.0 * df2) * ex / l3;
                s[1] += (6.0 * df - 2.0 * df2) * ey / l3;
            }
            let det = q[0] * q[2] - q[1] * q[1];
            if det == 0.0 || !det.is_finite() {
                return Err(InterpolationError::SingularGradient(ipoint));
            }
            let r0 = (q[2] * s[0] - q[1] * s[1]) / det;
            let r1 = (-q[1] * s[0] + q[0] * s[1]) / det;
            let change = (grad[ipoint][0] + r0).abs().max((grad[ipoint][1] + r1).abs());
            grad[ipoint] = [-r0, -r1];
            err = err.max(change / 1.0f64.max(r0.abs()).max(r1.abs()));
        }
        if err < GRADIENT_TOLERANCE {
            return Ok(grad);
        }
    }
    warn!("gradient estimate stopped after {GRADIENT_MAX_ITER} sweeps without converging");
    Ok(grad)
}
#[cfg(test)]
mod tests {
    use super::*;
    fn grid_sites(n: usize) -> Vec<[f64; 2]> {
        let mut sites = Vec::new();
        for i in 0..n {
            for j in 0..n {
                sites.push([i as f64 / (n - 1) as f64, j as f64 / (n - 1) as f64]);
            }
        }
        sites
    }
    #[test]
    fn gradients_of_a_plane_are_exact() {
        let sites = grid_sites(6);
        let values: Vec<f64> = sites.iter().map(|p| 2.0 * p[0] - 3.0 * p[1] + 1.0).collect();
        let tri = Triangulation::build(&sites).unwrap();
        let grad = estimate_gradients(&tri, &values).unwrap();
        for g in grad {
            assert!((g[0] - 2.0).abs() < 1e-4);
            assert!((g[1] + 3.0).abs() < 1e-4);
        }
    }
    #[test]
    fn reproduces_sites_exactly() {
        let sites = vec![[0.0, 0.0], [1.0, 0.2], [0.3, 1.1], [1.2, 1.3], [0.6, 0.5]];
        let values = vec![1.0, -2.0, 0.5, 3.0, 0.0];
        let ct = CloughTocher::new(&sites, &values).unwrap();
        let mut hint = 0;
        for (site, value) in sites.iter().zip(&values) {
            let z = ct.evaluate(*site, &mut hint).unwrap();
            assert!((z - value).abs() < 1e-9);
        }
    }
    #[test]
    fn quadratic_is_reproduced_with_exact_gradients() {
        let sites = grid_sites(5);
        let f = |p: [f64; 2]| p[0] * p[0] + 0.5 * p[0] * p[1] - p[1];
        let values: Vec<f64> = sites.iter().map(|p| f(*p)).collect();
        let tri = Triangulation::build(&sites).unwrap();
        let gradients = sites
            .iter()
            .map(|p| [2.0 * p[0] + 0.5 * p[1], 0.5 * p[0] - 1.0])
            .collect();
        let ct = CloughTocher {
            bounds: site_bounds(&sites),
            tri,
            values,
            gradients,
        };
        let mut hint = 0;
        for p in [[0.13, 0.77], [0.5, 0.5], [0.91, 0.07], [0.33, 0.41]] {
            let z = ct.evaluate(p, &mut hint).unwrap();
            assert!((z - f(p)).abs() < 1e-9, "at {p:?}: {z} vs {}", f(p));
        }
    }
    #[test]
    fn outside_the_hull_is_undefined() {
        let sites = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.2, 0.2]];
        let ct = CloughTocher::new(&sites, &[0.0, 1.0, 2.0, 0.5]).unwrap();
        let mut hint = 0;
        assert!(ct.evaluate([0.9, 0.9], &mut hint).is_none());
        assert!(ct.evaluate([0.1, 0.1], &mut hint).is_some());
    }
    #[test]
    fn outside_nodes_do_not_scan_every_triangle() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(11);
        let sites: Vec<[f64; 2]> = (0..4000)
            .map(|_| {
                let r: f64 = rng.gen_range(0.0f64..1.0).sqrt();
                let a: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
                [r * a.cos(), r * a.sin()]
            })
            .collect();
        let values: Vec<f64> = sites.iter().map(|p| p[0] - 0.5 * p[1]).collect();
        let ct = CloughTocher::new(&sites, &values).unwrap();
        let n = 60;
        let (mut hint, mut steps, mut outside) = (0, 0, 0);
        for row in 0..n {
            for col in 0..n {
                let x = -1.0 + 2.0 * col as f64 / (n - 1) as f64;
                let y = -1.0 + 2.0 * row as f64 / (n - 1) as f64;
                if ct.locate_counted([x, y], &mut hint, &mut steps).is_none() {
                    outside += 1;
                }
            }
        }
        // the disk leaves every grid corner outside the hull
        assert!(outside > 4 * 40);
        // a full scan per outside node would cost 2 * triangles each
        assert!(steps < 200_000, "{steps} barycentric evaluations");
        let mut hint = 0;
        assert!(ct.evaluate([0.0, 0.0], &mut hint).is_some());
        assert!(ct.evaluate([0.99, 0.99], &mut hint).is_none());
    }
}
