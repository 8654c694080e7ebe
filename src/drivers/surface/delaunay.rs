//! Sweep-hull Delaunay triangulation of planar sites.
//!
//! Sites are inserted in order of distance from the circumcenter of a seed
//! triangle; each new site is connected to the visible part of the current
//! convex hull and the new edges are legalized by flipping. Triangles are
//! stored counter-clockwise as vertex triples; `halfedges[e]` is the twin of
//! half-edge `e` (which runs from `triangles[e]` to the next vertex of its
//! triangle) or [`EMPTY`] on the hull.
use super::InterpolationError;
pub(crate) const EMPTY: usize = usize::MAX;
#[derive(Clone, Debug)]
pub(crate) struct Triangulation {
    pub points: Vec<[f64; 2]>,
    pub triangles: Vec<usize>,
    pub halfedges: Vec<usize>,
}
impl Triangulation {
    pub fn build(points: &[[f64; 2]]) -> Result<Self, InterpolationError> {
        if points.len() < 3 {
            return Err(InterpolationError::TooFewSites(points.len()));
        }
        let mut sweep = Sweep::new(points);
        sweep.run()?;
        Ok(Triangulation {
            points: points.to_vec(),
            triangles: sweep.triangles,
            halfedges: sweep.halfedges,
        })
    }
    pub fn len(&self) -> usize {
        self.triangles.len() / 3
    }
    pub fn vertices(&self, t: usize) -> [usize; 3] {
        [
            self.triangles[3 * t],
            self.triangles[3 * t + 1],
            self.triangles[3 * t + 2],
        ]
    }
    pub fn corners(&self, t: usize) -> [[f64; 2]; 3] {
        self.vertices(t).map(|v| self.points[v])
    }
    /// Triangle across the edge opposite local vertex `k`.
    pub fn neighbor(&self, t: usize, k: usize) -> Option<usize> {
        let twin = self.halfedges[3 * t + (k + 1) % 3];
        (twin != EMPTY).then_some(twin / 3)
    }
    /// Sorted, de-duplicated vertex adjacency of every site.
    pub fn vertex_neighbors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.points.len()];
        for tri in self.triangles.chunks_exact(3) {
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }
        adjacency
    }
    /// Barycentric coordinates of `p` in triangle `t`; `None` for a zero-area triangle.
    pub fn barycentric(&self, t: usize, p: [f64; 2]) -> Option<[f64; 3]> {
        let [a, b, c] = self.corners(t);
        let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let l0 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
        let l1 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
        Some([l0, l1, 1.0 - l0 - l1])
    }
}
struct Sweep<'a> {
    points: &'a [[f64; 2]],
    triangles: Vec<usize>,
    halfedges: Vec<usize>,
    hull_prev: Vec<usize>,
    hull_next: Vec<usize>,
    hull_tri: Vec<usize>,
    hull_hash: Vec<usize>,
    hull_start: usize,
    center: [f64; 2],
    edge_stack: Vec<usize>,
}
impl<'a> Sweep<'a> {
    fn new(points: &'a [[f64; 2]]) -> Self {
        let n = points.len();
        let max_triangles = 2 * n - 5;
        let hash_size = (n as f64).sqrt().ceil() as usize;
        Self {
            points,
            triangles: Vec::with_capacity(max_triangles * 3),
            halfedges: Vec::with_capacity(max_triangles * 3),
            hull_prev: vec![EMPTY; n],
            hull_next: vec![EMPTY; n],
            hull_tri: vec![EMPTY; n],
            hull_hash: vec![EMPTY; hash_size.max(1)],
            hull_start: 0,
            center: [0.0, 0.0],
            edge_stack: Vec::new(),
        }
    }
    fn run(&mut self) -> Result<(), InterpolationError> {
        let points = self.points;
        let (i0, i1, i2) = seed_triangle(points)?;
        let (i1, i2) = if cross(points[i0], points[i1], points[i2]) < 0.0 {
            (i2, i1)
        } else {
            (i1, i2)
        };
        self.center = circumcenter(points[i0], points[i1], points[i2]);
        let distances: Vec<f64> = points.iter().map(|p| dist2(*p, self.center)).collect();
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));
        self.hull_start = i0;
        self.hull_next[i0] = i1;
        self.hull_prev[i2] = i1;
        self.hull_next[i1] = i2;
        self.hull_prev[i0] = i2;
        self.hull_next[i2] = i0;
        self.hull_prev[i1] = i0;
        self.hull_tri[i0] = 0;
        self.hull_tri[i1] = 1;
        self.hull_tri[i2] = 2;
        for i in [i0, i1, i2] {
            let key = self.hash_key(points[i]);
            self.hull_hash[key] = i;
        }
        self.add_triangle(i0, i1, i2, EMPTY, EMPTY, EMPTY);
        let mut previous: Option<[f64; 2]> = None;
        for &i in &order {
            let p = points[i];
            if let Some(prev) = previous {
                if (p[0] - prev[0]).abs() <= f64::EPSILON && (p[1] - prev[1]).abs() <= f64::EPSILON
                {
                    continue;
                }
            }
            previous = Some(p);
            if i == i0 || i == i1 || i == i2 {
                continue;
            }
            self.insert(i, p);
        }
        Ok(())
    }
    fn insert(&mut self, i: usize, p: [f64; 2]) {
        let points = self.points;
        let key = self.hash_key(p);
        let size = self.hull_hash.len();
        let mut start = self.hull_start;
        for j in 0..size {
            let candidate = self.hull_hash[(key + j) % size];
            if candidate != EMPTY && candidate != self.hull_next[candidate] {
                start = candidate;
                break;
            }
        }
        start = self.hull_prev[start];
        let mut e = start;
        loop {
            let q = self.hull_next[e];
            if visible(p, points[e], points[q]) {
                break;
            }
            e = q;
            if e == start {
                // on the hull within rounding; nothing to connect to
                return;
            }
        }
        let t = self.add_triangle(e, i, self.hull_next[e], EMPTY, EMPTY, self.hull_tri[e]);
        self.hull_tri[i] = self.legalize(t + 2);
        self.hull_tri[e] = t;
        let mut n = self.hull_next[e];
        loop {
            let q = self.hull_next[n];
            if !visible(p, points[n], points[q]) {
                break;
            }
            let t = self.add_triangle(n, i, q, self.hull_tri[i], EMPTY, self.hull_tri[n]);
            self.hull_tri[i] = self.legalize(t + 2);
            self.hull_next[n] = n;
            n = q;
        }
        if e == start {
            loop {
                let q = self.hull_prev[e];
                if !visible(p, points[q], points[e]) {
                    break;
                }
                let t = self.add_triangle(q, i, e, EMPTY, self.hull_tri[e], self.hull_tri[q]);
                self.legalize(t + 2);
                self.hull_tri[q] = t;
                self.hull_next[e] = e;
                e = q;
            }
        }
        self.hull_start = e;
        self.hull_prev[i] = e;
        self.hull_next[e] = i;
        self.hull_prev[n] = i;
        self.hull_next[i] = n;
        let key_i = self.hash_key(p);
        self.hull_hash[key_i] = i;
        let key_e = self.hash_key(points[e]);
        self.hull_hash[key_e] = e;
    }
    fn legalize(&mut self, mut a: usize) -> usize {
        let points = self.points;
        let mut ar;
        loop {
            let b = self.halfedges[a];
            let a0 = a - a % 3;
            ar = a0 + (a + 2) % 3;
            if b == EMPTY {
                match self.edge_stack.pop() {
                    Some(next) => {
                        a = next;
                        continue;
                    }
                    None => break,
                }
            }
            let b0 = b - b % 3;
            let al = a0 + (a + 1) % 3;
            let bl = b0 + (b + 2) % 3;
            let p0 = self.triangles[ar];
            let pr = self.triangles[a];
            let pl = self.triangles[al];
            let p1 = self.triangles[bl];
            if in_circle(points[p0], points[pr], points[pl], points[p1]) {
                self.triangles[a] = p1;
                self.triangles[b] = p0;
                let hbl = self.halfedges[bl];
                if hbl == EMPTY {
                    let mut e = self.hull_start;
                    loop {
                        if self.hull_tri[e] == bl {
                            self.hull_tri[e] = a;
                            break;
                        }
                        e = self.hull_prev[e];
                        if e == self.hull_start {
                            break;
                        }
                    }
                }
                self.link(a, hbl);
                let har = self.halfedges[ar];
                self.link(b, har);
                self.link(ar, bl);
                self.edge_stack.push(b0 + (b + 1) % 3);
            } else {
                match self.edge_stack.pop() {
                    Some(next) => a = next,
                    None => break,
                }
            }
        }
        ar
    }
    fn add_triangle(&mut self, i0: usize, i1: usize, i2: usize, a: usize, b: usize, c: usize) -> usize {
        let t = self.triangles.len();
        self.triangles.extend_from_slice(&[i0, i1, i2]);
        self.halfedges.extend_from_slice(&[EMPTY, EMPTY, EMPTY]);
        self.link(t, a);
        self.link(t + 1, b);
        self.link(t + 2, c);
        t
    }
    fn link(&mut self, a: usize, b: usize) {
        self.halfedges[a] = b;
        if b != EMPTY {
            self.halfedges[b] = a;
        }
    }
    fn hash_key(&self, p: [f64; 2]) -> usize {
        let size = self.hull_hash.len();
        let angle = pseudo_angle(p[0] - self.center[0], p[1] - self.center[1]);
        ((angle * size as f64).floor() as usize) % size
    }
}
/// Seed: site nearest the bounding-box center, its nearest neighbour, and the
/// third site giving the smallest circumcircle.
fn seed_triangle(points: &[[f64; 2]]) -> Result<(usize, usize, usize), InterpolationError> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p[0]);
        min_y = min_y.min(p[1]);
        max_x = max_x.max(p[0]);
        max_y = max_y.max(p[1]);
    }
    let bbox_center = [(min_x + max_x) / 2.0, (min_y + max_y) / 2.0];
    let i0 = nearest(points, bbox_center, |_| true).ok_or(InterpolationError::Collinear)?;
    let i1 = nearest(points, points[i0], |i| i != i0 && dist2(points[i], points[i0]) > 0.0)
        .ok_or(InterpolationError::Collinear)?;
    let mut best = None;
    let mut min_radius = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        if i == i0 || i == i1 {
            continue;
        }
        let r = circumradius2(points[i0], points[i1], *p);
        if r < min_radius {
            min_radius = r;
            best = Some(i);
        }
    }
    let i2 = best.ok_or(InterpolationError::Collinear)?;
    Ok((i0, i1, i2))
}
fn nearest(points: &[[f64; 2]], target: [f64; 2], keep: impl Fn(usize) -> bool) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| keep(*i))
        .min_by(|(_, a), (_, b)| dist2(**a, target).total_cmp(&dist2(**b, target)))
        .map(|(i, _)| i)
}
fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
/// Twice the signed area of (p, q, r); positive when counter-clockwise.
fn cross(p: [f64; 2], q: [f64; 2], r: [f64; 2]) -> f64 {
    (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
}
/// Whether `p` lies strictly outside the counter-clockwise hull edge `e -> q`.
fn visible(p: [f64; 2], e: [f64; 2], q: [f64; 2]) -> bool {
    cross(e, q, p) < 0.0
}
fn circumradius2(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    let [x, y] = circumcenter_offset(a, b, c);
    let r = x * x + y * y;
    if r.is_finite() {
        r
    } else {
        f64::INFINITY
    }
}
fn circumcenter(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> [f64; 2] {
    let [x, y] = circumcenter_offset(a, b, c);
    [a[0] + x, a[1] + y]
}
fn circumcenter_offset(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> [f64; 2] {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let ex = c[0] - a[0];
    let ey = c[1] - a[1];
    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    let det = dx * ey - dy * ex;
    if det == 0.0 {
        return [f64::INFINITY, f64::INFINITY];
    }
    let d = 0.5 / det;
    [(ey * bl - dy * cl) * d, (dx * cl - ex * bl) * d]
}
/// Whether `p` is strictly inside the circumcircle of the counter-clockwise triangle (a, b, c).
fn in_circle(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2]) -> bool {
    let dx = a[0] - p[0];
    let dy = a[1] - p[1];
    let ex = b[0] - p[0];
    let ey = b[1] - p[1];
    let fx = c[0] - p[0];
    let fy = c[1] - p[1];
    let ap = dx * dx + dy * dy;
    let bp = ex * ex + ey * ey;
    let cp = fx * fx + fy * fy;
    dx * (ey * cp - bp * fy) - dy * (ex * cp - bp * fx) + ap * (ex * fy - ey * fx) > 0.0
}
/// Monotonic stand-in for `atan2`, mapped to `[0, 1)`.
fn pseudo_angle(dx: f64, dy: f64) -> f64 {
    let sum = dx.abs() + dy.abs();
    if sum == 0.0 {
        return 0.0;
    }
    let p = dx / sum;
    (if dy > 0.0 { 3.0 - p } else { 1.0 + p }) / 4.0
}
#[cfg(test)]
mod tests {
    use super::*;
    fn area(tri: &Triangulation, t: usize) -> f64 {
        let [a, b, c] = tri.corners(t);
        cross(a, b, c) / 2.0
    }
    #[test]
    fn square_splits_into_two_triangles() {
        let tri = Triangulation::build(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
        assert_eq!(tri.len(), 2);
        let total: f64 = (0..tri.len()).map(|t| area(&tri, t)).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
    #[test]
    fn triangles_are_counter_clockwise_and_cover_the_hull() {
        let mut points = Vec::new();
        for i in 0..6 {
            for j in 0..5 {
                points.push([i as f64 * 0.5, j as f64 * 0.25]);
            }
        }
        let tri = Triangulation::build(&points).unwrap();
        assert_eq!(tri.len(), 2 * 5 * 4);
        let mut total = 0.0;
        for t in 0..tri.len() {
            let a = area(&tri, t);
            assert!(a > 0.0);
            total += a;
        }
        assert!((total - 2.5).abs() < 1e-9);
    }
    #[test]
    fn neighbors_are_symmetric() {
        let points = [[0.0, 0.0], [2.0, 0.1], [1.0, 1.7], [0.9, 0.6], [2.2, 1.4], [-0.3, 1.2]];
        let tri = Triangulation::build(&points).unwrap();
        for t in 0..tri.len() {
            for k in 0..3 {
                if let Some(n) = tri.neighbor(t, k) {
                    assert!((0..3).any(|j| tri.neighbor(n, j) == Some(t)));
                }
            }
        }
    }
    #[test]
    fn empty_circumcircles() {
        let points = [
            [0.1, 0.2], [3.0, 0.4], [1.5, 2.9], [2.2, 1.1], [0.7, 1.6], [2.9, 2.5], [1.2, 0.9],
        ];
        let tri = Triangulation::build(&points).unwrap();
        for t in 0..tri.len() {
            let [a, b, c] = tri.corners(t);
            let vs = tri.vertices(t);
            for (i, p) in points.iter().enumerate() {
                if !vs.contains(&i) {
                    assert!(!in_circle(a, b, c, *p));
                }
            }
        }
    }
    #[test]
    fn collinear_sites_are_rejected() {
        let err = Triangulation::build(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        assert!(matches!(err, Err(InterpolationError::Collinear)));
    }
}
