//! Rigid and scaling transforms, normals and volume.

use super::layout::{StlFacet, StlFile, StlVertex};

/// Unit normal of a facet from its vertex winding, in double precision.
pub(crate) fn facet_normal(f: &StlFacet) -> [f64; 3] {
    let [a, b, c] = f.vertex.map(|v| [v.x as f64, v.y as f64, v.z as f64]);
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let w = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * w[2] - u[2] * w[1],
        u[2] * w[0] - u[0] * w[2],
        u[0] * w[1] - u[1] * w[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 0.0 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0; 3]
    }
}

fn to_vertex(n: [f64; 3]) -> StlVertex {
    StlVertex::new(n[0] as f32, n[1] as f32, n[2] as f32)
}

/// Reverses the winding of one facet and flips its normal.
pub(crate) fn reverse_facet(f: &mut StlFacet) {
    f.vertex.swap(1, 2);
    f.normal = StlVertex::new(-f.normal.x, -f.normal.y, -f.normal.z);
}

impl StlFile {
    pub(crate) fn recalculate_normals(&mut self) {
        for f in self.facets_mut() {
            f.normal = to_vertex(facet_normal(f));
        }
    }

    /// Moves the mesh so that its minimum corner lands on `target`.
    pub(crate) fn translate(&mut self, target: StlVertex) {
        let min = self.stats.min;
        self.translate_relative(StlVertex::new(
            target.x - min.x,
            target.y - min.y,
            target.z - min.z,
        ));
    }

    pub(crate) fn translate_relative(&mut self, shift: StlVertex) {
        for f in self.facets_mut() {
            for v in &mut f.vertex {
                v.x += shift.x;
                v.y += shift.y;
                v.z += shift.z;
            }
        }
        self.update_bounds();
    }

    pub(crate) fn scale_versor(&mut self, versor: [f32; 3]) {
        for f in self.facets_mut() {
            for v in &mut f.vertex {
                v.x *= versor[0];
                v.y *= versor[1];
                v.z *= versor[2];
            }
        }
        if self.stats.volume > 0.0 {
            self.stats.volume *= versor[0] * versor[1] * versor[2];
        }
        self.update_bounds();
        self.recalculate_normals();
    }

    /// Rotates counter-clockwise about `axis` (0, 1 or 2) as seen looking
    /// down the positive axis towards the origin.
    pub(crate) fn rotate(&mut self, axis: usize, degrees: f32) {
        let (sin, cos) = (degrees as f64).to_radians().sin_cos();
        let (i, j) = ((axis + 1) % 3, (axis + 2) % 3);
        for f in self.facets_mut() {
            for v in &mut f.vertex {
                let (a, b) = (v.component(i) as f64, v.component(j) as f64);
                *v.component_mut(i) = (a * cos - b * sin) as f32;
                *v.component_mut(j) = (a * sin + b * cos) as f32;
            }
        }
        self.update_bounds();
        self.recalculate_normals();
    }

    /// Negates one coordinate and reverses every facet so they keep facing
    /// outwards. The reversal is not counted in `facets_reversed`.
    pub(crate) fn mirror(&mut self, axis: usize) {
        for f in self.facets_mut() {
            for v in &mut f.vertex {
                let c = v.component_mut(axis);
                *c = -*c;
            }
        }
        let (min, max) = (self.stats.min.component(axis), self.stats.max.component(axis));
        *self.stats.min.component_mut(axis) = -max;
        *self.stats.max.component_mut(axis) = -min;
        let reversed = self.stats.facets_reversed;
        self.reverse_all_facets();
        self.stats.facets_reversed = reversed;
        self.recalculate_normals();
    }

    pub(crate) fn reverse_all_facets(&mut self) {
        let (facets, neighbors) = self.facets_and_neighbors_mut();
        if neighbors.is_empty() {
            facets.iter_mut().for_each(reverse_facet);
        } else {
            for (f, n) in facets.iter_mut().zip(neighbors.iter_mut()) {
                reverse_facet(f);
                // Swapping vertex 1 and 2 turns edge 0 into edge 2 and the
                // far vertex of every neighbor moves the same way.
                n.neighbor.swap(0, 2);
                n.which_vertex_not.swap(0, 2);
                for w in &mut n.which_vertex_not {
                    if *w >= 0 {
                        let base = match *w % 3 {
                            1 => 2,
                            2 => 1,
                            other => other,
                        };
                        *w = base + (*w / 3) * 3;
                    }
                }
            }
        }
        let count = self.stats.number_of_facets;
        self.stats.facets_reversed += count;
    }

    /// Replaces every stored normal with the one implied by the winding.
    pub(crate) fn fix_normal_values(&mut self) {
        let mut fixed = 0;
        for f in self.facets_mut() {
            let n = to_vertex(facet_normal(f));
            let off =
                (n.x - f.normal.x).abs() + (n.y - f.normal.y).abs() + (n.z - f.normal.z).abs();
            if off > 1e-3 {
                fixed += 1;
            }
            f.normal = n;
        }
        self.stats.normals_fixed += fixed;
    }

    /// Signed volume by the divergence theorem; inward-facing meshes are
    /// negative.
    pub(crate) fn calculate_volume(&mut self) {
        self.stats.volume = signed_volume(self.facets()) as f32;
    }
}

pub(crate) fn signed_volume<'a>(facets: impl IntoIterator<Item = &'a StlFacet>) -> f64 {
    facets
        .into_iter()
        .map(|f| {
            let [a, b, c] = f.vertex.map(|v| [v.x as f64, v.y as f64, v.z as f64]);
            let cross = [
                b[1] * c[2] - b[2] * c[1],
                b[2] * c[0] - b[0] * c[2],
                b[0] * c[1] - b[1] * c[0],
            ];
            a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]
        })
        .sum::<f64>()
        / 6.0
}
