//! Facet adjacency: exact and nearby matching, removal of loose facets,
//! hole filling and orientation repair.

use super::layout::{StlFacet, StlFile, StlNeighbors, StlVertex};
use super::transform::{facet_normal, reverse_facet, signed_volume};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use std::collections::VecDeque;
use std::os::raw::c_int;

type Key = [u32; 3];

fn edge(f: &StlFacet, e: usize) -> (StlVertex, StlVertex) {
    (f.vertex[e], f.vertex[(e + 1) % 3])
}

fn is_degenerate(f: &StlFacet) -> bool {
    let [a, b, c] = f.vertex.map(|v| v.key());
    a == b || b == c || a == c
}

fn distance(a: &StlVertex, b: &StlVertex) -> f32 {
    let (dx, dy, dz) = (a.x - b.x, a.y - b.y, a.z - b.z);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[derive(Clone, Copy)]
struct PendingEdge {
    facet: usize,
    edge: usize,
    forward: bool,
}

impl StlFile {
    /// Removes degenerate facets and links every pair of facets that share
    /// two exactly equal vertices.
    pub(crate) fn check_facets_exact(&mut self) {
        let degenerate = self.retain_facets(|_, f| !is_degenerate(f));
        self.stats.degenerate_facets += degenerate as c_int;
        self.link_neighbors();
    }

    /// Rebuilds the neighbor table from scratch and refreshes the
    /// connectivity counters.
    pub(crate) fn link_neighbors(&mut self) {
        let (facets, neighbors) = self.facets_and_neighbors_mut();
        neighbors.fill(StlNeighbors::UNCONNECTED);
        let mut pending: HashMap<(Key, Key), Vec<PendingEdge>> = HashMap::new();
        let mut shortest = f32::INFINITY;
        let mut connected_edges = 0;

        for (i, f) in facets.iter().enumerate() {
            for e in 0..3 {
                let (a, b) = edge(f, e);
                shortest = shortest.min(distance(&a, &b));
                let (ka, kb) = (a.key(), b.key());
                let (key, forward) = if ka <= kb { ((ka, kb), true) } else { ((kb, ka), false) };
                let slot = pending.entry(key).or_default();
                let here = PendingEdge { facet: i, edge: e, forward };
                match slot.pop() {
                    Some(other) => {
                        let backwards = other.forward == forward;
                        let flag = if backwards { 3 } else { 0 };
                        neighbors[i].neighbor[e] = other.facet as c_int;
                        neighbors[i].which_vertex_not[e] = ((other.edge + 2) % 3 + flag) as i8;
                        neighbors[other.facet].neighbor[other.edge] = i as c_int;
                        neighbors[other.facet].which_vertex_not[other.edge] =
                            ((e + 2) % 3 + flag) as i8;
                        connected_edges += 2;
                    }
                    None => slot.push(here),
                }
            }
        }

        let mut by_connected = [0; 4];
        for n in neighbors.iter() {
            by_connected[n.connected_edges()] += 1;
        }
        let backwards = neighbors
            .iter()
            .flat_map(|n| n.which_vertex_not.iter())
            .filter(|&&w| w >= 3)
            .count();

        let stats = &mut self.stats;
        stats.connected_edges = connected_edges;
        stats.connected_facets_3_edge = by_connected[3];
        stats.connected_facets_2_edge = by_connected[3] + by_connected[2];
        stats.connected_facets_1_edge = by_connected[3] + by_connected[2] + by_connected[1];
        stats.facets_w_1_bad_edge = by_connected[2];
        stats.facets_w_2_bad_edge = by_connected[1];
        stats.facets_w_3_bad_edge = by_connected[0];
        stats.backwards_edges = (backwards / 2) as c_int;
        stats.shortest_edge = if shortest.is_finite() { shortest } else { 0.0 };
    }

    /// Snaps unconnected edges whose endpoints lie within `tolerance` of
    /// another unconnected edge, then relinks.
    pub(crate) fn check_facets_nearby(&mut self, tolerance: f32) {
        let open: Vec<(usize, usize)> = self
            .neighbors()
            .iter()
            .enumerate()
            .flat_map(|(i, n)| (0..3).filter(move |&e| n.neighbor[e] < 0).map(move |e| (i, e)))
            .collect();
        let facets = self.facets();
        let mut used = HashSet::new();
        let mut moves: HashMap<Key, StlVertex> = HashMap::new();
        let mut matched = 0;

        for (&(fi, ei), &(fj, ej)) in open.iter().tuple_combinations() {
            if fi == fj || used.contains(&(fi, ei)) || used.contains(&(fj, ej)) {
                continue;
            }
            let (a0, a1) = edge(&facets[fi], ei);
            let (b0, b1) = edge(&facets[fj], ej);
            let reversed = distance(&a0, &b1) <= tolerance && distance(&a1, &b0) <= tolerance;
            let same = distance(&a0, &b0) <= tolerance && distance(&a1, &b1) <= tolerance;
            let pairs = if reversed {
                [(b1, a0), (b0, a1)]
            } else if same {
                [(b0, a0), (b1, a1)]
            } else {
                continue;
            };
            used.insert((fi, ei));
            used.insert((fj, ej));
            let mut snapped = false;
            for (from, to) in pairs {
                if from.key() != to.key() {
                    moves.entry(from.key()).or_insert(to);
                    snapped = true;
                }
            }
            if snapped {
                matched += 1;
            }
        }

        if moves.is_empty() {
            return;
        }
        for f in self.facets_mut() {
            for v in &mut f.vertex {
                if let Some(to) = moves.get(&v.key()) {
                    *v = *to;
                }
            }
        }
        self.stats.edges_fixed += 2 * matched;
        self.check_facets_exact();
    }

    /// Drops facets without a single neighbor.
    pub(crate) fn remove_unconnected_facets(&mut self) {
        let loose: HashSet<usize> = self
            .neighbors()
            .iter()
            .positions(|n| n.connected_edges() == 0)
            .collect();
        if loose.is_empty() {
            return;
        }
        let removed = self.retain_facets(|i, _| !loose.contains(&i));
        self.stats.facets_removed += removed as c_int;
        self.link_neighbors();
    }

    /// Closes every boundary loop with a fan of new facets. Returns false
    /// when storage for the new facets could not be allocated.
    pub(crate) fn fill_holes(&mut self) -> bool {
        // Boundary edges walked in the direction the patch must use.
        let mut outgoing: HashMap<Key, Vec<(Key, StlVertex)>> = HashMap::new();
        let mut points: HashMap<Key, StlVertex> = HashMap::new();
        for (f, n) in self.facets().iter().zip(self.neighbors()) {
            for e in (0..3).filter(|&e| n.neighbor[e] < 0) {
                let (a, b) = edge(f, e);
                points.insert(a.key(), a);
                points.insert(b.key(), b);
                outgoing.entry(b.key()).or_default().push((a.key(), a));
            }
        }

        let mut patch = Vec::new();
        let starts: Vec<Key> = outgoing.keys().copied().sorted_unstable().collect();
        for start in starts {
            while let Some(ring) = take_ring(&mut outgoing, start) {
                let corners: Vec<StlVertex> = ring.iter().map(|k| points[k]).collect();
                for (b, c) in corners[1..].iter().tuple_windows() {
                    let mut f = StlFacet {
                        vertex: [corners[0], *b, *c],
                        ..Default::default()
                    };
                    if is_degenerate(&f) {
                        continue;
                    }
                    let n = facet_normal(&f);
                    f.normal = StlVertex::new(n[0] as f32, n[1] as f32, n[2] as f32);
                    patch.push(f);
                }
            }
        }

        if patch.is_empty() {
            return true;
        }
        if !self.push_facets(&patch) {
            return false;
        }
        self.stats.facets_added += patch.len() as c_int;
        self.link_neighbors();
        true
    }

    /// Makes every connected part consistently wound and outward facing.
    pub(crate) fn fix_normal_directions(&mut self) {
        let count = self.facet_count();
        let adjacency: Vec<[c_int; 3]> = self.neighbors().iter().map(|n| n.neighbor).collect();
        let mut part_of = vec![usize::MAX; count];
        let mut parts = 0;
        let mut reversed = 0;

        for seed in 0..count {
            if part_of[seed] != usize::MAX {
                continue;
            }
            let mut members = vec![seed];
            let mut queue = VecDeque::from([seed]);
            part_of[seed] = parts;
            while let Some(i) = queue.pop_front() {
                for &k in adjacency[i].iter().filter(|&&k| k >= 0) {
                    let k = k as usize;
                    if part_of[k] != usize::MAX {
                        continue;
                    }
                    part_of[k] = parts;
                    let facets = self.facets_mut();
                    if runs_shared_edge_same_way(&facets[i], &facets[k]) {
                        reverse_facet(&mut facets[k]);
                        reversed += 1;
                    }
                    members.push(k);
                    queue.push_back(k);
                }
            }
            let facets = self.facets_mut();
            if signed_volume(members.iter().map(|&m| &facets[m])) < 0.0 {
                for &m in &members {
                    reverse_facet(&mut facets[m]);
                }
                reversed += members.len();
            }
            parts += 1;
        }

        self.stats.facets_reversed += reversed as c_int;
        self.stats.number_of_parts = parts as c_int;
        self.link_neighbors();
    }

    /// Checks that every recorded neighbor really shares its edge. Returns
    /// the number of inconsistent links.
    pub(crate) fn verify_neighbors(&self) -> usize {
        let facets = self.facets();
        let mut bad = 0;
        for (i, n) in self.neighbors().iter().enumerate() {
            for e in 0..3 {
                let Ok(k) = usize::try_from(n.neighbor[e]) else {
                    continue;
                };
                let (a, b) = edge(&facets[i], e);
                let shares = facets.get(k).is_some_and(|other| {
                    let keys = other.vertex.map(|v| v.key());
                    keys.contains(&a.key()) && keys.contains(&b.key())
                });
                if !shares {
                    log::warn!("facet {i}: edge {e} does not match neighbor facet {k}");
                    bad += 1;
                }
            }
        }
        bad
    }
}

/// Pulls one closed loop starting at `start` out of the boundary map.
fn take_ring(outgoing: &mut HashMap<Key, Vec<(Key, StlVertex)>>, start: Key) -> Option<Vec<Key>> {
    let mut ring = vec![start];
    let mut at = start;
    loop {
        let next = outgoing.get_mut(&at)?.pop();
        let Some((to, _)) = next else {
            return None;
        };
        if to == start {
            return (ring.len() >= 3).then_some(ring);
        }
        if ring.contains(&to) || ring.len() > outgoing.len() + 1 {
            return None;
        }
        ring.push(to);
        at = to;
    }
}

/// True when both facets traverse their common edge in the same direction.
fn runs_shared_edge_same_way(a: &StlFacet, b: &StlFacet) -> bool {
    (0..3).any(|e| {
        let (p, q) = edge(a, e);
        (0..3).any(|g| {
            let (r, s) = edge(b, g);
            p.key() == r.key() && q.key() == s.key()
        })
    })
}
