//! Piece connectivity: who touches whom, which pieces rest on the ground, and which
//! pieces have already crumbled away.
//!
//! Nodes are dense [`PieceId`]s, so every per-piece set is a plain `Vec<bool>` and the
//! adjacency is a `Vec<Vec<PieceId>>`.

use log::{debug, info};

use crate::{
    constants::{BASE_HEIGHT_EPS, SHARED_VERTEX_MIN_COUNT, SHARED_VERTEX_TOLERANCE},
    mesh::{Piece, PieceId},
    probe::{self, Placed},
    stopwatch::LogStopwatch,
};

/// Adjacency relation among fracture pieces plus the base and crumbled sets.
#[derive(Clone, Debug, Default)]
pub struct ConnectivityGraph {
    detect_disconnected: bool,
    adjacency: Vec<Vec<PieceId>>,
    base: Vec<bool>,
    crumbled: Vec<bool>,
}

impl ConnectivityGraph {
    /// Build the graph for `pieces`, whose ids must be `0..pieces.len()` in order.
    ///
    /// With `detect_disconnected` off no geometry is inspected at all: every piece counts
    /// as attached until it crumbles.
    pub fn build(pieces: &[Piece], detect_disconnected: bool) -> Self {
        let n = pieces.len();
        debug_assert!(pieces.iter().enumerate().all(|(i, p)| p.id.index() == i));

        let mut graph = Self {
            detect_disconnected,
            adjacency: vec![Vec::new(); n],
            base: vec![false; n],
            crumbled: vec![false; n],
        };
        if !detect_disconnected || n == 0 {
            return graph;
        }

        let _sw = LogStopwatch::new("adjacency scan");

        // Lowest pieces first: the base search then tends to go downward first and reaches
        // the ground in fewer hops.
        let mut height_sorted: Vec<(PieceId, f32)> = pieces
            .iter()
            .map(|p| (p.id, probe::min_height(Placed::piece(p))))
            .collect();
        height_sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

        let bottom = height_sorted[0].1;
        for &(id, h) in &height_sorted {
            if h - bottom > BASE_HEIGHT_EPS {
                break;
            }
            graph.base[id.index()] = true;
        }
        debug!("Bottom piece count: {}", graph.base_count());

        let order: Vec<PieceId> = height_sorted.iter().map(|(id, _)| *id).collect();
        graph.compute_adjacency(pieces, &order);

        info!(
            "Connection graph: {} pieces, {} edges, {} base",
            n,
            graph.edge_count(),
            graph.base_count()
        );
        graph
    }

    /// Pairwise touching tests in height order, reusing the answer of the reverse pair
    /// when the neighbour was already processed and lists the current piece.
    #[cfg(not(feature = "parallel"))]
    fn compute_adjacency(&mut self, pieces: &[Piece], order: &[PieceId]) {
        let mut processed = vec![false; pieces.len()];

        for (progress, &id) in order.iter().enumerate() {
            log::trace!("Piece {} progress {}/{}", id, progress + 1, order.len());
            let mut touching = Vec::new();

            for &other in order {
                if other == id {
                    continue;
                }

                let cached = processed[other.index()] && self.adjacency[other.index()].contains(&id);
                let found = cached || pieces_touch(&pieces[id.index()], &pieces[other.index()]);
                if found {
                    touching.push(other);
                }
            }

            self.adjacency[id.index()] = touching;
            processed[id.index()] = true;
        }
    }

    /// Parallel variant: every unordered pair is tested exactly once and the result is
    /// written into both adjacency lists, so no partial results are shared between tasks.
    #[cfg(feature = "parallel")]
    fn compute_adjacency(&mut self, pieces: &[Piece], order: &[PieceId]) {
        use rayon::prelude::*;

        let rank: Vec<usize> = {
            let mut rank = vec![0; order.len()];
            for (r, id) in order.iter().enumerate() {
                rank[id.index()] = r;
            }
            rank
        };

        let edges: Vec<(PieceId, PieceId)> = (0..order.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                ((i + 1)..order.len()).filter_map(move |j| {
                    let (a, b) = (order[i], order[j]);
                    pieces_touch(&pieces[a.index()], &pieces[b.index()]).then_some((a, b))
                })
            })
            .collect();

        for (a, b) in edges {
            self.adjacency[a.index()].push(b);
            self.adjacency[b.index()].push(a);
        }
        // Keep neighbour lists in height order, like the sequential build.
        for list in &mut self.adjacency {
            list.sort_by_key(|id| rank[id.index()]);
        }
    }

    pub fn len(&self) -> usize {
        self.crumbled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crumbled.is_empty()
    }

    pub fn detects_disconnected(&self) -> bool {
        self.detect_disconnected
    }

    pub fn neighbors(&self, id: PieceId) -> &[PieceId] {
        self.adjacency
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_base(&self, id: PieceId) -> bool {
        self.base.get(id.index()).copied().unwrap_or(false)
    }

    pub fn base_count(&self) -> usize {
        self.base.iter().filter(|b| **b).count()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn is_crumbled(&self, id: PieceId) -> bool {
        self.crumbled.get(id.index()).copied().unwrap_or(false)
    }

    /// Mark a piece as released. Idempotent; there is no way back.
    pub fn set_crumbled(&mut self, id: PieceId) {
        if let Some(slot) = self.crumbled.get_mut(id.index()) {
            *slot = true;
        }
    }

    pub fn crumbled_count(&self) -> usize {
        self.crumbled.iter().filter(|c| **c).count()
    }

    /// Is there a path of non-crumbled touching pieces from `id` to a non-crumbled base piece?
    ///
    /// Without disconnection detection this is simply "not crumbled yet".
    /// The search uses an explicit stack and a visited set local to this query, so it
    /// terminates on cyclic graphs and is safe for deep fracture patterns.
    pub fn is_connected_to_base(&self, id: PieceId) -> bool {
        if !self.detect_disconnected {
            return !self.is_crumbled(id);
        }
        if id.index() >= self.len() || self.is_crumbled(id) {
            return false;
        }

        let mut visited = vec![false; self.len()];
        let mut stack = vec![id];
        visited[id.index()] = true;

        while let Some(current) = stack.pop() {
            if self.is_base(current) {
                return true;
            }
            for &next in self.neighbors(current) {
                if !visited[next.index()] && !self.is_crumbled(next) {
                    visited[next.index()] = true;
                    stack.push(next);
                }
            }
        }

        false
    }
}

/// Two pieces touch when they share enough near-coincident vertices.
fn pieces_touch(a: &Piece, b: &Piece) -> bool {
    probe::count_shared_vertices(
        Placed::piece(a),
        Placed::piece(b),
        SHARED_VERTEX_TOLERANCE,
        SHARED_VERTEX_MIN_COUNT,
    ) >= SHARED_VERTEX_MIN_COUNT
}
