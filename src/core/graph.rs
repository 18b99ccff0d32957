//! Wait-For Graph over a fixed worker population
//!
//! This module implements the directed wait-for graph (WFG) at the heart of
//! the detector. An edge `i -> j` means worker `i` is currently blocked
//! inside an acquisition on a resource held by worker `j`.
//!
//! # How it works
//!
//! The worker population is fixed at session start, so the graph is a dense
//! `N x N` boolean adjacency matrix rather than a hash-based edge set. Cycle
//! search is a three-color depth-first traversal:
//!
//! 1. *White*: vertex not yet visited.
//! 2. *Gray*: vertex on the current DFS path. An edge into a Gray vertex is
//!    a back-edge, and a back-edge in a directed graph proves a cycle.
//! 3. *Black*: vertex fully explored, no cycle through it.
//!
//! Recursion depth is bounded by the worker count, which is small by
//! construction. The graph itself is not synchronized; the detector wraps it
//! in its single state guard.

use crate::core::types::WorkerId;

/// Visitation state of a vertex during cycle search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Directed graph of worker wait relationships
pub struct WaitForGraph {
    /// Number of workers (vertices)
    workers: usize,
    /// Row-major adjacency matrix: `edges[from * workers + to]`
    edges: Vec<bool>,
}

impl WaitForGraph {
    /// Create an empty wait-for graph over `workers` vertices
    pub fn new(workers: usize) -> Self {
        WaitForGraph {
            workers,
            edges: vec![false; workers * workers],
        }
    }

    /// Number of vertices in the graph
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Add a directed edge: `from` waits for `to`
    pub fn add_edge(&mut self, from: WorkerId, to: WorkerId) {
        self.edges[from * self.workers + to] = true;
    }

    /// Remove the directed edge `from -> to`, if present
    pub fn remove_edge(&mut self, from: WorkerId, to: WorkerId) {
        self.edges[from * self.workers + to] = false;
    }

    /// Remove every outgoing edge of `from`
    ///
    /// Called when a worker stops waiting. A worker has at most one outgoing
    /// edge in practice, but the matrix permits more, so the whole row is
    /// cleared.
    pub fn clear_outgoing(&mut self, from: WorkerId) {
        let row = from * self.workers;
        self.edges[row..row + self.workers].fill(false);
    }

    /// Whether the edge `from -> to` is present
    pub fn has_edge(&self, from: WorkerId, to: WorkerId) -> bool {
        self.edges[from * self.workers + to]
    }

    /// Whether the graph has no edges at all
    pub fn is_empty(&self) -> bool {
        !self.edges.iter().any(|&e| e)
    }

    /// Whether the graph contains any directed cycle
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Search the whole graph for a directed cycle
    ///
    /// Starts a DFS from every still-White vertex, so a cycle is found no
    /// matter which component it lives in or in which order vertices are
    /// tried.
    ///
    /// # Returns
    /// * `Some(cycle)` - The workers forming the first cycle found, in cycle
    ///   order starting from the vertex the back-edge points at
    /// * `None` - The graph is acyclic
    pub fn find_cycle(&self) -> Option<Vec<WorkerId>> {
        let mut color = vec![Color::White; self.workers];
        let mut path = Vec::with_capacity(self.workers);

        for start in 0..self.workers {
            if color[start] == Color::White {
                if let Some(cycle) = self.visit(start, &mut color, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(
        &self,
        u: WorkerId,
        color: &mut [Color],
        path: &mut Vec<WorkerId>,
    ) -> Option<Vec<WorkerId>> {
        color[u] = Color::Gray;
        path.push(u);

        for v in 0..self.workers {
            if !self.edges[u * self.workers + v] {
                continue;
            }
            match color[v] {
                Color::Gray => {
                    // Back-edge. A Gray vertex is always on the current path,
                    // so the cycle is the path segment from v onwards.
                    let start = path.iter().position(|&w| w == v).unwrap_or(0);
                    return Some(path[start..].to_vec());
                }
                Color::White => {
                    if let Some(cycle) = self.visit(v, color, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        color[u] = Color::Black;
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::seq::SliceRandom;

    #[test]
    fn empty_graph_has_no_cycle() {
        let g = WaitForGraph::new(4);
        assert!(!g.has_cycle());
        assert!(g.is_empty());
    }

    #[test]
    fn single_edge_is_acyclic() {
        let mut g = WaitForGraph::new(2);
        g.add_edge(0, 1);
        assert!(!g.has_cycle());
        assert!(g.has_edge(0, 1));
        assert!(!g.has_edge(1, 0));
    }

    #[test]
    fn two_worker_cycle_is_found() {
        let mut g = WaitForGraph::new(2);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        let cycle = g.find_cycle().expect("crossed waits must form a cycle");
        assert_eq!(cycle.len(), 2);
        assert!(cycle.contains(&0) && cycle.contains(&1));
    }

    #[test]
    fn self_wait_is_a_cycle() {
        let mut g = WaitForGraph::new(3);
        g.add_edge(1, 1);
        assert_eq!(g.find_cycle(), Some(vec![1]));
    }

    #[test]
    fn diamond_dag_is_acyclic() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3: shares a sink but has no cycle
        let mut g = WaitForGraph::new(4);
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        assert!(!g.has_cycle());
    }

    #[test]
    fn cycle_is_found_regardless_of_start_vertex() {
        // The cycle sits among the highest-numbered vertices, behind an
        // acyclic prefix, so DFS must reach it from any scan order.
        let mut g = WaitForGraph::new(6);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(3, 4);
        g.add_edge(4, 5);
        g.add_edge(5, 3);
        let cycle = g.find_cycle().expect("ring 3->4->5->3 must be found");
        assert_eq!(cycle.len(), 3);
        for w in [3, 4, 5] {
            assert!(cycle.contains(&w));
        }
    }

    #[test]
    fn ring_of_workers_is_a_cycle() {
        let n = 8;
        let mut g = WaitForGraph::new(n);
        for i in 0..n {
            g.add_edge(i, (i + 1) % n);
        }
        let cycle = g.find_cycle().expect("full ring must be a cycle");
        assert_eq!(cycle.len(), n);
    }

    #[test]
    fn removing_an_edge_breaks_the_cycle() {
        let mut g = WaitForGraph::new(2);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        assert!(g.has_cycle());
        g.remove_edge(1, 0);
        assert!(!g.has_cycle());
    }

    #[test]
    fn clear_outgoing_removes_the_whole_row() {
        let mut g = WaitForGraph::new(3);
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(2, 0);
        g.clear_outgoing(0);
        assert!(!g.has_edge(0, 1));
        assert!(!g.has_edge(0, 2));
        assert!(g.has_edge(2, 0));
    }

    #[test]
    fn random_dags_never_report_a_cycle() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let n = rng.random_range(2..12);
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);

            // Position of each vertex in the random topological order
            let mut pos = vec![0usize; n];
            for (p, &v) in order.iter().enumerate() {
                pos[v] = p;
            }

            // Only add edges that respect the order, so the graph is a DAG
            let mut g = WaitForGraph::new(n);
            for _ in 0..n * 2 {
                let a = rng.random_range(0..n);
                let b = rng.random_range(0..n);
                if pos[a] < pos[b] {
                    g.add_edge(a, b);
                }
            }
            assert!(!g.has_cycle(), "a DAG must never report a cycle");
        }
    }

    #[test]
    fn random_rings_with_chords_always_report_a_cycle() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let n = rng.random_range(2..12);
            let mut g = WaitForGraph::new(n);
            for i in 0..n {
                g.add_edge(i, (i + 1) % n);
            }
            // Extra chords cannot destroy the ring
            for _ in 0..n {
                let a = rng.random_range(0..n);
                let b = rng.random_range(0..n);
                g.add_edge(a, b);
            }
            assert!(g.has_cycle(), "a ring plus chords must contain a cycle");
        }
    }
}
