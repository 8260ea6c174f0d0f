use std::collections::{BTreeSet, HashSet, VecDeque};

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Find cycles in a directed graph given as out-edge sets (`edges[v]` are
/// the successors of `v`).
///
/// Iterative depth-first search with an explicit recursion stack; every
/// back edge yields the cycle from the re-entered node around to itself.
/// Cycles are de-duplicated up to rotation and returned in discovery order.
pub fn find_cycles(edges: &[BTreeSet<usize>]) -> Vec<Vec<usize>> {
    let n = edges.len();
    let mut color = vec![Color::White; n];
    let mut cycles = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for root in 0..n {
        if color[root] != Color::White {
            continue;
        }

        // (node, iterator position into its successor set)
        let mut stack: Vec<(usize, Vec<usize>, usize)> = Vec::new();
        let mut path: Vec<usize> = Vec::new();

        color[root] = Color::Gray;
        path.push(root);
        stack.push((root, edges[root].iter().copied().collect(), 0));

        while !stack.is_empty() {
            let (node, next) = {
                let (node, succs, pos) = stack.last_mut().expect("stack checked non-empty");
                if *pos < succs.len() {
                    let next = succs[*pos];
                    *pos += 1;
                    (*node, Some(next))
                } else {
                    (*node, None)
                }
            };
            match next {
                Some(next) => match color[next] {
                    Color::White => {
                        color[next] = Color::Gray;
                        path.push(next);
                        stack.push((next, edges[next].iter().copied().collect(), 0));
                    }
                    Color::Gray => {
                        // Back edge: the cycle runs from `next` to the top
                        // of the current path.
                        let start = path
                            .iter()
                            .position(|&v| v == next)
                            .expect("gray node must be on the path");
                        let cycle = path[start..].to_vec();
                        let canonical = canonical_rotation(&cycle);
                        if seen.insert(canonical) {
                            cycles.push(cycle);
                        }
                    }
                    Color::Black => {}
                },
                None => {
                    color[node] = Color::Black;
                    path.pop();
                    stack.pop();
                }
            }
        }
    }

    cycles
}

/// Rotate a cycle so its smallest node comes first, for de-duplication.
fn canonical_rotation(cycle: &[usize]) -> Vec<usize> {
    let min_pos = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, v)| v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_pos..]);
    rotated.extend_from_slice(&cycle[..min_pos]);
    rotated
}

// ---------------------------------------------------------------------------
// Layer assignment
// ---------------------------------------------------------------------------

/// Assign layers on an acyclic graph: `layer(v) = 0` when `v` has no
/// producers, else `1 + max(layer(p))` over its producers. Kahn-style
/// processing over producer counts; the result is independent of queue
/// order.
pub fn assign_layers(
    producers_of: &[BTreeSet<usize>],
    consumers_of: &[BTreeSet<usize>],
) -> Vec<usize> {
    let n = producers_of.len();
    let mut remaining: Vec<usize> = producers_of.iter().map(|p| p.len()).collect();
    let mut layer = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| remaining[v] == 0).collect();

    while let Some(v) = queue.pop_front() {
        for &c in &consumers_of[v] {
            layer[c] = layer[c].max(layer[v] + 1);
            remaining[c] -= 1;
            if remaining[c] == 0 {
                queue.push_back(c);
            }
        }
    }

    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(usize, usize)], n: usize) -> Vec<BTreeSet<usize>> {
        let mut out = vec![BTreeSet::new(); n];
        for &(a, b) in edges {
            out[a].insert(b);
        }
        out
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let edges = graph(&[(0, 1), (1, 2), (0, 2)], 3);
        assert!(find_cycles(&edges).is_empty());
    }

    #[test]
    fn two_node_cycle_found() {
        let edges = graph(&[(0, 1), (1, 0)], 2);
        let cycles = find_cycles(&edges);
        assert_eq!(cycles.len(), 1);
        assert_eq!(canonical_rotation(&cycles[0]), vec![0, 1]);
    }

    #[test]
    fn self_loop_found() {
        let edges = graph(&[(0, 0)], 1);
        let cycles = find_cycles(&edges);
        assert_eq!(cycles, vec![vec![0]]);
    }

    #[test]
    fn distinct_cycles_not_duplicated() {
        // Two separate 2-cycles plus a shared acyclic tail.
        let edges = graph(&[(0, 1), (1, 0), (2, 3), (3, 2), (1, 4)], 5);
        let cycles = find_cycles(&edges);
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn layers_follow_longest_producer_path() {
        // 0 -> 1 -> 3, 2 -> 3 (as consumer edges); producers are the
        // reverse direction.
        let consumers = graph(&[(0, 1), (1, 3), (2, 3)], 4);
        let mut producers = vec![BTreeSet::new(); 4];
        for (v, out) in consumers.iter().enumerate() {
            for &c in out {
                producers[c].insert(v);
            }
        }
        let layer = assign_layers(&producers, &consumers);
        assert_eq!(layer, vec![0, 1, 0, 2]);
    }
}
