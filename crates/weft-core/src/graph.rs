use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Summary of a dependency graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Ordering report for a dependency graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyReport {
    pub summary: GraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Directed graph over arena indices. An edge `a -> b` means `a` must be
/// ordered before `b`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    labels: Vec<String>,
    edges: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, label: impl Into<String>) -> usize {
        self.labels.push(label.into());
        self.edges.push(BTreeSet::new());
        self.labels.len() - 1
    }

    pub fn add_edge(&mut self, before: usize, after: usize) {
        if let Some(targets) = self.edges.get_mut(before) {
            targets.insert(after);
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(BTreeSet::len).sum()
    }

    pub fn label(&self, node: usize) -> &str {
        self.labels.get(node).map(String::as_str).unwrap_or("")
    }

    /// Kahn's algorithm. Ties are broken by the lowest index so insertion
    /// order survives wherever no edge forces otherwise. On failure returns
    /// one concrete cycle, closed on its first node.
    pub fn toposort(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut indegree = vec![0_usize; self.len()];
        for targets in &self.edges {
            for &target in targets {
                indegree[target] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter_map(|(node, count)| (*count == 0).then_some(node))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &target in &self.edges[node] {
                indegree[target] = indegree[target].saturating_sub(1);
                if indegree[target] == 0 {
                    ready.insert(target);
                }
            }
        }

        if order.len() == self.len() {
            Ok(order)
        } else {
            let remaining: BTreeSet<usize> = indegree
                .iter()
                .enumerate()
                .filter_map(|(node, count)| (*count > 0).then_some(node))
                .collect();
            Err(self.extract_cycle(&remaining))
        }
    }

    /// Every node left over by Kahn's algorithm has a predecessor that is
    /// also left over, so walking predecessors must revisit a node.
    fn extract_cycle(&self, remaining: &BTreeSet<usize>) -> Vec<usize> {
        let Some(&start) = remaining.iter().next() else {
            return Vec::new();
        };
        let mut walk = vec![start];
        let mut current = start;
        loop {
            let predecessor = remaining
                .iter()
                .copied()
                .find(|candidate| self.edges[*candidate].contains(&current));
            let Some(predecessor) = predecessor else {
                return walk;
            };
            if let Some(pos) = walk.iter().position(|node| *node == predecessor) {
                let mut cycle: Vec<usize> = walk[pos..].to_vec();
                cycle.reverse();
                cycle.push(cycle[0]);
                return cycle;
            }
            walk.push(predecessor);
            current = predecessor;
        }
    }

    /// Deterministic report used by the CLI and the generation report.
    pub fn report(&self) -> DependencyReport {
        let summary = GraphSummary {
            nodes: self.len(),
            edges: self.edge_count(),
        };
        let labels = |nodes: Vec<usize>| -> Vec<String> {
            nodes.into_iter().map(|node| self.label(node).to_string()).collect()
        };
        match self.toposort() {
            Ok(order) => DependencyReport {
                summary,
                topo_order: Some(labels(order)),
                cycle: None,
            },
            Err(cycle) => DependencyReport {
                summary,
                topo_order: None,
                cycle: Some(labels(cycle)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toposort_orders_dependencies() {
        let mut graph = DependencyGraph::new();
        let orders = graph.add_node("orders");
        let users = graph.add_node("users");
        graph.add_edge(users, orders);

        let order = graph.toposort().expect("expected toposort");
        assert_eq!(order, vec![users, orders]);
    }

    #[test]
    fn toposort_keeps_insertion_order_without_edges() {
        let mut graph = DependencyGraph::new();
        for name in ["c", "a", "b"] {
            graph.add_node(name);
        }
        assert_eq!(graph.toposort().expect("acyclic"), vec![0, 1, 2]);
    }

    #[test]
    fn toposort_reports_cycle() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let c = graph.add_node("c");
        graph.add_edge(a, b);
        graph.add_edge(b, a);
        graph.add_edge(b, c);

        let report = graph.report();
        assert!(report.topo_order.is_none());
        let cycle = report.cycle.expect("cycle");
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.contains(&"a".to_string()));
        assert!(cycle.contains(&"b".to_string()));
        assert!(!cycle.contains(&"c".to_string()));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("a");
        graph.add_edge(a, a);
        assert_eq!(graph.toposort(), Err(vec![a, a]));
    }
}
