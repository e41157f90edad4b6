//! Strongly connected components (spec §4.6): iterative Tarjan over the
//! dependency graph, explicit work stack so deep dependency chains never
//! blow the call stack. Components come back in topological order of the
//! condensation -- deepest (fewest outstanding dependencies) first.

use rustc_hash::{FxHashMap, FxHashSet};

use trip_common::QualifiedName;

use crate::graph::Graph;

pub fn strongly_connected_components(edges: &Graph) -> Vec<Vec<QualifiedName>> {
    let nodes: Vec<QualifiedName> = edges.keys().cloned().collect();
    let neighbor_lists: FxHashMap<QualifiedName, Vec<QualifiedName>> = edges
        .iter()
        .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
        .collect();

    let mut index_of: FxHashMap<QualifiedName, u32> = FxHashMap::default();
    let mut lowlink: FxHashMap<QualifiedName, u32> = FxHashMap::default();
    let mut on_stack: FxHashSet<QualifiedName> = FxHashSet::default();
    let mut tstack: Vec<QualifiedName> = Vec::new();
    let mut next_index: u32 = 0;
    let mut components: Vec<Vec<QualifiedName>> = Vec::new();

    for start in &nodes {
        if index_of.contains_key(start) {
            continue;
        }

        let mut work: Vec<(QualifiedName, usize)> = vec![(start.clone(), 0)];
        index_of.insert(start.clone(), next_index);
        lowlink.insert(start.clone(), next_index);
        next_index += 1;
        tstack.push(start.clone());
        on_stack.insert(start.clone());

        while let Some((node, pos)) = work.pop() {
            let neighbors = neighbor_lists.get(&node).cloned().unwrap_or_default();
            if pos < neighbors.len() {
                let w = neighbors[pos].clone();
                work.push((node.clone(), pos + 1));
                if !index_of.contains_key(&w) {
                    index_of.insert(w.clone(), next_index);
                    lowlink.insert(w.clone(), next_index);
                    next_index += 1;
                    tstack.push(w.clone());
                    on_stack.insert(w.clone());
                    work.push((w, 0));
                } else if on_stack.contains(&w) {
                    let wi = index_of[&w];
                    if wi < lowlink[&node] {
                        lowlink.insert(node.clone(), wi);
                    }
                }
            } else {
                if let Some((parent, _)) = work.last() {
                    let child_low = lowlink[&node];
                    if child_low < lowlink[parent] {
                        lowlink.insert(parent.clone(), child_low);
                    }
                }
                if lowlink[&node] == index_of[&node] {
                    let mut component = Vec::new();
                    loop {
                        let w = tstack.pop().unwrap();
                        on_stack.remove(&w);
                        component.push(w.clone());
                        if w == node {
                            break;
                        }
                    }
                    components.push(component);
                }
            }
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use trip_common::{LocalName, ModuleName};

    fn q(name: &str) -> QualifiedName {
        QualifiedName::new(ModuleName::new("M"), LocalName::new(name))
    }

    #[test]
    fn a_two_cycle_collapses_into_one_component() {
        let mut edges = Graph::new();
        edges.insert(q("a"), BTreeSet::from([q("b")]));
        edges.insert(q("b"), BTreeSet::from([q("a")]));
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 2);
    }

    #[test]
    fn acyclic_chain_orders_dependencies_before_dependents() {
        // a -> b -> c
        let mut edges = Graph::new();
        edges.insert(q("a"), BTreeSet::from([q("b")]));
        edges.insert(q("b"), BTreeSet::from([q("c")]));
        edges.insert(q("c"), BTreeSet::new());
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs, vec![vec![q("c")], vec![q("b")], vec![q("a")]]);
    }

    #[test]
    fn self_loop_is_its_own_singleton_cycle() {
        let mut edges = Graph::new();
        edges.insert(q("a"), BTreeSet::from([q("a")]));
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs, vec![vec![q("a")]]);
    }
}
