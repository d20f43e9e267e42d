use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, hash_map::Entry},
    hash::Hash,
};

struct Node<S> {
    state: S,
    parent: Option<usize>,
}

/// Best-first search with an arbitrary ordered cost key.
///
/// `expand` pushes the successors of a state together with their keys; a
/// successor's key must not compare less than its parent's. Ties are broken
/// toward the state discovered first, so the result is deterministic.
///
/// Returns the states from `start` to the first goal state reached.
pub(crate) fn best_first<S, K>(
    start: S,
    start_key: K,
    is_goal: impl Fn(&S) -> bool,
    mut expand: impl FnMut(&S, &K, &mut Vec<(S, K)>),
) -> Option<Vec<S>>
where
    S: Copy + Eq + Hash,
    K: Ord + Clone,
{
    let mut nodes = vec![Node {
        state: start,
        parent: None,
    }];
    let mut best = HashMap::from([(start, start_key.clone())]);
    let mut open = BinaryHeap::from([Reverse((start_key, 0))]);
    let mut successors = Vec::new();

    while let Some(Reverse((key, index))) = open.pop() {
        let state = nodes[index].state;
        if best.get(&state).is_some_and(|b| *b < key) {
            continue;
        }
        if is_goal(&state) {
            return Some(reconstruct(&nodes, index));
        }

        successors.clear();
        expand(&state, &key, &mut successors);
        for (next, next_key) in successors.drain(..) {
            debug_assert!(next_key >= key, "cost key decreased along an edge");
            match best.entry(next) {
                Entry::Occupied(mut entry) => {
                    if *entry.get() <= next_key {
                        continue;
                    }
                    entry.insert(next_key.clone());
                }
                Entry::Vacant(entry) => {
                    entry.insert(next_key.clone());
                }
            }
            nodes.push(Node {
                state: next,
                parent: Some(index),
            });
            open.push(Reverse((next_key, nodes.len() - 1)));
        }
    }
    None
}

fn reconstruct<S: Copy>(nodes: &[Node<S>], mut index: usize) -> Vec<S> {
    let mut path = vec![nodes[index].state];
    while let Some(parent) = nodes[index].parent {
        path.push(nodes[parent].state);
        index = parent;
    }
    path.reverse();
    path
}
