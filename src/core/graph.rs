//! Category dependency graph.
//!
//! The caller-supplied table maps a category to the categories its resources
//! reference. It is interned once into an adjacency list over integer indices.

use std::collections::{BTreeSet, HashMap, VecDeque};

/// Mapping from category to the categories it depends on.
pub type CategoryDependencies = HashMap<String, Vec<String>>;

/// Interned, read-only form of [`CategoryDependencies`].
#[derive(Debug, Clone, Default)]
pub struct CategoryGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl CategoryGraph {
    /// Intern every category named in `deps`, as a key or a dependency.
    #[must_use]
    pub fn new(deps: &CategoryDependencies) -> Self {
        // Sorted so indices, and therefore traversal order, are stable across runs.
        let names: Vec<String> = deps
            .iter()
            .flat_map(|(k, v)| std::iter::once(k).chain(v.iter()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        let mut edges = vec![Vec::new(); names.len()];
        for (category, targets) in deps {
            let from = index[category];
            for target in targets {
                let to = index[target];
                if !edges[from].contains(&to) {
                    edges[from].push(to);
                }
            }
        }

        Self { names, index, edges }
    }

    /// Index of a category, if the table mentions it.
    #[must_use]
    pub fn index_of(&self, category: &str) -> Option<usize> {
        self.index.get(category).copied()
    }

    /// Name of an interned category.
    #[must_use]
    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    /// Number of interned categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every category reachable from `start` by following dependency edges,
    /// in breadth-first order. `start` itself is included only when a cycle
    /// leads back to it.
    #[must_use]
    pub fn closure(&self, start: usize) -> Vec<usize> {
        let mut seen = vec![false; self.names.len()];
        let mut result = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        for &dep in &self.edges[start] {
            if !seen[dep] {
                seen[dep] = true;
                result.push(dep);
                queue.push_back(dep);
            }
        }
        while let Some(current) = queue.pop_front() {
            for &dep in &self.edges[current] {
                if !seen[dep] {
                    seen[dep] = true;
                    result.push(dep);
                    queue.push_back(dep);
                }
            }
        }
        result
    }

    /// Find one dependency cycle, returned as the category path that closes it
    /// (first and last entries are equal).
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.names.len()];
        let mut stack: Vec<usize> = Vec::new();

        for root in 0..self.names.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // Iterative DFS: (node, next edge to explore).
            let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::OnStack;
            stack.push(root);

            while let Some(frame) = frames.last_mut() {
                let (node, edge) = *frame;
                if let Some(&next) = self.edges[node].get(edge) {
                    frame.1 += 1;
                    match marks[next] {
                        Mark::OnStack => {
                            let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                            let mut path: Vec<String> =
                                stack[start..].iter().map(|&n| self.names[n].clone()).collect();
                            path.push(self.names[next].clone());
                            return Some(path);
                        }
                        Mark::Unvisited => {
                            marks[next] = Mark::OnStack;
                            stack.push(next);
                            frames.push((next, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    frames.pop();
                }
            }
        }
        None
    }
}
