//! Route dependency graph and cascade invalidation
//!
//! Routes declare which other keys they depend on; a change to one key
//! then invalidates every transitive dependent. The graph may contain
//! cycles and must never be assumed acyclic, so traversal carries a
//! visited set and a hard cap on visited nodes.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

/// A route (or file) and the keys it depends on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Key identifying the route or file
    pub key: String,

    /// Keys this route depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Directed dependency edges between route keys
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// key -> keys that depend on it (reverse edges, used by cascade)
    dependents: HashMap<String, Vec<String>>,
    /// key -> keys it depends on (forward edges, as declared)
    dependencies: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a graph from declared routes.
    pub fn from_routes(routes: &[RouteSpec]) -> Self {
        let mut graph = Self::default();
        for route in routes {
            if route.dependencies.is_empty() {
                continue;
            }
            graph
                .dependencies
                .insert(route.key.clone(), route.dependencies.clone());
            for dep in &route.dependencies {
                graph
                    .dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(route.key.clone());
            }
        }
        graph
    }

    /// Total number of distinct keys appearing in any edge
    pub fn node_count(&self) -> usize {
        let mut nodes: HashSet<&str> = HashSet::new();
        for (key, deps) in &self.dependencies {
            nodes.insert(key);
            nodes.extend(deps.iter().map(String::as_str));
        }
        for (key, deps) in &self.dependents {
            nodes.insert(key);
            nodes.extend(deps.iter().map(String::as_str));
        }
        nodes.len()
    }

    /// Keys a given key directly depends on
    pub fn dependencies_of(&self, key: &str) -> &[String] {
        self.dependencies.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keys that directly depend on a given key
    pub fn dependents_of(&self, key: &str) -> &[String] {
        self.dependents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Expand a changed key into itself plus every transitive dependent.
    ///
    /// Breadth-first over reverse edges, each key visited at most once, in
    /// discovery order. Traversal is capped at the graph's node count so a
    /// pathological configuration cannot loop; well-formed graphs never
    /// hit the cap.
    pub fn cascade(&self, changed_key: &str) -> Vec<String> {
        let max_visits = self.node_count() + 1;
        let mut visited: HashSet<String> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        visited.insert(changed_key.to_string());
        order.push(changed_key.to_string());
        queue.push_back(changed_key.to_string());

        while let Some(key) = queue.pop_front() {
            for dependent in self.dependents_of(&key) {
                if visited.len() >= max_visits {
                    warn!(
                        "Cascade from {} hit the traversal cap ({} nodes)",
                        changed_key, max_visits
                    );
                    return order;
                }
                if visited.insert(dependent.clone()) {
                    order.push(dependent.clone());
                    queue.push_back(dependent.clone());
                }
            }
        }

        order
    }
}
