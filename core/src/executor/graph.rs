use std::collections::{HashMap, HashSet};

use crate::error::ExecutorError;
use crate::executor::types::TaskLike;

/// Dependency view over a set of tasks.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// Registered task names
    nodes: HashSet<String>,

    /// Dependency edges: task -> tasks it depends on
    edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task -> registered tasks that depend on it
    reverse_edges: HashMap<String, Vec<String>>,

    /// Registration order (for stable sorting)
    insertion_order: Vec<String>,
}

impl TaskGraph {
    pub fn from_tasks<T: TaskLike>(tasks: &[T]) -> Result<Self, ExecutorError> {
        let mut nodes = HashSet::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if !nodes.insert(task.id().to_string()) {
                return Err(ExecutorError::DuplicateTask(task.id().to_string()));
            }

            let task_id = task.id().to_string();
            let dependencies = task.dependencies().to_vec();

            for dep in &dependencies {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task_id.clone());
            }

            edges.insert(task_id.clone(), dependencies);
            insertion_order.push(task_id);
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    /// Strict check: every dependency is registered and there are no cycles.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        for task_id in &self.insertion_order {
            for dep in self.dependencies_of(task_id) {
                if !self.nodes.contains(dep) {
                    return Err(ExecutorError::DependencyNotFound {
                        task: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(ExecutorError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Kahn stages over registered tasks, each stage in registration order.
    ///
    /// Dependencies on unregistered names do not hold a task back here; the
    /// dependency gate rejects those tasks at run time. Tasks caught in a cycle
    /// never reach in-degree zero and are left out of the stages.
    pub fn stages(&self) -> Vec<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .map(|id| {
                let known = self
                    .dependencies_of(id)
                    .iter()
                    .filter(|dep| self.nodes.contains(*dep))
                    .count();
                (id.as_str(), known)
            })
            .collect();

        let mut stages = Vec::new();
        let mut current: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree.get(id.as_str()) == Some(&0))
            .cloned()
            .collect();

        while !current.is_empty() {
            let mut next = Vec::new();

            for task_id in &current {
                let Some(dependents) = self.reverse_edges.get(task_id) else {
                    continue;
                };
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }

            next.sort_by_key(|id| self.position(id));
            next.dedup();
            stages.push(std::mem::replace(&mut current, next));
        }

        stages
    }

    /// Flattened visiting order for topological runs.
    ///
    /// Tasks that cannot be ordered (cycle members and their dependants) are
    /// appended in registration order so every task still gets an entry.
    pub fn execution_order(&self) -> Vec<String> {
        let mut order: Vec<String> = self.stages().into_iter().flatten().collect();
        let placed: HashSet<String> = order.iter().cloned().collect();
        order.extend(
            self.insertion_order
                .iter()
                .filter(|id| !placed.contains(*id))
                .cloned(),
        );
        order
    }

    /// Stages for a graph that passed `validate`.
    pub fn topological_sort(&self) -> Result<Vec<Vec<String>>, ExecutorError> {
        self.validate()?;
        Ok(self.stages())
    }

    fn dependencies_of(&self, task_id: &str) -> &[String] {
        self.edges.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn position(&self, task_id: &str) -> usize {
        self.insertion_order
            .iter()
            .position(|k| k == task_id)
            .unwrap_or(usize::MAX)
    }

    /// Depth-first search for a cycle, reported as `a -> b -> a`.
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(stack.join(" -> "));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        for dep in self.dependencies_of(node) {
            if let Some(pos) = stack.iter().position(|x| x == dep) {
                stack.push(dep.clone());
                *stack = stack[pos..].to_vec();
                return true;
            }

            if self.nodes.contains(dep)
                && !visited.contains(dep)
                && self.dfs_cycle(dep, visited, stack)
            {
                return true;
            }
        }

        stack.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Node(String, Vec<String>);

    impl TaskLike for Node {
        fn id(&self) -> &str {
            &self.0
        }
        fn dependencies(&self) -> &[String] {
            &self.1
        }
    }

    fn node(id: &str, deps: &[&str]) -> Node {
        Node(id.to_string(), deps.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_stages_follow_dependencies() {
        let graph = TaskGraph::from_tasks(&[
            node("pre_pitch", &["mental_drivers", "market_analysis"]),
            node("mental_drivers", &["market_analysis"]),
            node("market_analysis", &["web_research"]),
            node("web_research", &[]),
            node("future_predictions", &["web_research"]),
        ])
        .unwrap();

        assert_eq!(
            graph.stages(),
            vec![
                vec!["web_research".to_string()],
                vec!["market_analysis".to_string(), "future_predictions".to_string()],
                vec!["mental_drivers".to_string()],
                vec!["pre_pitch".to_string()],
            ]
        );
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = TaskGraph::from_tasks(&[node("a", &[]), node("a", &[])]).unwrap_err();
        assert_eq!(err, ExecutorError::DuplicateTask("a".into()));
    }

    #[test]
    fn test_missing_dependency() {
        let graph = TaskGraph::from_tasks(&[node("a", &["ghost"])]).unwrap();
        assert_eq!(
            graph.validate(),
            Err(ExecutorError::DependencyNotFound {
                task: "a".into(),
                missing_dep: "ghost".into(),
            })
        );
        // Still ordered; the gate rejects it at run time.
        assert_eq!(graph.execution_order(), vec!["a".to_string()]);
    }

    #[test]
    fn test_cycle_detected_and_appended() {
        let graph = TaskGraph::from_tasks(&[
            node("x", &["y"]),
            node("y", &["x"]),
            node("z", &[]),
        ])
        .unwrap();

        match graph.validate() {
            Err(ExecutorError::CircularDependency(path)) => {
                assert!(path.contains("x -> y") || path.contains("y -> x"), "{path}");
            }
            other => panic!("expected cycle, got {other:?}"),
        }
        assert_eq!(
            graph.execution_order(),
            vec!["z".to_string(), "x".to_string(), "y".to_string()]
        );
        assert!(graph.topological_sort().is_err());
    }
}
