//! Class hierarchy registry
//!
//! Maps every fully-qualified class name to its immediate superclass. The
//! root class is the only entry without a parent. Built during discovery,
//! validated once, then only queried.

use indexmap::IndexMap;
use fxhash::FxHashSet;

#[derive(Debug, Clone, Default)]
pub struct HierarchyRegistry {
    /// class -> immediate superclass, in registration order
    parents: IndexMap<String, Option<String>>,
}

impl HierarchyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) the edge `child -> parent`.
    ///
    /// `None` marks the root class.
    pub fn register_edge(&mut self, child: &str, parent: Option<&str>) {
        self.parents
            .insert(child.to_string(), parent.map(str::to_string));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.parents.contains_key(class)
    }

    pub fn parent(&self, class: &str) -> Option<&str> {
        self.parents.get(class).and_then(|parent| parent.as_deref())
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// The class itself followed by each ancestor up to the root.
    ///
    /// Stops early if the walk revisits a class, so a malformed registry
    /// cannot loop.
    pub fn ancestor_chain(&self, class: &str) -> Vec<String> {
        let mut chain = vec![class.to_string()];
        let mut seen = FxHashSet::default();
        seen.insert(class.to_string());

        let mut current = class;
        while let Some(parent) = self.parent(current) {
            if !seen.insert(parent.to_string()) {
                break;
            }
            chain.push(parent.to_string());
            current = parent;
        }
        chain
    }

    /// Number of superclass edges from `class` to the root.
    pub fn depth(&self, class: &str) -> usize {
        self.ancestor_chain(class).len() - 1
    }

    /// Walk `steps` edges up from `class`, stopping at the root.
    pub fn climb<'a>(&'a self, class: &'a str, steps: usize) -> &'a str {
        let mut current = class;
        for _ in 0..steps {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        self.ancestor_chain(class).iter().any(|c| c == ancestor)
    }

    /// Find an inheritance cycle, returned as the chain that closes it.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        for start in self.parents.keys() {
            let mut visited: IndexMap<&str, ()> = IndexMap::new();
            let mut current = start.as_str();
            loop {
                if visited.insert(current, ()).is_some() {
                    let begin = visited.get_index_of(current).unwrap_or(0);
                    let mut chain: Vec<String> = visited
                        .keys()
                        .skip(begin)
                        .map(|c| c.to_string())
                        .collect();
                    chain.push(current.to_string());
                    return Some(chain);
                }
                match self.parent(current) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }
        None
    }

    /// All registered classes, every ancestor before its descendants.
    /// Ties keep registration order.
    pub fn ancestors_first(&self) -> Vec<String> {
        let mut classes: Vec<(usize, usize, &String)> = self
            .parents
            .keys()
            .enumerate()
            .map(|(index, class)| (self.depth(class), index, class))
            .collect();
        classes.sort();
        classes.into_iter().map(|(_, _, class)| class.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HierarchyRegistry {
        let mut registry = HierarchyRegistry::new();
        registry.register_edge("java.lang.Object", None);
        registry.register_edge("p.C", Some("p.B"));
        registry.register_edge("p.A", Some("java.lang.Object"));
        registry.register_edge("p.B", Some("p.A"));
        registry
    }

    #[test]
    fn test_ancestor_chain_and_depth() {
        let registry = sample();
        assert_eq!(
            registry.ancestor_chain("p.C"),
            vec!["p.C", "p.B", "p.A", "java.lang.Object"]
        );
        assert_eq!(registry.depth("java.lang.Object"), 0);
        assert_eq!(registry.depth("p.C"), 3);
        assert_eq!(registry.depth("unknown.X"), 0);
    }

    #[test]
    fn test_depth_monotonic() {
        let registry = sample();
        for class in registry.classes() {
            if let Some(parent) = registry.parent(class) {
                assert_eq!(registry.depth(class), registry.depth(parent) + 1);
            }
        }
    }

    #[test]
    fn test_climb_saturates_at_root() {
        let registry = sample();
        assert_eq!(registry.climb("p.C", 0), "p.C");
        assert_eq!(registry.climb("p.C", 2), "p.A");
        assert_eq!(registry.climb("p.C", 10), "java.lang.Object");
    }

    #[test]
    fn test_cycle_detection() {
        let mut registry = sample();
        assert!(registry.find_cycle().is_none());

        registry.register_edge("p.A", Some("p.C"));
        let cycle = registry.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.len() >= 4);
        // bounded even with a cycle present
        assert!(registry.ancestor_chain("p.C").len() <= 3);
    }

    #[test]
    fn test_ancestors_first() {
        let registry = sample();
        let order = registry.ancestors_first();
        let pos = |c: &str| order.iter().position(|x| x == c).unwrap();
        assert!(pos("java.lang.Object") < pos("p.A"));
        assert!(pos("p.A") < pos("p.B"));
        assert!(pos("p.B") < pos("p.C"));
    }

    #[test]
    fn test_subclass() {
        let registry = sample();
        assert!(registry.is_subclass_of("p.C", "p.A"));
        assert!(!registry.is_subclass_of("p.A", "p.C"));
    }
}
