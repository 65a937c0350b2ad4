//! Manifest definition and run order

use super::service::Service;
use crate::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Application manifest: a named set of services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

impl Manifest {
    /// Build a manifest from already-named services.
    pub fn from_services(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|service| (service.name.clone(), service))
                .collect(),
        }
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Services in the order they must be processed.
    ///
    /// Dependencies always precede their dependents; otherwise services are
    /// ordered by name. With `target`, only that service and its transitive
    /// dependencies are returned.
    pub fn run_order(&self, target: Option<&str>) -> Result<Vec<&Service>> {
        let roots: Vec<&str> = match target {
            Some(name) => {
                let (key, _) = self
                    .services
                    .get_key_value(name)
                    .ok_or_else(|| ManifestError::ServiceNotFound(name.to_string()))?;
                vec![key.as_str()]
            }
            None => self.services.keys().map(String::as_str).collect(),
        };

        let mut state: HashMap<&str, Visit> = HashMap::new();
        let mut order = Vec::with_capacity(roots.len());
        let mut path = Vec::new();

        for root in roots {
            self.visit(root, &mut state, &mut path, &mut order)?;
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        state: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<&'a Service>,
    ) -> Result<()> {
        match state.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(name);
                return Err(ManifestError::CircularDependency(cycle.join(" -> ")));
            }
            None => {}
        }

        let service = self
            .services
            .get(name)
            .ok_or_else(|| ManifestError::ServiceNotFound(name.to_string()))?;

        state.insert(name, Visit::InProgress);
        path.push(name);

        let mut deps = service.dependencies();
        deps.sort_unstable();

        for dep in deps {
            if !self.services.contains_key(dep) {
                return Err(ManifestError::UnknownDependency {
                    service: name.to_string(),
                    dependency: dep.to_string(),
                });
            }
            self.visit(dep, state, path, order)?;
        }

        path.pop();
        state.insert(name, Visit::Done);
        order.push(service);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, deps: &[&str]) -> Service {
        Service {
            name: name.to_string(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    fn names(services: &[&Service]) -> Vec<String> {
        services.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_run_order_dependencies_first() {
        let manifest = Manifest::from_services([
            service("api", &["db", "cache"]),
            service("cache", &[]),
            service("db", &[]),
            service("web", &["api"]),
        ]);

        let order = manifest.run_order(None).unwrap();
        assert_eq!(names(&order), vec!["cache", "db", "api", "web"]);
    }

    #[test]
    fn test_run_order_target_includes_dependencies_only() {
        let manifest = Manifest::from_services([
            service("api", &["db"]),
            service("db", &[]),
            service("web", &["api"]),
            service("worker", &[]),
        ]);

        let order = manifest.run_order(Some("api")).unwrap();
        assert_eq!(names(&order), vec!["db", "api"]);
    }

    #[test]
    fn test_run_order_outlives_target_name() {
        let manifest = Manifest::from_services([service("api", &["db"]), service("db", &[])]);

        let target = String::from("api");
        let order = manifest.run_order(Some(&target)).unwrap();
        drop(target);

        assert_eq!(names(&order), vec!["db", "api"]);
    }

    #[test]
    fn test_run_order_unknown_target() {
        let manifest = Manifest::from_services([service("api", &[])]);

        let result = manifest.run_order(Some("missing"));
        assert!(matches!(result, Err(ManifestError::ServiceNotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_run_order_unknown_dependency() {
        let manifest = Manifest::from_services([service("api", &["db"])]);

        let result = manifest.run_order(None);
        assert!(matches!(
            result,
            Err(ManifestError::UnknownDependency { ref service, ref dependency })
                if service == "api" && dependency == "db"
        ));
    }

    #[test]
    fn test_run_order_detects_cycle() {
        let manifest = Manifest::from_services([
            service("a", &["b"]),
            service("b", &["c"]),
            service("c", &["a"]),
        ]);

        match manifest.run_order(None) {
            Err(ManifestError::CircularDependency(cycle)) => {
                assert_eq!(cycle, "a -> b -> c -> a");
            }
            other => panic!("expected circular dependency, got {:?}", other),
        }
    }

    #[test]
    fn test_run_order_shared_dependency_listed_once() {
        let manifest = Manifest::from_services([
            service("a", &["db"]),
            service("b", &["db"]),
            service("db", &[]),
        ]);

        let order = manifest.run_order(None).unwrap();
        assert_eq!(names(&order), vec!["db", "a", "b"]);
    }
}
