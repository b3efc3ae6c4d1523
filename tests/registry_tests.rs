//! Registry behavior as seen through typed references.

use std::sync::Arc;

use modelgraph::impl_reified;
use modelgraph::manifest::Manifest;
use modelgraph::{ErrorKind, ModelPath, ModelReference, ModelRegistry, UntypedReference};

#[derive(Debug, PartialEq)]
struct Task {
    command: String,
}

#[derive(Debug, PartialEq)]
struct Job;

impl_reified!(Task, Job => "Task");

fn task(command: &str) -> Task {
    Task {
        command: command.to_string(),
    }
}

fn populated() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .register(&ModelReference::<Vec<String>>::of("tasks").unwrap(), vec![])
        .unwrap();
    registry
        .register(&ModelReference::of("tasks.compile").unwrap(), task("rustc"))
        .unwrap();
    registry
        .register(&ModelReference::of("tasks.test").unwrap(), task("cargo test"))
        .unwrap();
    registry
}

#[cfg(test)]
mod lookup_tests {
    use super::*;

    #[test]
    fn test_reference_reads_its_value() {
        let registry = populated();
        let compile = ModelReference::<Task>::of("tasks.compile").unwrap();
        assert_eq!(registry.get(&compile).unwrap(), &task("rustc"));
    }

    #[test]
    fn test_cached_reference_is_reusable_across_snapshots() {
        let mut registry = populated();
        let compile = ModelReference::<Task>::of("tasks.compile").unwrap();
        let before = registry.snapshot();
        registry.remove(compile.path()).unwrap();
        assert_eq!(registry.get(&compile).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(before.get(&compile).unwrap().command, "rustc");
    }

    #[test]
    fn test_wrong_type_is_a_mismatch() {
        let registry = populated();
        let err = registry
            .get(&ModelReference::<String>::of("tasks.compile").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("expected String"), "{err}");
    }

    #[test]
    fn test_descriptor_collision_is_caught_by_downcast() {
        let registry = populated();
        let job = ModelReference::<Job>::of("tasks.compile").unwrap();
        assert_eq!(job.erase(), ModelReference::<Task>::of("tasks.compile").unwrap().erase());
        assert_eq!(registry.get(&job).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_shared_values_outlive_the_registry() {
        let registry = populated();
        let shared = registry
            .get_shared(&ModelReference::<Task>::of("tasks.test").unwrap())
            .unwrap();
        drop(registry);
        assert_eq!(Arc::strong_count(&shared), 1);
        assert_eq!(shared.command, "cargo test");
    }

    #[test]
    fn test_concurrent_readers_share_one_key() {
        let registry = Arc::new(populated());
        let key = Arc::new(ModelReference::<Task>::of("tasks.compile").unwrap());
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let key = Arc::clone(&key);
                std::thread::spawn(move || registry.get(&key).map(|t| t.command.clone()))
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap().unwrap(), "rustc");
        }
    }
}

#[cfg(test)]
mod structure_tests {
    use super::*;

    #[test]
    fn test_children_are_direct_only() {
        let mut registry = populated();
        registry
            .register(&ModelReference::<u32>::of("tasks.compile.retries").unwrap(), 3)
            .unwrap();
        let tasks = ModelPath::parse("tasks").unwrap();
        let children: Vec<String> = registry
            .children(&tasks)
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(children, vec!["tasks.compile", "tasks.test"]);
    }

    #[test]
    fn test_remove_prunes_the_subtree() {
        let mut registry = populated();
        let removed = registry.remove(&ModelPath::parse("tasks").unwrap()).unwrap();
        assert_eq!(removed, 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_rules() {
        let mut registry = populated();
        let err = registry
            .register(&ModelReference::of("tasks.compile").unwrap(), task("again"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicatePath);

        let err = registry
            .register(&ModelReference::of("builds.release").unwrap(), task("x"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParent);
    }

    #[test]
    fn test_declared_nodes_resolve_but_are_unbound() {
        let manifest = Manifest::from_yaml_str(
            "nodes:\n  - { path: tasks, type: \"Vec<String>\" }\n  - { path: tasks.compile, type: Task }\n",
            "inline",
        )
        .unwrap();
        let registry = manifest.build_registry().unwrap();
        let untyped = UntypedReference::parse("tasks.compile", "Task").unwrap();
        assert!(!registry.resolve(&untyped).unwrap().is_bound());
        assert!(registry
            .resolve_assignable(&UntypedReference::parse("tasks", "Vec").unwrap())
            .is_ok());

        let err = registry
            .get(&ModelReference::<Task>::of("tasks.compile").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unbound);
    }
}
