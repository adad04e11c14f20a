//! End-to-end tests of the resolution engine through the public API.

use std::sync::Arc;

use fairway::host::memory::{MemoryHost, MemorySink, MemoryStore};
use fairway::{
    Container, ContainerInitializer, DeltaFlags, EntryKind, EntryPath, KindMask, PathEntry,
    ProjectId, ResolverBuilder, ResolverConfig, ResolverService,
};

fn lenient_config() -> ResolverConfig {
    let mut config = ResolverConfig::default();
    config.validation.check_existence = false;
    config
}

fn build_service(
    projects: Vec<(ProjectId, Vec<PathEntry>)>,
) -> (Arc<ResolverService>, Arc<MemorySink>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut store = MemoryStore::new();
    let mut host = MemoryHost::new();
    for (project, entries) in projects {
        store = store.with_project(project, entries);
        host = host.with_open_project(project);
    }

    let sink = Arc::new(MemorySink::new());
    let service = ResolverBuilder::new(Arc::new(store), Arc::new(host))
        .sink(sink.clone())
        .config(lenient_config())
        .build();
    (Arc::new(service), sink)
}

fn include_at(attached: &str, dir: &str) -> PathEntry {
    PathEntry::include(EntryPath::parse(attached), EntryPath::external(dir), false)
}

#[test]
fn include_lookup_orders_by_specificity() {
    let proj = ProjectId::new("proj");
    let (service, _) = build_service(vec![(
        proj,
        vec![
            include_at("/proj", "/top"),
            include_at("/proj/src", "/mid"),
            include_at("/proj/src/sub", "/near"),
        ],
    )]);

    let unit = EntryPath::parse("/proj/src/sub/a.c");
    let includes = service.include_entries(&proj, &unit).unwrap();

    let attached: Vec<String> = includes.iter().map(|e| e.path.to_string()).collect();
    assert_eq!(attached, ["/proj/src/sub", "/proj/src", "/proj"]);
}

#[test]
fn nearer_macro_definition_shadows_outer_scope() {
    let proj = ProjectId::new("proj");
    let (service, _) = build_service(vec![(
        proj,
        vec![
            PathEntry::macro_def(EntryPath::parse("/proj"), "NDEBUG", "0"),
            PathEntry::macro_def(EntryPath::parse("/proj/src"), "NDEBUG", "1"),
        ],
    )]);

    let unit = EntryPath::parse("/proj/src/a.c");
    let macros = service.macro_entries(&proj, &unit).unwrap();

    assert_eq!(macros.len(), 1);
    assert!(matches!(
        &macros[0].detail,
        fairway::EntryDetail::Macro { value, .. } if value == "1"
    ));
}

#[test]
fn nested_source_is_fine_when_excluded_and_diagnosed_when_not() {
    let proj = ProjectId::new("proj");
    let (service, sink) = build_service(vec![(
        proj,
        vec![
            PathEntry::source(EntryPath::parse("/proj/src")).with_exclusions(["gen/*"]),
            PathEntry::source(EntryPath::parse("/proj/src/gen")),
            PathEntry::source(EntryPath::parse("/proj/src/other")),
        ],
    )]);

    let entries = service.resolved_entries(&proj).unwrap();
    assert_eq!(entries.len(), 3);

    service.flush_diagnostics();
    let batch = sink.batch(&proj);
    assert_eq!(batch.len(), 1);
    assert!(batch[0].message.contains("/proj/src/other"));
}

#[test]
fn two_equal_source_entries_leave_one_and_one_diagnostic() {
    let proj = ProjectId::new("proj");
    let entry = PathEntry::source(EntryPath::parse("/proj/src"));
    let (service, sink) = build_service(vec![(proj, vec![entry.clone(), entry])]);

    let entries = service.resolved_entries(&proj).unwrap();
    assert_eq!(entries.len(), 1);

    service.flush_diagnostics();
    assert_eq!(sink.batch(&proj).len(), 1);
}

#[test]
fn exported_entries_propagate_through_a_reference_cycle() {
    let app = ProjectId::new("app");
    let lib = ProjectId::new("lib");
    let base = ProjectId::new("base");

    let (service, _) = build_service(vec![
        (
            app,
            vec![
                include_at("/app", "/app-inc"),
                PathEntry::project_ref(EntryPath::parse("/lib")),
            ],
        ),
        (
            lib,
            vec![
                include_at("/lib", "/lib-inc").exported(),
                PathEntry::project_ref(EntryPath::parse("/base")),
            ],
        ),
        (
            base,
            vec![
                PathEntry::macro_def(EntryPath::parse("/base"), "BASE", "1").exported(),
                // Cycle back to the root; the walk must terminate.
                PathEntry::project_ref(EntryPath::parse("/app")),
            ],
        ),
    ]);

    let unit = EntryPath::parse("/app/main.c");
    let effective = service
        .entries_for(&app, &unit, KindMask::INCLUDE | KindMask::MACRO)
        .unwrap();

    let rendered: Vec<String> = effective
        .iter()
        .map(|e| match e.kind() {
            EntryKind::Include => e.target_path().unwrap().to_string(),
            _ => e.macro_name().unwrap().to_string(),
        })
        .collect();

    // Own entries first, referenced projects' exports after, each once.
    assert_eq!(rendered, ["/app-inc", "/lib-inc", "BASE"]);
}

#[test]
fn on_demand_container_is_queried_live_and_never_cached() {
    struct PerFileContainer {
        path: EntryPath,
    }

    impl Container for PerFileContainer {
        fn path(&self) -> &EntryPath {
            &self.path
        }

        fn description(&self) -> String {
            "per-file SDK settings".to_string()
        }

        fn entries(&self) -> Vec<PathEntry> {
            Vec::new()
        }

        fn on_demand(&self) -> bool {
            true
        }

        fn entries_for(&self, path: &EntryPath, mask: KindMask) -> Vec<PathEntry> {
            if !mask.selects(EntryKind::Include) {
                return Vec::new();
            }
            // Only C sources under /proj/src get the extra include.
            if EntryPath::parse("/proj/src").is_prefix_of(path) {
                vec![include_at("/proj/src", "/sdk-inc")]
            } else {
                Vec::new()
            }
        }
    }

    let proj = ProjectId::new("proj");
    let (service, _) = build_service(vec![(
        proj,
        vec![
            include_at("/proj", "/top"),
            PathEntry::container(EntryPath::parse("sdk/v1")),
        ],
    )]);

    service.set_container(
        &[proj],
        Arc::new(PerFileContainer {
            path: EntryPath::parse("sdk/v1"),
        }),
    );

    // Cached list holds no container-kind entry and nothing from the
    // on-demand container.
    let resolved = service.resolved_entries(&proj).unwrap();
    assert!(resolved.iter().all(|e| e.kind() != EntryKind::Container));
    assert_eq!(resolved.len(), 1);

    let covered = service
        .include_entries(&proj, &EntryPath::parse("/proj/src/a.c"))
        .unwrap();
    let dirs: Vec<String> = covered
        .iter()
        .map(|e| e.target_path().unwrap().to_string())
        .collect();
    assert_eq!(dirs, ["/sdk-inc", "/top"]);

    let uncovered = service
        .include_entries(&proj, &EntryPath::parse("/proj/docs/readme.c"))
        .unwrap();
    let dirs: Vec<String> = uncovered
        .iter()
        .map(|e| e.target_path().unwrap().to_string())
        .collect();
    assert_eq!(dirs, ["/top"]);
}

#[test]
fn pure_reorder_yields_exactly_one_delta() {
    let proj = ProjectId::new("proj");
    let a = PathEntry::source(EntryPath::parse("/proj/a"));
    let b = PathEntry::source(EntryPath::parse("/proj/b"));
    let c = PathEntry::source(EntryPath::parse("/proj/c"));

    let (service, _) = build_service(vec![(proj, vec![a.clone(), b.clone(), c.clone()])]);
    service.resolve(&proj).unwrap();

    let deltas = service.set_raw_entries(&proj, vec![a, c, b]).unwrap();
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].flags, DeltaFlags::REORDERED);
}

#[test]
fn removing_one_entry_yields_exactly_one_removal_delta() {
    let proj = ProjectId::new("proj");
    let a = PathEntry::source(EntryPath::parse("/proj/a"));
    let b = PathEntry::source(EntryPath::parse("/proj/b"));

    let (service, _) = build_service(vec![(proj, vec![a.clone(), b])]);
    service.resolve(&proj).unwrap();

    let deltas = service.set_raw_entries(&proj, vec![a]).unwrap();
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].flags, DeltaFlags::SOURCE_REMOVED);
}

#[test]
fn failing_provider_becomes_a_diagnostic_not_an_error() {
    struct BrokenInitializer;

    impl ContainerInitializer for BrokenInitializer {
        fn initialize(
            &self,
            _container_path: &EntryPath,
            _project: &ProjectId,
            _service: &ResolverService,
        ) -> anyhow::Result<()> {
            anyhow::bail!("backing plugin is gone")
        }
    }

    let proj = ProjectId::new("proj");
    let store = MemoryStore::new().with_project(
        proj,
        vec![
            PathEntry::source(EntryPath::parse("/proj/src")),
            PathEntry::container(EntryPath::parse("sdk/v1")),
        ],
    );
    let sink = Arc::new(MemorySink::new());
    let service = ResolverBuilder::new(
        Arc::new(store),
        Arc::new(MemoryHost::new().with_open_project(proj)),
    )
    .sink(sink.clone())
    .config(lenient_config())
    .initializer("sdk", Arc::new(BrokenInitializer))
    .build();

    // Resolution still succeeds with the container treated as empty.
    let entries = service.resolved_entries(&proj).unwrap();
    assert_eq!(entries.len(), 1);

    service.flush_diagnostics();
    let batch = sink.batch(&proj);
    assert!(batch
        .iter()
        .any(|d| d.message.contains("container provider `sdk` failed")));
}

#[test]
fn concurrent_resolution_and_invalidation_settle_consistently() {
    let proj = ProjectId::new("proj");
    let expected = vec![
        PathEntry::source(EntryPath::parse("/proj/src")),
        include_at("/proj", "/usr/include"),
    ];
    let (service, _) = build_service(vec![(proj, expected.clone())]);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..25 {
                let entries = service.resolved_entries(&proj).unwrap();
                // A reader sees a complete list or a complete list,
                // never a partial one.
                assert!(entries.len() == 2);
            }
        }));
    }
    {
        let service = service.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..25 {
                service.invalidate(&proj);
                std::thread::yield_now();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.resolved_entries(&proj).unwrap(), expected);
}
