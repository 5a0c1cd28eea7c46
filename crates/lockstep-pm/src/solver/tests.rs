//! Resolution seam tests.
//!
//! Drive pool, policy and request through the greedy test solver to check the
//! contract every solver is held to: root and platform entries are never
//! operated on, aliases resolve to the package they wrap, and unsatisfiable
//! requests report their problems.

use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::{Stability, VersionParser};

use super::*;
use crate::package::{Package, RootAlias};
use crate::testing::GreedySolver;

fn pkg(name: &str, version: &str) -> Package {
    Package::new(name, version)
}

fn pkg_with_requires(name: &str, version: &str, requires: Vec<(&str, &str)>) -> Package {
    let mut p = Package::new(name, version);
    for (target, constraint) in requires {
        p.add_require(target, constraint).unwrap();
    }
    p
}

fn pkg_with_replaces(name: &str, version: &str, replaces: Vec<(&str, &str)>) -> Package {
    let mut p = Package::new(name, version);
    for (target, constraint) in replaces {
        p.add_replace(target, constraint).unwrap();
    }
    p
}

fn constraint(c: &str) -> lockstep_semver::VersionConstraint {
    VersionParser::new().parse_constraints(c).unwrap()
}

fn remote(pool: &mut Pool, packages: Vec<Package>) {
    for p in packages {
        pool.add_package(Arc::new(p), RepoKind::Remote("packagist".into()));
    }
}

fn installed(pool: &mut Pool, packages: Vec<Package>) -> InstalledRepository {
    let repo = InstalledRepository::in_memory(packages);
    for p in repo.packages() {
        pool.add_package(Arc::clone(p), RepoKind::Installed);
    }
    repo
}

/// Compare operations as (job, name, normalized version) triples, order ignored
fn check_solver_result(operations: &[Operation], expected: Vec<(&str, &str, &str)>) {
    let mut actual: Vec<(String, String, String)> = operations
        .iter()
        .map(|op| match op {
            Operation::Install(p) => ("install".to_string(), p.name.clone(), p.version.clone()),
            Operation::Update { from, to } => (
                "update".to_string(),
                to.name.clone(),
                format!("{} -> {}", from.version, to.version),
            ),
            Operation::Uninstall(p) => ("remove".to_string(), p.name.clone(), p.version.clone()),
        })
        .collect();
    let mut expected: Vec<(String, String, String)> = expected
        .into_iter()
        .map(|(j, n, v)| (j.to_string(), n.to_string(), v.to_string()))
        .collect();

    actual.sort();
    expected.sort();
    assert_eq!(actual, expected);
}

fn solve(pool: &Pool, installed: &InstalledRepository, request: &Request) -> Result<Vec<Operation>, SolverError> {
    GreedySolver.solve(&Policy::new(), pool, installed, request)
}

// ============================================================================
// Installation
// ============================================================================

#[test]
fn test_solver_install_with_dependencies() {
    let mut pool = Pool::default();
    remote(
        &mut pool,
        vec![
            pkg_with_requires("a/a", "1.0.0", vec![("b/b", "^1.0")]),
            pkg("b/b", "1.0.0"),
            pkg("b/b", "1.2.0"),
            pkg("b/b", "2.0.0"),
        ],
    );
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("a/a", constraint("*")).unwrap();

    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(&ops, vec![("install", "a/a", "1.0.0.0"), ("install", "b/b", "1.2.0.0")]);
}

#[test]
fn test_solver_prefer_lowest() {
    let mut pool = Pool::default();
    remote(&mut pool, vec![pkg("a/a", "1.0.0"), pkg("a/a", "1.1.0")]);
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("a/a", constraint("^1.0")).unwrap();

    let ops = GreedySolver
        .solve(&Policy::new().prefer_lowest(true), &pool, &repo, &request)
        .unwrap();
    check_solver_result(&ops, vec![("install", "a/a", "1.0.0.0")]);
}

#[test]
fn test_solver_replacer_satisfies_requirement() {
    let mut pool = Pool::default();
    remote(
        &mut pool,
        vec![
            pkg_with_requires("a/a", "1.0.0", vec![("b/b", "^1.0")]),
            pkg_with_replaces("c/c", "1.0.0", vec![("b/b", "^1.0")]),
        ],
    );
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("a/a", constraint("*")).unwrap();

    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(&ops, vec![("install", "a/a", "1.0.0.0"), ("install", "c/c", "1.0.0.0")]);
}

// ============================================================================
// Updates and removals
// ============================================================================

#[test]
fn test_solver_keeps_installed_without_update_all() {
    let mut pool = Pool::default();
    remote(&mut pool, vec![pkg("a/a", "1.0.0"), pkg("a/a", "1.1.0")]);
    let repo = installed(&mut pool, vec![pkg("a/a", "1.0.0")]);

    let mut request = Request::new();
    request.install("a/a", constraint("^1.0")).unwrap();

    assert!(solve(&pool, &repo, &request).unwrap().is_empty());

    request.update_all();
    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(&ops, vec![("update", "a/a", "1.0.0.0 -> 1.1.0.0")]);
}

#[test]
fn test_solver_removes_unrequested_packages() {
    let mut pool = Pool::default();
    let repo = installed(&mut pool, vec![pkg("a/a", "1.0.0"), pkg("b/b", "1.0.0")]);

    let mut request = Request::new();
    request.install("a/a", constraint("1.0.0")).unwrap();
    request.remove("b/b", constraint("1.0.0")).unwrap();

    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(&ops, vec![("remove", "b/b", "1.0.0.0")]);
}

// ============================================================================
// Fixed entries
// ============================================================================

#[test]
fn test_solver_never_operates_on_root_or_platform() {
    let mut pool = Pool::default();
    let root = pkg_with_requires("acme/app", "1.0.0", vec![("php", ">=8.1"), ("a/a", "^1.0")]);
    pool.add_package(Arc::new(root), RepoKind::Root);
    pool.add_package(Arc::new(pkg("php", "8.2.0")), RepoKind::Platform);
    remote(&mut pool, vec![pkg("a/a", "1.0.0")]);
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("acme/app", constraint("1.0.0")).unwrap();
    request.install("php", constraint("8.2.0")).unwrap();

    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(&ops, vec![("install", "a/a", "1.0.0.0")]);
}

#[test]
fn test_solver_alias_resolves_to_base_package() {
    let mut pool = Pool::default();
    let base = Arc::new(pkg("a/a", "dev-master"));
    let alias = RootAlias {
        package: "a/a".into(),
        version: base.version.clone(),
        alias: "1.0.x-dev".into(),
        alias_normalized: VersionParser::new().normalize("1.0.x-dev").unwrap(),
    };
    pool.add_package(Arc::clone(&base), RepoKind::Remote("packagist".into()));
    pool.add_alias(alias.to_alias_package(Arc::clone(&base)), RepoKind::Remote("packagist".into()));
    remote(&mut pool, vec![pkg_with_requires("b/b", "1.0.0", vec![("a/a", "1.0.x-dev")])]);
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("b/b", constraint("*")).unwrap();
    request.install("a/a", constraint("dev-master")).unwrap();

    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(
        &ops,
        vec![("install", "b/b", "1.0.0.0"), ("install", "a/a", base.version.as_str())],
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_solver_reports_missing_package() {
    let mut pool = Pool::default();
    remote(&mut pool, vec![pkg_with_requires("a/a", "1.0.0", vec![("missing/pkg", "^1.0")])]);
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("a/a", constraint("*")).unwrap();

    let SolverError::Unsatisfiable { problems } = solve(&pool, &repo, &request).unwrap_err();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].contains("missing/pkg"));
}

#[test]
fn test_solver_does_not_see_unstable_candidates() {
    let mut pool = Pool::new(Stability::Stable, IndexMap::new());
    remote(&mut pool, vec![pkg("a/a", "1.0.0-beta1")]);
    let repo = installed(&mut pool, vec![]);

    let mut request = Request::new();
    request.install("a/a", constraint("1.0.0-beta1")).unwrap();
    assert!(solve(&pool, &repo, &request).is_err());

    let mut flags = IndexMap::new();
    flags.insert("a/a".to_string(), Stability::Beta);
    let mut pool = Pool::new(Stability::Stable, flags);
    remote(&mut pool, vec![pkg("a/a", "1.0.0-beta1")]);
    let ops = solve(&pool, &repo, &request).unwrap();
    check_solver_result(&ops, vec![("install", "a/a", "1.0.0.0-beta1")]);
}
