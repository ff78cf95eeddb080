//! End-to-end pipeline behavior over realistic skill sets

use skillgate_engine::{Engine, SkillDirectories, SkillError, SkillSource};
use skillgate_types::{Artifact, Budget, ModuleKind};
use std::fs;

const SPECIAL: &str = "---
name: skill-a
description: Guidance for special files
triggers:
  paths: ['**/*.special']
core: { id: A-core, size: 100 }
modules:
  - { id: A-detail, triggers: [lock], size: 50 }
---
Core guidance for special files.
";

const SPRING: &str = "---
name: spring-review
version: 2.0.0
description: Spring service review
triggers:
  paths: ['**/*.java']
  annotations: ['@Service', '@Transactional']
core: { size: 40 }
modules:
  - id: spring-transactions
    triggers: ['@Transactional']
    concerns: [transactions]
    size: 30
  - id: spring-beans
    triggers: ['@Autowired']
    size: 20
---
Spring core.
";

const JPA: &str = "---
name: jpa-review
version: 1.0.0
description: JPA persistence review
triggers:
  lexical: ['@Transactional']
core: { size: 40 }
modules:
  - id: jpa-transactions
    triggers: ['@Transactional', { regex: 'EntityManager' }]
    concerns: [transactions]
    size: 30
---
JPA core.
";

fn special_source() -> SkillSource {
    SkillSource::inline("special", SPECIAL).with_body("A-detail.md", "Lock detail.")
}

fn java_engine() -> Engine {
    Engine::from_sources(vec![
        SkillSource::inline("spring", SPRING)
            .with_body("spring-transactions.md", "Spring transactions.")
            .with_body("spring-beans.md", "Spring beans."),
        SkillSource::inline("jpa", JPA).with_body("jpa-transactions.md", "JPA transactions."),
    ])
    .expect("Failed to load skills")
}

#[test]
fn test_detail_skipped_for_budget() {
    let engine = Engine::from_sources(vec![special_source()]).unwrap();
    let artifact = Artifact::new("x/y.special", "uses lock here");

    let composed = engine.review(&artifact, Budget::new(120)).unwrap();
    let manifest = &composed.manifest;

    assert_eq!(manifest.included_modules(), vec!["A-core"]);
    assert_eq!(manifest.total_size, 100);
    assert_eq!(manifest.skipped_for_budget.len(), 1);
    assert_eq!(manifest.skipped_for_budget[0].module, "A-detail");
    assert_eq!(manifest.skipped_for_budget[0].size, 50);
    assert_eq!(manifest.skipped_for_budget[0].remaining, 20);
    assert!(composed.text.contains("Core guidance for special files."));
    assert!(!composed.text.contains("Lock detail."));
}

#[test]
fn test_cross_skill_concern_deduplicated() {
    let engine = java_engine();
    let artifact = Artifact::new(
        "src/main/java/OrderService.java",
        "@Service\npublic class OrderService {\n  @Transactional\n  void place() {}\n}\n",
    );

    let composed = engine.review(&artifact, Budget::new(1_000)).unwrap();
    let manifest = &composed.manifest;

    // spring: path + 2 tokens = 4, jpa: 1 token = 1
    assert_eq!(
        manifest.included_modules(),
        vec!["spring-review-core", "jpa-review-core", "spring-transactions"]
    );
    assert_eq!(manifest.skipped_duplicate.len(), 1);
    assert_eq!(manifest.skipped_duplicate[0].module, "jpa-transactions");
    assert_eq!(manifest.skipped_duplicate[0].retained_module, "spring-transactions");
    assert_eq!(manifest.skipped_duplicate[0].concern, "transactions");
    assert_eq!(manifest.total_size, 110);
}

#[test]
fn test_budget_too_small_for_core() {
    let engine = Engine::from_sources(vec![special_source()]).unwrap();
    let artifact = Artifact::new("x/y.special", "");

    let err = engine.review(&artifact, Budget::new(50)).unwrap_err();
    assert!(matches!(
        err,
        SkillError::BudgetTooSmall {
            required: 100,
            budget: 50,
            ..
        }
    ));
    assert!(!err.is_configuration());
}

#[test]
fn test_core_that_no_longer_fits_drops_whole_skill() {
    let engine = java_engine();
    let artifact = Artifact::new("OrderService.java", "@Service @Transactional");

    // room for one 40-unit core only
    let composed = engine.review(&artifact, Budget::new(60)).unwrap();
    let manifest = &composed.manifest;

    assert_eq!(manifest.included_modules(), vec!["spring-review-core"]);
    assert_eq!(manifest.skipped_skills.len(), 1);
    assert_eq!(manifest.skipped_skills[0].skill.name, "jpa-review");
    assert_eq!(manifest.skipped_for_budget[0].module, "spring-transactions");
    assert!(manifest
        .skipped_for_budget
        .iter()
        .all(|skip| skip.module != "spring-review-core" && skip.module != "jpa-review-core"));
}

#[test]
fn test_manifest_invariants() {
    let engine = java_engine();
    let artifacts = [
        Artifact::new("A.java", "@Service @Autowired @Transactional EntityManager"),
        Artifact::new("B.kt", "@Transactional EntityManager"),
        Artifact::new("README.md", "nothing relevant"),
    ];

    for budget in [40, 80, 100, 130, 1_000] {
        for artifact in &artifacts {
            let matches = engine.match_artifact(artifact);
            let composed = engine.review(artifact, Budget::new(budget)).unwrap();
            let manifest = &composed.manifest;

            let sum: usize = manifest.included.iter().map(|m| m.size).sum();
            assert_eq!(manifest.total_size, sum);
            assert!(manifest.total_size <= budget);

            for skill in manifest.included_skills() {
                assert!(matches.iter().any(|m| &m.skill == skill && !m.fired.is_empty()));
            }

            for skill in manifest.included_skills() {
                let first = manifest.included.iter().find(|m| &m.skill == skill).unwrap();
                assert_eq!(first.kind, ModuleKind::Core);
                let marker = format!("<!-- skill: {} module: {} -->", skill, first.module);
                let core_pos = composed.text.find(&marker).unwrap();
                for entry in manifest.included.iter().filter(|m| &m.skill == skill) {
                    let pos = composed
                        .text
                        .find(&format!("<!-- skill: {} module: {} -->", skill, entry.module))
                        .unwrap();
                    assert!(core_pos <= pos);
                }
            }

            assert!(manifest.skipped_duplicate.iter().all(|d| !d.module.ends_with("-core")));
        }
    }
}

#[test]
fn test_idempotent_and_parallel_matches_sequential() {
    let engine = java_engine();
    let artifacts: Vec<Artifact> = (0..32)
        .map(|i| {
            let content = match i % 4 {
                0 => "@Service @Transactional",
                1 => "@Transactional EntityManager",
                2 => "@Autowired",
                _ => "plain",
            };
            Artifact::new(format!("src/File{}.java", i), content)
        })
        .collect();
    let budget = Budget::new(100);

    let sequential: Vec<_> = artifacts
        .iter()
        .map(|a| engine.review(a, budget).unwrap())
        .collect();
    let again: Vec<_> = artifacts
        .iter()
        .map(|a| engine.review(a, budget).unwrap())
        .collect();
    let parallel: Vec<_> = engine
        .review_batch(&artifacts, budget)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(sequential, again);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_load_from_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("special");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("SKILL.md"), SPECIAL).unwrap();
    fs::write(dir.join("A-detail.md"), "Lock detail.").unwrap();

    let sources = SkillDirectories::new()
        .add_directory(tmp.path())
        .discover()
        .unwrap();
    let engine = Engine::from_sources(sources).unwrap();

    let composed = engine
        .review(&Artifact::new("x/y.special", "lock"), Budget::new(500))
        .unwrap();
    assert_eq!(composed.manifest.included_modules(), vec!["A-core", "A-detail"]);
    assert!(composed.text.contains("Lock detail."));
}

#[test]
fn test_missing_module_file_is_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("special");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("SKILL.md"), SPECIAL).unwrap();

    let sources = SkillDirectories::new()
        .add_directory(tmp.path())
        .discover()
        .unwrap();
    let err = Engine::from_sources(sources).unwrap_err();
    assert!(err.is_configuration());
}
