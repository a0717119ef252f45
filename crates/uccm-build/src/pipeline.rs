//! Build pipeline orchestrator.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use tracing::{info, warn};
use uccm_aggregate::{aggregate, Aggregated};
use uccm_board::Board;
use uccm_bind::{backend_for_family, render_legs_header, validate_bindings, BindingTable, BINDINGS_FILE, LEGS_HEADER};
use uccm_resolve::{resolve, Resolution};

use crate::catalog::{HeaderSource, SymbolKeyKind};
use crate::error::{ArtifactCollision, BuildError};
use crate::parse::parse_headers;
use crate::report::{ArtifactSummary, BuildReport};
use crate::stage::{commit, Artifact};

/// Everything one build invocation needs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub headers: Vec<HeaderSource>,
    pub board: Board,
    /// MCU family override; defaults to the board's family.
    pub family: Option<String>,
    /// Root header ids; `None` makes every active header a root.
    pub roots: Option<Vec<String>>,
    pub symbol_key: SymbolKeyKind,
    pub out_dir: PathBuf,
    /// Parser worker threads.
    pub workers: usize,
}

impl BuildRequest {
    pub fn new(board: Board, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            headers: Vec::new(),
            board,
            family: None,
            roots: None,
            symbol_key: SymbolKeyKind::default(),
            out_dir: out_dir.into(),
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }

    pub fn with_header(mut self, header: HeaderSource) -> Self {
        self.headers.push(header);
        self
    }

    pub fn family(&self) -> &str {
        self.family.as_deref().unwrap_or(&self.board.family)
    }
}

/// In-memory result of a build, before commit.
#[derive(Debug, Clone)]
pub struct Generated {
    pub resolution: Resolution,
    pub bindings: BindingTable,
    /// Artifacts sorted by file name.
    pub artifacts: Vec<Artifact>,
}

/// Parse and resolve only.
pub fn resolve_request(request: &BuildRequest) -> Result<Resolution, BuildError> {
    let headers = parse_headers(&request.headers, request.workers)?;
    if request.family.as_deref().is_some_and(|f| f != request.board.family) {
        warn!(
            board = %request.board.name,
            board_family = %request.board.family,
            family = request.family(),
            "family override differs from the board's family"
        );
    }
    resolve(&headers, request.family(), request.roots.as_deref()).map_err(BuildError::Resolve)
}

/// Run every stage up to, but not including, commit.
pub fn generate(request: &BuildRequest) -> Result<Generated, BuildError> {
    let resolution = resolve_request(request)?;
    let key = request.symbol_key.extractor();

    let (aggregated, bound) = thread::scope(|s| {
        let aggregate_job = s.spawn(|| aggregate(&resolution, key.as_ref()));
        let bind_job = s.spawn(|| validate_bindings(&resolution, &request.board));
        (
            aggregate_job.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
            bind_job.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
        )
    });

    let (aggregated, bindings) = match (aggregated, bound) {
        (Ok(a), Ok(b)) => (a, b),
        (a, b) => {
            return Err(BuildError::Generate {
                aggregate: a.err().unwrap_or_default(),
                bind: b.err().unwrap_or_default(),
            })
        }
    };

    check_artifact_names(&aggregated)?;

    let mut artifacts: Vec<Artifact> = aggregated
        .targets
        .values()
        .map(|t| Artifact::new(t.file_name(), t.text.clone()))
        .collect();
    artifacts.push(Artifact::new(BINDINGS_FILE, bindings.to_json()?));
    match backend_for_family(&bindings.family) {
        Some(backend) => {
            artifacts.push(Artifact::new(LEGS_HEADER, render_legs_header(&bindings, backend.as_ref())));
        }
        None => warn!(family = %bindings.family, "no peripheral backend; {LEGS_HEADER} not generated"),
    }
    artifacts.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Generated {
        resolution,
        bindings,
        artifacts,
    })
}

/// Every target must own its file name. `bindings.json` and `uccm_legs.h`
/// are reserved even when no backend renders the latter.
fn check_artifact_names(aggregated: &Aggregated) -> Result<(), BuildError> {
    let mut owners = BTreeMap::from([
        (BINDINGS_FILE.to_string(), "the binding table".to_string()),
        (LEGS_HEADER.to_string(), "the leg accessor header".to_string()),
    ]);
    let mut collisions = Vec::new();
    for target in aggregated.targets.values() {
        let owner = format!("append target {}", target.name);
        match owners.entry(target.file_name()) {
            Entry::Vacant(slot) => {
                slot.insert(owner);
            }
            Entry::Occupied(slot) => collisions.push(ArtifactCollision {
                file: slot.key().clone(),
                first: slot.get().clone(),
                second: owner,
            }),
        }
    }
    if collisions.is_empty() {
        Ok(())
    } else {
        Err(BuildError::Collision(collisions))
    }
}

/// Run the full pipeline and commit artifacts to `request.out_dir`.
pub fn build(request: &BuildRequest) -> Result<BuildReport, BuildError> {
    let start = Instant::now();
    info!(board = %request.board.name, family = request.family(), headers = request.headers.len(), "starting build");

    let generated = generate(request)?;
    commit(&request.out_dir, &generated.artifacts)?;

    let report = BuildReport {
        board: request.board.name.clone(),
        family: request.family().to_string(),
        order: generated.resolution.order().into_iter().map(str::to_string).collect(),
        requirements: generated.resolution.requirements.len(),
        bound_legs: generated.bindings.len(),
        artifacts: generated.artifacts.iter().map(ArtifactSummary::of).collect(),
        out_dir: request.out_dir.clone(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DriverEntry;
    use uccm_aggregate::TargetOutput;

    fn request(out: &std::path::Path) -> BuildRequest {
        BuildRequest::new(Board::stm32f3_discovery(), out)
            .with_header(HeaderSource::new(
                DriverEntry::new("app.h"),
                "#pragma uccm require(gpio(leg(LED3, digital-output)))",
            ))
            .with_header(HeaderSource::new(
                DriverEntry::new("stm32f3/ll_gpio.h").providing("gpio"),
                r##"#pragma uccm append(HAL_CONFIG) = "#define HAL_GPIO_MODULE_ENABLED\n""##,
            ))
    }

    #[test]
    fn generate_produces_sorted_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let generated = generate(&request(&dir.path().join("out"))).unwrap();
        let names: Vec<&str> = generated.artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["HAL_CONFIG.h", "bindings.json", "uccm_legs.h"]);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn family_override_changes_active_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(&dir.path().join("out"));
        req.family = Some("stm32f4".into());
        let err = generate(&req).unwrap_err();
        assert!(matches!(err, BuildError::Resolve(_)));
    }

    #[test]
    fn target_named_like_a_generated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let req = request(&out).with_header(HeaderSource::new(
            DriverEntry::new("stm32f3/user.h").providing("user"),
            r##"#pragma uccm append(uccm_legs) = "#define USER_FRAGMENT 1\n""##,
        ));
        match build(&req).unwrap_err() {
            BuildError::Collision(collisions) => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].file, "uccm_legs.h");
                assert_eq!(collisions[0].first, "the leg accessor header");
                assert_eq!(collisions[0].second, "append target uccm_legs");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!out.exists());
    }

    #[test]
    fn targets_sharing_a_file_name_collide() {
        let target = |name: &str| TargetOutput {
            name: name.into(),
            fragments: Vec::new(),
            duplicates: 0,
            text: String::new(),
        };
        let mut aggregated = Aggregated::default();
        for name in ["CFG", "CFG.h", "bindings.json"] {
            aggregated.targets.insert(name.into(), target(name));
        }
        match check_artifact_names(&aggregated).unwrap_err() {
            BuildError::Collision(collisions) => {
                let files: Vec<&str> = collisions.iter().map(|c| c.file.as_str()).collect();
                assert_eq!(files, vec!["CFG.h", "bindings.json"]);
                assert_eq!(collisions[0].first, "append target CFG");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn aggregate_and_bind_errors_are_reported_together() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(&dir.path().join("out"))
            .with_header(HeaderSource::new(
                DriverEntry::new("stm32f3/rcc.h").providing("rcc"),
                "#pragma uccm append(HAL_CONFIG) = \"#define HAL_GPIO_MODULE_ENABLED 0\"\n\
                 #pragma uccm require(gpio(leg(LED99, digital-output)))",
            ));
        match generate(&req).unwrap_err() {
            BuildError::Generate { aggregate, bind } => {
                assert_eq!(aggregate.len(), 1);
                assert_eq!(bind.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
