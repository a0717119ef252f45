//! `uccm build`: run the pipeline and commit artifacts.

use std::path::Path;

use anyhow::{bail, Result};
use uccm_build::build;

use crate::commands::{build_request, report_failure, Overrides};
use crate::manifest::UccmManifest;

pub fn run(project_dir: &Path, manifest: &UccmManifest, overrides: Overrides<'_>) -> Result<()> {
    let request = build_request(project_dir, manifest, overrides)?;
    match build(&request) {
        Ok(report) => {
            print!("{report}");
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            bail!("build failed in the {} stage: {err}; no artifacts written", err.stage())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::str::FromStr;

    fn project(dir: &Path, app: &str) -> UccmManifest {
        fs::create_dir_all(dir.join("app")).unwrap();
        fs::create_dir_all(dir.join("stm32f3")).unwrap();
        fs::write(dir.join("app/main.h"), app).unwrap();
        fs::write(
            dir.join("stm32f3/ll_gpio.h"),
            "#pragma uccm append(HAL_CONFIG) = \"#define HAL_GPIO_MODULE_ENABLED\\n\"\n",
        )
        .unwrap();
        UccmManifest::from_str(
            r#"
[project]
name = "blinky"

[build]
board = "stm32f3-discovery"

[[driver]]
path = "app/main.h"
families = ["*"]

[[driver]]
path = "stm32f3/ll_gpio.h"
provides = ["gpio"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_project_into_default_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = project(
            dir.path(),
            "#pragma uccm require(gpio(leg(LED3, digital-output)))\n",
        );
        run(dir.path(), &manifest, Overrides::default()).unwrap();
        let config = fs::read_to_string(dir.path().join("build/uccm/HAL_CONFIG.h")).unwrap();
        assert_eq!(config, "#define HAL_GPIO_MODULE_ENABLED\n");
    }

    #[test]
    fn failed_build_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = project(dir.path(), "#pragma uccm require(uart)\n");
        let err = run(dir.path(), &manifest, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("resolve stage"));
        assert!(!dir.path().join("build/uccm").exists());
    }

    #[test]
    fn out_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = project(dir.path(), "#pragma uccm require(gpio)\n");
        let overrides = Overrides {
            out_dir: Some("gen"),
            ..Overrides::default()
        };
        run(dir.path(), &manifest, overrides).unwrap();
        assert!(dir.path().join("gen/bindings.json").is_file());
    }

    #[test]
    fn missing_board_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = project(dir.path(), "");
        manifest.build.board = None;
        assert!(run(dir.path(), &manifest, Overrides::default()).is_err());
    }
}
