use std::fs;
use std::path::Path;

use uccm_board::Board;
use uccm_build::{build, BuildError, BuildRequest, DriverEntry, HeaderSource};

const LL_GPIO: &str = r##"#pragma once

#include "../board.h"
#include "../leg.h"

#pragma uccm append(HAL_CONFIG) = "#define HAL_GPIO_MODULE_ENABLED\n"
#pragma uccm require(HAL_DRIVER(gpio))

__Inline
void gpio_setup_output(uccm_leg_t leg, uccm_gpio_output_t opt)
{
}
"##;

const HAL_GPIO: &str = r##"#pragma once
#pragma uccm append(HAL_CONFIG) = "#define HAL_MODULE_ENABLED\n"
"##;

fn header(path: &str, provides: &[&str], text: &str) -> HeaderSource {
    let mut entry = DriverEntry::new(path);
    for p in provides {
        entry = entry.providing(*p);
    }
    HeaderSource::new(entry, text)
}

fn blinky(out: &Path) -> BuildRequest {
    BuildRequest::new(Board::stm32f3_discovery(), out)
        .with_header(header(
            "app/blinky.h",
            &[],
            "#pragma uccm require(gpio(leg(LED3, digital-output)))",
        ))
        .with_header(header("stm32f3/ll_gpio.h", &["gpio"], LL_GPIO))
        .with_header(header("stm32f3/hal_gpio.h", &["HAL_DRIVER(gpio)"], HAL_GPIO))
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn single_gpio_fragment_and_led_binding() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("build");
    let req = BuildRequest::new(Board::stm32f3_discovery(), &out)
        .with_header(header(
            "A.h",
            &[],
            "#pragma uccm require(gpio(leg(LED3, digital-output)))",
        ))
        .with_header(header(
            "stm32f3/B.h",
            &["gpio"],
            r##"#pragma uccm append(HAL_CONFIG) = "#define HAL_GPIO_MODULE_ENABLED\n""##,
        ));

    let report = build(&req).unwrap();
    assert_eq!(report.order, vec!["stm32f3/B.h".to_string(), "A.h".to_string()]);

    let config = fs::read_to_string(out.join("HAL_CONFIG.h")).unwrap();
    assert_eq!(config, "#define HAL_GPIO_MODULE_ENABLED\n");

    let bindings = fs::read_to_string(out.join("bindings.json")).unwrap();
    let table = uccm_bind::BindingTable::from_json(&bindings).unwrap();
    let led = table.get("LED3").unwrap();
    assert_eq!(led.class, uccm_board::CapabilityClass::DigitalOutput);
    assert_eq!((led.port.as_str(), led.pin), ("E", 9));
    assert_eq!(led.claimants[0].header, "A.h");
}

#[test]
fn full_driver_chain() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let report = build(&blinky(&out)).unwrap();

    assert_eq!(
        report.order,
        vec!["stm32f3/hal_gpio.h", "stm32f3/ll_gpio.h", "app/blinky.h"]
    );
    assert_eq!(listing(&out), vec!["HAL_CONFIG.h", "bindings.json", "uccm_legs.h"]);
    assert_eq!(
        fs::read_to_string(out.join("HAL_CONFIG.h")).unwrap(),
        "#define HAL_MODULE_ENABLED\n#define HAL_GPIO_MODULE_ENABLED\n"
    );
    let legs = fs::read_to_string(out.join("uccm_legs.h")).unwrap();
    assert!(legs.contains("uccm_toggle_LED3"));
    assert_eq!(report.artifacts.len(), 3);
}

#[test]
fn missing_provider_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let req = BuildRequest::new(Board::stm32f3_discovery(), &out)
        .with_header(header("A.h", &[], "#pragma uccm require(gpio)"));

    let err = build(&req).unwrap_err();
    let BuildError::Resolve(errs) = &err else {
        panic!("unexpected {err:?}");
    };
    assert_eq!(errs.len(), 1);
    assert_eq!(
        errs[0].to_string(),
        "A.h:1: unresolved capability 'gpio' (requested by A.h)"
    );
    assert!(!out.exists());
}

#[test]
fn cycle_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let req = BuildRequest::new(Board::stm32f3_discovery(), &out)
        .with_header(header("a.h", &["a"], "#pragma uccm require(b)"))
        .with_header(header("b.h", &["b"], "#pragma uccm require(a)"));

    let err = build(&req).unwrap_err();
    assert!(err
        .diagnostics()
        .iter()
        .any(|d| d == "cyclic dependency: a.h -> b.h -> a.h"));
    assert!(!out.exists());
}

#[test]
fn conflicting_fragment_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    build(&blinky(&out)).unwrap();
    let before = fs::read(out.join("HAL_CONFIG.h")).unwrap();

    let req = blinky(&out).with_header(header(
        "stm32f3/rcc.h",
        &["rcc"],
        r##"#pragma uccm append(HAL_CONFIG) = "#define HAL_MODULE_ENABLED 0\n""##,
    ));
    let err = build(&req).unwrap_err();
    assert_eq!(err.stage(), "generate");
    assert!(err.diagnostics()[0].contains("HAL_MODULE_ENABLED"));
    assert_eq!(fs::read(out.join("HAL_CONFIG.h")).unwrap(), before);
    assert_eq!(listing(&out), vec!["HAL_CONFIG.h", "bindings.json", "uccm_legs.h"]);
}

#[test]
fn leg_conflict_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let req = blinky(&out).with_header(header(
        "app/button.h",
        &[],
        "#pragma uccm require(gpio(leg(LED3, digital-input, pull-up)))",
    ));

    let err = build(&req).unwrap_err();
    match &err {
        BuildError::Generate { aggregate, bind } => {
            assert!(aggregate.is_empty());
            assert_eq!(bind.len(), 1);
            assert_eq!(bind[0].kind(), "LegConflict");
            let message = bind[0].to_string();
            assert!(message.contains("app/blinky.h"));
            assert!(message.contains("app/button.h"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn builds_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");

    build(&blinky(&first)).unwrap();
    let mut reversed = blinky(&second);
    reversed.headers.reverse();
    reversed.workers = 1;
    build(&reversed).unwrap();

    for name in listing(&first) {
        assert_eq!(
            fs::read(first.join(&name)).unwrap(),
            fs::read(second.join(&name)).unwrap(),
            "{name} differs"
        );
    }
}

#[test]
fn headers_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let drivers = dir.path().join("stm32f3");
    fs::create_dir_all(&drivers).unwrap();
    fs::write(drivers.join("ll_gpio.h"), LL_GPIO).unwrap();
    fs::write(drivers.join("hal_gpio.h"), HAL_GPIO).unwrap();

    let entries = [
        DriverEntry::new("stm32f3/ll_gpio.h").providing("gpio"),
        DriverEntry::new("stm32f3/hal_gpio.h").providing("HAL_DRIVER(gpio)"),
    ];
    let mut req = BuildRequest::new(Board::nucleo_f303re(), dir.path().join("out"));
    for entry in &entries {
        req = req.with_header(HeaderSource::load(dir.path(), entry).unwrap());
    }

    let report = build(&req).unwrap();
    assert_eq!(report.family, "stm32f3");
    assert_eq!(report.bound_legs, 0);
}
