// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use beltplan_core::geometry::{Direction, TilePosition};
use beltplan_encode::backend::BackendStatus;
use beltplan_model::{
    index::TierIndex,
    line::{BeltLine, LineTile},
    placement::detect_lines,
    tier::TierCatalog,
};
use beltplan_presolve::error::PresolveError;
use beltplan_solver::{
    config::{PlanMode, PlannerConfig},
    error::{ConfigError, PlanError},
    logging,
    outcome::PlanMethod,
    planner::BeltPlannerBuilder,
};
use std::{io::Write, sync::atomic::AtomicBool};

const BASIC: TierIndex = TierIndex::new(0);
const FAST: TierIndex = TierIndex::new(1);

fn line(start: TilePosition, direction: Direction, len: usize) -> BeltLine {
    BeltLine::new(start, direction, vec![LineTile::open([BASIC]); len]).unwrap()
}

fn crossing() -> Vec<BeltLine> {
    vec![
        line(TilePosition::new(0, 1), Direction::East, 3),
        line(TilePosition::new(1, 0), Direction::South, 3),
    ]
}

fn config_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_plan_with_config_file() {
    logging::init_test();
    let file = config_file(r#"{ "mode": "exact", "exact": { "node_limit": 100000 } }"#);
    let config = PlannerConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.mode, PlanMode::Exact);

    let catalog = TierCatalog::vanilla();
    let mut planner = BeltPlannerBuilder::new(&catalog)
        .config(config)
        .build()
        .unwrap();
    let outcome = planner.plan(&crossing()).unwrap();

    assert_eq!(outcome.method(), PlanMethod::Exact);
    assert_eq!(outcome.statistics().exact_status, Some(BackendStatus::Optimal));
    // three belts on one line, a two-piece tunnel on the other
    assert!((outcome.cost() - 8.0).abs() < 1e-9);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = PlannerConfig::from_json_file(dir.path().join("planner.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_config_file() {
    let file = config_file(r#"{ "mode": "exact", "#);
    let err = PlannerConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_heuristic_never_beats_exact() {
    logging::init_test();
    let catalog = TierCatalog::vanilla();
    let mut heuristic = BeltPlannerBuilder::new(&catalog).build().unwrap();
    let mut exact = BeltPlannerBuilder::new(&catalog)
        .mode(PlanMode::Exact)
        .build()
        .unwrap();

    let h = heuristic.plan(&crossing()).unwrap();
    let e = exact.plan(&crossing()).unwrap();
    assert!(h.assignment().is_conflict_free());
    assert!(e.assignment().is_conflict_free());
    assert!(h.cost() >= e.cost() - 1e-9);
}

#[test]
fn test_mixed_tiers_prefer_cheapest_tunnel() {
    logging::init_test();
    let catalog = TierCatalog::vanilla();
    let tiles = vec![LineTile::open([BASIC, FAST]); 7];
    let lines = vec![BeltLine::new(TilePosition::new(0, 0), Direction::East, tiles).unwrap()];

    for mode in [PlanMode::Heuristic, PlanMode::Exact] {
        let mut planner = BeltPlannerBuilder::new(&catalog).mode(mode).build().unwrap();
        let outcome = planner.plan(&lines).unwrap();
        // one basic tunnel spanning six tiles plus one belt
        assert!((outcome.cost() - 6.0).abs() < 1e-9, "{mode}: {}", outcome.cost());
        assert!(
            outcome
                .placements()
                .iter()
                .all(|placement| placement.belt_type.tier() == BASIC)
        );
    }
}

#[test]
fn test_placements_describe_the_planned_lines() {
    logging::init_test();
    let catalog = TierCatalog::vanilla();
    let lines = vec![
        line(TilePosition::new(0, 0), Direction::East, 4),
        line(TilePosition::new(0, 5), Direction::East, 9),
    ];
    let mut planner = BeltPlannerBuilder::new(&catalog).build().unwrap();
    let outcome = planner.plan(&lines).unwrap();

    let detected = detect_lines(outcome.placements(), &catalog).unwrap();
    let occupied: usize = detected.iter().map(|line| line.occupied().count()).sum();
    assert_eq!(occupied, outcome.placements().len());
    assert!(detected.iter().all(|line| line.verify(&catalog).is_ok()));
}

#[test]
fn test_interrupted_heuristic() {
    logging::init_test();
    let catalog = TierCatalog::vanilla();
    let stop = AtomicBool::new(true);
    let mut planner = BeltPlannerBuilder::new(&catalog)
        .interrupt(&stop)
        .build()
        .unwrap();

    let err = planner.plan(&crossing()).unwrap_err();
    match err {
        PlanError::Presolve(PresolveError::Aborted { reason, iterations }) => {
            assert_eq!(reason, "Interrupt signal received");
            assert_eq!(iterations, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_hinted_mode_survives_interrupted_heuristic() {
    logging::init_test();
    let catalog = TierCatalog::vanilla();
    let stop = AtomicBool::new(true);
    let mut planner = BeltPlannerBuilder::new(&catalog)
        .mode(PlanMode::ExactWithHints)
        .interrupt(&stop)
        .build()
        .unwrap();

    let outcome = planner.plan(&crossing()).unwrap();
    assert_eq!(outcome.method(), PlanMethod::Exact);
    assert!(outcome.statistics().resolver.is_none());
    assert!((outcome.cost() - 8.0).abs() < 1e-9);
}

#[test]
fn test_contradicting_lines_are_rejected() {
    let catalog = TierCatalog::vanilla();
    let lines = vec![
        line(TilePosition::new(2, 2), Direction::East, 3),
        line(TilePosition::new(2, 2), Direction::North, 3),
    ];
    let mut planner = BeltPlannerBuilder::new(&catalog)
        .mode(PlanMode::Exact)
        .build()
        .unwrap();
    assert!(matches!(planner.plan(&lines), Err(PlanError::Model(_))));
}
