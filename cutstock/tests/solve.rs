use cutstock::config::{CgConfig, SoftFixConfig};
use cutstock::entities::{Instance, Item};
use cutstock::error::CutStockError;
use cutstock::pipeline::{self, RunOutcome};
use cutstock::report::NoSink;
use cutstock::softfix::SoftFixVariant;
use cutstock::solver::SimplexOracle;
use float_cmp::approx_eq;
use test_case::test_case;

fn items(pairs: &[(f64, u64)]) -> Vec<Item> {
    pairs
        .iter()
        .map(|&(width, demand)| Item { width, demand })
        .collect()
}

fn run(instance: &Instance, variant: SoftFixVariant) -> RunOutcome {
    pipeline::solve(
        instance,
        variant,
        &CgConfig::default(),
        &SoftFixConfig::default(),
        &mut SimplexOracle::default(),
        &mut NoSink,
    )
    .unwrap()
}

#[test]
fn forty_pieces_fit_one_roll() {
    let instance = Instance::new("a", 10_000.0, items(&[(250.0, 10)])).unwrap();
    let out = run(&instance, SoftFixVariant::None);
    assert!(approx_eq!(f64, out.relaxation.objective, 0.25, epsilon = 1e-7));
    assert!(approx_eq!(f64, out.best.objective, 1.0, epsilon = 1e-7));
    assert!(out.best.covers_demand(&instance, &out.pool));
}

#[test]
fn incompatible_widths_force_two_rolls() {
    let instance = Instance::new("b", 100.0, items(&[(60.0, 1), (50.0, 1)])).unwrap();
    let out = run(&instance, SoftFixVariant::None);
    assert!(approx_eq!(f64, out.best.objective, 2.0, epsilon = 1e-7));
}

#[test]
fn oversized_item_is_rejected_before_solving() {
    let err = Instance::new("c", 100.0, items(&[(150.0, 1)])).unwrap_err();
    assert!(matches!(err, CutStockError::Configuration(_)));
}

#[test_case(SoftFixVariant::None)]
#[test_case(SoftFixVariant::GlobalThreshold)]
#[test_case(SoftFixVariant::PerItemActive)]
#[test_case(SoftFixVariant::IterativeRecolumning)]
#[test_case(SoftFixVariant::IpActivePerItem)]
#[test_case(SoftFixVariant::PatternwiseIpBounds)]
#[test_case(SoftFixVariant::AggregateLpActive)]
#[test_case(SoftFixVariant::IpActiveThenBounds)]
#[test_case(SoftFixVariant::BoundsThenIpActive)]
#[test_case(SoftFixVariant::PenaltyUnderused)]
fn every_variant_produces_a_feasible_cover(variant: SoftFixVariant) {
    let instance = Instance::new(
        "mix",
        10.0,
        items(&[(6.0, 3), (4.0, 5), (3.0, 7), (2.0, 4)]),
    )
    .unwrap();
    let out = run(&instance, variant);
    assert!(out.best.covers_demand(&instance, &out.pool));
    // the relaxation bounds every integer solution from below
    assert!(out.best.objective + 1e-7 >= out.relaxation.objective);
    // and the rounded relaxation bounds the incumbent from above
    assert!(out.best.objective <= out.rounded as f64 + 1e-7);
}

#[test_case(SoftFixVariant::None)]
#[test_case(SoftFixVariant::IterativeRecolumning)]
#[test_case(SoftFixVariant::PatternwiseIpBounds)]
#[test_case(SoftFixVariant::PenaltyUnderused)]
fn repeated_runs_are_bit_identical(variant: SoftFixVariant) {
    let instance = Instance::new(
        "det",
        10.0,
        items(&[(6.0, 3), (4.0, 5), (3.0, 7), (2.0, 4)]),
    )
    .unwrap();
    let a = run(&instance, variant);
    let b = run(&instance, variant);
    assert_eq!(a.best.objective.to_bits(), b.best.objective.to_bits());
    assert_eq!(
        a.best.usage.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
        b.best.usage.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
    );
    assert_eq!(a.relaxation.objective.to_bits(), b.relaxation.objective.to_bits());
    assert_eq!(a.pool.len(), b.pool.len());
    assert_eq!(a.cg_iterations, b.cg_iterations);
}

#[test]
fn pool_patterns_stay_capacity_feasible() {
    let instance = Instance::new(
        "cap",
        17.0,
        items(&[(9.0, 4), (7.0, 3), (5.0, 6), (3.0, 8)]),
    )
    .unwrap();
    let out = run(&instance, SoftFixVariant::IterativeRecolumning);
    for (_, pattern) in out.pool.iter() {
        assert!(pattern.total_width(&instance) <= instance.capacity + 1e-9);
    }
}

#[test]
fn bigger_instance_matches_known_optimum() {
    // classic example: capacity 100, optimal is 3 rolls
    let instance = Instance::new(
        "k",
        100.0,
        items(&[(45.0, 2), (36.0, 2), (31.0, 2), (14.0, 2)]),
    )
    .unwrap();
    let out = run(&instance, SoftFixVariant::GlobalThreshold);
    assert!(approx_eq!(f64, out.best.objective, 3.0, epsilon = 1e-7));
}
