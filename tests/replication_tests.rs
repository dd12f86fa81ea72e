use prodsim::factory::model::OrderStatus;
use prodsim::factory::{
    run_replications, ConcurrencyMode, DeliveryMode, EarliestDueDate, FactoryBuilder,
    FactoryConfig, FactorySimulation, ReleasePolicy, SimulationConfig,
};
use proptest::prelude::*;

const PLANT: &str = include_str!("../demos/config/plant.json");

fn plant() -> FactoryConfig {
    FactoryConfig::from_json_str(PLANT).unwrap()
}

fn run(settings: SimulationConfig, until: f64) -> FactorySimulation {
    let mut sim = FactoryBuilder::new(plant())
        .settings(settings)
        .selector(EarliestDueDate)
        .build()
        .unwrap();
    sim.run(until).unwrap();
    sim
}

#[test]
fn test_same_seed_same_series() {
    let settings = SimulationConfig::new().with_seed(17).with_warmup(50.0);
    let first = serde_json::to_string(run(settings.clone(), 2_000.0).metrics()).unwrap();
    let second = serde_json::to_string(run(settings, 2_000.0).metrics()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_plant_actually_produces() {
    let sim = run(SimulationConfig::new().with_seed(3), 2_000.0);
    for product in ["shaft", "bracket"] {
        assert!(sim.factory().stats[product].finished_orders > 0, "{product} never finished");
        assert!(!sim.metrics().products[product].lead_time.is_empty());
    }
    assert!(!sim.metrics().resources["lathe"].breakdowns.is_empty());
}

#[test]
fn test_sequential_and_parallel_replications_agree() {
    let seeds = [1, 2, 3, 4];
    let sequential = SimulationConfig::new().with_concurrency(ConcurrencyMode::Sequential);
    let parallel = SimulationConfig::new()
        .with_concurrency(ConcurrencyMode::Rayon)
        .with_thread_pool_size(2);

    let a = run_replications(&plant(), &sequential, &seeds, 500.0).unwrap();
    let b = run_replications(&plant(), &parallel, &seeds, 500.0).unwrap();

    assert_eq!(a.len(), seeds.len());
    assert_eq!(a, b);
}

#[test]
fn test_buffered_release_delays_orders() {
    let settings = SimulationConfig::new()
        .with_seed(5)
        .with_release_policy(ReleasePolicy::DueDateBuffer { buffer: 20.0 });
    let sim = run(settings, 1_000.0);

    let mut checked = 0;
    for order in sim.factory().orders.orders() {
        let constraint = sim.factory().config.products[&order.product].constraint_time;
        assert_eq!(order.scheduled, order.due_date - 20.0 - constraint);
        if let Some(released) = order.released {
            assert!(released >= order.scheduled);
        }
        checked += 1;
    }
    assert!(checked > 0);
}

fn check_invariants(sim: &FactorySimulation) -> Result<(), TestCaseError> {
    let factory = sim.factory();
    for (product, stats) in &factory.stats {
        // everything put into finished goods came from a finished order
        prop_assert_eq!(sim.produced(product).unwrap(), stats.finished_quantity as f64);

        // work in process is exactly the quantity of unsettled demand
        let outstanding: u32 = factory
            .orders
            .demands()
            .filter(|d| &d.product == product)
            .map(|d| d.quantity)
            .sum();
        prop_assert_eq!(sim.work_in_process(product).unwrap(), f64::from(outstanding));
    }
    for order in factory.orders.orders() {
        prop_assert!(order.completed_stages <= order.total_stages);
        prop_assert_eq!(
            order.status == OrderStatus::Finished,
            order.finished_at.is_some()
        );
        if order.status == OrderStatus::Finished {
            prop_assert_eq!(order.completed_stages, order.total_stages);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn plant_invariants_hold(
        seed in any::<u64>(),
        until in 50.0f64..1_500.0,
        mode in prop_oneof![
            Just(DeliveryMode::AsReady),
            Just(DeliveryMode::OnDue),
            Just(DeliveryMode::Instantly),
        ],
    ) {
        let sim = run(
            SimulationConfig::new().with_seed(seed).with_delivery_mode(mode),
            until,
        );
        check_invariants(&sim)?;
    }
}
