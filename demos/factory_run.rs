use prodsim::factory::{EarliestDueDate, FactoryBuilder, FactoryConfig, SimulationConfig};
use std::error::Error;

const DEFAULT_PLANT: &str = "demos/config/plant.json";
const DEFAULT_HORIZON: f64 = 2_400.0;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_PLANT.to_string());
    let until = match args.next() {
        Some(raw) => raw.parse::<f64>()?,
        None => DEFAULT_HORIZON,
    };

    println!("🏭 Loading plant from {}", path);
    let config = FactoryConfig::from_path(&path)?;

    let settings = SimulationConfig::new().with_seed(42).with_warmup(until / 10.0);
    let mut simulation = FactoryBuilder::new(config)
        .settings(settings)
        .selector(EarliestDueDate)
        .build()?;

    println!("🚀 Running until t={}...\n", until);
    let stopped = simulation.run(until)?;

    let metrics = simulation.metrics();
    println!("Stopped at t={}", stopped);
    println!("\n=== Resources ===");
    for (name, resource) in &metrics.resources {
        println!(
            "{:<10} busy {:>8.1}  setups {:>4}  breakdowns {:>3}  down {:>7.1}",
            name,
            resource.busy_time(),
            resource.setups.len(),
            resource.breakdowns.len(),
            resource.downtime()
        );
    }

    println!("\n=== Products ===");
    for (name, product) in &metrics.products {
        let summary = product.summary();
        let fmt_mean = |m: Option<f64>| m.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        println!(
            "{:<10} demanded {:>6}  on time {:>6}  late {:>6}  lost {:>6}  flow {:>7}  lead {:>7}",
            name,
            summary.demanded,
            summary.delivered_ontime,
            summary.delivered_late,
            summary.lost_sales,
            fmt_mean(summary.mean_flow_time),
            fmt_mean(summary.mean_lead_time)
        );
        println!(
            "{:<10} finished goods {:>6}  work in process {:>6}",
            "",
            simulation.finished_goods(name)?,
            simulation.work_in_process(name)?
        );
    }

    if metrics.policy_violations > 0 {
        println!("\n⚠️  {} selection policy violations", metrics.policy_violations);
    }
    Ok(())
}
