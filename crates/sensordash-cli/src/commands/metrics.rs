use sensordash_core::{ALTITUDE_OFFSET, Metric};

pub fn run() {
    println!("Chartable metrics (picker order):\n");
    for (i, metric) in Metric::PICKER_ORDER.iter().enumerate() {
        println!(
            "  {}  {:<9} {:<24} {}",
            i + 1,
            metric.id(),
            metric.label(),
            metric.unit()
        );
    }
    println!();
    println!("  altitude is displayed and charted with +{ALTITUDE_OFFSET} m applied.");
}
