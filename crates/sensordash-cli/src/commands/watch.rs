use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sensordash_core::view::time_label;
use sensordash_core::{
    Dashboard, Derived, Metric, Result, Snapshot, SubscriptionDriver, corrected_value,
};

use super::SourceArgs;

pub fn run(args: &SourceArgs, metric: &str, count: Option<u64>, json: bool) -> Result<()> {
    let metric = super::parse_metric(metric)?;
    let mut driver = SubscriptionDriver::new(super::make_source(args)?);
    let mut dash = Dashboard::new(metric, false);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(io::Error::other)?;

    driver.start()?;
    let limit = count.unwrap_or(u64::MAX);
    let mut printed = 0u64;

    while running.load(Ordering::SeqCst) && printed < limit && !driver.source_closed() {
        driver.pump_timeout(&mut dash, Duration::from_millis(100), |snap, derived| {
            if printed < limit {
                print_line(snap, derived, json);
                printed += 1;
            }
        });
    }
    driver.stop();

    if !json {
        eprintln!("{printed} snapshot(s) from {}", driver.source_info().name);
    }
    Ok(())
}

fn print_line(snap: &Snapshot, derived: &Derived, json: bool) {
    if json {
        let line = serde_json::json!({
            "timestamp": derived.at.to_rfc3339(),
            "metric": derived.metric,
            "value": derived.value,
            "snapshot": snap,
        });
        println!("{line}");
        return;
    }

    let cards: Vec<String> = Metric::ALL
        .iter()
        .map(|&m| format!("{}={:.2}", m.id(), corrected_value(snap, m)))
        .collect();
    println!(
        "{}  {}={:.2}  [{}]",
        time_label(derived.at),
        derived.metric,
        derived.value,
        cards.join(" ")
    );
}
