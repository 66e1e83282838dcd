use sensordash_core::{Result, SubscriptionDriver};

use super::SourceArgs;

pub fn run(args: &SourceArgs, metric: &str, chart: bool) -> Result<()> {
    let metric = super::parse_metric(metric)?;
    let driver = SubscriptionDriver::new(super::make_source(args)?);
    let mut app = crate::tui::app::App::new(driver, metric, chart);
    app.run()?;
    Ok(())
}
