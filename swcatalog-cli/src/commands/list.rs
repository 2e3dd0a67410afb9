//! List command - show every installer compatible with this machine.

use console::style;
use swcatalog::context::RunContext;
use swcatalog::events::event_channel;
use swcatalog::resolve::{latest_version, resolve, ProductInfo};

use super::common::RunArgs;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the list command.
pub fn run(runner: &CliRunner, args: RunArgs) -> Result<(), CliError> {
    runner.log_startup("list");

    let config = args.apply(runner.run_config()).with_discover_mirror(false);
    let orchestrator = runner.orchestrator(&config)?;

    // Progress events are not shown; status lines still reach the log.
    let (sender, _receiver) = event_channel();
    let ctx = RunContext::new(config, sender);

    let infos = orchestrator.candidates(&ctx)?;

    let mut products: Vec<&ProductInfo> = infos.values().collect();
    products.sort_by(|a, b| b.post_date.cmp(&a.post_date).then_with(|| a.id.cmp(&b.id)));

    let selected = latest_version(infos.values())
        .ok()
        .and_then(|version| resolve(infos.values(), &version).ok());

    println!(
        "{:<12} {:<10} {:<12} {}",
        style("PRODUCT").bold(),
        style("VERSION").bold(),
        style("POSTED").bold(),
        style("TITLE").bold()
    );
    for info in products {
        let posted = info
            .post_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "{:<12} {:<10} {:<12} {}",
            info.id, info.version, posted, info.title
        );
        if selected.as_deref() == Some(info.id.as_str()) {
            println!("{} {}", line, style("(latest)").green());
        } else {
            println!("{}", line);
        }
    }

    Ok(())
}
