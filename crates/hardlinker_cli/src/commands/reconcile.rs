//! Reconcile command implementation.

use crate::config::AppConfig;
use hardlinker_fs::{reconcile, ScanReport};

/// Runs the reconcile command.
pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Reconciling {:?} into {:?}",
        config.source, config.destination
    );
    println!();

    let report = reconcile(&config.pipeline())?;
    print_report(&report);

    println!();
    if report.tally.failed == 0 && report.walk_errors == 0 {
        println!("✓ Reconciliation complete");
    } else {
        println!("✗ Reconciliation finished with errors (see log)");
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!("Files visited:     {}", report.visited);
    println!("Links created:     {}", report.tally.linked);
    println!("Already present:   {}", report.tally.already_present);
    println!("Not qualified:     {}", report.tally.rejected);
    println!("Failed:            {}", report.tally.failed);
    if report.walk_errors > 0 {
        println!("Unreadable:        {}", report.walk_errors);
    }
    println!("Duration:          {:.2?}", report.duration);
}
