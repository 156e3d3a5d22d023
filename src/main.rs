use anyhow::{bail, Context};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use core2core::config::Config;
use core2core::export::{CsvExport, Export, HtmlExport};
use core2core::{matrix, pin, sysinfo};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_args();

    if !config.no_priority {
        if let Err(e) = sysinfo::elevate_priority() {
            warn!(error = %e, "could not raise process priority, expect noisier numbers");
        }
    }

    let available = pin::available_cores().context("cannot list usable cores")?;
    let cores = config.select(available);
    if cores.len() < 2 {
        bail!("need at least two usable logical cores, found {:?}", cores);
    }

    let cpu = sysinfo::cpu_name();
    let opts = config.sweep();
    info!(cpu = %cpu, ?cores, round_trips = opts.round_trips, "starting sweep");

    let latencies = matrix::run(&cores, &opts).context("core sweep aborted")?;

    let exports: [&dyn Export; 2] = [&HtmlExport, &CsvExport];
    for export in exports.iter() {
        let path = config.output.with_extension(export.extension());
        export
            .write(&latencies, &cpu, &path)
            .with_context(|| format!("matrix measured but not saved to {}", path.display()))?;
    }

    Ok(())
}
