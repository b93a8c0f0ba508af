use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::app::{AppContext, Result};
use crate::domain::seed::read_seed_file;
use crate::reconcile::UrlReconciler;
use crate::report;

pub async fn sync(
    ctx: &mut AppContext,
    seed: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let seed_path = seed.unwrap_or(&ctx.config.seed_file).to_path_buf();
    let seed = read_seed_file(&seed_path)?;
    let max_hops = ctx.config.probe.max_redirect_hops;

    ctx.authenticate().await?;

    let report = UrlReconciler::new(&mut ctx.remote, &ctx.probe)
        .max_redirect_hops(max_hops)
        .dry_run(dry_run)
        .reconcile_remote(seed)
        .await?;

    for diagnostic in &report.diagnostics {
        eprintln!("{}", diagnostic);
    }
    if dry_run {
        tracing::info!("Dry run: {} changes not applied", report.stats.mutations());
    }

    match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            report::emit(&mut out, &report.valid)?;
            tracing::info!("Wrote {} addresses to {}", report.valid.len(), path.display());
        }
        None => report::emit(&mut io::stdout().lock(), &report.valid)?,
    }

    Ok(())
}

pub async fn hosts(ctx: &mut AppContext, client: Option<&str>) -> Result<()> {
    ctx.authenticate().await?;

    let hosts: Vec<String> = ctx.remote.non_blocked_hosts(client).await?.into_iter().collect();
    tracing::debug!("{} distinct non-blocked hosts", hosts.len());

    report::emit_hosts(&mut io::stdout().lock(), &hosts)?;
    Ok(())
}
