//! Watch command - follow the catalog directory until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::CatalogOrchestrator;
use crate::config::Settings;
use crate::resource::{CallOp, MemoryBackend};
use crate::watcher::FsWatcher;

/// Run the orchestrator against the in-memory backend until interrupted.
pub async fn run(settings: &Settings) -> Result<()> {
    let fs_watcher = FsWatcher::builder()
        .debounce_ms(settings.watch.debounce_ms)
        .backlog_warning(settings.watch.backlog_warning)
        .build()
        .context("Failed to start file watcher")?;

    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = CatalogOrchestrator::builder()
        .settings(settings)
        .backend(backend.clone())
        .hub(fs_watcher.hub())
        .build()
        .context("Failed to build orchestrator")?;

    orchestrator.start();
    eprintln!(
        "Watching {} ({} catalogs). Press Ctrl-C to stop.",
        orchestrator.base_dir().display(),
        orchestrator.registry().len()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[watch] failed to listen for Ctrl-C: {e}");
        }
    };
    let result = fs_watcher.run(shutdown).await;

    let catalogs = orchestrator.registry().len();
    orchestrator.stop();

    let calls = backend.calls();
    let created = calls
        .iter()
        .filter(|call| call.op == CallOp::Create && call.ok)
        .count();
    let failed = calls.iter().filter(|call| !call.ok).count();
    eprintln!(
        "Stopped: {catalogs} catalogs released, {created} resources created, {failed} backend calls failed"
    );

    result.context("File watcher stopped unexpectedly")
}
