use console::Term;

/// Exit status after an interrupt (128 + SIGINT).
pub(crate) const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Resolve once Ctrl+C is pressed.
///
/// Caches are written per player, so abandoning the remaining syncs leaves
/// every finished player's window intact.
pub(crate) async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        // Without a handler there is nothing to wait for.
        std::future::pending::<()>().await;
    }

    if Term::stderr().is_term() {
        eprintln!("\n\nShutdown requested, abandoning remaining syncs...");
    } else {
        tracing::warn!("Shutdown requested, abandoning remaining syncs");
    }
}
