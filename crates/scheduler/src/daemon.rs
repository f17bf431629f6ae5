use std::time::Duration;

use tracing::info;

/// Interval between daemon loop iterations: how often due-checks are
/// re-evaluated against the wall clock, independent of any source's own
/// schedule.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Resolves when a SIGINT or SIGTERM has been received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT, shutting down"); }
        () = terminate => { info!("received SIGTERM, shutting down"); }
    }
}

/// Run `on_tick` once per `tick_interval`, until a shutdown signal arrives.
///
/// `on_tick` is awaited to completion before the next sleep begins: the
/// daemon is logically single-threaded, matching the original's
/// `while running: ...; time.sleep(60)` loop.
pub async fn run_until_shutdown<F, Fut>(tick_interval: Duration, mut on_tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    tokio::pin! {
        let shutdown = shutdown_signal();
    }

    loop {
        tokio::select! {
            () = &mut shutdown => {
                break;
            }
            () = on_tick() => {}
        }

        tokio::select! {
            () = &mut shutdown => {
                break;
            }
            () = tokio::time::sleep(tick_interval) => {}
        }
    }
}
