// Cancels the run on Ctrl+C.
//
// Templates whose requests already completed stay as they are; requests
// still waiting for a worker are never sent.

use sesrm_rs::PipelineCancellationToken;
use tokio::task::JoinHandle;
use tokio::{select, signal};
use tracing::{debug, warn};

pub fn spawn_ctrl_c_handler(cancellation_token: PipelineCancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        select! {
            _ = cancellation_token.cancelled() => {
                debug!("cancellation_token canceled.")
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("failed to listen for ctrl-c: {}", e);
                    return;
                }
                warn!("ctrl-c received, cancelling remaining template requests.");
                cancellation_token.cancel();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use once_cell::sync::Lazy;
    use sesrm_rs::create_pipeline_cancellation_token;
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    static SEMAPHORE: Lazy<Arc<Semaphore>> = Lazy::new(|| Arc::new(Semaphore::new(1)));

    #[tokio::test]
    async fn handler_exits_when_pipeline_is_cancelled() {
        let _semaphore = SEMAPHORE.clone().acquire_owned().await.unwrap();

        let cancellation_token = create_pipeline_cancellation_token();

        let join_handle = spawn_ctrl_c_handler(cancellation_token.clone());
        cancellation_token.cancel();

        join_handle.await.unwrap();

        assert!(cancellation_token.is_cancelled());
    }
}
