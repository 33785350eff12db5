pub mod chat;
pub mod config;
pub mod send;

use nexus_stream::{SendHandle, SendOutcome};

/// Wait for a send to finish, cancelling it on Ctrl-C.
pub(crate) async fn drive(handle: SendHandle) -> SendOutcome {
    let cancel = handle.cancellation_token();
    let join = handle.join();
    tokio::pin!(join);

    loop {
        tokio::select! {
            outcome = &mut join => return outcome,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::info!("Ctrl-C received, cancelling stream");
                    cancel.cancel();
                }
            }
        }
    }
}
