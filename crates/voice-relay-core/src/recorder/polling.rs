use crate::{SegmentId, recorder::Command};

use std::time::Duration;

use tokio::{
    runtime::Handle,
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Recurring timer that feeds `Tick` commands to the worker while a segment records.
///
/// Cancelling is idempotent and also happens on drop, so replacing or
/// clearing the worker's slot always stops the timer.
pub(crate) struct PollingActivity {
    segment: SegmentId,
    token: CancellationToken,
}

impl PollingActivity {
    #[instrument(skip(runtime, command_tx))]
    pub(crate) fn spawn(
        runtime: &Handle,
        segment: SegmentId,
        period: Duration,
        command_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first reading is one period in.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if command_tx.send(Command::Tick { segment }).is_err() {
                            break;
                        }
                    }
                }
            }

            debug!(segment_id = %segment, "Polling stopped");
        });

        Self { segment, token }
    }

    pub(crate) fn segment(&self) -> SegmentId {
        self.segment
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for PollingActivity {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
