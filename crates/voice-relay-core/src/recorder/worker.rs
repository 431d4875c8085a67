use crate::{
    CaptureDevice, RecorderListener, RecorderSettings, RecorderStatus, RecordingEvent,
    RecordingState, SegmentId, SegmentInfo, StateMachine, amplitude_to_level,
    recorder::{COUNTDOWN_SECS, Command, PollingActivity, Segment},
};

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::Path,
};

use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
};
use tracing::{debug, error, info, instrument, trace, warn};

/// The single writer of recorder state.
///
/// Runs on one blocking thread and drains the command queue in order, so
/// device calls, listener callbacks and transitions never interleave.
pub(crate) struct RecorderWorker {
    machine: StateMachine,
    device: Box<dyn CaptureDevice>,
    listener: Box<dyn RecorderListener>,
    settings: RecorderSettings,
    segment: Option<Segment>,
    polling: Option<PollingActivity>,
    command_tx: mpsc::UnboundedSender<Command>,
    status_tx: watch::Sender<RecorderStatus>,
    runtime: Handle,
}

impl RecorderWorker {
    pub(crate) fn new(
        device: Box<dyn CaptureDevice>,
        listener: Box<dyn RecorderListener>,
        settings: RecorderSettings,
        command_tx: mpsc::UnboundedSender<Command>,
        status_tx: watch::Sender<RecorderStatus>,
        runtime: Handle,
    ) -> Self {
        Self {
            machine: StateMachine::new(),
            device,
            listener,
            settings,
            segment: None,
            polling: None,
            command_tx,
            status_tx,
            runtime,
        }
    }

    /// Drains commands until `Shutdown` or until every sender is gone.
    pub(crate) fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<Command>) {
        info!("Recorder worker started");
        self.reset();
        self.publish();

        while let Some(command) = command_rx.blocking_recv() {
            if command == Command::Shutdown {
                break;
            }

            // Panics from device or listener code stop at this boundary.
            if catch_unwind(AssertUnwindSafe(|| self.handle(command))).is_err() {
                error!(?command, "Recorder step panicked, resetting");
                self.reset();
            }

            self.publish();
        }

        self.reset();
        self.publish();
        info!("Recorder worker stopped");
    }

    fn handle(&mut self, command: Command) {
        trace!(?command, state = ?self.machine.state(), "Handling command");

        match command {
            Command::Begin => self.begin(),
            Command::End => self.end(),
            Command::Reset => self.reset(),
            Command::Start { segment } => self.start_capture(segment),
            Command::Tick { segment } => self.tick(segment),
            Command::Error { code } => {
                warn!(code, state = ?self.machine.state(), "Device error reported");
                self.listener.on_error(code);
            }
            Command::Shutdown => {}
        }
    }

    /// Applies `event`, returning the new state only if the event was accepted.
    fn transition(&mut self, event: RecordingEvent) -> Option<RecordingState> {
        match self.machine.apply(event) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!(error = %e, "Event ignored");
                None
            }
        }
    }

    #[instrument(skip(self))]
    fn begin(&mut self) {
        if self.transition(RecordingEvent::Pressed) == Some(RecordingState::Preparing) {
            self.acquire();
        }
    }

    /// Allocates a segment and prepares the device. Start is queued as a
    /// separate step so a release arriving meanwhile is applied first.
    fn acquire(&mut self) {
        let segment = Segment::allocate(
            &self.settings.capture_dir,
            self.settings.capture.format.extension(),
        );
        let segment_id = segment.id();
        let path = segment.path().to_path_buf();
        self.segment = Some(segment);

        self.listener.on_preparing();

        if let Err(e) = self.device.prepare(&self.settings.capture, &path) {
            warn!(segment_id = %segment_id, error = %e, "Device prepare failed");
            self.reset();
            return;
        }

        info!(segment_id = %segment_id, path = ?path, "Segment prepared");
        self.listener.on_prepared();

        if self
            .command_tx
            .send(Command::Start {
                segment: segment_id,
            })
            .is_err()
        {
            warn!(segment_id = %segment_id, "Command queue closed before start");
            self.reset();
        }
    }

    #[instrument(skip(self))]
    fn start_capture(&mut self, segment_id: SegmentId) {
        if self.machine.state() != RecordingState::Preparing || !self.is_current(segment_id) {
            debug!(segment_id = %segment_id, "Stale start ignored");
            return;
        }

        if let Err(e) = self.device.start() {
            warn!(segment_id = %segment_id, error = %e, "Device start failed");
            self.reset();
            return;
        }

        if self.transition(RecordingEvent::Elapsed) == Some(RecordingState::Recording) {
            self.polling = Some(PollingActivity::spawn(
                &self.runtime,
                segment_id,
                self.settings.poll_interval,
                self.command_tx.clone(),
            ));
            info!(segment_id = %segment_id, "Recording started");
        }
    }

    #[instrument(skip(self))]
    fn end(&mut self) {
        let accepted = self.transition(RecordingEvent::Released);

        match self.machine.state() {
            RecordingState::Stopping { .. } if accepted.is_some() => {
                self.cancel_polling();
                self.stop_and_finish();
            }
            RecordingState::Idle => {
                // Released before capture began, or nothing was held at all.
                self.release_segment();
                self.listener.on_stopped(0);
            }
            _ => {}
        }
    }

    /// Stops the device and either sends the segment or discards it.
    fn stop_and_finish(&mut self) {
        let Some(segment_id) = self.segment.as_ref().map(Segment::id) else {
            warn!("Stopping without a segment");
            self.reset();
            return;
        };

        let seconds = match self.device.stop() {
            Ok(seconds) => seconds,
            Err(e) => {
                error!(segment_id = %segment_id, error = %e, "Device stop failed");
                0
            }
        };

        if let Some(segment) = self.segment.as_mut() {
            segment.mark_stopped();
            segment.record_elapsed(seconds);
        }
        info!(segment_id = %segment_id, seconds, "Segment stopped");
        self.listener.on_stopped(seconds);

        if seconds < self.settings.min_length_secs {
            if self.transition(RecordingEvent::QuickReleased) != Some(RecordingState::Idle) {
                self.reset();
            }
            if let Some(segment) = self.segment.take() {
                discard_artifact(segment.path());
            }
            debug!(segment_id = %segment_id, seconds, "Segment discarded");
            return;
        }

        if !matches!(
            self.transition(RecordingEvent::Elapsed),
            Some(RecordingState::Sending { .. })
        ) {
            self.reset();
            return;
        }

        if let Some(segment) = self.segment.as_ref() {
            let path = segment.path().to_path_buf();
            self.listener.on_send(&path, seconds);
            info!(segment_id = %segment_id, seconds, path = ?path, "Segment sent");
        }

        // The listener owns the artifact from here on.
        self.segment = None;
        let next = self.transition(RecordingEvent::Elapsed);

        match next {
            Some(RecordingState::Preparing) => {
                info!("Gesture still held, re-arming");
                self.acquire();
            }
            Some(RecordingState::Idle) => {}
            _ => self.reset(),
        }
    }

    fn tick(&mut self, segment_id: SegmentId) {
        let polling_current = self
            .polling
            .as_ref()
            .is_some_and(|p| p.segment() == segment_id);

        if self.machine.state() != RecordingState::Recording
            || !self.is_current(segment_id)
            || !polling_current
        {
            trace!(segment_id = %segment_id, "Stale tick ignored");
            return;
        }

        let progress = self.device.progress_seconds();
        let Ok(seconds) = u32::try_from(progress) else {
            trace!(progress, "Invalid progress reading ignored");
            return;
        };

        let level = amplitude_to_level(self.device.max_amplitude(), self.settings.amplitude_levels);
        self.listener.on_amplitude_changed(level);

        let mut first_artifact = None;
        if let Some(segment) = self.segment.as_mut() {
            segment.record_elapsed(seconds);
            if seconds == 1 && segment.mark_artifact_reported() {
                first_artifact = Some(segment.path().to_path_buf());
            }
        }
        if let Some(path) = first_artifact {
            self.listener.on_artifact(&path);
        }

        self.listener.on_elapsed(seconds);

        let max = self.settings.max_length_secs;
        if seconds >= max.saturating_sub(COUNTDOWN_SECS) {
            self.listener.on_expire_countdown(max.saturating_sub(seconds));
        }

        if seconds >= max
            && matches!(
                self.transition(RecordingEvent::TimedOut),
                Some(RecordingState::Stopping { .. })
            )
        {
            info!(segment_id = %segment_id, seconds, "Maximum length reached");
            self.cancel_polling();
            self.stop_and_finish();
        }
    }

    /// Cancels polling, abandons any segment and forces `Idle`. Safe in any state.
    fn reset(&mut self) {
        self.cancel_polling();
        self.release_segment();
        let from = self.machine.force_idle();
        if from != RecordingState::Idle {
            info!(?from, "Recorder reset");
        }
    }

    /// Abandons the current segment. A segment the device already stopped
    /// has a finished artifact that nothing else will clean up.
    fn release_segment(&mut self) {
        if let Some(segment) = self.segment.take() {
            debug!(
                segment_id = %segment.id(),
                stopped = segment.is_stopped(),
                "Segment abandoned"
            );
            self.device.release();
            if segment.is_stopped() {
                discard_artifact(segment.path());
            }
        }
    }

    fn cancel_polling(&mut self) {
        if let Some(polling) = self.polling.take() {
            polling.cancel();
        }
    }

    fn is_current(&self, segment_id: SegmentId) -> bool {
        self.segment.as_ref().is_some_and(|s| s.id() == segment_id)
    }

    fn publish(&self) {
        let status = RecorderStatus {
            state: self.machine.state(),
            segment: self.segment.as_ref().map(|s| SegmentInfo {
                id: s.id(),
                path: s.path().to_path_buf(),
                elapsed_secs: s.elapsed_secs(),
            }),
            polling: self.polling.as_ref().is_some_and(PollingActivity::is_active),
        };
        self.status_tx.send_replace(status);
    }
}

/// Removes the finished artifact of a segment that will never be sent.
fn discard_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => trace!(path = ?path, "Unsent segment removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = ?path, error = %e, "Failed to remove unsent segment"),
    }
}
