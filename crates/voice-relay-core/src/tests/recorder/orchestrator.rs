use crate::{
    RecorderError, RecorderSettings, RecorderStatus, RecordingOrchestrator, RecordingState,
    tests::support::{
        DeviceCall, ListenerEvent, MockDevice, RecordingListener, drain, eventually,
        test_settings, wait_for_status,
    },
};

use std::{path::PathBuf, time::Duration};

fn is_recording(status: &RecorderStatus) -> bool {
    status.state == RecordingState::Recording
}

fn is_idle(status: &RecorderStatus) -> bool {
    status.state == RecordingState::Idle && status.segment.is_none() && !status.polling
}

/// WHAT: A press on an idle recorder prepares, starts and begins polling
/// WHY: Device acquisition must follow the Preparing -> Recording path
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_idle_recorder_when_begin_then_device_prepared_started_and_polling() {
    // Given: An idle recorder with a device that prepares and starts
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();

    // When: The gesture starts
    recorder.begin().unwrap();

    // Then: The recorder is Recording with a segment in the capture directory
    let status = wait_for_status(&mut status_rx, is_recording).await;
    assert!(status.polling);
    let segment = status.segment.unwrap();
    assert_eq!(segment.path.parent(), Some(dir.path()));
    assert_eq!(
        segment.path.extension().and_then(|e| e.to_str()),
        Some("wav")
    );
    assert_eq!(
        segment.path.file_stem().and_then(|s| s.to_str()),
        Some(segment.id.as_uuid().simple().to_string().as_str())
    );

    assert_eq!(
        listener.events(),
        vec![ListenerEvent::Preparing, ListenerEvent::Prepared]
    );
    assert_eq!(
        script.lock().unwrap().calls,
        vec![DeviceCall::Prepare(segment.path), DeviceCall::Start]
    );
}

/// WHAT: Reaching the maximum length sends the segment and re-arms capture
/// WHY: A timeout means the gesture is still held, so capture continues
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_held_gesture_when_max_length_reached_then_segment_sent_and_rearmed() {
    // Given: A device reporting 1..=60 seconds and stopping at 60
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    {
        let mut s = script.lock().unwrap();
        s.progress = (1..=60).collect();
        s.stop_seconds = [60, 0].into();
        s.amplitude = crate::MAX_AMPLITUDE;
    }
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();

    // When: The gesture is held past the maximum length
    recorder.begin().unwrap();
    listener
        .wait_for(|e| matches!(e, ListenerEvent::Send(_, 60)))
        .await;

    // Then: A new segment is recording without another press
    let sent_path = listener
        .events()
        .into_iter()
        .find_map(|e| match e {
            ListenerEvent::Send(path, _) => Some(path),
            _ => None,
        })
        .unwrap();
    let status = wait_for_status(&mut status_rx, |s| {
        is_recording(s) && s.segment.as_ref().is_some_and(|seg| seg.path != sent_path)
    })
    .await;
    assert!(status.polling);

    let events = listener.events();
    let elapsed: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            ListenerEvent::Elapsed(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(elapsed, (1..=60).collect::<Vec<_>>());

    let countdown: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            ListenerEvent::Countdown(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(countdown, vec![3, 2, 1, 0]);

    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Artifact(p) if *p == sent_path)),
        1
    );
    assert!(
        events
            .iter()
            .filter(|e| matches!(e, ListenerEvent::Amplitude(_)))
            .all(|e| *e == ListenerEvent::Amplitude(crate::DEFAULT_AMPLITUDE_LEVELS))
    );

    let stopped_at = events
        .iter()
        .position(|e| *e == ListenerEvent::Stopped(60))
        .unwrap();
    let sent_at = events
        .iter()
        .position(|e| matches!(e, ListenerEvent::Send(_, 60)))
        .unwrap();
    assert!(stopped_at < sent_at);
    assert_eq!(listener.count(|e| *e == ListenerEvent::Preparing), 2);

    let calls = script.lock().unwrap().calls.clone();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], DeviceCall::Prepare(sent_path.clone()));
    assert_eq!(calls[1], DeviceCall::Start);
    assert_eq!(calls[2], DeviceCall::Stop);
    assert!(matches!(&calls[3], DeviceCall::Prepare(p) if *p != sent_path));
    assert_eq!(calls[4], DeviceCall::Start);

    // When: The user finally lets go of the re-armed segment
    recorder.end().unwrap();

    // Then: The short re-armed segment is discarded and the recorder settles
    wait_for_status(&mut status_rx, is_idle).await;
    listener.wait_for(|e| *e == ListenerEvent::Stopped(0)).await;
    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Send(..))),
        1
    );
}

/// WHAT: A release below the minimum length discards the segment and its file
/// WHY: Accidental taps must not produce a send
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_short_recording_when_released_then_quick_release_discards_segment() {
    // Given: A recording whose device stops at 0 seconds
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    let artifact = wait_for_status(&mut status_rx, is_recording)
        .await
        .segment
        .unwrap()
        .path;
    std::fs::write(&artifact, b"short").unwrap();

    // When: The gesture ends after 0.4s
    tokio::time::sleep(Duration::from_millis(400)).await;
    recorder.end().unwrap();

    // Then: Stopped(0) is reported, nothing is sent, the recorder is idle
    listener.wait_for(|e| *e == ListenerEvent::Stopped(0)).await;
    wait_for_status(&mut status_rx, is_idle).await;
    assert_eq!(listener.count(|e| matches!(e, ListenerEvent::Send(..))), 0);
    assert_eq!(
        script.lock().unwrap().count(|c| matches!(c, DeviceCall::Stop)),
        1
    );
    assert!(!artifact.exists());
}

/// WHAT: A reading that skips past the maximum still times out
/// WHY: A missed tick must not leave the recording running forever
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_max_five_when_progress_jumps_past_max_then_timeout_and_countdown_saturates() {
    // Given: A 5 second maximum and readings that jump from 4 to 6
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    {
        let mut s = script.lock().unwrap();
        s.progress = [3, 4, 6].into();
        s.stop_seconds = [6, 0].into();
    }
    let listener = RecordingListener::new();
    let settings = test_settings(dir.path()).with_max_length_secs(5);
    let recorder = RecordingOrchestrator::spawn(device, listener.clone(), settings).unwrap();
    let mut status_rx = recorder.subscribe();

    // When: The gesture is held through the readings
    recorder.begin().unwrap();
    listener
        .wait_for(|e| matches!(e, ListenerEvent::Send(_, 6)))
        .await;

    // Then: The countdown ends at 0 and the 6 second segment is sent
    let events = listener.events();
    let countdown: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            ListenerEvent::Countdown(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(countdown, vec![2, 1, 0]);

    let stopped_at = events
        .iter()
        .position(|e| *e == ListenerEvent::Stopped(6))
        .unwrap();
    let sent_at = events
        .iter()
        .position(|e| matches!(e, ListenerEvent::Send(_, 6)))
        .unwrap();
    assert!(stopped_at < sent_at);

    // Then: Capture re-arms for the still-held gesture
    let sent_path = events
        .iter()
        .find_map(|e| match e {
            ListenerEvent::Send(path, _) => Some(path.clone()),
            _ => None,
        })
        .unwrap();
    wait_for_status(&mut status_rx, |s| {
        is_recording(s) && s.segment.as_ref().is_some_and(|seg| seg.path != sent_path)
    })
    .await;
    assert_eq!(listener.count(|e| *e == ListenerEvent::Preparing), 2);

    recorder.end().unwrap();
    wait_for_status(&mut status_rx, is_idle).await;
}

/// WHAT: A failing device stop is treated as a zero-second stop
/// WHY: A segment whose artifact may be incomplete must never be sent
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_failing_stop_when_released_then_quick_release_and_artifact_removed() {
    // Given: A recording whose device fails to stop
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    {
        let mut s = script.lock().unwrap();
        s.stop_ok = false;
        s.stop_seconds = [30].into();
    }
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    let artifact = wait_for_status(&mut status_rx, is_recording)
        .await
        .segment
        .unwrap()
        .path;
    std::fs::write(&artifact, b"partial").unwrap();

    // When: The gesture ends
    recorder.end().unwrap();

    // Then: Stopped(0), no send, idle without a segment, artifact deleted
    listener.wait_for(|e| *e == ListenerEvent::Stopped(0)).await;
    wait_for_status(&mut status_rx, is_idle).await;
    assert_eq!(listener.count(|e| matches!(e, ListenerEvent::Send(..))), 0);
    assert_eq!(
        script.lock().unwrap().count(|c| matches!(c, DeviceCall::Stop)),
        1
    );
    assert!(!artifact.exists());
}

/// WHAT: A send that panics removes the finished artifact
/// WHY: After stop the device no longer owns the file, so reset must delete it
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_panicking_send_when_released_then_artifact_removed_and_still_usable() {
    // Given: A 5 second recording and a listener that panics on send
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    script.lock().unwrap().stop_seconds = [5].into();
    let listener = RecordingListener::panicking_on_send();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    let artifact = wait_for_status(&mut status_rx, is_recording)
        .await
        .segment
        .unwrap()
        .path;
    std::fs::write(&artifact, b"finished").unwrap();

    // When: The gesture ends and the send panics
    recorder.end().unwrap();
    listener.wait_for(|e| *e == ListenerEvent::Stopped(5)).await;
    eventually(|| script.lock().unwrap().calls.contains(&DeviceCall::Release)).await;
    wait_for_status(&mut status_rx, is_idle).await;

    // Then: The orphaned file is gone and a new gesture still records
    assert!(!artifact.exists());
    assert_eq!(listener.count(|e| matches!(e, ListenerEvent::Send(..))), 0);
    recorder.begin().unwrap();
    wait_for_status(&mut status_rx, is_recording).await;
}

/// WHAT: A release at or above the minimum length sends and settles in Idle
/// WHY: A real release must never re-arm capture
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_long_recording_when_released_then_sent_without_rearm() {
    // Given: A recording whose device stops at 5 seconds
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    script.lock().unwrap().stop_seconds = [5].into();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    let recording = wait_for_status(&mut status_rx, is_recording).await;

    // When: The gesture ends
    recorder.end().unwrap();

    // Then: The segment is sent once and the recorder is idle
    listener
        .wait_for(|e| matches!(e, ListenerEvent::Send(_, 5)))
        .await;
    wait_for_status(&mut status_rx, is_idle).await;
    assert!(
        listener.events().contains(&ListenerEvent::Send(
            recording.segment.unwrap().path,
            5
        ))
    );
    assert_eq!(listener.count(|e| *e == ListenerEvent::Preparing), 1);
    assert_eq!(
        script
            .lock()
            .unwrap()
            .count(|c| matches!(c, DeviceCall::Prepare(_))),
        1
    );
}

/// WHAT: A release while the device is still preparing cancels the segment
/// WHY: The start continuation must not run once the user has let go
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_preparing_recorder_when_released_then_idle_and_never_started() {
    // Given: A device whose prepare blocks until the test opens the gate
    let dir = tempfile::tempdir().unwrap();
    let (device, gate) = MockDevice::gated();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();

    recorder.begin().unwrap();
    gate.entered.recv_timeout(Duration::from_secs(5)).unwrap();

    // When: The gesture ends before prepare completes
    recorder.end().unwrap();
    gate.open.send(()).unwrap();

    // Then: Stopped(0) is reported and start is never called
    listener.wait_for(|e| *e == ListenerEvent::Stopped(0)).await;
    drain(&recorder.error_reporter(), &listener, 7).await;
    wait_for_status(&mut status_rx, is_idle).await;

    assert_eq!(
        listener.events(),
        vec![
            ListenerEvent::Preparing,
            ListenerEvent::Prepared,
            ListenerEvent::Stopped(0),
            ListenerEvent::Error(7),
        ]
    );
    let calls = script.lock().unwrap().calls.clone();
    assert!(!calls.contains(&DeviceCall::Start));
    assert_eq!(calls.last(), Some(&DeviceCall::Release));
}

/// WHAT: A failing prepare returns to Idle without a prepared notification
/// WHY: Device acquisition failures are recovered locally
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_failing_prepare_when_begin_then_idle_without_prepared() {
    // Given: A device that refuses to prepare
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    script.lock().unwrap().prepare_ok = false;
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();

    // When: The gesture starts
    recorder.begin().unwrap();
    drain(&recorder.error_reporter(), &listener, 1).await;

    // Then: Only the preparing notification was emitted and nothing is held
    assert_eq!(
        listener.events(),
        vec![ListenerEvent::Preparing, ListenerEvent::Error(1)]
    );
    assert_eq!(recorder.status(), RecorderStatus::default());
    assert_eq!(
        script.lock().unwrap().calls.last(),
        Some(&DeviceCall::Release)
    );
}

/// WHAT: A failing start returns to Idle and never polls
/// WHY: Start failure abandons the segment like prepare failure
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_failing_start_when_begin_then_idle_without_polling() {
    // Given: A device that prepares but refuses to start
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    script.lock().unwrap().start_ok = false;
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();

    // When: The gesture starts and the start step has run
    recorder.begin().unwrap();
    eventually(|| script.lock().unwrap().calls.contains(&DeviceCall::Start)).await;
    drain(&recorder.error_reporter(), &listener, 2).await;

    // Then: The recorder is idle and the segment was released
    assert_eq!(recorder.status(), RecorderStatus::default());
    let calls = script.lock().unwrap().calls.clone();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1], DeviceCall::Start);
    assert_eq!(calls[2], DeviceCall::Release);
    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Elapsed(_) | ListenerEvent::Amplitude(_))),
        0
    );
}

/// WHAT: Negative progress readings are ignored
/// WHY: Devices report -1 before a reading is meaningful
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_invalid_progress_readings_when_polling_then_ticks_discarded() {
    // Given: A device reporting -1, -1, then 2 seconds
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    device.script().lock().unwrap().progress = [-1, -1, 2].into();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();

    // When: The recorder polls through the readings
    recorder.begin().unwrap();
    listener.wait_for(|e| *e == ListenerEvent::Elapsed(2)).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Then: Only the valid reading produced notifications
    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Amplitude(_))),
        1
    );
    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Elapsed(_))),
        1
    );
    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Artifact(_) | ListenerEvent::Countdown(_))),
        0
    );
}

/// WHAT: The 1-second artifact notification fires once per segment
/// WHY: Faster polling sees the 1-second mark on several ticks
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_repeated_one_second_readings_when_polling_then_artifact_reported_once() {
    // Given: A device reporting the 1-second mark three times
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    device.script().lock().unwrap().progress = [0, 1, 1, 1, 2].into();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();

    // When: The recorder polls through the readings
    recorder.begin().unwrap();
    listener.wait_for(|e| *e == ListenerEvent::Elapsed(2)).await;

    // Then: Exactly one artifact notification, for the current segment
    let path = recorder.status().segment.unwrap().path;
    assert_eq!(
        listener.events().iter().filter(|e| matches!(e, ListenerEvent::Artifact(_))).collect::<Vec<_>>(),
        vec![&ListenerEvent::Artifact(path)]
    );
    assert_eq!(
        listener.count(|e| matches!(e, ListenerEvent::Elapsed(_))),
        5
    );
}

/// WHAT: Asynchronous device errors reach the listener without a transition
/// WHY: The listener owns the decision to reset after a device failure
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_device_reports_error_then_listener_notified_and_state_kept() {
    // Given: A recording in progress
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let reporter = device.reporter();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    wait_for_status(&mut status_rx, is_recording).await;

    // When: The device reports an error through its attached reporter
    reporter.lock().unwrap().as_ref().unwrap().report(42);

    // Then: The listener sees the code and the recorder keeps recording
    listener.wait_for(|e| *e == ListenerEvent::Error(42)).await;
    assert_eq!(recorder.state(), RecordingState::Recording);
    assert!(recorder.status().polling);
}

/// WHAT: Reset is idempotent from Idle and tears down an active segment
/// WHY: Reset is the only hard-cancel path and must work in any state
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_any_state_when_reset_twice_then_same_idle_status() {
    // Given: A recording in progress
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let reporter = recorder.error_reporter();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    wait_for_status(&mut status_rx, is_recording).await;

    // When: Reset is called twice
    recorder.reset().unwrap();
    drain(&reporter, &listener, 1).await;
    let first = recorder.status();
    recorder.reset().unwrap();
    drain(&reporter, &listener, 2).await;
    let second = recorder.status();

    // Then: Both resets leave the same idle status and release only once
    assert_eq!(first, RecorderStatus::default());
    assert_eq!(first, second);
    assert_eq!(
        script.lock().unwrap().count(|c| matches!(c, DeviceCall::Release)),
        1
    );
}

/// WHAT: Events that are illegal in the current state change nothing
/// WHY: Duplicate presses must not acquire a second segment
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_pressed_again_then_ignored() {
    // Given: A recording in progress
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    let before = wait_for_status(&mut status_rx, is_recording).await;

    // When: Another press arrives
    recorder.begin().unwrap();
    drain(&recorder.error_reporter(), &listener, 3).await;

    // Then: The same segment keeps recording
    assert_eq!(recorder.status().segment, before.segment);
    assert_eq!(listener.count(|e| *e == ListenerEvent::Preparing), 1);
    assert_eq!(
        script
            .lock()
            .unwrap()
            .count(|c| matches!(c, DeviceCall::Prepare(_))),
        1
    );
}

/// WHAT: A release with nothing held still reports a zero-length stop
/// WHY: UI feedback for the gesture must always complete
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_idle_recorder_when_released_then_zero_stop_reported() {
    // Given: An idle recorder
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();

    // When: A release arrives
    recorder.end().unwrap();

    // Then: Stopped(0) is reported and the device is untouched
    listener.wait_for(|e| *e == ListenerEvent::Stopped(0)).await;
    assert_eq!(recorder.state(), RecordingState::Idle);
    assert!(script.lock().unwrap().calls.is_empty());
}

/// WHAT: A press right after a release starts a fresh segment
/// WHY: The previous teardown must complete before the next acquisition
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_end_then_begin_immediately_then_new_segment_after_teardown() {
    // Given: A recording in progress
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let listener = RecordingListener::new();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    let first: PathBuf = wait_for_status(&mut status_rx, is_recording)
        .await
        .segment
        .unwrap()
        .path;

    // When: Release and press are issued back to back
    recorder.end().unwrap();
    recorder.begin().unwrap();

    // Then: The old segment is stopped before the new one is prepared
    wait_for_status(&mut status_rx, |s| {
        is_recording(s) && s.segment.as_ref().is_some_and(|seg| seg.path != first)
    })
    .await;
    let calls = script.lock().unwrap().calls.clone();
    assert_eq!(calls[0], DeviceCall::Prepare(first));
    assert_eq!(calls[1], DeviceCall::Start);
    assert_eq!(calls[2], DeviceCall::Stop);
    assert!(matches!(calls[3], DeviceCall::Prepare(_)));
    assert_eq!(calls[4], DeviceCall::Start);
}

/// WHAT: A panicking listener is contained and the recorder stays usable
/// WHY: One failed tick must not take down the worker
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_panicking_listener_when_tick_fails_then_reset_and_still_usable() {
    // Given: A listener that panics on its first amplitude notification
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    script.lock().unwrap().progress = [1].into();
    let listener = RecordingListener::panicking_on_amplitude();
    let recorder =
        RecordingOrchestrator::spawn(device, listener.clone(), test_settings(dir.path())).unwrap();
    let mut status_rx = recorder.subscribe();

    // When: The first tick panics inside the listener
    recorder.begin().unwrap();
    eventually(|| script.lock().unwrap().calls.contains(&DeviceCall::Release)).await;
    wait_for_status(&mut status_rx, is_idle).await;

    // Then: A new gesture still records
    recorder.begin().unwrap();
    wait_for_status(&mut status_rx, is_recording).await;
    assert_eq!(
        script
            .lock()
            .unwrap()
            .count(|c| matches!(c, DeviceCall::Prepare(_))),
        2
    );
}

/// WHAT: Shutdown abandons the active segment
/// WHY: The device must not keep capturing after the recorder is gone
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_shutdown_then_segment_released() {
    // Given: A recording in progress
    let dir = tempfile::tempdir().unwrap();
    let device = MockDevice::new();
    let script = device.script();
    let recorder =
        RecordingOrchestrator::spawn(device, RecordingListener::new(), test_settings(dir.path()))
            .unwrap();
    let mut status_rx = recorder.subscribe();
    recorder.begin().unwrap();
    wait_for_status(&mut status_rx, is_recording).await;

    // When: The recorder shuts down
    recorder.shutdown().await;

    // Then: The device was released
    assert_eq!(
        script.lock().unwrap().calls.last(),
        Some(&DeviceCall::Release)
    );
}

/// WHAT: Invalid settings are rejected at spawn
/// WHY: A maximum below the minimum can never produce a send
#[tokio::test]
async fn given_min_above_max_when_spawning_then_invalid_settings_error() {
    // Given: Settings with min 10s and max 5s
    let settings = RecorderSettings::new(std::env::temp_dir())
        .with_min_length_secs(10)
        .with_max_length_secs(5);

    // When: Spawning the recorder
    let result = RecordingOrchestrator::spawn(MockDevice::new(), RecordingListener::new(), settings);

    // Then: Returns InvalidSettings
    assert!(matches!(result, Err(RecorderError::InvalidSettings { .. })));
}

/// WHAT: Spawning outside a tokio runtime fails cleanly
/// WHY: The worker and polling timer need a runtime
#[test]
fn given_no_runtime_when_spawning_then_no_runtime_error() {
    // Given: Valid settings and no runtime on this thread
    let settings = RecorderSettings::new(std::env::temp_dir());

    // When: Spawning the recorder
    let result = RecordingOrchestrator::spawn(MockDevice::new(), RecordingListener::new(), settings);

    // Then: Returns NoRuntime
    assert!(matches!(result, Err(RecorderError::NoRuntime { .. })));
}
