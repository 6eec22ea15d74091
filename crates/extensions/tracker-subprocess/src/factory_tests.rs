use super::*;
use gesturecall_protocols::Handedness;

fn hand_json() -> String {
    let points = vec![r#"{"x":0.5,"y":0.5,"z":0}"#; 21].join(",");
    format!(r#"{{"landmarks":[{}],"handedness":"Left","score":0.8}}"#, points)
}

/// A shell stand-in for the tracker process.
fn stub(body: &str) -> (tempfile::TempDir, TrackerCommand) {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("tracker.sh");
    std::fs::write(&script, body).unwrap();
    let command = TrackerCommand::new("sh")
        .with_args(vec![script.display().to_string()])
        .with_timeout(Duration::from_secs(2));
    (dir, command)
}

fn echo_tracker() -> String {
    format!(
        r#"while IFS= read -r line; do
  case "$line" in
    *configure*) echo '{{"ok":true}}' ;;
    *empty*) echo '{{"hands":[]}}' ;;
    *broken*) echo '{{"error":"bad frame"}}' ;;
    *image*) echo '{{"hands":[{}]}}' ;;
    *shutdown*) exit 0 ;;
  esac
done
"#,
        hand_json()
    )
}

#[tokio::test]
async fn test_configure_then_detect() {
    let (_dir, command) = stub(&echo_tracker());
    let tracker = SubprocessTrackerFactory::new(command).create().await.unwrap();
    assert_eq!(tracker.name(), "subprocess");

    tracker.initialize(&TrackerOptions::default()).await.unwrap();
    let hands = tracker
        .detect(&FrameData::new("data:image/jpeg;base64,AAAA", 180, 120))
        .await
        .unwrap();
    assert_eq!(hands.len(), 1);
    assert_eq!(hands[0].handedness, Handedness::Left);

    let none = tracker
        .detect(&FrameData::new("data:image/jpeg;base64,empty", 180, 120))
        .await
        .unwrap();
    assert!(none.is_empty());

    tracker.close().await.unwrap();
}

#[tokio::test]
async fn test_detect_before_initialize() {
    let (_dir, command) = stub(&echo_tracker());
    let tracker = SubprocessTrackerFactory::new(command).create().await.unwrap();
    let err = tracker
        .detect(&FrameData::new("data:image/jpeg;base64,AAAA", 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotInitialized));
    tracker.close().await.unwrap();
}

#[tokio::test]
async fn test_inference_error_keeps_process() {
    let (_dir, command) = stub(&echo_tracker());
    let tracker = SubprocessTrackerFactory::new(command).create().await.unwrap();
    tracker.initialize(&TrackerOptions::default()).await.unwrap();

    let err = tracker
        .detect(&FrameData::new("data:image/jpeg;base64,broken", 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Inference(_)));

    // Still usable afterwards.
    let hands = tracker
        .detect(&FrameData::new("data:image/jpeg;base64,AAAA", 1, 1))
        .await
        .unwrap();
    assert_eq!(hands.len(), 1);
    tracker.close().await.unwrap();
}

#[tokio::test]
async fn test_exited_process_is_closed() {
    let (_dir, command) = stub("exit 0\n");
    let tracker = SubprocessTrackerFactory::new(command).create().await.unwrap();
    let err = tracker.initialize(&TrackerOptions::default()).await.unwrap_err();
    assert!(matches!(err, TrackerError::Closed | TrackerError::Io(_)));
}

#[tokio::test]
async fn test_silent_process_times_out() {
    let (_dir, command) = stub("sleep 30\n");
    let command = command.with_timeout(Duration::from_millis(200));
    let tracker = SubprocessTrackerFactory::new(command).create().await.unwrap();
    let err = tracker.initialize(&TrackerOptions::default()).await.unwrap_err();
    assert!(matches!(err, TrackerError::Inference(msg) if msg.contains("timed out")));
    tracker.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_program_fails_to_launch() {
    let factory = SubprocessTrackerFactory::new(TrackerCommand::new("/nonexistent/gesturecall-tracker"));
    let err = factory.create().await.err().unwrap();
    assert!(matches!(err, TrackerError::LaunchFailed(_)));
}
