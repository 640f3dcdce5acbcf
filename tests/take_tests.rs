use dubsync::audio::take::{TakeBuffer, WavTakeRecorder};
use dubsync::session::AudioCapture;
use uuid::Uuid;

#[test]
fn test_take_written_as_wav() {
    let dir = tempfile::tempdir().unwrap();
    let take = TakeBuffer::new();
    let session = Uuid::new_v4();
    let mut recorder = WavTakeRecorder::new(dir.path(), 16_000, session, take.clone());

    // Audio before start is not part of the take.
    take.append(&[0.9; 800]);

    recorder.on_recording_start().unwrap();
    assert!(take.is_armed());
    take.append(&[0.25; 1600]);
    let captured = recorder.on_recording_stop(2).unwrap();

    assert!(!take.is_armed());
    assert_eq!(captured.segment, 2);
    assert_eq!(captured.sample_count, 1600);
    assert_eq!(captured.duration_ms, 100);

    let path = captured.path.expect("take has a file");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(format!("{}-seg002.wav", session).as_str())
    );

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len(), 1600);
}

#[test]
fn test_silent_take_has_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let take = TakeBuffer::new();
    let mut recorder = WavTakeRecorder::new(dir.path(), 16_000, Uuid::new_v4(), take);

    recorder.on_recording_start().unwrap();
    let captured = recorder.on_recording_stop(0).unwrap();

    assert_eq!(captured.path, None);
    assert_eq!(captured.sample_count, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_rearm_discards_previous_samples() {
    let take = TakeBuffer::new();
    take.arm().unwrap();
    take.append(&[0.1; 10]);
    take.arm().unwrap();
    take.append(&[0.1; 3]);
    assert_eq!(take.finish().unwrap().len(), 3);
    assert!(take.finish().unwrap().is_empty());
}
