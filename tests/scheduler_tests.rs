use dubsync::kernel::scheduler::{IndexChange, SegmentScheduler};
use dubsync::kernel::segment::SegmentTrack;

fn scheduler(spans: Vec<(f64, f64, &str)>) -> SegmentScheduler {
    SegmentScheduler::new(SegmentTrack::new(spans).expect("valid track"))
}

#[test]
fn test_contiguous_boundary_is_start_inclusive() {
    let s = scheduler(vec![(0.0, 3.0, "A"), (3.0, 5.0, "B")]);

    assert_eq!(s.resolve_active_index(0.0), Some(0));
    assert_eq!(s.resolve_active_index(2.999), Some(0));
    // Exactly at the shared boundary the later segment wins.
    assert_eq!(s.resolve_active_index(3.0), Some(1));
    assert_eq!(s.resolve_active_index(4.999), Some(1));
    // End is exclusive and nothing follows.
    assert_eq!(s.resolve_active_index(5.0), None);
}

#[test]
fn test_gap_resolves_to_preceding_segment() {
    let s = scheduler(vec![(1.0, 2.0, "A"), (4.0, 6.0, "B")]);

    assert_eq!(s.resolve_active_index(0.5), None, "before the first segment");
    assert_eq!(s.resolve_active_index(2.0), Some(0), "gap starts at A's end");
    assert_eq!(s.resolve_active_index(3.9), Some(0), "still inside the gap");
    assert_eq!(s.resolve_active_index(4.0), Some(1));
    assert_eq!(s.resolve_active_index(7.0), None, "past the last segment");
}

#[test]
fn test_empty_and_single_segment_tracks() {
    let empty = SegmentScheduler::new(SegmentTrack::empty());
    for t in [-1.0, 0.0, 1.0, 100.0] {
        assert_eq!(empty.resolve_active_index(t), None);
    }

    let single = scheduler(vec![(2.0, 4.0, "only")]);
    assert_eq!(single.resolve_active_index(1.0), None);
    assert_eq!(single.resolve_active_index(2.0), Some(0));
    assert_eq!(single.resolve_active_index(4.0), None);
}

#[test]
fn test_nan_time_resolves_none() {
    let s = scheduler(vec![(0.0, 1.0, "A")]);
    assert_eq!(s.resolve_active_index(f64::NAN), None);
}

fn count_changes(s: &mut SegmentScheduler, step_ms: u64, until_ms: u64) -> Vec<IndexChange> {
    let mut changes = Vec::new();
    let mut t = 0;
    while t <= until_ms {
        if let Some(change) = s.poll(t as f64 / 1000.0) {
            changes.push(change);
        }
        t += step_ms;
    }
    changes
}

#[test]
fn test_exactly_once_regardless_of_poll_rate() {
    for step_ms in [10, 50, 200, 500] {
        let mut s = scheduler(vec![(0.0, 3.0, "A"), (3.0, 5.0, "B")]);
        let changes = count_changes(&mut s, step_ms, 6000);

        assert_eq!(
            changes,
            vec![
                IndexChange { previous: None, current: Some(0) },
                IndexChange { previous: Some(0), current: Some(1) },
                IndexChange { previous: Some(1), current: None },
            ],
            "poll step {}ms",
            step_ms
        );
    }
}

#[test]
fn test_gap_does_not_produce_extra_events() {
    let mut s = scheduler(vec![(0.0, 1.0, "A"), (2.0, 3.0, "B")]);
    let changes = count_changes(&mut s, 10, 4000);

    // None->0, 0->1 at 2.0 (not at 1.0), 1->None at 3.0
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[1], IndexChange { previous: Some(0), current: Some(1) });
}

#[test]
fn test_backward_seek_reports_one_change() {
    let mut s = scheduler(vec![(0.0, 3.0, "A"), (3.0, 5.0, "B")]);
    assert!(s.poll(3.5).is_some());
    assert_eq!(s.poll(3.6), None);

    let change = s.poll(0.5).expect("jumped back into A");
    assert_eq!(change, IndexChange { previous: Some(1), current: Some(0) });
    assert_eq!(s.poll(0.7), None);
}

#[test]
fn test_replace_forgets_previous_index() {
    let mut s = scheduler(vec![(0.0, 3.0, "A")]);
    assert!(s.poll(1.0).is_some());

    s.replace(SegmentTrack::new(vec![(0.0, 2.0, "X")]).unwrap());
    assert_eq!(s.current(), None);
    assert_eq!(s.poll(1.0), Some(IndexChange { previous: None, current: Some(0) }));
}
