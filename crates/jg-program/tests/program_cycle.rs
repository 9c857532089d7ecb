use jg_core::{N_VALVES, NUMEL_AXIS, Point, ValveId};
use jg_program::*;

#[test]
fn row_sweep_cycles_through_every_valve() {
    let mut store = ProgramStore::new();
    load_preset(&mut store, 3).unwrap();
    assert_eq!(store.line_count(), NUMEL_AXIS);

    let mut pb = PlaybackController::new();
    let mut seen: Vec<(usize, Vec<Point>)> = Vec::new();
    let mut sink = |i: usize, points: &[Point]| seen.push((i, points.to_vec()));

    // One full cycle plus the wrap back to the first row.
    for now in 0..=(NUMEL_AXIS as u32 * 500) {
        pb.update(now, &store, &mut sink).unwrap();
    }

    let order: Vec<usize> = seen.iter().map(|(i, _)| *i).collect();
    let mut expected: Vec<usize> = (0..NUMEL_AXIS).collect();
    expected.push(0);
    assert_eq!(order, expected);

    let opened: usize = seen[..NUMEL_AXIS].iter().map(|(_, p)| p.len()).sum();
    assert_eq!(opened, N_VALVES);
    for (_, points) in &seen {
        assert!(points.iter().all(|&p| ValveId::from_point(p).is_some()));
    }
}

#[test]
fn failsafe_replaces_a_preset() {
    let mut store = ProgramStore::new();
    load_preset(&mut store, 1).unwrap();
    assert_eq!(store.line_count(), N_VALVES);

    load_failsafe(&mut store, 1000).unwrap();
    assert_eq!(store.name(), FAILSAFE_NAME);
    assert_eq!(store.line_count(), 1);
    assert_eq!(store.capacity(), MAX_LINES);
}

#[test]
fn unknown_preset_keeps_the_program() {
    let mut store = ProgramStore::new();
    load_preset(&mut store, 2).unwrap();

    let err = load_preset(&mut store, N_PRESETS).unwrap_err();
    assert_eq!(err, ProgramError::UnknownPreset(N_PRESETS));
    assert!(!err.is_fatal());
    assert_eq!(store.name(), "Preset 2: Left/right halves");
    assert_eq!(store.line_count(), 2);
}
