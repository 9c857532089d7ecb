//! Built-in programs.
//!
//! Presets are available without an upload. The fail-safe program is the one
//! installed whenever an upload does not complete.

use crate::{ProgramError, ProgramResult, ProgramStore};
use jg_core::{AXIS_MAX, AXIS_MIN, PackedLine, PackedTimeLine, Point, VALVE_POINTS};
use tracing::info;

/// Name of the program installed after a failed upload.
pub const FAILSAFE_NAME: &str = "All valves open";

/// Number of presets selectable with [`load_preset`].
pub const N_PRESETS: u16 = 4;

fn packed<I: IntoIterator<Item = Point>>(points: I) -> ProgramResult<PackedLine> {
    let mut packed = PackedLine::EMPTY;
    for p in points {
        packed.set(p)?;
    }
    Ok(packed)
}

fn all_valves(duration_ms: u32) -> ProgramResult<PackedTimeLine> {
    Ok(PackedTimeLine::new(
        duration_ms,
        packed(VALVE_POINTS.iter().copied())?,
    ))
}

/// Replace the program with the fail-safe program: one line with every valve
/// open.
pub fn load_failsafe(store: &mut ProgramStore, duration_ms: u32) -> ProgramResult<()> {
    store.replace(FAILSAFE_NAME, &[all_valves(duration_ms)?])
}

fn preset_lines(index: u16) -> ProgramResult<(&'static str, Vec<PackedTimeLine>)> {
    match index {
        0 => Ok(("Preset 0: Open all valves", vec![all_valves(1000)?])),
        1 => {
            let lines = VALVE_POINTS
                .iter()
                .map(|&p| packed([p]).map(|packed| PackedTimeLine::new(500, packed)))
                .collect::<ProgramResult<Vec<_>>>()?;
            Ok(("Preset 1: Walk over all valves", lines))
        }
        2 => {
            let left = packed(VALVE_POINTS.iter().copied().filter(|p| p.x <= 0))?;
            let right = packed(VALVE_POINTS.iter().copied().filter(|p| p.x > 0))?;
            Ok((
                "Preset 2: Left/right halves",
                vec![
                    PackedTimeLine::new(1000, left),
                    PackedTimeLine::new(1000, right),
                ],
            ))
        }
        3 => {
            let lines = (AXIS_MIN..=AXIS_MAX)
                .map(|x| {
                    packed(VALVE_POINTS.iter().copied().filter(|p| p.x == x))
                        .map(|packed| PackedTimeLine::new(500, packed))
                })
                .collect::<ProgramResult<Vec<_>>>()?;
            Ok(("Preset 3: Row sweep", lines))
        }
        other => Err(ProgramError::UnknownPreset(other)),
    }
}

/// Replace the program with preset `index`.
///
/// On error the current program is left in place.
pub fn load_preset(store: &mut ProgramStore, index: u16) -> ProgramResult<()> {
    let (name, lines) = preset_lines(index)?;
    store.replace(name, &lines)?;
    info!(preset = index, name, lines = lines.len(), "preset loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jg_core::{N_VALVES, NUMEL_AXIS};

    #[test]
    fn failsafe_opens_every_valve() {
        let mut store = ProgramStore::with_capacity(8);
        load_failsafe(&mut store, 1000).unwrap();

        assert_eq!(store.name(), FAILSAFE_NAME);
        assert_eq!(store.line_count(), 1);
        let line = store.get_line(0).unwrap();
        assert_eq!(line.duration_ms, 1000);
        assert_eq!(line.packed.count(), N_VALVES);
    }

    #[test]
    fn preset_shapes() {
        let mut store = ProgramStore::with_capacity(200);

        load_preset(&mut store, 0).unwrap();
        assert_eq!(store.line_count(), 1);

        load_preset(&mut store, 1).unwrap();
        assert_eq!(store.line_count(), N_VALVES);
        assert!(store.lines().all(|l| l.packed.count() == 1));

        load_preset(&mut store, 2).unwrap();
        let total: usize = store.lines().map(|l| l.packed.count()).sum();
        assert_eq!(total, N_VALVES);

        load_preset(&mut store, 3).unwrap();
        assert_eq!(store.line_count(), NUMEL_AXIS);
        assert!(store.lines().all(|l| !l.packed.is_empty()));
    }

    #[test]
    fn unknown_preset_keeps_program() {
        let mut store = ProgramStore::with_capacity(8);
        load_preset(&mut store, 0).unwrap();
        assert_eq!(
            load_preset(&mut store, N_PRESETS),
            Err(ProgramError::UnknownPreset(N_PRESETS))
        );
        assert_eq!(store.name(), "Preset 0: Open all valves");
    }

    #[test]
    fn preset_too_large_for_store() {
        let mut store = ProgramStore::with_capacity(8);
        assert_eq!(
            load_preset(&mut store, 1),
            Err(ProgramError::CapacityExceeded { capacity: 8 })
        );
    }
}
