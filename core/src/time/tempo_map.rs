use crate::time::{clock, ClockTime, Division, Tempo, TicksTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoEntry {
  pub tick: TicksTime,
  pub tempo: Tempo,
}

/// Tempo segments of a sequence, sorted by starting tick.
///
/// There is always an entry at tick 0: either the first explicit tempo change
/// or the fallback tempo the map was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
  entries: Vec<TempoEntry>,
}

impl TempoMap {
  pub fn new(initial: Tempo) -> TempoMap {
    TempoMap {
      entries: vec![TempoEntry {
        tick: TicksTime::zero(),
        tempo: initial,
      }],
    }
  }

  /// Builds the map from tempo changes given in non-decreasing tick order.
  /// When several changes share a tick the last one wins.
  pub fn from_changes<I>(initial: Tempo, changes: I) -> TempoMap
  where
    I: IntoIterator<Item = (TicksTime, Tempo)>,
  {
    let mut map = TempoMap::new(initial);
    for (tick, tempo) in changes {
      map.push(tick, tempo);
    }
    map
  }

  fn push(&mut self, tick: TicksTime, tempo: Tempo) {
    let last = self.entries.len() - 1;
    if self.entries[last].tick >= tick {
      self.entries[last].tempo = tempo;
    } else {
      self.entries.push(TempoEntry { tick, tempo });
    }
  }

  pub fn entries(&self) -> &[TempoEntry] {
    &self.entries
  }

  pub fn is_constant(&self) -> bool {
    self.entries.len() == 1
  }

  fn segment_index(&self, tick: TicksTime) -> usize {
    // entries[0] starts at tick 0, so at least one entry precedes any tick
    self.entries.partition_point(|entry| entry.tick <= tick) - 1
  }

  pub fn tempo_at(&self, tick: TicksTime) -> Tempo {
    self.entries[self.segment_index(tick)].tempo
  }

  /// Nominal time elapsed between two ticks, walking every tempo segment
  /// in between. Returns zero when `to` does not come after `from`.
  pub fn elapsed(&self, division: Division, from: TicksTime, to: TicksTime) -> ClockTime {
    if to <= from {
      return ClockTime::zero();
    }
    let mut total = ClockTime::zero();
    let mut index = self.segment_index(from);
    let mut start = from;
    while start < to {
      let entry = self.entries[index];
      let end = self
        .entries
        .get(index + 1)
        .map_or(to, |next| if next.tick < to { next.tick } else { to });
      total += (end - start).to_clock(division, entry.tempo);
      start = end;
      index += 1;
    }
    total
  }

  /// Inverse of `elapsed` from tick 0: the tick reached after `time` of
  /// nominal playback.
  pub fn ticks_at(&self, division: Division, time: ClockTime) -> TicksTime {
    let mut remaining = time;
    let mut index = 0;
    while let Some(next) = self.entries.get(index + 1) {
      let entry = self.entries[index];
      let segment = (next.tick - entry.tick).to_clock(division, entry.tempo);
      if remaining < segment {
        break;
      }
      remaining -= segment;
      index += 1;
    }
    let entry = self.entries[index];
    let ticks = u128::from(remaining.units()) * u128::from(division.ticks_per_quarter())
      / (u128::from(entry.tempo.micros_per_quarter()) * u128::from(clock::NANOS_PER_MICRO));
    entry.tick + TicksTime::new(ticks as u64)
  }

  /// Replaces the tempo in effect from `tick` up to the next explicit
  /// change. Segments before `tick` keep their tempo.
  pub fn override_from(&mut self, tick: TicksTime, tempo: Tempo) {
    let index = self.segment_index(tick);
    if self.entries[index].tick == tick {
      self.entries[index].tempo = tempo;
    } else {
      self.entries.insert(index + 1, TempoEntry { tick, tempo });
    }
  }
}

impl Default for TempoMap {
  fn default() -> Self {
    TempoMap::new(Tempo::default())
  }
}

#[cfg(test)]
mod test {

  use super::TempoMap;
  use crate::time::{ClockTime, Division, Tempo, TicksTime};

  fn tempo(micros: u32) -> Tempo {
    Tempo::new(micros).unwrap()
  }

  fn ticks(value: u64) -> TicksTime {
    TicksTime::new(value)
  }

  fn three_segments() -> TempoMap {
    TempoMap::from_changes(
      Tempo::default(),
      vec![
        (ticks(0), tempo(500_000)),
        (ticks(480), tempo(250_000)),
        (ticks(960), tempo(500_000)),
      ],
    )
  }

  #[test]
  pub fn new_has_fallback_entry() {
    let map = TempoMap::default();
    assert!(map.is_constant());
    assert_eq!(map.tempo_at(ticks(100_000)), Tempo::default());
  }

  #[test]
  pub fn change_at_zero_replaces_fallback() {
    let map = TempoMap::from_changes(Tempo::default(), vec![(ticks(0), tempo(400_000))]);
    assert_eq!(map.entries().len(), 1);
    assert_eq!(map.tempo_at(ticks(0)), tempo(400_000));
  }

  #[test]
  pub fn tempo_at_segments() {
    let map = three_segments();
    assert_eq!(map.tempo_at(ticks(0)), tempo(500_000));
    assert_eq!(map.tempo_at(ticks(479)), tempo(500_000));
    assert_eq!(map.tempo_at(ticks(480)), tempo(250_000));
    assert_eq!(map.tempo_at(ticks(959)), tempo(250_000));
    assert_eq!(map.tempo_at(ticks(5000)), tempo(500_000));
  }

  #[test]
  pub fn elapsed_walks_segments() {
    let division = Division::new(480).unwrap();
    let map = three_segments();
    assert_eq!(map.elapsed(division, ticks(0), ticks(1440)).to_millis(), 1250);
    assert_eq!(map.elapsed(division, ticks(240), ticks(720)).to_millis(), 375);
    assert_eq!(map.elapsed(division, ticks(720), ticks(240)), ClockTime::zero());
  }

  #[test]
  pub fn elapsed_is_monotonic() {
    let division = Division::new(480).unwrap();
    let map = three_segments();
    let mut previous = ClockTime::zero();
    for tick in (0..2000).step_by(7) {
      let time = map.elapsed(division, ticks(0), ticks(tick));
      assert!(time >= previous);
      previous = time;
    }
  }

  #[test]
  pub fn ticks_at_inverts_elapsed() {
    let division = Division::new(480).unwrap();
    let map = three_segments();
    assert_eq!(map.ticks_at(division, ClockTime::zero()), ticks(0));
    assert_eq!(map.ticks_at(division, ClockTime::from_millis(500)), ticks(480));
    assert_eq!(map.ticks_at(division, ClockTime::from_millis(625)), ticks(720));
    assert_eq!(map.ticks_at(division, ClockTime::from_millis(1250)), ticks(1440));
  }

  #[test]
  pub fn override_inside_segment() {
    let division = Division::new(480).unwrap();
    let mut map = three_segments();
    map.override_from(ticks(240), tempo(1_000_000));
    assert_eq!(map.tempo_at(ticks(239)), tempo(500_000));
    assert_eq!(map.tempo_at(ticks(240)), tempo(1_000_000));
    assert_eq!(map.tempo_at(ticks(480)), tempo(250_000));
    assert_eq!(map.elapsed(division, ticks(0), ticks(480)).to_millis(), 750);
  }

  #[test]
  pub fn override_at_segment_start() {
    let mut map = three_segments();
    map.override_from(ticks(480), tempo(125_000));
    assert_eq!(map.entries().len(), 3);
    assert_eq!(map.tempo_at(ticks(500)), tempo(125_000));
  }
}
