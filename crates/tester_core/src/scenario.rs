//! Scenario algebra: a scenario is a sorted, disjoint set of iteration
//! ranges ("acts"), each carrying a flag overlay, built up from path
//! matches and walked in lock-step with the run-item tree.

use core::ops::BitOr;
use crate::error::CoreError;

/// Per-range overlay flags (a selected range may be run, faked, forced
/// past its requirements, or explicitly excluded).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const RUN: Flags = Flags(1 << 0);
    pub const FAKE: Flags = Flags(1 << 1);
    pub const FORCE: Flags = Flags(1 << 2);
    pub const EXCLUDE: Flags = Flags(1 << 3);
    pub const GDB: Flags = Flags(1 << 4);
    pub const VALGRIND: Flags = Flags(1 << 5);
    pub const MIX_VALUES: Flags = Flags(1 << 6);
    pub const MIX_ARGS: Flags = Flags(1 << 7);
    pub const MIX_TESTS: Flags = Flags(1 << 8);
    pub const MIX_ITERS: Flags = Flags(1 << 9);
    pub const MIX_SESSIONS: Flags = Flags(1 << 10);
    pub const NO_MIX: Flags = Flags(1 << 11);

    pub fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

/// One contiguous, inclusive iteration range with a flag overlay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Act {
    pub first: u64,
    pub last: u64,
    pub flags: Flags,
}

/// Build a new act, checking `first <= last`.
pub fn new_act(first: u64, last: u64, flags: Flags) -> Result<Act, CoreError> {
    if first > last {
        return Err(CoreError::InvalidAct { first, last });
    }
    Ok(Act { first, last, flags })
}

impl Act {
    fn overlaps(&self, first: u64, last: u64) -> bool {
        self.first <= last && first <= self.last
    }
}

/// A sorted, disjoint set of `Act`s over `[0, total)`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Scenario {
    acts: Vec<Act>,
}

impl Scenario {
    pub fn new() -> Self {
        Scenario { acts: Vec::new() }
    }

    pub fn acts(&self) -> &[Act] {
        &self.acts
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }

    /// Insert `act`, maintaining the sorted/disjoint invariant. Two acts
    /// that intersect are a caller error, not silently resolved.
    pub fn add_act(&mut self, act: Act) -> Result<(), CoreError> {
        let pos = self.acts.partition_point(|a| a.first < act.first);
        if let Some(prev) = pos.checked_sub(1).and_then(|i| self.acts.get(i)) {
            if prev.overlaps(act.first, act.last) {
                return Err(CoreError::OverlappingActs { first: act.first, last: act.last });
            }
        }
        if let Some(next) = self.acts.get(pos) {
            if next.overlaps(act.first, act.last) {
                return Err(CoreError::OverlappingActs { first: act.first, last: act.last });
            }
        }
        self.acts.insert(pos, act);
        Ok(())
    }

    /// A deep copy, named to mirror the act-level algebra's own verbs.
    pub fn copy(&self) -> Scenario {
        self.clone()
    }

    /// Append every act of `other` onto `self`.
    pub fn append(&mut self, other: &Scenario) -> Result<(), CoreError> {
        for &act in &other.acts {
            self.add_act(act)?;
        }
        Ok(())
    }

    /// OR `flags` into every iteration in `[first, last]`, splitting
    /// existing acts at the range boundary and inserting new coverage
    /// where none existed (the "OR" case of the overlap resolution rule).
    pub fn add_flags(&mut self, first: u64, last: u64, flags: Flags) -> Result<(), CoreError> {
        if first > last {
            return Err(CoreError::InvalidAct { first, last });
        }
        let mut rebuilt = Vec::with_capacity(self.acts.len() + 2);
        let mut cursor = first;
        for act in self.acts.drain(..) {
            if !act.overlaps(first, last) {
                rebuilt.push(act);
                continue;
            }
            if act.first < first {
                rebuilt.push(Act { first: act.first, last: first - 1, flags: act.flags });
            }
            let lo = act.first.max(first);
            let hi = act.last.min(last);
            if cursor < lo {
                rebuilt.push(Act { first: cursor, last: lo - 1, flags });
            }
            rebuilt.push(Act { first: lo, last: hi, flags: act.flags.union(flags) });
            cursor = hi + 1;
            if act.last > last {
                rebuilt.push(Act { first: last + 1, last: act.last, flags: act.flags });
            }
        }
        if cursor <= last {
            rebuilt.push(Act { first: cursor, last, flags });
        }
        rebuilt.sort_by_key(|a| a.first);
        self.acts = rebuilt;
        Ok(())
    }

    /// Union of overlay flags across every act intersecting `[first, last]`.
    pub fn apply_flags(&self, first: u64, last: u64) -> Flags {
        self.acts
            .iter()
            .filter(|a| a.overlaps(first, last))
            .fold(Flags::NONE, |acc, a| acc.union(a.flags))
    }

    /// Overlay every act of `self` onto `target`, in place.
    pub fn apply_to(&self, target: &mut Scenario) -> Result<(), CoreError> {
        for act in &self.acts {
            target.add_flags(act.first, act.last, act.flags)?;
        }
        Ok(())
    }

    /// Overlay every act of `source` onto `self`, in place.
    pub fn apply_from(&mut self, source: &Scenario) -> Result<(), CoreError> {
        source.apply_to(self)
    }

    /// Discard every iteration strictly before `from` (`RunFrom`'s single
    /// endpoint trim: keep the suffix).
    pub fn truncate_from(&mut self, from: u64) {
        self.acts.retain(|a| a.last >= from);
        if let Some(act) = self.acts.first_mut() {
            if act.first < from {
                act.first = from;
            }
        }
    }

    /// Discard every iteration strictly after `to` (`RunTo`'s single
    /// endpoint trim: keep the prefix).
    pub fn truncate_to(&mut self, to: u64) {
        self.acts.retain(|a| a.first <= to);
        if let Some(act) = self.acts.last_mut() {
            if act.last > to {
                act.last = to;
            }
        }
    }

    /// Merge adjacent acts that carry identical flags into one.
    pub fn glue(&mut self) {
        let mut out: Vec<Act> = Vec::with_capacity(self.acts.len());
        for act in self.acts.drain(..) {
            match out.last_mut() {
                Some(prev) if prev.flags == act.flags && prev.last + 1 == act.first => {
                    prev.last = act.last;
                }
                _ => out.push(act),
            }
        }
        self.acts = out;
    }

    /// Union two disjoint scenarios; overlapping acts between them are a
    /// reported precondition violation, not silently resolved.
    pub fn merge(&self, other: &Scenario) -> Result<Scenario, CoreError> {
        let mut out = self.copy();
        out.append(other)?;
        Ok(out)
    }

    /// Flags applicable at a single iteration index.
    pub fn step(&self, at: u64) -> Flags {
        self.apply_flags(at, at)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn assert_sorted_and_disjoint(s: &Scenario) {
        for w in s.acts().windows(2) {
            assert!(w[0].first <= w[0].last);
            assert!(w[0].last < w[1].first, "acts {:?} and {:?} are not disjoint/sorted", w[0], w[1]);
        }
    }

    proptest! {
        /// §8: "sorting `S.acts` by `first` yields S itself; any two
        /// distinct acts have disjoint ranges" — holds after any sequence
        /// of `add_flags` overlays, regardless of range overlap or order.
        #[test]
        fn add_flags_keeps_scenario_sorted_and_disjoint(
            ranges in proptest::collection::vec((0u64..200, 0u64..20, 0u32..4), 1..30)
        ) {
            let mut s = Scenario::new();
            for (start, len, flag_bit) in ranges {
                let last = start + len;
                let flags = Flags(1 << flag_bit);
                s.add_flags(start, last, flags).unwrap();
                assert_sorted_and_disjoint(&s);
            }
        }

        /// `apply_flags(S, ∅) = S`: overlaying nothing leaves every act's
        /// flags and the act boundaries untouched.
        #[test]
        fn apply_flags_with_empty_overlay_is_identity(
            ranges in proptest::collection::vec((0u64..100, 0u64..10), 0..10)
        ) {
            let mut s = Scenario::new();
            let mut cursor = 0u64;
            for (_, len) in ranges {
                let first = cursor;
                let last = first + len;
                s.add_flags(first, last, Flags::RUN).unwrap();
                cursor = last + 1;
            }
            let before = s.clone();
            let empty = Scenario::new();
            empty.apply_to(&mut s).unwrap();
            prop_assert_eq!(s, before);
        }

        /// `glue(glue(S)) = glue(S)`: gluing is idempotent once adjacent
        /// same-flag acts have already been coalesced.
        #[test]
        fn glue_is_idempotent(
            ranges in proptest::collection::vec((0u64..5, 0u32..3), 1..20)
        ) {
            let mut s = Scenario::new();
            let mut cursor = 0u64;
            for (len, flag_bit) in ranges {
                let first = cursor;
                let last = first + len;
                let flags = Flags(1 << flag_bit);
                s.add_flags(first, last, flags).unwrap();
                cursor = last + 1;
            }
            s.glue();
            let once = s.clone();
            s.glue();
            prop_assert_eq!(s, once);
        }

        /// `step(·, ·, 0)` (read without advancing): querying the same
        /// index twice always returns the same flags.
        #[test]
        fn step_is_stable_for_a_fixed_index(
            idx in 0u64..100,
            ranges in proptest::collection::vec((0u64..100, 0u64..10, 0u32..4), 0..10)
        ) {
            let mut s = Scenario::new();
            for (start, len, flag_bit) in ranges {
                let last = start + len;
                s.add_flags(start, last, Flags(1 << flag_bit)).unwrap();
            }
            prop_assert_eq!(s.step(idx), s.step(idx));
        }
    }
}
