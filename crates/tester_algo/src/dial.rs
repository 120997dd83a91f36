//! Weighted, without-replacement iteration sampling ("the dial"): picks a
//! bounded number of iterations out of a config, uniformly over the
//! remaining iteration space, without ever repeating one.
//!
//! Mirrors the run-item tree with a parallel shape tree (`DialShape`)
//! instead of walking the arena on every draw. A leaf tracks its
//! remaining iterations as a set of disjoint sub-ranges and splits the
//! containing sub-range in two around whatever index gets drawn, rather
//! than materializing one slot per remaining iteration.

use tester_core::{Config, DeterministicRng, RunItemArena, RunItemId, Scenario};

#[derive(Clone, Debug)]
struct DialLeaf {
    ranges: Vec<(u64, u64)>,
    remaining: u64,
    capacity: u64,
}

impl DialLeaf {
    fn new(n: u64) -> Self {
        if n == 0 {
            DialLeaf { ranges: Vec::new(), remaining: 0, capacity: 0 }
        } else {
            DialLeaf { ranges: vec![(0, n - 1)], remaining: n, capacity: n }
        }
    }

    fn pick(&mut self, rng: &mut DeterministicRng) -> u64 {
        let mut r = rng.choose(self.remaining);
        for i in 0..self.ranges.len() {
            let (a, b) = self.ranges[i];
            let len = b - a + 1;
            if r < len {
                let chosen = a + r;
                let mut replacement = Vec::with_capacity(2);
                if chosen > a {
                    replacement.push((a, chosen - 1));
                }
                if chosen < b {
                    replacement.push((chosen + 1, b));
                }
                self.ranges.splice(i..i + 1, replacement);
                self.remaining -= 1;
                return chosen;
            }
            r -= len;
        }
        unreachable!("remaining accounting out of sync with ranges")
    }
}

#[derive(Clone, Debug)]
enum DialShape {
    Leaf(DialLeaf),
    Branch(Vec<DialShape>),
}

impl DialShape {
    fn size(&self) -> u64 {
        match self {
            DialShape::Leaf(l) => l.capacity,
            DialShape::Branch(children) => children.iter().map(DialShape::size).sum(),
        }
    }

    fn remaining(&self) -> u64 {
        match self {
            DialShape::Leaf(l) => l.remaining,
            DialShape::Branch(children) => children.iter().map(DialShape::remaining).sum(),
        }
    }

    fn pick(&mut self, rng: &mut DeterministicRng) -> u64 {
        match self {
            DialShape::Leaf(l) => l.pick(rng),
            DialShape::Branch(children) => {
                let total = children.iter().map(DialShape::remaining).sum::<u64>();
                let mut r = rng.choose(total);
                let mut offset = 0u64;
                for child in children.iter_mut() {
                    let child_size = child.size();
                    let child_remaining = child.remaining();
                    if child_remaining == 0 {
                        offset += child_size;
                        continue;
                    }
                    if r < child_remaining {
                        return offset + child.pick(rng);
                    }
                    r -= child_remaining;
                    offset += child_size;
                }
                unreachable!("remaining accounting out of sync with children")
            }
        }
    }
}

fn build_shape(arena: &RunItemArena, id: RunItemId) -> DialShape {
    let node = arena.get(id);
    if node.is_leaf() {
        return DialShape::Leaf(DialLeaf::new(node.n_iters));
    }
    let unit: Vec<DialShape> = node.children().iter().map(|&c| build_shape(arena, c)).collect();
    let unit = DialShape::Branch(unit);
    let copies = (0..node.n_iters).map(|_| unit.clone()).collect();
    DialShape::Branch(copies)
}

/// Without-replacement weighted sampler over a config's full iteration
/// space. Each still-available iteration is equally likely to be drawn
/// next; the original size of every leaf's initial range is what gives
/// larger subtrees a proportionally larger share of draws.
pub struct DialSampler {
    shape: DialShape,
    total: u64,
}

impl DialSampler {
    pub fn new(config: &Config) -> Self {
        let shape = build_shape(&config.arena, config.root);
        let total = shape.size();
        DialSampler { shape, total }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        self.shape.remaining()
    }

    /// Draw one not-yet-drawn global iteration index, or `None` once
    /// every iteration has been drawn.
    pub fn sample_one(&mut self, rng: &mut DeterministicRng) -> Option<u64> {
        if self.shape.remaining() == 0 {
            None
        } else {
            Some(self.shape.pick(rng))
        }
    }

    /// Draw up to `n` distinct indices, stopping early if the space is
    /// exhausted first.
    pub fn sample_n(&mut self, rng: &mut DeterministicRng, n: u64) -> Vec<u64> {
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            match self.sample_one(rng) {
                Some(idx) => out.push(idx),
                None => break,
            }
        }
        out
    }
}

/// Reduce an already-built scenario to a `percent`% order-preserving
/// random subset of its selected iterations (§4.3's contract applied at
/// the CLI's coarser grain: the whole scenario, not a per-leaf weighted
/// tree). `percent=0` empties the scenario; `percent=100` returns a copy
/// unchanged. Each surviving index keeps the flags it already carried.
pub fn apply_dial_to_scenario(scenario: &Scenario, percent: u8, rng: &mut DeterministicRng) -> Scenario {
    let indices: Vec<u64> = scenario.acts().iter().flat_map(|a| a.first..=a.last).collect();
    let total = indices.len() as u64;
    let want = (total * percent.min(100) as u64) / 100;

    let mut pool = indices;
    let mut chosen = Vec::with_capacity(want as usize);
    for i in 0..want as usize {
        let remaining = (pool.len() - i) as u64;
        let j = i + rng.choose(remaining) as usize;
        pool.swap(i, j);
        chosen.push(pool[i]);
    }
    chosen.sort_unstable();

    let mut out = Scenario::new();
    for idx in chosen {
        let flags = scenario.step(idx);
        out.add_flags(idx, idx, flags).expect("single-index range is always valid");
    }
    out.glue();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tester_core::{number_config, Config, RunItemArena, RunItemKind, ScriptItem, SessionHooks, SessionItem, VarArg, Value};

    fn values(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::plain(i.to_string())).collect()
    }

    fn sample_config() -> Config {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("root".into()),
            RunItemKind::Session(SessionItem {
                vars: vec![VarArg::new("x", values(2))],
                hooks: SessionHooks::default(),
                children: Vec::new(),
                iterate: 1,
            }),
            false,
        );
        let p = arena.insert(
            Some(root),
            Some("p".into()),
            RunItemKind::Script(ScriptItem { executable: "p".into(), objective: String::new(), reqs: vec![], args: vec![VarArg::new("y", values(3))], iterate: 1 }),
            false,
        );
        if let RunItemKind::Session(s) = &mut arena.get_mut(root).kind {
            s.children = vec![p];
        }
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();
        config
    }

    #[test]
    fn dial_example() {
        let config = sample_config();
        assert_eq!(config.total_iters, 6);
        let mut sampler = DialSampler::new(&config);
        assert_eq!(sampler.total(), 6);

        let mut rng = DeterministicRng::from_seed_u64(7);
        let drawn = sampler.sample_n(&mut rng, 6);
        assert_eq!(drawn.len(), 6);

        let mut sorted = drawn.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(sampler.remaining(), 0);
        assert_eq!(sampler.sample_one(&mut rng), None);
    }

    #[test]
    fn partial_draw_never_repeats() {
        let config = sample_config();
        let mut sampler = DialSampler::new(&config);
        let mut rng = DeterministicRng::from_seed_u64(99);
        let drawn = sampler.sample_n(&mut rng, 4);
        assert_eq!(drawn.len(), 4);
        let unique: std::collections::HashSet<_> = drawn.iter().copied().collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(sampler.remaining(), 2);
    }

    #[test]
    fn dial_zero_empties_and_dial_100_keeps_everything() {
        let mut s = Scenario::new();
        s.add_flags(0, 99, tester_core::Flags::RUN).unwrap();
        let mut rng = DeterministicRng::from_seed_u64(3);

        let emptied = apply_dial_to_scenario(&s, 0, &mut rng);
        assert!(emptied.is_empty());

        let untouched = apply_dial_to_scenario(&s, 100, &mut rng);
        assert_eq!(untouched.acts(), s.acts());
    }

    #[test]
    fn dial_selects_exact_floor_count_preserving_order_and_flags() {
        let mut s = Scenario::new();
        s.add_flags(0, 99, tester_core::Flags::RUN).unwrap();
        let mut rng = DeterministicRng::from_seed_u64(11);

        let reduced = apply_dial_to_scenario(&s, 25, &mut rng);
        let picked: Vec<u64> = reduced.acts().iter().flat_map(|a| a.first..=a.last).collect();
        assert_eq!(picked.len(), 25);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        for &idx in &picked {
            assert!((0..=99).contains(&idx));
            assert_eq!(reduced.step(idx), tester_core::Flags::RUN);
        }
    }
}
