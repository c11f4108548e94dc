use std::collections::{HashMap, VecDeque};

/// (vertex id, tentative distance) pair held by the structure.
pub type KeyValue = (u32, f64);

#[derive(Debug)]
struct Block {
    entries: Vec<KeyValue>,
    upper_bound: f64,
}

impl Block {
    fn new(upper_bound: f64) -> Block {
        Block { entries: Vec::new(), upper_bound }
    }
}

/// Partially-sorted container mapping vertex id -> tentative distance,
/// specialized for the recursion's access pattern: many small-value prepends
/// near the front, value-addressed inserts, and bulk extraction of the M
/// smallest entries.
///
/// Two block sequences: `front` holds batch-prepended blocks (front-most
/// blocks carry the smallest values), `main` holds inserted blocks ordered by
/// ascending `upper_bound`. No block grows beyond `cap` entries; an inserted
/// block that overflows splits at its median value.
#[derive(Debug)]
pub struct BlockStructure {
    cap: usize,   // M: per-block capacity and pull batch size
    bound: f64,   // B: exclusive upper bound on stored values
    front: VecDeque<Block>, // D0
    main: Vec<Block>,       // D1
    values: HashMap<u32, f64>,
}

fn by_value_then_key(a: &KeyValue, b: &KeyValue) -> std::cmp::Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}

impl BlockStructure {
    /// `cap >= 1` is the block capacity M, `bound` the exclusive value limit B,
    /// `expected` a sizing hint for the key map.
    pub fn new(cap: usize, bound: f64, expected: usize) -> BlockStructure {
        let cap = cap.max(1);
        let mut main = Vec::new();
        main.push(Block::new(bound));
        BlockStructure {
            cap,
            bound,
            front: VecDeque::new(),
            main,
            values: HashMap::with_capacity(expected),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, key: u32) -> Option<f64> {
        self.values.get(&key).copied()
    }

    /// Insert into the main region. A key already present with a smaller or
    /// equal value is left alone; a larger stored value is superseded.
    pub fn insert(&mut self, key: u32, value: f64) {
        debug_assert!(
            value < self.bound,
            "inserted value {value} not below bound {}",
            self.bound
        );

        match self.values.get(&key) {
            Some(&old) if old <= value => return,
            Some(_) => self.remove_key(key),
            None => {}
        }
        self.values.insert(key, value);

        let pos = self.main.partition_point(|b| b.upper_bound < value);
        let pos = pos.min(self.main.len() - 1);
        self.main[pos].entries.push((key, value));

        if self.main[pos].entries.len() > self.cap {
            self.split_main(pos);
        }
    }

    /// Prepend a batch whose values are no greater than anything currently
    /// stored (caller's contract). Duplicates collapse to the minimum value
    /// per key; entries that cannot beat the stored value are dropped.
    pub fn batch_prepend(&mut self, items: Vec<KeyValue>) {
        if items.is_empty() {
            return;
        }

        let mut best: HashMap<u32, f64> = HashMap::with_capacity(items.len());
        for (key, value) in items {
            best.entry(key)
                .and_modify(|v| {
                    if value < *v {
                        *v = value;
                    }
                })
                .or_insert(value);
        }

        let mut to_add: Vec<KeyValue> = Vec::with_capacity(best.len());
        for (key, value) in best {
            match self.values.get(&key) {
                Some(&old) if old <= value => continue,
                Some(_) => self.remove_key(key),
                None => {}
            }
            self.values.insert(key, value);
            to_add.push((key, value));
        }
        if to_add.is_empty() {
            return;
        }

        to_add.sort_by(by_value_then_key);

        let len = to_add.len();
        if len <= self.cap {
            let mut block = Block::new(to_add[len - 1].1);
            block.entries = to_add;
            self.front.push_front(block);
            return;
        }

        // Several blocks of roughly cap/2 entries, smallest values first.
        let half = (self.cap / 2).max(1);
        let num_blocks = (len + half - 1) / half;
        let per_block = (len + num_blocks - 1) / num_blocks;

        for chunk in to_add.chunks(per_block).rev() {
            let mut block = Block::new(chunk[chunk.len() - 1].1);
            block.entries = chunk.to_vec();
            self.front.push_front(block);
        }
    }

    /// Extract up to M smallest entries. Returns the removed keys and a
    /// separator value: every removed entry is strictly below it, everything
    /// still stored is at or above it (the structure's bound when drained).
    pub fn pull(&mut self) -> (Vec<u32>, f64) {
        while self.front.front().map_or(false, |b| b.entries.is_empty()) {
            self.front.pop_front();
        }

        let mut candidates: Vec<KeyValue> = Vec::with_capacity(2 * self.cap);

        let mut collected = 0usize;
        for block in &self.front {
            candidates.extend_from_slice(&block.entries);
            collected += block.entries.len();
            if collected >= self.cap {
                break;
            }
        }
        collected = 0;
        for block in &self.main {
            candidates.extend_from_slice(&block.entries);
            collected += block.entries.len();
            if collected >= self.cap {
                break;
            }
        }

        if candidates.is_empty() {
            return (Vec::new(), self.bound);
        }

        candidates.sort_by(by_value_then_key);

        let take = self.cap.min(candidates.len());
        let keys: Vec<u32> = candidates[..take].iter().map(|&(k, _)| k).collect();
        for &key in &keys {
            self.remove_key(key);
            self.values.remove(&key);
        }

        let separator = if candidates.len() > take {
            candidates[take].1
        } else if self.values.is_empty() {
            self.bound
        } else {
            self.values
                .values()
                .fold(self.bound, |acc, &v| acc.min(v))
        };

        (keys, separator)
    }

    /// Remove the (key, value) pair from whichever block holds it. The key
    /// map entry is managed by the caller.
    fn remove_key(&mut self, key: u32) {
        for block in &mut self.front {
            if let Some(pos) = block.entries.iter().position(|&(k, _)| k == key) {
                block.entries.remove(pos);
                return;
            }
        }
        for block in &mut self.main {
            if let Some(pos) = block.entries.iter().position(|&(k, _)| k == key) {
                block.entries.remove(pos);
                return;
            }
        }
    }

    /// Split an overflowing main block at its median value. The lower half
    /// takes the median as its upper bound, the upper half keeps the old one.
    fn split_main(&mut self, pos: usize) {
        let block = &mut self.main[pos];
        block.entries.sort_by(by_value_then_key);

        let mid = block.entries.len() / 2;
        let upper_entries = block.entries.split_off(mid);
        let old_bound = block.upper_bound;
        block.upper_bound = block.entries[mid - 1].1;

        let mut upper = Block::new(old_bound);
        upper.entries = upper_entries;
        self.main.insert(pos + 1, upper);
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        use std::collections::HashSet;

        let mut seen: HashSet<u32> = HashSet::new();
        for block in self.front.iter().chain(self.main.iter()) {
            assert!(block.entries.len() <= self.cap, "block over capacity");
            for &(k, v) in &block.entries {
                assert!(seen.insert(k), "key {k} stored twice");
                assert!(v < self.bound, "value {v} at or above bound {}", self.bound);
                assert_eq!(self.values.get(&k), Some(&v), "key map out of sync for {k}");
            }
        }
        assert_eq!(seen.len(), self.values.len(), "key map out of sync");

        for win in self.main.windows(2) {
            assert!(
                win[0].upper_bound <= win[1].upper_bound,
                "main blocks out of order"
            );
        }
        for block in &self.main {
            for &(_, v) in &block.entries {
                assert!(v <= block.upper_bound, "value {v} above its block bound");
            }
        }
        let fronts: Vec<&Block> = self.front.iter().collect();
        for i in 1..fronts.len() {
            let prev_max = fronts[i - 1].entries.iter().map(|&(_, v)| v).fold(f64::MIN, f64::max);
            for &(_, v) in &fronts[i].entries {
                assert!(
                    fronts[i - 1].entries.is_empty() || prev_max <= v,
                    "front blocks out of order"
                );
            }
        }
    }
}
