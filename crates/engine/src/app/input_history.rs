use std::time::{Duration, Instant};

pub const MAX_INPUT_SIZE: usize = 128;
pub const INPUT_HISTORY_LEN: usize = 200;

/// Raw input words sent for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPayload {
    words: [i32; MAX_INPUT_SIZE],
}

impl Default for InputPayload {
    fn default() -> Self {
        Self {
            words: [0; MAX_INPUT_SIZE],
        }
    }
}

impl InputPayload {
    /// Copies up to `MAX_INPUT_SIZE` words; the remainder stays zeroed.
    pub fn from_words(words: &[i32]) -> Self {
        let mut payload = Self::default();
        let len = words.len().min(MAX_INPUT_SIZE);
        payload.words[..len].copy_from_slice(&words[..len]);
        payload
    }

    pub fn words(&self) -> &[i32; MAX_INPUT_SIZE] {
        &self.words
    }

    pub fn word(&self, index: usize) -> i32 {
        self.words.get(index).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InputSlot {
    pub payload: InputPayload,
    pub tick: i32,
    pub predicted_latency: Duration,
    pub time: Instant,
}

/// Fixed ring of the last `INPUT_HISTORY_LEN` recorded inputs.
#[derive(Debug)]
pub struct InputHistory {
    slots: Vec<Option<InputSlot>>,
    cursor: usize,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHistory {
    pub fn new() -> Self {
        Self {
            slots: vec![None; INPUT_HISTORY_LEN],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        INPUT_HISTORY_LEN
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Overwrites whatever the next slot held.
    pub fn record(
        &mut self,
        tick: i32,
        payload: InputPayload,
        predicted_latency: Duration,
        time: Instant,
    ) {
        self.slots[self.cursor] = Some(InputSlot {
            payload,
            tick,
            predicted_latency,
            time,
        });
        self.cursor = (self.cursor + 1) % INPUT_HISTORY_LEN;
    }

    /// Payload with the greatest tick not after `query_tick`.
    // TODO: keep a tick-sorted index next to the ring if lookups show up in profiles.
    pub fn lookup(&self, query_tick: i32) -> Option<&InputPayload> {
        self.lookup_slot(query_tick).map(|slot| &slot.payload)
    }

    pub fn lookup_slot(&self, query_tick: i32) -> Option<&InputSlot> {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.tick <= query_tick)
            .max_by_key(|slot| slot.tick)
    }

    pub fn latest(&self) -> Option<&InputSlot> {
        let previous = (self.cursor + INPUT_HISTORY_LEN - 1) % INPUT_HISTORY_LEN;
        self.slots[previous].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(tag: i32) -> InputPayload {
        InputPayload::from_words(&[tag, tag * 2])
    }

    fn history_with(ticks: &[i32]) -> InputHistory {
        let now = Instant::now();
        let mut history = InputHistory::new();
        for tick in ticks {
            history.record(*tick, payload(*tick), Duration::from_millis(10), now);
        }
        history
    }

    #[test]
    fn lookup_on_empty_history_is_none() {
        let history = InputHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.lookup(0), None);
        assert_eq!(history.lookup(i32::MAX), None);
        assert!(history.latest().is_none());
    }

    #[test]
    fn lookup_returns_latest_tick_not_after_query() {
        let history = history_with(&[5, 10, 20]);

        assert_eq!(history.lookup(15), Some(&payload(10)));
        assert_eq!(history.lookup(20), Some(&payload(20)));
        assert_eq!(history.lookup(3), None);
        assert_eq!(history.lookup(100), Some(&payload(20)));
        assert_eq!(history.lookup(5), Some(&payload(5)));
    }

    #[test]
    fn lookup_ignores_insertion_order() {
        let history = history_with(&[30, 10, 20]);
        assert_eq!(history.lookup(25), Some(&payload(20)));
        assert_eq!(history.lookup(31), Some(&payload(30)));
    }

    #[test]
    fn wrap_discards_oldest_slots() {
        let ticks = (0..250).collect::<Vec<_>>();
        let history = history_with(&ticks);

        assert_eq!(history.len(), INPUT_HISTORY_LEN);
        assert_eq!(history.lookup(49), None);
        assert_eq!(history.lookup(50), Some(&payload(50)));
        assert_eq!(history.lookup(1_000), Some(&payload(249)));
        assert_eq!(history.latest().map(|slot| slot.tick), Some(249));
    }

    #[test]
    fn record_keeps_latency_and_time() {
        let now = Instant::now();
        let mut history = InputHistory::new();
        history.record(7, payload(7), Duration::from_millis(12), now);

        let slot = history.lookup_slot(7).expect("slot");
        assert_eq!(slot.tick, 7);
        assert_eq!(slot.predicted_latency, Duration::from_millis(12));
        assert_eq!(slot.time, now);
    }

    #[test]
    fn payload_truncates_and_zero_fills() {
        let long = vec![3; MAX_INPUT_SIZE + 10];
        let truncated = InputPayload::from_words(&long);
        assert!(truncated.words().iter().all(|word| *word == 3));

        let short = InputPayload::from_words(&[1, 2]);
        assert_eq!(short.word(0), 1);
        assert_eq!(short.word(1), 2);
        assert_eq!(short.word(2), 0);
        assert_eq!(short.word(MAX_INPUT_SIZE + 1), 0);
    }
}
