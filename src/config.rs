use std::ops::Range;
use std::time::Duration;

use rand::Rng;

use crate::error::DinnerError;

// 1人の哲学者が食事をする回数 (固定)
pub const MEALS: usize = 3;

/// 待ち時間の範囲 (単位は `unit`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub unit: Duration,
    pub think: Range<u64>,
    pub eat: Range<u64>,
    /// 1本目と2本目のフォークを取る間の待ち時間
    pub pickup_pause: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            unit: Duration::from_millis(1),
            think: 1000..2000,
            eat: 1500..2500,
            pickup_pause: 100,
        }
    }
}

impl Timing {
    /// 範囲はデフォルトのまま、単位だけを変える
    pub fn with_unit(unit: Duration) -> Self {
        Timing {
            unit,
            ..Timing::default()
        }
    }

    pub fn think_for<R: Rng>(&self, rng: &mut R) -> Duration {
        self.sample(&self.think, rng)
    }

    pub fn eat_for<R: Rng>(&self, rng: &mut R) -> Duration {
        self.sample(&self.eat, rng)
    }

    pub fn pickup_pause(&self) -> Duration {
        self.units(self.pickup_pause)
    }

    fn sample<R: Rng>(&self, range: &Range<u64>, rng: &mut R) -> Duration {
        // gen_range は空の範囲で panic する
        let n = if range.is_empty() {
            range.start
        } else {
            rng.gen_range(range.clone())
        };
        self.units(n)
    }

    fn units(&self, n: u64) -> Duration {
        self.unit.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX))
    }
}

/// 循環待ちを防ぐ仕組み
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// 最後の哲学者だけ右のフォークから取る
    Asymmetric,
    /// 同時にフォークを取りに行けるのは N-1 人まで
    Gated,
    #[default]
    Both,
}

impl Protocol {
    pub fn reverses_last(self) -> bool {
        matches!(self, Protocol::Asymmetric | Protocol::Both)
    }

    pub fn uses_gate(self) -> bool {
        matches!(self, Protocol::Gated | Protocol::Both)
    }
}

#[derive(Debug, Clone)]
pub struct TableConfig {
    philosophers: usize,
    protocol: Protocol,
    timing: Timing,
    seed: Option<u64>,
    synchronized_start: bool,
}

impl TableConfig {
    pub fn new(philosophers: usize) -> Result<Self, DinnerError> {
        if philosophers < 2 {
            return Err(DinnerError::TooFewPhilosophers {
                given: philosophers,
            });
        }

        Ok(TableConfig {
            philosophers,
            protocol: Protocol::default(),
            timing: Timing::default(),
            seed: None,
            synchronized_start: false,
        })
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// 乱数のシードを固定し、同じ実行を再現できるようにする
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 全員が席に着くまでバリアで待たせる
    pub fn with_synchronized_start(mut self, on: bool) -> Self {
        self.synchronized_start = on;
        self
    }

    pub fn philosophers(&self) -> usize {
        self.philosophers
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn synchronized_start(&self) -> bool {
        self.synchronized_start
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_rejects_small_tables() {
        for n in [0, 1] {
            match TableConfig::new(n) {
                Err(DinnerError::TooFewPhilosophers { given }) => assert_eq!(given, n),
                other => panic!("unexpected: {:?}", other),
            }
        }
        assert_eq!(TableConfig::new(2).unwrap().philosophers(), 2);
    }

    #[test]
    fn test_delays_stay_in_bounds() {
        let timing = Timing::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let t = timing.think_for(&mut rng);
            assert!(t >= Duration::from_millis(1000) && t < Duration::from_millis(2000));
            let e = timing.eat_for(&mut rng);
            assert!(e >= Duration::from_millis(1500) && e < Duration::from_millis(2500));
        }
        assert_eq!(timing.pickup_pause(), Duration::from_millis(100));
    }

    #[test]
    fn test_empty_range_does_not_panic() {
        let timing = Timing {
            think: 5..5,
            ..Timing::with_unit(Duration::from_micros(1))
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(timing.think_for(&mut rng), Duration::from_micros(5));
    }

    #[test]
    fn test_protocol_mechanisms() {
        assert!(Protocol::Asymmetric.reverses_last());
        assert!(!Protocol::Asymmetric.uses_gate());
        assert!(!Protocol::Gated.reverses_last());
        assert!(Protocol::Gated.uses_gate());
        assert!(Protocol::Both.reverses_last() && Protocol::Both.uses_gate());
    }
}
