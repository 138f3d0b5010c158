use std::thread;

use rand::Rng;
use tracing::trace;

use crate::config::{Protocol, Timing, MEALS};
use crate::fork::ForkGuard;
use crate::ordering::acquisition_order;
use crate::reporter::{Event, Reporter};
use crate::table::{Seat, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Thinking,
    Hungry,
    AcquiringFirst,
    AcquiringSecond,
    Eating,
    Releasing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Philosopher {
    id: usize,
    first: usize,
    second: usize,
}

// 1回の食事の間に持っているもの
#[derive(Default)]
struct Hands<'a> {
    seat: Option<Seat<'a>>,
    first: Option<ForkGuard<'a>>,
    second: Option<ForkGuard<'a>>,
}

impl Philosopher {
    pub fn new(id: usize, n: usize, protocol: Protocol) -> Self {
        let (first, second) = acquisition_order(id, n, protocol);
        Philosopher { id, first, second }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// 取る順番に並べたフォークの番号
    pub fn forks(&self) -> (usize, usize) {
        (self.first, self.second)
    }

    /// 考える -> 食べる を `MEALS` 回繰り返し、食べた回数を返す
    pub fn dine<R: Rng>(
        &self,
        table: &Table,
        reporter: &dyn Reporter,
        timing: &Timing,
        rng: &mut R,
    ) -> usize {
        let mut hands = Hands::default();
        let mut meals = 0;
        let mut state = State::Thinking;

        while state != State::Finished {
            trace!(id = self.id, ?state);
            state = match state {
                State::Thinking => {
                    reporter.report(Event::Thinking { id: self.id });
                    thread::sleep(timing.think_for(rng));
                    State::Hungry
                }
                State::Hungry => {
                    reporter.report(Event::Hungry { id: self.id });
                    // ゲートがあればここで待たされる
                    hands.seat = Some(table.join_contention());
                    State::AcquiringFirst
                }
                State::AcquiringFirst => {
                    hands.first = Some(table.forks().acquire(self.first));
                    reporter.report(Event::PickedUp {
                        id: self.id,
                        fork: self.first,
                    });
                    // 取り合いを観測しやすくするための待ち。正しさには関係ない
                    thread::sleep(timing.pickup_pause());
                    State::AcquiringSecond
                }
                State::AcquiringSecond => {
                    hands.second = Some(table.forks().acquire(self.second));
                    reporter.report(Event::PickedUp {
                        id: self.id,
                        fork: self.second,
                    });
                    State::Eating
                }
                State::Eating => {
                    reporter.report(Event::Eating { id: self.id });
                    thread::sleep(timing.eat_for(rng));
                    meals += 1;
                    State::Releasing
                }
                State::Releasing => {
                    // 2本置いてから取り合いを抜ける
                    if let Some(second) = hands.second.take() {
                        table.forks().release(second);
                    }
                    if let Some(first) = hands.first.take() {
                        table.forks().release(first);
                    }
                    hands.seat = None;
                    reporter.report(Event::PutDown {
                        id: self.id,
                        forks: (self.first, self.second),
                    });

                    if meals < MEALS {
                        State::Thinking
                    } else {
                        State::Finished
                    }
                }
                State::Finished => unreachable!(),
            };
        }

        reporter.report(Event::Finished { id: self.id });
        meals
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reporter::MemoryReporter;
    use rand::{rngs::StdRng, SeedableRng};
    use std::time::Duration;

    fn fast() -> Timing {
        Timing::with_unit(Duration::from_micros(1))
    }

    #[test]
    fn test_forks_follow_protocol() {
        assert_eq!(Philosopher::new(0, 3, Protocol::Both).forks(), (0, 1));
        assert_eq!(Philosopher::new(2, 3, Protocol::Both).forks(), (0, 2));
        assert_eq!(Philosopher::new(2, 3, Protocol::Gated).forks(), (2, 0));
    }

    #[test]
    fn test_single_philosopher_event_sequence() {
        let table = Table::new(3, Protocol::Both);
        let reporter = MemoryReporter::new();
        let p = Philosopher::new(2, 3, Protocol::Both);
        let mut rng = StdRng::seed_from_u64(1);

        let meals = p.dine(&table, &reporter, &fast(), &mut rng);
        assert_eq!(meals, MEALS);

        let mut expected = Vec::new();
        for _ in 0..MEALS {
            expected.extend([
                Event::Thinking { id: 2 },
                Event::Hungry { id: 2 },
                Event::PickedUp { id: 2, fork: 0 },
                Event::PickedUp { id: 2, fork: 2 },
                Event::Eating { id: 2 },
                Event::PutDown { id: 2, forks: (0, 2) },
            ]);
        }
        expected.push(Event::Finished { id: 2 });
        assert_eq!(reporter.events(), expected);

        // 食べ終わったら何も持っていない
        for f in 0..3 {
            assert_eq!(table.forks().holders(f), 0);
        }
        assert_eq!(table.contenders(), 0);
        assert_eq!(table.forks().acquisitions(), vec![MEALS, 0, MEALS]);
    }
}
