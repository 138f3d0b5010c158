use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};

use crate::config::TableConfig;
use crate::error::DinnerError;
use crate::philosopher::Philosopher;
use crate::reporter::{Event, Reporter};
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DinnerSummary {
    // 哲学者 id ごとの食事回数
    pub meals: Vec<usize>,
    // フォークごとの取られた回数
    pub fork_acquisitions: Vec<usize>,
    // 同じフォークを同時に持っていた人数の最大値 (1 でなければならない)
    pub peak_fork_holders: usize,
    // 同時に取り合いに参加していた人数の最大値
    pub peak_contenders: usize,
    // 全員が席を立ったあとのフォークごとの保持人数 (すべて 0 のはず)
    pub holders_at_end: Vec<usize>,
    pub contenders_at_end: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Start {
    Pending,
    Go,
    CalledOff,
}

// 全員の着席を待ってから一斉に始めるための合図
// 途中で着席に失敗したら CalledOff にして、待っている哲学者を帰す
struct StartSignal {
    state: Mutex<Start>,
    cond: Condvar,
}

impl StartSignal {
    fn new() -> Self {
        StartSignal {
            state: Mutex::new(Start::Pending),
            cond: Condvar::new(),
        }
    }

    // Go なら true、CalledOff なら false
    fn wait(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while *state == Start::Pending {
            state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        *state == Start::Go
    }

    fn set(&self, to: Start) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = to;
        self.cond.notify_all();
    }
}

// 起動済みの哲学者を中止させ、全員の終了を待つ
fn call_off(signal: Option<&StartSignal>, handles: Vec<JoinHandle<usize>>) {
    if let Some(s) = signal {
        s.set(Start::CalledOff);
    }
    for t in handles {
        let _ = t.join();
    }
}

pub struct Dinner {
    config: TableConfig,
}

impl Dinner {
    pub fn new(config: TableConfig) -> Self {
        Dinner { config }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // 哲学者を N 人着席させ、全員が食べ終わるまで待つ
    // 食卓は呼び出しごとに新しく用意するので、何度呼んでも結果は独立
    pub fn serve(&self, reporter: Arc<dyn Reporter>) -> Result<DinnerSummary, DinnerError> {
        let n = self.config.philosophers();
        let protocol = self.config.protocol();
        let table = Arc::new(Table::new(n, protocol));
        let start = Instant::now();
        let signal = self
            .config
            .synchronized_start()
            .then(|| Arc::new(StartSignal::new()));

        info!(philosophers = n, ?protocol, "dinner is served");

        let mut v = Vec::with_capacity(n);
        for id in 0..n {
            let philosopher = Philosopher::new(id, n, protocol);
            let table = table.clone();
            let reporter = reporter.clone();
            let timing = self.config.timing().clone();
            let signal0 = signal.clone();
            let mut rng = match self.config.seed() {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
                None => StdRng::from_entropy(),
            };

            let spawned = thread::Builder::new()
                .name(format!("philosopher-{id}"))
                .spawn(move || {
                    if let Some(s) = signal0 {
                        if !s.wait() {
                            return 0;
                        }
                    }
                    philosopher.dine(&table, reporter.as_ref(), &timing, &mut rng)
                });

            match spawned {
                Ok(t) => v.push(t),
                Err(source) => {
                    error!(id, error = %source, "failed to seat philosopher");
                    call_off(signal.as_deref(), v);
                    return Err(DinnerError::Spawn { id, source });
                }
            }
        }

        if let Some(s) = &signal {
            s.set(Start::Go);
        }

        let mut meals = Vec::with_capacity(n);
        let mut first_panic = None;
        for (id, t) in v.into_iter().enumerate() {
            match t.join() {
                Ok(m) => meals.push(m),
                Err(_) => {
                    error!(id, "philosopher panicked");
                    meals.push(0);
                    first_panic.get_or_insert(id);
                }
            }
        }
        if let Some(id) = first_panic {
            return Err(DinnerError::Panicked { id });
        }

        reporter.report(Event::AllFinished);

        let forks = table.forks();
        let summary = DinnerSummary {
            meals,
            fork_acquisitions: forks.acquisitions(),
            peak_fork_holders: forks.peak_holders(),
            peak_contenders: table.peak_contenders(),
            holders_at_end: (0..n).map(|f| forks.holders(f)).collect(),
            contenders_at_end: table.contenders(),
            elapsed: start.elapsed(),
        };
        info!(elapsed = ?summary.elapsed, peak_contenders = summary.peak_contenders, "dinner is over");
        Ok(summary)
    }
}
