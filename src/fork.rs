use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, MutexGuard, PoisonError,
};

// フォーク1本。保護対象のデータは持たず、ロックそのものが資源
#[derive(Default)]
pub struct Fork {
    lock: Mutex<()>,
    holders: AtomicUsize,      // 現在持っている哲学者の数 (0 か 1 のはず)
    peak_holders: AtomicUsize, // 観測した holders の最大値
    acquisitions: AtomicUsize, // 取られた回数
}

// フォークを持っている間だけ存在する。Drop でフォークを置く
pub struct ForkGuard<'a> {
    fork: &'a Fork,
    index: usize,
    _lock: MutexGuard<'a, ()>,
}

impl ForkGuard<'_> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for ForkGuard<'_> {
    fn drop(&mut self) {
        // ロックの解放 (_lock の drop) より先に数を戻す
        self.fork.holders.fetch_sub(1, Ordering::AcqRel);
    }
}

/// 円卓に並んだフォーク `0..n`
/// 哲学者 `i` はフォーク `i` を左隣と、フォーク `(i+1) % n` を右隣と共有する
pub struct ForkTable {
    forks: Vec<Fork>,
}

impl ForkTable {
    pub fn new(n: usize) -> Self {
        ForkTable {
            forks: (0..n).map(|_| Fork::default()).collect(),
        }
    }

    /// フォーク `index` が空くまでブロックし、ガードが drop されるまで持つ
    pub fn acquire(&self, index: usize) -> ForkGuard<'_> {
        let fork = &self.forks[index];
        // () しか守っていないので poison は無視してよい
        let lock = fork.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let holders = fork.holders.fetch_add(1, Ordering::AcqRel) + 1;
        fork.peak_holders.fetch_max(holders, Ordering::AcqRel);
        fork.acquisitions.fetch_add(1, Ordering::Relaxed);

        ForkGuard {
            fork,
            index,
            _lock: lock,
        }
    }

    /// フォークを置く (ガードを drop するのと同じ)
    pub fn release(&self, guard: ForkGuard<'_>) {
        debug_assert!(std::ptr::eq(guard.fork, &self.forks[guard.index]));
        drop(guard);
    }

    pub fn holders(&self, index: usize) -> usize {
        self.forks[index].holders.load(Ordering::Acquire)
    }

    pub fn peak_holders(&self) -> usize {
        self.forks
            .iter()
            .map(|f| f.peak_holders.load(Ordering::Acquire))
            .max()
            .unwrap_or(0)
    }

    pub fn acquisitions(&self) -> Vec<usize> {
        self.forks
            .iter()
            .map(|f| f.acquisitions.load(Ordering::Relaxed))
            .collect()
    }
}
