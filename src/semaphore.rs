use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

// 同時に中へ入れる数を max までに制限するセマフォ
pub struct Semaphore {
    mutex: Mutex<Counter>,
    cond: Condvar,
    max: usize,
}

#[derive(Default)]
struct Counter {
    inside: usize, // 現在中にいる数
    peak: usize,   // これまでに観測した inside の最大値
}

// Drop されると post される
pub struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Semaphore {
    pub fn new(max: usize) -> Self {
        assert!(max > 0);
        Semaphore {
            mutex: Mutex::new(Counter::default()),
            cond: Condvar::new(),
            max,
        }
    }

    // カウンタは不変条件を壊す途中で panic しないので、poison されても中身は使える
    fn counter(&self) -> MutexGuard<'_, Counter> {
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wait(&self) {
        let mut cnt = self.counter();
        while cnt.inside >= self.max {
            cnt = self.cond.wait(cnt).unwrap_or_else(PoisonError::into_inner);
        }
        cnt.inside += 1;
        cnt.peak = cnt.peak.max(cnt.inside);
    }

    pub fn post(&self) {
        let mut cnt = self.counter();
        assert!(cnt.inside > 0, "post without wait");
        cnt.inside -= 1;
        // 1つ空いたので待っているスレッドを1つ起こす
        self.cond.notify_one();
    }

    pub fn acquire(&self) -> Permit<'_> {
        self.wait();
        Permit { semaphore: self }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn inside(&self) -> usize {
        self.counter().inside
    }

    pub fn peak(&self) -> usize {
        self.counter().peak
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.post();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::thread;

    const NUM_THREADS: usize = 8;
    const NUM_LOOP: usize = 1000;

    #[test]
    fn test_permit_releases_on_drop() {
        let sem = Semaphore::new(2);
        {
            let _a = sem.acquire();
            let _b = sem.acquire();
            assert_eq!(sem.inside(), 2);
        }
        assert_eq!(sem.inside(), 0);
        assert_eq!(sem.peak(), 2);
    }

    #[test]
    fn test_post_wakes_a_blocked_waiter() {
        let sem = Arc::new(Semaphore::new(1));
        sem.wait();

        let sem0 = sem.clone();
        let t = thread::spawn(move || {
            sem0.wait();
            sem0.post();
        });

        // 相手が wait でブロックするのを少し待ってから post する
        thread::sleep(std::time::Duration::from_millis(10));
        assert!(!t.is_finished());
        sem.post();
        t.join().unwrap();
        assert_eq!(sem.inside(), 0);
        assert_eq!(sem.peak(), 1);
    }

    #[test]
    fn test_never_exceeds_max() {
        let sem = Arc::new(Semaphore::new(3));
        let inside = Arc::new(AtomicUsize::new(0));
        let worst = Arc::new(AtomicUsize::new(0));

        let mut v = Vec::new();
        for _ in 0..NUM_THREADS {
            let sem = sem.clone();
            let inside = inside.clone();
            let worst = worst.clone();
            v.push(thread::spawn(move || {
                for _ in 0..NUM_LOOP {
                    let _permit = sem.acquire();
                    let n = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    worst.fetch_max(n, Ordering::SeqCst);
                    thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            }));
        }

        for t in v {
            t.join().unwrap();
        }

        assert!(worst.load(Ordering::SeqCst) <= 3);
        assert!(sem.peak() <= 3);
        assert_eq!(sem.inside(), 0);
    }
}
