use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Protocol;
use crate::fork::ForkTable;
use crate::semaphore::{Permit, Semaphore};

// 食卓。フォークと入場制限のセマフォ、観測用のカウンタを持つ
pub struct Table {
    forks: ForkTable,
    gate: Option<Semaphore>,
    contenders: AtomicUsize, // フォークを取りに行っている or 1本以上持っている哲学者の数
    peak_contenders: AtomicUsize,
}

// 取り合いに参加している間だけ存在する
pub struct Seat<'a> {
    table: &'a Table,
    _permit: Option<Permit<'a>>,
}

impl Table {
    pub fn new(n: usize, protocol: Protocol) -> Self {
        assert!(n >= 2);
        Table {
            forks: ForkTable::new(n),
            // 同時に N 人が1本ずつ持つ状態を作らせない
            gate: protocol.uses_gate().then(|| Semaphore::new(n - 1)),
            contenders: AtomicUsize::new(0),
            peak_contenders: AtomicUsize::new(0),
        }
    }

    pub fn forks(&self) -> &ForkTable {
        &self.forks
    }

    pub fn gate(&self) -> Option<&Semaphore> {
        self.gate.as_ref()
    }

    /// 取り合いに参加する。ゲートがあれば空くまで待つ
    pub fn join_contention(&self) -> Seat<'_> {
        let permit = self.gate.as_ref().map(Semaphore::acquire);
        let n = self.contenders.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_contenders.fetch_max(n, Ordering::AcqRel);
        Seat {
            table: self,
            _permit: permit,
        }
    }

    pub fn contenders(&self) -> usize {
        self.contenders.load(Ordering::Acquire)
    }

    pub fn peak_contenders(&self) -> usize {
        self.peak_contenders.load(Ordering::Acquire)
    }
}

impl Drop for Seat<'_> {
    fn drop(&mut self) {
        // permit を返す前に数を戻す
        self.table.contenders.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gate_capacity() {
        let table = Table::new(5, Protocol::Gated);
        assert_eq!(table.gate().map(Semaphore::max), Some(4));
        assert!(Table::new(5, Protocol::Asymmetric).gate().is_none());
    }

    #[test]
    fn test_seat_counts_contenders() {
        let table = Table::new(3, Protocol::Both);
        let a = table.join_contention();
        let b = table.join_contention();
        assert_eq!(table.contenders(), 2);
        assert_eq!(table.gate().unwrap().inside(), 2);
        drop(a);
        drop(b);
        assert_eq!(table.contenders(), 0);
        assert_eq!(table.peak_contenders(), 2);
        assert_eq!(table.gate().unwrap().inside(), 0);
    }
}
