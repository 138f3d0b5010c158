use crate::config::Protocol;

// 哲学者 id が取るフォークの順番 (1本目, 2本目)
pub fn acquisition_order(id: usize, n: usize, protocol: Protocol) -> (usize, usize) {
    assert!(id < n);
    let left = id;
    let right = (id + 1) % n;

    // 最後の哲学者だけは右 (哲学者 0 と共有しているフォーク) から取る
    if protocol.reverses_last() && id == n - 1 {
        (right, left)
    } else {
        (left, right)
    }
}

pub fn table_orders(n: usize, protocol: Protocol) -> Vec<(usize, usize)> {
    (0..n).map(|id| acquisition_order(id, n, protocol)).collect()
}

// 1本目 -> 2本目 の辺でフォークの有向グラフを作り、閉路があるかを調べる
// 閉路がなければ、全員が1本目を持ったまま2本目を待つ状態 (循環待ち) にはならない
pub fn has_circular_wait(orders: &[(usize, usize)]) -> bool {
    let n = orders
        .iter()
        .map(|&(a, b)| a.max(b) + 1)
        .max()
        .unwrap_or(0);

    let mut edges = vec![Vec::new(); n];
    for &(first, second) in orders {
        edges[first].push(second);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Visiting,
        Done,
    }

    let mut marks = vec![Mark::New; n];
    for start in 0..n {
        if marks[start] != Mark::New {
            continue;
        }

        // 再帰を使わない深さ優先探索。スタックには (ノード, 次に見る辺の位置)
        let mut stack = vec![(start, 0)];
        marks[start] = Mark::Visiting;
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            if let Some(&to) = edges[node].get(next) {
                top.1 += 1;
                match marks[to] {
                    Mark::Visiting => return true,
                    Mark::New => {
                        marks[to] = Mark::Visiting;
                        stack.push((to, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    false
}
