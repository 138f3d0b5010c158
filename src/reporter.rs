use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Thinking { id: usize },
    Hungry { id: usize },
    PickedUp { id: usize, fork: usize },
    Eating { id: usize },
    PutDown { id: usize, forks: (usize, usize) },
    Finished { id: usize },
    AllFinished,
}

impl Event {
    pub fn philosopher(&self) -> Option<usize> {
        match *self {
            Event::Thinking { id }
            | Event::Hungry { id }
            | Event::PickedUp { id, .. }
            | Event::Eating { id }
            | Event::PutDown { id, .. }
            | Event::Finished { id } => Some(id),
            Event::AllFinished => None,
        }
    }

    // 色は見た目だけで意味はない
    fn color(&self) -> &'static str {
        match self {
            Event::Thinking { .. } => "\x1b[36m",
            Event::Hungry { .. } => "\x1b[34m",
            Event::PickedUp { .. } => "\x1b[33m",
            Event::Eating { .. } => "\x1b[32m",
            Event::PutDown { .. } => "\x1b[35m",
            Event::Finished { .. } => "\x1b[31m",
            Event::AllFinished => "\x1b[32m",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Thinking { id } => write!(f, "Philosopher {id}: thinking..."),
            Event::Hungry { id } => write!(f, "Philosopher {id}: wants to eat."),
            Event::PickedUp { id, fork } => write!(f, "Philosopher {id}: picked up fork {fork}"),
            Event::Eating { id } => write!(f, "Philosopher {id}: eating."),
            Event::PutDown { id, forks: (a, b) } => {
                write!(f, "Philosopher {id}: ate, put down forks {a} and {b}.")
            }
            Event::Finished { id } => write!(f, "Philosopher {id}: finished."),
            Event::AllFinished => write!(f, "All philosophers have finished eating."),
        }
    }
}

// 全哲学者から共有される出力先
pub trait Reporter: Send + Sync {
    fn report(&self, event: Event);
}

pub struct ConsoleReporter<W> {
    out: Mutex<W>,
    colored: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        use std::io::IsTerminal;
        let colored = io::stdout().is_terminal();
        ConsoleReporter::new(io::stdout(), colored)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, colored: bool) -> Self {
        ConsoleReporter {
            out: Mutex::new(out),
            colored,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn report(&self, event: Event) {
        debug!(?event, "report");

        // 1行をまとめて作ってから、ロック中に一度で書き込む
        let line = if self.colored {
            format!("{}{}\x1b[0m\n", event.color(), event)
        } else {
            format!("{}\n", event)
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write event");
        }
    }
}

// 届いた順にすべてのイベントを記録する (テスト用)
#[derive(Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<Event>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // 哲学者 id が出したイベントだけを順番どおりに取り出す
    pub fn events_of(&self, id: usize) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.philosopher() == Some(id))
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: Event) {
        debug!(?event, "report");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
