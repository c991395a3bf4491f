//! Scripted and counting storage handles for engine unit tests
//!
//! [`ScriptedHandle`] replays queued outcomes and records which plan modes
//! were executed, so runner tests can fake any rows-affected count without a
//! backend. [`CountingConn`] counts every query it sees, so manager tests
//! can assert that a refused operation issued zero queries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use plinth_core::{
    Connection, Entity, Error, ExecMode, QueryPlan, Result, SelectQuery, StorageHandle, TxnHandle,
    WriteOutcome,
};

enum Scripted {
    Outcome(WriteOutcome),
    Error(String),
}

/// Replays queued outcomes in order and records executed plan modes
pub(crate) struct ScriptedHandle {
    script: VecDeque<Scripted>,
    select_rows: VecDeque<Vec<Entity>>,
    pub(crate) calls: Vec<ExecMode>,
}

impl ScriptedHandle {
    pub(crate) fn new() -> Self {
        ScriptedHandle {
            script: VecDeque::new(),
            select_rows: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Queue a full outcome
    pub(crate) fn push_outcome(&mut self, outcome: WriteOutcome) {
        self.script.push_back(Scripted::Outcome(outcome));
    }

    /// Queue an outcome affecting `rows` rows with nothing returned
    pub(crate) fn push_rows(&mut self, rows: u64) {
        self.push_outcome(WriteOutcome {
            rows_affected: rows,
            returned: Vec::new(),
        });
    }

    /// Queue a backend failure
    pub(crate) fn push_error(&mut self, message: &str) {
        self.script.push_back(Scripted::Error(message.to_string()));
    }

    /// Queue a select result
    pub(crate) fn push_select(&mut self, rows: Vec<Entity>) {
        self.select_rows.push_back(rows);
    }

    fn next(&mut self, mode: ExecMode) -> Result<WriteOutcome> {
        self.calls.push(mode);
        match self.script.pop_front() {
            Some(Scripted::Outcome(outcome)) => Ok(outcome),
            Some(Scripted::Error(message)) => Err(Error::Storage(message)),
            None => panic!("scripted handle ran out of outcomes"),
        }
    }
}

impl StorageHandle for ScriptedHandle {
    fn execute_insert(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.next(ExecMode::Insert)
    }

    fn execute_update(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.next(ExecMode::Update)
    }

    fn execute_delete(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        self.next(plan.mode)
    }

    fn execute_select(&mut self, _query: &SelectQuery) -> Result<Vec<Entity>> {
        Ok(self.select_rows.pop_front().unwrap_or_default())
    }
}

/// Counts queries; every executed plan succeeds vacuously
pub(crate) struct CountingConn {
    queries: Arc<AtomicUsize>,
}

impl CountingConn {
    pub(crate) fn new() -> (Self, Arc<AtomicUsize>) {
        let queries = Arc::new(AtomicUsize::new(0));
        (
            CountingConn {
                queries: Arc::clone(&queries),
            },
            queries,
        )
    }

    fn bump(&self) -> Result<WriteOutcome> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(WriteOutcome {
            rows_affected: 1,
            returned: Vec::new(),
        })
    }
}

impl StorageHandle for CountingConn {
    fn execute_insert(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.bump()
    }

    fn execute_update(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.bump()
    }

    fn execute_delete(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.bump()
    }

    fn execute_select(&mut self, _query: &SelectQuery) -> Result<Vec<Entity>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

impl Connection for CountingConn {
    type Txn = CountingTxn;

    fn begin(&mut self) -> Result<CountingTxn> {
        Ok(CountingTxn {
            queries: Arc::clone(&self.queries),
        })
    }
}

/// Transaction twin of [`CountingConn`]
pub(crate) struct CountingTxn {
    queries: Arc<AtomicUsize>,
}

impl CountingTxn {
    fn bump(&self) -> Result<WriteOutcome> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(WriteOutcome {
            rows_affected: 1,
            returned: Vec::new(),
        })
    }
}

impl StorageHandle for CountingTxn {
    fn execute_insert(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.bump()
    }

    fn execute_update(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.bump()
    }

    fn execute_delete(&mut self, _plan: &QueryPlan) -> Result<WriteOutcome> {
        self.bump()
    }

    fn execute_select(&mut self, _query: &SelectQuery) -> Result<Vec<Entity>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

impl TxnHandle for CountingTxn {
    fn commit(self) -> Result<()> {
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        Ok(())
    }
}
