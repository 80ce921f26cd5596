use time::OffsetDateTime;

/// How an entry past its grace period was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Identity was unverified: identity and ledger entry deleted.
    Reclaimed,
    /// Identity was verified: only the ledger entry deleted.
    ConfirmedCleaned,
    /// Identity was already gone: only the ledger entry deleted.
    OrphanCleaned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    GracePeriod,
    MissingCreatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Resolved(Resolution),
    Skipped(SkipReason),
    /// Entry left in place for the next run.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResult {
    pub id: String,
    pub email: String,
    pub outcome: RecordOutcome,
}

/// Everything one reaper run did, record by record.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: OffsetDateTime,
    pub results: Vec<RecordResult>,
    /// Resolution tasks that panicked; their entries stay in the ledger.
    pub aborted_tasks: usize,
    /// Stopped paging early because shutdown was requested.
    pub cancelled: bool,
}

impl RunSummary {
    pub fn new(started_at: OffsetDateTime) -> Self {
        Self {
            started_at,
            results: Vec::new(),
            aborted_tasks: 0,
            cancelled: false,
        }
    }

    pub fn push(&mut self, result: RecordResult) {
        self.results.push(result);
    }

    pub fn outcome_of(&self, id: &str) -> Option<&RecordOutcome> {
        self.results.iter().find(|r| r.id == id).map(|r| &r.outcome)
    }

    pub fn count_resolved(&self, resolution: Resolution) -> usize {
        self.count(|o| *o == RecordOutcome::Resolved(resolution))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed(_))) + self.aborted_tasks
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}
