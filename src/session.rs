//! Session-scoped workbook state
//!
//! Each session owns exactly one serialized workbook. Every read re-parses the
//! stored bytes into a fresh [`Workbook`]. A write replaces the stored blob only
//! after the complete new one has been serialized.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{IntakeError, IntakeResult};
use crate::excel::{WorkbookReader, WorkbookWriter};
use crate::types::{CellValue, Record, Workbook, DEFAULT_FILENAME};

//==============================================================================
// Session State
//==============================================================================

/// Trailing rows of the data sheet plus the sheet's total row count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    /// Rows in the data sheet, header included
    pub total_rows: usize,
    pub rows: Vec<Vec<CellValue>>,
}

/// One session's workbook, held as .xlsx bytes
#[derive(Debug, Clone)]
pub struct SessionState {
    bytes: Vec<u8>,
    filename: String,
}

impl SessionState {
    /// Build the starting state from an upload, or from the header-only template
    pub fn initialize(upload: Option<&[u8]>) -> IntakeResult<Self> {
        let workbook = match upload {
            Some(bytes) => {
                let workbook = WorkbookReader::new(bytes)
                    .read()
                    .map_err(|e| IntakeError::MalformedUpload(e.to_string()))?;
                if workbook.sheets.is_empty() {
                    return Err(IntakeError::MalformedUpload(
                        "workbook contains no worksheets".to_string(),
                    ));
                }
                workbook
            }
            None => Workbook::template(),
        };

        let bytes = WorkbookWriter::new(&workbook).to_bytes()?;
        Ok(Self {
            bytes,
            filename: DEFAULT_FILENAME.to_string(),
        })
    }

    /// Serialized workbook, as offered for download
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Fresh workbook parsed from the stored bytes
    pub fn current_workbook(&self) -> IntakeResult<Workbook> {
        WorkbookReader::new(&self.bytes)
            .read()
            .map_err(|e| IntakeError::CorruptState(e.to_string()))
    }

    /// Append one record to the data sheet and replace the stored bytes.
    ///
    /// Returns the data sheet's new row count.
    pub fn append_row(&mut self, record: &Record) -> IntakeResult<usize> {
        let mut workbook = self.current_workbook()?;
        let sheet = workbook
            .data_sheet_mut()
            .ok_or_else(|| IntakeError::CorruptState("workbook has no worksheets".to_string()))?;
        sheet.append_row(record.to_row());
        let row_count = sheet.row_count();

        let bytes = WorkbookWriter::new(&workbook).to_bytes()?;
        self.bytes = bytes;
        Ok(row_count)
    }

    /// Last `n` rows of the data sheet (all rows when there are fewer)
    pub fn preview_tail(&self, n: usize) -> IntakeResult<Preview> {
        let workbook = self.current_workbook()?;
        let mut rows = workbook
            .data_sheet()
            .map(|sheet| sheet.rows.clone())
            .unwrap_or_default();

        let total_rows = rows.len();
        let rows = rows.split_off(total_rows.saturating_sub(n));
        Ok(Preview { total_rows, rows })
    }
}

//==============================================================================
// Session Store
//==============================================================================

/// Opaque session identifier carried by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(SessionId)
            .map_err(|_| IntakeError::SessionNotFound(s.to_string()))
    }
}

/// A session's state plus the last time a request touched it
#[derive(Debug)]
struct LiveSession {
    state: SessionState,
    last_seen: Instant,
}

impl LiveSession {
    fn new(state: SessionState) -> Self {
        Self {
            state,
            last_seen: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

/// All live sessions, keyed by id. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<SessionId, LiveSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session, from an upload if one is given
    pub fn create(&self, upload: Option<&[u8]>) -> IntakeResult<SessionId> {
        let state = SessionState::initialize(upload).inspect_err(|e| {
            warn!("Session initialization rejected: {}", e);
        })?;
        let id = SessionId::new();
        self.sessions.insert(id, LiveSession::new(state));
        let source = if upload.is_some() { "upload" } else { "template" };
        info!(session = %id, source, "Session created");
        Ok(id)
    }

    /// Reuse `id` when it names a live session, otherwise start a default one
    pub fn get_or_create(&self, id: Option<SessionId>) -> IntakeResult<SessionId> {
        if let Some(id) = id {
            if let Some(mut live) = self.sessions.get_mut(&id) {
                live.touch();
                return Ok(id);
            }
            debug!(session = %id, "Unknown session id, starting a new session");
        }
        self.create(None)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Run `f` against one session's state, holding only its map shard
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SessionState) -> IntakeResult<R>,
    ) -> IntakeResult<R> {
        let mut live = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| IntakeError::SessionNotFound(id.to_string()))?;
        live.touch();
        f(&mut live.state)
    }

    /// End a session and drop its workbook
    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            info!(session = %id, "Session ended");
        }
        removed
    }

    /// End every session not touched within `ttl`. Returns how many ended.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, live| {
            let keep = live.last_seen.elapsed() < ttl;
            if !keep {
                debug!(session = %id, "Session idle past {:?}", ttl);
            }
            keep
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "Idle sessions ended");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HEADER;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(name: &str) -> Record {
        Record {
            program_name: name.to_string(),
            program_code: "A1".to_string(),
            program_budget: 1000.0,
            first_contract_name: "C1".to_string(),
            first_contractor_name: "Acme".to_string(),
            contract_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            contract_finish_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            contract_value: 500.0,
        }
    }

    #[test]
    fn test_default_initialize_is_header_only() {
        let state = SessionState::initialize(None).unwrap();
        assert_eq!(state.filename(), "MainData.xlsx");

        let wb = state.current_workbook().unwrap();
        let sheet = wb.data_sheet().unwrap();
        assert_eq!(sheet.name, "dataIn");
        assert_eq!(sheet.row_count(), 1);
        let header: Vec<&str> = sheet.rows[0].iter().filter_map(|c| c.as_text()).collect();
        assert_eq!(header, HEADER.to_vec());
    }

    #[test]
    fn test_malformed_upload_rejected() {
        let err = SessionState::initialize(Some(b"not a workbook")).unwrap_err();
        assert!(matches!(err, IntakeError::MalformedUpload(_)));
    }

    #[test]
    fn test_append_returns_new_row_count() {
        let mut state = SessionState::initialize(None).unwrap();
        assert_eq!(state.append_row(&record("Alpha")).unwrap(), 2);
        assert_eq!(state.append_row(&record("Beta")).unwrap(), 3);
    }

    #[test]
    fn test_corrupt_state_detected() {
        let mut state = SessionState::initialize(None).unwrap();
        state.bytes = b"garbage".to_vec();

        assert!(matches!(
            state.current_workbook().unwrap_err(),
            IntakeError::CorruptState(_)
        ));
        assert!(matches!(
            state.append_row(&record("Alpha")).unwrap_err(),
            IntakeError::CorruptState(_)
        ));
        // failed append leaves the stored bytes untouched
        assert_eq!(state.bytes(), b"garbage");
    }

    #[test]
    fn test_preview_tail_zero_rows() {
        let state = SessionState::initialize(None).unwrap();
        let preview = state.preview_tail(0).unwrap();
        assert_eq!(preview.total_rows, 1);
        assert!(preview.rows.is_empty());
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_store_create_and_remove() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let id = store.create(None).unwrap();
        assert!(store.contains(id));
        assert_eq!(store.len(), 1);

        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_get_or_create_reuses_live_session() {
        let store = SessionStore::new();
        let id = store.get_or_create(None).unwrap();
        assert_eq!(store.get_or_create(Some(id)).unwrap(), id);
        assert_eq!(store.len(), 1);

        let stale = SessionId::new();
        let fresh = store.get_or_create(Some(stale)).unwrap();
        assert_ne!(fresh, stale);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_with_unknown_session() {
        let store = SessionStore::new();
        let err = store
            .with_session(SessionId::new(), |s| s.preview_tail(10))
            .unwrap_err();
        assert!(matches!(err, IntakeError::SessionNotFound(_)));
    }

    #[test]
    fn test_store_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create(None).unwrap();
        let b = store.create(None).unwrap();

        store
            .with_session(a, |s| s.append_row(&record("Alpha")))
            .unwrap();

        let rows_a = store.with_session(a, |s| s.preview_tail(10)).unwrap();
        let rows_b = store.with_session(b, |s| s.preview_tail(10)).unwrap();
        assert_eq!(rows_a.total_rows, 2);
        assert_eq!(rows_b.total_rows, 1);
    }

    #[test]
    fn test_store_concurrent_appends_across_sessions() {
        let store = SessionStore::new();
        let ids: Vec<SessionId> = (0..4).map(|_| store.create(None).unwrap()).collect();

        let handles: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(n, &id)| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..=n {
                        store
                            .with_session(id, |s| s.append_row(&record("Alpha")))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for (n, &id) in ids.iter().enumerate() {
            let preview = store.with_session(id, |s| s.preview_tail(0)).unwrap();
            assert_eq!(preview.total_rows, n + 2);
        }
    }

    #[test]
    fn test_store_rejects_malformed_upload_without_inserting() {
        let store = SessionStore::new();
        assert!(store.create(Some(b"nope")).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_evicts_idle_sessions() {
        let store = SessionStore::new();
        let id = store.create(None).unwrap();

        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert!(store.contains(id));

        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(!store.contains(id));
        assert!(store.is_empty());

        // an evicted id is treated like any unknown id
        assert_ne!(store.get_or_create(Some(id)).unwrap(), id);
    }

    #[test]
    fn test_store_access_refreshes_idle_clock() {
        let store = SessionStore::new();
        let active = store.create(None).unwrap();
        let idle = store.create(None).unwrap();

        std::thread::sleep(Duration::from_millis(300));
        store.with_session(active, |s| s.preview_tail(1)).unwrap();

        assert_eq!(store.evict_idle(Duration::from_millis(200)), 1);
        assert!(store.contains(active));
        assert!(!store.contains(idle));
    }
}
