//! Contract intake - program & contract data entry into an Excel workbook
//!
//! Rows entered through a web form are appended to the `dataIn` sheet of a
//! per-session workbook that lives only in memory, as .xlsx bytes. The user
//! downloads the workbook when done.
//!
//! # Example
//!
//! ```no_run
//! use contract_intake::session::SessionState;
//! use contract_intake::types::Record;
//! use chrono::NaiveDate;
//!
//! let mut state = SessionState::initialize(None)?;
//! state.append_row(&Record {
//!     program_name: "Alpha".to_string(),
//!     program_code: "A1".to_string(),
//!     program_budget: 1000.0,
//!     first_contract_name: "C1".to_string(),
//!     first_contractor_name: "Acme".to_string(),
//!     contract_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     contract_finish_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//!     contract_value: 500.0,
//! })?;
//!
//! let preview = state.preview_tail(10)?;
//! println!("Total rows (including header): {}", preview.total_rows);
//! # Ok::<(), contract_intake::error::IntakeError>(())
//! ```

pub mod api;
pub mod error;
pub mod excel;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use error::{IntakeError, IntakeResult};
pub use session::{Preview, SessionId, SessionState, SessionStore};
pub use types::{CellValue, Record, Sheet, Workbook};
