//! Quota maintenance: the only operation that mutates the workbook
//!
//! A patch always copies the workbook to a timestamped backup first and reads
//! the written cells back afterwards. Dashboards holding a cached copy of the
//! quota sheet will not see the change until their cache entry expires.

mod backup;
mod quota;
mod xlsx_cells;

pub use backup::{backup_path, create_backup, latest_backup, restore_backup};
pub use quota::{
    PatchedCell, QuotaPatch, QuotaPatchOutcome, apply_quota_patch, ensure_writable,
    plan_quota_patch,
};
pub use xlsx_cells::{cell_reference, write_numeric_cells};
