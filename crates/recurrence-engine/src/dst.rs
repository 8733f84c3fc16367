//! DST transition policies for occurrences resolved to UTC.

use serde::{Deserialize, Serialize};

/// Policy for wall-clock times that do not exist in the target zone.
///
/// Ambiguous times (the repeated hour when clocks fall back) always resolve
/// to the earlier offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop instances that fall in the DST gap (e.g., 2:30 AM during spring forward)
    Skip,
    /// Move the instance forward by the length of the gap
    #[default]
    ShiftForward,
}
