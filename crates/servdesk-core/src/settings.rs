// ── List screen settings ──

use std::time::Duration;

use crate::upload::UploadPolicy;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Tunables shared by every management screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSettings {
    /// Quiet period before typed search text is applied.
    pub debounce: Duration,
    /// Rows per page.
    pub page_size: u32,
    pub upload: UploadPolicy,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            upload: UploadPolicy::default(),
        }
    }
}
