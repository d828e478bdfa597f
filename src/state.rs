use std::sync::Arc;

use crate::config::Config;
use crate::utils::clock::Clock;
use crate::utils::display_time::DisplayFormat;
use crate::utils::team_directory::TeamDirectory;

// Shared by every worker
pub struct AppState {
    pub directory: Arc<dyn TeamDirectory>,
    pub clock: Arc<dyn Clock>,
    pub display: DisplayFormat,
}

impl AppState {
    pub fn new(directory: Arc<dyn TeamDirectory>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            directory,
            clock,
            display: DisplayFormat::from_offset_minutes(config.display_offset_minutes),
        }
    }
}
