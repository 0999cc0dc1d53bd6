//! Status renderer that prints one line per refresh to the console.

use log::info;

use crate::app::events::StatusSnapshot;
use crate::app::ports::StatusRenderer;

#[derive(Debug, Default)]
pub struct LogStatusRenderer {
    last: Option<StatusSnapshot>,
}

impl LogStatusRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&StatusSnapshot> {
        self.last.as_ref()
    }
}

impl StatusRenderer for LogStatusRenderer {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        // Unchanged snapshots are not worth a UART line.
        if self.last.as_ref() == Some(snapshot) {
            return;
        }
        info!("STATUS | {}", snapshot);
        self.last = Some(*snapshot);
    }
}
