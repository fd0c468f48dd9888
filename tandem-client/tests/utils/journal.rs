use std::sync::{Arc, Mutex};

/// Ordered log shared by mocks, for asserting cross-collaborator ordering.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries recorded from the first occurrence of `marker` on.
    pub fn since(&self, marker: &str) -> Vec<String> {
        let entries = self.entries();
        match entries.iter().position(|e| e == marker) {
            Some(i) => entries[i..].to_vec(),
            None => vec![],
        }
    }
}
