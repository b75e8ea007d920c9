use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines trace of layout decisions. Cheap to clone; every clone writes
/// to the same file, one whole line per lock.
#[derive(Clone)]
pub struct DebugLogger {
    inner: Arc<Mutex<BufWriter<File>>>,
}

/// Counters for one render. Kept by the caller so concurrent renders never
/// share totals.
#[derive(Debug, Default)]
pub struct DebugCounters {
    counts: BTreeMap<&'static str, u64>,
}

impl DebugCounters {
    pub fn increment(&mut self, key: &'static str, amount: u64) {
        let entry = self.counts.entry(key).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Writes one event line. `event` must be a JSON object; `type` is added.
    pub fn log_event(&self, kind: &str, mut event: Value) {
        if let Value::Object(map) = &mut event {
            map.insert("type".to_string(), Value::String(kind.to_string()));
        }
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writeln!(writer, "{event}");
        }
    }

    pub fn emit_summary(&self, context: &str, counters: &DebugCounters) {
        let line = json!({
            "type": "debug.summary",
            "context": context,
            "counts": counters.counts,
        });
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writer.flush();
        }
    }
}

impl std::fmt::Debug for DebugLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugLogger").finish_non_exhaustive()
    }
}
