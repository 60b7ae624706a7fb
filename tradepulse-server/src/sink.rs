//! Trade history sink.
//!
//! Drains the ledger's record channel and appends each executed trade as one
//! JSON line to the configured file - the durable, append-only external store
//! written asynchronously so the ledger's critical section never waits on IO.

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info};
use tradepulse_core::TradeRecord;

/// Run until the ledger (the channel's only sender) is dropped.
pub async fn run(path: PathBuf, mut record_rx: mpsc::UnboundedReceiver<TradeRecord>) {
    info!("history sink writing to {}", path.display());

    while let Some(record) = record_rx.recv().await {
        if let Err(e) = append(&path, &record) {
            error!("failed to persist trade {}: {}", record.id, e);
        }
    }

    info!("history sink drained");
}

fn append(path: &Path, record: &TradeRecord) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(record)?;
    writeln!(file, "{}", line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tradepulse_core::Side;

    #[test]
    fn test_append_writes_one_json_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "tradepulse_sink_test_{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        for id in 1..=3 {
            let record = TradeRecord {
                id,
                side: Side::Buy,
                price: 100.0,
                amount: 0.1,
                time: Utc::now(),
            };
            append(&path, &record).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: TradeRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.side, Side::Buy);

        let _ = std::fs::remove_file(&path);
    }
}
