//! Non-interactive hopperctl commands.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::{Read, Write};
use std::path::Path;

use hopper_common::query::search_records;
use hopper_common::recorder::{ConversationRecorder, RecordOutcome};
use hopper_common::response::{payload_overall_confidence, payload_response_type};
use hopper_common::{HeuristicScorer, HopperConfig, Ledger, OutOfRangePolicy, Record};

/// Characters of payload shown per line in listings
const LISTING_WIDTH: usize = 80;

fn describe(record: &Record) -> String {
    let payload = record.payload();
    let kind = payload_response_type(payload).unwrap_or("-");
    let confidence = payload_overall_confidence(payload)
        .map(|c| format!("{:.2}", c))
        .unwrap_or_else(|| "-".to_string());
    let content = match payload.get("content") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => serde_json::Value::Object(payload.clone()).to_string(),
    };
    let content: String = content.chars().take(LISTING_WIDTH).collect();

    format!(
        "#{:<4} {}  {:<13} conf {:<4}  {}",
        record.index(),
        record.timestamp(),
        kind,
        confidence,
        content
    )
}

/// Record one raw reply read from `source` (a file, or stdin when `None`).
pub fn record(
    ledger: Ledger,
    policy: OutOfRangePolicy,
    response_type: &str,
    source: Option<&Path>,
    out: &mut impl Write,
) -> Result<Ledger> {
    let raw = match source {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read reply from stdin")?;
            buf
        }
    };

    let mut recorder = ConversationRecorder::new(ledger, Box::new(HeuristicScorer::new(policy)));
    match recorder.record(response_type, &raw)? {
        RecordOutcome::Exit => writeln!(out, "Exit marker found; nothing recorded.")?,
        RecordOutcome::Logged(logged) => {
            writeln!(out, "{}", logged.summary)?;
            writeln!(out, "Record #{} {}", logged.index, logged.hash)?;
        }
    }
    Ok(recorder.into_ledger())
}

/// Print payloads matching `query`. Returns the number of matches.
pub fn search(ledger: &Ledger, query: &str, out: &mut impl Write) -> Result<usize> {
    let mut count = 0;
    for record in search_records(ledger, query) {
        writeln!(out, "{}", describe(record))?;
        count += 1;
    }
    if count == 0 {
        writeln!(out, "No records match '{}'.", query)?;
    }
    Ok(count)
}

/// List records, optionally only the last `last`.
pub fn log(ledger: &Ledger, last: Option<usize>, out: &mut impl Write) -> Result<()> {
    let records = ledger.records();
    let skip = last.map_or(0, |n| records.len().saturating_sub(n));
    for record in &records[skip..] {
        writeln!(out, "{}", describe(record))?;
    }
    Ok(())
}

/// Check the chain. Returns whether it is intact.
pub fn verify(ledger: &Ledger, out: &mut impl Write) -> Result<bool> {
    match ledger.verify() {
        Ok(()) => {
            writeln!(
                out,
                "{} {} records, head {}",
                "✓ Ledger intact:".green(),
                ledger.len(),
                ledger.latest().hash()
            )?;
            Ok(true)
        }
        Err(violation) => {
            writeln!(out, "{} {}", "✗ Ledger broken:".red(), violation)?;
            Ok(false)
        }
    }
}

/// Print the effective configuration.
pub fn config(config: &HopperConfig, out: &mut impl Write) -> Result<()> {
    write!(out, "{}", config.to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn ledger(dir: &TempDir) -> Ledger {
        Ledger::open(dir.path().join("chain.json")).unwrap()
    }

    #[test]
    fn test_record_from_file() {
        let dir = TempDir::new().unwrap();
        let reply = dir.path().join("reply.txt");
        std::fs::write(&reply, "Compilers translate.\nReliability: 0.5 Performance: 0.5 Context Coherence: 0.5").unwrap();
        let mut out = Vec::new();

        let ledger = record(
            ledger(&dir),
            OutOfRangePolicy::PassThrough,
            "Conversation",
            Some(&reply),
            &mut out,
        )
        .unwrap();

        assert_eq!(ledger.len(), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Overall confidence: 0.50"));
        assert!(text.contains("Record #1"));
    }

    #[test]
    fn test_record_honors_reject_policy() {
        let dir = TempDir::new().unwrap();
        let reply = dir.path().join("reply.txt");
        let text = "Too sure.\nReliability: 1.7 Performance: 0.5 Context Coherence: 0.5";
        std::fs::write(&reply, text).unwrap();
        let mut out = Vec::new();

        let ledger = record(
            ledger(&dir),
            OutOfRangePolicy::Reject,
            "Conversation",
            Some(&reply),
            &mut out,
        )
        .unwrap();

        let evaluation = &ledger.latest().payload()["evaluation"];
        let expected = hopper_common::scoring::estimate(text);
        assert_eq!(evaluation["reliability"].as_f64(), Some(expected.reliability));
        assert_eq!(evaluation["performance"].as_f64(), Some(0.8));
    }

    #[test]
    fn test_search_reports_no_matches() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        let n = search(&ledger(&dir), "anything", &mut out).unwrap();
        assert_eq!(n, 0);
        assert!(String::from_utf8(out).unwrap().contains("No records match"));
    }

    #[test]
    fn test_log_last_n() {
        let dir = TempDir::new().unwrap();
        let mut l = ledger(&dir);
        for i in 0..3 {
            l.append(json!({"content": format!("entry {}", i)}).as_object().cloned().unwrap())
                .unwrap();
        }
        let mut out = Vec::new();
        log(&l, Some(2), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("entry 2"));
        assert!(!text.contains("entry 0"));
    }

    #[test]
    fn test_verify_intact() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        assert!(verify(&ledger(&dir), &mut out).unwrap());
    }
}
