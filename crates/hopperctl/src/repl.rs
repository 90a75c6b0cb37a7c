//! REPL - conversational loop with Grace
//!
//! Each user line goes to the text generator, the reply is printed, then
//! recorded into the ledger. The loop ends when a reply carries the exit
//! marker or input reaches EOF.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use tracing::warn;

use hopper_common::recorder::{ConversationRecorder, RecordOutcome};
use hopper_common::response::CONVERSATION;
use hopper_common::TextGenerator;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// The assistant said goodbye
    Farewell,
    /// Input closed
    EndOfInput,
}

pub fn print_banner(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{}", "> LOAD \"GRACE HOPPER GenAI CLI\",8,1".bright_green())?;
    writeln!(
        out,
        "{}\n",
        "==== Grace Hopper GenAI Confidence Assessment CLI ====".bold()
    )?;
    writeln!(out, "Welcome to the Grace Hopper GenAI Confidence Assessment CLI.")?;
    writeln!(out, "This system is named after Rear Admiral Grace Hopper, a pioneering")?;
    writeln!(out, "computer scientist and United States Navy officer.")?;
    writeln!(out, "How may I assist you today?\n")
}

/// Run the chat loop until farewell or EOF.
pub fn run_repl(
    input: impl BufRead,
    out: &mut impl Write,
    generator: &dyn TextGenerator,
    recorder: &mut ConversationRecorder,
) -> Result<ReplExit> {
    let mut lines = input.lines();

    loop {
        write!(out, "{} ", "You:".bright_cyan())?;
        out.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(out)?;
                return Ok(ReplExit::EndOfInput);
            }
        };
        let user_input = line.trim();
        if user_input.is_empty() {
            continue;
        }

        let reply = match generator.generate(user_input, recorder.context()) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("generation failed: {}", e);
                writeln!(out, "{} {}\n", "System:".yellow(), e)?;
                continue;
            }
        };
        writeln!(out, "{} {}\n", "Grace Hopper AI:".bright_magenta(), reply)?;

        match recorder.record(CONVERSATION, &reply)? {
            RecordOutcome::Exit => {
                writeln!(out, "{} exit\n", "System:".yellow())?;
                writeln!(out, "Exiting the program. Fair winds and following seas!")?;
                return Ok(ReplExit::Farewell);
            }
            RecordOutcome::Logged(logged) => {
                writeln!(out, "{} {}\n", "System:".yellow(), logged.summary)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_common::{GenerationError, Ledger, ScriptedGenerator};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn recorder(dir: &TempDir) -> ConversationRecorder {
        let ledger = Ledger::open(dir.path().join("chain.json")).unwrap();
        ConversationRecorder::with_default_scorer(ledger)
    }

    #[test]
    fn test_repl_records_until_farewell() {
        let dir = TempDir::new().unwrap();
        let mut rec = recorder(&dir);
        let generator = ScriptedGenerator::from_replies([
            "COBOL reads like English.\nGenAI Confidence Assessment:\nReliability: 0.9\nPerformance: 0.9\nContext Coherence: 0.9",
            "Goodbye, sailor. EXIT",
        ]);
        let mut out = Vec::new();

        let exit = run_repl(
            Cursor::new("what is cobol?\n\nbye\nunreached\n"),
            &mut out,
            &generator,
            &mut rec,
        )
        .unwrap();

        assert_eq!(exit, ReplExit::Farewell);
        assert_eq!(rec.ledger().len(), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Overall confidence: 0.90"));
        assert!(text.contains("Fair winds and following seas!"));

        // Second prompt saw the context from the first reply
        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains("Added response: COBOL reads like English."));
    }

    #[test]
    fn test_repl_skips_failed_generation() {
        let dir = TempDir::new().unwrap();
        let mut rec = recorder(&dir);
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationError::Timeout(5)),
            Ok("fine answer".to_string()),
        ]);
        let mut out = Vec::new();

        let exit = run_repl(Cursor::new("one\ntwo\n"), &mut out, &generator, &mut rec).unwrap();

        assert_eq!(exit, ReplExit::EndOfInput);
        assert_eq!(rec.ledger().len(), 2);
        assert!(String::from_utf8(out).unwrap().contains("Request timeout after 5 seconds"));
    }
}
