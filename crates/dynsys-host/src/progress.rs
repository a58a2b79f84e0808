//! The progress channel.
//!
//! Producers implement [`ProgressSink`]. The wire form written by
//! [`StdoutProgress`] is one decimal integer in `0..=100` per line;
//! [`parse_progress_line`] and [`ProgressLog`] are the consumer side.
//!
//! The wire protocol has no framing: any other output on the same
//! stream that happens to be an in-range integer is indistinguishable
//! from progress. Modules therefore never write to stdout.

use std::io::Write;

use crossbeam_channel::{Receiver, Sender};

/// Receives percent-complete values from a running job.
///
/// Best effort: a sink never fails the run. Values arrive already
/// checked to be in `0..=100` and non-decreasing.
pub trait ProgressSink {
    /// Record one value.
    fn emit(&mut self, percent: u8);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn emit(&mut self, percent: u8) {
        (**self).emit(percent);
    }
}

// ── StdoutProgress ──────────────────────────────────────────────

/// Writes the line protocol to standard output, flushing every line.
///
/// Write errors (e.g. a closed pipe) are ignored so a consumer that
/// stops reading never halts the run.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&mut self, percent: u8) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{percent}").and_then(|()| out.flush());
    }
}

/// Writes the line protocol to any writer. Errors are ignored.
#[derive(Debug)]
pub struct LineProgress<W: Write> {
    writer: W,
}

impl<W: Write> LineProgress<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressSink for LineProgress<W> {
    fn emit(&mut self, percent: u8) {
        let _ = writeln!(self.writer, "{percent}").and_then(|()| self.writer.flush());
    }
}

// ── ChannelProgress ─────────────────────────────────────────────

/// Forwards values over a crossbeam channel.
///
/// A dropped receiver is ignored. With a bounded sender a slow
/// consumer applies backpressure; [`unbounded()`](Self::unbounded)
/// never blocks.
#[derive(Clone, Debug)]
pub struct ChannelProgress {
    tx: Sender<u8>,
}

impl ChannelProgress {
    /// Wrap an existing sender.
    pub fn new(tx: Sender<u8>) -> Self {
        Self { tx }
    }

    /// A sink over a fresh unbounded channel, plus its receiver.
    pub fn unbounded() -> (Self, Receiver<u8>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&mut self, percent: u8) {
        let _ = self.tx.send(percent);
    }
}

// ── RecordingProgress ───────────────────────────────────────────

/// Keeps every value in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingProgress {
    values: Vec<u8>,
}

impl RecordingProgress {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Values in emission order.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Take the values.
    pub fn into_values(self) -> Vec<u8> {
        self.values
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&mut self, percent: u8) {
        self.values.push(percent);
    }
}

// ── Consumer side ───────────────────────────────────────────────

/// Parse one protocol line: ASCII digits only, value in `0..=100`.
///
/// A trailing `\n` or `\r\n` is accepted. Anything else (signs,
/// whitespace, decimals, out-of-range values) is not progress.
pub fn parse_progress_line(line: &str) -> Option<u8> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() || line.len() > 3 || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse::<u8>().ok().filter(|v| *v <= 100)
}

/// Tracks an observed progress sequence.
///
/// A run is complete iff `100` was observed; a stream that ends
/// without it means the producer failed or was killed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressLog {
    values: Vec<u8>,
    regressions: usize,
}

impl ProgressLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. Returns `false` (and records nothing) for a value
    /// above 100 or below the last one.
    pub fn record(&mut self, percent: u8) -> bool {
        if percent > 100 || self.last().is_some_and(|last| percent < last) {
            self.regressions += 1;
            return false;
        }
        self.values.push(percent);
        true
    }

    /// Values accepted so far.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Most recent accepted value.
    pub fn last(&self) -> Option<u8> {
        self.values.last().copied()
    }

    /// `true` once `100` has been recorded.
    pub fn completed(&self) -> bool {
        self.last() == Some(100)
    }

    /// Number of values refused by [`record()`](Self::record).
    pub fn rejected(&self) -> usize {
        self.regressions
    }
}

impl ProgressSink for ProgressLog {
    fn emit(&mut self, percent: u8) {
        self.record(percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_only_plain_in_range_integers() {
        assert_eq!(parse_progress_line("0"), Some(0));
        assert_eq!(parse_progress_line("42\n"), Some(42));
        assert_eq!(parse_progress_line("100\r\n"), Some(100));
        for bad in ["", "101", "-1", "+5", " 5", "5 ", "5.0", "1e2", "0100", "progress 5"] {
            assert_eq!(parse_progress_line(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn log_completes_only_on_100() {
        let mut log = ProgressLog::new();
        for v in 0..100 {
            assert!(log.record(v));
        }
        assert!(!log.completed());
        assert!(log.record(100));
        assert!(log.completed());
    }

    #[test]
    fn log_refuses_regressions() {
        let mut log = ProgressLog::new();
        assert!(log.record(10));
        assert!(!log.record(9));
        assert!(log.record(10));
        assert_eq!(log.values(), [10, 10]);
        assert_eq!(log.rejected(), 1);
    }

    #[test]
    fn channel_ignores_dropped_receiver() {
        let (mut sink, rx) = ChannelProgress::unbounded();
        sink.emit(1);
        assert_eq!(rx.recv().unwrap(), 1);
        drop(rx);
        sink.emit(2);
    }

    #[test]
    fn line_progress_writes_protocol() {
        let mut sink = LineProgress::new(Vec::new());
        sink.emit(0);
        sink.emit(50);
        sink.emit(100);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "0\n50\n100\n");
        let parsed: Vec<_> = text.lines().filter_map(parse_progress_line).collect();
        assert_eq!(parsed, [0, 50, 100]);
    }
}
