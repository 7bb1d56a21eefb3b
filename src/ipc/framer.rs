//! Newline framing for the worker's stdout.
//!
//! Chunks arrive in whatever sizes the pipe hands us. Complete lines are queued as
//! soon as their delimiter shows up; only the unterminated tail is carried over.

use crate::{log_debug, log_debug_content};
use std::collections::VecDeque;

/// Upper bound for a single unterminated line before it is dropped.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct LineFramer {
    carry: Vec<u8>,
    ready: VecDeque<String>,
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and iterate the protocol lines it completed.
    pub fn push(&mut self, chunk: &[u8]) -> FramedLines<'_> {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];
            if self.discarding {
                self.discarding = false;
                self.carry.clear();
                continue;
            }
            self.carry.extend_from_slice(head);
            let line = std::mem::take(&mut self.carry);
            self.enqueue(&line);
        }

        if !self.discarding {
            self.carry.extend_from_slice(rest);
            if self.carry.len() > MAX_LINE_BYTES {
                log_debug(&format!(
                    "worker line exceeded {MAX_LINE_BYTES} bytes without a newline; dropping it"
                ));
                self.carry = Vec::new();
                self.discarding = true;
            }
        }

        FramedLines { framer: self }
    }

    /// End of stream: flush the unterminated tail if it looks like a message.
    pub fn finish(&mut self) -> FramedLines<'_> {
        let tail = std::mem::take(&mut self.carry);
        if !self.discarding && !tail.is_empty() {
            self.enqueue(&tail);
        }
        self.discarding = false;
        FramedLines { framer: self }
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_bytes(&self) -> usize {
        self.carry.len()
    }

    fn enqueue(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if !trimmed.starts_with('{') {
            log_debug_content(&format!("worker stdout: {trimmed}"));
            return;
        }
        self.ready.push_back(trimmed.to_string());
    }
}

/// Lines completed by the most recent `push`.
pub struct FramedLines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for FramedLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.framer.ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut framer = LineFramer::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(framer.push(chunk));
        }
        out.extend(framer.finish());
        out
    }

    #[test]
    fn reassembles_line_split_across_chunks() {
        let lines = frame_all(&[b"{\"type\":\"lo", b"g\",\"message\":\"hi\"}", b"\n"]);
        assert_eq!(lines, vec!["{\"type\":\"log\",\"message\":\"hi\"}"]);
    }

    #[test]
    fn separates_multiple_lines_in_one_chunk() {
        let lines = frame_all(&[b"{\"a\":1}\n{\"b\":2}\n{\"c\":"]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "{\"a\":1}");
        assert_eq!(lines[1], "{\"b\":2}");
        assert_eq!(lines[2], "{\"c\":");
    }

    #[test]
    fn every_split_point_yields_the_same_lines() {
        let stream = b"{\"id\":\"1\"}\n{\"id\":\"2\"}\r\n\n{\"id\":\"3\"}\n";
        let expected = vec!["{\"id\":\"1\"}", "{\"id\":\"2\"}", "{\"id\":\"3\"}"];
        for first in 0..=stream.len() {
            for second in first..=stream.len() {
                let lines = frame_all(&[
                    &stream[..first],
                    &stream[first..second],
                    &stream[second..],
                ]);
                assert_eq!(lines, expected, "split at {first}/{second}");
            }
        }
    }

    #[test]
    fn byte_at_a_time_delivery() {
        let stream = "{\"message\":\"naïve ♪\"}\n{\"n\":2}\n".as_bytes();
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for byte in stream {
            lines.extend(framer.push(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, vec!["{\"message\":\"naïve ♪\"}", "{\"n\":2}"]);
        assert_eq!(framer.pending_bytes(), 0);
    }

    #[test]
    fn skips_blank_and_non_object_lines() {
        let lines = frame_all(&[b"\n   \nScript directory: /opt\n[1,2]\n{\"ok\":true}\n"]);
        assert_eq!(lines, vec!["{\"ok\":true}"]);
    }

    #[test]
    fn carry_never_holds_a_complete_line() {
        let mut framer = LineFramer::new();
        let drained: Vec<String> = framer.push(b"{\"a\":1}\n{\"b\"").collect();
        assert_eq!(drained, vec!["{\"a\":1}"]);
        assert_eq!(framer.pending_bytes(), "{\"b\"".len());
    }

    #[test]
    fn finish_ignores_non_object_tail() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"bye").count(), 0);
        assert_eq!(framer.finish().next(), None);
        assert_eq!(framer.pending_bytes(), 0);
    }

    #[test]
    fn oversized_line_is_dropped_until_next_newline() {
        let mut framer = LineFramer::new();
        let mut big = vec![b'{'];
        big.resize(MAX_LINE_BYTES + 1, b'x');
        assert_eq!(framer.push(&big).count(), 0);
        assert_eq!(framer.pending_bytes(), 0);
        let lines: Vec<String> = framer.push(b"xxx\n{\"after\":1}\n").collect();
        assert_eq!(lines, vec!["{\"after\":1}"]);
    }
}
