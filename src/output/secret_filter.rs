//! Secret redactor
//!
//! Masks every occurrence of the configured secrets in a byte stream that may
//! arrive in arbitrary fragments. Input is split into lines; a line is only
//! forwarded once it is proven to be either free of secrets or fully redacted.
//! Lines that might be the beginning of a multi-line secret are held back
//! until enough following lines arrive to confirm or rule the match out.

use std::io::{self, Write};
use std::ops::Range;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Replacement written in place of each matched secret span.
pub const REDACTED: &str = "[REDACTED]";

/// A secret split into the literal lines it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Secret {
    lines: Vec<Vec<u8>>,
}

impl Secret {
    /// Surrounding blank lines carry nothing to match, so they are dropped.
    fn parse(value: &str) -> Option<Self> {
        let lines: Vec<&str> = value.split('\n').collect();
        let first = lines.iter().position(|line| !line.is_empty())?;
        let last = lines.iter().rposition(|line| !line.is_empty())?;
        Some(Self {
            lines: lines[first..=last]
                .iter()
                .map(|line| line.as_bytes().to_vec())
                .collect(),
        })
    }

    fn len(&self) -> usize {
        self.lines.len()
    }
}

/// False for values that are empty once blank lines are dropped.
pub fn is_redactable(secret: &str) -> bool {
    Secret::parse(secret).is_some()
}

/// A confirmed occurrence of `secret` whose first line is `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SecretMatch {
    secret: usize,
    start: usize,
}

#[derive(Debug, Default)]
struct MatchSet {
    confirmed: Vec<SecretMatch>,
    /// Earliest line that starts a match still waiting for more lines.
    first_partial: Option<usize>,
}

struct FilterState<W> {
    inner: W,
    /// Bytes after the last line terminator.
    remainder: Vec<u8>,
    /// Complete lines not yet proven safe.
    store: Vec<Vec<u8>>,
    last_write: Option<Instant>,
}

pub struct SecretFilter<W: Write> {
    secrets: Vec<Secret>,
    state: Mutex<FilterState<W>>,
}

impl<W: Write> SecretFilter<W> {
    pub fn new<S: AsRef<str>>(secrets: &[S], inner: W) -> Self {
        let secrets: Vec<Secret> = secrets
            .iter()
            .filter_map(|secret| Secret::parse(secret.as_ref()))
            .collect();
        tracing::debug!("Secret filter created with {} secret(s)", secrets.len());

        Self {
            secrets,
            state: Mutex::new(FilterState {
                inner,
                remainder: Vec::new(),
                store: Vec::new(),
                last_write: None,
            }),
        }
    }

    /// True when at least one usable secret was configured.
    pub fn has_secrets(&self) -> bool {
        !self.secrets.is_empty()
    }

    /// Feeds bytes from a shared reference; serialized by the internal lock.
    pub fn write_shared(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock()?;
        self.process(&mut state, buf)?;
        Ok(buf.len())
    }

    /// Releases everything still held, redacting only confirmed matches.
    ///
    /// Call once the producer is done writing. Matches that were still open
    /// can no longer complete, so they are ruled out. A trailing partial line
    /// is forwarded as-is, without a terminator added.
    pub fn finish_shared(&self) -> io::Result<()> {
        let mut state = self.lock()?;

        let mut lines = std::mem::take(&mut state.store);
        if !state.remainder.is_empty() {
            lines.push(std::mem::take(&mut state.remainder));
        }
        if lines.is_empty() {
            return Ok(());
        }

        let matches = self.match_secrets(&lines);
        self.release(&mut state, lines, &matches.confirmed)?;
        state.inner.flush()
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.finish_shared()
    }

    /// When redacted bytes were last handed to the inner writer.
    pub fn last_write(&self) -> Option<Instant> {
        self.lock().ok().and_then(|state| state.last_write)
    }

    /// Number of complete lines currently held back.
    pub fn held_lines(&self) -> usize {
        self.lock().map(|state| state.store.len()).unwrap_or(0)
    }

    pub fn inner_mut(&mut self) -> io::Result<&mut W> {
        self.state
            .get_mut()
            .map(|state| &mut state.inner)
            .map_err(|_| poisoned())
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.state
            .into_inner()
            .map(|state| state.inner)
            .map_err(|_| poisoned())
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, FilterState<W>>> {
        self.state.lock().map_err(|_| poisoned())
    }

    fn process(&self, state: &mut FilterState<W>, buf: &[u8]) -> io::Result<()> {
        state.remainder.extend_from_slice(buf);
        if !buf.contains(&b'\n') {
            return Ok(());
        }
        let completed = split_lines(&mut state.remainder);
        if completed.is_empty() {
            return Ok(());
        }

        let mut lines = std::mem::take(&mut state.store);
        lines.extend(completed);

        let matches = self.match_secrets(&lines);
        let cut = self.release_cut(&matches, lines.len());
        state.store = lines.split_off(cut);

        if !lines.is_empty() {
            let confirmed: Vec<SecretMatch> = matches
                .confirmed
                .into_iter()
                .filter(|m| m.start < cut)
                .collect();
            self.release(state, lines, &confirmed)?;
        }
        Ok(())
    }

    /// Finds where every secret starts in `lines`.
    ///
    /// Each line containing a secret's first line starts a candidate. Single
    /// line secrets confirm at once. Multi-line secrets confirm when every
    /// following line contains the next secret line, are ruled out on the
    /// first line that does not, and stay partial when `lines` runs out.
    fn match_secrets(&self, lines: &[Vec<u8>]) -> MatchSet {
        let mut matches = MatchSet::default();

        for (secret_idx, secret) in self.secrets.iter().enumerate() {
            for start in 0..lines.len() {
                if !contains(&lines[start], &secret.lines[0]) {
                    continue;
                }

                match follow_secret(secret, lines, start) {
                    Candidate::Confirmed => matches.confirmed.push(SecretMatch {
                        secret: secret_idx,
                        start,
                    }),
                    Candidate::Partial => {
                        matches.first_partial = Some(
                            matches
                                .first_partial
                                .map_or(start, |first| first.min(start)),
                        );
                    }
                    Candidate::RuledOut => {}
                }
            }
        }

        matches
    }

    /// Index of the first line that must be held back.
    ///
    /// Starts at the earliest partial match, then moves back over any
    /// confirmed match that would be split by the cut.
    fn release_cut(&self, matches: &MatchSet, line_count: usize) -> usize {
        let mut cut = match matches.first_partial {
            Some(first) => first,
            None => return line_count,
        };

        loop {
            let straddling = matches
                .confirmed
                .iter()
                .filter(|m| m.start < cut && m.start + self.secrets[m.secret].len() > cut)
                .map(|m| m.start)
                .min();
            match straddling {
                Some(start) => cut = start,
                None => return cut,
            }
        }
    }

    fn release(
        &self,
        state: &mut FilterState<W>,
        lines: Vec<Vec<u8>>,
        confirmed: &[SecretMatch],
    ) -> io::Result<()> {
        let mut redactions = 0;

        for (idx, line) in lines.into_iter().enumerate() {
            let spans = self.secret_spans(&line, idx, confirmed);
            redactions += spans.len();
            let line = redact_spans(line, &spans);
            state.inner.write_all(&line)?;
            state.last_write = Some(Instant::now());
        }

        if redactions > 0 {
            tracing::debug!("Redacted {} secret span(s)", redactions);
        }
        Ok(())
    }

    /// Merged byte ranges of `line` covered by confirmed matches.
    fn secret_spans(&self, line: &[u8], idx: usize, confirmed: &[SecretMatch]) -> Vec<Range<usize>> {
        let mut spans: Vec<Range<usize>> = confirmed
            .iter()
            .filter_map(|m| {
                let secret = &self.secrets[m.secret];
                (m.start..m.start + secret.len())
                    .contains(&idx)
                    .then(|| &secret.lines[idx - m.start])
            })
            .flat_map(|needle| find_all(line, needle))
            .collect();

        spans.sort_by_key(|span| (span.start, span.end));
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start < last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }
        merged
    }
}

impl<W: Write> Write for SecretFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_shared(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.inner.flush()
    }
}

impl<W: Write> Write for &SecretFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_shared(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.inner.flush()
    }
}

enum Candidate {
    Confirmed,
    Partial,
    RuledOut,
}

fn follow_secret(secret: &Secret, lines: &[Vec<u8>], start: usize) -> Candidate {
    for offset in 1..secret.len() {
        let Some(line) = lines.get(start + offset) else {
            return Candidate::Partial;
        };
        if !contains(line, &secret.lines[offset]) {
            return Candidate::RuledOut;
        }
    }
    Candidate::Confirmed
}

/// Drains every `\n`-terminated line from `buf`, terminators included.
fn split_lines(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let Some(last) = buf.iter().rposition(|&b| b == b'\n') else {
        return Vec::new();
    };
    let lines = buf[..=last]
        .split_inclusive(|&b| b == b'\n')
        .map(<[u8]>::to_vec)
        .collect();
    buf.drain(..=last);
    lines
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Every (possibly overlapping) occurrence of `needle`; empty needles match nothing.
fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(start, _)| start..start + needle.len())
        .collect()
}

fn redact_spans(line: Vec<u8>, spans: &[Range<usize>]) -> Vec<u8> {
    if spans.is_empty() {
        return line;
    }

    let mut out = Vec::with_capacity(line.len());
    let mut pos = 0;
    for span in spans {
        out.extend_from_slice(&line[pos..span.start]);
        out.extend_from_slice(REDACTED.as_bytes());
        pos = span.end;
    }
    out.extend_from_slice(&line[pos..]);
    out
}

fn poisoned() -> io::Error {
    io::Error::other("secret filter lock poisoned")
}
