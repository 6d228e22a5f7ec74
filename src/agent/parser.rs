//! Tool-call parser
//!
//! Recovers `name(key="value", ...)` invocations from free-form model text.
//! Calls are normally wrapped as
//! `<|tool_call_start|>[terminal(command="ls")]<|tool_call_end|>`, but small
//! models often drop the markers, so a bare `[name(...)]` is accepted when no
//! marked call is present.
//!
//! Candidate extraction uses regular expressions. Argument values may contain
//! the other quote kind (`command="find . -name '*.txt'"`), so arguments are
//! read by an explicit character scanner instead.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::ToolCall;
use crate::tools::registry::{INTERNET, TERMINAL};

/// Opens a marked tool call
pub const TOOL_CALL_START: &str = "<|tool_call_start|>";
/// Closes a marked tool call
pub const TOOL_CALL_END: &str = "<|tool_call_end|>";

static MARKED_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<\|tool_call_start\|>\s*\[(.*?)\]\s*<\|tool_call_end\|>")
        .expect("marked call pattern is valid")
});

static BARE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\[(\w+)\s*\((.*?)\)\]").expect("bare call pattern is valid")
});

static CALL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\w+)\s*\((.*)\)").expect("call shape pattern is valid"));

/// Parse every known tool call in `response`, in order of appearance.
///
/// Never fails: text without calls, malformed calls and calls to unknown
/// tools all yield nothing.
pub fn parse_tool_calls(response: &str) -> Vec<ToolCall> {
    let mut candidates: Vec<String> = MARKED_CALL
        .captures_iter(response)
        .map(|caps| caps[1].to_string())
        .collect();

    if candidates.is_empty() {
        candidates = BARE_CALL
            .captures_iter(response)
            .map(|caps| format!("{}({})", &caps[1], &caps[2]))
            .collect();
    }

    candidates
        .iter()
        .filter_map(|candidate| parse_candidate(candidate.trim()))
        .collect()
}

fn parse_candidate(candidate: &str) -> Option<ToolCall> {
    let caps = CALL_SHAPE.captures(candidate)?;
    let name = &caps[1];

    if name != TERMINAL && name != INTERNET {
        tracing::debug!("Ignoring call to unknown tool: {}", name);
        return None;
    }

    let call = ToolCall::new(name, parse_arguments(&caps[2]));
    tracing::debug!("Parsed tool call: {}", call);
    Some(call)
}

/// Scanner states while reading `key="value"` pairs
#[derive(Debug, Clone, Copy)]
enum ScanState {
    /// Skipping separators before the next key
    SeekKey,
    /// Inside a key that began at `start`
    ReadKey { start: usize },
    /// After a key, expecting `=`
    SeekEquals { key: (usize, usize) },
    /// After `=`, expecting an opening quote
    SeekQuote { key: (usize, usize) },
    /// Inside a value opened by `quote`, content beginning at `start`
    ReadValue {
        key: (usize, usize),
        quote: char,
        start: usize,
    },
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Read `key="value"` pairs from an argument blob.
///
/// Pairs are separated by whitespace or commas and each value may use either
/// quote kind. A quote preceded by a backslash does not close the value, and
/// the backslash stays in the value. Scanning stops at the first token that
/// is not a well-formed pair; pairs read before that point are kept. A value
/// whose closing quote is missing runs to the end of the blob.
pub fn parse_arguments(blob: &str) -> BTreeMap<String, String> {
    let chars: Vec<(usize, char)> = blob.char_indices().collect();
    let n = chars.len();
    let offset = |i: usize| chars.get(i).map_or(blob.len(), |&(byte, _)| byte);
    let slice = |(from, to): (usize, usize)| &blob[offset(from)..offset(to)];

    let mut args = BTreeMap::new();
    let mut state = ScanState::SeekKey;
    let mut i = 0;

    loop {
        state = match state {
            ScanState::SeekKey => {
                while i < n && (chars[i].1.is_whitespace() || chars[i].1 == ',') {
                    i += 1;
                }
                if i >= n {
                    break;
                }
                ScanState::ReadKey { start: i }
            }
            ScanState::ReadKey { start } => {
                while i < n && is_word(chars[i].1) {
                    i += 1;
                }
                if i == start {
                    break;
                }
                ScanState::SeekEquals { key: (start, i) }
            }
            ScanState::SeekEquals { key } => {
                while i < n && chars[i].1.is_whitespace() {
                    i += 1;
                }
                if i >= n || chars[i].1 != '=' {
                    break;
                }
                i += 1;
                ScanState::SeekQuote { key }
            }
            ScanState::SeekQuote { key } => {
                while i < n && chars[i].1.is_whitespace() {
                    i += 1;
                }
                if i >= n {
                    break;
                }
                let quote = chars[i].1;
                if quote != '"' && quote != '\'' {
                    break;
                }
                i += 1;
                ScanState::ReadValue {
                    key,
                    quote,
                    start: i,
                }
            }
            ScanState::ReadValue { key, quote, start } => {
                // start >= 1, so chars[i - 1] always exists
                while i < n && !(chars[i].1 == quote && chars[i - 1].1 != '\\') {
                    i += 1;
                }
                args.insert(slice(key).to_string(), slice((start, i)).to_string());
                i += 1;
                ScanState::SeekKey
            }
        };
    }

    args
}
