//! # Followup Parsing
//!
//! Models may end a response with a short menu of next steps:
//!
//! ```text
//! <FOLLOWUP>
//! (F1) Show the failing test
//! (F2) Explain the stack trace
//! </FOLLOWUP>
//! ```
//!
//! [`parse_followups`] pulls those options out. A response without a
//! well-formed region simply has no options.

/// Start of the followup region.
pub const FOLLOWUP_START: &str = "<FOLLOWUP>";
/// End of the followup region.
pub const FOLLOWUP_END: &str = "</FOLLOWUP>";
/// At most this many options are offered.
pub const MAX_FOLLOWUPS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowupOption {
    /// The key without parentheses, e.g. `F1`.
    pub key: String,
    pub description: String,
}

/// Extract followup options from model text.
///
/// Returns an empty list when either marker is missing or the end marker
/// comes before the start marker.
pub fn parse_followups(text: &str) -> Vec<FollowupOption> {
    let (Some(start), Some(end)) = (text.find(FOLLOWUP_START), text.find(FOLLOWUP_END)) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    let Some(region) = text.get(start + FOLLOWUP_START.len()..end) else {
        return Vec::new();
    };

    let keys = scan_keys(region);
    keys.iter()
        .enumerate()
        .take(MAX_FOLLOWUPS)
        .map(|(i, &(key_start, key_end))| {
            let description_end = keys.get(i + 1).map_or(region.len(), |&(next, _)| next);
            FollowupOption {
                key: region[key_start + 1..key_end - 1].to_string(),
                description: region[key_end..description_end].trim().to_string(),
            }
        })
        .collect()
}

/// Byte ranges of every `(F<digits>)` key, left to right.
fn scan_keys(region: &str) -> Vec<(usize, usize)> {
    let bytes = region.as_bytes();
    let mut keys = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'(' && bytes.get(i + 1) == Some(&b'F') {
            let digits_start = i + 2;
            let mut j = digits_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > digits_start && bytes.get(j) == Some(&b')') {
                keys.push((i, j + 1));
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }

    keys
}
