use tracing::{debug, instrument};

/// Kind of a JSON structure found by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Object,
    Array,
}

/// Byte span of a root-level JSON structure within a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSpan {
    pub start: usize,
    /// Inclusive index of the closing bracket/brace
    pub end: usize,
    pub kind: NodeType,
}

impl JsonSpan {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

/// Find all balanced root-level JSON objects/arrays in `text`.
///
/// Brackets inside string literals are ignored; mismatched closers are dropped.
#[instrument(target = "guided_quiz::json", skip(text), fields(text_len = text.len()))]
pub fn find_json_structures(text: &str) -> Vec<JsonSpan> {
    let mut roots = Vec::new();
    let mut stack: Vec<(usize, NodeType)> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closing = match b {
            b'"' => {
                in_string = true;
                continue;
            }
            b'{' => {
                stack.push((i, NodeType::Object));
                continue;
            }
            b'[' => {
                stack.push((i, NodeType::Array));
                continue;
            }
            b'}' => NodeType::Object,
            b']' => NodeType::Array,
            _ => continue,
        };

        if let Some((start, kind)) = stack.pop() {
            if kind == closing && stack.is_empty() {
                roots.push(JsonSpan { start, end: i, kind });
            }
        }
    }

    debug!(target: "guided_quiz::json", count = roots.len(), "found root structures");
    roots
}

/// Narrow a model reply to the JSON document it carries.
///
/// A reply that already starts with `{` or `[` is returned trimmed. Otherwise,
/// if exactly one root structure is embedded in surrounding text (a markdown
/// fence, a leading sentence), that structure is returned. Anything else is
/// returned trimmed so the caller's parse reports the real problem.
pub fn isolate_payload(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match find_json_structures(trimmed).as_slice() {
        [only] => only.slice(trimmed),
        _ => trimmed,
    }
}
