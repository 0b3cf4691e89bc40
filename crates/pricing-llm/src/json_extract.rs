//! Best-effort extraction of structured data out of free-form LLM text.
//!
//! LLM responses are asked to return strict JSON but never reliably do —
//! models wrap objects in prose or markdown fences. These helpers degrade
//! gracefully instead of treating any deviation as a hard failure.

/// Extract the first balanced `{...}` JSON object from free-form text, if any.
///
/// Scans for the first `{` and tracks brace depth (ignoring braces inside
/// string literals) to find its matching `}`, then attempts to parse the
/// slice. Returns `None` if no balanced object is found or it doesn't parse.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let end = end?;
    serde_json::from_str(&text[start..end]).ok()
}

/// Extract the first dollar-prefixed or bare decimal number from free text.
///
/// Used as a fallback when a price-estimation response isn't valid JSON but
/// still contains a recognizable number (e.g. "I'd estimate around $45.99").
#[must_use]
pub fn extract_first_number(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' || chars[i].is_ascii_digit() {
            let start = if chars[i] == '$' { i + 1 } else { i };
            let mut j = start;
            let mut seen_digit = false;
            let mut seen_dot = false;
            while j < chars.len() {
                let c = chars[j];
                if c.is_ascii_digit() {
                    seen_digit = true;
                    j += 1;
                } else if c == ',' {
                    j += 1;
                } else if c == '.' && !seen_dot {
                    seen_dot = true;
                    j += 1;
                } else {
                    break;
                }
            }
            if seen_digit {
                let raw: String = chars[start..j].iter().filter(|c| **c != ',').collect();
                if let Ok(value) = raw.parse::<f64>() {
                    return Some(value);
                }
            }
            i = j.max(i + 1);
        } else {
            i += 1;
        }
    }
    None
}
