use crate::error::ExtractionError;

const FENCE: &str = "```";

/// Isolate the JSON object embedded in raw provider output.
///
/// Code fences (with or without a language tag) are stripped first; when a
/// fenced block holds a complete object, only its body is searched. A fence
/// marker inside a JSON string cuts the fenced body short, so an object that
/// does not close within the fence is looked for in the whole text instead.
/// The result spans the first top-level `{` through its matching `}`. Brace
/// depth is tracked outside JSON strings only, so braces inside text values
/// and any commentary after the object do not affect the span. The candidate
/// is not parsed here.
pub fn extract_json(raw: &str) -> Result<&str, ExtractionError> {
    let trimmed = raw.trim();

    if let Some(object) = fenced_body(trimmed).and_then(first_object) {
        return Ok(object);
    }

    let start = trimmed.find('{').ok_or(ExtractionError::NoObject)?;
    let end = matching_brace(trimmed, start).ok_or(ExtractionError::Unbalanced { start })?;

    Ok(&trimmed[start..=end])
}

fn first_object(region: &str) -> Option<&str> {
    let start = region.find('{')?;
    let end = matching_brace(region, start)?;
    Some(&region[start..=end])
}

/// Body of the first fenced block, without the opening language tag.
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let rest = &text[open + FENCE.len()..];

    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];

    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    Some(body.trim())
}

/// Byte index of the `}` closing the object that opens at `start`.
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
