/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// One uploaded file from a multipart/form-data body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// The form field name (`name="..."`).
    pub field_name:   String,
    /// Client-supplied file name; may be empty.
    pub filename:     String,
    /// The part's own Content-Type, if the client sent one.
    pub content_type: Option<String>,
    pub data:         Vec<u8>,
}

/// Collects every file part (those with a `filename` attribute) in body order.
pub fn file_parts(body: &[u8], boundary: &str) -> Vec<FilePart> {
    let delimiter = format!("--{}", boundary);
    let mut result = Vec::new();

    for part in split_on(body, delimiter.as_bytes()) {
        let sep = b"\r\n\r\n";
        let Some(sep_pos) = find_subsequence(part, sep) else { continue };
        let headers = String::from_utf8_lossy(&part[..sep_pos]);
        let Some(filename) = disposition_param(&headers, "filename") else { continue };

        let raw = &part[sep_pos + sep.len()..];
        let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);
        result.push(FilePart {
            field_name:   disposition_param(&headers, "name").unwrap_or_default(),
            filename,
            content_type: header_value(&headers, "Content-Type"),
            data:         data.to_vec(),
        });
    }
    result
}

/// Picks the file uploaded under `field_name`, falling back to the first
/// file part when no part carries that name.
pub fn find_file(body: &[u8], boundary: &str, field_name: &str) -> Option<FilePart> {
    let mut parts = file_parts(body, boundary);
    match parts.iter().position(|p| p.field_name == field_name) {
        Some(i) => Some(parts.swap_remove(i)),
        None if !parts.is_empty() => Some(parts.swap_remove(0)),
        None => None,
    }
}

/// Extracts a plain-text (non-file) field from a multipart body.
pub fn text_field(body: &[u8], boundary: &str, field_name: &str) -> Option<String> {
    let delimiter = format!("--{}", boundary);

    for part in split_on(body, delimiter.as_bytes()) {
        let sep = b"\r\n\r\n";
        let Some(sep_pos) = find_subsequence(part, sep) else { continue };
        let headers = String::from_utf8_lossy(&part[..sep_pos]);
        if disposition_param(&headers, "filename").is_some() {
            continue;
        }
        if disposition_param(&headers, "name").as_deref() == Some(field_name) {
            let raw = &part[sep_pos + sep.len()..];
            let trimmed = raw.strip_suffix(b"\r\n").unwrap_or(raw);
            return String::from_utf8(trimmed.to_vec()).ok();
        }
    }
    None
}

/// Reads `key="value"` (or unquoted `key=value`) from the Content-Disposition
/// header line. `name` does not match inside `filename`.
fn disposition_param(headers: &str, key: &str) -> Option<String> {
    let line = headers
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition:"))?;
    line.split(';').skip(1).find_map(|attr| {
        let (k, v) = attr.trim().split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_owned())
        } else {
            None
        }
    })
}

fn header_value(headers: &str, name: &str) -> Option<String> {
    headers.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        if k.trim().eq_ignore_ascii_case(name) {
            Some(v.trim().to_owned())
        } else {
            None
        }
    })
}
