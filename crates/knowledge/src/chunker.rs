//! Character-window chunking with sentence-aware boundaries.

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// A chunk that is not the last one ends after the last `.`, `?` or `!` in
/// its window when that lies past the window's midpoint, otherwise after the
/// last space. The next window starts `overlap` characters before the end
/// and always moves forward by at least one character.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();

    if chars.len() <= chunk_size {
        if text.trim().is_empty() {
            return Vec::new();
        }
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + chunk_size).min(chars.len());

        if end < chars.len() {
            let window = &chars[start..end];
            let sentence = window.iter().rposition(|c| matches!(c, '.' | '?' | '!'));
            let boundary = match sentence {
                Some(i) if i >= chunk_size / 2 => Some(i),
                _ => window.iter().rposition(|c| *c == ' '),
            };

            if let Some(i) = boundary.filter(|&i| i > 0) {
                end = start + i + 1;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        chars.len(),
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
