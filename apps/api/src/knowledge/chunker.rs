/// Splits text into windows of `chunk_size` words, consecutive windows sharing `overlap` words.
///
/// `chunk_size == 0` is treated as 1 and `overlap` is clamped below `chunk_size`,
/// so the window always advances. The final window may be shorter than
/// `chunk_size`; a window that would only repeat already-emitted words is skipped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 10, 2).is_empty());
        assert!(chunk_text(" \n\t ", 10, 2).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Rust  systems\nengineer", 10, 3);
        assert_eq!(chunks, vec!["Rust systems engineer"]);
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = chunk_text(&numbered(10), 4, 1);
        assert_eq!(
            chunks,
            vec!["w1 w2 w3 w4", "w4 w5 w6 w7", "w7 w8 w9 w10"]
        );
    }

    #[test]
    fn test_last_window_may_be_short() {
        let chunks = chunk_text(&numbered(9), 4, 1);
        assert_eq!(chunks.last().unwrap(), "w7 w8 w9");
    }

    #[test]
    fn test_no_tail_chunk_of_pure_overlap() {
        // 8 words, size 4, overlap 2 → starts 0, 2, 4; window at 4 reaches the end.
        let chunks = chunk_text(&numbered(8), 4, 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "w5 w6 w7 w8");
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let chunks = chunk_text(&numbered(3), 2, 5);
        assert_eq!(chunks, vec!["w1 w2", "w2 w3"]);
    }

    #[test]
    fn test_zero_chunk_size_treated_as_one() {
        let chunks = chunk_text("a b c", 0, 0);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }
}
