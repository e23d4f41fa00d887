/// Splits a byte stream into newline-terminated lines.
///
/// Bytes after the last newline are held back and prefixed onto the next
/// chunk. Splitting happens before UTF-8 decoding so a multi-byte character
/// cut across two reads survives intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and drain every complete line. Blank lines are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Bytes waiting for their newline.
    pub fn pending_len(&self) -> usize {
        self.partial.len()
    }

    pub fn clear(&mut self) {
        self.partial.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_line_waits_for_newline() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(br#"{"success":"#).is_empty());
        assert_eq!(buf.pending_len(), 11);

        let lines = buf.push(b"true}\n{\"a\"");
        assert_eq!(lines, vec![r#"{"success":true}"#.to_string()]);
        assert_eq!(buf.pending_len(), 4);
    }

    #[test]
    fn several_lines_in_one_chunk() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"one\r\ntwo\n\nthree\n");
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let mut buf = LineBuffer::new();
        let bytes = "あい\n".as_bytes();
        assert!(buf.push(&bytes[..2]).is_empty());
        assert_eq!(buf.push(&bytes[2..]), vec!["あい"]);
    }

    #[test]
    fn clear_drops_partial() {
        let mut buf = LineBuffer::new();
        buf.push(b"half a li");
        buf.clear();
        assert_eq!(buf.push(b"ne\n"), vec!["ne"]);
    }
}
