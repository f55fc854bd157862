/// Splits text into word-aligned windows of at most `chunk_size` characters,
/// each starting with up to `overlap` characters of the previous window.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(500, 20)
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let mut end = start;
            let mut len = 0;
            while end < words.len() {
                let added = words[end].chars().count() + usize::from(end > start);
                // A single oversized word still becomes its own chunk
                if len + added > self.chunk_size && end > start {
                    break;
                }
                len += added;
                end += 1;
            }

            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }

            let mut next = end;
            let mut carried = 0;
            while next > start + 1 {
                let width = words[next - 1].chars().count() + 1;
                if carried + width > self.overlap {
                    break;
                }
                carried += width;
                next -= 1;
            }
            start = next;
        }

        chunks
    }
}
