use bytes::{Buf, BytesMut};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Buffers raw chunks and hands out complete lines.
///
/// A line is only released once its `\n` has been seen, so chunk boundaries
/// may fall anywhere, including inside a multi-byte character.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
    started: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        if !self.started && self.buffer.len() >= BOM.len() {
            if self.buffer.starts_with(BOM) {
                self.buffer.advance(BOM.len());
            }
            self.started = true;
        }
    }

    /// Next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let line = self.buffer.split_to(newline + 1);
        Some(decode(&line[..newline]))
    }

    /// Release whatever is left, terminated or not.
    pub fn flush(&mut self) -> Option<String> {
        if !self.started && self.buffer.starts_with(BOM) {
            self.buffer.advance(BOM.len());
        }
        self.started = true;

        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(decode(&rest))
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
