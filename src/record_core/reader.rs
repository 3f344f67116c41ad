//! Pull-based reader over the elements of a top-level JSON array
//!
//! Only the bytes of the element currently being decoded are buffered, so the
//! array itself can be far larger than memory. The input is released as soon
//! as the stream ends, fails, or the reader is dropped.

use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Before the opening bracket
    Start,
    /// Just after `[`
    FirstElement,
    /// Just after a separating comma
    NextElement,
    /// Just after an element
    AfterElement,
    Done,
}

pub struct RecordStream<R> {
    reader: Option<R>,
    state: ScanState,
    offset: u64,
    yielded: usize,
    element: Vec<u8>,
}

impl RecordStream<BufReader<File>> {
    /// Open `path` for streaming. Fails before producing any element if the
    /// file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|source| PipelineError::ResourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("📖 Streaming records from: {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            state: ScanState::Start,
            offset: 0,
            yielded: 0,
            element: Vec::new(),
        }
    }

    /// Elements produced so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn peek(&mut self) -> Result<Option<u8>, PipelineError> {
        match self.reader.as_mut() {
            Some(reader) => Ok(reader.fill_buf()?.first().copied()),
            None => Ok(None),
        }
    }

    fn bump(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            reader.consume(1);
            self.offset += 1;
        }
    }

    fn skip_whitespace(&mut self) -> Result<Option<u8>, PipelineError> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.bump(),
                other => return Ok(other),
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> PipelineError {
        let element = match self.state {
            ScanState::Start => None,
            _ => Some(self.yielded),
        };
        PipelineError::parse(self.offset, element, message)
    }

    fn next_element(&mut self) -> Result<Option<Value>, PipelineError> {
        loop {
            match self.state {
                ScanState::Done => return Ok(None),
                ScanState::Start => match self.skip_whitespace()? {
                    Some(b'[') => {
                        self.bump();
                        self.state = ScanState::FirstElement;
                    }
                    Some(other) => {
                        return Err(self.error(format!(
                            "expected '[' at start of input, found '{}'",
                            other as char
                        )))
                    }
                    None => return Err(self.error("empty input, expected a JSON array")),
                },
                ScanState::FirstElement => match self.skip_whitespace()? {
                    Some(b']') => {
                        self.bump();
                        return self.close();
                    }
                    Some(_) => return self.decode_element().map(Some),
                    None => return Err(self.error("unexpected end of input inside array")),
                },
                ScanState::NextElement => match self.skip_whitespace()? {
                    Some(b']') => return Err(self.error("trailing comma before ']'")),
                    Some(_) => return self.decode_element().map(Some),
                    None => return Err(self.error("unexpected end of input inside array")),
                },
                ScanState::AfterElement => match self.skip_whitespace()? {
                    Some(b',') => {
                        self.bump();
                        self.state = ScanState::NextElement;
                    }
                    Some(b']') => {
                        self.bump();
                        return self.close();
                    }
                    Some(other) => {
                        return Err(self.error(format!(
                            "expected ',' or ']' after element, found '{}'",
                            other as char
                        )))
                    }
                    None => return Err(self.error("unexpected end of input inside array")),
                },
            }
        }
    }

    /// Called after the closing bracket. Only whitespace may follow.
    fn close(&mut self) -> Result<Option<Value>, PipelineError> {
        match self.skip_whitespace()? {
            None => {
                self.state = ScanState::Done;
                Ok(None)
            }
            Some(_) => Err(self.error("trailing characters after array")),
        }
    }

    /// Copy the raw bytes of one element into the scratch buffer, then decode
    /// them.
    fn decode_element(&mut self) -> Result<Value, PipelineError> {
        let start = self.offset;
        self.element.clear();

        match self.peek()? {
            Some(b'{' | b'[') => self.capture_container()?,
            Some(b'"') => {
                self.take_byte()?;
                self.capture_string_tail()?;
            }
            _ => self.capture_scalar()?,
        }

        if self.element.is_empty() {
            return Err(self.error("expected a value"));
        }

        let value = serde_json::from_slice::<Value>(&self.element).map_err(|e| {
            PipelineError::parse(start, Some(self.yielded), e.to_string())
        })?;

        self.yielded += 1;
        self.state = ScanState::AfterElement;
        Ok(value)
    }

    fn take_byte(&mut self) -> Result<u8, PipelineError> {
        match self.peek()? {
            Some(byte) => {
                self.bump();
                self.element.push(byte);
                Ok(byte)
            }
            None => Err(self.error("unexpected end of input inside element")),
        }
    }

    fn capture_container(&mut self) -> Result<(), PipelineError> {
        let mut depth = 0usize;
        loop {
            match self.take_byte()? {
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'"' => self.capture_string_tail()?,
                _ => {}
            }
        }
    }

    /// Consume up to and including the closing quote of a string whose
    /// opening quote is already in the buffer.
    fn capture_string_tail(&mut self) -> Result<(), PipelineError> {
        loop {
            match self.take_byte()? {
                b'\\' => {
                    self.take_byte()?;
                }
                b'"' => return Ok(()),
                _ => {}
            }
        }
    }

    fn capture_scalar(&mut self) -> Result<(), PipelineError> {
        while let Some(byte) = self.peek()? {
            match byte {
                b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r' => break,
                _ => {
                    self.bump();
                    self.element.push(byte);
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.state = ScanState::Done;
        self.reader = None;
        self.element = Vec::new();
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<Value, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ScanState::Done {
            return None;
        }
        match self.next_element() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}
