// ABOUTME: Input and output stream handles backing the I/O builtins

use std::fs::File;
use std::io::{BufWriter, Read, Write};

/// Character source for `Input` values. File input reads the whole file up
/// front and serves it like a string input.
#[derive(Debug)]
pub enum Input {
    Buffer { text: Vec<char>, pos: usize },
    Stdin { pending: Vec<char>, pos: usize, eof: bool },
}

#[derive(Debug)]
pub struct InputHandle {
    source: Input,
    closed: bool,
}

impl InputHandle {
    pub fn from_string(text: &str) -> InputHandle {
        InputHandle {
            source: Input::Buffer {
                text: text.chars().collect(),
                pos: 0,
            },
            closed: false,
        }
    }

    pub fn from_file(filename: &str) -> std::io::Result<InputHandle> {
        let mut text = String::new();
        File::open(filename)?.read_to_string(&mut text)?;
        Ok(InputHandle::from_string(&text))
    }

    pub fn stdin() -> InputHandle {
        InputHandle {
            source: Input::Stdin {
                pending: Vec::new(),
                pos: 0,
                eof: false,
            },
            closed: false,
        }
    }

    fn fill_stdin(&mut self) {
        if let Input::Stdin { pending, pos, eof } = &mut self.source {
            if *pos < pending.len() || *eof {
                return;
            }
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => *eof = true,
                Ok(_) => {
                    pending.clear();
                    *pos = 0;
                    pending.extend(line.chars());
                }
            }
        }
    }

    /// Read a single character, or None at end of input.
    pub fn read(&mut self) -> Option<String> {
        self.fill_stdin();
        let (text, pos) = match &mut self.source {
            Input::Buffer { text, pos } => (text, pos),
            Input::Stdin { pending, pos, .. } => (pending, pos),
        };
        if *pos >= text.len() {
            return None;
        }
        let ch = text[*pos];
        *pos += 1;
        Some(ch.to_string())
    }

    /// Read everything that is left, or None at end of input.
    pub fn read_all(&mut self) -> Option<String> {
        if let Input::Buffer { text, pos } = &mut self.source {
            if *pos >= text.len() {
                return None;
            }
            let result: String = text[*pos..].iter().collect();
            *pos = text.len();
            return Some(result);
        }
        let mut collected = String::new();
        while let Some(line) = self.read_line() {
            collected.push_str(&line);
            collected.push('\n');
        }
        if collected.is_empty() {
            None
        } else {
            Some(collected)
        }
    }

    /// Read one line without the newline, or None at end of input.
    pub fn read_line(&mut self) -> Option<String> {
        self.fill_stdin();
        let (text, pos) = match &mut self.source {
            Input::Buffer { text, pos } => (text, pos),
            Input::Stdin { pending, pos, .. } => (pending, pos),
        };
        if *pos >= text.len() {
            return None;
        }
        match text[*pos..].iter().position(|&c| c == '\n') {
            Some(offset) => {
                let result: String = text[*pos..*pos + offset].iter().collect();
                *pos += offset + 1;
                Some(result)
            }
            None => {
                let result: String = text[*pos..].iter().collect();
                *pos = text.len();
                Some(result)
            }
        }
    }

    /// Close is idempotent; a closed buffer simply stops serving data.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match &mut self.source {
            Input::Buffer { text, pos } => *pos = text.len(),
            Input::Stdin { eof, .. } => *eof = true,
        }
    }
}

/// Sink for `Output` values.
#[derive(Debug)]
pub enum Output {
    Buffer(String),
    Stdout,
    Console { buffer: String },
    File(BufWriter<File>),
}

#[derive(Debug)]
pub struct OutputHandle {
    target: Output,
    closed: bool,
}

impl OutputHandle {
    pub fn string_output() -> OutputHandle {
        OutputHandle {
            target: Output::Buffer(String::new()),
            closed: false,
        }
    }

    pub fn stdout() -> OutputHandle {
        OutputHandle {
            target: Output::Stdout,
            closed: false,
        }
    }

    pub fn console() -> OutputHandle {
        OutputHandle {
            target: Output::Console {
                buffer: String::new(),
            },
            closed: false,
        }
    }

    pub fn file(filename: &str, append: bool) -> std::io::Result<OutputHandle> {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(filename)?;
        Ok(OutputHandle {
            target: Output::File(BufWriter::new(file)),
            closed: false,
        })
    }

    pub fn write(&mut self, s: &str) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        match &mut self.target {
            Output::Buffer(buffer) => {
                buffer.push_str(s);
                Ok(())
            }
            Output::Stdout => {
                print!("{}", s);
                Ok(())
            }
            Output::Console { buffer } => {
                buffer.push_str(s);
                while let Some(idx) = buffer.find('\n') {
                    let line: String = buffer.drain(..=idx).collect();
                    print!("{}", line);
                }
                Ok(())
            }
            Output::File(writer) => writer.write_all(s.as_bytes()),
        }
    }

    pub fn write_line(&mut self, s: &str) -> std::io::Result<()> {
        self.write(s)?;
        self.write("\n")?;
        self.flush()
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.target {
            Output::Buffer(_) => Ok(()),
            Output::Stdout => std::io::stdout().flush(),
            Output::Console { buffer } => {
                if !buffer.is_empty() {
                    print!("{}", buffer);
                    buffer.clear();
                }
                std::io::stdout().flush()
            }
            Output::File(writer) => writer.flush(),
        }
    }

    /// Close is idempotent; double-close is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let _ = self.flush();
        self.closed = true;
    }

    /// The collected text of a string output; None for other targets.
    pub fn string_value(&self) -> Option<String> {
        match &self.target {
            Output::Buffer(buffer) => Some(buffer.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_input_read_line() {
        let mut input = InputHandle::from_string("one\ntwo\nthree");
        assert_eq!(input.read_line(), Some("one".to_string()));
        assert_eq!(input.read_line(), Some("two".to_string()));
        assert_eq!(input.read_line(), Some("three".to_string()));
        assert_eq!(input.read_line(), None);
    }

    #[test]
    fn test_string_input_read_chars() {
        let mut input = InputHandle::from_string("ab");
        assert_eq!(input.read(), Some("a".to_string()));
        assert_eq!(input.read(), Some("b".to_string()));
        assert_eq!(input.read(), None);
    }

    #[test]
    fn test_string_input_read_all() {
        let mut input = InputHandle::from_string("hello");
        assert_eq!(input.read_all(), Some("hello".to_string()));
        assert_eq!(input.read_all(), None);
    }

    #[test]
    fn test_string_output_collects() {
        let mut output = OutputHandle::string_output();
        output.write("abc").unwrap();
        output.write_line("def").unwrap();
        assert_eq!(output.string_value(), Some("abcdef\n".to_string()));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut output = OutputHandle::string_output();
        output.close();
        output.close();
        let mut input = InputHandle::from_string("x");
        input.close();
        input.close();
        assert_eq!(input.read(), None);
    }
}
