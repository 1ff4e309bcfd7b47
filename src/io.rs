use crate::error::ApiError;
use std::io::{stdin, stdout, Write};

/// Trait for command line input/output, kept behind a seam so handlers can
/// be driven from tests.
pub trait IoHandler {
    fn read_line(&mut self, prompt: &str) -> Result<String, ApiError>;
    fn write_line(&mut self, line: &str) -> Result<(), ApiError>;
    /// Writes without appending a newline.
    fn write_raw(&mut self, text: &str) -> Result<(), ApiError>;
}

/// Standard I/O handler using stdin and stdout.
#[derive(Default)]
pub struct StdIoHandler;

impl IoHandler for StdIoHandler {
    fn read_line(&mut self, prompt: &str) -> Result<String, ApiError> {
        print!("{} ", prompt);
        stdout().flush().map_err(ApiError::Io)?;
        let mut input = String::new();
        stdin().read_line(&mut input).map_err(ApiError::Io)?;
        Ok(input.trim().to_string())
    }

    fn write_line(&mut self, line: &str) -> Result<(), ApiError> {
        println!("{}", line);
        Ok(())
    }

    fn write_raw(&mut self, text: &str) -> Result<(), ApiError> {
        print!("{}", text);
        stdout().flush().map_err(ApiError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::io::{BufRead, Cursor};

    /// IoHandler reading scripted input and collecting output for asserts.
    pub(crate) struct TestIoHandler {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl TestIoHandler {
        pub(crate) fn new(input: &str) -> Self {
            Self {
                input: Cursor::new(input.as_bytes().to_vec()),
                output: Vec::new(),
            }
        }

        pub(crate) fn output_as_string(&self) -> String {
            String::from_utf8_lossy(&self.output).to_string()
        }
    }

    impl IoHandler for TestIoHandler {
        fn read_line(&mut self, prompt: &str) -> Result<String, ApiError> {
            self.write_raw(prompt)?;
            self.write_raw(" ")?;
            let mut buf = String::new();
            self.input.read_line(&mut buf).map_err(ApiError::Io)?;
            Ok(buf.trim().to_string())
        }

        fn write_line(&mut self, line: &str) -> Result<(), ApiError> {
            writeln!(&mut self.output, "{}", line).map_err(ApiError::Io)?;
            Ok(())
        }

        fn write_raw(&mut self, text: &str) -> Result<(), ApiError> {
            write!(&mut self.output, "{}", text).map_err(ApiError::Io)?;
            Ok(())
        }
    }
}
