use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::memory::MEMORY_SIZE;

/// Bytes ready to be placed in memory, starting at address 0.
///
/// Always fits in memory, so loading a `Program` can never leave memory half written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Program, LoadError> {
        if bytes.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge { len: bytes.len() });
        }
        Ok(Program { bytes })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Program, LoadError> {
        Self::parse(&Self::read_source(path)?)
    }

    /// Read a program's text without parsing it, so errors can be reported against it.
    pub fn read_source(path: impl AsRef<Path>) -> Result<String, LoadError> {
        let path = path.as_ref();
        fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse the text format: one byte per line written as 8 binary digits.
    ///
    /// Anything after a `#` is a comment. Blank lines are skipped, as is anything after the
    /// first word of a line.
    pub fn parse(src: &str) -> Result<Program, LoadError> {
        let mut bytes = Vec::new();
        let mut line_start = 0;
        for (idx, line) in src.split_inclusive('\n').enumerate() {
            let code = match line.find('#') {
                Some(comment) => &line[..comment],
                None => line,
            };
            if let Some(word) = code.split_whitespace().next() {
                let offs = line_start + code.len() - code.trim_start().len();
                let byte = parse_byte(word).ok_or(LoadError::InvalidByte {
                    line: idx + 1,
                    span: offs..offs + word.len(),
                })?;
                bytes.push(byte);
            }
            line_start += line.len();
        }
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn parse_byte(word: &str) -> Option<u8> {
    if word.len() != 8 || !word.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    u8::from_str_radix(word, 2).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_print8() {
        let src = "\
# print8.ls8: Print the number 8 on the screen

10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        let program = Program::parse(src).unwrap();
        assert_eq!(
            program.bytes(),
            &[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]
        );
    }

    #[test]
    fn tolerates_whitespace_and_crlf() {
        let program = Program::parse("  00000001\r\n\t10000010   extra\r\n   \r\n#\n").unwrap();
        assert_eq!(program.bytes(), &[1, 0b1000_0010]);
        assert!(Program::parse("").unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_words() {
        let src = "00000001\n  1000001x # oops\n";
        match Program::parse(src) {
            Err(LoadError::InvalidByte { line, span }) => {
                assert_eq!(line, 2);
                assert_eq!(&src[span], "1000001x");
            }
            other => panic!("unexpected {other:?}"),
        }

        for bad in ["1000000", "100000001", "0b000001", "22222222"] {
            assert!(
                matches!(Program::parse(bad), Err(LoadError::InvalidByte { line: 1, .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_oversized() {
        let src = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert!(matches!(
            Program::parse(&src),
            Err(LoadError::TooLarge { len }) if len == MEMORY_SIZE + 1
        ));
        assert_eq!(Program::parse(&"00000000\n".repeat(MEMORY_SIZE)).unwrap().len(), MEMORY_SIZE);
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Program::from_file("does/not/exist.ls8"),
            Err(LoadError::Io { .. })
        ));
        match Program::read_source("does/not/exist.ls8") {
            Err(LoadError::Io { path, .. }) => assert_eq!(path, Path::new("does/not/exist.ls8")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reads_fixture_source() {
        let src = Program::read_source("tests/files/print8.ls8").unwrap();
        let program = Program::from_file("tests/files/print8.ls8").unwrap();
        assert_eq!(Program::parse(&src).unwrap(), program);
    }
}
