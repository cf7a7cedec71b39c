//! Line-oriented serial output.
//!
//! One line per cycle: every value printed with four fractional digits,
//! separated by single spaces, terminated by `\n`.

use core::fmt::Write as _;

use embedded_io_async::Write;
use heapless::String;

use crate::config::LINE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum EmitError<E> {
    /// Nothing to print.
    Empty,
    /// The formatted line does not fit the line buffer.
    Overflow,
    Io(E),
}

/// Why a line could not be formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum FormatError {
    Empty,
    Overflow,
}

impl From<core::fmt::Error> for FormatError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Overflow
    }
}

impl<E> From<FormatError> for EmitError<E> {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::Empty => Self::Empty,
            FormatError::Overflow => Self::Overflow,
        }
    }
}

/// Format `values` into `line`, replacing its previous contents.
pub fn format_line<const CAP: usize>(
    values: &[f32],
    line: &mut String<CAP>,
) -> Result<(), FormatError> {
    line.clear();
    let (last, rest) = values.split_last().ok_or(FormatError::Empty)?;
    for value in rest {
        write!(line, "{:.4} ", value)?;
    }
    writeln!(line, "{:.4}", last)?;
    Ok(())
}

/// Owns the serial writer and a reusable line buffer.
pub struct LineEmitter<W> {
    writer: W,
    line: String<LINE_CAPACITY>,
}

impl<W: Write> LineEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            line: String::new(),
        }
    }

    pub async fn emit(&mut self, values: &[f32]) -> Result<(), EmitError<W::Error>> {
        format_line(values, &mut self.line)?;
        self.writer
            .write_all(self.line.as_bytes())
            .await
            .map_err(EmitError::Io)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_io_async::{ErrorKind, ErrorType};

    /// Collects everything written to it.
    #[derive(Default)]
    pub(crate) struct RecordingSerial {
        pub(crate) bytes: Vec<u8>,
    }

    impl RecordingSerial {
        pub(crate) fn lines(&self) -> Vec<std::string::String> {
            std::str::from_utf8(&self.bytes)
                .unwrap()
                .split_inclusive('\n')
                .map(|l| l.to_owned())
                .collect()
        }
    }

    impl ErrorType for RecordingSerial {
        type Error = Infallible;
    }

    impl Write for RecordingSerial {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    /// Fails every write.
    pub(crate) struct BrokenSerial;

    impl ErrorType for BrokenSerial {
        type Error = ErrorKind;
    }

    impl Write for BrokenSerial {
        async fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
            Err(ErrorKind::BrokenPipe)
        }
    }

    fn format(values: &[f32]) -> Result<String<LINE_CAPACITY>, FormatError> {
        let mut line = String::new();
        format_line(values, &mut line)?;
        Ok(line)
    }

    #[test]
    fn four_digits_single_spaces_newline() {
        let line = format(&[0.0, -0.03, 0.04]).unwrap();
        assert_eq!(line.as_str(), "0.0000 -0.0300 0.0400\n");
    }

    #[test]
    fn single_value_has_no_separator() {
        assert_eq!(format(&[21.5]).unwrap().as_str(), "21.5000\n");
    }

    #[test]
    fn rounds_to_four_places() {
        let line = format(&[1.23456, -9.87654, 12.0]).unwrap();
        assert_eq!(line.as_str(), "1.2346 -9.8765 12.0000\n");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(format(&[]), Err(FormatError::Empty));
    }

    #[test]
    fn oversized_line_is_rejected() {
        let mut tiny: String<8> = String::new();
        assert_eq!(format_line(&[1.0, 2.0], &mut tiny), Err(FormatError::Overflow));
    }

    #[test]
    fn every_value_has_four_fractional_digits() {
        let line = format(&[-123.4, 0.00001, 7.0]).unwrap();
        let body = line.strip_suffix('\n').unwrap();
        assert!(!body.starts_with(' ') && !body.ends_with(' '));
        let fields: Vec<&str> = body.split(' ').collect();
        assert_eq!(fields.len(), 3);
        for field in fields {
            let (_, frac) = field.split_once('.').unwrap();
            assert_eq!(frac.len(), 4, "field {field}");
        }
    }

    #[test]
    fn emit_writes_whole_line() {
        let mut emitter = LineEmitter::new(RecordingSerial::default());
        block_on(emitter.emit(&[22.5, 41.25])).unwrap();
        assert_eq!(emitter.into_inner().bytes, b"22.5000 41.2500\n");
    }

    #[test]
    fn emit_reports_io_failure() {
        let mut emitter = LineEmitter::new(BrokenSerial);
        let res = block_on(emitter.emit(&[1.0]));
        assert_eq!(res, Err(EmitError::Io(ErrorKind::BrokenPipe)));
    }

    #[test]
    fn emit_maps_format_errors() {
        let mut emitter = LineEmitter::new(RecordingSerial::default());
        assert_eq!(block_on(emitter.emit(&[])), Err(EmitError::Empty));
        let wide = [1.0e30_f32; 4];
        assert_eq!(block_on(emitter.emit(&wide)), Err(EmitError::Overflow));
        assert!(emitter.into_inner().bytes.is_empty());
    }
}
