use crate::Error;

/// Chunk size lines longer than this are not credible.
const MAX_SIZE_DIGITS: u8 = 16;

/// Incremental scanner for chunked transfer encoding.
///
/// The proxy forwards the chunked stream verbatim, so this only tracks
/// framing: where chunk data runs and when the terminal chunk plus trailer
/// block have passed. All sub-line state is kept internally, so every byte
/// offered is consumed exactly once no matter how the input is fragmented.
#[derive(Debug)]
pub(crate) struct ChunkScanner {
    state: State,
}

#[derive(Debug, Clone, Copy)]
enum State {
    /// Reading the hex digits of a chunk size line.
    Size { value: u64, digits: u8 },
    /// Skipping a chunk extension after `;`.
    Ext { size: u64 },
    /// Seen the CR ending a size line, expecting LF.
    SizeLf { size: u64 },
    /// Inside chunk data.
    Data { left: u64 },
    /// Expecting the CR after chunk data.
    DataCr,
    /// Expecting the LF after chunk data.
    DataLf,
    /// At the start of a line in the trailer block.
    Trailer,
    /// Skipping a trailer field line.
    TrailerLine,
    /// Seen a CR inside the trailer block, expecting LF.
    TrailerLf,
    /// Seen the final CR, expecting the LF that ends the stream.
    EndLf,
    Ended,
}

impl ChunkScanner {
    pub fn new() -> Self {
        ChunkScanner {
            state: State::Size {
                value: 0,
                digits: 0,
            },
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, State::Ended)
    }

    /// Advance over `src`. Returns the number of bytes consumed and whether
    /// the stream ended. Bytes following the terminator are left unconsumed.
    pub fn scan(&mut self, src: &[u8]) -> Result<(usize, bool), Error> {
        let mut index = 0;

        while index < src.len() {
            match self.state {
                State::Data { left } => {
                    let take = u64::min((src.len() - index) as u64, left) as usize;
                    index += take;
                    let left = left - take as u64;
                    self.state = if left == 0 {
                        State::DataCr
                    } else {
                        State::Data { left }
                    };
                }
                State::Ended => break,
                _ => {
                    self.step(src[index])?;
                    index += 1;
                }
            }
        }

        Ok((index, self.is_ended()))
    }

    fn step(&mut self, b: u8) -> Result<(), Error> {
        self.state = match self.state {
            State::Size { value, digits } => match b {
                b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                    if digits == MAX_SIZE_DIGITS {
                        return Err(Error::InvalidChunkSize);
                    }
                    State::Size {
                        value: value * 16 + hex_value(b),
                        digits: digits + 1,
                    }
                }
                b';' if digits > 0 => State::Ext { size: value },
                b'\r' if digits > 0 => State::SizeLf { size: value },
                b'\n' => return Err(Error::ChunkExpectedCrLf),
                _ => return Err(Error::InvalidChunkSize),
            },
            State::Ext { size } => match b {
                b'\r' => State::SizeLf { size },
                b'\n' => return Err(Error::ChunkExpectedCrLf),
                _ => State::Ext { size },
            },
            State::SizeLf { size } => match b {
                b'\n' if size == 0 => State::Trailer,
                b'\n' => State::Data { left: size },
                _ => return Err(Error::ChunkExpectedCrLf),
            },
            // Data is consumed in bulk by scan().
            State::Data { .. } => unreachable!("step() on chunk data"),
            State::DataCr => match b {
                b'\r' => State::DataLf,
                _ => return Err(Error::ChunkExpectedCrLf),
            },
            State::DataLf => match b {
                b'\n' => State::Size {
                    value: 0,
                    digits: 0,
                },
                _ => return Err(Error::ChunkExpectedCrLf),
            },
            State::Trailer => match b {
                b'\r' => State::EndLf,
                b'\n' => return Err(Error::ChunkExpectedCrLf),
                _ => State::TrailerLine,
            },
            State::TrailerLine => match b {
                b'\r' => State::TrailerLf,
                b'\n' => return Err(Error::ChunkExpectedCrLf),
                _ => State::TrailerLine,
            },
            State::TrailerLf => match b {
                b'\n' => State::Trailer,
                _ => return Err(Error::ChunkExpectedCrLf),
            },
            State::EndLf => match b {
                b'\n' => State::Ended,
                _ => return Err(Error::ChunkExpectedCrLf),
            },
            State::Ended => unreachable!("scan() stops at ended"),
        };
        Ok(())
    }
}

fn hex_value(b: u8) -> u64 {
    match b {
        b'0'..=b'9' => (b - b'0') as u64,
        b'a'..=b'f' => (b - b'a' + 10) as u64,
        b'A'..=b'F' => (b - b'A' + 10) as u64,
        _ => unreachable!("checked hex digit"),
    }
}
