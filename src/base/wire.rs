//! Reading and writing the wire format.
//!
//! DNS messages are parsed from a contiguous octets slice using a
//! [`Parser`] that keeps track of the current position, so that compressed
//! domain names can jump back into earlier parts of the message. Composing
//! simply appends to a `Vec<u8>`; the only thing that can go wrong there is
//! exceeding the 65,535 octet limit of a message, reported as [`ShortBuf`].

use std::{error, fmt};

//------------ Parser --------------------------------------------------------

/// A parser over the octets of a complete DNS message.
#[derive(Clone, Copy, Debug)]
pub struct Parser<'a> {
    /// The octets of the whole message.
    octets: &'a [u8],

    /// The current read position.
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser positioned at the start of `octets`.
    pub fn from_slice(octets: &'a [u8]) -> Self {
        Parser { octets, pos: 0 }
    }

    /// Returns the complete underlying octets slice.
    pub fn as_slice(&self) -> &'a [u8] {
        self.octets
    }

    /// Returns the current read position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the number of octets left to parse.
    pub fn remaining(&self) -> usize {
        self.octets.len() - self.pos
    }

    /// Moves the read position to `pos`.
    pub fn seek(&mut self, pos: usize) -> Result<(), ParseError> {
        if pos > self.octets.len() {
            return Err(ParseError::ShortInput);
        }
        self.pos = pos;
        Ok(())
    }

    /// Skips over `len` octets.
    pub fn advance(&mut self, len: usize) -> Result<(), ParseError> {
        if len > self.remaining() {
            return Err(ParseError::ShortInput);
        }
        self.pos += len;
        Ok(())
    }

    /// Returns the next `len` octets and advances past them.
    pub fn parse_octets(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        let end = self.pos.checked_add(len).ok_or(ParseError::ShortInput)?;
        let res = self
            .octets
            .get(self.pos..end)
            .ok_or(ParseError::ShortInput)?;
        self.pos = end;
        Ok(res)
    }

    /// Returns the next `N` octets as an array.
    pub fn parse_array<const N: usize>(
        &mut self,
    ) -> Result<[u8; N], ParseError> {
        let mut res = [0u8; N];
        res.copy_from_slice(self.parse_octets(N)?);
        Ok(res)
    }

    /// Takes a single octet.
    pub fn parse_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.parse_array::<1>()?[0])
    }

    /// Takes a big-endian `u16`.
    pub fn parse_u16(&mut self) -> Result<u16, ParseError> {
        self.parse_array().map(u16::from_be_bytes)
    }

    /// Takes a big-endian `u32`.
    pub fn parse_u32(&mut self) -> Result<u32, ParseError> {
        self.parse_array().map(u32::from_be_bytes)
    }
}

//------------ Composing -----------------------------------------------------

/// The maximum size of a DNS message.
pub const MAX_MESSAGE_LEN: usize = 0xFFFF;

/// Appends `data` to `target` unless the message would grow too large.
pub fn append_slice(target: &mut Vec<u8>, data: &[u8]) -> Result<(), ShortBuf> {
    if target.len() + data.len() > MAX_MESSAGE_LEN {
        return Err(ShortBuf);
    }
    target.extend_from_slice(data);
    Ok(())
}

/// Appends a big-endian `u16`.
pub fn append_u16(target: &mut Vec<u8>, value: u16) -> Result<(), ShortBuf> {
    append_slice(target, &value.to_be_bytes())
}

/// Appends a big-endian `u32`.
pub fn append_u32(target: &mut Vec<u8>, value: u32) -> Result<(), ShortBuf> {
    append_slice(target, &value.to_be_bytes())
}

//============ Error Types ===================================================

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to go beyond the end of the parser.
    ShortInput,

    /// A formatting error occurred.
    Form(FormError),
}

impl ParseError {
    /// Creates a new parse error as a form error with the given message.
    pub fn form_error(msg: &'static str) -> Self {
        FormError::new(msg).into()
    }
}

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => fmt::Display::fmt(err, f),
        }
    }
}

impl error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// A formatting error occured.
///
/// This is a generic error for all kinds of error cases that result in data
/// not being accepted. For diagnostics, the error is being given a static
/// string describing the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error value with the given diagnostics string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl error::Error for FormError {}

//------------ ShortBuf ------------------------------------------------------

/// A message grew beyond the maximum message size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShortBuf;

impl fmt::Display for ShortBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("buffer size exceeded")
    }
}

impl error::Error for ShortBuf {}

//============ Testing =======================================================
