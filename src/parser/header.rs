use std::borrow::Cow;
use std::io::{ErrorKind, Read};

use crate::error::{Error, Result, Section};

/// Size of a FITS logical record.
pub const BLOCK_SIZE: usize = 2880;
/// Size of one header card.
pub const CARD_SIZE: usize = 80;
const KEYWORD_SIZE: usize = 8;
const VALUE_INDICATOR: &[u8] = b"= ";

/// Decoded value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    String(String),
    Logical(bool),
    Integer(i64),
    Float(f64),
    /// Value field present but empty.
    Undefined,
    /// Anything else (complex numbers, malformed values), kept verbatim.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Option<CardValue>,
}

/// Header of one HDU.
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub hdu: usize,
    pub cards: Vec<Card>,
    /// Number of bytes occupied by the header, including block padding.
    pub byte_len: u64,
}

impl Header {
    #[must_use]
    pub fn value(&self, keyword: &str) -> Option<&CardValue> {
        self.cards
            .iter()
            .find(|card| card.keyword == keyword)
            .and_then(|card| card.value.as_ref())
    }

    #[must_use]
    pub fn integer(&self, keyword: &str) -> Option<i64> {
        match self.value(keyword)? {
            CardValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn float(&self, keyword: &str) -> Option<f64> {
        match self.value(keyword)? {
            CardValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            CardValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn string(&self, keyword: &str) -> Option<&str> {
        match self.value(keyword)? {
            CardValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn logical(&self, keyword: &str) -> Option<bool> {
        match self.value(keyword)? {
            CardValue::Logical(value) => Some(*value),
            _ => None,
        }
    }

    /// Reads a mandatory non-negative integer keyword.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyword is absent, not an integer, or negative.
    pub fn required_count(&self, keyword: &str) -> Result<u64> {
        let value = self.integer(keyword).ok_or_else(|| Error::Corrupted {
            section: Section::Header { hdu: self.hdu },
            details: Cow::Owned(format!("missing or non-integer {keyword} keyword")),
        })?;
        u64::try_from(value).map_err(|_| Error::Corrupted {
            section: Section::Header { hdu: self.hdu },
            details: Cow::Owned(format!("{keyword} must not be negative (found {value})")),
        })
    }

    /// Size of the data unit in bytes, excluding block padding.
    ///
    /// # Errors
    ///
    /// Returns an error if the structural keywords are missing or overflow.
    pub fn data_len(&self) -> Result<u64> {
        let naxis = self.required_count("NAXIS")?;
        if naxis == 0 {
            return Ok(0);
        }
        let bitpix = self.integer("BITPIX").ok_or_else(|| Error::Corrupted {
            section: Section::Header { hdu: self.hdu },
            details: Cow::from("missing BITPIX keyword"),
        })?;
        let random_groups = self.logical("GROUPS").unwrap_or(false);
        let mut elements = 1_u64;
        for axis in 1..=naxis {
            let len = self.required_count(&format!("NAXIS{axis}"))?;
            if axis == 1 && random_groups && len == 0 {
                continue;
            }
            elements = elements.checked_mul(len).ok_or_else(|| self.overflow())?;
        }
        let pcount = self.integer("PCOUNT").unwrap_or(0);
        let gcount = self.integer("GCOUNT").unwrap_or(1);
        let pcount = u64::try_from(pcount).map_err(|_| self.overflow())?;
        let gcount = u64::try_from(gcount).map_err(|_| self.overflow())?;
        let bytes_per_element = bitpix.unsigned_abs() / 8;
        elements
            .checked_add(pcount)
            .and_then(|total| total.checked_mul(gcount))
            .and_then(|total| total.checked_mul(bytes_per_element))
            .ok_or_else(|| self.overflow())
    }

    fn overflow(&self) -> Error {
        Error::Corrupted {
            section: Section::Header { hdu: self.hdu },
            details: Cow::from("data unit size overflows"),
        }
    }
}

/// Rounds a byte count up to the next whole block.
#[must_use]
pub const fn padded_len(len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    len.div_ceil(block) * block
}

/// Reads one header from the current position.
///
/// Returns `Ok(None)` when the stream ends exactly at an HDU boundary.
///
/// # Errors
///
/// Returns an error if the stream ends inside a header, a card contains
/// non-ASCII bytes, or no `END` card is found.
pub fn read_header<R: Read>(reader: &mut R, hdu: usize) -> Result<Option<Header>> {
    let mut header = Header {
        hdu,
        ..Header::default()
    };
    let mut block = [0u8; BLOCK_SIZE];
    loop {
        match read_block(reader, &mut block, hdu) {
            Ok(true) => {}
            Ok(false) if header.byte_len == 0 => return Ok(None),
            Ok(false) => {
                return Err(Error::Corrupted {
                    section: Section::Header { hdu },
                    details: Cow::from("file ends before the END card"),
                });
            }
            Err(err) => return Err(err),
        }
        header.byte_len += BLOCK_SIZE as u64;

        for raw in block.chunks_exact(CARD_SIZE) {
            let index = header.cards.len();
            if !raw.is_ascii() {
                return Err(Error::Corrupted {
                    section: Section::Card { hdu, index },
                    details: Cow::from("header card contains non-ASCII bytes"),
                });
            }
            let card = parse_card(raw);
            if card.keyword == "END" {
                return Ok(Some(header));
            }
            header.cards.push(card);
        }
    }
}

/// Fills `block`, returning `false` on a clean end of stream.
fn read_block<R: Read>(reader: &mut R, block: &mut [u8; BLOCK_SIZE], hdu: usize) -> Result<bool> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    match filled {
        0 => Ok(false),
        BLOCK_SIZE => Ok(true),
        _ => Err(Error::Corrupted {
            section: Section::Header { hdu },
            details: Cow::Owned(format!("truncated header block ({filled} bytes)")),
        }),
    }
}

/// Parses one 80-byte ASCII card.
#[must_use]
pub fn parse_card(raw: &[u8]) -> Card {
    let text = String::from_utf8_lossy(raw);
    let keyword = text.get(..KEYWORD_SIZE).unwrap_or(&text).trim_end().to_owned();
    let has_value = raw.get(KEYWORD_SIZE..KEYWORD_SIZE + 2) == Some(VALUE_INDICATOR);
    let value = if has_value && keyword != "COMMENT" && keyword != "HISTORY" {
        Some(parse_value(text.get(KEYWORD_SIZE + 2..).unwrap_or("")))
    } else {
        None
    };
    Card { keyword, value }
}

fn parse_value(field: &str) -> CardValue {
    let field = field.trim_start();
    if let Some(rest) = field.strip_prefix('\'') {
        return CardValue::String(parse_quoted(rest));
    }

    let literal = field.split_once('/').map_or(field, |(value, _)| value).trim();
    match literal {
        "" => CardValue::Undefined,
        "T" => CardValue::Logical(true),
        "F" => CardValue::Logical(false),
        _ => literal
            .parse::<i64>()
            .map(CardValue::Integer)
            .or_else(|_| literal.replace(['D', 'd'], "E").parse::<f64>().map(CardValue::Float))
            .unwrap_or_else(|_| CardValue::Other(literal.to_owned())),
    }
}

/// Reads a quoted string body (after the opening quote); `''` is an escaped quote.
fn parse_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
            } else {
                break;
            }
        } else {
            out.push(ch);
        }
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}
