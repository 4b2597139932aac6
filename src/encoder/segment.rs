//! Mode classification and segmentation.
//!
//! The input is split into runs, each encoded in the cheapest mode that can
//! represent it. Every mode switch costs a header (4-bit indicator plus a
//! version-dependent count field), so the split is chosen by dynamic
//! programming over the whole input rather than greedily.

use super::bits::BitBuffer;
use crate::error::QrError;
use crate::models::Version;

/// Characters representable in alphanumeric mode, in code order
pub const ALPHANUMERIC_CHARSET: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Segment data mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Digits 0-9, 10 bits per 3 digits
    Numeric,
    /// [`ALPHANUMERIC_CHARSET`], 11 bits per 2 characters
    Alphanumeric,
    /// Raw 8-bit bytes
    Byte,
    /// Shift JIS double-byte characters, 13 bits each
    Kanji,
    /// Extended Channel Interpretation designator
    Eci,
}

impl Mode {
    /// 4-bit mode indicator
    pub fn indicator(self) -> u32 {
        match self {
            Mode::Numeric => 0b0001,
            Mode::Alphanumeric => 0b0010,
            Mode::Byte => 0b0100,
            Mode::Kanji => 0b1000,
            Mode::Eci => 0b0111,
        }
    }

    pub fn from_indicator(bits: u32) -> Option<Self> {
        match bits {
            0b0001 => Some(Mode::Numeric),
            0b0010 => Some(Mode::Alphanumeric),
            0b0100 => Some(Mode::Byte),
            0b1000 => Some(Mode::Kanji),
            0b0111 => Some(Mode::Eci),
            _ => None,
        }
    }

    /// Width of the character count field for this mode and version
    pub fn char_count_bits(self, version: Version) -> u8 {
        let range = match version.number() {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        let widths: [u8; 3] = match self {
            Mode::Numeric => [10, 12, 14],
            Mode::Alphanumeric => [9, 11, 13],
            Mode::Byte => [8, 16, 16],
            Mode::Kanji => [8, 10, 12],
            Mode::Eci => [0, 0, 0],
        };
        widths[range]
    }
}

/// How the input bytes are to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    /// UTF-8 text; invalid sequences are rejected
    #[default]
    Utf8,
    /// ISO 8859-1; every byte is a character
    Latin1,
    /// Shift JIS; double-byte kanji are packed in kanji mode
    ShiftJis,
}

impl Charset {
    /// ECI assignment number announcing this charset
    pub fn eci_designator(self) -> u32 {
        match self {
            Charset::Utf8 => 26,
            Charset::Latin1 => 3,
            Charset::ShiftJis => 20,
        }
    }
}

/// A run of input encoded under one mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    mode: Mode,
    num_chars: usize,
    data: BitBuffer,
}

impl Segment {
    /// Numeric segment. Fails on the first byte that is not an ASCII digit.
    pub fn numeric(digits: &[u8]) -> Result<Self, QrError> {
        if let Some(position) = digits.iter().position(|d| !d.is_ascii_digit()) {
            return Err(QrError::UnsupportedCharacter {
                position,
                reason: "not a decimal digit".to_string(),
            });
        }
        Ok(Self::pack_numeric(digits))
    }

    /// Alphanumeric segment. Fails on the first byte outside
    /// [`ALPHANUMERIC_CHARSET`].
    pub fn alphanumeric(text: &[u8]) -> Result<Self, QrError> {
        let codes = text
            .iter()
            .enumerate()
            .map(|(position, &c)| {
                alphanumeric_code(c).ok_or_else(|| QrError::UnsupportedCharacter {
                    position,
                    reason: "outside the alphanumeric character set".to_string(),
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(Self::pack_alphanumeric(&codes))
    }

    fn pack_numeric(digits: &[u8]) -> Self {
        let mut data = BitBuffer::with_capacity(digits.len() * 10 / 3 + 4);
        for group in digits.chunks(3) {
            let value = group
                .iter()
                .fold(0u32, |acc, &d| acc * 10 + u32::from(d.wrapping_sub(b'0')));
            data.append_bits(value, (group.len() * 3 + 1) as u8);
        }
        Self {
            mode: Mode::Numeric,
            num_chars: digits.len(),
            data,
        }
    }

    fn pack_alphanumeric(codes: &[u32]) -> Self {
        let mut data = BitBuffer::with_capacity(codes.len() * 11 / 2 + 6);
        for pair in codes.chunks(2) {
            match pair {
                [a, b] => data.append_bits(a * 45 + b, 11),
                [a] => data.append_bits(*a, 6),
                _ => {}
            }
        }
        Self {
            mode: Mode::Alphanumeric,
            num_chars: codes.len(),
            data,
        }
    }

    /// Byte segment
    pub fn bytes(bytes: &[u8]) -> Self {
        let mut data = BitBuffer::with_capacity(bytes.len() * 8);
        for &b in bytes {
            data.append_bits(u32::from(b), 8);
        }
        Self {
            mode: Mode::Byte,
            num_chars: bytes.len(),
            data,
        }
    }

    /// Kanji segment from 13-bit packed values
    pub fn kanji(values: &[u16]) -> Self {
        let mut data = BitBuffer::with_capacity(values.len() * 13);
        for &v in values {
            data.append_bits(u32::from(v), 13);
        }
        Self {
            mode: Mode::Kanji,
            num_chars: values.len(),
            data,
        }
    }

    /// ECI designator segment
    pub fn eci(designator: u32) -> Result<Self, QrError> {
        let mut data = BitBuffer::new();
        if designator < (1 << 7) {
            data.append_bits(designator, 8);
        } else if designator < (1 << 14) {
            data.append_bits(0b10, 2);
            data.append_bits(designator, 14);
        } else if designator < 1_000_000 {
            data.append_bits(0b110, 3);
            data.append_bits(designator, 21);
        } else {
            return Err(QrError::InvalidParameter(format!(
                "ECI designator {designator} out of range"
            )));
        }
        Ok(Self {
            mode: Mode::Eci,
            num_chars: 0,
            data,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.num_chars
    }

    pub fn data(&self) -> &BitBuffer {
        &self.data
    }
}

/// Bits needed for all segments at `version`, or `None` when a character
/// count does not fit its field.
pub fn total_bits(segments: &[Segment], version: Version) -> Option<usize> {
    segments.iter().try_fold(0usize, |acc, seg| {
        let cc_bits = seg.mode.char_count_bits(version);
        if seg.num_chars >= 1usize << cc_bits {
            return None;
        }
        Some(acc + 4 + cc_bits as usize + seg.data.len())
    })
}

pub fn alphanumeric_code(c: u8) -> Option<u32> {
    ALPHANUMERIC_CHARSET
        .iter()
        .position(|&a| a == c)
        .map(|p| p as u32)
}

/// 13-bit kanji-mode value for a Shift JIS pair, if it lies in the kanji ranges
pub fn kanji_value(lead: u8, trail: u8) -> Option<u16> {
    if !(0x40..=0xFC).contains(&trail) || trail == 0x7F {
        return None;
    }
    let word = u16::from_be_bytes([lead, trail]);
    let offset = match word {
        0x8140..=0x9FFC => word - 0x8140,
        0xE040..=0xEBBF => word - 0xC140,
        _ => return None,
    };
    Some((offset >> 8) * 0xC0 + (offset & 0xFF))
}

/// One input character: `len` bytes starting at `start`
#[derive(Debug, Clone, Copy)]
struct Unit {
    start: usize,
    len: usize,
    kanji: Option<u16>,
}

// Order matters for tie-breaking: earlier modes win equal costs.
const MODES: [Mode; 4] = [Mode::Byte, Mode::Alphanumeric, Mode::Numeric, Mode::Kanji];

/// Splits validated input into segments for a given version range.
#[derive(Debug)]
pub struct Segmenter<'a> {
    data: &'a [u8],
    units: Vec<Unit>,
}

impl<'a> Segmenter<'a> {
    /// Validate `data` under `charset` and split it into characters.
    pub fn new(data: &'a [u8], charset: Charset) -> Result<Self, QrError> {
        let units = match charset {
            Charset::Utf8 => {
                std::str::from_utf8(data).map_err(|e| QrError::UnsupportedCharacter {
                    position: e.valid_up_to(),
                    reason: "invalid UTF-8 sequence".to_string(),
                })?;
                single_byte_units(data)
            }
            Charset::Latin1 => single_byte_units(data),
            Charset::ShiftJis => shift_jis_units(data)?,
        };
        Ok(Self { data, units })
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Cheapest segmentation under the count-field widths of `version`.
    pub fn segments_for(&self, version: Version) -> Vec<Segment> {
        let modes = self.choose_modes(version);
        let mut segments = Vec::new();
        let mut run_start = 0;
        for i in 1..=modes.len() {
            if i == modes.len() || modes[i] != modes[run_start] {
                segments.push(self.build_segment(modes[run_start], &self.units[run_start..i]));
                run_start = i;
            }
        }
        segments
    }

    // Costs are in sixths of a bit so numeric (10/3) and alphanumeric (11/2)
    // stay integral.
    fn unit_cost(unit: &Unit, mode: Mode, data: &[u8]) -> Option<usize> {
        let first = data[unit.start];
        match mode {
            Mode::Byte => Some(48 * unit.len),
            Mode::Numeric if unit.len == 1 && first.is_ascii_digit() => Some(20),
            Mode::Alphanumeric if unit.len == 1 && alphanumeric_code(first).is_some() => Some(33),
            Mode::Kanji if unit.kanji.is_some() => Some(78),
            _ => None,
        }
    }

    fn choose_modes(&self, version: Version) -> Vec<Mode> {
        let head_costs = MODES.map(|m| (4 + m.char_count_bits(version) as usize) * 6);
        let mut prev_costs = head_costs;
        let mut choices: Vec<[Mode; 4]> = Vec::with_capacity(self.units.len());

        for unit in &self.units {
            let mut costs = [usize::MAX; 4];
            let mut modes: [Option<Mode>; 4] = [None; 4];
            for (j, &mode) in MODES.iter().enumerate() {
                if let Some(cost) = Self::unit_cost(unit, mode, self.data) {
                    costs[j] = prev_costs[j] + cost;
                    modes[j] = Some(mode);
                }
            }

            // Ending in state j may also mean: encode this unit in mode k,
            // then switch to j (flush to a whole bit, pay j's header).
            let direct_costs = costs;
            let direct_modes = modes;
            for j in 0..MODES.len() {
                for k in 0..MODES.len() {
                    let Some(mode_k) = direct_modes[k] else {
                        continue;
                    };
                    let switched = direct_costs[k].div_ceil(6) * 6 + head_costs[j];
                    if modes[j].is_none() || switched < costs[j] {
                        costs[j] = switched;
                        modes[j] = Some(mode_k);
                    }
                }
            }

            // Byte mode always applies, so every state is reachable.
            choices.push(modes.map(|m| m.unwrap_or(Mode::Byte)));
            prev_costs = costs;
        }

        let mut state = (0..MODES.len())
            .min_by_key(|&j| prev_costs[j])
            .unwrap_or(0);
        let mut result = vec![Mode::Byte; self.units.len()];
        for i in (0..self.units.len()).rev() {
            let mode = choices[i][state];
            result[i] = mode;
            state = MODES.iter().position(|&m| m == mode).unwrap_or(0);
        }
        result
    }

    fn build_segment(&self, mode: Mode, units: &[Unit]) -> Segment {
        let first = units[0].start;
        let last = units[units.len() - 1];
        let bytes = &self.data[first..last.start + last.len];
        match mode {
            Mode::Numeric => Segment::pack_numeric(bytes),
            Mode::Alphanumeric => {
                let codes: Vec<u32> = bytes.iter().filter_map(|&c| alphanumeric_code(c)).collect();
                Segment::pack_alphanumeric(&codes)
            }
            Mode::Kanji => {
                let values: Vec<u16> = units.iter().filter_map(|u| u.kanji).collect();
                Segment::kanji(&values)
            }
            Mode::Byte | Mode::Eci => Segment::bytes(bytes),
        }
    }
}

fn single_byte_units(data: &[u8]) -> Vec<Unit> {
    (0..data.len())
        .map(|start| Unit {
            start,
            len: 1,
            kanji: None,
        })
        .collect()
}

fn shift_jis_units(data: &[u8]) -> Result<Vec<Unit>, QrError> {
    let mut units = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let lead = data[i];
        match lead {
            0x00..=0x7F | 0xA1..=0xDF => {
                units.push(Unit {
                    start: i,
                    len: 1,
                    kanji: None,
                });
                i += 1;
            }
            0x81..=0x9F | 0xE0..=0xFC => {
                let trail = match data.get(i + 1) {
                    Some(&t) if (0x40..=0xFC).contains(&t) && t != 0x7F => t,
                    _ => {
                        return Err(QrError::UnsupportedCharacter {
                            position: i,
                            reason: format!("Shift JIS lead byte 0x{lead:02X} without valid trail"),
                        });
                    }
                };
                units.push(Unit {
                    start: i,
                    len: 2,
                    kanji: kanji_value(lead, trail),
                });
                i += 2;
            }
            _ => {
                return Err(QrError::UnsupportedCharacter {
                    position: i,
                    reason: format!("byte 0x{lead:02X} is not valid Shift JIS"),
                });
            }
        }
    }
    Ok(units)
}
