/* Copyright (C) 2021 by Jacob Alexander
 *
 * This file is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

// ----- Modules -----

use super::KeyCode;
use crate::Error;

// ----- Consts -----

/// Bytes requested per read from the event stream
pub const REPORT_BUFFER_SIZE: usize = 4096;

/// Offset of the byte that marks a multimedia key report
/// Falls on the value field of the second input_event of a burst
pub const VALID_FLAG_OFFSET: usize = 44;

/// Offset of the vendor key identifier
/// Low byte of the MSC_SCAN value in the first input_event of a burst
pub const KEY_ID_OFFSET: usize = 20;

/// Flag value of a multimedia key press
pub const VALID_FLAG: u8 = 0x01;

/// Key identifiers sent by the SINOWEALTH Game Mouse Keyboard
/// 0xA7 and 0xA9 are never sent
pub const SINOWEALTH_KEYS: [(u8, KeyCode); 9] = [
    (0xA0, KeyCode::PlayPause),
    (0xA1, KeyCode::Next),
    (0xA2, KeyCode::Previous),
    (0xA3, KeyCode::Stop),
    (0xA4, KeyCode::Mute),
    (0xA5, KeyCode::VolumeUp),
    (0xA6, KeyCode::VolumeDown),
    (0xA8, KeyCode::Calculator),
    (0xAA, KeyCode::Homepage),
];

// ----- Structs -----

/// Where the meaningful bytes of a report live
///
/// # Remarks
/// The vendor layout is undocumented, these offsets were found by observation
/// and are the only fields known to be stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportLayout {
    pub flag_offset: usize,
    pub key_offset: usize,
    pub valid_flag: u8,
    pub buffer_size: usize,
}

impl Default for ReportLayout {
    fn default() -> ReportLayout {
        ReportLayout {
            flag_offset: VALID_FLAG_OFFSET,
            key_offset: KEY_ID_OFFSET,
            valid_flag: VALID_FLAG,
            buffer_size: REPORT_BUFFER_SIZE,
        }
    }
}

impl ReportLayout {
    /// Minimum number of bytes a report must contain to be decoded
    pub fn min_len(&self) -> usize {
        self.flag_offset.max(self.key_offset) + 1
    }
}

/// Immutable vendor key id to key code lookup
#[derive(Clone, PartialEq, Eq)]
pub struct DecoderTable {
    lookup: [Option<KeyCode>; 256],
}

impl DecoderTable {
    /// Builds a table, later entries win on duplicate ids
    pub fn new(entries: &[(u8, KeyCode)]) -> DecoderTable {
        let mut lookup = [None; 256];
        for (id, key) in entries {
            lookup[*id as usize] = Some(*key);
        }
        DecoderTable { lookup }
    }

    pub fn get(&self, id: u8) -> Option<KeyCode> {
        self.lookup[id as usize]
    }

    /// Distinct key codes the table can produce, in id order
    pub fn keys(&self) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = vec![];
        for key in self.lookup.iter().flatten() {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        keys
    }

    /// (id, key) pairs in id order
    pub fn entries(&self) -> impl Iterator<Item = (u8, KeyCode)> + '_ {
        self.lookup
            .iter()
            .enumerate()
            .filter_map(|(id, key)| key.map(|key| (id as u8, key)))
    }
}

impl Default for DecoderTable {
    fn default() -> DecoderTable {
        DecoderTable::new(&SINOWEALTH_KEYS)
    }
}

impl std::fmt::Debug for DecoderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

/// Report to key code decoder
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    layout: ReportLayout,
    table: DecoderTable,
}

impl Decoder {
    pub fn new(layout: ReportLayout, table: DecoderTable) -> Decoder {
        Decoder { layout, table }
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Decode the bytes of a single read
    ///
    /// Returns Ok(None) for traffic that isn't a multimedia key (regular
    /// keyboard/mouse events share the stream) and for unknown key ids.
    pub fn decode(&self, report: &[u8]) -> Result<Option<KeyCode>, Error> {
        let needed = self.layout.min_len();
        if report.len() < needed {
            return Err(Error::TruncatedReport {
                len: report.len(),
                needed,
            });
        }

        if report[self.layout.flag_offset] != self.layout.valid_flag {
            return Ok(None);
        }

        let id = report[self.layout.key_offset];
        let key = self.table.get(id);
        if key.is_none() {
            trace!("Ignoring unknown key id {:#04x}", id);
        }
        Ok(key)
    }
}

// ----- Functions -----

/// Formats a report as rows of 16 hex bytes
pub fn hex_dump(report: &[u8]) -> String {
    report
        .chunks(16)
        .map(|row| {
            row.iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
