// File:    card.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: Passcard geometry and conversion between passcode indices and card/row/column ids.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::fmt;

use ppp_mpi::Mpi;

use crate::error::{PppError, PppResult};

/// Passcodes printed on one card.
pub const CODES_PER_CARD: u32 = 70;
/// Rows per card.
pub const ROWS: u8 = 10;
/// Columns per card, labelled `A` to `G`.
pub const COLUMNS: u8 = 7;

/// The card (0-based) holding passcode `index`.
///
/// # Errors
///
/// [`PppError::Mpi`] on allocation failure.
pub fn card_of(index: &Mpi) -> PppResult<Mpi> {
    Ok(index.div_d(CODES_PER_CARD)?.0)
}

/// Index of the first passcode on `card` (0-based).
///
/// # Errors
///
/// [`PppError::Mpi`] on allocation failure.
pub fn first_index_of(card: &Mpi) -> PppResult<Mpi> {
    Ok(card.mul_d(CODES_PER_CARD)?)
}

/// Position of a passcode on the printed cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasscodeId {
    /// 0-based card number.
    pub card: Mpi,
    /// 0-based column, `0..7`.
    pub column: u8,
    /// 0-based row, `0..10`.
    pub row: u8,
}

impl PasscodeId {
    /// Where passcode `index` is printed.
    ///
    /// # Errors
    ///
    /// [`PppError::InvalidPasscodeId`] for a negative index.
    pub fn from_index(index: &Mpi) -> PppResult<Self> {
        if index.is_neg() {
            return Err(PppError::InvalidPasscodeId(index.to_string()));
        }
        let (card, within) = index.div_d(CODES_PER_CARD)?;
        // `within < 70`, so both fit a u8.
        let within = u8::try_from(within).unwrap_or(0);
        Ok(Self {
            card,
            column: within % COLUMNS,
            row: within / COLUMNS,
        })
    }

    /// The passcode index, `card * 70 + row * 7 + column`.
    ///
    /// # Errors
    ///
    /// [`PppError::Mpi`] on allocation failure.
    pub fn to_index(&self) -> PppResult<Mpi> {
        let within = u32::from(self.row) * u32::from(COLUMNS) + u32::from(self.column);
        Ok(first_index_of(&self.card)?.add_d(within)?)
    }

    /// Parses the printed form `RRC[NNNN]`: a 1-based row, a column letter
    /// and a 1-based card number. Commas, brackets and spaces are ignored,
    /// so `3b 1,024`, `3B[1,024]` and `3B1024` are the same passcode.
    ///
    /// # Errors
    ///
    /// [`PppError::InvalidPasscodeId`] if any part is missing or out of range.
    pub fn parse(text: &str) -> PppResult<Self> {
        let invalid = || PppError::InvalidPasscodeId(text.to_owned());
        let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | '[' | ']' | ' ')).collect();

        let row_len = cleaned.bytes().take_while(u8::is_ascii_digit).count();
        let row: u8 = cleaned[..row_len].parse().map_err(|_| invalid())?;
        if !(1..=ROWS).contains(&row) {
            return Err(invalid());
        }

        let rest = &cleaned[row_len..];
        let letter = rest.chars().next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !('A'..='G').contains(&letter) {
            return Err(invalid());
        }
        let card = parse_card_number(&rest[1..]).map_err(|_| invalid())?;

        Ok(Self {
            card,
            column: letter as u8 - b'A',
            row: row - 1,
        })
    }

    /// Column label, `A` to `G`.
    #[must_use]
    pub fn column_letter(&self) -> char {
        char::from(b'A' + self.column)
    }
}

/// Parses a 1-based card number (commas allowed) into a 0-based card.
///
/// # Errors
///
/// [`PppError::InvalidPasscodeId`] unless the text is a decimal number >= 1.
pub fn parse_card_number(text: &str) -> PppResult<Mpi> {
    let digits: String = text.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PppError::InvalidPasscodeId(text.to_owned()));
    }
    let card = Mpi::read_radix(&digits, 10)?;
    if card.is_zero() {
        return Err(PppError::InvalidPasscodeId(text.to_owned()));
    }
    Ok(card.sub_d(1)?)
}

impl fmt::Display for PasscodeId {
    /// `{row}{COL} [{card}]` with the card 1-based and comma-grouped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let card = self
            .card
            .add_d(1)
            .and_then(|c| c.to_grouped_decimal(Some(',')))
            .map_err(|_| fmt::Error)?;
        write!(f, "{}{} [{card}]", self.row + 1, self.column_letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_to_id_and_back() {
        let id = PasscodeId::from_index(&Mpi::from_u64(70 * 1233 + 15)).unwrap();
        assert_eq!(id.card, Mpi::from_u64(1233));
        assert_eq!((id.row, id.column), (2, 1));
        assert_eq!(id.to_string(), "3B [1,234]");
        assert_eq!(id.to_index().unwrap(), Mpi::from_u64(70 * 1233 + 15));
    }

    #[test]
    fn parse_accepts_decorations() {
        for text in ["3B[1,234]", "3b 1234", "3B1,234"] {
            let id = PasscodeId::parse(text).unwrap();
            assert_eq!(id.to_string(), "3B [1,234]", "{text}");
        }
        assert_eq!(PasscodeId::parse("10G1").unwrap().to_index().unwrap(), Mpi::from_u64(69));
    }

    #[test]
    fn parse_rejects_bad_ids() {
        for text in ["", "B1", "0A1", "11A1", "1H1", "1A", "1A0", "1Ax"] {
            assert!(PasscodeId::parse(text).is_err(), "{text}");
        }
    }

    #[test]
    fn first_code_is_1a_1() {
        assert_eq!(PasscodeId::from_index(&Mpi::new()).unwrap().to_string(), "1A [1]");
    }
}
