// File:    print.rs
// Author:  apezoo
// Date:    2025-08-06
//
// Description: Renders passcards as fixed-width text and as a printable HTML page.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Passcard rendering.
//!
//! A card is 38 columns wide. The header carries the host name on the left
//! and the 1-based card number on the right:
//!
//! ```text
//! example.org                        [1]
//!     A    B    C    D    E    F    G
//!  1: E6Cw Txid UbeV B3PE x?aX HoaZ hgFe
//! ```
//!
//! When both do not fit, the host is cut to 27 characters and the leading
//! digits of the card number are replaced by `...`.

use std::fmt::Write as _;

use ppp_mpi::Mpi;
use zeroize::Zeroizing;

use crate::card::{CODES_PER_CARD, COLUMNS, ROWS, first_index_of};
use crate::crypto::BlockCipher;
use crate::derivation::PasscodeGenerator;
use crate::error::PppResult;
use crate::secret::Passcode;

/// Width of a card in characters.
pub const CARD_WIDTH: usize = 38;

/// Longest host name kept when the header overflows.
pub const MAX_HOST_CHARS: usize = 27;

const GROUP: char = ',';
const COLUMN_LABELS: &str = "    A    B    C    D    E    F    G";

/// A card number (0-based) with its 70 passcodes.
#[derive(Debug)]
pub struct PrintedCard {
    /// 0-based card number.
    pub card: Mpi,
    /// Passcodes in row-major order.
    pub codes: Vec<Passcode>,
}

impl PrintedCard {
    /// Derives every passcode on `card`.
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] for a negative card.
    pub fn derive<C: BlockCipher>(generator: &PasscodeGenerator<C>, card: &Mpi) -> PppResult<Self> {
        let codes = generator.derive_block(&first_index_of(card)?, CODES_PER_CARD as usize)?;
        Ok(Self {
            card: card.clone(),
            codes,
        })
    }
}

/// Host part and bracketed card part of a header, already fitted to
/// [`CARD_WIDTH`].
struct Header {
    host: String,
    card: String,
}

impl Header {
    fn new(card: &Mpi, host: &str) -> PppResult<Self> {
        let mut host: String = host.chars().take(CARD_WIDTH).collect();
        let number = card.add_d(1)?.to_grouped_decimal(Some(GROUP))?;
        let mut card = number.clone();

        if host.chars().count() + number.len() + 3 > CARD_WIDTH {
            if host.chars().count() > MAX_HOST_CHARS {
                host = host.chars().take(MAX_HOST_CHARS).collect();
            }
            let room = CARD_WIDTH - host.chars().count() - 3;
            if number.len() > room {
                let mut kept = &number[number.len() - room..];
                // An ellipsis must not run straight into a group separator.
                let skip = usize::from(kept.as_bytes().get(3) == Some(&(GROUP as u8)));
                kept = &kept[3 + skip..];
                card = format!("...{kept}");
            }
        }
        Ok(Self { host, card })
    }

    fn padding(&self) -> usize {
        CARD_WIDTH.saturating_sub(self.host.chars().count() + self.card.len() + 2)
    }
}

/// One card as plain text: header, column labels, ten rows and a blank line.
///
/// # Errors
///
/// Only on allocation failure.
pub fn render_text_card(card: &PrintedCard, host: &str) -> PppResult<Zeroizing<String>> {
    let header = Header::new(&card.card, host)?;
    let mut out = Zeroizing::new(String::with_capacity(CARD_WIDTH * 13));
    let _ = writeln!(out, "{}{}[{}]", header.host, " ".repeat(header.padding()), header.card);
    let _ = writeln!(out, "{COLUMN_LABELS}");
    for (row, codes) in card.codes.chunks(usize::from(COLUMNS)).take(usize::from(ROWS)).enumerate() {
        let _ = write!(out, "{:2}: ", row + 1);
        for (i, code) in codes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(code.as_str());
        }
        out.push('\n');
    }
    out.push('\n');
    Ok(out)
}

const HTML_HEAD: &str = r#"<html>
<head><title>&nbsp;Perfect Paper Passwords&nbsp;</title>
<style type="text/css">
body { color:#009; background:white; font-size:10pt; font-family: verdana, tahoma, arial, helvetica, sans-serif; }
#nopagepad { margin:0; padding:0; border:0; }
.passcard { color:#000; background:#fff; border:1px solid #000; font-size:14px; font-family:"Courier New", monospace; }
.passcard_header { color:#000; background:#eee; border-bottom:solid #aaa; border-bottom-width:1px; padding:6px 10px; }
.passcard_content { padding:4px 10px 10px 10px; font-weight:bold; }
.passcard_column_labels { text-align:center; padding-bottom:2px; }
@media screen { .passcard_content { font-weight:normal; } }
</style>
</head><body id="nopagepad" bgcolor="white"><center><table border="0" cellpadding="0" cellspacing="1">
"#;

const HTML_FOOT: &str = r#"</table>
<br />
<font color="black" size=1><b>Print this page (in portrait orientation if you would like all three cards<br />to fit) then either cut out and separate the individual passcards, or<br />keep the three attached and fold down into one-card size.</b><br /><br />Please refer to GRC's Perfect Paper Passwords pages<br />for information about the operation of this system.</font></center>
</html>
"#;

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn push_html_card(out: &mut String, card: &PrintedCard, host: &str) -> PppResult<()> {
    let header = Header::new(&card.card, host)?;
    out.push_str("<tr><td><div class=\"passcard\">\n<div class=\"passcard_header\">");
    push_escaped(out, &header.host);
    out.push_str(&"&nbsp;".repeat(header.padding()));
    let _ = writeln!(out, "[{}]</div>", header.card);
    out.push_str("<div class=\"passcard_content\">\n<div class=\"passcard_column_labels\">");
    out.push_str(&COLUMN_LABELS.replace(' ', "&nbsp;"));
    out.push_str("\n</div>\n");
    for (row, codes) in card.codes.chunks(usize::from(COLUMNS)).take(usize::from(ROWS)).enumerate() {
        if row + 1 < 10 {
            out.push_str("&nbsp;");
        }
        let _ = write!(out, "{}:&nbsp;", row + 1);
        for (i, code) in codes.iter().enumerate() {
            if i > 0 {
                out.push_str("&nbsp;");
            }
            push_escaped(out, code.as_str());
        }
        out.push_str("<br />\n");
    }
    out.push_str("</div>\n</div>\n</td></tr>\n");
    Ok(())
}

/// A complete HTML document with one passcard per entry of `cards`.
///
/// # Errors
///
/// Only on allocation failure.
pub fn render_html_page(cards: &[PrintedCard], host: &str) -> PppResult<Zeroizing<String>> {
    let mut out = Zeroizing::new(String::with_capacity(HTML_HEAD.len() + HTML_FOOT.len() + cards.len() * 1200));
    out.push_str(HTML_HEAD);
    for card in cards {
        push_html_card(&mut out, card, host)?;
    }
    out.push_str(HTML_FOOT);
    Ok(out)
}
