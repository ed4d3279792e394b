#![allow(missing_docs, clippy::unwrap_used)]
//! Known-answer passcodes for the passphrase "correct horse battery staple".

use ppp_core::key_generator::sequence_key_from_passphrase;
use ppp_core::print::render_text_card;
use ppp_core::{Aes256Cipher, Alphabet, KeyVersion, PasscodeGenerator, PrintedCard};
use ppp_mpi::Mpi;

const PASSPHRASE: &str = "correct horse battery staple";

fn generator(version: KeyVersion) -> PasscodeGenerator<Aes256Cipher> {
    let key = sequence_key_from_passphrase(PASSPHRASE, version).unwrap();
    PasscodeGenerator::new(Aes256Cipher, &key, version, Alphabet::for_version(version)).unwrap()
}

fn codes(generator: &PasscodeGenerator<Aes256Cipher>, start: u64, count: usize) -> Vec<String> {
    generator
        .derive_block(&Mpi::from_u64(start), count)
        .unwrap()
        .iter()
        .map(|c| c.as_str().to_owned())
        .collect()
}

#[test]
fn v2_first_twenty_passcodes() {
    let expected = [
        "E6Cw", "Txid", "UbeV", "B3PE", "x?aX", "HoaZ", "hgFe", "%z67", "93Vt", "haRP", "67Em", "ih8?",
        "yX3J", "R4Hh", "WuhB", "XbgE", "bfKd", "%VmL", "u:3r", "79kS",
    ];
    assert_eq!(codes(&generator(KeyVersion::V2), 0, 20), expected);
}

#[test]
fn v2_single_passcodes_far_into_the_sequence() {
    let g = generator(KeyVersion::V2);
    assert_eq!(g.passcode(&Mpi::from_u64(70)).unwrap().as_str(), "LaqU");
    assert_eq!(g.passcode(&Mpi::from_u64(1_000_000)).unwrap().as_str(), "eyyK");

    let huge = Mpi::from_u64(1).mul_2d(130).unwrap().add_d(12_345).unwrap();
    assert_eq!(g.passcode(&huge).unwrap().as_str(), "oNEn");
}

#[test]
fn v2_first_block_bytes() {
    let block = generator(KeyVersion::V2).compute_block(&Mpi::new()).unwrap();
    let hex: String = block.iter().map(|b| format!("{b:02x}")).collect();
    assert_eq!(
        hex,
        "2db196b9894d7a44ed6a60b7e603f57007fd97e5520b4a1447b08b1774db44d1\
         6ed8653c671fc4b7005ffc78a97d64b5"
    );
}

#[test]
fn v1_uses_sha384_and_counter_offset() {
    assert_eq!(codes(&generator(KeyVersion::V1), 0, 4), ["2Bvh", "EgG?", "q74q", "k4Cs"]);
}

#[test]
fn v3_uses_the_sorted_alphabet() {
    assert_eq!(codes(&generator(KeyVersion::V3), 0, 3), ["g2eY", "tZJD", "uBEv"]);
}

#[test]
fn single_and_batched_derivation_agree() {
    let g = generator(KeyVersion::V2);
    let batch = g.derive_block(&Mpi::from_u64(60), 20).unwrap();
    for (i, code) in batch.iter().enumerate() {
        assert_eq!(&g.passcode(&Mpi::from_u64(60 + i as u64)).unwrap(), code);
    }
}

#[test]
fn first_two_cards_as_text() {
    let g = generator(KeyVersion::V2);

    let first = PrintedCard::derive(&g, &Mpi::new()).unwrap();
    let text = render_text_card(&first, "example.org").unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], format!("example.org{}[1]", " ".repeat(24)));
    assert_eq!(lines[1], "    A    B    C    D    E    F    G");
    assert_eq!(lines[2], " 1: E6Cw Txid UbeV B3PE x?aX HoaZ hgFe");
    assert_eq!(lines[11], "10: G7PE KkVh Y!?W ?i:P n#YS aX8q MsKD");
    assert_eq!(lines.len(), 13);
    assert!(text.ends_with("\n\n"));

    let second = PrintedCard::derive(&g, &Mpi::from_u64(1)).unwrap();
    let text = render_text_card(&second, "example.org").unwrap();
    assert!(text.contains(" 1: LaqU LkAy VZLT ksmu fRBh kHbF +#pX\n"));
}
