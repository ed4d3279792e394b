#![allow(missing_docs, clippy::unwrap_used)]

//! Property tests: batched derivation and passcode ids.

use ppp_core::card::{PasscodeId, card_of, first_index_of};
use ppp_core::key_generator::sequence_key_from_passphrase;
use ppp_core::{Aes256Cipher, Alphabet, KeyVersion, PasscodeGenerator};
use ppp_mpi::Mpi;
use proptest::prelude::*;

fn generator() -> PasscodeGenerator<Aes256Cipher> {
    let key = sequence_key_from_passphrase("proptest", KeyVersion::V2).unwrap();
    PasscodeGenerator::new(Aes256Cipher, &key, KeyVersion::V2, Alphabet::for_version(KeyVersion::V2)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn batches_match_single_passcodes(start in any::<u32>(), count in 1usize..40) {
        let g = generator();
        let start = Mpi::from(start);
        let batch = g.derive_block(&start, count).unwrap();
        prop_assert_eq!(batch.len(), count);
        for (i, code) in batch.iter().enumerate() {
            let index = start.add_d(u32::try_from(i).unwrap()).unwrap();
            let single = g.passcode(&index).unwrap();
            prop_assert_eq!(code.as_str(), single.as_str());
        }
    }

    #[test]
    fn printed_ids_parse_back(index in any::<u64>()) {
        let index = Mpi::from_u64(index);
        let id = PasscodeId::from_index(&index).unwrap();
        let reparsed = PasscodeId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(&reparsed, &id);
        prop_assert_eq!(reparsed.to_index().unwrap(), index);
    }

    #[test]
    fn cards_hold_seventy_passcodes(index in any::<u64>()) {
        let index = Mpi::from_u64(index);
        let first = first_index_of(&card_of(&index).unwrap()).unwrap();
        prop_assert!(first <= index);
        prop_assert!(index < first.add_d(70).unwrap());
    }
}
