//! Feeds every mutated input to the reference and candidate engines.
//!
//! Inputs that do not decode are rejected from the corpus. Disagreements
//! and engine panics abort with a reproduction report on stdout.

#![no_main]

use libfuzzer_sys::{Corpus, fuzz_target};

fuzz_target!(
    init: lsig::init_logging("lsig=warn,lsig_eval=warn"),
    |data: &[u8]| -> Corpus {
        if lsig::fuzz_one(data) == 0 {
            Corpus::Reject
        } else {
            Corpus::Keep
        }
    }
);
