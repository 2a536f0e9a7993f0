#![no_main]
use libfuzzer_sys::fuzz_target;

use iofmt_core::{parse, unparse, Term};

fuzz_target!(|data: &[u8]| {
    let Ok(fmt) = std::str::from_utf8(data) else {
        return;
    };
    // A generous synthetic argument supply: integers satisfy every
    // argument position the parser type-checks.
    let args: Vec<Term> = (0..64).map(|i| Term::Int(i)).collect();

    // Parsing must never panic; on success the unparse round trip must
    // reproduce the same directive sequence.
    for n in 0..args.len() {
        if let Ok(tokens) = parse(fmt, &args[..n]) {
            let (fmt2, args2) = unparse(&tokens);
            let reparsed = parse(&fmt2, &args2).expect("unparse output must reparse");
            assert_eq!(tokens, reparsed);
            break;
        }
    }
});
