//! Expansion fuzz target: feed arbitrary key=value lines to the parameter
//! codec. Expansion must not panic; conflicts and bad indexes are Err values,
//! and whatever expands must survive its own flattened form.
//! Build with: cargo fuzz run expand_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let mut params = formtree::FlatParams::new();
    for line in s.lines() {
        let (key, value) = match line.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        params.insert(key.to_string(), formtree::Value::from(value));
    }
    if let Ok(nested) = formtree::expand(&params) {
        let reflat = formtree::flatten(&nested);
        let _ = formtree::expand(&reflat);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run expand_fuzz");
}
