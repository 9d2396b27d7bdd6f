#![no_main]

use std::path::Path;

use configmgr::source::parse_source;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Extension drives format detection; an unknown one sniffs the content.
    for name in ["fuzz.yaml", "fuzz.json", "fuzz.cfg"] {
        let _ = parse_source(Path::new(name), data);
    }
});
