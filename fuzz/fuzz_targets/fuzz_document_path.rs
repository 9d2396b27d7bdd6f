#![no_main]

use configmgr::document::{DocumentNode, DocumentPath};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let document = DocumentNode::from(serde_json::json!({
        "zowe": {
            "setup": {"dataset": {"prefix": "IBMUSER.ZWE"}},
            "launchers": ["gateway", "discovery"],
            "a/b": {"m~n": [0, 1, 2]}
        }
    }));
    if let Ok(path) = DocumentPath::parse(text) {
        let _ = path.resolve(&document);
        let _ = path.to_string();
    }
});
