#![no_main]

use std::path::Path;

use configmgr::schema::{SchemaDocument, compose};
use configmgr::validation::Validator;
use configmgr::source::parse_source;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok((_, document)) = parse_source(Path::new("schema.json"), data) else {
        return;
    };
    let documents = [SchemaDocument::new("schema.json", document.clone())];
    if let Ok(graph) = compose(&documents) {
        // Validate the schema against itself to walk every compiled node.
        let _ = Validator::new(&graph).with_max_depth(64).validate(&document);
    }
});
