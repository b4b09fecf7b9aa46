#![no_main]

use libfuzzer_sys::fuzz_target;

use arbor::Tree;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tree) = Tree::from_text(text) {
        // Anything that parses is a valid tree and re-emits to a fixed point.
        let emitted = tree.to_text();
        let reparsed = Tree::from_text(&emitted).expect("emitted text parses");
        assert_eq!(reparsed.to_text(), emitted);
        let _ = tree.predict(&[0.0; 8]);
    }
});
