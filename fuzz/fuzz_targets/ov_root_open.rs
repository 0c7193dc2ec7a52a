#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;

// Arbitrary bytes must produce an error, never a panic.
fuzz_target!(|data: &[u8]| {
    let Ok(file) = ov_root::RootFile::from_bytes(data.to_vec(), PathBuf::from("fuzz.root")) else {
        return;
    };
    if let Ok(keys) = file.list_keys() {
        for k in keys.iter().take(16) {
            let _ = file.get_histogram_with_flows(&k.name);
            let _ = file.list_keys_in(&k.name);
        }
    }
});
