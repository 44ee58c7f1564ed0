#![no_main]
use cavern::caves::{scan_image, ScanConfig};
use cavern::formats::pe::PeParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = ScanConfig::default().with_min_cave_length(4);
    if let Ok(parser) = PeParser::new(data) {
        let _ = scan_image(&parser, &config);
    }
});
