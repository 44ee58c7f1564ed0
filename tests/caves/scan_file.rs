use crate::common::{code_with_cave, PeBuilder, DATA, TEXT};
use cavern::caves::{scan_file, CavePattern, ScanConfig};
use cavern::io::ReaderLimits;
use cavern::report::{CollectingReporter, Diagnostic};

fn scan(file: &tempfile::NamedTempFile, config: &ScanConfig) -> CollectingReporter {
    let mut reporter = CollectingReporter::new();
    scan_file(file.path(), config, &ReaderLimits::default(), &mut reporter)
        .expect("scan should succeed");
    reporter
}

#[test]
fn test_null_cave_followed_by_short_run() {
    let mut text = vec![0u8; 305];
    text.push(0x01);
    text.extend([0u8; 10]);
    let file = PeBuilder::new().section(".text", text, TEXT).write();

    let reporter = scan(&file, &ScanConfig::default());

    assert_eq!(reporter.caves.len(), 1);
    let cave = &reporter.caves[0];
    assert_eq!(cave.length, 305);
    assert_eq!(cave.pattern, CavePattern::Null);
    assert_eq!(
        cave.to_string(),
        "Cave of 305 bytes found in .text at (Raw Address: 0x00401000, Virtual Address: 0x00401000)"
    );
    assert!(reporter.empty_sections.is_empty());
}

#[test]
fn test_preamble_diagnostics() {
    let file = PeBuilder::new()
        .section(".text", code_with_cave(&[0x55], 0x90, 8), TEXT)
        .write();
    let config = ScanConfig::default()
        .with_min_cave_length(128)
        .with_image_base(0x1000_0000);

    let reporter = scan(&file, &config);

    let infos: Vec<&str> = reporter
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::Info(msg) => Some(msg.as_str()),
            Diagnostic::Warning(_) => None,
        })
        .collect();
    let looking = format!("Looking for code caves in {}", file.path().display());
    assert_eq!(
        infos,
        vec![
            looking.as_str(),
            "Image Base: 0x10000000",
            "Looking for code caves of minimum 128 bytes",
        ]
    );
    assert_eq!(reporter.warnings().count(), 0);
    assert_eq!(reporter.sections, vec![".text"]);
}

#[test]
fn test_aslr_warning() {
    let file = PeBuilder::new()
        .section(".text", vec![0xC3; 16], TEXT)
        .aslr(true)
        .write();

    let reporter = scan(&file, &ScanConfig::default());

    assert_eq!(
        reporter.warnings().collect::<Vec<_>>(),
        vec!["ASLR is enabled. Virtual Address might be different once loaded in memory."]
    );
    assert!(reporter.summary.as_ref().unwrap().aslr_enabled);
}

#[test]
fn test_addresses_follow_section_and_base() {
    let file = PeBuilder::new()
        .section(".text", vec![0xC3; 32], TEXT)
        .section(".data", code_with_cave(&[0x41, 0x42], 0x00, 400), DATA)
        .write();

    let reporter = scan(&file, &ScanConfig::default().with_image_base(0x0100_0000));

    assert_eq!(reporter.caves.len(), 1);
    let cave = &reporter.caves[0];
    assert_eq!(cave.section, ".data");
    assert_eq!(cave.offset, 2);
    assert_eq!(cave.file_address, 0x0100_2002);
    assert_eq!(cave.virtual_address, 0x0100_2002);
}

#[test]
fn test_empty_section_reports_both_lines() {
    let file = PeBuilder::new()
        .section(".text", code_with_cave(&[0x55], 0x90, 350), TEXT)
        .section(".data", vec![0u8; 512], DATA)
        .write();

    let reporter = scan(&file, &ScanConfig::default());

    assert_eq!(reporter.caves.len(), 2);
    assert_eq!(reporter.caves[0].pattern, CavePattern::Nop);
    assert_eq!(reporter.caves[0].length, 350);
    assert_eq!(reporter.caves[1].section, ".data");
    assert_eq!(reporter.caves[1].length, 512);

    assert_eq!(reporter.empty_sections.len(), 1);
    assert_eq!(reporter.empty_sections[0].section, ".data");
    assert_eq!(reporter.empty_sections[0].length, 512);

    let summary = reporter.summary.unwrap();
    assert_eq!(summary.sections_scanned, 2);
    assert_eq!(summary.empty_sections, 1);
    assert_eq!(summary.caves, 2);
    assert_eq!(summary.cave_bytes, 862);
}

#[test]
fn test_section_without_raw_data_appears_empty() {
    let file = PeBuilder::new()
        .section(".text", vec![0xC3; 16], TEXT)
        .section(".bss", Vec::new(), DATA)
        .write();

    let reporter = scan(&file, &ScanConfig::default());

    assert!(reporter.caves.is_empty());
    assert_eq!(reporter.empty_sections.len(), 1);
    assert_eq!(reporter.empty_sections[0].section, ".bss");
    assert_eq!(reporter.empty_sections[0].length, 0);
}

#[test]
fn test_unreadable_section_is_skipped() {
    let file = PeBuilder::new()
        .section(".text", code_with_cave(&[0x55], 0x00, 320), TEXT)
        .truncated_section(".rsrc", 0x800)
        .section(".reloc", code_with_cave(&[0x01], 0x90, 310), DATA)
        .write();

    let reporter = scan(&file, &ScanConfig::default());

    assert_eq!(reporter.sections, vec![".text", ".reloc"]);
    assert_eq!(reporter.skipped.len(), 1);
    assert_eq!(reporter.skipped[0].0, ".rsrc");
    assert_eq!(reporter.caves.len(), 2);

    let summary = reporter.summary.unwrap();
    assert_eq!(summary.sections_scanned, 2);
    assert_eq!(summary.sections_skipped, 1);
}

#[test]
fn test_custom_pattern_only() {
    let mut text = code_with_cave(&[0x55, 0x8B, 0xEC], 0xCC, 64);
    text.extend([0u8; 400]);
    let file = PeBuilder::new().section(".text", text, TEXT).write();

    let config = ScanConfig::default()
        .with_min_cave_length(32)
        .with_patterns(vec![CavePattern::Byte(0xCC)]);
    let reporter = scan(&file, &config);

    assert_eq!(reporter.caves.len(), 1);
    assert_eq!(reporter.caves[0].pattern, CavePattern::Byte(0xCC));
    assert_eq!(reporter.caves[0].offset, 3);
    assert_eq!(reporter.caves[0].length, 64);
}

#[test]
fn test_parallel_matches_sequential() {
    let file = PeBuilder::new()
        .section(".text", code_with_cave(&[0x55], 0x90, 400), TEXT)
        .section(".rdata", code_with_cave(&[0x10], 0x00, 301), DATA)
        .truncated_section(".rsrc", 0x400)
        .section(".data", vec![0u8; 1024], DATA)
        .section(".pad", code_with_cave(&[0x20], 0xCC, 700), DATA)
        .write();

    let sequential = scan(&file, &ScanConfig::default());
    let parallel = scan(&file, &ScanConfig::default().with_parallel(true));

    assert_eq!(sequential.caves, parallel.caves);
    assert_eq!(sequential.empty_sections, parallel.empty_sections);
    assert_eq!(sequential.sections, parallel.sections);
    assert_eq!(sequential.skipped, parallel.skipped);
    assert_eq!(sequential.summary, parallel.summary);
}
