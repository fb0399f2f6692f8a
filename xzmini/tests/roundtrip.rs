//! Decoding of real `.xz` files produced by XZ Utils.
//!
//! Every fixture is decoded through the public API with several staging
//! buffer sizes and compared against the original payload.

use std::fmt::Write as _;
use xzmini::{
    AllocationPolicy, CheckPolicy, CheckType, DecodeWarning, DecoderConfig, decompress,
    decompress_with,
};

const HELLO: &[u8] = include_bytes!("fixtures/hello.txt");
const HELLO_XZ: &[u8] = include_bytes!("fixtures/hello.xz");
const HELLO_NONE_XZ: &[u8] = include_bytes!("fixtures/hello_none.xz");
const HELLO_CRC64_XZ: &[u8] = include_bytes!("fixtures/hello_crc64.xz");
const HELLO_SHA256_XZ: &[u8] = include_bytes!("fixtures/hello_sha256.xz");
const TEXT: &[u8] = include_bytes!("fixtures/text.txt");
const TEXT_XZ: &[u8] = include_bytes!("fixtures/text.xz");
const TEXT_BLOCKS_XZ: &[u8] = include_bytes!("fixtures/text_blocks.xz");
const TEXT_DICT4K_XZ: &[u8] = include_bytes!("fixtures/text_dict4k.xz");
const RANDOM: &[u8] = include_bytes!("fixtures/random.bin");
const RANDOM_XZ: &[u8] = include_bytes!("fixtures/random.xz");
const EMPTY_XZ: &[u8] = include_bytes!("fixtures/empty.xz");
const RECORDS_XZ: &[u8] = include_bytes!("fixtures/records.xz");
const MIXED_XZ: &[u8] = include_bytes!("fixtures/mixed.xz");

fn records() -> Vec<u8> {
    let mut text = String::new();
    for i in 0..300_000 {
        writeln!(text, "record {i}").expect("write to string");
    }
    text.into_bytes()
}

fn mixed() -> Vec<u8> {
    [TEXT, RANDOM, TEXT].concat()
}

/// Decode into a sink of exactly the payload size.
fn decode_with(config: &DecoderConfig, input: &[u8], len: usize) -> Vec<u8> {
    let mut output = vec![0u8; len];
    let result = decompress_with(config, input, &mut output).expect("valid stream");
    assert_eq!(result.written, len);
    output
}

// ============================================================================
// Payload Round Trips
// ============================================================================

#[test]
fn test_hello() {
    let mut output = [0u8; 5];
    let result = decompress(HELLO_XZ, &mut output).expect("valid stream");
    assert_eq!(result.written, 5);
    assert_eq!(&output, HELLO);
}

#[test]
fn test_hello_fits_exact_sink() {
    let mut output = [0u8; 5];
    assert_eq!(xzmini::decompress_status(HELLO_XZ, &mut output), 0);
    assert_eq!(&output, b"hello");
}

#[test]
fn test_empty_payload() {
    let mut output = [0u8; 0];
    let result = decompress(EMPTY_XZ, &mut output).expect("valid stream");
    assert_eq!(result.written, 0);

    // A larger sink is fine; nothing is written.
    let mut output = [0xAAu8; 8];
    let result = decompress(EMPTY_XZ, &mut output).expect("valid stream");
    assert_eq!(result.written, 0);
    assert_eq!(output, [0xAA; 8]);
}

#[test]
fn test_text() {
    let output = decode_with(&DecoderConfig::DEFAULT, TEXT_XZ, TEXT.len());
    assert_eq!(output, TEXT);
}

#[test]
fn test_multiple_blocks() {
    let output = decode_with(&DecoderConfig::DEFAULT, TEXT_BLOCKS_XZ, TEXT.len());
    assert_eq!(output, TEXT);
}

#[test]
fn test_small_dictionary_wraps() {
    // A 4 KiB dictionary is much smaller than the payload.
    let output = decode_with(&DecoderConfig::DEFAULT, TEXT_DICT4K_XZ, TEXT.len());
    assert_eq!(output, TEXT);
}

#[test]
fn test_incompressible_stored_chunks() {
    let output = decode_with(&DecoderConfig::DEFAULT, RANDOM_XZ, RANDOM.len());
    assert_eq!(output, RANDOM);
}

#[test]
fn test_large_payload() {
    let expected = records();
    let output = decode_with(&DecoderConfig::DEFAULT, RECORDS_XZ, expected.len());
    assert_eq!(output, expected);
}

#[test]
fn test_mixed_payload() {
    let expected = mixed();
    let output = decode_with(&DecoderConfig::DEFAULT, MIXED_XZ, expected.len());
    assert_eq!(output, expected);
}

#[test]
fn test_larger_sink_reports_payload_size() {
    let mut output = vec![0u8; TEXT.len() + 100];
    let result = decompress(TEXT_XZ, &mut output).expect("valid stream");
    assert_eq!(result.written, TEXT.len());
    assert_eq!(&output[..TEXT.len()], TEXT);
    assert!(output[TEXT.len()..].iter().all(|&b| b == 0));
}

// ============================================================================
// Integrity Checks
// ============================================================================

#[test]
fn test_check_none() {
    let mut output = [0u8; 5];
    let result = decompress(HELLO_NONE_XZ, &mut output).expect("valid stream");
    assert!(result.warnings.is_empty());
    assert_eq!(&output, HELLO);
}

#[test]
fn test_unverified_checks_warn() {
    for (input, check) in [
        (HELLO_CRC64_XZ, CheckType::Crc64),
        (HELLO_SHA256_XZ, CheckType::Sha256),
    ] {
        let mut output = [0u8; 5];
        let result = decompress(input, &mut output).expect("warnings are benign");
        assert_eq!(result.warnings, vec![DecodeWarning::UnsupportedCheck(check)]);
        assert_eq!(&output, HELLO);
    }
}

#[test]
fn test_unverified_checks_rejected_by_policy() {
    let config = DecoderConfig::default().with_check_policy(CheckPolicy::Reject);
    let mut output = [0u8; 5];
    let err = decompress_with(&config, HELLO_SHA256_XZ, &mut output).unwrap_err();
    assert!(matches!(
        err,
        xzmini::XzError::UnverifiedCheck {
            check: CheckType::Sha256
        }
    ));
    assert_eq!(output, [0u8; 5]);

    // Verified checks are unaffected by the policy.
    let result = decompress_with(&config, HELLO_XZ, &mut output).expect("valid stream");
    assert_eq!(result.written, 5);
}

// ============================================================================
// Buffer Sizes
// ============================================================================

#[test]
fn test_buffer_sizes_do_not_change_output() {
    for size in [1, 2, 3, 7, 64, 4095, 4096, 4097, 65536] {
        let config = DecoderConfig::default().with_buffer_size(size);
        let output = decode_with(&config, TEXT_XZ, TEXT.len());
        assert_eq!(output, TEXT, "buffer size {size}");
    }
}

#[test]
fn test_asymmetric_buffers() {
    let config = DecoderConfig::default()
        .with_input_buffer_size(13)
        .with_output_buffer_size(8192);
    assert_eq!(decode_with(&config, MIXED_XZ, mixed().len()), mixed());

    let config = DecoderConfig::default()
        .with_input_buffer_size(8192)
        .with_output_buffer_size(13);
    assert_eq!(decode_with(&config, MIXED_XZ, mixed().len()), mixed());
}

#[test]
fn test_lengths_aligned_to_stage_capacity() {
    // Input and payload lengths that are exact multiples of the stage
    // capacity, or one off.
    for size in [
        RANDOM_XZ.len(),
        RANDOM_XZ.len() - 1,
        RANDOM_XZ.len() / 2,
        RANDOM.len(),
        RANDOM.len() - 1,
        RANDOM.len() / 4,
        RANDOM.len() / 5 + 1,
    ] {
        let config = DecoderConfig::default().with_buffer_size(size);
        assert_eq!(decode_with(&config, RANDOM_XZ, RANDOM.len()), RANDOM);
    }
}

#[test]
fn test_zero_buffer_size_is_clamped() {
    let config = DecoderConfig::default().with_buffer_size(0);
    assert_eq!(decode_with(&config, HELLO_XZ, 5), HELLO);
}

// ============================================================================
// Allocation And Repeatability
// ============================================================================

#[test]
fn test_preallocated_dictionary() {
    let config = DecoderConfig::default()
        .with_allocation(AllocationPolicy::Preallocate)
        .with_dict_limit(8 << 20);
    assert_eq!(decode_with(&config, TEXT_XZ, TEXT.len()), TEXT);
    assert_eq!(decode_with(&config, TEXT_DICT4K_XZ, TEXT.len()), TEXT);
}

#[test]
fn test_dict_limit_equal_to_declared_size() {
    let config = DecoderConfig::default().with_dict_limit(4096);
    assert_eq!(decode_with(&config, TEXT_DICT4K_XZ, TEXT.len()), TEXT);
}

#[test]
fn test_idempotent() {
    let config = DecoderConfig::default().with_buffer_size(100);
    let first = decode_with(&config, TEXT_BLOCKS_XZ, TEXT.len());
    let second = decode_with(&config, TEXT_BLOCKS_XZ, TEXT.len());
    assert_eq!(first, second);

    let mut a = [0u8; 3];
    let mut b = [0u8; 3];
    let err_a = decompress(HELLO_XZ, &mut a).unwrap_err().to_string();
    let err_b = decompress(HELLO_XZ, &mut b).unwrap_err().to_string();
    assert_eq!(err_a, err_b);
    assert_eq!(a, b);
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut input = HELLO_XZ.to_vec();
    input.extend_from_slice(&[0u8; 16]);
    input.extend_from_slice(b"trailing garbage");

    let mut output = [0u8; 5];
    let result = decompress(&input, &mut output).expect("valid stream");
    assert_eq!(result.written, 5);
    assert_eq!(&output, HELLO);
}

#[test]
fn test_vec_sink() {
    let mut sink = vec![0u8; TEXT.len()];
    let source = TEXT_XZ.to_vec();
    let result = decompress_with(&DecoderConfig::DEFAULT, &source, &mut sink).expect("valid");
    assert_eq!(result.written, TEXT.len());
    assert_eq!(sink, TEXT);
}
