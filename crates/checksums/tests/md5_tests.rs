//! Comprehensive MD5 checksum tests.
//!
//! This test module validates the incremental MD5 implementation against:
//! 1. RFC 1321 official test vectors
//! 2. Padding boundary cases around 56 and 64 bytes
//! 3. Chunking invariance for arbitrary splits (property based)
//! 4. An independent implementation (`md-5` crate) on random data
//! 5. Finalisation and reset semantics

use checksums::strong::{DIGEST_LEN, Md5, to_hex};
use md5::Digest as _;
use proptest::prelude::*;

fn hex_digest(data: &[u8]) -> String {
    to_hex(&Md5::compute(data), false)
}

fn oracle(data: &[u8]) -> [u8; DIGEST_LEN] {
    md5::Md5::digest(data).into()
}

// ============================================================================
// RFC 1321 Official Test Vectors
// ============================================================================

mod rfc1321_test_vectors {
    use super::*;

    #[test]
    fn rfc1321_empty_string() {
        assert_eq!(hex_digest(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn rfc1321_single_char_a() {
        assert_eq!(hex_digest(b"a"), "0cc175b9c0f1b6a831c399e269772661");
    }

    #[test]
    fn rfc1321_abc() {
        assert_eq!(hex_digest(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn rfc1321_message_digest() {
        assert_eq!(
            hex_digest(b"message digest"),
            "f96b697d7cb7938d525a2f31aaf161d0"
        );
    }

    #[test]
    fn rfc1321_lowercase_alphabet() {
        assert_eq!(
            hex_digest(b"abcdefghijklmnopqrstuvwxyz"),
            "c3fcd3d76192e4007dfb496cca67e13b"
        );
    }

    #[test]
    fn rfc1321_alphanumeric_mixed_case() {
        assert_eq!(
            hex_digest(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789"),
            "d174ab98d277d9f5a5611c2c9f419d9f"
        );
    }

    #[test]
    fn rfc1321_numeric_sequence() {
        assert_eq!(
            hex_digest(
                b"12345678901234567890123456789012345678901234567890123456789012345678901234567890"
            ),
            "57edf4a22be3c955ac49da2e2107b67a"
        );
    }

    #[test]
    fn one_million_a() {
        let mut hasher = Md5::new();
        let block = [b'a'; 1000];
        for _ in 0..1000 {
            hasher.update(&block);
        }
        assert_eq!(
            hasher.to_hex_string(false),
            "7707d6ae4e027c70eea2a935c2296f21"
        );
    }
}

// ============================================================================
// Padding Boundaries
// ============================================================================

mod padding_boundaries {
    use super::*;

    #[test]
    fn lengths_around_block_edges_match_oracle() {
        for len in [55, 56, 57, 63, 64, 65, 119, 120, 127, 128, 129] {
            let input: Vec<u8> = (0..len).map(|i| b'0' + (i % 10) as u8).collect();
            assert_eq!(Md5::compute(&input), oracle(&input), "length {len}");
        }
    }
}

// ============================================================================
// Streaming Semantics
// ============================================================================

mod streaming {
    use super::*;

    #[test]
    fn byte_at_a_time_matches_one_shot() {
        let input = b"The quick brown fox jumps over the lazy dog".repeat(5);
        let mut hasher = Md5::new();
        for byte in &input {
            hasher.update(std::slice::from_ref(byte));
        }
        assert_eq!(hasher.finalize(), Md5::compute(&input));
    }

    #[test]
    fn writer_interface_feeds_digest() {
        use std::io::Write;

        let mut hasher = Md5::new();
        hasher.write_all(b"message ").expect("write");
        hasher.write_all(b"digest").expect("write");
        assert_eq!(
            hasher.to_hex_string(false),
            "f96b697d7cb7938d525a2f31aaf161d0"
        );
    }

    #[test]
    fn double_finalize_keeps_digest() {
        let mut hasher = Md5::new();
        hasher.update(b"payload");
        let first = hasher.to_hex_string(false);
        let second = hasher.to_hex_string(false);
        assert_eq!(first, second);
        assert_eq!(hasher.digest(), Md5::compute(b"payload"));
    }

    #[test]
    fn clone_finalizes_independently() {
        let mut hasher = Md5::new();
        hasher.update(b"prefix");
        let snapshot = hasher.clone().finalize();
        hasher.update(b"-suffix");
        assert_eq!(snapshot, Md5::compute(b"prefix"));
        assert_eq!(hasher.finalize(), Md5::compute(b"prefix-suffix"));
    }

    #[test]
    fn reset_allows_reuse() {
        let mut hasher = Md5::new();
        hasher.update(b"first message");
        let _ = hasher.finalize();
        hasher.reset();
        hasher.update(b"abc");
        assert_eq!(
            hasher.to_hex_string(false),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn chunking_is_invariant(
        data in proptest::collection::vec(any::<u8>(), 0..1024),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let mut points: Vec<usize> = cuts
            .into_iter()
            .map(|cut| if data.is_empty() { 0 } else { cut % (data.len() + 1) })
            .collect();
        points.sort_unstable();

        let mut hasher = Md5::new();
        let mut start = 0;
        for point in points {
            hasher.update(&data[start..point]);
            start = point;
        }
        hasher.update(&data[start..]);

        prop_assert_eq!(hasher.finalize(), oracle(&data));
    }

    #[test]
    fn random_payloads_match_oracle(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        prop_assert_eq!(Md5::compute(&data), oracle(&data));
    }
}
