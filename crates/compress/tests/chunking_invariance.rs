//! Property tests: compressed bytes depend only on the concatenated input.

use std::fs;
use std::path::Path;

use compress::{Compressor, CompressorOptions, Format, GZIP_CHUNK_SIZE};
use proptest::prelude::*;

fn compress_split(path: &Path, format: Format, data: &[u8], cuts: &[usize], trailing: bool) -> Vec<u8> {
    let mut points: Vec<usize> = cuts.iter().map(|cut| cut % (data.len() + 1)).collect();
    points.sort_unstable();

    let mut compressor = Compressor::create(path, CompressorOptions::new(format)).unwrap();
    let mut start = 0;
    for point in points {
        compressor.put(&data[start..point], false).unwrap();
        start = point;
    }
    if trailing {
        compressor.put(&data[start..], false).unwrap();
        compressor.put(&[], true).unwrap();
    } else {
        compressor.put(&data[start..], true).unwrap();
    }
    compressor.close().unwrap();
    fs::read(path).unwrap_or_default()
}

fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..(3 * GZIP_CHUNK_SIZE)),
        (1_usize..4, any::<u8>()).prop_map(|(n, byte)| vec![byte; n * GZIP_CHUNK_SIZE]),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn gzip_output_ignores_put_boundaries(
        data in payload(),
        cuts in proptest::collection::vec(any::<usize>(), 0..6),
        trailing in any::<bool>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let reference = compress_split(&dir.path().join("one.gz"), Format::Gzip, &data, &[], false);
        let split = compress_split(&dir.path().join("split.gz"), Format::Gzip, &data, &cuts, trailing);
        prop_assert_eq!(reference, split);
    }

    #[test]
    fn zstd_output_ignores_put_boundaries(
        data in payload(),
        cuts in proptest::collection::vec(any::<usize>(), 0..6),
        trailing in any::<bool>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let reference = compress_split(&dir.path().join("one.zst"), Format::Zstd, &data, &[], false);
        let split = compress_split(&dir.path().join("split.zst"), Format::Zstd, &data, &cuts, trailing);
        prop_assert_eq!(reference, split);
    }
}

#[test]
fn byte_at_a_time_matches_single_put() {
    let dir = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..(2 * GZIP_CHUNK_SIZE + 5)).map(|i| (i % 97) as u8).collect();
    let reference = compress_split(&dir.path().join("one.gz"), Format::Gzip, &data, &[], false);
    let cuts: Vec<usize> = (0..data.len()).collect();
    let split = compress_split(&dir.path().join("bytes.gz"), Format::Gzip, &data, &cuts, true);
    assert_eq!(reference, split);
}
