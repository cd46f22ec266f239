//! Run-list decoding tests

use mftgrab::fs::ntfs::runlist::{read_signed, read_unsigned};
use mftgrab::fs::ntfs::{decode_run_list, encode_run, encode_run_list};
use mftgrab::{Extent, MftError};
use proptest::prelude::*;
use rstest::rstest;

const CLUSTER: u64 = 4096;

#[test]
fn test_single_run() {
    let extents = decode_run_list(&[0x11, 0x04, 0x04, 0x00], CLUSTER).unwrap();
    assert_eq!(extents, vec![Extent::new(4 * CLUSTER, 4, 4)]);
}

#[test]
fn test_offsets_chain_from_previous_extent() {
    // +200, +100, -50
    let bytes = [
        0x21, 0x01, 0xC8, 0x00, 0x11, 0x01, 0x64, 0x11, 0x01, 0xCE, 0x00,
    ];
    let extents = decode_run_list(&bytes, CLUSTER).unwrap();

    assert_eq!(
        extents,
        vec![
            Extent::new(CLUSTER, 200, 200),
            Extent::new(CLUSTER, 100, 300),
            Extent::new(CLUSTER, -50, 250),
        ]
    );
}

#[test]
fn test_wide_fields() {
    // 0x1234 clusters at cluster 0x0A0B0C
    let bytes = [0x32, 0x34, 0x12, 0x0C, 0x0B, 0x0A, 0x00];
    let extents = decode_run_list(&bytes, 512).unwrap();
    assert_eq!(extents, vec![Extent::new(0x1234 * 512, 0x0A0B0C, 0x0A0B0C)]);
}

#[test]
fn test_immediate_terminator_is_empty() {
    assert!(decode_run_list(&[0x00], CLUSTER).unwrap().is_empty());
}

#[test]
fn test_bytes_after_terminator_ignored() {
    let extents = decode_run_list(&[0x11, 0x01, 0x04, 0x00, 0xFF, 0xFF, 0x42], CLUSTER).unwrap();
    assert_eq!(extents.len(), 1);
}

#[test]
fn test_sparse_run_keeps_previous_position() {
    let bytes = [0x11, 0x02, 0x10, 0x01, 0x03, 0x00];
    let extents = decode_run_list(&bytes, CLUSTER).unwrap();
    assert_eq!(extents[1], Extent::new(3 * CLUSTER, 0, 16));
}

#[rstest]
#[case(&[0xFF], -1)]
#[case(&[0x7F], 127)]
#[case(&[0x80], -128)]
#[case(&[0xFF, 0xFF], -1)]
#[case(&[0x00, 0x80], -32768)]
#[case(&[0xFF, 0x7F], 32767)]
#[case(&[0xCE], -50)]
#[case(&[0xFF; 8], -1)]
#[case(&[], 0)]
fn test_sign_extension(#[case] field: &[u8], #[case] expected: i64) {
    assert_eq!(read_signed(field), expected);
}

#[rstest]
#[case(&[0xFF], 255)]
#[case(&[0x34, 0x12], 0x1234)]
#[case(&[0xFF; 8], u64::MAX)]
fn test_zero_extension(#[case] field: &[u8], #[case] expected: u64) {
    assert_eq!(read_unsigned(field), expected);
}

#[test]
fn test_negative_offset_applied_through_decoder() {
    let bytes = [0x11, 0x01, 0x10, 0x11, 0x01, 0xFF, 0x00];
    let extents = decode_run_list(&bytes, CLUSTER).unwrap();
    assert_eq!(extents[1].relative_cluster_offset, -1);
    assert_eq!(extents[1].lcn, 15);
}

#[rstest]
#[case::length_width_nine(&[0x19, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x00])]
#[case::offset_width_nine(&[0x91, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x00])]
#[case::truncated_fields(&[0x21, 0x04, 0x00])]
#[case::missing_terminator(&[0x11, 0x04, 0x04])]
#[case::empty(&[])]
fn test_malformed_run_lists(#[case] bytes: &[u8]) {
    let err = decode_run_list(bytes, CLUSTER).unwrap_err();
    assert!(matches!(err, MftError::MalformedRunList(_)));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_cluster_count_overflow_rejected() {
    let mut bytes = vec![0x18];
    bytes.extend_from_slice(&[0xFF; 8]);
    bytes.push(0x00);
    let err = decode_run_list(&bytes, CLUSTER).unwrap_err();
    assert!(matches!(err, MftError::MalformedRunList(_)));
}

#[test]
fn test_encode_run_rejects_values_that_do_not_fit() {
    assert!(encode_run(256, 1, 1, 1).is_err());
    assert!(encode_run(1, 128, 1, 1).is_err());
    assert!(encode_run(1, 1, 9, 1).is_err());
    assert!(encode_run(1, -128, 1, 1).is_ok());
}

#[test]
fn test_encode_run_list_uses_narrowest_fields() {
    let bytes = encode_run_list(&[(4, 4), (0x100, -1), (1, 0)]).unwrap();
    assert_eq!(
        bytes,
        vec![0x11, 0x04, 0x04, 0x12, 0x00, 0x01, 0xFF, 0x11, 0x01, 0x00, 0x00]
    );
}

fn width_limits(width: usize) -> (u64, i64, i64) {
    let shift = 64 - 8 * width as u32;
    (u64::MAX >> shift, i64::MIN >> shift, i64::MAX >> shift)
}

fn single_run() -> impl Strategy<Value = (usize, usize, u64, i64)> {
    (1usize..=8, 1usize..=8).prop_flat_map(|(lw, ow)| {
        let (max_len, _, _) = width_limits(lw);
        let (_, min_off, max_off) = width_limits(ow);
        (Just(lw), Just(ow), 0..=max_len, min_off..=max_off)
    })
}

proptest! {
    #[test]
    fn prop_any_field_widths_decode_to_encoded_values(
        (lw, ow, clusters, relative) in single_run()
    ) {
        let mut bytes = encode_run(clusters, relative, lw, ow).unwrap();
        bytes.push(0x00);

        let extents = decode_run_list(&bytes, 1).unwrap();
        prop_assert_eq!(extents, vec![Extent::new(clusters, relative, relative)]);
    }

    #[test]
    fn prop_lcn_is_running_sum_of_offsets(
        runs in prop::collection::vec((1u64..10_000, -100_000i64..100_000), 0..16)
    ) {
        let bytes = encode_run_list(&runs).unwrap();
        let extents = decode_run_list(&bytes, CLUSTER).unwrap();

        prop_assert_eq!(extents.len(), runs.len());
        let mut lcn = 0i64;
        for (extent, &(clusters, relative)) in extents.iter().zip(&runs) {
            lcn += relative;
            prop_assert_eq!(extent.length_bytes, clusters * CLUSTER);
            prop_assert_eq!(extent.relative_cluster_offset, relative);
            prop_assert_eq!(extent.lcn, lcn);
        }
    }
}
