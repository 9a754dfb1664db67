//! Integration tests for the stream engine over realistic sources.
//!
//! Verifies that encrypt → decrypt restores the plaintext regardless of how
//! the input is split into chunks, that corrupted ciphertext is rejected and
//! that independent operations do not interfere.

use bytes::Bytes;
use proptest::prelude::*;
use safeshare_crypto::{
    decrypt_stream, encrypt_stream, generate_token, CipherError, Direction, StreamSource,
};
use tokio_util::sync::CancellationToken;

const ZERO_TOKEN_LEN: usize = 48;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn chunked(data: &[u8], size: usize) -> Vec<Bytes> {
    data.chunks(size).map(Bytes::copy_from_slice).collect()
}

async fn roundtrip(token: &str, plaintext: &[u8], read_size: usize) -> (Bytes, Bytes) {
    let cancel = CancellationToken::new();

    let mut src = StreamSource::from_reader(plaintext, read_size);
    let ciphertext = encrypt_stream(token, &mut src, Some(plaintext.len() as u64), &cancel, |_| {})
        .await
        .expect("encryption should succeed");

    // Download side sees different chunk boundaries than the upload side
    let mut src = StreamSource::from_chunks(chunked(&ciphertext, read_size + 3));
    let decrypted = decrypt_stream(token, &mut src, Some(ciphertext.len() as u64), &cancel, |_| {})
        .await
        .expect("decryption should succeed");

    (ciphertext, decrypted)
}

#[tokio::test]
async fn roundtrip_block_boundaries() {
    let token = generate_token();

    for len in [1usize, 15, 16, 17] {
        let plaintext = make_data(len);
        let (ciphertext, decrypted) = roundtrip(&token, &plaintext, 64 * 1024).await;

        assert_eq!(ciphertext.len(), (len / 16 + 1) * 16, "length {len}");
        assert_eq!(&decrypted[..], &plaintext[..], "length {len}");
    }
}

#[tokio::test]
async fn roundtrip_ten_megabytes_multi_chunk() {
    let token = generate_token();
    let plaintext = make_data(10_000_000);

    let (ciphertext, decrypted) = roundtrip(&token, &plaintext, 64 * 1024).await;

    assert_eq!(ciphertext.len(), 10_000_000 + 16 - 10_000_000 % 16);
    assert_ne!(&ciphertext[..64], &plaintext[..64], "output must not be plaintext");
    assert_eq!(decrypted.len(), plaintext.len());
    assert!(decrypted[..] == plaintext[..], "10 MB round-trip mismatch");
}

#[tokio::test]
async fn decrypt_progress_tracks_ciphertext_size() {
    let token = generate_token();
    let plaintext = make_data(100_000);
    let (ciphertext, _) = roundtrip(&token, &plaintext, 8192).await;

    let mut seen = Vec::new();
    let mut src = StreamSource::from_chunks(chunked(&ciphertext, 4096));
    decrypt_stream(
        &token,
        &mut src,
        Some(ciphertext.len() as u64),
        &CancellationToken::new(),
        |p| seen.push(p),
    )
    .await
    .unwrap();

    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last().copied(), Some(100.0));
}

#[tokio::test]
async fn flipped_last_byte_is_rejected() {
    let token = "00".repeat(ZERO_TOKEN_LEN);
    let cancel = CancellationToken::new();
    let plaintext = b"0123456789abcdef!";

    let mut src = StreamSource::from_chunks(vec![Bytes::from_static(plaintext)]);
    let ciphertext = encrypt_stream(&token, &mut src, Some(plaintext.len() as u64), &cancel, |_| {})
        .await
        .unwrap();

    let mut corrupted = ciphertext.to_vec();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0x01;

    let mut src = StreamSource::from_chunks(vec![Bytes::from(corrupted)]);
    let err = decrypt_stream(&token, &mut src, Some(ciphertext.len() as u64), &cancel, |_| {})
        .await
        .expect_err("corrupted ciphertext must not decrypt");

    match err {
        CipherError::StreamCipherFailure { direction, .. } => {
            assert_eq!(direction, Direction::Decrypt);
        }
        other => panic!("expected StreamCipherFailure, got {other:?}"),
    }
    assert!(src.is_released());
}

#[tokio::test]
async fn wrong_key_is_rejected_or_garbled() {
    let plaintext = make_data(4096);
    let (ciphertext, _) = roundtrip(&generate_token(), &plaintext, 1024).await;

    let mut src = StreamSource::from_chunks(vec![ciphertext.clone()]);
    let result = decrypt_stream(
        &generate_token(),
        &mut src,
        Some(ciphertext.len() as u64),
        &CancellationToken::new(),
        |_| {},
    )
    .await;

    // Without an authentication tag a wrong key only fails when the padding
    // happens to be invalid; it must never yield the original plaintext.
    if let Ok(decrypted) = result {
        assert_ne!(&decrypted[..], &plaintext[..]);
    }
}

#[tokio::test]
async fn concurrent_operations_are_independent() {
    let token_a = generate_token();
    let token_b = generate_token();
    let data_a = make_data(300_000);
    let data_b: Vec<u8> = make_data(200_000).into_iter().rev().collect();

    let ((ct_a, pt_a), (ct_b, pt_b)) = tokio::join!(
        roundtrip(&token_a, &data_a, 4096),
        roundtrip(&token_b, &data_b, 5000),
    );

    assert_eq!(&pt_a[..], &data_a[..]);
    assert_eq!(&pt_b[..], &data_b[..]);
    assert_ne!(ct_a.len(), ct_b.len());
}

fn split_at_points(data: &[u8], mut cuts: Vec<usize>) -> Vec<Bytes> {
    cuts.retain(|&c| c < data.len());
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(Bytes::copy_from_slice(&data[start..cut]));
        start = cut;
    }
    pieces.push(Bytes::copy_from_slice(&data[start..]));
    pieces
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Output depends only on the bytes, not on where chunk boundaries fall
    #[test]
    fn chunk_boundaries_do_not_matter(
        data in proptest::collection::vec(any::<u8>(), 1..=4096),
        enc_cuts in proptest::collection::vec(0usize..4096, 0..16),
        dec_cuts in proptest::collection::vec(0usize..4112, 0..16),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let token = "ab".repeat(ZERO_TOKEN_LEN);
        let cancel = CancellationToken::new();

        let (whole, split, decrypted) = rt.block_on(async {
            let mut src = StreamSource::from_chunks(vec![Bytes::copy_from_slice(&data)]);
            let whole = encrypt_stream(&token, &mut src, Some(data.len() as u64), &cancel, |_| {})
                .await
                .unwrap();

            let mut src = StreamSource::from_chunks(split_at_points(&data, enc_cuts));
            let split = encrypt_stream(&token, &mut src, Some(data.len() as u64), &cancel, |_| {})
                .await
                .unwrap();

            let mut src = StreamSource::from_chunks(split_at_points(&split, dec_cuts));
            let decrypted = decrypt_stream(&token, &mut src, Some(split.len() as u64), &cancel, |_| {})
                .await
                .unwrap();

            (whole, split, decrypted)
        });

        prop_assert_eq!(&whole[..], &split[..]);
        prop_assert_eq!(&decrypted[..], &data[..]);
    }
}
