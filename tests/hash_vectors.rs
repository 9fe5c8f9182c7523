//! SHA-256 conformance against NIST vectors and an independent
//! implementation.

use certifiable_bench::{sha256, Digest, Sha256};
use rand::{Rng, SeedableRng};
use sha2::Digest as _;

#[test]
fn nist_empty_string() {
    assert_eq!(
        sha256(b"").to_hex(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn nist_abc() {
    assert_eq!(
        sha256(b"abc").to_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn nist_two_block_message() {
    assert_eq!(
        sha256(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq").to_hex(),
        "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
    );
}

#[test]
fn nist_four_block_message() {
    let msg = b"abcdefghbcdefghicdefghijdefghijkefghijklfghijklmghijklmnhijklmno\
                ijklmnopjklmnopqklmnopqrlmnopqrsmnopqrstnopqrstu";
    assert_eq!(
        sha256(msg).to_hex(),
        "cf5b16a778af8380036ce59e7b0492370b249b11e8f07a51afac45037afee9d1"
    );
}

#[test]
fn nist_million_a() {
    let mut ctx = Sha256::new();
    let block = [b'a'; 10_000];
    for _ in 0..100 {
        ctx.update(&block).unwrap();
    }
    assert_eq!(
        ctx.finalize().to_hex(),
        "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0"
    );
}

/// Every chunking of a fixed message must produce the same digest as the
/// one-shot hash.
#[test]
fn chunking_is_irrelevant() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    let data: Vec<u8> = (0..4097).map(|_| rng.gen()).collect();
    let reference = sha256(&data);

    for _ in 0..50 {
        let mut ctx = Sha256::new();
        let mut offset = 0;
        while offset < data.len() {
            let take = rng.gen_range(1..=257).min(data.len() - offset);
            ctx.update(&data[offset..offset + take]).unwrap();
            offset += take;
        }
        assert_eq!(ctx.finalize(), reference);
    }
}

/// Cross-check against the sha2 crate on random inputs of varied length.
#[test]
fn agrees_with_independent_implementation() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    for len in [0usize, 1, 55, 56, 63, 64, 65, 127, 128, 1000, 10_000] {
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();

        let ours = sha256(&data);
        let theirs = sha2::Sha256::digest(&data);

        assert_eq!(ours.0.as_slice(), theirs.as_slice(), "length {len}");
    }
}

#[test]
fn constant_time_equality_contract() {
    let a = sha256(b"payload");
    assert!(a.ct_eq(&a));

    // Flip each bit in turn; equality must break every time.
    for byte in 0..32 {
        for bit in 0..8 {
            let mut b = a;
            b.0[byte] ^= 1 << bit;
            assert!(!a.ct_eq(&b));
        }
    }
}

#[test]
fn hex_roundtrip_and_case_tolerance() {
    let d = sha256(b"hex me");
    let hex = d.to_hex();

    assert_eq!(hex.len(), 64);
    assert!(hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    assert_eq!(Digest::from_hex(&hex).unwrap(), d);
    assert_eq!(Digest::from_hex(&hex.to_uppercase()).unwrap(), d);

    assert!(Digest::from_hex("").is_err());
    assert!(Digest::from_hex(&hex[..63]).is_err());
    assert!(Digest::from_hex(&format!("{}x", &hex[..63])).is_err());
}
