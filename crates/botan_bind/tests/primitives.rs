// Copyright (C) Microsoft Corporation. All rights reserved.

#[macro_use]
mod common;

use botan_bind::safeapi::block_cipher::BlockCipher;
use botan_bind::safeapi::cipher::Cipher;
use botan_bind::safeapi::cipher::Direction;
use botan_bind::safeapi::dispatch::Arg;
use botan_bind::safeapi::dispatch::Dispatch;
use botan_bind::safeapi::dispatch::Value;
use botan_bind::safeapi::ec_group;
use botan_bind::safeapi::ec_group::EcGroup;
use botan_bind::safeapi::fpe::Fpe;
use botan_bind::safeapi::hash::Hash;
use botan_bind::safeapi::kdf;
use botan_bind::safeapi::key_wrap;
use botan_bind::safeapi::mac::Mac;
use botan_bind::safeapi::mpi::Mpi;
use botan_bind::safeapi::oid::Oid;
use botan_bind::safeapi::otp::Hotp;
use botan_bind::safeapi::otp::Totp;
use botan_bind::safeapi::rng;
use botan_bind::safeapi::rng::Rng;
use botan_bind::safeapi::rng::RngType;
use botan_bind::safeapi::utility;
use botan_bind::safeapi::version;
use botan_bind::safeapi::zfec;
use botan_bind::BotanError;
use botan_bind::ErrorKind;
use common::hex;

#[test_with_tracing::test]
fn test_library_version() {
    require_native!();
    assert_eq!(version::version_major().expect("major"), 3);
    let api = version::ffi_api_version().expect("api");
    assert!(version::supports_api(api).expect("supports"));
    assert!(!version::supports_api(1).expect("supports"));
    assert!(version::version_string().expect("banner").contains("Botan"));
}

#[test_with_tracing::test]
fn test_hash_known_answer() {
    require_native!();
    let digest = Hash::digest("SHA-256", b"abc").expect("digest");
    assert_eq!(
        digest,
        hex("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );

    let mut hash = Hash::new("SHA-256").expect("hash");
    assert_eq!(hash.name().expect("name"), "SHA-256");
    assert_eq!(hash.output_length().expect("len"), 32);
    assert_eq!(hash.block_size().expect("block"), 64);

    hash.update(b"a").expect("update");
    let mut copy = hash.copy_state().expect("copy");
    hash.update(b"bc").expect("update");
    copy.update(b"bc").expect("update");
    assert_eq!(hash.finish().expect("final"), digest);
    assert_eq!(copy.finish().expect("final"), digest);
}

#[test_with_tracing::test]
fn test_hash_through_dispatch() {
    require_native!();
    let mut hash = Hash::new("SHA-256").expect("hash");
    hash.invoke("update", &[Arg::Bytes(b"abc")]).expect("update");
    let digest = hash.invoke("final", &[]).expect("final");
    assert_eq!(digest.as_bytes().map(<[u8]>::len), Some(32));

    let err = hash.invoke("update", &[]).err().expect("arity");
    assert_eq!(err.kind(), ErrorKind::BadParameter);
}

#[test_with_tracing::test]
fn test_unknown_algorithm_is_translated() {
    require_native!();
    let err = Hash::new("No-Such-Hash").err().expect("unknown");
    assert!(matches!(err, BotanError::Ffi(_)));
    assert!(err.to_string().starts_with("BOTAN_FFI_ERROR_"));
}

#[test_with_tracing::test]
fn test_hmac_known_answer() {
    require_native!();
    let mut mac = Mac::new("HMAC(SHA-256)").expect("mac");
    assert!(mac.key_spec().expect("keyspec").is_valid_length(4));
    mac.set_key(b"Jefe").expect("key");
    mac.update(b"what do ya want for nothing?").expect("update");
    assert_eq!(
        mac.finish().expect("final"),
        hex("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
    );
}

#[test_with_tracing::test]
fn test_block_cipher_known_answer() {
    require_native!();
    let mut aes = BlockCipher::new("AES-128").expect("aes");
    assert_eq!(aes.block_size().expect("block"), 16);
    aes.set_key(&hex("000102030405060708090a0b0c0d0e0f")).expect("key");

    let plaintext = hex("00112233445566778899aabbccddeeff");
    let ciphertext = aes.encrypt_blocks(&plaintext).expect("encrypt");
    assert_eq!(ciphertext, hex("69c4e0d86a7b0430d8cdb78070b4c55a"));
    assert_eq!(aes.decrypt_blocks(&ciphertext).expect("decrypt"), plaintext);
    assert!(aes.encrypt_blocks(&plaintext[..15]).is_err());
}

#[test_with_tracing::test]
fn test_aead_round_trip_and_tamper() {
    require_native!();
    let key = [0x42u8; 16];
    let nonce = [0x24u8; 12];
    let message = b"attack at dawn, bring snacks";

    let mut enc = Cipher::new("AES-128/GCM", Direction::Encrypt).expect("cipher");
    assert!(enc.is_authenticated().expect("aead"));
    assert_eq!(enc.tag_length().expect("tag"), 16);
    assert!(enc.valid_nonce_length(12).expect("nonce"));
    enc.set_key(&key).expect("key");
    enc.set_associated_data(b"header").expect("ad");
    let ciphertext = enc.process(&nonce, message).expect("encrypt");
    assert_eq!(ciphertext.len(), message.len() + 16);

    let mut dec = Cipher::new("AES-128/GCM", Direction::Decrypt).expect("cipher");
    dec.set_key(&key).expect("key");
    dec.set_associated_data(b"header").expect("ad");
    assert_eq!(dec.process(&nonce, &ciphertext).expect("decrypt"), message);

    let mut tampered = ciphertext.clone();
    tampered[0] ^= 1;
    dec.set_associated_data(b"header").expect("ad");
    let err = dec.process(&nonce, &tampered).err().expect("tamper");
    assert_eq!(err, BotanError::Ffi(ErrorKind::BadMac));
}

#[test_with_tracing::test]
fn test_encodings() {
    require_native!();
    assert_eq!(utility::hex_encode(&[0xde, 0xad, 0xbe, 0xef], true).expect("hex"), "DEADBEEF");
    assert_eq!(utility::hex_encode(&[0xde, 0xad], false).expect("hex"), "dead");
    assert_eq!(utility::hex_decode("DeadBeef").expect("unhex"), vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(utility::base64_encode(b"hello").expect("b64"), "aGVsbG8=");
    assert_eq!(utility::base64_decode("aGVsbG8=").expect("unb64"), b"hello");
    assert!(utility::constant_time_compare(b"same", b"same").expect("cmp"));
    assert!(!utility::constant_time_compare(b"same", b"diff").expect("cmp"));
    assert!(!utility::constant_time_compare(b"same", b"longer").expect("cmp"));
}

#[test_with_tracing::test]
fn test_rng() {
    require_native!();
    let rng = Rng::new(RngType::System).expect("rng");
    assert_eq!(rng.generate(48).expect("generate").len(), 48);

    let user = Rng::new(RngType::User).expect("user rng");
    user.reseed_from_rng(&rng, 256).expect("reseed");
    user.add_entropy(b"more").expect("entropy");
    assert_ne!(user.generate(32).expect("a"), user.generate(32).expect("b"));

    let len = rng::with_default(|rng| rng.generate(7).map(|b| b.len())).expect("default");
    assert_eq!(len, 7);
}

#[test_with_tracing::test]
fn test_mpi_arithmetic() {
    require_native!();
    let big: Mpi = "123456789012345678901234567890".parse().expect("parse");
    let one = Mpi::from_i64(1).expect("one");
    let sum = big.add(&one).expect("add");
    assert_eq!(sum.to_string(), "123456789012345678901234567891");
    assert!(sum > big);
    assert_eq!(sum.sub(&one).expect("sub"), big);

    let base = Mpi::from_i64(4).expect("base");
    let exponent = Mpi::from_i64(13).expect("exp");
    let modulus = Mpi::from_i64(497).expect("mod");
    assert_eq!(base.pow_mod(&exponent, &modulus).expect("powmod").to_u32().expect("u32"), 445);

    let (q, r) = Mpi::from_i64(17).expect("17").div_rem(&Mpi::from_i64(5).expect("5")).expect("div");
    assert_eq!((q.to_u32().expect("q"), r.to_u32().expect("r")), (3, 2));

    let hex_value = Mpi::from_hex("ff").expect("hex");
    assert_eq!(hex_value.to_bytes().expect("bytes"), vec![0xff]);
    assert_eq!(hex_value.num_bits().expect("bits"), 8);
    assert!(hex_value.is_odd().expect("odd"));

    let negative = Mpi::from_i64(-5_000_000_000).expect("negative");
    assert!(negative.is_negative().expect("sign"));
    assert_eq!(negative.to_string(), "-5000000000");

    let mut value = Mpi::new().expect("zero");
    assert!(value.is_zero().expect("zero"));
    value.set_bit(10).expect("set");
    assert_eq!(value.to_u32().expect("u32"), 1024);
    assert_eq!(value.shr(10).expect("shr").to_u32().expect("u32"), 1);

    let prime = Mpi::from_i64(65537).expect("prime");
    assert!(rng::with_default(|rng| prime.is_prime(rng, 64)).expect("is prime"));
}

#[test_with_tracing::test]
fn test_mpi_compare_through_dispatch() {
    require_native!();
    let mut seven = Mpi::from_i64(7).expect("seven");
    let nine = Mpi::from_i64(9).expect("nine");
    let also_seven = Mpi::from_i64(7).expect("seven");

    assert_eq!(seven.invoke("cmp", &[Arg::Mpi(&nine)]).expect("cmp").as_int(), Some(-1));
    assert_eq!(seven.invoke("cmp", &[Arg::Mpi(&also_seven)]).expect("cmp").as_int(), Some(0));
    assert_eq!(seven.invoke("equal", &[Arg::Mpi(&also_seven)]).expect("equal").as_bool(), Some(true));
    assert!(seven.invoke("cmp", &[Arg::Int(9)]).is_err());
}

#[test_with_tracing::test]
fn test_oid_names_and_order() {
    require_native!();
    let rsa = Oid::from_string("1.2.840.113549.1.1.1").expect("oid");
    assert_eq!(rsa.to_dotted_string().expect("dotted"), "1.2.840.113549.1.1.1");
    assert_eq!(rsa.name().expect("name"), "RSA");

    let by_name = Oid::from_string("RSA").expect("by name");
    assert_eq!(rsa, by_name);
    assert!(Oid::from_string("1.2.3").expect("oid") < rsa);
}

#[test_with_tracing::test]
fn test_hkdf_known_answer() {
    require_native!();
    let okm = kdf::kdf(
        "HKDF(SHA-256)",
        42,
        &[0x0b; 22],
        &hex("000102030405060708090a0b0c"),
        &hex("f0f1f2f3f4f5f6f7f8f9"),
    )
    .expect("hkdf");
    assert_eq!(
        okm,
        hex("3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865")
    );
}

#[test_with_tracing::test]
fn test_bcrypt() {
    require_native!();
    let hash = rng::with_default(|rng| kdf::bcrypt_generate("hunter2", rng, 6)).expect("bcrypt");
    assert!(hash.starts_with("$2"));
    assert!(kdf::bcrypt_is_valid("hunter2", &hash).expect("valid"));
    assert!(!kdf::bcrypt_is_valid("hunter3", &hash).expect("invalid"));
}

#[test_with_tracing::test]
fn test_otp_known_answers() {
    require_native!();
    let hotp = Hotp::new(b"12345678901234567890", None, None).expect("hotp");
    assert_eq!(hotp.generate(0).expect("code"), 755_224);
    assert_eq!(hotp.generate(1).expect("code"), 287_082);
    assert_eq!(hotp.check(287_082, 0, 2).expect("check"), (true, 2));
    assert!(!hotp.check(123_456, 0, 0).expect("check").0);

    let totp = Totp::new(b"12345678901234567890", Some("SHA-1"), Some(8), Some(30)).expect("totp");
    assert_eq!(totp.generate(59).expect("code"), 94_287_082);
    assert!(totp.check(94_287_082, 59, 0).expect("check"));
    assert!(!totp.check(94_287_083, 59, 0).expect("check"));
}

#[test_with_tracing::test]
fn test_nist_key_wrap_known_answer() {
    require_native!();
    let kek = hex("000102030405060708090a0b0c0d0e0f");
    let key = hex("00112233445566778899aabbccddeeff");
    let wrapped = key_wrap::nist_key_wrap("AES-128", false, &key, &kek).expect("wrap");
    assert_eq!(wrapped, hex("1fa68b0a8112b447aef34bd8fb5a7b829d3e862371d2cfe5"));
    assert_eq!(key_wrap::nist_key_unwrap("AES-128", false, &wrapped, &kek).expect("unwrap"), key);

    let mut corrupt = wrapped.clone();
    corrupt[5] ^= 0x80;
    assert!(key_wrap::nist_key_unwrap("AES-128", false, &corrupt, &kek).is_err());
}

#[test_with_tracing::test]
fn test_zfec_recovers_from_any_k_shares() {
    require_native!();
    let input: Vec<u8> = (0..60u8).collect();
    let shares = zfec::encode(3, 5, &input).expect("encode");
    assert_eq!(shares.len(), 5);
    assert!(shares.iter().all(|share| share.len() == 20));

    let subset = [(1, &shares[1][..]), (3, &shares[3][..]), (4, &shares[4][..])];
    let recovered = zfec::decode(3, 5, &subset).expect("decode");
    assert_eq!(recovered.concat(), input);
}

#[test_with_tracing::test]
fn test_fpe_round_trip() {
    require_symbol!(botan_fpe_fe1_init);
    let modulus = Mpi::from_i64(1_000_000_007).expect("modulus");
    let key = hex("000102030405060708090a0b0c0d0e0f");
    let fpe = Fpe::fe1(&modulus, &key, 16, false).expect("fpe");

    let plain = Mpi::from_i64(123_456_789).expect("x");
    let cipher = fpe.encrypt(&plain, b"account").expect("encrypt");
    assert!(cipher < modulus);
    assert_ne!(cipher, plain);
    assert_eq!(plain.to_u32().expect("untouched"), 123_456_789);
    assert_eq!(fpe.decrypt(&cipher, b"account").expect("decrypt"), plain);
    assert_ne!(fpe.encrypt(&plain, b"other tweak").expect("encrypt"), cipher);

    let mut fpe = fpe;
    match fpe.invoke("encrypt", &[Arg::Mpi(&plain), Arg::Bytes(b"account")]).expect("invoke") {
        Value::Mpi(value) => assert_eq!(value, cipher),
        other => panic!("unexpected {other:?}"),
    }
}

#[test_with_tracing::test]
fn test_ec_group_by_name() {
    require_symbol!(botan_ec_group_from_name);
    assert!(ec_group::supports_named_group("secp256r1").expect("supported"));
    assert!(!ec_group::supports_named_group("no-such-curve").expect("supported"));

    let p256 = EcGroup::from_name("secp256r1").expect("group");
    let oid = p256.curve_oid().expect("oid");
    assert_eq!(oid.to_dotted_string().expect("dotted"), "1.2.840.10045.3.1.7");
    assert_eq!(p256.p().expect("p").num_bits().expect("bits"), 256);
    assert_eq!(p256.order().expect("order").num_bits().expect("bits"), 256);
    assert!(p256.g_x().expect("g_x") < p256.p().expect("p"));

    assert_eq!(EcGroup::from_oid(&oid).expect("by oid"), p256);
    assert_eq!(EcGroup::from_ber(&p256.to_der().expect("der")).expect("by ber"), p256);
    let pem = p256.to_pem().expect("pem");
    assert!(pem.starts_with("-----BEGIN EC PARAMETERS-----"));
    assert_eq!(EcGroup::from_pem(&pem).expect("by pem"), p256);

    let p384 = EcGroup::from_name("secp384r1").expect("group");
    assert!(!p256.equals(&p384).expect("equal"));

    let mut p256 = p256;
    let equal = p256.invoke("equal", &[Arg::EcGroup(&p384)]).expect("invoke");
    assert_eq!(equal.as_bool(), Some(false));
    match p256.invoke("get-order", &[]).expect("invoke") {
        Value::Mpi(order) => assert_eq!(order.num_bits().expect("bits"), 256),
        other => panic!("unexpected {other:?}"),
    }
}
