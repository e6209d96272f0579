// Copyright (C) Microsoft Corporation. All rights reserved.

//! Entry points of the Botan 3 C ABI (`botan/ffi.h`), resolved by name at
//! load time.
//!
//! Every symbol is optional: older library builds lack some functions, and a
//! missing one surfaces as [`ErrorKind::NotImplemented`] when it is first
//! used, not when the library is loaded.

use std::ffi::c_char;
use std::ffi::c_int;
use std::ffi::c_uint;
use std::ffi::c_void;

use libloading::Library;

use crate::safeapi::error::BotanError;
use crate::safeapi::error::BotanResult;
use crate::safeapi::error::ErrorKind;

/// Opaque native object pointer (`botan_*_t`).
pub type RawObject = *mut c_void;

/// Uniform native destructor shape shared by all `botan_*_destroy` functions.
pub type Destructor = unsafe extern "C" fn(RawObject) -> c_int;

/// Context pointer handed back to view callbacks.
pub type ViewCtx = *mut c_void;

/// `botan_view_bin_fn`
pub type ViewBinFn = extern "C" fn(ViewCtx, *const u8, usize) -> c_int;

/// `botan_view_str_fn`; `len` includes the trailing NUL.
pub type ViewStrFn = extern "C" fn(ViewCtx, *const c_char, usize) -> c_int;

macro_rules! botan_ffi_table {
    ($( fn $name:ident ( $($arg:ident : $ty:ty),* $(,)? ) -> $ret:ty ; )*) => {
        /// Function table of a loaded Botan library.
        ///
        /// Fields are visible inside the crate so unit tests can install fake
        /// entry points into [`BotanFfi::empty`].
        pub struct BotanFfi {
            $( pub(crate) $name: Option<unsafe extern "C" fn($($ty),*) -> $ret>, )*
            _library: Option<Library>,
        }

        impl BotanFfi {
            /// Resolves every known symbol from `library`. Missing symbols are
            /// recorded as absent.
            pub(crate) fn resolve(library: Library) -> Self {
                $(
                    // SAFETY: the declared signature matches botan/ffi.h for
                    // this symbol, and the library is kept alive in the table.
                    let $name = unsafe {
                        library
                            .get::<unsafe extern "C" fn($($ty),*) -> $ret>(
                                concat!(stringify!($name), "\0").as_bytes(),
                            )
                            .ok()
                            .map(|symbol| *symbol)
                    };
                )*

                Self {
                    $( $name, )*
                    _library: Some(library),
                }
            }

            /// A table with no entry points at all. Used by tests that patch
            /// in fake functions.
            #[allow(dead_code)]
            pub(crate) const fn empty() -> Self {
                Self {
                    $( $name: None, )*
                    _library: None,
                }
            }

            /// Number of entry points the loaded library actually exports.
            pub fn resolved_count(&self) -> usize {
                [$( self.$name.is_some(), )*].iter().filter(|present| **present).count()
            }

            $(
                #[inline]
                pub fn $name(&self) -> BotanResult<unsafe extern "C" fn($($ty),*) -> $ret> {
                    self.$name.ok_or_else(|| {
                        tracing::debug!(symbol = stringify!($name), "symbol not exported by loaded library");
                        BotanError::Ffi(ErrorKind::NotImplemented)
                    })
                }
            )*
        }
    };
}

botan_ffi_table! {
    // Library and utilities
    fn botan_ffi_api_version() -> u32;
    fn botan_ffi_supports_api(api_version: u32) -> c_int;
    fn botan_version_string() -> *const c_char;
    fn botan_version_major() -> u32;
    fn botan_version_minor() -> u32;
    fn botan_version_patch() -> u32;
    fn botan_version_datestamp() -> u32;
    fn botan_error_description(err: c_int) -> *const c_char;
    fn botan_constant_time_compare(x: *const u8, y: *const u8, len: usize) -> c_int;
    fn botan_scrub_mem(mem: *mut c_void, bytes: usize) -> c_int;
    fn botan_hex_encode(x: *const u8, len: usize, out: *mut c_char, flags: u32) -> c_int;
    fn botan_hex_decode(hex: *const c_char, in_len: usize, out: *mut u8, out_len: *mut usize) -> c_int;
    fn botan_base64_encode(x: *const u8, len: usize, out: *mut c_char, out_len: *mut usize) -> c_int;
    fn botan_base64_decode(b64: *const c_char, in_len: usize, out: *mut u8, out_len: *mut usize) -> c_int;

    // Random number generators
    fn botan_rng_init(rng: *mut RawObject, rng_type: *const c_char) -> c_int;
    fn botan_rng_get(rng: RawObject, out: *mut u8, out_len: usize) -> c_int;
    fn botan_rng_reseed(rng: RawObject, bits: usize) -> c_int;
    fn botan_rng_reseed_from_rng(rng: RawObject, source: RawObject, bits: usize) -> c_int;
    fn botan_rng_add_entropy(rng: RawObject, entropy: *const u8, entropy_len: usize) -> c_int;
    fn botan_rng_destroy(rng: RawObject) -> c_int;

    // Hash functions
    fn botan_hash_init(hash: *mut RawObject, name: *const c_char, flags: u32) -> c_int;
    fn botan_hash_copy_state(dest: *mut RawObject, source: RawObject) -> c_int;
    fn botan_hash_output_length(hash: RawObject, len: *mut usize) -> c_int;
    fn botan_hash_block_size(hash: RawObject, len: *mut usize) -> c_int;
    fn botan_hash_update(hash: RawObject, input: *const u8, input_len: usize) -> c_int;
    fn botan_hash_final(hash: RawObject, out: *mut u8) -> c_int;
    fn botan_hash_clear(hash: RawObject) -> c_int;
    fn botan_hash_name(hash: RawObject, name: *mut c_char, name_len: *mut usize) -> c_int;
    fn botan_hash_destroy(hash: RawObject) -> c_int;

    // Message authentication codes
    fn botan_mac_init(mac: *mut RawObject, name: *const c_char, flags: u32) -> c_int;
    fn botan_mac_output_length(mac: RawObject, len: *mut usize) -> c_int;
    fn botan_mac_set_key(mac: RawObject, key: *const u8, key_len: usize) -> c_int;
    fn botan_mac_set_nonce(mac: RawObject, nonce: *const u8, nonce_len: usize) -> c_int;
    fn botan_mac_update(mac: RawObject, input: *const u8, input_len: usize) -> c_int;
    fn botan_mac_final(mac: RawObject, out: *mut u8) -> c_int;
    fn botan_mac_clear(mac: RawObject) -> c_int;
    fn botan_mac_name(mac: RawObject, name: *mut c_char, name_len: *mut usize) -> c_int;
    fn botan_mac_get_keyspec(mac: RawObject, min: *mut usize, max: *mut usize, modulo: *mut usize) -> c_int;
    fn botan_mac_destroy(mac: RawObject) -> c_int;

    // Symmetric cipher modes
    fn botan_cipher_init(cipher: *mut RawObject, name: *const c_char, flags: u32) -> c_int;
    fn botan_cipher_name(cipher: RawObject, name: *mut c_char, name_len: *mut usize) -> c_int;
    fn botan_cipher_output_length(cipher: RawObject, in_len: usize, out_len: *mut usize) -> c_int;
    fn botan_cipher_valid_nonce_length(cipher: RawObject, nonce_len: usize) -> c_int;
    fn botan_cipher_is_authenticated(cipher: RawObject) -> c_int;
    fn botan_cipher_get_tag_length(cipher: RawObject, tag_len: *mut usize) -> c_int;
    fn botan_cipher_get_default_nonce_length(cipher: RawObject, nonce_len: *mut usize) -> c_int;
    fn botan_cipher_get_update_granularity(cipher: RawObject, granularity: *mut usize) -> c_int;
    fn botan_cipher_get_ideal_update_granularity(cipher: RawObject, granularity: *mut usize) -> c_int;
    fn botan_cipher_get_keyspec(cipher: RawObject, min: *mut usize, max: *mut usize, modulo: *mut usize) -> c_int;
    fn botan_cipher_set_key(cipher: RawObject, key: *const u8, key_len: usize) -> c_int;
    fn botan_cipher_reset(cipher: RawObject) -> c_int;
    fn botan_cipher_set_associated_data(cipher: RawObject, ad: *const u8, ad_len: usize) -> c_int;
    fn botan_cipher_start(cipher: RawObject, nonce: *const u8, nonce_len: usize) -> c_int;
    fn botan_cipher_update(
        cipher: RawObject,
        flags: u32,
        output: *mut u8,
        output_size: usize,
        output_written: *mut usize,
        input: *const u8,
        input_size: usize,
        input_consumed: *mut usize,
    ) -> c_int;
    fn botan_cipher_clear(cipher: RawObject) -> c_int;
    fn botan_cipher_destroy(cipher: RawObject) -> c_int;

    // Raw block ciphers
    fn botan_block_cipher_init(bc: *mut RawObject, name: *const c_char) -> c_int;
    fn botan_block_cipher_clear(bc: RawObject) -> c_int;
    fn botan_block_cipher_set_key(bc: RawObject, key: *const u8, key_len: usize) -> c_int;
    fn botan_block_cipher_block_size(bc: RawObject) -> c_int;
    fn botan_block_cipher_encrypt_blocks(bc: RawObject, input: *const u8, out: *mut u8, blocks: usize) -> c_int;
    fn botan_block_cipher_decrypt_blocks(bc: RawObject, input: *const u8, out: *mut u8, blocks: usize) -> c_int;
    fn botan_block_cipher_name(bc: RawObject, name: *mut c_char, name_len: *mut usize) -> c_int;
    fn botan_block_cipher_get_keyspec(bc: RawObject, min: *mut usize, max: *mut usize, modulo: *mut usize) -> c_int;
    fn botan_block_cipher_destroy(bc: RawObject) -> c_int;

    // Key derivation and password hashing
    fn botan_pbkdf(
        algo: *const c_char,
        out: *mut u8,
        out_len: usize,
        passphrase: *const c_char,
        salt: *const u8,
        salt_len: usize,
        iterations: usize,
    ) -> c_int;
    fn botan_pwdhash(
        algo: *const c_char,
        param1: usize,
        param2: usize,
        param3: usize,
        out: *mut u8,
        out_len: usize,
        passphrase: *const c_char,
        passphrase_len: usize,
        salt: *const u8,
        salt_len: usize,
    ) -> c_int;
    fn botan_pwdhash_timed(
        algo: *const c_char,
        msec: u32,
        param1: *mut usize,
        param2: *mut usize,
        param3: *mut usize,
        out: *mut u8,
        out_len: usize,
        passphrase: *const c_char,
        passphrase_len: usize,
        salt: *const u8,
        salt_len: usize,
    ) -> c_int;
    fn botan_kdf(
        algo: *const c_char,
        out: *mut u8,
        out_len: usize,
        secret: *const u8,
        secret_len: usize,
        salt: *const u8,
        salt_len: usize,
        label: *const u8,
        label_len: usize,
    ) -> c_int;
    fn botan_bcrypt_generate(
        out: *mut u8,
        out_len: *mut usize,
        password: *const c_char,
        rng: RawObject,
        work_factor: usize,
        flags: u32,
    ) -> c_int;
    fn botan_bcrypt_is_valid(password: *const c_char, hash: *const c_char) -> c_int;

    // Multiple precision integers
    fn botan_mp_init(mp: *mut RawObject) -> c_int;
    fn botan_mp_destroy(mp: RawObject) -> c_int;
    fn botan_mp_to_str(mp: RawObject, base: u8, out: *mut c_char, out_len: *mut usize) -> c_int;
    fn botan_mp_clear(mp: RawObject) -> c_int;
    fn botan_mp_set_from_int(mp: RawObject, value: c_int) -> c_int;
    fn botan_mp_set_from_mp(dest: RawObject, source: RawObject) -> c_int;
    fn botan_mp_set_from_str(dest: RawObject, text: *const c_char) -> c_int;
    fn botan_mp_set_from_radix_str(dest: RawObject, text: *const c_char, radix: usize) -> c_int;
    fn botan_mp_num_bits(mp: RawObject, bits: *mut usize) -> c_int;
    fn botan_mp_num_bytes(mp: RawObject, bytes: *mut usize) -> c_int;
    fn botan_mp_to_bin(mp: RawObject, out: *mut u8) -> c_int;
    fn botan_mp_from_bin(mp: RawObject, input: *const u8, input_len: usize) -> c_int;
    fn botan_mp_to_uint32(mp: RawObject, value: *mut u32) -> c_int;
    fn botan_mp_is_positive(mp: RawObject) -> c_int;
    fn botan_mp_is_negative(mp: RawObject) -> c_int;
    fn botan_mp_flip_sign(mp: RawObject) -> c_int;
    fn botan_mp_is_zero(mp: RawObject) -> c_int;
    fn botan_mp_is_odd(mp: RawObject) -> c_int;
    fn botan_mp_is_even(mp: RawObject) -> c_int;
    fn botan_mp_add(result: RawObject, x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_sub(result: RawObject, x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_mul(result: RawObject, x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_add_u32(result: RawObject, x: RawObject, y: u32) -> c_int;
    fn botan_mp_sub_u32(result: RawObject, x: RawObject, y: u32) -> c_int;
    fn botan_mp_div(quotient: RawObject, remainder: RawObject, x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_mod_mul(result: RawObject, x: RawObject, y: RawObject, modulus: RawObject) -> c_int;
    fn botan_mp_equal(x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_cmp(result: *mut c_int, x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_swap(x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_powmod(out: RawObject, base: RawObject, exponent: RawObject, modulus: RawObject) -> c_int;
    fn botan_mp_lshift(out: RawObject, input: RawObject, shift: usize) -> c_int;
    fn botan_mp_rshift(out: RawObject, input: RawObject, shift: usize) -> c_int;
    fn botan_mp_mod_inverse(out: RawObject, input: RawObject, modulus: RawObject) -> c_int;
    fn botan_mp_rand_bits(out: RawObject, rng: RawObject, bits: usize) -> c_int;
    fn botan_mp_rand_range(out: RawObject, rng: RawObject, lower: RawObject, upper: RawObject) -> c_int;
    fn botan_mp_gcd(out: RawObject, x: RawObject, y: RawObject) -> c_int;
    fn botan_mp_is_prime(mp: RawObject, rng: RawObject, test_prob: usize) -> c_int;
    fn botan_mp_get_bit(mp: RawObject, bit: usize) -> c_int;
    fn botan_mp_set_bit(mp: RawObject, bit: usize) -> c_int;
    fn botan_mp_clear_bit(mp: RawObject, bit: usize) -> c_int;

    // Object identifiers
    fn botan_oid_from_string(oid: *mut RawObject, text: *const c_char) -> c_int;
    fn botan_oid_register(oid: RawObject, name: *const c_char) -> c_int;
    fn botan_oid_view_string(oid: RawObject, ctx: ViewCtx, view: ViewStrFn) -> c_int;
    fn botan_oid_view_name(oid: RawObject, ctx: ViewCtx, view: ViewStrFn) -> c_int;
    fn botan_oid_equal(a: RawObject, b: RawObject) -> c_int;
    fn botan_oid_cmp(result: *mut c_int, a: RawObject, b: RawObject) -> c_int;
    fn botan_oid_destroy(oid: RawObject) -> c_int;

    // Elliptic curve groups
    fn botan_ec_group_supports_application_specific_group(out: *mut c_int) -> c_int;
    fn botan_ec_group_supports_named_group(name: *const c_char, out: *mut c_int) -> c_int;
    fn botan_ec_group_from_params(
        group: *mut RawObject,
        oid: RawObject,
        p: RawObject,
        a: RawObject,
        b: RawObject,
        base_x: RawObject,
        base_y: RawObject,
        order: RawObject,
    ) -> c_int;
    fn botan_ec_group_from_ber(group: *mut RawObject, ber: *const u8, ber_len: usize) -> c_int;
    fn botan_ec_group_from_pem(group: *mut RawObject, pem: *const c_char) -> c_int;
    fn botan_ec_group_from_oid(group: *mut RawObject, oid: RawObject) -> c_int;
    fn botan_ec_group_from_name(group: *mut RawObject, name: *const c_char) -> c_int;
    fn botan_ec_group_view_der(group: RawObject, ctx: ViewCtx, view: ViewBinFn) -> c_int;
    fn botan_ec_group_view_pem(group: RawObject, ctx: ViewCtx, view: ViewStrFn) -> c_int;
    fn botan_ec_group_get_curve_oid(oid: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_get_p(p: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_get_a(a: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_get_b(b: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_get_g_x(g_x: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_get_g_y(g_y: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_get_order(order: *mut RawObject, group: RawObject) -> c_int;
    fn botan_ec_group_equal(a: RawObject, b: RawObject) -> c_int;
    fn botan_ec_group_destroy(group: RawObject) -> c_int;

    // Format preserving encryption
    fn botan_fpe_fe1_init(
        fpe: *mut RawObject,
        n: RawObject,
        key: *const u8,
        key_len: usize,
        rounds: usize,
        flags: u32,
    ) -> c_int;
    fn botan_fpe_encrypt(fpe: RawObject, x: RawObject, tweak: *const u8, tweak_len: usize) -> c_int;
    fn botan_fpe_decrypt(fpe: RawObject, x: RawObject, tweak: *const u8, tweak_len: usize) -> c_int;
    fn botan_fpe_destroy(fpe: RawObject) -> c_int;

    // Private keys
    fn botan_privkey_create(key: *mut RawObject, algo: *const c_char, params: *const c_char, rng: RawObject) -> c_int;
    fn botan_privkey_load(key: *mut RawObject, rng: RawObject, bits: *const u8, len: usize, password: *const c_char) -> c_int;
    fn botan_privkey_export(key: RawObject, out: *mut u8, out_len: *mut usize, flags: u32) -> c_int;
    fn botan_privkey_view_der(key: RawObject, ctx: ViewCtx, view: ViewBinFn) -> c_int;
    fn botan_privkey_view_pem(key: RawObject, ctx: ViewCtx, view: ViewStrFn) -> c_int;
    fn botan_privkey_algo_name(key: RawObject, out: *mut c_char, out_len: *mut usize) -> c_int;
    fn botan_privkey_check_key(key: RawObject, rng: RawObject, flags: u32) -> c_int;
    fn botan_privkey_export_pubkey(out: *mut RawObject, key: RawObject) -> c_int;
    fn botan_privkey_get_field(out: RawObject, key: RawObject, field: *const c_char) -> c_int;
    fn botan_privkey_destroy(key: RawObject) -> c_int;

    // Public keys
    fn botan_pubkey_load(key: *mut RawObject, bits: *const u8, len: usize) -> c_int;
    fn botan_pubkey_export(key: RawObject, out: *mut u8, out_len: *mut usize, flags: u32) -> c_int;
    fn botan_pubkey_view_der(key: RawObject, ctx: ViewCtx, view: ViewBinFn) -> c_int;
    fn botan_pubkey_view_pem(key: RawObject, ctx: ViewCtx, view: ViewStrFn) -> c_int;
    fn botan_pubkey_algo_name(key: RawObject, out: *mut c_char, out_len: *mut usize) -> c_int;
    fn botan_pubkey_check_key(key: RawObject, rng: RawObject, flags: u32) -> c_int;
    fn botan_pubkey_estimated_strength(key: RawObject, estimate: *mut usize) -> c_int;
    fn botan_pubkey_fingerprint(key: RawObject, hash: *const c_char, out: *mut u8, out_len: *mut usize) -> c_int;
    fn botan_pubkey_get_field(out: RawObject, key: RawObject, field: *const c_char) -> c_int;
    fn botan_pubkey_oid(oid: *mut RawObject, key: RawObject) -> c_int;
    fn botan_pubkey_destroy(key: RawObject) -> c_int;

    // Public key operations
    fn botan_pk_op_encrypt_create(op: *mut RawObject, key: RawObject, padding: *const c_char, flags: u32) -> c_int;
    fn botan_pk_op_encrypt_output_length(op: RawObject, ptext_len: usize, ctext_len: *mut usize) -> c_int;
    fn botan_pk_op_encrypt(
        op: RawObject,
        rng: RawObject,
        out: *mut u8,
        out_len: *mut usize,
        plaintext: *const u8,
        plaintext_len: usize,
    ) -> c_int;
    fn botan_pk_op_encrypt_destroy(op: RawObject) -> c_int;
    fn botan_pk_op_decrypt_create(op: *mut RawObject, key: RawObject, padding: *const c_char, flags: u32) -> c_int;
    fn botan_pk_op_decrypt_output_length(op: RawObject, ctext_len: usize, ptext_len: *mut usize) -> c_int;
    fn botan_pk_op_decrypt(
        op: RawObject,
        out: *mut u8,
        out_len: *mut usize,
        ciphertext: *const u8,
        ciphertext_len: usize,
    ) -> c_int;
    fn botan_pk_op_decrypt_destroy(op: RawObject) -> c_int;
    fn botan_pk_op_sign_create(op: *mut RawObject, key: RawObject, hash_and_padding: *const c_char, flags: u32) -> c_int;
    fn botan_pk_op_sign_output_length(op: RawObject, sig_len: *mut usize) -> c_int;
    fn botan_pk_op_sign_update(op: RawObject, input: *const u8, input_len: usize) -> c_int;
    fn botan_pk_op_sign_finish(op: RawObject, rng: RawObject, sig: *mut u8, sig_len: *mut usize) -> c_int;
    fn botan_pk_op_sign_destroy(op: RawObject) -> c_int;
    fn botan_pk_op_verify_create(op: *mut RawObject, key: RawObject, hash_and_padding: *const c_char, flags: u32) -> c_int;
    fn botan_pk_op_verify_update(op: RawObject, input: *const u8, input_len: usize) -> c_int;
    fn botan_pk_op_verify_finish(op: RawObject, sig: *const u8, sig_len: usize) -> c_int;
    fn botan_pk_op_verify_destroy(op: RawObject) -> c_int;
    fn botan_pk_op_key_agreement_create(op: *mut RawObject, key: RawObject, kdf: *const c_char, flags: u32) -> c_int;
    fn botan_pk_op_key_agreement_view_public(key: RawObject, ctx: ViewCtx, view: ViewBinFn) -> c_int;
    fn botan_pk_op_key_agreement_size(op: RawObject, out_len: *mut usize) -> c_int;
    fn botan_pk_op_key_agreement(
        op: RawObject,
        out: *mut u8,
        out_len: *mut usize,
        other_key: *const u8,
        other_key_len: usize,
        salt: *const u8,
        salt_len: usize,
    ) -> c_int;
    fn botan_pk_op_key_agreement_destroy(op: RawObject) -> c_int;
    fn botan_pk_op_kem_encrypt_create(op: *mut RawObject, key: RawObject, kdf: *const c_char) -> c_int;
    fn botan_pk_op_kem_encrypt_shared_key_length(op: RawObject, desired_len: usize, out_len: *mut usize) -> c_int;
    fn botan_pk_op_kem_encrypt_encapsulated_key_length(op: RawObject, out_len: *mut usize) -> c_int;
    fn botan_pk_op_kem_encrypt_create_shared_key(
        op: RawObject,
        rng: RawObject,
        salt: *const u8,
        salt_len: usize,
        desired_len: usize,
        shared_key: *mut u8,
        shared_key_len: *mut usize,
        encapsulated_key: *mut u8,
        encapsulated_key_len: *mut usize,
    ) -> c_int;
    fn botan_pk_op_kem_encrypt_destroy(op: RawObject) -> c_int;
    fn botan_pk_op_kem_decrypt_create(op: *mut RawObject, key: RawObject, kdf: *const c_char) -> c_int;
    fn botan_pk_op_kem_decrypt_shared_key_length(op: RawObject, desired_len: usize, out_len: *mut usize) -> c_int;
    fn botan_pk_op_kem_decrypt_shared_key(
        op: RawObject,
        salt: *const u8,
        salt_len: usize,
        encapsulated_key: *const u8,
        encapsulated_key_len: usize,
        desired_len: usize,
        shared_key: *mut u8,
        shared_key_len: *mut usize,
    ) -> c_int;
    fn botan_pk_op_kem_decrypt_destroy(op: RawObject) -> c_int;

    // X.509 certificates
    fn botan_x509_cert_load(cert: *mut RawObject, bits: *const u8, len: usize) -> c_int;
    fn botan_x509_cert_load_file(cert: *mut RawObject, path: *const c_char) -> c_int;
    fn botan_x509_cert_dup(new_cert: *mut RawObject, cert: RawObject) -> c_int;
    fn botan_x509_cert_get_time_starts(cert: RawObject, out: *mut c_char, out_len: *mut usize) -> c_int;
    fn botan_x509_cert_get_time_expires(cert: RawObject, out: *mut c_char, out_len: *mut usize) -> c_int;
    fn botan_x509_cert_not_before(cert: RawObject, time: *mut u64) -> c_int;
    fn botan_x509_cert_not_after(cert: RawObject, time: *mut u64) -> c_int;
    fn botan_x509_cert_get_fingerprint(cert: RawObject, hash: *const c_char, out: *mut u8, out_len: *mut usize) -> c_int;
    fn botan_x509_cert_get_serial_number(cert: RawObject, out: *mut u8, out_len: *mut usize) -> c_int;
    fn botan_x509_cert_get_authority_key_id(cert: RawObject, out: *mut u8, out_len: *mut usize) -> c_int;
    fn botan_x509_cert_get_subject_key_id(cert: RawObject, out: *mut u8, out_len: *mut usize) -> c_int;
    fn botan_x509_cert_view_public_key_bits(cert: RawObject, ctx: ViewCtx, view: ViewBinFn) -> c_int;
    fn botan_x509_cert_get_public_key(cert: RawObject, key: *mut RawObject) -> c_int;
    fn botan_x509_cert_get_issuer_dn(
        cert: RawObject,
        key: *const c_char,
        index: usize,
        out: *mut u8,
        out_len: *mut usize,
    ) -> c_int;
    fn botan_x509_cert_get_subject_dn(
        cert: RawObject,
        key: *const c_char,
        index: usize,
        out: *mut u8,
        out_len: *mut usize,
    ) -> c_int;
    fn botan_x509_cert_view_as_string(cert: RawObject, ctx: ViewCtx, view: ViewStrFn) -> c_int;
    fn botan_x509_cert_allowed_usage(cert: RawObject, key_usage: c_uint) -> c_int;
    fn botan_x509_cert_hostname_match(cert: RawObject, hostname: *const c_char) -> c_int;
    fn botan_x509_cert_verify(
        result: *mut c_int,
        cert: RawObject,
        intermediates: *const RawObject,
        intermediates_len: usize,
        trusted: *const RawObject,
        trusted_len: usize,
        trusted_path: *const c_char,
        required_strength: usize,
        hostname: *const c_char,
        reference_time: u64,
    ) -> c_int;
    fn botan_x509_cert_verify_with_crl(
        result: *mut c_int,
        cert: RawObject,
        intermediates: *const RawObject,
        intermediates_len: usize,
        trusted: *const RawObject,
        trusted_len: usize,
        crls: *const RawObject,
        crls_len: usize,
        trusted_path: *const c_char,
        required_strength: usize,
        hostname: *const c_char,
        reference_time: u64,
    ) -> c_int;
    fn botan_x509_cert_validation_status(code: c_int) -> *const c_char;
    fn botan_x509_cert_destroy(cert: RawObject) -> c_int;

    // X.509 revocation lists
    fn botan_x509_crl_load(crl: *mut RawObject, bits: *const u8, len: usize) -> c_int;
    fn botan_x509_crl_load_file(crl: *mut RawObject, path: *const c_char) -> c_int;
    fn botan_x509_is_revoked(crl: RawObject, cert: RawObject) -> c_int;
    fn botan_x509_crl_destroy(crl: RawObject) -> c_int;

    // One-time passwords
    fn botan_hotp_init(hotp: *mut RawObject, key: *const u8, key_len: usize, hash: *const c_char, digits: usize) -> c_int;
    fn botan_hotp_generate(hotp: RawObject, code: *mut u32, counter: u64) -> c_int;
    fn botan_hotp_check(hotp: RawObject, next_counter: *mut u64, code: u32, counter: u64, resync_range: usize) -> c_int;
    fn botan_hotp_destroy(hotp: RawObject) -> c_int;
    fn botan_totp_init(
        totp: *mut RawObject,
        key: *const u8,
        key_len: usize,
        hash: *const c_char,
        digits: usize,
        time_step: usize,
    ) -> c_int;
    fn botan_totp_generate(totp: RawObject, code: *mut u32, timestamp: u64) -> c_int;
    fn botan_totp_check(totp: RawObject, code: u32, timestamp: u64, drift: usize) -> c_int;
    fn botan_totp_destroy(totp: RawObject) -> c_int;

    // NIST key wrap
    fn botan_nist_kw_enc(
        cipher: *const c_char,
        padded: c_int,
        key: *const u8,
        key_len: usize,
        kek: *const u8,
        kek_len: usize,
        wrapped: *mut u8,
        wrapped_len: *mut usize,
    ) -> c_int;
    fn botan_nist_kw_dec(
        cipher: *const c_char,
        padded: c_int,
        wrapped: *const u8,
        wrapped_len: usize,
        kek: *const u8,
        kek_len: usize,
        key: *mut u8,
        key_len: *mut usize,
    ) -> c_int;

    // Forward error correction
    fn botan_zfec_encode(k: usize, n: usize, input: *const u8, size: usize, outputs: *mut *mut u8) -> c_int;
    fn botan_zfec_decode(
        k: usize,
        n: usize,
        indexes: *const usize,
        inputs: *const *const u8,
        share_size: usize,
        outputs: *mut *mut u8,
    ) -> c_int;

    // SRP-6a
    fn botan_srp6_server_session_init(srp6: *mut RawObject) -> c_int;
    fn botan_srp6_server_session_step1(
        srp6: RawObject,
        verifier: *const u8,
        verifier_len: usize,
        group: *const c_char,
        hash: *const c_char,
        rng: RawObject,
        b_pub: *mut u8,
        b_pub_len: *mut usize,
    ) -> c_int;
    fn botan_srp6_server_session_step2(
        srp6: RawObject,
        a_pub: *const u8,
        a_pub_len: usize,
        key: *mut u8,
        key_len: *mut usize,
    ) -> c_int;
    fn botan_srp6_generate_verifier(
        identifier: *const c_char,
        password: *const c_char,
        salt: *const u8,
        salt_len: usize,
        group: *const c_char,
        hash: *const c_char,
        verifier: *mut u8,
        verifier_len: *mut usize,
    ) -> c_int;
    fn botan_srp6_client_agree(
        username: *const c_char,
        password: *const c_char,
        group: *const c_char,
        hash: *const c_char,
        salt: *const u8,
        salt_len: usize,
        b_pub: *const u8,
        b_pub_len: usize,
        rng: RawObject,
        a_pub: *mut u8,
        a_pub_len: *mut usize,
        key: *mut u8,
        key_len: *mut usize,
    ) -> c_int;
    fn botan_srp6_group_size(group: *const c_char, group_bytes: *mut usize) -> c_int;
    fn botan_srp6_server_session_destroy(srp6: RawObject) -> c_int;
}
