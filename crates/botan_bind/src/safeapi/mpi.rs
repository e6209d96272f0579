// Copyright (C) Microsoft Corporation. All rights reserved.

//! Arbitrary precision integers.

use std::cmp::Ordering;
use std::ffi::c_int;
use std::ffi::CString;
use std::str::FromStr;

use crate::ffi;
use crate::ffi::RawObject;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::impl_native_display;
use crate::safeapi::handle::impl_native_ord;
use crate::safeapi::handle::ordering_from;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::handle::NativeDisplay;
use crate::safeapi::handle::NativeOrd;
use crate::safeapi::negotiate::fill_exact;
use crate::safeapi::negotiate::negotiate_string;
use crate::safeapi::rng;
use crate::safeapi::rng::Rng;

type BinaryOp = unsafe extern "C" fn(RawObject, RawObject, RawObject) -> c_int;
type UnaryQuery = unsafe extern "C" fn(RawObject) -> c_int;

pub struct Mpi {
    handle: ManagedHandle,
}

impl AsHandle for Mpi {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Mpi {
    /// A new integer with value zero.
    pub fn new() -> BotanResult<Self> {
        let lib = ffi::library()?;
        let init = lib.botan_mp_init()?;
        let handle = ManagedHandle::construct("mpi", lib.botan_mp_destroy()?, |out| {
            // SAFETY: valid out-parameter.
            unsafe { init(out) }
        })?;
        Ok(Self { handle })
    }

    /// Takes an integer produced by a native getter that allocates it.
    pub(crate) fn construct(ctor: impl FnOnce(*mut RawObject) -> c_int) -> BotanResult<Self> {
        let handle = ManagedHandle::construct("mpi", ffi::library()?.botan_mp_destroy()?, ctor)?;
        Ok(Self { handle })
    }

    pub fn from_i64(value: i64) -> BotanResult<Self> {
        match c_int::try_from(value) {
            Ok(small) => {
                let mpi = Self::new()?;
                let set = ffi::library()?.botan_mp_set_from_int()?;
                // SAFETY: live handle.
                check(unsafe { set(mpi.handle.as_ptr(), small) })?;
                Ok(mpi)
            }
            Err(_) => value.to_string().parse(),
        }
    }

    /// Parses `text` in the given radix (10 or 16).
    pub fn from_radix_str(text: &str, radix: usize) -> BotanResult<Self> {
        let text = CString::new(text)?;
        let mpi = Self::new()?;
        let set = ffi::library()?.botan_mp_set_from_radix_str()?;
        // SAFETY: `text` is NUL-terminated.
        check(unsafe { set(mpi.handle.as_ptr(), text.as_ptr(), radix) })?;
        Ok(mpi)
    }

    pub fn from_hex(hex: &str) -> BotanResult<Self> {
        Self::from_radix_str(hex, 16)
    }

    /// Big-endian unsigned magnitude.
    pub fn from_bytes(bytes: &[u8]) -> BotanResult<Self> {
        let mpi = Self::new()?;
        let from_bin = ffi::library()?.botan_mp_from_bin()?;
        // SAFETY: `bytes` is readable for its full length.
        check(unsafe { from_bin(mpi.handle.as_ptr(), bytes.as_ptr(), bytes.len()) })?;
        Ok(mpi)
    }

    pub fn random_bits(rng: &Rng, bits: usize) -> BotanResult<Self> {
        let mpi = Self::new()?;
        let rand_bits = ffi::library()?.botan_mp_rand_bits()?;
        // SAFETY: both handles are live.
        check(unsafe { rand_bits(mpi.handle.as_ptr(), rng.as_ptr(), bits) })?;
        Ok(mpi)
    }

    /// Uniform value in `[lower, upper)`.
    pub fn random_range(rng: &Rng, lower: &Mpi, upper: &Mpi) -> BotanResult<Self> {
        let mpi = Self::new()?;
        let rand_range = ffi::library()?.botan_mp_rand_range()?;
        // SAFETY: all handles are live.
        check(unsafe { rand_range(mpi.handle.as_ptr(), rng.as_ptr(), lower.as_ptr(), upper.as_ptr()) })?;
        Ok(mpi)
    }

    /// A new handle holding the same value.
    pub fn try_clone(&self) -> BotanResult<Self> {
        let mpi = Self::new()?;
        let set = ffi::library()?.botan_mp_set_from_mp()?;
        // SAFETY: both handles are live.
        check(unsafe { set(mpi.handle.as_ptr(), self.handle.as_ptr()) })?;
        Ok(mpi)
    }

    fn binary(&self, other: &Mpi, op: BinaryOp) -> BotanResult<Self> {
        let result = Self::new()?;
        // SAFETY: all handles are live; the result is distinct from the inputs.
        check(unsafe { op(result.handle.as_ptr(), self.handle.as_ptr(), other.handle.as_ptr()) })?;
        Ok(result)
    }

    pub fn add(&self, other: &Mpi) -> BotanResult<Self> {
        self.binary(other, ffi::library()?.botan_mp_add()?)
    }

    pub fn sub(&self, other: &Mpi) -> BotanResult<Self> {
        self.binary(other, ffi::library()?.botan_mp_sub()?)
    }

    pub fn mul(&self, other: &Mpi) -> BotanResult<Self> {
        self.binary(other, ffi::library()?.botan_mp_mul()?)
    }

    pub fn gcd(&self, other: &Mpi) -> BotanResult<Self> {
        self.binary(other, ffi::library()?.botan_mp_gcd()?)
    }

    /// Quotient and remainder. Division by zero is an error.
    pub fn div_rem(&self, divisor: &Mpi) -> BotanResult<(Self, Self)> {
        let div = ffi::library()?.botan_mp_div()?;
        let quotient = Self::new()?;
        let remainder = Self::new()?;
        // SAFETY: all handles are live and distinct.
        check(unsafe {
            div(
                quotient.handle.as_ptr(),
                remainder.handle.as_ptr(),
                self.handle.as_ptr(),
                divisor.handle.as_ptr(),
            )
        })?;
        Ok((quotient, remainder))
    }

    pub fn add_u32(&self, value: u32) -> BotanResult<Self> {
        let add = ffi::library()?.botan_mp_add_u32()?;
        let result = Self::new()?;
        // SAFETY: both handles are live.
        check(unsafe { add(result.handle.as_ptr(), self.handle.as_ptr(), value) })?;
        Ok(result)
    }

    pub fn sub_u32(&self, value: u32) -> BotanResult<Self> {
        let sub = ffi::library()?.botan_mp_sub_u32()?;
        let result = Self::new()?;
        // SAFETY: both handles are live.
        check(unsafe { sub(result.handle.as_ptr(), self.handle.as_ptr(), value) })?;
        Ok(result)
    }

    /// `self * other mod modulus`
    pub fn mod_mul(&self, other: &Mpi, modulus: &Mpi) -> BotanResult<Self> {
        let mod_mul = ffi::library()?.botan_mp_mod_mul()?;
        let result = Self::new()?;
        // SAFETY: all handles are live.
        check(unsafe {
            mod_mul(
                result.handle.as_ptr(),
                self.handle.as_ptr(),
                other.handle.as_ptr(),
                modulus.handle.as_ptr(),
            )
        })?;
        Ok(result)
    }

    /// `self ^ exponent mod modulus`
    pub fn pow_mod(&self, exponent: &Mpi, modulus: &Mpi) -> BotanResult<Self> {
        let powmod = ffi::library()?.botan_mp_powmod()?;
        let result = Self::new()?;
        // SAFETY: all handles are live.
        check(unsafe {
            powmod(
                result.handle.as_ptr(),
                self.handle.as_ptr(),
                exponent.handle.as_ptr(),
                modulus.handle.as_ptr(),
            )
        })?;
        Ok(result)
    }

    /// Multiplicative inverse modulo `modulus`; zero when none exists.
    pub fn inverse_mod(&self, modulus: &Mpi) -> BotanResult<Self> {
        self.binary(modulus, ffi::library()?.botan_mp_mod_inverse()?)
    }

    pub fn shl(&self, shift: usize) -> BotanResult<Self> {
        let lshift = ffi::library()?.botan_mp_lshift()?;
        let result = Self::new()?;
        // SAFETY: both handles are live.
        check(unsafe { lshift(result.handle.as_ptr(), self.handle.as_ptr(), shift) })?;
        Ok(result)
    }

    pub fn shr(&self, shift: usize) -> BotanResult<Self> {
        let rshift = ffi::library()?.botan_mp_rshift()?;
        let result = Self::new()?;
        // SAFETY: both handles are live.
        check(unsafe { rshift(result.handle.as_ptr(), self.handle.as_ptr(), shift) })?;
        Ok(result)
    }

    fn query(&self, query: UnaryQuery) -> BotanResult<bool> {
        // SAFETY: live handle.
        Predicate::FLAG.eval(unsafe { query(self.handle.as_ptr()) })
    }

    pub fn is_zero(&self) -> BotanResult<bool> {
        self.query(ffi::library()?.botan_mp_is_zero()?)
    }

    pub fn is_positive(&self) -> BotanResult<bool> {
        self.query(ffi::library()?.botan_mp_is_positive()?)
    }

    pub fn is_negative(&self) -> BotanResult<bool> {
        self.query(ffi::library()?.botan_mp_is_negative()?)
    }

    pub fn is_odd(&self) -> BotanResult<bool> {
        self.query(ffi::library()?.botan_mp_is_odd()?)
    }

    pub fn is_even(&self) -> BotanResult<bool> {
        self.query(ffi::library()?.botan_mp_is_even()?)
    }

    /// Probabilistic primality test with error probability at most
    /// `2^-test_prob`.
    pub fn is_prime(&self, rng: &Rng, test_prob: usize) -> BotanResult<bool> {
        let is_prime = ffi::library()?.botan_mp_is_prime()?;
        // SAFETY: both handles are live.
        Predicate::FLAG.eval(unsafe { is_prime(self.handle.as_ptr(), rng.as_ptr(), test_prob) })
    }

    pub fn get_bit(&self, bit: usize) -> BotanResult<bool> {
        let get_bit = ffi::library()?.botan_mp_get_bit()?;
        // SAFETY: live handle.
        Predicate::FLAG.eval(unsafe { get_bit(self.handle.as_ptr(), bit) })
    }

    pub fn set_bit(&mut self, bit: usize) -> BotanResult<()> {
        let set_bit = ffi::library()?.botan_mp_set_bit()?;
        // SAFETY: live handle.
        check(unsafe { set_bit(self.handle.as_ptr(), bit) })
    }

    pub fn clear_bit(&mut self, bit: usize) -> BotanResult<()> {
        let clear_bit = ffi::library()?.botan_mp_clear_bit()?;
        // SAFETY: live handle.
        check(unsafe { clear_bit(self.handle.as_ptr(), bit) })
    }

    pub fn flip_sign(&mut self) -> BotanResult<()> {
        let flip = ffi::library()?.botan_mp_flip_sign()?;
        // SAFETY: live handle.
        check(unsafe { flip(self.handle.as_ptr()) })
    }

    /// Exchanges the values, not the handles.
    pub fn swap(&mut self, other: &mut Mpi) -> BotanResult<()> {
        let swap = ffi::library()?.botan_mp_swap()?;
        // SAFETY: both handles are live and distinct (two `&mut`).
        check(unsafe { swap(self.handle.as_ptr(), other.handle.as_ptr()) })
    }

    pub fn num_bits(&self) -> BotanResult<usize> {
        let num_bits = ffi::library()?.botan_mp_num_bits()?;
        let mut bits = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { num_bits(self.handle.as_ptr(), &mut bits) })?;
        Ok(bits)
    }

    pub fn num_bytes(&self) -> BotanResult<usize> {
        let num_bytes = ffi::library()?.botan_mp_num_bytes()?;
        let mut bytes = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { num_bytes(self.handle.as_ptr(), &mut bytes) })?;
        Ok(bytes)
    }

    /// Big-endian magnitude; the sign is dropped.
    pub fn to_bytes(&self) -> BotanResult<Vec<u8>> {
        let to_bin = ffi::library()?.botan_mp_to_bin()?;
        fill_exact(self.num_bytes()?, |out, _| {
            // SAFETY: `out` holds `num_bytes` bytes.
            unsafe { to_bin(self.handle.as_ptr(), out) }
        })
    }

    /// Fails with `BadParameter` when the value does not fit.
    pub fn to_u32(&self) -> BotanResult<u32> {
        let to_u32 = ffi::library()?.botan_mp_to_uint32()?;
        let mut value = 0u32;
        // SAFETY: valid out-parameter.
        check(unsafe { to_u32(self.handle.as_ptr(), &mut value) })?;
        Ok(value)
    }

    /// Rendering in base 10 or 16.
    pub fn to_radix_string(&self, radix: u8) -> BotanResult<String> {
        let to_str = ffi::library()?.botan_mp_to_str()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { to_str(self.handle.as_ptr(), radix, out, out_len) }
        })
    }
}

impl FromStr for Mpi {
    type Err = BotanError;

    /// Decimal, or hexadecimal with a `0x` prefix.
    fn from_str(text: &str) -> BotanResult<Self> {
        let text = CString::new(text)?;
        let mpi = Self::new()?;
        let set = ffi::library()?.botan_mp_set_from_str()?;
        // SAFETY: `text` is NUL-terminated.
        check(unsafe { set(mpi.handle.as_ptr(), text.as_ptr()) })?;
        Ok(mpi)
    }
}

impl NativeOrd for Mpi {
    fn native_cmp(&self, other: &Self) -> BotanResult<Ordering> {
        let cmp = ffi::library()?.botan_mp_cmp()?;
        let mut result: c_int = 0;
        // SAFETY: both handles are live; `result` is a valid out-parameter.
        check(unsafe { cmp(&mut result, self.handle.as_ptr(), other.handle.as_ptr()) })?;
        Ok(ordering_from(result))
    }
}

impl NativeDisplay for Mpi {
    fn render(&self) -> BotanResult<String> {
        self.to_radix_string(10)
    }
}

impl_native_ord!(Mpi);
impl_native_display!(Mpi);

fn mpi_rng_arg<R>(args: &[Arg<'_>], index: usize, f: impl FnOnce(&Rng) -> BotanResult<R>) -> BotanResult<R> {
    match args.get(index) {
        None | Some(Arg::Nil) => rng::with_default(f),
        Some(_) => f(get_rng(args, index)?),
    }
}

macro_rules! mpi_binary_method {
    ($fn_name:ident, $op:ident) => {
        fn $fn_name(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
            fixarity(args, 1)?;
            Ok(Value::Mpi(x.$op(get_mpi(args, 0)?)?))
        }
    };
}

macro_rules! mpi_query_method {
    ($fn_name:ident, $op:ident) => {
        fn $fn_name(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
            fixarity(args, 0)?;
            Ok(x.$op()?.into())
        }
    };
}

mpi_binary_method!(mpi_add, add);
mpi_binary_method!(mpi_sub, sub);
mpi_binary_method!(mpi_mul, mul);
mpi_binary_method!(mpi_gcd, gcd);
mpi_binary_method!(mpi_inverse_mod, inverse_mod);
mpi_query_method!(mpi_is_zero, is_zero);
mpi_query_method!(mpi_is_positive, is_positive);
mpi_query_method!(mpi_is_negative, is_negative);
mpi_query_method!(mpi_is_odd, is_odd);
mpi_query_method!(mpi_is_even, is_even);
mpi_query_method!(mpi_num_bits, num_bits);
mpi_query_method!(mpi_num_bytes, num_bytes);
mpi_query_method!(mpi_to_bytes, to_bytes);
mpi_query_method!(mpi_to_u32, to_u32);
mpi_query_method!(mpi_flip_sign, flip_sign);

fn mpi_div(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    let (quotient, remainder) = x.div_rem(get_mpi(args, 0)?)?;
    Ok(Value::Tuple(vec![Value::Mpi(quotient), Value::Mpi(remainder)]))
}

fn mpi_mod_mul(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 2)?;
    Ok(Value::Mpi(x.mod_mul(get_mpi(args, 0)?, get_mpi(args, 1)?)?))
}

fn mpi_pow_mod(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 2)?;
    Ok(Value::Mpi(x.pow_mod(get_mpi(args, 0)?, get_mpi(args, 1)?)?))
}

fn mpi_shl(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(Value::Mpi(x.shl(get_size(args, 0)?)?))
}

fn mpi_shr(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(Value::Mpi(x.shr(get_size(args, 0)?)?))
}

fn mpi_get_bit(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(x.get_bit(get_size(args, 0)?)?.into())
}

fn mpi_set_bit(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(x.set_bit(get_size(args, 0)?)?.into())
}

fn mpi_clear_bit(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(x.clear_bit(get_size(args, 0)?)?.into())
}

fn mpi_is_prime(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 0, 2)?;
    let test_prob = opt_size(args, 0, 128)?;
    Ok(mpi_rng_arg(args, 1, |rng| x.is_prime(rng, test_prob))?.into())
}

fn mpi_to_string(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 0, 1)?;
    let radix = u8::try_from(opt_size(args, 0, 10)?)
        .map_err(|_| BotanError::InvalidArgument("radix must be 10 or 16".into()))?;
    Ok(x.to_radix_string(radix)?.into())
}

fn mpi_cmp(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    compare_value(x, get_mpi(args, 0)?)
}

fn mpi_equal(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    equal_value(x, get_mpi(args, 0)?)
}

fn mpi_clone(x: &mut Mpi, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(Value::Mpi(x.try_clone()?))
}

impl Dispatch for Mpi {
    const KIND: &'static str = "mpi";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Mpi>)] = &[
            ("add", mpi_add),
            ("sub", mpi_sub),
            ("mul", mpi_mul),
            ("div", mpi_div),
            ("gcd", mpi_gcd),
            ("mod-mul", mpi_mod_mul),
            ("pow-mod", mpi_pow_mod),
            ("inverse-mod", mpi_inverse_mod),
            ("shl", mpi_shl),
            ("shr", mpi_shr),
            ("cmp", mpi_cmp),
            ("equal", mpi_equal),
            ("is-zero", mpi_is_zero),
            ("is-positive", mpi_is_positive),
            ("is-negative", mpi_is_negative),
            ("is-odd", mpi_is_odd),
            ("is-even", mpi_is_even),
            ("is-prime", mpi_is_prime),
            ("get-bit", mpi_get_bit),
            ("set-bit", mpi_set_bit),
            ("clear-bit", mpi_clear_bit),
            ("flip-sign", mpi_flip_sign),
            ("num-bits", mpi_num_bits),
            ("num-bytes", mpi_num_bytes),
            ("to-bytes", mpi_to_bytes),
            ("to-u32", mpi_to_u32),
            ("to-string", mpi_to_string),
            ("clone", mpi_clone),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table_is_unique() {
        let mut names = Mpi::method_names();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_comparisons_are_dispatchable() {
        assert!(Mpi::lookup("cmp").is_some());
        assert!(Mpi::lookup("equal").is_some());
    }
}
