// Copyright (C) Microsoft Corporation. All rights reserved.

//! Keyword-addressable access to handle kinds.
//!
//! The typed methods on each wrapper are the primary API. This module layers
//! a name-to-operation table on top, so a caller holding only a method name
//! and a list of loosely typed arguments (a scripting host, a test harness)
//! can drive any wrapper uniformly.

use crate::safeapi::error::BotanError;
use crate::safeapi::error::BotanResult;
use crate::safeapi::handle::NativeOrd;
use crate::safeapi::ec_group::EcGroup;
use crate::safeapi::mpi::Mpi;
use crate::safeapi::oid::Oid;
use crate::safeapi::pubkey::PublicKey;
use crate::safeapi::rng::Rng;
use crate::safeapi::x509::cert::X509Cert;
use crate::safeapi::x509::crl::X509Crl;
use crate::safeapi::x509::verify::ValidationStatus;

/// One host call argument.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Nil,
    Int(i64),
    Uint(u64),
    Bytes(&'a [u8]),
    Str(&'a str),
    Keyword(&'a str),
    Cert(&'a X509Cert),
    Certs(&'a [&'a X509Cert]),
    Crl(&'a X509Crl),
    Crls(&'a [&'a X509Crl]),
    Rng(&'a Rng),
    Mpi(&'a Mpi),
    Oid(&'a Oid),
    EcGroup(&'a EcGroup),
}

impl Arg<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Nil => "nil",
            Arg::Int(_) => "int",
            Arg::Uint(_) => "uint",
            Arg::Bytes(_) => "bytes",
            Arg::Str(_) => "string",
            Arg::Keyword(_) => "keyword",
            Arg::Cert(_) => "x509_cert",
            Arg::Certs(_) => "x509_cert list",
            Arg::Crl(_) => "x509_crl",
            Arg::Crls(_) => "x509_crl list",
            Arg::Rng(_) => "rng",
            Arg::Mpi(_) => "mpi",
            Arg::Oid(_) => "oid",
            Arg::EcGroup(_) => "ec_group",
        }
    }
}

/// One host call result.
#[derive(Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Bytes(Vec<u8>),
    Str(String),
    Tuple(Vec<Value>),
    Cert(X509Cert),
    PublicKey(PublicKey),
    Mpi(Mpi),
    Oid(Oid),
    Status(ValidationStatus),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

fn type_error(index: usize, expected: &str, got: &Arg<'_>) -> BotanError {
    BotanError::InvalidArgument(format!(
        "argument {index}: expected {expected}, got {}",
        got.type_name()
    ))
}

/// Requires exactly `n` arguments.
pub fn fixarity(args: &[Arg<'_>], n: usize) -> BotanResult<()> {
    if args.len() == n {
        Ok(())
    } else {
        Err(BotanError::Arity {
            expected: n.to_string(),
            got: args.len(),
        })
    }
}

/// Requires between `min` and `max` arguments, inclusive.
pub fn arity(args: &[Arg<'_>], min: usize, max: usize) -> BotanResult<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(BotanError::Arity {
            expected: format!("{min}..={max}"),
            got: args.len(),
        })
    }
}

fn arg<'a, 'b>(args: &'b [Arg<'a>], index: usize) -> BotanResult<&'b Arg<'a>> {
    args.get(index).ok_or_else(|| BotanError::Arity {
        expected: format!("at least {}", index + 1),
        got: args.len(),
    })
}

/// Byte string argument. Text is accepted as its UTF-8 bytes.
pub fn get_bytes<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a [u8]> {
    match *arg(args, index)? {
        Arg::Bytes(bytes) => Ok(bytes),
        Arg::Str(text) => Ok(text.as_bytes()),
        other => Err(type_error(index, "bytes", &other)),
    }
}

pub fn get_str<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a str> {
    match *arg(args, index)? {
        Arg::Str(text) | Arg::Keyword(text) => Ok(text),
        Arg::Bytes(bytes) => Ok(std::str::from_utf8(bytes)?),
        other => Err(type_error(index, "string", &other)),
    }
}

pub fn get_keyword<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a str> {
    match *arg(args, index)? {
        Arg::Keyword(name) => Ok(name),
        other => Err(type_error(index, "keyword", &other)),
    }
}

pub fn get_u64(args: &[Arg<'_>], index: usize) -> BotanResult<u64> {
    match *arg(args, index)? {
        Arg::Uint(value) => Ok(value),
        Arg::Int(value) => u64::try_from(value)
            .map_err(|_| BotanError::InvalidArgument(format!("argument {index}: {value} is negative"))),
        other => Err(type_error(index, "non-negative integer", &other)),
    }
}

pub fn get_size(args: &[Arg<'_>], index: usize) -> BotanResult<usize> {
    let value = get_u64(args, index)?;
    usize::try_from(value)
        .map_err(|_| BotanError::InvalidArgument(format!("argument {index}: {value} does not fit a size")))
}

pub fn get_u32(args: &[Arg<'_>], index: usize) -> BotanResult<u32> {
    let value = get_u64(args, index)?;
    u32::try_from(value)
        .map_err(|_| BotanError::InvalidArgument(format!("argument {index}: {value} does not fit 32 bits")))
}

pub fn get_cert<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a X509Cert> {
    match *arg(args, index)? {
        Arg::Cert(cert) => Ok(cert),
        other => Err(type_error(index, "x509_cert", &other)),
    }
}

pub fn get_mpi<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a Mpi> {
    match *arg(args, index)? {
        Arg::Mpi(mpi) => Ok(mpi),
        other => Err(type_error(index, "mpi", &other)),
    }
}

pub fn get_oid<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a Oid> {
    match *arg(args, index)? {
        Arg::Oid(oid) => Ok(oid),
        other => Err(type_error(index, "oid", &other)),
    }
}

pub fn get_ec_group<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a EcGroup> {
    match *arg(args, index)? {
        Arg::EcGroup(group) => Ok(group),
        other => Err(type_error(index, "ec_group", &other)),
    }
}

pub fn get_rng<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<&'a Rng> {
    match *arg(args, index)? {
        Arg::Rng(rng) => Ok(rng),
        other => Err(type_error(index, "rng", &other)),
    }
}

/// Absent and `nil` arguments read as `None`.
pub fn opt_str<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<Option<&'a str>> {
    match args.get(index) {
        None | Some(Arg::Nil) => Ok(None),
        Some(_) => get_str(args, index).map(Some),
    }
}

pub fn opt_bytes<'a>(args: &[Arg<'a>], index: usize) -> BotanResult<Option<&'a [u8]>> {
    match args.get(index) {
        None | Some(Arg::Nil) => Ok(None),
        Some(_) => get_bytes(args, index).map(Some),
    }
}

pub fn opt_size(args: &[Arg<'_>], index: usize, default: usize) -> BotanResult<usize> {
    match args.get(index) {
        None | Some(Arg::Nil) => Ok(default),
        Some(_) => get_size(args, index),
    }
}

pub fn opt_u64(args: &[Arg<'_>], index: usize, default: u64) -> BotanResult<u64> {
    match args.get(index) {
        None | Some(Arg::Nil) => Ok(default),
        Some(_) => get_u64(args, index),
    }
}

/// Three-way comparison as `-1`, `0` or `1`. A failing native comparison is
/// returned as an error rather than reaching the panicking `Ord` impl.
pub fn compare_value<T: NativeOrd>(x: &T, y: &T) -> BotanResult<Value> {
    let ordering = x.native_cmp(y)?;
    Ok(Value::Int(ordering as i64))
}

/// Equality through the native comparison.
pub fn equal_value<T: NativeOrd>(x: &T, y: &T) -> BotanResult<Value> {
    Ok(Value::Bool(x.native_cmp(y)?.is_eq()))
}

/// A keyword-addressable operation on a `T`.
pub type Method<T> = fn(&mut T, &[Arg<'_>]) -> BotanResult<Value>;

/// Static method table of one handle kind.
pub trait Dispatch: Sized + 'static {
    const KIND: &'static str;

    fn methods() -> &'static [(&'static str, Method<Self>)];

    fn lookup(name: &str) -> Option<Method<Self>> {
        Self::methods()
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, method)| *method)
    }

    fn method_names() -> Vec<&'static str> {
        Self::methods().iter().map(|(name, _)| *name).collect()
    }

    fn invoke(&mut self, name: &str, args: &[Arg<'_>]) -> BotanResult<Value> {
        let method = Self::lookup(name).ok_or_else(|| BotanError::UnknownMethod {
            kind: Self::KIND,
            name: name.to_owned(),
        })?;
        tracing::trace!(kind = Self::KIND, method = name, args = args.len(), "dispatch");
        method(self, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safeapi::error::ErrorKind;

    struct Counter {
        value: u64,
    }

    fn counter_get(counter: &mut Counter, args: &[Arg<'_>]) -> BotanResult<Value> {
        fixarity(args, 0)?;
        Ok(counter.value.into())
    }

    fn counter_add(counter: &mut Counter, args: &[Arg<'_>]) -> BotanResult<Value> {
        arity(args, 1, 2)?;
        counter.value += get_u64(args, 0)? + opt_u64(args, 1, 0)?;
        Ok(Value::Nil)
    }

    impl Dispatch for Counter {
        const KIND: &'static str = "counter";

        fn methods() -> &'static [(&'static str, Method<Self>)] {
            const METHODS: &[(&str, Method<Counter>)] = &[("get", counter_get), ("add", counter_add)];
            METHODS
        }
    }

    #[test]
    fn test_lookup_finds_registered_methods() {
        assert!(Counter::lookup("get").is_some());
        assert!(Counter::lookup("add").is_some());
        assert!(Counter::lookup("sub").is_none());
        assert_eq!(Counter::method_names(), vec!["get", "add"]);
    }

    #[test]
    fn test_invoke_runs_method() {
        let mut counter = Counter { value: 1 };
        counter.invoke("add", &[Arg::Int(4), Arg::Uint(2)]).expect("add");
        counter.invoke("add", &[Arg::Uint(3), Arg::Nil]).expect("add");
        let value = counter.invoke("get", &[]).expect("get");
        assert_eq!(value.as_int(), Some(10));
    }

    #[test]
    fn test_invoke_unknown_method() {
        let mut counter = Counter { value: 0 };
        let err = counter.invoke("frobnicate", &[]).err().expect("unknown");
        assert_eq!(
            err,
            BotanError::UnknownMethod {
                kind: "counter",
                name: "frobnicate".into()
            }
        );
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn test_arity_is_enforced() {
        let mut counter = Counter { value: 0 };
        assert!(matches!(
            counter.invoke("get", &[Arg::Nil]),
            Err(BotanError::Arity { got: 1, .. })
        ));
        assert!(matches!(counter.invoke("add", &[]), Err(BotanError::Arity { got: 0, .. })));
    }

    #[test]
    fn test_readers_check_types() {
        let args = [Arg::Str("abc"), Arg::Int(-1), Arg::Keyword("hostname"), Arg::Bytes(b"\xff")];
        assert_eq!(get_bytes(&args, 0).expect("bytes"), b"abc");
        assert_eq!(get_str(&args, 2).expect("str"), "hostname");
        assert_eq!(get_keyword(&args, 2).expect("keyword"), "hostname");
        assert!(matches!(get_u64(&args, 1), Err(BotanError::InvalidArgument(_))));
        assert!(matches!(get_keyword(&args, 0), Err(BotanError::InvalidArgument(_))));
        assert_eq!(get_str(&args, 3).err().map(|e| e.kind()), Some(ErrorKind::StringConversionError));
        assert!(matches!(get_size(&args, 9), Err(BotanError::Arity { .. })));
        assert_eq!(opt_str(&args, 9).expect("absent"), None);
        assert_eq!(opt_size(&args, 9, 32).expect("default"), 32);
    }

    struct Ranked(Option<u8>);

    impl NativeOrd for Ranked {
        fn native_cmp(&self, other: &Self) -> BotanResult<std::cmp::Ordering> {
            match (self.0, other.0) {
                (Some(a), Some(b)) => Ok(a.cmp(&b)),
                _ => Err(BotanError::Ffi(ErrorKind::InvalidObject)),
            }
        }
    }

    #[test]
    fn test_compare_value_maps_ordering() {
        let (low, high) = (Ranked(Some(1)), Ranked(Some(9)));
        assert_eq!(compare_value(&low, &high).expect("cmp").as_int(), Some(-1));
        assert_eq!(compare_value(&high, &high).expect("cmp").as_int(), Some(0));
        assert_eq!(compare_value(&high, &low).expect("cmp").as_int(), Some(1));
        assert_eq!(equal_value(&low, &low).expect("equal").as_bool(), Some(true));
        assert_eq!(equal_value(&low, &high).expect("equal").as_bool(), Some(false));
    }

    #[test]
    fn test_failed_native_compare_is_an_error() {
        let (broken, fine) = (Ranked(None), Ranked(Some(3)));
        assert_eq!(
            compare_value(&broken, &fine).err(),
            Some(BotanError::Ffi(ErrorKind::InvalidObject))
        );
        assert_eq!(
            equal_value(&fine, &broken).err(),
            Some(BotanError::Ffi(ErrorKind::InvalidObject))
        );
    }

    #[test]
    fn test_u32_range() {
        assert_eq!(get_u32(&[Arg::Uint(7)], 0).expect("u32"), 7);
        assert!(get_u32(&[Arg::Uint(u64::from(u32::MAX) + 1)], 0).is_err());
    }
}
