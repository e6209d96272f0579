// Copyright (C) Microsoft Corporation. All rights reserved.

//! Elliptic curve domain parameters.

use std::ffi::c_int;
use std::ffi::CString;
use std::fmt;

use crate::ffi;
use crate::ffi::RawObject;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::mpi::Mpi;
use crate::safeapi::negotiate::view_bytes;
use crate::safeapi::negotiate::view_string;
use crate::safeapi::oid::Oid;

type MpiGetter = unsafe extern "C" fn(*mut RawObject, RawObject) -> c_int;

/// A named or application specific curve.
pub struct EcGroup {
    handle: ManagedHandle,
}

impl AsHandle for EcGroup {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

/// Whether the library can register curves that have no standard name.
pub fn supports_application_specific_group() -> BotanResult<bool> {
    let supports = ffi::library()?.botan_ec_group_supports_application_specific_group()?;
    let mut out: c_int = 0;
    // SAFETY: valid out-parameter.
    check(unsafe { supports(&mut out) })?;
    Ok(out != 0)
}

/// Whether `name` (e.g. `secp256r1`) is a curve this build knows.
pub fn supports_named_group(name: &str) -> BotanResult<bool> {
    let name = CString::new(name)?;
    let supports = ffi::library()?.botan_ec_group_supports_named_group()?;
    let mut out: c_int = 0;
    // SAFETY: `name` is NUL-terminated; valid out-parameter.
    check(unsafe { supports(name.as_ptr(), &mut out) })?;
    Ok(out != 0)
}

impl EcGroup {
    fn construct(ctor: impl FnOnce(*mut RawObject) -> c_int) -> BotanResult<Self> {
        let handle = ManagedHandle::construct("ec_group", ffi::library()?.botan_ec_group_destroy()?, ctor)?;
        Ok(Self { handle })
    }

    pub fn from_name(name: &str) -> BotanResult<Self> {
        let name = CString::new(name)?;
        let from_name = ffi::library()?.botan_ec_group_from_name()?;
        Self::construct(|out| {
            // SAFETY: `name` is NUL-terminated.
            unsafe { from_name(out, name.as_ptr()) }
        })
    }

    pub fn from_oid(oid: &Oid) -> BotanResult<Self> {
        let from_oid = ffi::library()?.botan_ec_group_from_oid()?;
        Self::construct(|out| {
            // SAFETY: live OID handle.
            unsafe { from_oid(out, oid.as_ptr()) }
        })
    }

    /// BER encoded `ECParameters`.
    pub fn from_ber(ber: &[u8]) -> BotanResult<Self> {
        let from_ber = ffi::library()?.botan_ec_group_from_ber()?;
        Self::construct(|out| {
            // SAFETY: `ber` is readable for its full length.
            unsafe { from_ber(out, ber.as_ptr(), ber.len()) }
        })
    }

    pub fn from_pem(pem: &str) -> BotanResult<Self> {
        let pem = CString::new(pem)?;
        let from_pem = ffi::library()?.botan_ec_group_from_pem()?;
        Self::construct(|out| {
            // SAFETY: `pem` is NUL-terminated.
            unsafe { from_pem(out, pem.as_ptr()) }
        })
    }

    /// An application specific curve `y^2 = x^3 + ax + b` over `p`, with base
    /// point `(g_x, g_y)` of the given prime order. Needs
    /// [`supports_application_specific_group`].
    pub fn from_params(oid: &Oid, p: &Mpi, a: &Mpi, b: &Mpi, g_x: &Mpi, g_y: &Mpi, order: &Mpi) -> BotanResult<Self> {
        let from_params = ffi::library()?.botan_ec_group_from_params()?;
        Self::construct(|out| {
            // SAFETY: every input handle is live for the call.
            unsafe {
                from_params(
                    out,
                    oid.as_ptr(),
                    p.as_ptr(),
                    a.as_ptr(),
                    b.as_ptr(),
                    g_x.as_ptr(),
                    g_y.as_ptr(),
                    order.as_ptr(),
                )
            }
        })
    }

    pub fn to_der(&self) -> BotanResult<Vec<u8>> {
        let view = ffi::library()?.botan_ec_group_view_der()?;
        view_bytes(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_bytes`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn to_pem(&self) -> BotanResult<String> {
        let view = ffi::library()?.botan_ec_group_view_pem()?;
        view_string(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_string`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn curve_oid(&self) -> BotanResult<Oid> {
        let get_oid = ffi::library()?.botan_ec_group_get_curve_oid()?;
        Oid::construct(|out| {
            // SAFETY: valid out-parameter; live group.
            unsafe { get_oid(out, self.handle.as_ptr()) }
        })
    }

    fn parameter(&self, getter: MpiGetter) -> BotanResult<Mpi> {
        Mpi::construct(|out| {
            // SAFETY: valid out-parameter; live group.
            unsafe { getter(out, self.handle.as_ptr()) }
        })
    }

    /// Prime modulus of the field.
    pub fn p(&self) -> BotanResult<Mpi> {
        self.parameter(ffi::library()?.botan_ec_group_get_p()?)
    }

    pub fn a(&self) -> BotanResult<Mpi> {
        self.parameter(ffi::library()?.botan_ec_group_get_a()?)
    }

    pub fn b(&self) -> BotanResult<Mpi> {
        self.parameter(ffi::library()?.botan_ec_group_get_b()?)
    }

    /// Affine x coordinate of the base point.
    pub fn g_x(&self) -> BotanResult<Mpi> {
        self.parameter(ffi::library()?.botan_ec_group_get_g_x()?)
    }

    pub fn g_y(&self) -> BotanResult<Mpi> {
        self.parameter(ffi::library()?.botan_ec_group_get_g_y()?)
    }

    /// Order of the base point.
    pub fn order(&self) -> BotanResult<Mpi> {
        self.parameter(ffi::library()?.botan_ec_group_get_order()?)
    }

    /// Same domain parameters, whatever the handles.
    pub fn equals(&self, other: &EcGroup) -> BotanResult<bool> {
        let equal = ffi::library()?.botan_ec_group_equal()?;
        // SAFETY: both handles are live.
        Predicate::FLAG.eval(unsafe { equal(self.handle.as_ptr(), other.handle.as_ptr()) })
    }
}

/// A failed native comparison compares unequal; use [`EcGroup::equals`] to
/// see the error.
impl PartialEq for EcGroup {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.equals(other), Ok(true))
    }
}

impl fmt::Debug for EcGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.curve_oid() {
            Ok(oid) => write!(f, "EcGroup({oid})"),
            Err(_) => f.debug_struct("EcGroup").field("handle", &self.handle).finish(),
        }
    }
}

macro_rules! ec_group_mpi_method {
    ($fn_name:ident, $op:ident) => {
        fn $fn_name(group: &mut EcGroup, args: &[Arg<'_>]) -> BotanResult<Value> {
            fixarity(args, 0)?;
            Ok(Value::Mpi(group.$op()?))
        }
    };
}

ec_group_mpi_method!(ec_group_p, p);
ec_group_mpi_method!(ec_group_a, a);
ec_group_mpi_method!(ec_group_b, b);
ec_group_mpi_method!(ec_group_g_x, g_x);
ec_group_mpi_method!(ec_group_g_y, g_y);
ec_group_mpi_method!(ec_group_order, order);

fn ec_group_to_der(group: &mut EcGroup, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(group.to_der()?.into())
}

fn ec_group_to_pem(group: &mut EcGroup, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(group.to_pem()?.into())
}

fn ec_group_curve_oid(group: &mut EcGroup, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(Value::Oid(group.curve_oid()?))
}

fn ec_group_equal(group: &mut EcGroup, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(group.equals(get_ec_group(args, 0)?)?.into())
}

impl Dispatch for EcGroup {
    const KIND: &'static str = "ec_group";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<EcGroup>)] = &[
            ("to-der", ec_group_to_der),
            ("to-pem", ec_group_to_pem),
            ("get-curve-oid", ec_group_curve_oid),
            ("get-p", ec_group_p),
            ("get-a", ec_group_a),
            ("get-b", ec_group_b),
            ("get-gx", ec_group_g_x),
            ("get-gy", ec_group_g_y),
            ("get-order", ec_group_order),
            ("equal", ec_group_equal),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table_is_unique() {
        let mut names = EcGroup::method_names();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(EcGroup::lookup("get-order").is_some());
        assert!(EcGroup::lookup("get_order").is_none());
    }

    #[test]
    fn test_equal_requires_a_group() {
        let err = get_ec_group(&[Arg::Str("secp256r1")], 0).err().expect("type");
        assert_eq!(err.kind(), ErrorKind::BadParameter);
    }

    #[test]
    fn test_from_name_rejects_nul() {
        let err = EcGroup::from_name("secp\0256r1").err().expect("nul");
        assert_eq!(err.kind(), ErrorKind::StringConversionError);
    }
}
