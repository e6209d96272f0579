// Copyright (C) Microsoft Corporation. All rights reserved.

//! ZFEC forward error correction: any `k` of `n` shares rebuild the input.

use crate::ffi;
use crate::safeapi::error::*;

const MAX_SHARES: usize = 256;

fn check_params(k: usize, n: usize) -> BotanResult<()> {
    if k == 0 || k > n || n > MAX_SHARES {
        Err(BotanError::InvalidArgument(format!(
            "zfec needs 1 <= k <= n <= {MAX_SHARES}, got k={k} n={n}"
        )))?;
    }
    Ok(())
}

/// Splits `input` into `n` shares. The input length must be a multiple of
/// `k`; each share is `input.len() / k` bytes.
pub fn encode(k: usize, n: usize, input: &[u8]) -> BotanResult<Vec<Vec<u8>>> {
    check_params(k, n)?;
    if input.len() % k != 0 {
        Err(BotanError::InvalidArgument(format!(
            "input length {} is not a multiple of k={k}",
            input.len()
        )))?;
    }

    let share_size = input.len() / k;
    let mut shares = vec![vec![0u8; share_size]; n];
    let mut outputs: Vec<*mut u8> = shares.iter_mut().map(|share| share.as_mut_ptr()).collect();

    let encode = ffi::library()?.botan_zfec_encode()?;
    // SAFETY: `outputs` holds `n` buffers of `share_size` bytes each, all
    // alive for the duration of the call.
    check(unsafe { encode(k, n, input.as_ptr(), input.len(), outputs.as_mut_ptr()) })?;
    Ok(shares)
}

/// Rebuilds the `k` primary shares from any `k` shares, given with their
/// share index. Shares beyond the first `k` are ignored.
pub fn decode(k: usize, n: usize, shares: &[(usize, &[u8])]) -> BotanResult<Vec<Vec<u8>>> {
    check_params(k, n)?;
    if shares.len() < k {
        Err(BotanError::InvalidArgument(format!(
            "zfec decode needs {k} shares, got {}",
            shares.len()
        )))?;
    }

    let shares = &shares[..k];
    let share_size = shares[0].1.len();
    for (index, share) in shares {
        if *index >= n {
            Err(BotanError::InvalidArgument(format!("share index {index} out of range for n={n}")))?;
        }
        if share.len() != share_size {
            Err(BotanError::InvalidArgument(format!(
                "share {index} has {} bytes, expected {share_size}",
                share.len()
            )))?;
        }
    }

    let indexes: Vec<usize> = shares.iter().map(|(index, _)| *index).collect();
    let inputs: Vec<*const u8> = shares.iter().map(|(_, share)| share.as_ptr()).collect();
    let mut outputs_data = vec![vec![0u8; share_size]; k];
    let mut outputs: Vec<*mut u8> = outputs_data.iter_mut().map(|out| out.as_mut_ptr()).collect();

    let decode = ffi::library()?.botan_zfec_decode()?;
    // SAFETY: `indexes` and `inputs` hold `k` entries; every input and
    // output buffer is `share_size` bytes and outlives the call.
    check(unsafe {
        decode(
            k,
            n,
            indexes.as_ptr(),
            inputs.as_ptr(),
            share_size,
            outputs.as_mut_ptr(),
        )
    })?;
    Ok(outputs_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_are_validated_first() {
        for (k, n) in [(0, 3), (4, 3), (3, 257)] {
            let err = encode(k, n, &[0u8; 12]).err().expect("bad params");
            assert!(matches!(err, BotanError::InvalidArgument(_)), "k={k} n={n}");
        }
    }

    #[test]
    fn test_encode_requires_multiple_of_k() {
        let err = encode(3, 5, &[0u8; 10]).err().expect("length");
        assert_eq!(err.kind(), ErrorKind::BadParameter);
    }

    #[test]
    fn test_decode_checks_shares() {
        let a = [1u8; 4];
        let b = [2u8; 4];
        let short = [3u8; 3];

        let err = decode(3, 5, &[(0, &a[..]), (1, &b[..])]).err().expect("too few");
        assert!(err.to_string().contains("needs 3 shares"));

        let err = decode(2, 5, &[(0, &a[..]), (1, &short[..])]).err().expect("uneven");
        assert!(matches!(err, BotanError::InvalidArgument(_)));

        let err = decode(2, 5, &[(0, &a[..]), (5, &b[..])]).err().expect("index");
        assert!(err.to_string().contains("out of range"));
    }
}
