//! Integer square root.

/// Floor of the square root of `n`, by binary search.
///
/// The inner test is `mid <= n / mid` rather than `mid * mid <= n`, so no
/// intermediate product can overflow for any 64-bit input.
pub fn isqrt64(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }

    let mut lo = 1u64;
    let mut hi = n;

    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if mid <= n / mid {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    lo
}
