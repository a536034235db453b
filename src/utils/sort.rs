use core::mem;

/// Map an `f64` to a `u64` whose unsigned order matches `f64::total_cmp`.
#[inline(always)]
fn order_key(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

/// Radix sort of weights, largest first.
/// - Orders like `f64::total_cmp`, reversed
/// - Stable for equal keys
///
/// Complexity: 8 passes, each O(n + 256)
#[inline]
pub fn radix_sort_f64_desc(vals: &mut [f64]) {
    let n = vals.len();
    if n <= 1 {
        return;
    }

    // Small sizes: insertion sort is often faster than allocating scratch.
    if n <= 32 {
        insertion_sort_desc(vals);
        return;
    }

    let mut keys: Vec<u64> = vals.iter().map(|v| !order_key(*v)).collect();
    let mut keys_tmp = vec![0u64; n];

    let mut src: &mut [u64] = &mut keys;
    let mut dst: &mut [u64] = &mut keys_tmp;

    // 8 passes: byte 0..7 (LSD)
    for shift in (0u32..64).step_by(8) {
        let mut count = [0usize; 256];

        for &k in src.iter() {
            count[((k >> shift) & 0xFF) as usize] += 1;
        }

        // Prefix sum -> starting positions
        let mut sum = 0usize;
        for c in count.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        // Distribute (stable)
        for &k in src.iter() {
            let b = ((k >> shift) & 0xFF) as usize;
            dst[count[b]] = k;
            count[b] += 1;
        }

        mem::swap(&mut src, &mut dst);
    }

    // Even pass count: the result is back in `keys`.
    for (v, k) in vals.iter_mut().zip(src.iter()) {
        *v = key_to_f64(!*k);
    }
}

#[inline(always)]
fn key_to_f64(key: u64) -> f64 {
    if key >> 63 == 1 {
        f64::from_bits(key & !(1 << 63))
    } else {
        f64::from_bits(!key)
    }
}

/// Tiny insertion sort for small n.
#[inline(always)]
fn insertion_sort_desc(vals: &mut [f64]) {
    for i in 1..vals.len() {
        let mut j = i;
        while j > 0 && vals[j].total_cmp(&vals[j - 1]).is_gt() {
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// The `n`-th largest weight (0-based), if the slice has that many entries.
pub fn nth_largest(vals: &[f64], n: usize) -> Option<f64> {
    if n >= vals.len() {
        return None;
    }
    let mut sorted = vals.to_vec();
    radix_sort_f64_desc(&mut sorted);
    Some(sorted[n])
}
