//! Reed-Solomon codec over GF(256).
//!
//! Encoding is remainder computation against the degree-k generator.
//! Decoding runs the extended Euclidean algorithm on (x^k, S(x)) to obtain
//! the error locator and evaluator, then Forney's formula for magnitudes.

use crate::codec::gf256::{
    self, degree, generator, is_zero, poly_add, poly_divmod, poly_eval, poly_mul,
    poly_mul_monomial, poly_mul_scalar, poly_remainder, Gf256,
};
use crate::error::QrError;

/// Append-style encoder: returns the `ecc_len` parity bytes for `data`.
pub fn encode(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let g = generator(ecc_len);
    let shifted = poly_mul_monomial(&gf256::strip(data), ecc_len);
    let rem = poly_remainder(&shifted, &g);
    // The remainder may have fewer than ecc_len coefficients; left-pad.
    let mut ecc = vec![0u8; ecc_len];
    let rem = if is_zero(&rem) { Vec::new() } else { rem };
    ecc[ecc_len - rem.len()..].copy_from_slice(&rem);
    ecc
}

/// Correct up to `ecc_len / 2` byte errors in place.
///
/// `codeword` holds data followed by parity, highest-degree coefficient
/// first (index 0 is the coefficient of x^(n-1)).
pub fn decode(codeword: &mut [u8], ecc_len: usize) -> Result<(), QrError> {
    let n = codeword.len();
    if ecc_len == 0 || n <= ecc_len {
        return Err(QrError::RsUndecodable);
    }

    let syndromes = compute_syndromes(codeword, ecc_len);
    if syndromes.iter().all(|&s| s == 0) {
        return Ok(());
    }

    let (locator, evaluator) = euclid(&syndromes, ecc_len)?;

    // Roots of the locator are the inverses of the error locations.
    let mut positions = Vec::new();
    for i in 1..=255usize {
        if poly_eval(&locator, Gf256::exp(i)) == 0 {
            let loc = (255 - i) % 255;
            if loc >= n {
                return Err(QrError::RsUndecodable);
            }
            positions.push(loc);
        }
    }
    if positions.len() != degree(&locator) {
        return Err(QrError::RsUndecodable);
    }

    // Forney: e_i = omega(X_i^-1) / prod_{j != i} (1 + X_j * X_i^-1).
    for (i, &loc) in positions.iter().enumerate() {
        let x_inv = Gf256::exp(255 - loc);
        let num = poly_eval(&evaluator, x_inv);
        let mut den = 1u8;
        for (j, &other) in positions.iter().enumerate() {
            if j != i {
                den = Gf256::mul(den, 1 ^ Gf256::mul(Gf256::exp(other), x_inv));
            }
        }
        if den == 0 {
            return Err(QrError::RsUndecodable);
        }
        codeword[n - 1 - loc] ^= Gf256::mul(num, Gf256::inv(den));
    }

    // The corrected word must have a clean syndrome.
    if compute_syndromes(codeword, ecc_len).iter().any(|&s| s != 0) {
        return Err(QrError::RsUndecodable);
    }
    Ok(())
}

/// S_i = codeword(alpha^i) for i in 0..ecc_len.
fn compute_syndromes(codeword: &[u8], ecc_len: usize) -> Vec<u8> {
    (0..ecc_len)
        .map(|i| poly_eval(codeword, Gf256::exp(i)))
        .collect()
}

/// Extended Euclidean algorithm on (x^k, S(x)), stopping once
/// 2 * deg(r) < k. Returns (locator, evaluator) normalized to
/// locator(0) = 1.
fn euclid(syndromes: &[u8], ecc_len: usize) -> Result<(Vec<u8>, Vec<u8>), QrError> {
    // S(x) with S_0 as the constant term, highest degree first.
    let mut s: Vec<u8> = syndromes.to_vec();
    s.reverse();
    let s = gf256::strip(&s);

    let mut r_prev = poly_mul_monomial(&[1], ecc_len);
    let mut r = s;
    let mut t_prev: Vec<u8> = vec![0];
    let mut t: Vec<u8> = vec![1];

    while !is_zero(&r) && 2 * degree(&r) >= ecc_len {
        let (q, rem) = poly_divmod(&r_prev, &r);
        let t_next = poly_add(&t_prev, &poly_mul(&q, &t));
        r_prev = std::mem::replace(&mut r, rem);
        t_prev = std::mem::replace(&mut t, t_next);
    }

    // locator(0) is the lowest coefficient of t.
    let c = *t.last().unwrap_or(&0);
    if c == 0 {
        return Err(QrError::RsUndecodable);
    }
    let c_inv = Gf256::inv(c);
    Ok((poly_mul_scalar(&t, c_inv), poly_mul_scalar(&r, c_inv)))
}
