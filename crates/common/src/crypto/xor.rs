/// Combine two byte strings with a byte-wise XOR.
///
/// The output is as long as the longer input. The first `min(a.len(), b.len())`
/// bytes are `a[i] ^ b[i]`; the rest is copied from the tail of the longer input.
/// The result does not depend on argument order, for any pair of lengths.
pub fn xor_combine(a: &[u8], b: &[u8]) -> Vec<u8> {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut out = longer.to_vec();
    for (o, s) in out.iter_mut().zip(shorter) {
        *o ^= s;
    }
    out
}
