use num::Float;

/// Scale a vector to unit L2 norm in place.
/// A zero vector is left untouched.
#[inline]
pub fn l2_normalize<N: Float>(vec: &mut [N]) {
    let norm = vec.iter().fold(N::zero(), |acc, &x| acc + x * x).sqrt();
    if norm > N::zero() {
        for x in vec.iter_mut() {
            *x = *x / norm;
        }
    }
}

/// First `dim` components of `vec`, zero padded when `vec` is shorter
pub fn truncate_or_pad<N: Float>(vec: &[N], dim: usize) -> Vec<N> {
    let mut out = vec![N::zero(); dim];
    let len = vec.len().min(dim);
    out[..len].copy_from_slice(&vec[..len]);
    out
}

/// Component-wise mean of equally sized vectors.
/// Returns `None` when there is nothing to average.
pub fn mean<'a, N, I>(vecs: I) -> Option<Vec<N>>
where
    N: Float + 'a,
    I: IntoIterator<Item = &'a [N]>,
{
    let mut iter = vecs.into_iter();
    let mut sum = iter.next()?.to_vec();
    let mut count = 1usize;
    for vec in iter {
        debug_assert_eq!(vec.len(), sum.len(), "vectors must share a dimension");
        for (acc, &x) in sum.iter_mut().zip(vec) {
            *acc = *acc + x;
        }
        count += 1;
    }
    let count = <N as num::NumCast>::from(count)?;
    for acc in sum.iter_mut() {
        *acc = *acc / count;
    }
    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_to_unit_length() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0f64; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }

    #[test]
    fn truncate_and_pad() {
        assert_eq!(truncate_or_pad(&[1.0f32, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(truncate_or_pad(&[1.0f32, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(truncate_or_pad::<f32>(&[], 0), Vec::<f32>::new());
    }

    #[test]
    fn mean_of_vectors() {
        let a = [1.0f32, 2.0];
        let b = [3.0f32, 6.0];
        assert_eq!(mean([&a[..], &b[..]]), Some(vec![2.0, 4.0]));
        assert_eq!(mean::<f32, _>(Vec::<&[f32]>::new()), None);
    }
}
