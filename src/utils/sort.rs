use std::cmp::Ordering;

/// Keep the `n` items with the highest key, best first.
///
/// The sort is stable: items with equal keys keep their input order.
/// Keys are compared with `total_cmp`, so a NaN never panics.
pub fn top_n_desc_by_key<T, F>(mut items: Vec<T>, n: usize, key: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| desc(key(a), key(b)));
    items.truncate(n);
    items
}

#[inline]
fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
