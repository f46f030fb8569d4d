//! Static partitioning of cell ids across workers.

/// Split `items` into `parts` contiguous chunks whose lengths differ by at
/// most one, the longer chunks first. Never returns empty chunks, so fewer
/// than `parts` chunks come back when there are fewer items than parts.
pub fn partition<T: Clone>(items: &[T], parts: usize) -> Vec<Vec<T>> {
    let parts = parts.max(1).min(items.len());
    if parts == 0 {
        return Vec::new();
    }

    let base = items.len() / parts;
    let extra = items.len() % parts;

    let mut chunks = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        chunks.push(items[start..start + len].to_vec());
        start += len;
    }
    chunks
}
