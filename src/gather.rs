//! Bounded-concurrency map that preserves input order.
//!
//! Runs `f` over N items with at most `concurrency` futures in flight,
//! then reassembles the results into submission order via index tags —
//! never by completion order. This is the one concurrency primitive the
//! batch cycle uses; the index/metadata alignment depends on its
//! ordering contract.

use futures::stream::{self, StreamExt};
use std::future::Future;

pub async fn map_ordered<'a, T, R, Fut, F>(items: &'a [T], concurrency: usize, f: F) -> Vec<R>
where
    F: Fn(usize, &'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let tagged: Vec<(usize, R)> = stream::iter(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let fut = f(i, item);
                async move { (i, fut.await) }
            }),
    )
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;

    let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    for (i, result) in tagged {
        slots[i] = Some(result);
    }
    slots
        .into_iter()
        .map(|slot| slot.expect("every index tag is filled exactly once"))
        .collect()
}
