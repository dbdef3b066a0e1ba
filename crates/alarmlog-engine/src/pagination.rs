//! Exhaustive retrieval over cursor-based paged APIs.

use std::future::Future;

use alarmlog_core::{Cursor, NotifierError, Page};
use tracing::debug;

/// Fetches every page of a listing, strictly one round at a time.
///
/// Each round sends the request carrying the previous page's cursor and
/// appends that page's items in arrival order. The loop ends at the first
/// page without a cursor. Any fetch error aborts the whole listing.
///
/// Returns the last request sent together with all items.
pub async fn paginate<R, T, F, Fut>(
    mut request: R,
    mut fetch: F,
) -> Result<(R, Vec<T>), NotifierError>
where
    R: Cursor + Clone,
    F: FnMut(R) -> Fut,
    Fut: Future<Output = Result<Page<T>, NotifierError>>,
{
    let mut items = Vec::new();
    let mut rounds = 0usize;

    loop {
        let page = fetch(request.clone()).await?;
        rounds += 1;
        items.extend(page.items);

        let Some(cursor) = page.cursor else { break };
        request.set_cursor(cursor);
    }

    debug!(rounds, count = items.len(), "Pagination complete");
    Ok((request, items))
}
