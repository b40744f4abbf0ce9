//! Racing collaborator calls against caller cancellation.

use crate::core::{DocumentError, DocumentResult};

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Awaits `fut` unless `cancel` fires first, in which case the future is
/// dropped and `DocumentError::Cancelled` is returned.
pub(crate) async fn cancellable<F, T, E>(cancel: &CancellationToken, fut: F) -> DocumentResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DocumentError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DocumentError::Cancelled),
        result = fut => result.map_err(Into::into),
    }
}

/// Fails with `DocumentError::Cancelled` if `cancel` has fired.
///
/// Used right before a commit, which is never raced: a commit that was
/// started is allowed to finish.
pub(crate) fn ensure_active(cancel: &CancellationToken) -> DocumentResult<()> {
    if cancel.is_cancelled() {
        return Err(DocumentError::Cancelled);
    }
    Ok(())
}
