//! Cooperative cancellation checkpoints.

use tokio_util::sync::CancellationToken;

use super::audit_types::{AuditError, AuditResult};

/// Return `Err(AuditError::Cancelled)` once the batch has been aborted.
///
/// Called right after every suspension point in a page task.
#[inline]
pub fn checkpoint(cancel: &CancellationToken) -> AuditResult<()> {
    if cancel.is_cancelled() {
        Err(AuditError::Cancelled)
    } else {
        Ok(())
    }
}

/// Await `operation` unless the batch is aborted first.
pub async fn unless_cancelled<F, T>(cancel: &CancellationToken, operation: F) -> AuditResult<T>
where
    F: std::future::Future<Output = T>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuditError::Cancelled),
        value = operation => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        assert!(checkpoint(&cancel).is_ok());
        cancel.cancel();
        assert!(matches!(checkpoint(&cancel), Err(AuditError::Cancelled)));
        let outcome = unless_cancelled(&cancel, std::future::pending::<()>()).await;
        assert!(matches!(outcome, Err(AuditError::Cancelled)));
    }
}
