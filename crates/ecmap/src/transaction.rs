use ecmap_core::{
    driver::{operation::Transaction, Connection},
    Result,
};

pub(crate) async fn start(connection: &mut dyn Connection) -> Result<()> {
    connection.exec(Transaction::Start.into()).await?;
    Ok(())
}

/// Commits when `result` is `Ok`, otherwise rolls back. A failed commit is
/// rolled back too.
pub(crate) async fn finish<T>(connection: &mut dyn Connection, result: Result<T>) -> Result<T> {
    let result = match result {
        Ok(value) => connection
            .exec(Transaction::Commit.into())
            .await
            .map(|_| value),
        Err(err) => Err(err),
    };

    if result.is_err() {
        if let Err(rollback) = connection.exec(Transaction::Rollback.into()).await {
            tracing::warn!(%rollback, "rollback failed");
        }
    }

    result
}
