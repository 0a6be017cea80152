use std::future::Future;

use courier_api::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Error returned by business handlers. Only ever logged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Business callback invoked once per decoded record.
///
/// The token is the pool's cancellation signal; long handlers may watch it,
/// but the pool never interrupts a handler that is already running.
///
/// Implemented for async closures, so a handler is usually written as
/// `|ctx: CancellationToken, event: UserCreated| async move { ... }`.
pub trait Handler<T>: Send + Sync + 'static {
    fn handle(&self, ctx: CancellationToken, record: T) -> BoxFuture<'_, Result<(), BoxError>>;
}

impl<T, F, Fut, E> Handler<T> for F
where
    F: Fn(CancellationToken, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn handle(&self, ctx: CancellationToken, record: T) -> BoxFuture<'_, Result<(), BoxError>> {
        let fut = (self)(ctx, record);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
