use std::{fmt::Display, future::Future, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::WorkerError;

/// Errores que el retry sabe clasificar.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for WorkerError {
    fn is_transient(&self) -> bool {
        WorkerError::is_transient(self)
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    Cancelled,
    /// Se agotaron los intentos; `last` es el último error transitorio.
    Exhausted { attempts: u32, last: E },
    /// Error no transitorio: no se reintenta.
    Fatal(E),
}

/// Reintentos con espera fija. Sin `max_attempts` reintenta para siempre
/// (hasta que se cancele el token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    pub async fn run<T, E, F, Fut>(
        &self,
        what: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let result = tokio::select! {
                r = op() => r,
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            };

            let err = match result {
                Ok(v) => return Ok(v),
                Err(e) if !e.is_transient() => return Err(RetryError::Fatal(e)),
                Err(e) => e,
            };

            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            warn!(
                "{} falló (intento {}): {}. Reintentando en {:?}",
                what, attempt, err, self.delay
            );
            if !sleep_or_cancel(self.delay, cancel).await {
                return Err(RetryError::Cancelled);
            }
        }
    }
}

/// Duerme `delay`; devuelve `false` si el token se canceló antes.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}
