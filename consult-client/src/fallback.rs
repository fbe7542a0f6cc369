use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Runs `attempt` over `options` in order and returns the first success
/// together with the option that produced it. Sleeps `pause` between a
/// failure and the next try. Every failure is returned if none succeed.
pub async fn first_success<O, T, E, F, Fut>(
    options: impl IntoIterator<Item = O>,
    pause: Duration,
    mut attempt: F,
) -> Result<(O, T), Vec<E>>
where
    O: Clone + std::fmt::Debug,
    E: std::fmt::Display,
    F: FnMut(O) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();

    for option in options {
        if !failures.is_empty() && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        match attempt(option.clone()).await {
            Ok(value) => return Ok((option, value)),
            Err(e) => {
                debug!("Attempt {:?} failed: {}", option, e);
                failures.push(e);
            }
        }
    }

    Err(failures)
}
