use tokio::runtime::{Handle, RuntimeFlavor};

/// Runs a blocking hardware call from inside a task.
///
/// On the multi-threaded runtime the worker thread is handed off first so the
/// other tasks keep running while the call is stuck on the bus. On a
/// current-thread runtime, or outside of a runtime, the call runs inline.
pub fn block_in_place<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_outside_of_runtime() {
        assert_eq!(block_in_place(|| 7), 7);
    }

    #[tokio::test]
    async fn runs_inline_on_current_thread_runtime() {
        assert_eq!(block_in_place(|| "inline"), "inline");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn hands_off_worker_on_multi_thread_runtime() {
        let value = block_in_place(|| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            11
        });
        assert_eq!(value, 11);
    }
}
