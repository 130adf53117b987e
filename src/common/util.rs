use crossbeam_utils::sync::{Parker, Unparker};
use futures_util::{pin_mut, task::ArcWake};
use std::{
    future::Future,
    sync::Arc,
    task::{Context, Poll},
};

// ===============================================================================================
// Environment
// ===============================================================================================
#[doc(hidden)]
pub(crate) fn read_env(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) => value,
        Err(_) => default.to_string(),
    }
}

// ===============================================================================================
// Futures
// ===============================================================================================
/// Extension trait for blocking on a future from a non-async context. The
/// calling thread is parked until the future resolves; IO must be driven by
/// another runtime (the client owns one for exactly this purpose).
#[doc(hidden)]
pub trait Join: Future {
    fn join(self) -> <Self as Future>::Output;
}

impl<F: Future> Join for F {
    fn join(self) -> <Self as Future>::Output {
        struct ThreadWaker(Unparker);

        impl ArcWake for ThreadWaker {
            fn wake_by_ref(arc_self: &Arc<Self>) {
                arc_self.0.unpark();
            }
        }

        let parker = Parker::new();
        let waker = futures_util::task::waker(Arc::new(ThreadWaker(parker.unparker().clone())));
        let mut context = Context::from_waker(&waker);

        let future = self;
        pin_mut!(future);

        loop {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(output) => return output,
                Poll::Pending => parker.park(),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::common::util::{read_env, Join};

    #[test]
    fn join_returns_the_future_output() {
        let result = async { 40 + 2 }.join();
        assert_eq!(result, 42);
    }

    #[test]
    fn read_env_falls_back_to_default() {
        assert_eq!(read_env("MOCKSERVER_CLIENT_UNSET_VAR", "fallback"), "fallback");
    }
}
