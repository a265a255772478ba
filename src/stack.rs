//! Stack growth for the recursive parts of the engine.
//!
//! Tree building, validation and evaluation all recurse once per nesting
//! level of the source. Each of those entry points runs its body through
//! [`ensure_sufficient_stack`], which moves onto a freshly allocated stack
//! segment when the current one runs low, so deeply nested but valid input
//! ends in a language error (nesting limit, call depth) rather than a host
//! stack overflow, whatever thread the engine runs on.

/// Space that must be left on the current stack before recursing further.
const RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first switching to a new stack segment if less than the red
/// zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Runs `f` with at least `size` bytes of stack available. Used around the
/// grammar, whose recursion cannot be interrupted from the outside.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn with_stack_of<R>(size: usize, f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(size, size * 2, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn with_stack_of<R>(_size: usize, f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: usize) -> usize {
        ensure_sufficient_stack(|| {
            let frame = [1u8; 512];
            if n == 0 {
                0
            } else {
                depth(n - 1) + frame[n % 512] as usize
            }
        })
    }

    #[test]
    fn deep_recursion_grows_the_stack() {
        let result = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| depth(20_000))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(result, 20_000);
    }

    #[test]
    fn runs_closure_with_requested_stack() {
        assert_eq!(with_stack_of(64 * 1024, || 7), 7);
    }
}
