//! [`Lazy`], a single-threaded once-memo cell.

use std::cell::{OnceCell, RefCell};

/// Memoizes the output of an init closure, running it at most once.
///
/// The stored value is whatever the closure returns, including a `Result` in
/// the `Err` case: a failed computation is cached and replayed on every later
/// [`force`](Self::force), never retried. Callers that want retry semantics
/// must build a fresh `Lazy`.
pub struct Lazy<T, F = Box<dyn FnOnce() -> T>> {
    cell: OnceCell<T>,
    init: RefCell<Option<F>>,
}

impl<T, F> Lazy<T, F>
where
    F: FnOnce() -> T,
{
    /// Creates a new cell which will run `init` on first access.
    pub fn new(init: F) -> Self {
        Self {
            cell: OnceCell::new(),
            init: RefCell::new(Some(init)),
        }
    }

    /// Returns the memoized value, running the init closure if this is the
    /// first access.
    ///
    /// # Panics
    ///
    /// Panics if the init closure re-entrantly forces the same cell.
    pub fn force(&self) -> &T {
        self.cell.get_or_init(|| {
            let init = self
                .init
                .borrow_mut()
                .take()
                .expect("`Lazy` init closure re-entered");
            (init)()
        })
    }

    /// Returns the memoized value if it has already been computed.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T, F> std::fmt::Debug for Lazy<T, F>
where
    T: std::fmt::Debug,
    F: FnOnce() -> T,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => f.write_str("Lazy(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn runs_once() {
        let calls = Cell::new(0);
        let lazy = Lazy::new(|| {
            calls.set(calls.get() + 1);
            7
        });
        assert_eq!(None, lazy.get());
        assert_eq!(&7, lazy.force());
        assert_eq!(&7, lazy.force());
        assert_eq!(1, calls.get());
        assert_eq!(Some(&7), lazy.get());
    }

    #[test]
    fn caches_err_outcome() {
        let calls = Cell::new(0);
        let lazy = Lazy::new(|| -> Result<u32, String> {
            calls.set(calls.get() + 1);
            Err("boom".to_owned())
        });
        assert_eq!(&Err("boom".to_owned()), lazy.force());
        // The failure is memoized, not retried.
        assert_eq!(&Err("boom".to_owned()), lazy.force());
        assert_eq!(1, calls.get());
    }
}
