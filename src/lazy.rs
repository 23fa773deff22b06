use once_cell::sync::OnceCell;
use std::fmt;

/// Computes a value on first access and shares it afterwards.
///
/// Concurrent first callers may each run the initializer, but only one result
/// is published and every caller observes that same value.
pub struct LazyInitialized<T, F = fn() -> T> {
    cell: OnceCell<T>,
    init: F,
}

impl<T, F: Fn() -> T> LazyInitialized<T, F> {
    pub const fn new(init: F) -> Self {
        Self {
            cell: OnceCell::new(),
            init,
        }
    }

    pub fn get(&self) -> &T {
        if let Some(value) = self.cell.get() {
            return value;
        }
        let value = (self.init)();
        match self.cell.try_insert(value) {
            Ok(published) => published,
            Err((published, _lost)) => published,
        }
    }

    /// Returns the value only if it has already been computed.
    pub fn peek(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T: fmt::Debug, F> fmt::Debug for LazyInitialized<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInitialized")
            .field("value", &self.cell.get())
            .finish()
    }
}
