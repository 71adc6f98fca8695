use crate::Timer;

// - If it doesn't make sense to plumb Timer to a library call, return Warn<T>.
// - If a Timer is available and there's a Warn<T>, use get() or with_context().
// - If a Timer is available and something goes wrong, directly call warn().
/// A value plus the corrections or oddities noticed while producing it.
#[derive(Debug)]
pub struct Warn<T> {
    value: T,
    warnings: Vec<String>,
}

impl<T> Warn<T> {
    pub fn ok(value: T) -> Warn<T> {
        Warn {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn warn(value: T, warning: String) -> Warn<T> {
        Warn {
            value,
            warnings: vec![warning],
        }
    }

    pub fn warnings(value: T, warnings: Vec<String>) -> Warn<T> {
        Warn { value, warnings }
    }

    /// Logs the warnings and returns the value.
    pub fn unwrap(self) -> T {
        for line in self.warnings {
            warn!("{}", line);
        }
        self.value
    }

    pub fn get(self, timer: &mut Timer) -> T {
        for line in self.warnings {
            timer.warn(line);
        }
        self.value
    }

    pub fn with_context(self, timer: &mut Timer, context: String) -> T {
        for line in self.warnings {
            timer.warn(format!("{}: {}", context, line));
        }
        self.value
    }

    pub fn map<O, F: FnOnce(T) -> O>(self, f: F) -> Warn<O> {
        Warn {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Adds another warning.
    pub fn push(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn peek_warnings(&self) -> &Vec<String> {
        &self.warnings
    }

    /// Splits into the value and the warnings.
    pub fn consume(self) -> (T, Vec<String>) {
        (self.value, self.warnings)
    }
}
