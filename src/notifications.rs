/// Dismissible list of user-facing error messages.
///
/// Messages are kept in arrival order and removed one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorFeed {
    errors: Vec<String>,
}

impl ErrorFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message. Blank messages are ignored.
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.trim().is_empty() {
            self.errors.push(message);
        }
    }

    /// Picks up a controller's error field, if set. Returns whether anything was added.
    pub fn collect(&mut self, error: Option<String>) -> bool {
        match error {
            Some(message) if !message.trim().is_empty() => {
                self.errors.push(message);
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self, index: usize) -> Option<String> {
        (index < self.errors.len()).then(|| self.errors.remove(index))
    }

    /// Removes and returns everything, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
