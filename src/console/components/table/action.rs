/// A keyboard shortcut advertised in the table footer.
pub struct Action<T> {
    pub name: String,
    pub shortcut: String,
    pub enabled: Box<dyn Fn(Option<&T>) -> bool>,
}

impl<T> Action<T> {
    pub fn new<N: Into<String>, S: Into<String>>(
        name: N,
        shortcut: S,
        enabled: Box<dyn Fn(Option<&T>) -> bool>,
    ) -> Self {
        Self {
            name: name.into(),
            shortcut: shortcut.into(),
            enabled,
        }
    }

    pub fn always<N: Into<String>, S: Into<String>>(name: N, shortcut: S) -> Self {
        Self::new(name, shortcut, Box::new(|_| true))
    }

    pub fn is_enabled(&self, item: Option<&T>) -> bool {
        (self.enabled)(item)
    }
}
