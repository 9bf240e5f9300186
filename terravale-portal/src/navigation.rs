//! Client-side navigation

/// Router capability
pub trait Navigator {
    fn navigate(&mut self, path: &str);
    fn current(&self) -> Option<&str>;
}

/// Navigator that records every visited path
#[derive(Debug, Clone, Default)]
pub struct HistoryNavigator {
    history: Vec<String>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&mut self, path: &str) {
        self.history.push(path.to_string());
    }

    fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }
}
