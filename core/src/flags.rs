use std::collections::BTreeMap;

/// Flag values exactly as the user typed them, keyed by long flag name.
///
/// Only flags that were actually given are present, so "absent" and
/// "explicitly empty" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFlags {
    values: BTreeMap<String, String>,
}

impl RawFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Records a switch only when it is on.
    pub fn set_switch(&mut self, name: impl Into<String>, on: bool) {
        if on {
            self.set(name, "true");
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

impl<K, V> FromIterator<(K, V)> for RawFlags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut flags = RawFlags::new();
        for (name, value) in iter {
            flags.set(name, value);
        }
        flags
    }
}
