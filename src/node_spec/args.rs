/// A single `--name [value]` process flag.
///
/// Names are stored without the leading dashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub value: Option<String>,
}

impl Flag {
    pub fn new(
        name: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let name = name.into();
        let name = name.trim_start_matches('-').to_string();
        Self { name, value }
    }
}

/// Ordered list of process flags, serialized to argv only at the launcher
/// boundary.
///
/// Order is preserved for readability of logs; the launched programs do not
/// depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    flags: Vec<Flag>,
}

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a valueless flag
    pub fn flag(
        &mut self,
        name: impl Into<String>,
    ) -> &mut Self {
        self.flags.push(Flag::new(name, None));
        self
    }

    /// Appends a flag with a value
    pub fn option(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.flags.push(Flag::new(name, Some(value.into())));
        self
    }

    pub fn with_flag(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.flag(name);
        self
    }

    pub fn with_option(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.option(name, value);
        self
    }

    pub fn push(
        &mut self,
        flag: Flag,
    ) {
        self.flags.push(flag);
    }

    pub fn extend(
        &mut self,
        other: ArgList,
    ) {
        self.flags.extend(other.flags);
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        let name = name.trim_start_matches('-');
        self.flags.iter().any(|f| f.name == name)
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Flag> {
        let name = name.trim_start_matches('-');
        self.flags.iter().find(|f| f.name == name)
    }

    /// Value of the first flag called `name`
    pub fn value_of(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.get(name).and_then(|f| f.value.as_deref())
    }

    pub fn remove(
        &mut self,
        name: &str,
    ) {
        let name = name.trim_start_matches('-');
        self.flags.retain(|f| f.name != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// `--name value` pairs; empty values are dropped so that `("x", "")`
    /// renders as the bare switch `--x`.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.flags.len() * 2);
        for flag in &self.flags {
            argv.push(format!("--{}", flag.name));
            if let Some(value) = flag.value.as_ref().filter(|v| !v.is_empty()) {
                argv.push(value.clone());
            }
        }
        argv
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for ArgList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            flags: iter
                .into_iter()
                .map(|(k, v)| Flag::new(k, v.map(Into::into)))
                .collect(),
        }
    }
}
