//! Attribute values and attribute maps.

use alloc::{
    collections::BTreeMap,
    rc::Rc,
    string::{String, ToString},
};
use core::fmt;

use crate::{Style, host::Dom};

/// Event listener attached through an `on*` attribute.
pub type Listener<D> = Rc<dyn Fn(&<D as Dom>::Event)>;

/// Lifecycle callback (`attach` / `detach`) receiving the physical node.
pub type Callback<D> = Rc<dyn Fn(&<D as Dom>::Node)>;

/// Value of a single attribute.
pub enum Value<D: Dom> {
    /// No value; removes the attribute.
    Undefined,
    /// Explicit null; removes the attribute.
    Null,
    /// `true` sets a boolean attribute, `false` removes it.
    Bool(bool),
    /// Numeric value, stringified when applied.
    Number(f64),
    /// String value.
    Text(String),
    /// Callable accepted by `on*` attributes.
    Listener(Listener<D>),
    /// Callable accepted by the `attach` and `detach` lifecycle attributes.
    Callback(Callback<D>),
    /// Scoped style accepted by the `style` attribute.
    Style(Style),
}

impl<D: Dom> Value<D> {
    /// Wraps a closure as an event listener value.
    pub fn listener(listener: impl Fn(&D::Event) + 'static) -> Self {
        Self::Listener(Rc::new(listener))
    }

    /// Wraps a closure as a lifecycle callback value.
    pub fn callback(callback: impl Fn(&D::Node) + 'static) -> Self {
        Self::Callback(Rc::new(callback))
    }

    /// Returns `true` unless the value is [`Value::Undefined`].
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Returns `true` for `undefined`, `null` and `false`, the values that remove an
    /// attribute instead of setting it.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null | Self::Bool(false))
    }

    /// Returns the style carried by this value.
    #[must_use]
    pub const fn as_style(&self) -> Option<&Style> {
        match self {
            Self::Style(style) => Some(style),
            _ => None,
        }
    }

    /// Returns the string form used when the value is written as a DOM attribute.
    /// Callables and styles have no string form.
    #[must_use]
    pub fn to_attribute_string(&self) -> Option<String> {
        match self {
            Self::Undefined => Some("undefined".into()),
            Self::Null => Some("null".into()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Number(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
            Self::Listener(_) | Self::Callback(_) | Self::Style(_) => None,
        }
    }
}

impl<D: Dom> Clone for Value<D> {
    fn clone(&self) -> Self {
        match self {
            Self::Undefined => Self::Undefined,
            Self::Null => Self::Null,
            Self::Bool(value) => Self::Bool(*value),
            Self::Number(value) => Self::Number(*value),
            Self::Text(value) => Self::Text(value.clone()),
            Self::Listener(listener) => Self::Listener(listener.clone()),
            Self::Callback(callback) => Self::Callback(callback.clone()),
            Self::Style(style) => Self::Style(style.clone()),
        }
    }
}

impl<D: Dom> fmt::Debug for Value<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Number(value) => f.debug_tuple("Number").field(value).finish(),
            Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Self::Listener(_) => f.write_str("Listener(..)"),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Style(style) => f.debug_tuple("Style").field(&style.name()).finish(),
        }
    }
}

impl<D: Dom> From<&str> for Value<D> {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl<D: Dom> From<String> for Value<D> {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<D: Dom> From<bool> for Value<D> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<D: Dom> From<f64> for Value<D> {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<D: Dom> From<i32> for Value<D> {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl<D: Dom> From<u32> for Value<D> {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl<D: Dom> From<Style> for Value<D> {
    fn from(value: Style) -> Self {
        Self::Style(value)
    }
}

impl<D: Dom, T: Into<Self>> From<Option<T>> for Value<D> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// Attribute map of a logical node.
///
/// Names keep the spelling they were given with; every lookup and every reserved-name
/// check is case-insensitive.
pub struct Attributes<D: Dom> {
    entries: BTreeMap<String, Value<D>>,
}

impl<D: Dom> Attributes<D> {
    /// Creates an empty attribute map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds an attribute, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value<D>>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds an `on{event}` listener, builder style.
    #[must_use]
    pub fn on(self, event: &str, listener: impl Fn(&D::Event) + 'static) -> Self {
        self.with(alloc::format!("on{event}"), Value::listener(listener))
    }

    /// Adds the `attach` lifecycle callback, builder style.
    #[must_use]
    pub fn on_attach(self, callback: impl Fn(&D::Node) + 'static) -> Self {
        self.with("attach", Value::callback(callback))
    }

    /// Adds the `detach` lifecycle callback, builder style.
    #[must_use]
    pub fn on_detach(self, callback: impl Fn(&D::Node) + 'static) -> Self {
        self.with("detach", Value::callback(callback))
    }

    /// Sets an attribute, replacing any entry spelled the same way.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value<D>>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Looks an attribute up, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value<D>> {
        self.entries.get(name).or_else(|| {
            self.entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Returns the string value of an attribute, if it holds text.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the style assigned to the `style` attribute.
    #[must_use]
    pub fn style(&self) -> Option<&Style> {
        self.get("style").and_then(Value::as_style)
    }

    /// Returns the lifecycle callback stored under `name` (`attach` or `detach`).
    #[must_use]
    pub fn callback(&self, name: &str) -> Option<Callback<D>> {
        match self.get(name) {
            Some(Value::Callback(callback)) => Some(callback.clone()),
            _ => None,
        }
    }

    /// Iterates over all entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<D>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges a partial map into this one. Entries of `partial` win, including
    /// `Undefined` ones.
    pub fn merge(&mut self, partial: &Self) {
        for (name, value) in &partial.entries {
            let existing = self
                .entries
                .keys()
                .find(|key| key.eq_ignore_ascii_case(name))
                .cloned();
            if let Some(existing) = existing {
                self.entries.remove(&existing);
            }
            self.entries.insert(name.clone(), value.clone());
        }
    }
}

impl<D: Dom> Default for Attributes<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dom> Clone for Attributes<D> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<D: Dom> fmt::Debug for Attributes<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<D: Dom, K: Into<String>, V: Into<Value<D>>> FromIterator<(K, V)> for Attributes<D> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.set(name, value);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    type Attrs = Attributes<MemoryDocument>;

    #[test]
    fn lookup_ignores_case() {
        let attributes = Attrs::new().with("onClick", Value::listener(|_| {}));
        assert!(matches!(attributes.get("onclick"), Some(Value::Listener(_))));
    }

    #[test]
    fn merge_replaces_differently_cased_entry() {
        let mut attributes = Attrs::new().with("Title", "old");
        attributes.merge(&Attrs::new().with("title", "new"));
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.text("TITLE"), Some("new"));
    }

    #[test]
    fn absent_values() {
        assert!(Value::<MemoryDocument>::Undefined.is_absent());
        assert!(Value::<MemoryDocument>::Null.is_absent());
        assert!(Value::<MemoryDocument>::Bool(false).is_absent());
        assert!(!Value::<MemoryDocument>::Bool(true).is_absent());
        assert!(!Value::<MemoryDocument>::from(0).is_absent());
    }

    #[test]
    fn option_maps_to_undefined() {
        let value: Value<MemoryDocument> = Option::<&str>::None.into();
        assert!(!value.is_defined());
    }
}
