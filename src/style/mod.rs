//! Scoped CSS-in-Rust styles.
//!
//! A [`Style`] owns a class name and a set of rule groups keyed by selector. Assigning
//! a style to an element's `style` attribute adds its class name to the element's class
//! list; the CSS text itself reaches the document through a [`StyleSheet`].
//!
//! ```
//! use jsx_dom::{Rules, Style};
//!
//! let mut style = Style::new("box", Rules::new().with("backgroundColor", "red"));
//! style.select(":hover", Rules::new().with("color", "blue")).unwrap();
//! assert_eq!(
//!     style.to_string(),
//!     ".box{background-color:red}\n.box:hover{color:blue}"
//! );
//! ```

mod sheet;

pub use sheet::StyleSheet;

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::Error;

/// A single property value inside [`Rules`].
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Plain value written as `property:value`.
    Value(String),
    /// Nested property group, flattened into dash-joined property names.
    Nested(Rules),
    /// Omitted from the output.
    Undefined,
}

impl From<&str> for Rule {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Rule {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<f64> for Rule {
    fn from(value: f64) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<i32> for Rule {
    fn from(value: i32) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<Rules> for Rule {
    fn from(value: Rules) -> Self {
        Self::Nested(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Rule {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// Ordered property map of one selector. Keys are camel-case and are dash-cased when
/// the style is stringified.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rules {
    entries: IndexMap<String, Rule>,
}

impl Rules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with(mut self, property: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.set(property, rule);
        self
    }

    /// Sets a property, keeping its position when it already exists.
    pub fn set(&mut self, property: impl Into<String>, rule: impl Into<Rule>) {
        self.entries.insert(property.into(), rule.into());
    }

    /// Builds rules from a JSON object. Objects become nested groups, `null` becomes
    /// [`Rule::Undefined`], and every other scalar is written verbatim. Non-object input
    /// yields an empty rule set.
    #[must_use]
    pub fn from_json(value: &Json) -> Self {
        let Json::Object(object) = value else {
            return Self::new();
        };
        let mut rules = Self::new();
        for (property, value) in object {
            let rule = match value {
                Json::Null => Rule::Undefined,
                Json::String(text) => Rule::Value(text.clone()),
                Json::Object(_) => Rule::Nested(Self::from_json(value)),
                other => Rule::Value(other.to_string()),
            };
            rules.set(property.clone(), rule);
        }
        rules
    }

    /// Flattens the rules into `property:value` declarations.
    #[must_use]
    pub fn declarations(&self) -> Vec<String> {
        let mut list = Vec::new();
        self.flatten(None, &mut list);
        list
    }

    /// Returns `true` when no declaration survives omission of undefined values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|rule| match rule {
            Rule::Value(_) => false,
            Rule::Nested(nested) => nested.is_empty(),
            Rule::Undefined => true,
        })
    }

    fn flatten(&self, prefix: Option<&str>, list: &mut Vec<String>) {
        for (property, rule) in &self.entries {
            let name = dash_case(property);
            let path = prefix.map_or_else(|| name.clone(), |prefix| format!("{prefix}-{name}"));
            match rule {
                Rule::Value(value) => list.push(format!("{path}:{value}")),
                Rule::Nested(nested) => nested.flatten(Some(&path), list),
                Rule::Undefined => {}
            }
        }
    }
}

impl From<Json> for Rules {
    fn from(value: Json) -> Self {
        Self::from_json(&value)
    }
}

fn dash_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Scoped style: a class name plus rule groups keyed by selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    name: String,
    rules: IndexMap<String, Rules>,
}

impl Style {
    /// Creates a style whose root rules apply to `.{name}`.
    #[must_use]
    pub fn new(name: impl Into<String>, rules: impl Into<Rules>) -> Self {
        let name = name.into();
        let mut registered = IndexMap::new();
        registered.insert(format!(".{name}"), rules.into());
        Self {
            name,
            rules: registered,
        }
    }

    /// Class name added to elements using this style.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers rules for `.{name}{selector}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSelector`] when `selector` was already registered.
    pub fn select(&mut self, selector: &str, rules: impl Into<Rules>) -> Result<&mut Self, Error> {
        let path = format!(".{}{selector}", self.name);
        if self.rules.contains_key(&path) {
            return Err(Error::DuplicateSelector(selector.into()));
        }
        self.rules.insert(path, rules.into());
        Ok(self)
    }

    /// Returns `true` when no registered selector has a usable declaration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Rules::is_empty)
    }

    /// Registered selectors, in registration order.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (selector, rules) in &self.rules {
            let declarations = rules.declarations();
            if declarations.is_empty() {
                continue;
            }
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write!(f, "{selector}{{{}}}", declarations.join(";"))?;
        }
        Ok(())
    }
}
