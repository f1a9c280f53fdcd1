//! Attribute synchronization: attribute maps to element attributes, listeners and
//! class tokens.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use tracing::trace;

use crate::{
    Error, Style,
    host::Dom,
    value::{Attributes, Value},
};

/// Attached listeners of one element, at most one per event name.
pub(crate) struct EventRegistry<D: Dom> {
    entries: BTreeMap<String, D::Binding>,
}

impl<D: Dom> EventRegistry<D> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    fn take(&mut self, event: &str) -> Option<D::Binding> {
        self.entries.remove(event)
    }

    fn insert(&mut self, event: &str, binding: D::Binding) {
        self.entries.insert(event.into(), binding);
    }

    pub(crate) fn drain(&mut self) -> Vec<(String, D::Binding)> {
        core::mem::take(&mut self.entries).into_iter().collect()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Applies `attributes` to `element`.
///
/// `style` is the style currently applied to the element; its class token is removed
/// before a new `style` value is applied. The caller stores the resulting style.
/// Entries are applied one by one, so an error leaves the earlier entries applied.
pub(crate) fn synchronize<D: Dom>(
    document: &D,
    element: &D::Node,
    events: &mut EventRegistry<D>,
    attributes: &Attributes<D>,
    style: Option<&Style>,
) -> Result<(), Error> {
    for (attribute, value) in attributes.iter() {
        let name = attribute.to_ascii_lowercase();
        trace!(attribute = %name, "synchronize attribute");
        match name.as_str() {
            "attach" | "detach" => {}
            "style" => apply_style(document, element, style, value)?,
            _ => match name.strip_prefix("on").filter(|event| !event.is_empty()) {
                Some(event) => apply_listener(document, element, events, event, value)?,
                None => apply_attribute(document, element, &name, value)?,
            },
        }
    }
    Ok(())
}

fn apply_listener<D: Dom>(
    document: &D,
    element: &D::Node,
    events: &mut EventRegistry<D>,
    event: &str,
    value: &Value<D>,
) -> Result<(), Error> {
    if let Some(previous) = events.take(event) {
        document.remove_listener(element, event, &previous)?;
    }
    if value.is_absent() {
        return Ok(());
    }
    let Value::Listener(listener) = value else {
        return Err(Error::InvalidAttribute {
            name: event.into(),
            expected: "functions",
        });
    };
    let binding = document.add_listener(element, event, listener.clone())?;
    events.insert(event, binding);
    Ok(())
}

fn apply_style<D: Dom>(
    document: &D,
    element: &D::Node,
    current: Option<&Style>,
    value: &Value<D>,
) -> Result<(), Error> {
    if let Some(current) = current {
        document.remove_class(element, current.name())?;
    }
    if !value.is_defined() {
        return Ok(());
    }
    let Some(style) = value.as_style() else {
        return Err(Error::InvalidAttribute {
            name: "style".into(),
            expected: "Style objects",
        });
    };
    document.add_class(element, style.name())
}

fn apply_attribute<D: Dom>(
    document: &D,
    element: &D::Node,
    name: &str,
    value: &Value<D>,
) -> Result<(), Error> {
    if value.is_absent() {
        return document.remove_attribute(element, name);
    }
    if matches!(value, Value::Bool(true)) {
        return document.set_attribute(element, name, "");
    }
    let Some(text) = value.to_attribute_string() else {
        return Err(Error::InvalidAttribute {
            name: name.into(),
            expected: "strings, numbers and booleans",
        });
    };
    document.set_attribute(element, name, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rules, memory::MemoryDocument};

    type Attrs = Attributes<MemoryDocument>;

    fn element() -> (MemoryDocument, crate::memory::MemoryNode) {
        let document = MemoryDocument::new();
        let element = document.create_element("div", None).expect("element");
        (document, element)
    }

    #[test]
    fn plain_attributes_follow_boolean_convention() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let attributes = Attrs::new()
            .with("title", "hello")
            .with("hidden", true)
            .with("tabIndex", 3)
            .with("disabled", false);
        synchronize(&document, &element, &mut events, &attributes, None).expect("sync");
        assert_eq!(document.attribute(element, "title").as_deref(), Some("hello"));
        assert_eq!(document.attribute(element, "hidden").as_deref(), Some(""));
        assert_eq!(document.attribute(element, "tabindex").as_deref(), Some("3"));
        assert_eq!(document.attribute(element, "disabled"), None);

        let removal = Attrs::new().with("title", Value::Null);
        synchronize(&document, &element, &mut events, &removal, None).expect("sync");
        assert_eq!(document.attribute(element, "title"), None);
    }

    #[test]
    fn reserved_names_are_not_forwarded() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let attributes = Attrs::new()
            .on_attach(|_| {})
            .with("DETACH", Value::callback(|_| {}));
        synchronize(&document, &element, &mut events, &attributes, None).expect("sync");
        assert_eq!(document.outer_html(element), "<div></div>");
        assert!(events.events().is_empty());
    }

    #[test]
    fn listener_is_replaced_not_duplicated() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let attributes = Attrs::new().on("click", |_| {});
        synchronize(&document, &element, &mut events, &attributes, None).expect("first");
        synchronize(&document, &element, &mut events, &attributes, None).expect("second");
        assert_eq!(document.listener_count(element, "click"), 1);
        assert_eq!(events.events(), ["click"]);
    }

    #[test]
    fn non_callable_event_value_is_rejected() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let attributes = Attrs::new().with("onClick", "alert(1)");
        let error = synchronize(&document, &element, &mut events, &attributes, None)
            .expect_err("string listener");
        assert_eq!(
            error,
            Error::InvalidAttribute {
                name: "click".into(),
                expected: "functions",
            }
        );
    }

    #[test]
    fn undefined_listener_leaves_no_residue() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let attach = Attrs::new().on("click", |_| {});
        synchronize(&document, &element, &mut events, &attach, None).expect("attach");
        let clear = Attrs::new().with("onclick", Value::Undefined);
        synchronize(&document, &element, &mut events, &clear, None).expect("clear");
        assert_eq!(document.listener_count(element, "click"), 0);
        assert!(events.events().is_empty());
    }

    #[test]
    fn style_must_be_a_style() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let attributes = Attrs::new().with("style", "color: red");
        assert!(matches!(
            synchronize(&document, &element, &mut events, &attributes, None),
            Err(Error::InvalidAttribute { .. })
        ));
        assert_eq!(document.attribute(element, "style"), None);
    }

    #[test]
    fn style_swaps_class_tokens() {
        let (document, element) = element();
        let mut events = EventRegistry::new();
        let first = Style::new("first", Rules::new());
        let second = Style::new("second", Rules::new());
        synchronize(
            &document,
            &element,
            &mut events,
            &Attrs::new().with("style", first.clone()),
            None,
        )
        .expect("first");
        synchronize(
            &document,
            &element,
            &mut events,
            &Attrs::new().with("style", second),
            Some(&first),
        )
        .expect("second");
        assert_eq!(document.classes(element), ["second"]);
    }
}
