use alloc::vec::Vec;

use crate::{
    Child, Component, Context, Source,
    host::Dom,
    value::Attributes,
};

/// Component rendering its [`Style`](crate::Style) children into a
/// `<style type="text/css">` element.
///
/// An optional `media` attribute is forwarded to the element.
///
/// ```
/// use jsx_dom::{Attributes, Rules, Style, StyleSheet, create, memory::MemoryDocument, render};
///
/// let document = MemoryDocument::new();
/// let style = Style::new("title", Rules::new().with("fontWeight", "bold"));
/// let sheet = create(&document, StyleSheet, Attributes::new(), vec![style.into()]);
/// render(&sheet, &document.container()).unwrap();
/// assert_eq!(
///     document.inner_html(document.container()),
///     r#"<style type="text/css">.title{font-weight:bold}</style>"#
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleSheet;

impl<D: Dom> Component<D> for StyleSheet {
    fn render(&self, context: &Context<D>) -> Child<D> {
        let mut attributes = Attributes::new().with("type", "text/css");
        if let Some(media) = context.attribute("media").filter(|media| media.is_defined()) {
            attributes.set("media", media.clone());
        }
        let styles: Vec<Child<D>> = context.children().to_vec();
        Child::Node(context.create("style", attributes, styles))
    }
}

impl<D: Dom> From<StyleSheet> for Source<D> {
    fn from(sheet: StyleSheet) -> Self {
        Self::component(sheet)
    }
}
