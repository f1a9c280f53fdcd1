/// Builds a `Vec<Child<_>>` from anything convertible into a [`Child`](crate::Child).
///
/// ```
/// use jsx_dom::{Attributes, children, create, memory::MemoryDocument};
///
/// let document = MemoryDocument::new();
/// let item = create(&document, "li", Attributes::new(), children!["first"]);
/// let list = create(&document, "ul", Attributes::new(), children![&item, "tail", 3]);
/// assert_eq!(list.children().len(), 3);
/// ```
#[macro_export]
macro_rules! children {
    () => {
        ::std::vec::Vec::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),+]
    };
}
