use alloc::{rc::Rc, vec, vec::Vec};
use core::cell::Cell;

use serde_json::json;

use crate::{
    Attributes, Child, Component, Context, Error, Fragment, Kind, Node, Phase, Rules, Source,
    State, Style, children, create,
    memory::{MemoryDocument, MemoryNode},
    render, resolve_reference, resolve_trailing_reference,
    value::Value,
};

type Attrs = Attributes<MemoryDocument>;

fn element(
    document: &MemoryDocument,
    tag: &str,
    children: Vec<Child<MemoryDocument>>,
) -> Node<MemoryDocument> {
    create(document, tag, Attrs::new(), children)
}

fn text(document: &MemoryDocument, content: &str) -> Node<MemoryDocument> {
    create(document, Source::Text(content.into()), Attrs::new(), Vec::new())
}

fn reference(node: &Node<MemoryDocument>) -> MemoryNode {
    node.reference().expect("constructed node")
}

#[derive(Default)]
struct Counts {
    attached: Cell<usize>,
    detached: Cell<usize>,
}

fn counted(document: &MemoryDocument, tag: &str, counts: &Rc<Counts>) -> Node<MemoryDocument> {
    let on_attach = counts.clone();
    let on_detach = counts.clone();
    create(
        document,
        tag,
        Attrs::new()
            .on_attach(move |_| on_attach.attached.set(on_attach.attached.get() + 1))
            .on_detach(move |_| on_detach.detached.set(on_detach.detached.get() + 1)),
        Vec::new(),
    )
}

#[test]
fn construct_builds_subtree_and_attributes() {
    let document = MemoryDocument::new();
    let node = create(
        &document,
        "a",
        Attrs::new().with("href", "/home").with("draggable", true),
        children!["home"],
    );
    assert_eq!(node.phase(), Phase::Unconstructed);
    assert_eq!(node.reference(), None);
    node.construct().expect("construct");
    assert!(node.is_ready());
    assert_eq!(
        document.outer_html(reference(&node)),
        r#"<a draggable href="/home">home</a>"#
    );
}

#[test]
fn composite_nodes_never_own_a_reference() {
    let document = MemoryDocument::new();
    let fragment = create(&document, Fragment, Attrs::new(), children!["a", "b"]);
    fragment.construct().expect("construct");
    assert_eq!(fragment.kind(), Kind::Fragment);
    assert!(fragment.is_ready());
    assert_eq!(fragment.reference(), None);
    assert!(fragment.children().iter().all(Node::is_ready));
}

#[test]
fn namespaced_and_customized_elements() {
    let document = MemoryDocument::new();
    let svg = create(
        &document,
        "svg",
        Attrs::new().with("xmlns", "http://www.w3.org/2000/svg"),
        Vec::new(),
    );
    let button = create(
        &document,
        "button",
        Attrs::new().with("is", "fancy-button"),
        Vec::new(),
    );
    svg.construct().expect("svg");
    button.construct().expect("button");
    assert_eq!(
        document.namespace(reference(&svg)).as_deref(),
        Some("http://www.w3.org/2000/svg")
    );
    assert_eq!(document.namespace(reference(&button)), None);
    assert_eq!(document.is(reference(&button)).as_deref(), Some("fancy-button"));
}

#[test]
fn repeated_listener_refresh_keeps_one_listener() {
    let document = MemoryDocument::new();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    let button = create(
        &document,
        "button",
        Attrs::new().on("click", move |_| counter.set(counter.get() + 1)),
        Vec::new(),
    );
    button.construct().expect("construct");

    let counter = clicks.clone();
    let update = Attrs::new().on("click", move |_| counter.set(counter.get() + 10));
    button.refresh(&update).expect("first refresh");
    button.refresh(&update).expect("second refresh");

    assert_eq!(document.listener_count(reference(&button), "click"), 1);
    assert_eq!(button.listeners(), ["click"]);
    assert_eq!(document.dispatch(reference(&button), "click"), 1);
    assert_eq!(clicks.get(), 10);
}

#[test]
fn non_function_listener_fails_construction() {
    let document = MemoryDocument::new();
    let button = create(
        &document,
        "button",
        Attrs::new().with("onClick", 42),
        Vec::new(),
    );
    assert_eq!(
        button.construct(),
        Err(Error::InvalidAttribute {
            name: "click".into(),
            expected: "functions",
        })
    );
}

#[test]
fn clearing_a_listener_leaves_none() {
    let document = MemoryDocument::new();
    let button = create(&document, "button", Attrs::new().on("click", |_| {}), Vec::new());
    button.construct().expect("construct");
    button
        .refresh(&Attrs::new().with("onClick", Value::Undefined))
        .expect("refresh");
    assert_eq!(document.listener_count(reference(&button), "click"), 0);
    assert!(button.listeners().is_empty());
}

#[test]
fn style_swap_keeps_one_class() {
    let document = MemoryDocument::new();
    let first = Style::new("first", Rules::new().with("color", "red"));
    let second = Style::new("second", Rules::new().with("color", "blue"));
    let node = create(
        &document,
        "div",
        Attrs::new().with("style", first.clone()),
        Vec::new(),
    );
    node.construct().expect("construct");
    assert_eq!(document.classes(reference(&node)), ["first"]);
    assert_eq!(node.style(), Some(first));

    node.refresh(&Attrs::new().with("style", second.clone()))
        .expect("refresh");
    assert_eq!(document.classes(reference(&node)), ["second"]);
    assert_eq!(node.style(), Some(second));

    node.refresh(&Attrs::new().with("style", Value::Undefined))
        .expect("clear");
    assert!(document.classes(reference(&node)).is_empty());
    assert_eq!(node.style(), None);
}

#[test]
fn insert_then_remove_restores_markup() {
    let document = MemoryDocument::new();
    let first = text(&document, "first");
    let last = text(&document, "last");
    let list = element(&document, "div", children![&first, &last]);
    list.construct().expect("construct");
    let before = document.outer_html(reference(&list));

    let counts = Rc::new(Counts::default());
    let middle = counted(&document, "hr", &counts);
    middle.construct().expect("construct middle");
    list.insert(&middle, Some(&first)).expect("insert");
    assert_eq!(document.outer_html(reference(&list)), "<div>first<hr></hr>last</div>");
    assert_eq!(middle.parent(), Some(list.clone()));

    list.remove(&middle).expect("remove");
    assert_eq!(document.outer_html(reference(&list)), before);
    assert_eq!(middle.parent(), None);
    assert_eq!(counts.attached.get(), 1);
    assert_eq!(counts.detached.get(), 1);
}

#[test]
fn fragment_inserted_first_precedes_existing_children() {
    let document = MemoryDocument::new();
    let list = element(&document, "div", children!["x"]);
    list.construct().expect("construct");

    let fragment = create(&document, Fragment, Attrs::new(), children!["a", "b"]);
    fragment.construct().expect("construct fragment");
    list.insert(&fragment, None).expect("insert");

    assert_eq!(document.inner_html(reference(&list)), "abx");
    let texts: Vec<_> = fragment.children().iter().map(reference).collect();
    assert_eq!(resolve_reference(&fragment), texts.first().copied());
    assert_eq!(resolve_trailing_reference(&fragment), texts.last().copied());
}

#[test]
fn insertion_skips_physically_empty_siblings() {
    let document = MemoryDocument::new();
    let head = text(&document, "head");
    let empty = create(&document, Fragment, Attrs::new(), Vec::new());
    let list = element(&document, "div", children![&head, &empty, "tail"]);
    list.construct().expect("construct");

    let inserted = text(&document, "+");
    inserted.construct().expect("construct text");
    list.insert(&inserted, Some(&empty)).expect("insert");

    assert_eq!(document.inner_html(reference(&list)), "head+tail");
    assert_eq!(resolve_reference(&empty), None);
}

#[test]
fn composite_children_attach_and_detach_once() {
    let document = MemoryDocument::new();
    let counts = Rc::new(Counts::default());
    let fragment = create(
        &document,
        Fragment,
        Attrs::new(),
        children![counted(&document, "i", &counts), counted(&document, "b", &counts)],
    );
    let list = element(&document, "p", Vec::new());
    list.construct().expect("construct list");
    fragment.construct().expect("construct fragment");

    list.insert(&fragment, None).expect("insert");
    assert_eq!(counts.attached.get(), 2);
    assert_eq!(counts.detached.get(), 0);

    list.remove(&fragment).expect("remove");
    assert_eq!(counts.attached.get(), 2);
    assert_eq!(counts.detached.get(), 2);
    assert_eq!(document.inner_html(reference(&list)), "");
}

#[test]
fn structural_errors() {
    let document = MemoryDocument::new();
    let list = element(&document, "ul", Vec::new());
    list.construct().expect("construct");
    let stranger = text(&document, "stranger");
    let child = text(&document, "child");

    assert_eq!(
        list.insert(&child, None),
        Err(Error::Structural("node has not been constructed"))
    );
    child.construct().expect("construct child");
    assert_eq!(
        list.insert(&child, Some(&stranger)),
        Err(Error::Structural("node is not a child"))
    );
    assert_eq!(
        list.remove(&stranger),
        Err(Error::Structural("node is not a child"))
    );
    list.insert(&child, None).expect("insert");
    assert_eq!(
        list.insert(&child, None),
        Err(Error::Structural("node already has a parent"))
    );
}

#[test]
fn insertion_after_an_unplaced_sibling_fails() {
    let document = MemoryDocument::new();
    let a = text(&document, "a");
    let b = text(&document, "b");
    let list = element(&document, "div", children![&a, &b]);
    list.construct().expect("construct");
    b.destruct().expect("destruct");

    let c = text(&document, "c");
    c.construct().expect("construct c");
    assert_eq!(
        list.insert(&c, Some(&b)),
        Err(Error::Structural("sibling has no physical reference"))
    );
    assert_eq!(c.parent(), None);
    assert_eq!(list.children(), [a, b]);
}

#[test]
fn insertion_after_a_fragment_with_an_unplaced_child_fails() {
    let document = MemoryDocument::new();
    let head = text(&document, "head");
    let list = element(&document, "div", children![&head]);
    list.construct().expect("construct");

    let pending = text(&document, "pending");
    let group = create(&document, Fragment, Attrs::new(), children![&pending]);
    group.construct().expect("construct group");
    list.insert(&group, Some(&head)).expect("insert group");
    pending.destruct().expect("destruct");

    let tail = text(&document, "tail");
    tail.construct().expect("construct tail");
    assert_eq!(
        list.insert(&tail, Some(&group)),
        Err(Error::Structural("sibling has no physical reference"))
    );
}

#[test]
fn text_refresh_updates_content() {
    let document = MemoryDocument::new();
    let node = text(&document, "before");
    node.construct().expect("construct");
    node.refresh(&Attrs::new().with("content", "after"))
        .expect("refresh");
    assert_eq!(document.text(reference(&node)).as_deref(), Some("after"));
}

#[test]
fn destruct_removes_listeners_and_children() {
    let document = MemoryDocument::new();
    let inner = create(&document, "span", Attrs::new().on("click", |_| {}), Vec::new());
    let outer = create(
        &document,
        "div",
        Attrs::new().on("keydown", |_| {}),
        children![&inner],
    );
    outer.construct().expect("construct");
    let (outer_ref, inner_ref) = (reference(&outer), reference(&inner));

    outer.destruct().expect("destruct");
    assert_eq!(outer.phase(), Phase::Destructed);
    assert_eq!(inner.phase(), Phase::Destructed);
    assert!(outer.children().is_empty());
    assert_eq!(document.listener_count(outer_ref, "keydown"), 0);
    assert_eq!(document.listener_count(inner_ref, "click"), 0);
    assert_eq!(outer.construct(), Err(Error::InvalidNode));
}

struct Label;

impl Component<MemoryDocument> for Label {
    fn initial_state(&self, attributes: &Attrs) -> State {
        json!({ "visible": attributes.get("hidden").is_none() })
    }

    fn render(&self, context: &Context<MemoryDocument>) -> Child<MemoryDocument> {
        if context.state()["visible"] == json!(true) {
            let text = context.attributes().text("text").unwrap_or("?").to_owned();
            Child::List(vec![
                Child::Node(context.create("em", Attrs::new(), vec![text.into()])),
                Child::List(context.children().to_vec()),
            ])
        } else {
            Child::Empty
        }
    }
}

fn label(document: &MemoryDocument, attributes: Attrs) -> Node<MemoryDocument> {
    create(document, Source::component(Label), attributes, children!["!"])
}

#[test]
fn component_renders_with_passed_children() {
    let document = MemoryDocument::new();
    let node = label(&document, Attrs::new().with("text", "hi"));
    render(&node, &document.container()).expect("render");
    assert_eq!(node.kind(), Kind::Component);
    assert_eq!(node.reference(), None);
    assert_eq!(document.inner_html(document.container()), "<em>hi</em>!");
}

#[test]
fn component_rerenders_in_place() {
    let document = MemoryDocument::new();
    let node = label(&document, Attrs::new().with("text", "one"));
    let list = element(&document, "div", children!["<", &node, ">"]);
    render(&list, &document.container()).expect("render");
    let markup = |document: &MemoryDocument| document.inner_html(reference(&list));
    assert_eq!(markup(&document), "<<em>one</em>!>");

    node.refresh(&Attrs::new().with("text", "two")).expect("refresh");
    assert_eq!(markup(&document), "<<em>two</em>!>");

    node.handle()
        .update(json!({ "visible": false }), true)
        .expect("hide");
    crate::flush().expect("flush hidden");
    assert_eq!(markup(&document), "<>");

    node.handle()
        .update(json!({ "visible": true }), true)
        .expect("show");
    crate::flush().expect("flush visible");
    assert_eq!(markup(&document), "<<em>two</em>!>");
}

#[test]
fn component_detaches_replaced_children() {
    struct Swap {
        kept: Node<MemoryDocument>,
        counts: Rc<Counts>,
    }

    impl Component<MemoryDocument> for Swap {
        fn render(&self, context: &Context<MemoryDocument>) -> Child<MemoryDocument> {
            if context.state().is_null() {
                Child::List(vec![
                    Child::Node(self.kept.clone()),
                    Child::Node(counted(context.document(), "s", &self.counts)),
                ])
            } else {
                Child::Node(self.kept.clone())
            }
        }
    }

    let document = MemoryDocument::new();
    let counts = Rc::new(Counts::default());
    let kept = text(&document, "kept");
    let node = create(
        &document,
        Source::component(Swap {
            kept: kept.clone(),
            counts: counts.clone(),
        }),
        Attrs::new(),
        Vec::new(),
    );
    render(&node, &document.container()).expect("render");
    assert_eq!(document.inner_html(document.container()), "kept<s></s>");

    node.handle().update(json!(1), true).expect("update");
    crate::flush().expect("flush");
    assert_eq!(document.inner_html(document.container()), "kept");
    assert!(kept.is_ready());
    assert_eq!(kept.parent(), Some(node.clone()));
    assert_eq!(counts.attached.get(), 1);
    assert_eq!(counts.detached.get(), 1);
}

#[test]
fn construct_moves_passed_nodes_out_of_their_parent() {
    let document = MemoryDocument::new();
    let shared = text(&document, "shared");
    let holder = create(&document, Fragment, Attrs::new(), children![&shared]);
    let node = create(
        &document,
        Source::component(Label),
        Attrs::new().with("text", "hi"),
        children![&shared],
    );
    node.construct().expect("construct");

    assert!(holder.children().is_empty());
    assert_eq!(shared.parent(), Some(node.clone()));
    assert_eq!(
        node.children().iter().filter(|child| **child == shared).count(),
        1
    );
}

#[test]
fn handle_of_dropped_node_is_invalid() {
    let document = MemoryDocument::new();
    let handle = {
        let node = label(&document, Attrs::new());
        node.handle()
    };
    assert!(handle.node().is_none());
    assert_eq!(handle.update(json!(null), true), Err(Error::InvalidNode));
}

#[test]
fn typed_state_access() {
    let document = MemoryDocument::new();
    let node = label(&document, Attrs::new().with("hidden", true));
    let handle = node.handle();
    assert_eq!(handle.state(), Some(json!({ "visible": false })));

    #[derive(serde::Deserialize)]
    struct Visibility {
        visible: bool,
    }
    let state: Visibility = handle.state_as().expect("typed state");
    assert!(!state.visible);
    assert!(matches!(handle.state_as::<u8>(), Err(Error::State(_))));
}
