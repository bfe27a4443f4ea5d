//! Immutable element descriptors.
//!
//! Elements are rebuilt on every render and describe what a subtree should
//! look like. They are cheap to clone: the payload sits behind an `Rc`.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Host kind reserved for text leaves.
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";

/// The single attribute carried by a text leaf.
pub const TEXT_VALUE: &str = "nodeValue";

/// Attribute names starting with this prefix are event listeners.
pub const LISTENER_PREFIX: &str = "on";

pub type Attributes = IndexMap<String, AttrValue>;

pub fn is_listener(name: &str) -> bool {
    name.len() > LISTENER_PREFIX.len() && name.starts_with(LISTENER_PREFIX)
}

/// `onInput` -> `input`.
pub fn event_name(attribute: &str) -> String {
    attribute[LISTENER_PREFIX.len()..].to_lowercase()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: String,
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// An event callback. Two listeners are equal only if they share the same
/// allocation.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Listener(Listener),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            AttrValue::Listener(listener) => Some(listener),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.write_str(text),
            AttrValue::Number(number) => write!(f, "{number}"),
            AttrValue::Bool(flag) => write!(f, "{flag}"),
            AttrValue::Listener(listener) => write!(f, "{listener:?}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Listener> for AttrValue {
    fn from(value: Listener) -> Self {
        AttrValue::Listener(value)
    }
}

/// Builds an [`Attributes`] map from `(name, value)` pairs, keeping order.
pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Attributes
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    pub attributes: Attributes,
    pub children: Vec<Element>,
}

impl Props {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_text)
    }
}

type RenderFn = Rc<dyn Fn(&Props) -> Element>;

/// A function component.
///
/// Identity is the type of the wrapped function, so wrapping the same `fn`
/// item (or the same closure expression) on every render yields equal kinds.
#[derive(Clone)]
pub struct Component {
    type_id: TypeId,
    name: &'static str,
    render: RenderFn,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Props) -> Element + 'static,
    {
        Self {
            type_id: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn render(&self, props: &Props) -> Element {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Host(Cow<'static, str>),
    Component(Component),
}

impl ElementKind {
    pub fn host_name(&self) -> Option<&str> {
        match self {
            ElementKind::Host(name) => Some(name),
            ElementKind::Component(_) => None,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, ElementKind::Component(_))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Host(name) => f.write_str(name),
            ElementKind::Component(component) => write!(f, "<{}>", component.name),
        }
    }
}

impl From<&'static str> for ElementKind {
    fn from(name: &'static str) -> Self {
        ElementKind::Host(Cow::Borrowed(name))
    }
}

impl From<String> for ElementKind {
    fn from(name: String) -> Self {
        ElementKind::Host(Cow::Owned(name))
    }
}

impl From<Component> for ElementKind {
    fn from(component: Component) -> Self {
        ElementKind::Component(component)
    }
}

#[derive(Debug, PartialEq)]
struct ElementInner {
    kind: ElementKind,
    props: Props,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    pub fn new(kind: ElementKind, props: Props) -> Self {
        Self {
            inner: Rc::new(ElementInner { kind, props }),
        }
    }

    pub fn kind(&self) -> &ElementKind {
        &self.inner.kind
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn attributes(&self) -> &Attributes {
        &self.inner.props.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.inner.props.children
    }

    pub fn is_text(&self) -> bool {
        self.kind().host_name() == Some(TEXT_ELEMENT)
    }
}

/// Anything that may appear in a child position.
pub enum Child {
    Element(Element),
    Text(String),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Text(value) => text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_owned())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

impl From<&String> for Child {
    fn from(value: &String) -> Self {
        Child::Text(value.clone())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Text(value.to_string())
    }
}

pub fn create_element<C>(
    kind: impl Into<ElementKind>,
    attributes: Attributes,
    children: impl IntoIterator<Item = C>,
) -> Element
where
    C: Into<Child>,
{
    let children = children
        .into_iter()
        .map(|child| child.into().into_element())
        .collect();
    Element::new(
        kind.into(),
        Props {
            attributes,
            children,
        },
    )
}

/// A text leaf.
pub fn text(value: impl Into<String>) -> Element {
    let mut attributes = Attributes::new();
    attributes.insert(TEXT_VALUE.to_owned(), AttrValue::Text(value.into()));
    Element::new(
        ElementKind::from(TEXT_ELEMENT),
        Props {
            attributes,
            children: Vec::new(),
        },
    )
}

/// An element with neither attributes nor children.
pub fn leaf(kind: impl Into<ElementKind>) -> Element {
    create_element(kind, Attributes::new(), Vec::<Child>::new())
}
