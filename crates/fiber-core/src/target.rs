use crate::element::{event_name, is_listener, AttrValue, Attributes, Listener};
use crate::error::NodeError;
use crate::NodeId;

/// The capabilities the commit phase needs from whatever owns the real nodes.
pub trait RenderTarget {
    /// Creates a detached node of `kind` carrying `attributes`.
    fn create_node(&mut self, kind: &str, attributes: &Attributes) -> Result<NodeId, NodeError>;

    /// Brings `node` from `old` to `new`; see [`diff_attributes`] for the
    /// order changes are expected in.
    fn apply_attribute_diff(
        &mut self,
        node: NodeId,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), NodeError>;

    fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;

    fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;

    /// Frees a node that will never be attached again.
    fn release(&mut self, _node: NodeId) -> Result<(), NodeError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeChange {
    RemoveListener { event: String, listener: Listener },
    RemoveAttribute { name: String },
    SetAttribute { name: String, value: AttrValue },
    AddListener { event: String, listener: Listener },
}

/// How an attribute entry reaches the render target.
enum Slot<'a> {
    Listener(&'a Listener),
    Plain,
    Ignored,
}

fn slot<'a>(name: &str, value: &'a AttrValue) -> Slot<'a> {
    match value {
        AttrValue::Listener(listener) if is_listener(name) => Slot::Listener(listener),
        AttrValue::Listener(_) => Slot::Ignored,
        _ => Slot::Plain,
    }
}

/// Computes the changes that turn `old` into `new`.
///
/// Changes come grouped: stale or replaced listeners are removed first, then
/// plain attributes missing from `new` are cleared, then new or changed plain
/// attributes are set, and finally new or replaced listeners are added.
///
/// An entry is a listener only when its name carries the `on` prefix and its
/// value is a [`Listener`]. Any other value is a plain attribute, whatever
/// its name. A listener stored under a name without the prefix has no event
/// to bind to and is skipped with a warning.
pub fn diff_attributes(old: &Attributes, new: &Attributes) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    let changed = |name: &str, value: &AttrValue| new.get(name) != Some(value);
    let added = |name: &str, value: &AttrValue| old.get(name) != Some(value);
    let plain_in_new = |name: &str| {
        new.get(name)
            .is_some_and(|value| matches!(slot(name, value), Slot::Plain))
    };

    for (name, value) in old {
        if let Slot::Listener(listener) = slot(name, value) {
            if changed(name, value) {
                changes.push(AttributeChange::RemoveListener {
                    event: event_name(name),
                    listener: listener.clone(),
                });
            }
        }
    }
    for (name, value) in old {
        if matches!(slot(name, value), Slot::Plain) && !plain_in_new(name) {
            changes.push(AttributeChange::RemoveAttribute { name: name.clone() });
        }
    }
    for (name, value) in new {
        match slot(name, value) {
            Slot::Plain if added(name, value) => changes.push(AttributeChange::SetAttribute {
                name: name.clone(),
                value: value.clone(),
            }),
            Slot::Ignored if added(name, value) => {
                log::warn!("listener under `{name}` has no `on` event prefix; skipped");
            }
            _ => {}
        }
    }
    for (name, value) in new {
        if let Slot::Listener(listener) = slot(name, value) {
            if added(name, value) {
                changes.push(AttributeChange::AddListener {
                    event: event_name(name),
                    listener: listener.clone(),
                });
            }
        }
    }
    changes
}
