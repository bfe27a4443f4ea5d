//! An in-memory [`RenderTarget`] that records every mutation.
//!
//! Used by tests and headless hosts. Nodes live in a vector indexed by
//! [`NodeId`]; released slots stay empty.

use std::fmt::Write as _;

use crate::collections::ListenerMap;
use crate::element::{AttrValue, Attributes, Event, TEXT_ELEMENT, TEXT_VALUE};
use crate::error::NodeError;
use crate::target::{diff_attributes, AttributeChange, RenderTarget};
use crate::NodeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryOp {
    Create { id: NodeId, kind: String },
    SetAttribute { id: NodeId, name: String },
    RemoveAttribute { id: NodeId, name: String },
    AddListener { id: NodeId, event: String },
    RemoveListener { id: NodeId, event: String },
    Attach { parent: NodeId, child: NodeId },
    Detach { parent: NodeId, child: NodeId },
    Release { id: NodeId },
}

#[derive(Debug, Default)]
pub struct MemoryNode {
    kind: String,
    attributes: Attributes,
    listeners: ListenerMap,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_text(&self) -> bool {
        self.kind == TEXT_ELEMENT
    }
}

#[derive(Debug, Default)]
pub struct MemoryRenderTarget {
    nodes: Vec<Option<MemoryNode>>, // FUTURE(no_std): migrate to arena-backed node storage.
    ops: Vec<MemoryOp>,
}

impl MemoryRenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container node to render into. Not recorded as an op.
    pub fn create_root(&mut self, kind: &str) -> NodeId {
        self.push(MemoryNode::new(kind))
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { id })
    }

    /// Number of live nodes, containers included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ops(&self) -> &[MemoryOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<MemoryOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn count_ops(&self, predicate: impl Fn(&MemoryOp) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }

    /// Invokes the listener registered for `event.name` on `id`, if any.
    pub fn dispatch(&self, id: NodeId, event: &Event) -> Result<bool, NodeError> {
        let listener = self.node(id)?.listeners.get(&event.name).cloned();
        match listener {
            Some(listener) => {
                listener.call(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// First node of `kind` below `root` in document order.
    pub fn find_by_kind(&self, root: NodeId, kind: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.node(*id).is_ok_and(|node| node.kind == kind))
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Ok(node) = self.node(id) {
                if id != root {
                    order.push(id);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Concatenated text of every text node below `root`.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut text = String::new();
        for id in self.descendants(root) {
            if let Ok(node) = self.node(id) {
                if node.is_text() {
                    if let Some(value) = node.attribute(TEXT_VALUE) {
                        let _ = write!(text, "{value}");
                    }
                }
            }
        }
        text
    }

    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let indent = "  ".repeat(depth);
            let Ok(node) = self.node(id) else {
                let _ = writeln!(output, "{indent}[{id}] (missing)");
                continue;
            };
            if node.is_text() {
                let value = node
                    .attribute(TEXT_VALUE)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(output, "{indent}{value:?}");
            } else {
                let _ = write!(output, "{indent}<{}", node.kind);
                for (name, value) in &node.attributes {
                    let _ = write!(output, " {name}={:?}", value.to_string());
                }
                let mut events: Vec<&String> = node.listeners.keys().collect();
                events.sort();
                for event in events {
                    let _ = write!(output, " on:{event}");
                }
                let _ = writeln!(output, ">");
            }
            for child in node.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        output
    }

    fn apply_change(&mut self, id: NodeId, change: AttributeChange) -> Result<(), NodeError> {
        let node = self.node_mut(id)?;
        let op = match change {
            AttributeChange::RemoveListener { event, .. } => {
                node.listeners.remove(&event);
                MemoryOp::RemoveListener { id, event }
            }
            AttributeChange::RemoveAttribute { name } => {
                node.attributes.shift_remove(&name);
                MemoryOp::RemoveAttribute { id, name }
            }
            AttributeChange::SetAttribute { name, value } => {
                node.attributes.insert(name.clone(), value);
                MemoryOp::SetAttribute { id, name }
            }
            AttributeChange::AddListener { event, listener } => {
                node.listeners.insert(event.clone(), listener);
                MemoryOp::AddListener { id, event }
            }
        };
        self.ops.push(op);
        Ok(())
    }
}

impl RenderTarget for MemoryRenderTarget {
    fn create_node(&mut self, kind: &str, attributes: &Attributes) -> Result<NodeId, NodeError> {
        let id = self.push(MemoryNode::new(kind));
        self.ops.push(MemoryOp::Create {
            id,
            kind: kind.to_owned(),
        });
        self.apply_attribute_diff(id, &Attributes::new(), attributes)?;
        Ok(id)
    }

    fn apply_attribute_diff(
        &mut self,
        node: NodeId,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), NodeError> {
        for change in diff_attributes(old, new) {
            self.apply_change(node, change)?;
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.node(parent)?;
        if let Some(previous) = self.node(child)?.parent {
            if let Ok(node) = self.node_mut(previous) {
                node.children.retain(|id| *id != child);
            }
        }
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(MemoryOp::Attach { parent, child });
        Ok(())
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let children = &mut self.node_mut(parent)?.children;
        let index = children
            .iter()
            .position(|id| *id == child)
            .ok_or(NodeError::NotAChild { parent, child })?;
        children.remove(index);
        self.node_mut(child)?.parent = None;
        self.ops.push(MemoryOp::Detach { parent, child });
        Ok(())
    }

    fn release(&mut self, node: NodeId) -> Result<(), NodeError> {
        let mut stack = vec![node];
        self.node(node)?;
        while let Some(id) = stack.pop() {
            if let Some(slot) = self.nodes.get_mut(id) {
                if let Some(removed) = slot.take() {
                    stack.extend(removed.children);
                }
            }
        }
        self.ops.push(MemoryOp::Release { id: node });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{attributes, Listener};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn attach_detach_and_release_keep_links_consistent() {
        let mut target = MemoryRenderTarget::new();
        let root = target.create_root("root");
        let div = target.create_node("div", &Attributes::new()).unwrap();
        let span = target.create_node("span", &Attributes::new()).unwrap();

        target.attach(root, div).unwrap();
        target.attach(div, span).unwrap();
        assert_eq!(target.node(root).unwrap().children(), &[div]);
        assert_eq!(target.node(span).unwrap().parent(), Some(div));

        assert_eq!(
            target.detach(root, span),
            Err(NodeError::NotAChild {
                parent: root,
                child: span
            })
        );
        target.detach(root, div).unwrap();
        target.release(div).unwrap();

        assert_eq!(target.len(), 1);
        assert!(target.node(span).is_err());
    }

    #[test]
    fn listeners_receive_dispatched_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut target = MemoryRenderTarget::new();
        let input = target
            .create_node(
                "input",
                &attributes([
                    ("value", AttrValue::from("a")),
                    (
                        "onInput",
                        AttrValue::from(Listener::new(move |event: &Event| {
                            sink.borrow_mut().push(event.value.clone().unwrap_or_default())
                        })),
                    ),
                ]),
            )
            .unwrap();

        assert!(target
            .dispatch(input, &Event::with_value("input", "ab"))
            .unwrap());
        assert!(!target.dispatch(input, &Event::new("click")).unwrap());
        assert_eq!(*seen.borrow(), vec![String::from("ab")]);
        assert!(target.node(input).unwrap().has_listener("input"));
    }

    #[test]
    fn dump_shows_structure_and_text() {
        let mut target = MemoryRenderTarget::new();
        let root = target.create_root("root");
        let p = target
            .create_node("p", &attributes([("id", "x")]))
            .unwrap();
        let text = target
            .create_node(TEXT_ELEMENT, &attributes([(TEXT_VALUE, "hi")]))
            .unwrap();
        target.attach(root, p).unwrap();
        target.attach(p, text).unwrap();

        assert_eq!(target.dump_tree(root), "<root>\n  <p id=\"x\">\n    \"hi\"\n");
        assert_eq!(target.text_content(root), "hi");
        assert_eq!(target.find_by_kind(root, "p"), Some(p));
    }
}
