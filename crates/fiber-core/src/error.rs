use std::fmt;

use crate::fiber::FiberId;
use crate::NodeId;

/// Failures reported by a [`RenderTarget`](crate::RenderTarget).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Structural corruption detected while rendering or committing.
///
/// None of these are recoverable: the pass that produced one is abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiberError {
    /// No fiber on the ancestor chain owns a render-target node.
    MissingHostAncestor { fiber: FiberId },
    UpdateWithoutAlternate { fiber: FiberId },
    /// Reconciliation produced a fiber that could not be linked under its parent.
    UnlinkedChild { parent: FiberId, index: usize },
    HookOutsideRender,
    /// A deleted fiber has neither a node of its own nor children to detach.
    EmptyDeletion { fiber: FiberId },
    StaleFiber { fiber: FiberId },
    Node(NodeError),
}

impl fmt::Display for FiberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberError::MissingHostAncestor { fiber } => {
                write!(f, "fiber {fiber:?} has no ancestor with a render-target node")
            }
            FiberError::UpdateWithoutAlternate { fiber } => {
                write!(f, "fiber {fiber:?} is tagged for update but has no alternate")
            }
            FiberError::UnlinkedChild { parent, index } => write!(
                f,
                "child {index} of fiber {parent:?} was produced without a first child to link after"
            ),
            FiberError::HookOutsideRender => {
                f.write_str("hooks may only be called while a component is rendering")
            }
            FiberError::EmptyDeletion { fiber } => {
                write!(f, "fiber {fiber:?} is tagged for deletion but has nothing to detach")
            }
            FiberError::StaleFiber { fiber } => write!(f, "fiber {fiber:?} no longer exists"),
            FiberError::Node(err) => write!(f, "render target failure: {err}"),
        }
    }
}

impl std::error::Error for FiberError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FiberError::Node(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NodeError> for FiberError {
    fn from(err: NodeError) -> Self {
        FiberError::Node(err)
    }
}
