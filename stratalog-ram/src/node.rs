//! Polymorphic traversal and rewriting over the RAM tree.
//!
//! [NodeRef] views any node of the four IR categories; [descendants]
//! enumerates a subtree in pre-order without materializing intermediate
//! lists. [NodeMapper] is the rewrite protocol: `apply` on any node passes
//! each owned child through the mapper and stores the replacement back, so
//! a mapper controls both the rewrite and whether to keep descending.

use crate::{
    condition::Condition, operation::Operation, statement::Statement, value::Value, TupleId,
};

/// A borrowed view of any RAM node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// A value node.
    Value(&'a Value),
    /// A condition node.
    Condition(&'a Condition),
    /// An operation node.
    Operation(&'a Operation),
    /// A statement node.
    Statement(&'a Statement),
}

impl<'a> NodeRef<'a> {
    /// Direct children in a stable order.
    pub fn children(self) -> Vec<NodeRef<'a>> {
        match self {
            NodeRef::Value(value) => value.children().into_iter().map(NodeRef::Value).collect(),
            NodeRef::Condition(condition) => condition
                .children()
                .into_iter()
                .map(NodeRef::Condition)
                .chain(condition.values().into_iter().map(NodeRef::Value))
                .collect(),
            NodeRef::Operation(operation) => operation
                .conditions()
                .into_iter()
                .map(NodeRef::Condition)
                .chain(operation.values().into_iter().map(NodeRef::Value))
                .chain(operation.nested().map(NodeRef::Operation))
                .collect(),
            NodeRef::Statement(statement) => {
                let mut children: Vec<NodeRef<'a>> = statement
                    .children()
                    .into_iter()
                    .map(NodeRef::Statement)
                    .collect();
                match statement {
                    Statement::Exit(condition) => children.push(NodeRef::Condition(condition)),
                    Statement::Query(operation) => children.push(NodeRef::Operation(operation)),
                    _ => {}
                }
                children
            }
        }
    }
}

/// Pre-order iterator over a subtree, rooted at the node it was created
/// from. The traversal is restartable by creating a new iterator.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children = node.children();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

/// Enumerate `root` and all nodes below it in pre-order.
pub fn descendants(root: NodeRef<'_>) -> Descendants<'_> {
    Descendants { stack: vec![root] }
}

/// Whether any value in the subtree reads the tuple bound to `level`.
pub fn references_level(root: NodeRef<'_>, level: TupleId) -> bool {
    descendants(root).any(|node| {
        matches!(
            node,
            NodeRef::Value(Value::ElementAccess { level: own, .. }) if *own == level
        )
    })
}

/// Rewrite protocol over owned RAM nodes.
///
/// Each hook receives an owned child and returns its replacement; the
/// default implementation returns the child unchanged and does not
/// descend. A recursive rewrite calls `child.apply(self)` inside the hook.
pub trait NodeMapper {
    /// Rewrite a value child.
    fn map_value(&mut self, value: Value) -> Value {
        value
    }

    /// Rewrite a condition child.
    fn map_condition(&mut self, condition: Condition) -> Condition {
        condition
    }

    /// Rewrite an operation child.
    fn map_operation(&mut self, operation: Operation) -> Operation {
        operation
    }

    /// Rewrite a statement child.
    fn map_statement(&mut self, statement: Statement) -> Statement {
        statement
    }
}

/// The recursive identity mapper; rebuilds a tree without changing it.
#[derive(Debug, Clone, Copy)]
pub struct Identity;

impl NodeMapper for Identity {
    fn map_value(&mut self, value: Value) -> Value {
        value.apply(self)
    }

    fn map_condition(&mut self, condition: Condition) -> Condition {
        condition.apply(self)
    }

    fn map_operation(&mut self, operation: Operation) -> Operation {
        operation.apply(self)
    }

    fn map_statement(&mut self, statement: Statement) -> Statement {
        statement.apply(self)
    }
}
