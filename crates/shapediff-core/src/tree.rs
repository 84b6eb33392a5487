//! Canonical document tree.
//!
//! Every node of one document lives in a single arena owned by [`Tree`] and is
//! addressed by a [`NodeId`]. Parent and sibling relations are stored as ids,
//! so there are no reference cycles and dropping the `Tree` drops the whole
//! document at once.
//!
//! A tree is built once by an adapter (see [`crate::adapter`]) and treated as
//! read-only while it is being compared. Hints and caveats never touch the
//! tree; they live in a side table keyed by `NodeId` (see [`crate::settings`]).

use crate::error::TreeError;
use crate::path::{Filter, JsonPath};
use crate::value::Scalar;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Stable index of a node inside its [`Tree`].
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Coarse type tag of a token. A `Value` holding [`Scalar::Null`] reports `Null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    Object,
    Array,
    Property,
    Value,
    Null,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub enum Token {
    Object(ObjectToken),
    Array(ArrayToken),
    Property(PropertyToken),
    Value(Scalar),
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        match self {
            Self::Object(_) => TokenType::Object,
            Self::Array(_) => TokenType::Array,
            Self::Property(_) => TokenType::Property,
            Self::Value(Scalar::Null) => TokenType::Null,
            Self::Value(_) => TokenType::Value,
        }
    }

    /// The container view of this token, or `None` for a leaf value.
    pub fn as_container(&self) -> Option<&dyn Container> {
        match self {
            Self::Object(o) => Some(o),
            Self::Array(a) => Some(a),
            Self::Property(p) => Some(p),
            Self::Value(_) => None,
        }
    }
}

/// Shared capability of the tokens that own children.
pub trait Container {
    fn child_count(&self) -> usize;

    fn child_at(&self, index: usize) -> Option<NodeId>;

    fn first_child(&self) -> Option<NodeId> {
        self.child_at(0)
    }

    fn last_child(&self) -> Option<NodeId> {
        self.child_count()
            .checked_sub(1)
            .and_then(|last| self.child_at(last))
    }

    fn has_children(&self) -> bool {
        self.child_count() > 0
    }
}

/// Ordered properties, indexed by name. Children are `Property` nodes.
#[derive(Debug, Clone, Default)]
pub struct ObjectToken {
    properties: IndexMap<String, NodeId>,
}

impl ObjectToken {
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The property node with exactly this name.
    pub fn property(&self, name: &str) -> Option<NodeId> {
        self.properties.get(name).copied()
    }

    /// Exact match first, then the first property whose name matches ignoring case.
    pub fn property_ignore_case(&self, name: &str) -> Option<NodeId> {
        self.property(name).or_else(|| {
            let wanted = name.to_lowercase();
            self.properties
                .iter()
                .find(|(key, _)| key.to_lowercase() == wanted)
                .map(|(_, &id)| id)
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties.keys().map(String::as_str)
    }
}

impl Container for ObjectToken {
    fn child_count(&self) -> usize {
        self.properties.len()
    }

    fn child_at(&self, index: usize) -> Option<NodeId> {
        self.properties.get_index(index).map(|(_, &id)| id)
    }
}

/// Ordered, index-addressable items of any token type.
#[derive(Debug, Clone, Default)]
pub struct ArrayToken {
    items: Vec<NodeId>,
}

impl ArrayToken {
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Container for ArrayToken {
    fn child_count(&self) -> usize {
        self.items.len()
    }

    fn child_at(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }
}

/// A named slot holding exactly one value.
#[derive(Debug, Clone)]
pub struct PropertyToken {
    name: String,
    value: NodeId,
}

impl PropertyToken {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> NodeId {
        self.value
    }
}

impl Container for PropertyToken {
    fn child_count(&self) -> usize {
        1
    }

    fn child_at(&self, index: usize) -> Option<NodeId> {
        (index == 0).then_some(self.value)
    }
}

#[derive(Debug, Clone)]
struct Node {
    token: Token,
    parent: Option<NodeId>,
    previous: Option<NodeId>,
    next: Option<NodeId>,
}

/// Arena holding one document.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree whose root is a null value.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.add_value(Scalar::Null);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Make `id` the root, detaching it from any current owner.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), TreeError> {
        if matches!(self.token(id), Token::Property(_)) {
            return Err(TreeError::MisplacedProperty);
        }
        self.detach(id);
        self.root = id;
        Ok(())
    }

    /// Number of nodes ever allocated in this arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_object(&mut self) -> NodeId {
        self.push_node(Token::Object(ObjectToken::default()))
    }

    pub fn add_array(&mut self) -> NodeId {
        self.push_node(Token::Array(ArrayToken::default()))
    }

    pub fn add_value(&mut self, value: impl Into<Scalar>) -> NodeId {
        self.push_node(Token::Value(value.into()))
    }

    fn push_node(&mut self, token: Token) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            token,
            parent: None,
            previous: None,
            next: None,
        });
        id
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn token(&self, id: NodeId) -> &Token {
        &self.nodes[id.0].token
    }

    pub fn token_type(&self, id: NodeId) -> TokenType {
        self.token(id).token_type()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].previous
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.token(id).as_container().and_then(|c| c.first_child())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.token(id).as_container().and_then(|c| c.last_child())
    }

    /// Direct children in document order: property nodes for an object, items
    /// for an array, the single value for a property, nothing for a value.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cursor = self.first_child(id);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.next(current);
            Some(current)
        })
    }

    pub fn scalar(&self, id: NodeId) -> Option<&Scalar> {
        match self.token(id) {
            Token::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Items of an array node; empty for anything else.
    pub fn items(&self, id: NodeId) -> &[NodeId] {
        match self.token(id) {
            Token::Array(a) => a.items(),
            _ => &[],
        }
    }

    /// `(name, value)` pairs of an object node in document order.
    pub fn properties(&self, id: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        let props = match self.token(id) {
            Token::Object(o) => Some(o.properties.values()),
            _ => None,
        };
        props.into_iter().flatten().filter_map(move |&prop| match self.token(prop) {
            Token::Property(p) => Some((p.name(), p.value())),
            _ => None,
        })
    }

    /// The property node called `name` on an object (case-sensitive).
    pub fn property(&self, object: NodeId, name: &str) -> Option<NodeId> {
        match self.token(object) {
            Token::Object(o) => o.property(name),
            _ => None,
        }
    }

    /// Like [`Tree::property`], falling back to a case-insensitive match.
    pub fn property_ignore_case(&self, object: NodeId, name: &str) -> Option<NodeId> {
        match self.token(object) {
            Token::Object(o) => o.property_ignore_case(name),
            _ => None,
        }
    }

    /// The value of property `name` on an object (case-sensitive).
    pub fn get(&self, object: NodeId, name: &str) -> Option<NodeId> {
        let prop = self.property(object, name)?;
        match self.token(prop) {
            Token::Property(p) => Some(p.value()),
            _ => None,
        }
    }

    /// Zero-based index of `id` among its siblings.
    pub fn position(&self, id: NodeId) -> usize {
        let mut index = 0;
        let mut cursor = self.previous(id);
        while let Some(prev) = cursor {
            index += 1;
            cursor = self.previous(prev);
        }
        index
    }

    /// Address of `id` from the top of its tree, e.g. `$.items[2].name`.
    ///
    /// A property and its value share one path.
    pub fn path(&self, id: NodeId) -> JsonPath {
        let mut filters = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            match (self.token(parent), self.token(current)) {
                (Token::Array(_), _) => {
                    filters.push(Filter::Index(Some(self.position(current) as i64)));
                }
                (Token::Object(_), Token::Property(p)) => {
                    filters.push(Filter::Field(Some(p.name().to_string())));
                }
                _ => {}
            }
            current = parent;
        }
        filters.reverse();
        JsonPath::new(filters)
    }

    /// Structural equality across two trees.
    ///
    /// Objects compare by name regardless of property order; arrays compare
    /// item by item; values use [`Scalar::compare`].
    pub fn deep_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        match (self.token(a), other.token(b)) {
            (Token::Value(x), Token::Value(y)) => x == y,
            (Token::Array(x), Token::Array(y)) => {
                x.len() == y.len()
                    && x.items
                        .iter()
                        .zip(&y.items)
                        .all(|(&i, &j)| self.deep_eq(i, other, j))
            }
            (Token::Object(x), Token::Object(y)) => {
                x.len() == y.len()
                    && x.properties.iter().all(|(name, &pa)| {
                        y.property(name)
                            .is_some_and(|pb| self.deep_eq(pa, other, pb))
                    })
            }
            (Token::Property(x), Token::Property(y)) => {
                x.name == y.name && self.deep_eq(x.value, other, y.value)
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Append `item` to an array, detaching it from its current owner first.
    pub fn push_item(&mut self, array: NodeId, item: NodeId) -> Result<(), TreeError> {
        self.expect_type(array, TokenType::Array)?;
        self.check_adoptable(array, item)?;
        self.detach(item);
        self.attach_item(array, item);
        Ok(())
    }

    /// Set property `name` on an object to `value`.
    ///
    /// An existing property of that name keeps its position and gets the new
    /// value (last write wins). Returns the property node.
    pub fn set_property(
        &mut self,
        object: NodeId,
        name: impl Into<String>,
        value: NodeId,
    ) -> Result<NodeId, TreeError> {
        self.expect_type(object, TokenType::Object)?;
        self.check_adoptable(object, value)?;
        let name = name.into();
        if let Some(existing) = self.property(object, &name) {
            self.set_value(existing, Some(value))?;
            return Ok(existing);
        }
        self.detach(value);
        Ok(self.attach_property(object, name, value))
    }

    /// Replace the value of a property. `None` stores a null value token.
    pub fn set_value(&mut self, property: NodeId, value: Option<NodeId>) -> Result<(), TreeError> {
        self.expect_type(property, TokenType::Property)?;
        let value = match value {
            Some(v) => {
                self.check_adoptable(property, v)?;
                self.detach(v);
                v
            }
            None => self.add_value(Scalar::Null),
        };
        let old = match &mut self.nodes[property.0].token {
            Token::Property(p) => std::mem::replace(&mut p.value, value),
            _ => return Ok(()),
        };
        if old != value {
            self.nodes[old.0].parent = None;
        }
        self.nodes[value.0].parent = Some(property);
        Ok(())
    }

    /// Detach `id` from its owner. The node stays in the arena, unreachable.
    ///
    /// Removing the value of a property leaves a null value in its place.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Make a freshly built, unowned node the root.
    pub(crate) fn adopt_root(&mut self, id: NodeId) {
        debug_assert!(self.parent(id).is_none());
        self.root = id;
    }

    pub(crate) fn attach_item(&mut self, array: NodeId, item: NodeId) {
        let previous = match &mut self.nodes[array.0].token {
            Token::Array(a) => {
                let last = a.items.last().copied();
                a.items.push(item);
                last
            }
            _ => return,
        };
        self.link(array, item, previous);
    }

    pub(crate) fn attach_property(&mut self, object: NodeId, name: String, value: NodeId) -> NodeId {
        let prop = self.push_node(Token::Property(PropertyToken {
            name: name.clone(),
            value,
        }));
        self.nodes[value.0].parent = Some(prop);
        let previous = match &mut self.nodes[object.0].token {
            Token::Object(o) => {
                let last = o.properties.last().map(|(_, &id)| id);
                o.properties.insert(name, prop);
                last
            }
            _ => return prop,
        };
        self.link(object, prop, previous);
        prop
    }

    fn link(&mut self, parent: NodeId, child: NodeId, previous: Option<NodeId>) {
        if let Some(prev) = previous {
            self.nodes[prev.0].next = Some(child);
        }
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.previous = previous;
        node.next = None;
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let mut refill_property = false;
        match &mut self.nodes[parent.0].token {
            Token::Array(a) => a.items.retain(|&c| c != id),
            Token::Object(o) => o.properties.retain(|_, c| *c != id),
            Token::Property(_) => refill_property = true,
            Token::Value(_) => {}
        }

        let (previous, next) = (self.nodes[id.0].previous, self.nodes[id.0].next);
        if let Some(prev) = previous {
            self.nodes[prev.0].next = next;
        }
        if let Some(next) = next {
            self.nodes[next.0].previous = previous;
        }
        let node = &mut self.nodes[id.0];
        node.parent = None;
        node.previous = None;
        node.next = None;

        if refill_property {
            let null = self.add_value(Scalar::Null);
            if let Token::Property(p) = &mut self.nodes[parent.0].token {
                p.value = null;
            }
            self.nodes[null.0].parent = Some(parent);
        }
    }

    fn expect_type(&self, id: NodeId, expected: TokenType) -> Result<(), TreeError> {
        let found = self.token_type(id);
        let matches = match expected {
            // A null value is still a value.
            TokenType::Value => matches!(found, TokenType::Value | TokenType::Null),
            other => found == other,
        };
        if matches {
            Ok(())
        } else {
            Err(TreeError::WrongTokenType { expected, found })
        }
    }

    /// `child` may join `owner` only if it is not a property and not an
    /// ancestor of (or equal to) `owner`.
    fn check_adoptable(&self, owner: NodeId, child: NodeId) -> Result<(), TreeError> {
        if matches!(self.token(child), Token::Property(_)) {
            return Err(TreeError::MisplacedProperty);
        }
        let mut cursor = Some(owner);
        while let Some(node) = cursor {
            if node == child {
                return Err(TreeError::Cycle);
            }
            cursor = self.parent(node);
        }
        Ok(())
    }
}
