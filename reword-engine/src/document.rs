//! Live document tree abstraction.
//!
//! The host page is injected as a tree of text-bearing nodes with change
//! notifications. Nodes live in an arena indexed by [`NodeId`]; replaced
//! nodes are detached but their slots remain, so an id never dangles, it
//! just stops being part of the tree.
//!
//! Substituted spans become **marker** nodes that own their originating
//! rule id and the exact pre-substitution text. Revert and re-render walk
//! markers explicitly; there is no ambient side table to lose.

use crate::error::{EngineError, EngineResult};
use reword_types::RuleId;
use tokio::sync::mpsc;

/// Handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Container tags whose text is never scanned or rewritten.
pub const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "textarea", "input", "select", "option",
];

/// Tag reserved for the subsystem's own UI subtree; always excluded.
pub const OWN_UI_TAG: &str = "reword-ui";

/// Payload of a substitution marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerData {
    /// Rule that produced this substitution.
    pub rule_id: RuleId,
    /// The exact matched text this marker replaced.
    pub original: String,
    /// What is rendered in its place.
    pub replacement: String,
}

/// What a node is.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A container with a tag and an editable flag.
    Element { tag: String, editable: bool },
    /// A run of rendered text.
    Text(String),
    /// A substituted span retaining its original text.
    Marker(MarkerData),
}

/// One piece of a spliced text node.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Text left untouched.
    Literal(String),
    /// A matched span to replace with a marker.
    Match {
        rule_id: RuleId,
        original: String,
        replacement: String,
    },
}

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    attached: bool,
}

/// An arena-backed document tree with mutation notification.
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
    revision: u64,
    muted: bool,
    mutations: Option<mpsc::UnboundedSender<NodeId>>,
}

impl DocumentTree {
    /// Creates a tree with a single root element.
    #[must_use]
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag: "body".to_string(),
                editable: false,
            },
            attached: true,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            revision: 0,
            muted: false,
            mutations: None,
        }
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current mutation revision. Bumps on every unmuted change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Suppresses mutation notifications while the engine rewrites the
    /// tree, so its own splices do not feed the re-scan debounce.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Returns a receiver of mutation notifications (the changed node's
    /// parent element). Best-effort: replacing the watcher drops the old
    /// one.
    pub fn watch_mutations(&mut self) -> mpsc::UnboundedReceiver<NodeId> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.mutations = Some(tx);
        rx
    }

    fn notify(&mut self, node: NodeId) {
        if self.muted {
            return;
        }
        self.revision += 1;
        if let Some(tx) = &self.mutations {
            if tx.send(node).is_err() {
                self.mutations = None;
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn attached(&self, id: NodeId) -> EngineResult<&Node> {
        let node = &self.nodes[id.0];
        if node.attached {
            Ok(node)
        } else {
            Err(EngineError::Detached(id))
        }
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
            attached: true,
        });
        id
    }

    /// Appends a child element.
    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> EngineResult<NodeId> {
        self.append_element_inner(parent, tag.into(), false)
    }

    /// Appends a child element marked editable.
    pub fn append_editable(&mut self, parent: NodeId, tag: impl Into<String>) -> EngineResult<NodeId> {
        self.append_element_inner(parent, tag.into(), true)
    }

    fn append_element_inner(
        &mut self,
        parent: NodeId,
        tag: String,
        editable: bool,
    ) -> EngineResult<NodeId> {
        match self.attached(parent)?.kind {
            NodeKind::Element { .. } => {}
            _ => return Err(EngineError::NotElement(parent)),
        }
        let id = self.push_node(parent, NodeKind::Element { tag, editable });
        self.nodes[parent.0].children.push(id);
        self.notify(parent);
        Ok(id)
    }

    /// Appends a text node.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> EngineResult<NodeId> {
        match self.attached(parent)?.kind {
            NodeKind::Element { .. } => {}
            _ => return Err(EngineError::NotElement(parent)),
        }
        let id = self.push_node(parent, NodeKind::Text(text.into()));
        self.nodes[parent.0].children.push(id);
        self.notify(parent);
        Ok(id)
    }

    /// Replaces a text node's content (a page mutation).
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> EngineResult<()> {
        let node = self.attached(id)?;
        let parent = node.parent;
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(content) => {
                *content = text.into();
            }
            _ => return Err(EngineError::NotText(id)),
        }
        self.notify(parent.unwrap_or(id));
        Ok(())
    }

    /// The content of a text node.
    pub fn text_of(&self, id: NodeId) -> EngineResult<&str> {
        match &self.attached(id)?.kind {
            NodeKind::Text(content) => Ok(content),
            _ => Err(EngineError::NotText(id)),
        }
    }

    /// The node's kind.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Marker payload of a marker node.
    pub fn marker(&self, id: NodeId) -> EngineResult<&MarkerData> {
        match &self.attached(id)?.kind {
            NodeKind::Marker(data) => Ok(data),
            _ => Err(EngineError::NotMarker(id)),
        }
    }

    /// Child ids of an element.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    fn excluded(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Element { tag, editable } => {
                *editable || tag == OWN_UI_TAG || SKIPPED_TAGS.contains(&tag.as_str())
            }
            _ => false,
        }
    }

    /// All text nodes eligible for substitution, in document order.
    ///
    /// Skips script/style/form-control containers, editable subtrees, the
    /// subsystem's own UI subtree, and existing markers.
    #[must_use]
    pub fn visible_text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_text(self.root, &mut out);
        out
    }

    fn walk_text(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.excluded(id) {
            return;
        }
        for child in &self.node(id).children {
            match &self.nodes[child.0].kind {
                NodeKind::Text(_) => out.push(*child),
                NodeKind::Element { .. } => self.walk_text(*child, out),
                NodeKind::Marker(_) => {}
            }
        }
    }

    /// All attached marker nodes, in document order.
    #[must_use]
    pub fn markers(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_markers(self.root, &mut out);
        out
    }

    fn walk_markers(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.node(id).children {
            match &self.nodes[child.0].kind {
                NodeKind::Marker(_) => out.push(*child),
                NodeKind::Element { .. } => self.walk_markers(*child, out),
                NodeKind::Text(_) => {}
            }
        }
    }

    /// Text the detector scans: markers contribute their *original* text,
    /// so an already-substituted page still detects its rules.
    #[must_use]
    pub fn detection_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.root, &mut out, true);
        out
    }

    /// Text as rendered: markers contribute their replacement.
    #[must_use]
    pub fn rendered_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.root, &mut out, false);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String, use_original: bool) {
        if self.excluded(id) {
            return;
        }
        for child in &self.node(id).children {
            match &self.nodes[child.0].kind {
                NodeKind::Text(content) => out.push_str(content),
                NodeKind::Marker(data) => {
                    if use_original {
                        out.push_str(&data.original);
                    } else {
                        out.push_str(&data.replacement);
                    }
                }
                NodeKind::Element { .. } => {
                    // Separate block contents so words never weld across
                    // element boundaries.
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    self.collect_text(*child, out, use_original);
                }
            }
        }
    }

    /// Replaces a text node with a sequence of literal text and marker
    /// nodes. Returns the inserted ids.
    pub fn splice_text(&mut self, id: NodeId, segments: Vec<Segment>) -> EngineResult<Vec<NodeId>> {
        match &self.attached(id)?.kind {
            NodeKind::Text(_) => {}
            _ => return Err(EngineError::NotText(id)),
        }
        let parent = self.node(id).parent.ok_or(EngineError::Detached(id))?;

        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == id)
            .ok_or(EngineError::Detached(id))?;
        self.nodes[parent.0].children.remove(position);
        self.nodes[id.0].attached = false;

        let mut inserted = Vec::new();
        for segment in segments {
            let kind = match segment {
                Segment::Literal(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    NodeKind::Text(text)
                }
                Segment::Match {
                    rule_id,
                    original,
                    replacement,
                } => NodeKind::Marker(MarkerData {
                    rule_id,
                    original,
                    replacement,
                }),
            };
            inserted.push(self.push_node(parent, kind));
        }
        let at = position;
        for (offset, new_id) in inserted.iter().enumerate() {
            self.nodes[parent.0].children.insert(at + offset, *new_id);
        }
        self.notify(parent);
        Ok(inserted)
    }

    /// Replaces a marker with a text node holding its original text.
    pub fn revert_marker(&mut self, id: NodeId) -> EngineResult<NodeId> {
        let original = self.marker(id)?.original.clone();
        let parent = self.node(id).parent.ok_or(EngineError::Detached(id))?;

        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == id)
            .ok_or(EngineError::Detached(id))?;
        self.nodes[id.0].attached = false;

        let text_id = self.push_node(parent, NodeKind::Text(original));
        self.nodes[parent.0].children[position] = text_id;
        self.notify(parent);
        Ok(text_id)
    }

    /// Reverts every marker in the tree. Returns how many were reverted.
    pub fn revert_all(&mut self) -> usize {
        let markers = self.markers();
        let count = markers.len();
        for marker in markers {
            // Ids from markers() are attached by construction.
            let _ = self.revert_marker(marker);
        }
        count
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
