//! html5ever TreeSink that builds a specification document's arena.
//!
//! Sources are hand-written, so the sink recovers from every parse error
//! and only counts them. The id index is rebuilt once the tree is final:
//! html5ever detaches and re-appends nodes while repairing misnested
//! markup, and definition ids are assigned against that index.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute};

/// What parsing one source produced.
pub struct ParsedHtml {
    pub dom: ArenaDom,
    /// Parse errors html5ever recovered from.
    pub parse_errors: usize,
    /// Whether the source lacked `<!DOCTYPE html>` and parsed in quirks mode.
    pub quirks: bool,
    /// Ids carried by more than one element; the index points at the first.
    pub duplicate_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct NodeHandle(ArenaNodeId);

pub(super) struct DocumentSink {
    dom: RefCell<ArenaDom>,
    parse_errors: Cell<usize>,
    quirks_mode: Cell<QuirksMode>,
}

impl DocumentSink {
    pub(super) fn new() -> Self {
        Self {
            dom: RefCell::new(ArenaDom::new()),
            parse_errors: Cell::new(0),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
        }
    }
}

impl TreeSink for DocumentSink {
    type Handle = NodeHandle;
    type Output = ParsedHtml;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> ParsedHtml {
        let mut dom = self.dom.into_inner();
        let duplicate_ids = dom.reindex_ids();
        ParsedHtml {
            dom,
            parse_errors: self.parse_errors.get(),
            quirks: self.quirks_mode.get() != QuirksMode::NoQuirks,
            duplicate_ids,
        }
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.parse_errors.set(self.parse_errors.get() + 1);
        tracing::trace!("recovered html parse error: {msg}");
    }

    fn get_document(&self) -> NodeHandle {
        NodeHandle(self.dom.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a NodeHandle) -> &'a QualName {
        static NOT_AN_ELEMENT: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match dom.get(target.0).map(|n| &n.data) {
            Some(ArenaNodeData::Element { name, .. }) => {
                // SAFETY: the arena only grows while parsing and an element's
                // name is never replaced, so the name outlives the borrow guard.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            _ => &NOT_AN_ELEMENT,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> NodeHandle {
        let attrs = attrs
            .into_iter()
            .map(|a| Attribute {
                name: a.name,
                value: a.value.to_string(),
            })
            .collect();
        NodeHandle(self.dom.borrow_mut().create_element(name, attrs))
    }

    fn create_comment(&self, text: StrTendril) -> NodeHandle {
        NodeHandle(self.dom.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> NodeHandle {
        // Only reachable from XML; kept as a comment so nothing is lost.
        let text = format!("?{target} {data}?");
        NodeHandle(self.dom.borrow_mut().create_comment(text))
    }

    fn append(&self, parent: &NodeHandle, child: NodeOrText<NodeHandle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent.0, node.0),
            NodeOrText::AppendText(text) => dom.append_text(parent.0, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &NodeHandle,
        prev_element: &NodeHandle,
        child: NodeOrText<NodeHandle>,
    ) {
        let parent = self
            .dom
            .borrow()
            .get(element.0)
            .map(|n| n.parent)
            .filter(|p| p.is_some());
        match parent {
            Some(_) => self.append_before_sibling(element, child),
            None => self.append(prev_element, child),
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_doctype(
            name.to_string(),
            public_id.to_string(),
            system_id.to_string(),
        );
        let document = dom.document();
        dom.append(document, doctype);
    }

    fn get_template_contents(&self, target: &NodeHandle) -> NodeHandle {
        // Template content stays inline and is serialized back unchanged.
        *target
    }

    fn same_node(&self, x: &NodeHandle, y: &NodeHandle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn append_before_sibling(&self, sibling: &NodeHandle, new_node: NodeOrText<NodeHandle>) {
        let mut dom = self.dom.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node.0,
            NodeOrText::AppendText(text) => dom.create_text(text.to_string()),
        };
        dom.insert_before(sibling.0, node);
    }

    fn add_attrs_if_missing(&self, target: &NodeHandle, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        for attr in attrs {
            let local = attr.name.local.to_string();
            if dom.get_attr(target.0, &local).is_none() {
                dom.set_attr(target.0, &local, &attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &NodeHandle) {
        self.dom.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &NodeHandle, new_parent: &NodeHandle) {
        self.dom
            .borrow_mut()
            .reparent_children(node.0, new_parent.0);
    }
}
