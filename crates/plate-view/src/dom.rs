use std::cell::Cell;
use std::fmt::Write as _;
use std::rc::Rc;

use plate_core::Attrs;
use serde_json::Value;

/// Identity of a mounted element inside a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// A slot the host fills with the mounted element's id, and clears on unmount.
#[derive(Debug, Clone, Default)]
pub struct NodeRef(Rc<Cell<Option<ElementId>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ElementId> {
        self.0.get()
    }

    pub fn set(&self, element: Option<ElementId>) {
        self.0.set(element);
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Ordered inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style(Vec<(String, String)>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let property = property.into();
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.0.push((property, value)),
        }
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (property, value) in &self.0 {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{property}: {value};");
        }
        out
    }
}

#[derive(Debug)]
pub struct ElementVNode {
    pub tag: String,
    pub attrs: Attrs,
    pub style: Style,
    pub children: Vec<VNode>,
    pub node_ref: Option<NodeRef>,
}

#[derive(Debug)]
pub enum VNodeKind {
    Element(ElementVNode),
    Text(String),
    Fragment(Vec<VNode>),
}

/// An immutable visual node. Clones share identity; see [`VNode::ptr_eq`].
#[derive(Debug, Clone)]
pub struct VNode(Rc<VNodeKind>);

impl VNode {
    pub fn element(tag: impl Into<String>) -> ElementBuilder {
        ElementBuilder {
            tag: tag.into(),
            attrs: Attrs::new(),
            style: Style::default(),
            children: Vec::new(),
            node_ref: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self(Rc::new(VNodeKind::Text(text.into())))
    }

    pub fn fragment(children: Vec<VNode>) -> Self {
        Self(Rc::new(VNodeKind::Fragment(children)))
    }

    pub fn kind(&self) -> &VNodeKind {
        &self.0
    }

    pub fn as_element(&self) -> Option<&ElementVNode> {
        match &*self.0 {
            VNodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Children with fragments flattened away.
    pub fn children(&self) -> Vec<&VNode> {
        let mut out = Vec::new();
        let direct: &[VNode] = match &*self.0 {
            VNodeKind::Element(el) => &el.children,
            VNodeKind::Fragment(children) => children,
            VNodeKind::Text(_) => &[],
        };
        for child in direct {
            match &*child.0 {
                VNodeKind::Fragment(_) => out.extend(child.children()),
                _ => out.push(child),
            }
        }
        out
    }

    /// Depth-first search over elements, including `self`.
    pub fn find_all(&self, pred: &dyn Fn(&ElementVNode) -> bool) -> Vec<&ElementVNode> {
        let mut out = Vec::new();
        self.collect(pred, &mut out);
        out
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&ElementVNode) -> bool, out: &mut Vec<&'a ElementVNode>) {
        match &*self.0 {
            VNodeKind::Element(el) => {
                if pred(el) {
                    out.push(el);
                }
                for child in &el.children {
                    child.collect(pred, out);
                }
            }
            VNodeKind::Fragment(children) => {
                for child in children {
                    child.collect(pred, out);
                }
            }
            VNodeKind::Text(_) => {}
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match &*self.0 {
            VNodeKind::Text(t) => out.push_str(t),
            VNodeKind::Element(el) => el.children.iter().for_each(|c| c.write_text(out)),
            VNodeKind::Fragment(children) => children.iter().for_each(|c| c.write_text(out)),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &*self.0 {
            VNodeKind::Text(t) => out.push_str(&escape(t)),
            VNodeKind::Fragment(children) => children.iter().for_each(|c| c.write_html(out)),
            VNodeKind::Element(el) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attrs {
                    match value {
                        Value::Null | Value::Bool(false) => {}
                        Value::String(s) => {
                            let _ = write!(out, " {name}=\"{}\"", escape(s));
                        }
                        other => {
                            let _ = write!(out, " {name}=\"{other}\"");
                        }
                    }
                }
                if !el.style.is_empty() {
                    let _ = write!(out, " style=\"{}\"", escape(&el.style.to_css()));
                }
                out.push('>');
                el.children.iter().for_each(|c| c.write_html(out));
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

impl ElementVNode {
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.attrs.get(name) == Some(&Value::Bool(true))
    }
}

pub struct ElementBuilder {
    tag: String,
    attrs: Attrs,
    style: Style,
    children: Vec<VNode>,
    node_ref: Option<NodeRef>,
}

impl ElementBuilder {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn node_ref(mut self, node_ref: Option<NodeRef>) -> Self {
        self.node_ref = node_ref;
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> VNode {
        VNode(Rc::new(VNodeKind::Element(ElementVNode {
            tag: self.tag,
            attrs: self.attrs,
            style: self.style,
            children: self.children,
            node_ref: self.node_ref,
        })))
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
