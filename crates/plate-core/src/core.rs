use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Attrs = BTreeMap<String, Value>;
pub type ElementKind = String;
pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind: "paragraph".to_string(),
            attrs: Attrs::default(),
            children: vec![Node::Text(TextNode::new(text))],
        })
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn text(text: TextNode) -> Self {
        Node::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn with_mark(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.marks.set(name, value);
        self
    }
}

/// Formatting marks of a text span, keyed by mark name.
///
/// Values are arbitrary JSON, so a mark can carry a nested structure (for
/// example `{"color": {"fg": "#333", "alpha": 0.5}}`). Equality is deep and
/// ignores insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Marks(BTreeMap<String, Value>);

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn is_active(&self, name: &str) -> bool {
        match self.0.get(name) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Layers `other` on top of `self`; marks in `other` win.
    pub fn merged(&self, other: &Marks) -> Marks {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Marks {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

pub struct Editor {
    doc: Document,
}

impl Editor {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }

    pub fn empty() -> Self {
        Self::new(Document {
            children: vec![Node::paragraph("")],
        })
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn set_doc(&mut self, doc: Document) {
        self.doc = doc;
    }

    /// True when the document is one element holding one empty text.
    pub fn is_empty(&self) -> bool {
        let [Node::Element(el)] = self.doc.children.as_slice() else {
            return false;
        };
        matches!(el.children.as_slice(), [Node::Text(t)] if t.text.is_empty())
    }
}
