use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use plate_core::{Decoration, Editor, ElementNode, Node, Path, TextNode, ValueError};
use serde_json::Value;

use crate::config::ViewConfig;
use crate::context::{EditorHandle, EditorScope};
use crate::dom::{Style, VNode};
use crate::error::ScopeError;
use crate::host::Host;
use crate::leaf::{LeafProps, RenderLeaf, RenderPlaceholder};
use crate::memo::MemoLeaf;
use crate::resize::Platform;
use crate::style::StyleElement;

type LeafKey = (Path, usize);

/// The editable surface of one editor.
///
/// Owns the editor's injected style element, hands out stable references for
/// unchanged parents and texts, and keeps one gated leaf per leaf position.
pub struct Editable<H: Host + Clone + 'static> {
    editor: EditorHandle,
    host: H,
    platform: Rc<dyn Platform>,
    config: ViewConfig,
    style_element: StyleElement,
    render_leaf: Option<RenderLeaf>,
    render_placeholder: RenderPlaceholder,
    version: u64,
    parents: HashMap<Path, Rc<ElementNode>>,
    texts: HashMap<Path, Rc<TextNode>>,
    leaves: BTreeMap<LeafKey, MemoLeaf>,
}

/// Per-pass bookkeeping.
struct Pass {
    placeholder: Option<String>,
    parents: HashMap<Path, Rc<ElementNode>>,
    texts: HashMap<Path, Rc<TextNode>>,
    live: BTreeSet<LeafKey>,
}

impl<H: Host + Clone + 'static> Editable<H> {
    pub fn new(editor: EditorHandle, host: H, config: ViewConfig) -> Self {
        let config = config.with_defaults();
        let style_element = StyleElement::new(config.csp_nonce.clone());
        editor.set_style_element(Some(style_element.clone()));
        let platform: Rc<dyn Platform> = Rc::new(host.clone());
        Self {
            editor,
            host,
            platform,
            config,
            style_element,
            render_leaf: None,
            render_placeholder: RenderPlaceholder::default(),
            version: 0,
            parents: HashMap::new(),
            texts: HashMap::new(),
            leaves: BTreeMap::new(),
        }
    }

    /// A surface over a fresh editor holding the stored document `json`.
    pub fn load(json: &str, host: H, config: ViewConfig) -> Result<Self, ValueError> {
        let editor = EditorHandle::new(Editor::from_json(json)?);
        Ok(Self::new(editor, host, config))
    }

    /// The current document in stored form.
    pub fn save(&self) -> Result<String, ValueError> {
        self.editor.model().to_json()
    }

    pub fn render_leaf(mut self, render_leaf: RenderLeaf) -> Self {
        self.render_leaf = Some(render_leaf);
        self
    }

    pub fn render_placeholder(mut self, render_placeholder: RenderPlaceholder) -> Self {
        self.render_placeholder = render_placeholder;
        self
    }

    pub fn editor(&self) -> &EditorHandle {
        &self.editor
    }

    pub fn style_element(&self) -> &StyleElement {
        &self.style_element
    }

    pub fn leaf(&self, path: &[usize], index: usize) -> Option<&MemoLeaf> {
        self.leaves.get(&(path.to_vec(), index))
    }

    /// Runs one render pass: render, commit to the host, tear down leaves
    /// that went away, then run the effects of leaves that re-rendered.
    pub fn update(&mut self) -> Result<VNode, ScopeError> {
        self.version += 1;
        let _scope = EditorScope::enter_with_version(&self.editor, self.version);

        let editor = self.editor.clone();
        let model = editor.model();
        let mut pass = Pass {
            placeholder: self
                .config
                .placeholder
                .clone()
                .filter(|_| model.is_empty()),
            parents: HashMap::new(),
            texts: HashMap::new(),
            live: BTreeSet::new(),
        };

        let mut blocks = Vec::new();
        let mut path = Path::new();
        for (ix, node) in model.doc().children.iter().enumerate() {
            let Node::Element(el) = node else { continue };
            path.push(ix);
            blocks.push(self.render_element(el, &mut path, &mut pass)?);
            path.pop();
        }
        drop(model);

        let root = VNode::element("div")
            .attr("data-slate-editor", true)
            .attr("data-slate-editor-id", Value::from(self.editor.id().0))
            .attr("data-slate-node", "value")
            .attr("contenteditable", "true")
            .attr("role", "textbox")
            .style(
                Style::new()
                    .set("position", "relative")
                    .set("white-space", "pre-wrap")
                    .set("word-wrap", "break-word"),
            )
            .children(blocks)
            .build();

        self.host.commit(&root);

        self.parents = pass.parents;
        self.texts = pass.texts;
        let live = pass.live;
        self.leaves.retain(|key, _| live.contains(key));

        for leaf in self.leaves.values_mut() {
            leaf.commit();
        }

        tracing::debug!(
            editor = self.editor.id().0,
            version = self.version,
            leaves = self.leaves.len(),
            "render pass committed"
        );
        Ok(root)
    }

    fn render_element(
        &mut self,
        el: &ElementNode,
        path: &mut Path,
        pass: &mut Pass,
    ) -> Result<VNode, ScopeError> {
        let parent = stable(&self.parents, path, el);
        pass.parents.insert(path.clone(), parent.clone());

        let mut children = Vec::with_capacity(el.children.len());
        for (ix, child) in el.children.iter().enumerate() {
            path.push(ix);
            let rendered = match child {
                Node::Text(text) => self.render_text(&parent, text, path, pass)?,
                Node::Element(inner) => self.render_element(inner, path, pass)?,
            };
            children.push(rendered);
            path.pop();
        }

        Ok(VNode::element("div")
            .attr("data-slate-node", "element")
            .attr("data-slate-kind", el.kind.clone())
            .children(children)
            .build())
    }

    fn render_text(
        &mut self,
        parent: &Rc<ElementNode>,
        text: &TextNode,
        path: &Path,
        pass: &mut Pass,
    ) -> Result<VNode, ScopeError> {
        let text = stable(&self.texts, path, text);
        pass.texts.insert(path.clone(), text.clone());

        let decorations = match &pass.placeholder {
            Some(placeholder) if path.as_slice() == [0, 0] => {
                vec![Decoration::placeholder(placeholder.clone())]
            }
            _ => Vec::new(),
        };
        let leaves = text.leaves(&decorations);
        let count = leaves.len();

        let mut rendered = Vec::with_capacity(count);
        for (ix, leaf) in leaves.into_iter().enumerate() {
            let key = (path.clone(), ix);
            let memo = match self.leaves.entry(key.clone()) {
                std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::btree_map::Entry::Vacant(entry) => {
                    entry.insert(MemoLeaf::mount(self.platform.clone(), &self.config)?)
                }
            };
            let props = LeafProps::new(leaf, text.clone(), parent.clone())
                .is_last(ix + 1 == count)
                .render_placeholder(self.render_placeholder.clone())
                .render_leaf(self.render_leaf.clone());
            rendered.push(memo.render(props));
            pass.live.insert(key);
        }

        Ok(VNode::element("span")
            .attr("data-slate-node", "text")
            .children(rendered)
            .build())
    }
}

impl<H: Host + Clone + 'static> Drop for Editable<H> {
    fn drop(&mut self) {
        // Leaves release their registrations while the style element is still
        // attached, then the style element is detached.
        self.leaves.clear();
        if self
            .editor
            .style_element()
            .is_some_and(|el| el.ptr_eq(&self.style_element))
        {
            self.editor.set_style_element(None);
        }
    }
}

/// The previous `Rc` for `path` if its value is unchanged, otherwise a fresh one.
fn stable<T: Clone + PartialEq>(prev: &HashMap<Path, Rc<T>>, path: &Path, value: &T) -> Rc<T> {
    match prev.get(path) {
        Some(rc) if **rc == *value => rc.clone(),
        _ => Rc::new(value.clone()),
    }
}
