use std::rc::Rc;

use plate_core::{Attrs, ElementNode, Leaf, TextNode};
use serde_json::Value;

use crate::config::ViewConfig;
use crate::context::{EditorHandle, current_editor};
use crate::dom::{ElementId, NodeRef, Style, VNode};
use crate::error::ScopeError;
use crate::placeholder::PlaceholderHeightSync;
use crate::resize::Platform;
use crate::string::render_text_run;
use crate::style::placeholder_style;

pub struct RenderLeafProps<'a> {
    pub attributes: Attrs,
    pub children: VNode,
    pub leaf: &'a Leaf,
    pub text: &'a TextNode,
}

pub struct PlaceholderAttributes {
    pub attrs: Attrs,
    pub style: Style,
    /// Must end up on the overlay's root element, or the height sync has
    /// nothing to measure.
    pub node_ref: NodeRef,
}

pub struct RenderPlaceholderProps {
    pub children: String,
    pub attributes: PlaceholderAttributes,
}

/// Override for how a leaf wraps its content. Compared by identity.
#[derive(Clone)]
pub struct RenderLeaf(Rc<dyn Fn(RenderLeafProps<'_>) -> VNode>);

impl RenderLeaf {
    pub fn new(f: impl Fn(RenderLeafProps<'_>) -> VNode + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn ptr_eq(&self, other: &RenderLeaf) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn call(&self, props: RenderLeafProps<'_>) -> VNode {
        (self.0)(props)
    }
}

/// Override for how the placeholder overlay is drawn. Compared by identity.
#[derive(Clone)]
pub struct RenderPlaceholder(Rc<dyn Fn(RenderPlaceholderProps) -> VNode>);

thread_local! {
    static DEFAULT_RENDER_PLACEHOLDER: RenderPlaceholder =
        RenderPlaceholder(Rc::new(default_placeholder));
}

impl RenderPlaceholder {
    pub fn new(f: impl Fn(RenderPlaceholderProps) -> VNode + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn ptr_eq(&self, other: &RenderPlaceholder) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn call(&self, props: RenderPlaceholderProps) -> VNode {
        (self.0)(props)
    }
}

impl Default for RenderPlaceholder {
    /// The shared default renderer; every call returns the same instance.
    fn default() -> Self {
        DEFAULT_RENDER_PLACEHOLDER.with(Clone::clone)
    }
}

pub fn default_leaf(props: RenderLeafProps<'_>) -> VNode {
    VNode::element("span")
        .attrs(props.attributes)
        .child(props.children)
        .build()
}

pub fn default_placeholder(props: RenderPlaceholderProps) -> VNode {
    let PlaceholderAttributes {
        attrs,
        style,
        node_ref,
    } = props.attributes;
    VNode::element("span")
        .attrs(attrs)
        .style(style)
        .node_ref(Some(node_ref))
        .child(VNode::text(props.children))
        .build()
}

/// Everything a leaf is rendered from.
#[derive(Clone)]
pub struct LeafProps {
    pub leaf: Leaf,
    pub is_last: bool,
    pub text: Rc<TextNode>,
    pub parent: Rc<ElementNode>,
    pub render_placeholder: RenderPlaceholder,
    pub render_leaf: Option<RenderLeaf>,
}

impl LeafProps {
    pub fn new(leaf: Leaf, text: Rc<TextNode>, parent: Rc<ElementNode>) -> Self {
        Self {
            leaf,
            is_last: false,
            text,
            parent,
            render_placeholder: RenderPlaceholder::default(),
            render_leaf: None,
        }
    }

    pub fn is_last(mut self, is_last: bool) -> Self {
        self.is_last = is_last;
        self
    }

    pub fn render_placeholder(mut self, render_placeholder: RenderPlaceholder) -> Self {
        self.render_placeholder = render_placeholder;
        self
    }

    pub fn render_leaf(mut self, render_leaf: Option<RenderLeaf>) -> Self {
        self.render_leaf = render_leaf;
        self
    }
}

/// One rendered leaf: its placeholder ref, its claim on the editor's
/// placeholder registration and its height synchronizer.
pub struct LeafView {
    editor: EditorHandle,
    placeholder_ref: NodeRef,
    registered: Option<ElementId>,
    placeholder_opacity: f32,
    height_sync: PlaceholderHeightSync,
}

impl LeafView {
    /// Must be called inside an [`EditorScope`](crate::EditorScope).
    pub fn mount(platform: Rc<dyn Platform>, config: &ViewConfig) -> Result<Self, ScopeError> {
        let editor = current_editor()?;
        let config = config.clone().with_defaults();
        Ok(Self {
            height_sync: PlaceholderHeightSync::new(
                editor.clone(),
                platform,
                config.use_where_selector,
            ),
            editor,
            placeholder_ref: NodeRef::new(),
            registered: None,
            placeholder_opacity: config.placeholder_opacity,
        })
    }

    pub fn editor(&self) -> &EditorHandle {
        &self.editor
    }

    pub fn placeholder_element(&self) -> Option<ElementId> {
        self.placeholder_ref.get()
    }

    pub fn height_sync(&self) -> &PlaceholderHeightSync {
        &self.height_sync
    }

    pub fn render(&self, props: &LeafProps) -> VNode {
        let LeafProps {
            leaf,
            is_last,
            text,
            parent,
            render_placeholder,
            render_leaf,
        } = props;

        let mut children = render_text_run(leaf, *is_last, text, parent);

        if let Some(placeholder) = &leaf.placeholder {
            let mut attrs = Attrs::new();
            attrs.insert("data-slate-placeholder".into(), Value::Bool(true));
            attrs.insert("contenteditable".into(), Value::from("false"));
            let overlay = render_placeholder.call(RenderPlaceholderProps {
                children: placeholder.content.clone(),
                attributes: PlaceholderAttributes {
                    attrs,
                    style: placeholder_style(self.placeholder_opacity),
                    node_ref: self.placeholder_ref.clone(),
                },
            });
            children = VNode::fragment(vec![overlay, children]);
        }

        // Browsers' contenteditable handling clones or drops inline nodes
        // without a data attribute.
        let mut attributes = Attrs::new();
        attributes.insert("data-slate-leaf".into(), Value::Bool(true));

        let props = RenderLeafProps {
            attributes,
            children,
            leaf,
            text: text.as_ref(),
        };
        match render_leaf {
            Some(render_leaf) => render_leaf.call(props),
            None => default_leaf(props),
        }
    }

    /// Runs after the host committed the pass this leaf rendered in.
    pub fn commit(&mut self) {
        let element = self.placeholder_ref.get();

        if let Some(previous) = self.registered.take() {
            if Some(previous) != element {
                self.editor.release_placeholder_element(previous);
            }
        }
        if let Some(element) = element {
            self.editor.set_placeholder_element(element);
            self.registered = Some(element);
        }

        self.height_sync.sync(element);
    }
}

impl Drop for LeafView {
    fn drop(&mut self) {
        if let Some(previous) = self.registered.take() {
            self.editor.release_placeholder_element(previous);
        }
    }
}
