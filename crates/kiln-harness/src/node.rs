#![forbid(unsafe_code)]

//! A minimal host node tree.

use kiln_core::EventHandler;

/// One rendered node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Plain text.
    Text(String),
    /// A tagged element with children and an optional click handler.
    Element {
        tag: String,
        children: Vec<Node>,
        on_click: Option<EventHandler>,
    },
}

impl Node {
    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// An element without a click handler.
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element {
            tag: tag.into(),
            children,
            on_click: None,
        }
    }

    /// A `button` element labelled `label` that fires `on_click`.
    pub fn button(label: impl Into<String>, on_click: EventHandler) -> Self {
        Self::Element {
            tag: "button".to_string(),
            children: vec![Self::text(label)],
            on_click: Some(on_click),
        }
    }

    /// Element tag, `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Element { tag, .. } => Some(tag),
        }
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// First clickable element, depth first, whose text is `label`.
    #[must_use]
    pub fn find_clickable(&self, label: &str) -> Option<&EventHandler> {
        match self {
            Self::Text(_) => None,
            Self::Element {
                children, on_click, ..
            } => {
                if let Some(handler) = on_click
                    && self.text_content() == label
                {
                    return Some(handler);
                }
                children.iter().find_map(|child| child.find_clickable(label))
            }
        }
    }
}

/// Concatenated text of a node list.
#[must_use]
pub fn text_content(nodes: &[Node]) -> String {
    nodes.iter().map(Node::text_content).collect()
}
