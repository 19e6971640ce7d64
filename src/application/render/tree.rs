use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::locale::Locale;

/// One node of a rendered page, consumed by the view layer as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderNode {
    Element {
        name: String,
        #[serde(skip_serializing_if = "Map::is_empty")]
        props: Map<String, Value>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<RenderNode>,
    },
    Text {
        value: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        marks: Vec<String>,
    },
}

impl RenderNode {
    pub fn element(name: impl Into<String>) -> Self {
        RenderNode::Element {
            name: name.into(),
            props: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        RenderNode::Text {
            value: value.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked_text(value: impl Into<String>, marks: &[&str]) -> Self {
        RenderNode::Text {
            value: value.into(),
            marks: marks.iter().map(|mark| (*mark).to_string()).collect(),
        }
    }

    /// Set a prop; no effect on text nodes.
    pub fn prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let RenderNode::Element { props, .. } = &mut self {
            props.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn opt_prop<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.prop(key, value),
            None => self,
        }
    }

    pub fn child(self, child: RenderNode) -> Self {
        self.children_from(std::iter::once(child))
    }

    pub fn opt_child(self, child: Option<RenderNode>) -> Self {
        self.children_from(child)
    }

    pub fn children_from(mut self, nodes: impl IntoIterator<Item = RenderNode>) -> Self {
        if let RenderNode::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RenderNode::Element { name, .. } => Some(name),
            RenderNode::Text { .. } => None,
        }
    }

    pub fn get_prop(&self, key: &str) -> Option<&Value> {
        match self {
            RenderNode::Element { props, .. } => props.get(key),
            RenderNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Element { children, .. } => children,
            RenderNode::Text { .. } => &[],
        }
    }

    /// All text below this node, concatenated.
    pub fn text_content(&self) -> String {
        match self {
            RenderNode::Text { value, .. } => value.clone(),
            RenderNode::Element { children, .. } => {
                children.iter().map(RenderNode::text_content).collect()
            }
        }
    }

    fn write_outline(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self {
            RenderNode::Text { value, marks } if marks.is_empty() => {
                let _ = writeln!(out, "{indent}{value:?}");
            }
            RenderNode::Text { value, marks } => {
                let _ = writeln!(out, "{indent}{value:?} [{}]", marks.join(","));
            }
            RenderNode::Element {
                name,
                props,
                children,
            } => {
                let _ = write!(out, "{indent}<{name}");
                for (key, value) in props {
                    let _ = write!(out, " {key}={value}");
                }
                let _ = writeln!(out, ">");
                for child in children {
                    child.write_outline(depth + 1, out);
                }
            }
        }
    }
}

/// The rendered form of a page in one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTree {
    pub locale: Locale,
    /// Rendered for a signed-in editor.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub preview: bool,
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    /// Indented one-node-per-line listing, used for diagnostics and tests.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_outline(0, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builders_ignore_props_on_text() {
        let text = RenderNode::text("hi").prop("x", 1).child(RenderNode::text("y"));
        assert_eq!(text, RenderNode::text("hi"));
    }

    #[test]
    fn serializes_compactly() {
        let node = RenderNode::element("link")
            .prop("href", "/en/about")
            .child(RenderNode::marked_text("About", &["bold"]));
        assert_eq!(
            serde_json::to_value(&node).expect("serializes"),
            json!({
                "type": "element",
                "name": "link",
                "props": {"href": "/en/about"},
                "children": [{"type": "text", "value": "About", "marks": ["bold"]}]
            })
        );
    }

    #[test]
    fn outline_lists_nodes() {
        let tree = RenderTree {
            locale: Locale::parse("en").expect("valid locale"),
            preview: false,
            nodes: vec![
                RenderNode::element("faq")
                    .prop("heading", "Questions")
                    .child(RenderNode::element("faqItem").child(RenderNode::text("Yes"))),
            ],
        };
        insta::assert_snapshot!(tree.outline(), @r#"
        <faq heading="Questions">
          <faqItem>
            "Yes"
        "#);
    }
}
