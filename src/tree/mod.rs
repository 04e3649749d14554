use crate::models::{MindmapDocument, TopicDoc};
use std::collections::HashSet;

pub(crate) const UNTITLED_TOPIC: &str = "Untitled Topic";
pub(crate) const UNTITLED_SHEET: &str = "Mindmap Viewer";
pub(crate) const PATH_SEPARATOR: &str = " > ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ViewerErrorKind {
    /// No embedded document on the page.
    MissingData,
    /// Embedded document is not valid JSON (or not the expected shape).
    Parse,
    /// Valid JSON but nothing renderable: no sheets, or no root topic.
    InvalidDocument,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ViewerError {
    pub kind: ViewerErrorKind,
    pub message: String,
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ViewerError {}

impl ViewerError {
    pub(crate) fn missing_data() -> Self {
        Self {
            kind: ViewerErrorKind::MissingData,
            message: "No mindmap data found on this page".to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ViewerErrorKind::Parse,
            message: format!("Mindmap data could not be read: {e}"),
        }
    }

    pub(crate) fn invalid(reason: &str) -> Self {
        Self {
            kind: ViewerErrorKind::InvalidDocument,
            message: format!("Invalid mindmap data: {reason}"),
        }
    }
}

pub(crate) type ViewerResult<T> = Result<T, ViewerError>;

/// One node of the mindmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Topic {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    pub hyperlink: Option<String>,
    pub children: Vec<Topic>,
    pub collapsed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Sheet {
    pub title: String,
    pub root_topic: Topic,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Convert the wire shape into topics, assigning positional keys where ids are
/// missing or already taken so keys stay unique across the whole sheet.
fn build_topic(doc: TopicDoc, seen: &mut HashSet<String>, counter: &mut usize) -> Topic {
    let n = *counter;
    *counter += 1;

    let id = match doc.id.map(|s| s.trim().to_string()) {
        Some(id) if !id.is_empty() && !seen.contains(&id) => id,
        _ => {
            let mut k = format!("n{n}");
            while seen.contains(&k) {
                k.push('_');
            }
            k
        }
    };
    seen.insert(id.clone());

    let title = non_blank(doc.title).unwrap_or_else(|| UNTITLED_TOPIC.to_string());

    let children = doc
        .children
        .into_iter()
        .map(|c| build_topic(c, seen, counter))
        .collect::<Vec<_>>();

    Topic {
        id,
        title,
        notes: non_blank(doc.notes),
        hyperlink: non_blank(doc.hyperlink).map(|s| s.trim().to_string()),
        collapsed: doc.branch_folded.unwrap_or(false),
        children,
    }
}

/// Build the sheet list. Only the first sheet has to be renderable; later
/// sheets without a root topic are dropped.
pub(crate) fn parse(document: MindmapDocument) -> ViewerResult<Vec<Sheet>> {
    let mut docs = document.sheets.into_iter();

    let Some(first) = docs.next() else {
        return Err(ViewerError::invalid("the document has no sheets"));
    };
    let Some(first_root) = first.root_topic else {
        return Err(ViewerError::invalid("the first sheet has no root topic"));
    };

    let sheet = |title: Option<String>, root: TopicDoc| {
        let mut seen = HashSet::new();
        let mut counter = 0;
        Sheet {
            title: non_blank(title).unwrap_or_else(|| UNTITLED_SHEET.to_string()),
            root_topic: build_topic(root, &mut seen, &mut counter),
        }
    };

    let mut sheets = vec![sheet(first.title, first_root)];
    for d in docs {
        if let Some(root) = d.root_topic {
            sheets.push(sheet(d.title, root));
        }
    }
    Ok(sheets)
}

pub(crate) fn parse_json(text: &str) -> ViewerResult<Vec<Sheet>> {
    if text.trim().is_empty() {
        return Err(ViewerError::missing_data());
    }
    let document: MindmapDocument = serde_json::from_str(text).map_err(ViewerError::parse)?;
    parse(document)
}

/// Read and parse the document embedded in `<script id=element_id>`, returning
/// its first sheet.
pub(crate) fn load_embedded_sheet(element_id: &str) -> ViewerResult<Sheet> {
    let text = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(element_id))
        .and_then(|el| el.text_content())
        .ok_or_else(ViewerError::missing_data)?;

    parse_json(&text)?
        .into_iter()
        .next()
        .ok_or_else(|| ViewerError::invalid("the document has no sheets"))
}

/// Index into a [`TopicTree`]. Indices follow pre-order, so comparing two
/// indices compares document order.
pub(crate) type NodeIdx = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TreeNode {
    pub key: String,
    pub title: String,
    pub notes: Option<String>,
    pub hyperlink: Option<String>,
    pub collapsed: bool,
    pub parent: Option<NodeIdx>,
    pub children: Vec<NodeIdx>,
    pub depth: usize,
}

/// Flattened, read-only form of a sheet's topics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TopicTree {
    nodes: Vec<TreeNode>,
}

impl TopicTree {
    pub(crate) fn from_topic(root: &Topic) -> Self {
        let mut nodes = Vec::new();
        Self::push(&mut nodes, root, None, 0);
        Self { nodes }
    }

    fn push(nodes: &mut Vec<TreeNode>, topic: &Topic, parent: Option<NodeIdx>, depth: usize) -> NodeIdx {
        let idx = nodes.len();
        nodes.push(TreeNode {
            key: topic.id.clone(),
            title: topic.title.clone(),
            notes: topic.notes.clone(),
            hyperlink: topic.hyperlink.clone(),
            collapsed: topic.collapsed,
            parent,
            children: Vec::with_capacity(topic.children.len()),
            depth,
        });

        for child in &topic.children {
            let c = Self::push(nodes, child, Some(idx), depth + 1);
            nodes[idx].children.push(c);
        }
        idx
    }

    pub(crate) fn root(&self) -> Option<NodeIdx> {
        (!self.nodes.is_empty()).then_some(0)
    }

    pub(crate) fn get(&self, idx: NodeIdx) -> Option<&TreeNode> {
        self.nodes.get(idx)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in document (pre-order) order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeIdx, &TreeNode)> {
        self.nodes.iter().enumerate()
    }

    pub(crate) fn has_children(&self, idx: NodeIdx) -> bool {
        self.get(idx).is_some_and(|n| !n.children.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn find_key(&self, key: &str) -> Option<NodeIdx> {
        self.nodes.iter().position(|n| n.key == key)
    }

    /// Ancestors of `idx`, nearest first. Empty for the root.
    pub(crate) fn ancestors(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut out = vec![];
        let mut cur = self.get(idx).and_then(|n| n.parent);
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p].parent;
        }
        out
    }

    /// Root-to-node title chain, e.g. `"R > Banana"`.
    pub(crate) fn path(&self, idx: NodeIdx) -> String {
        let Some(node) = self.get(idx) else {
            return String::new();
        };
        let mut titles = self
            .ancestors(idx)
            .into_iter()
            .map(|a| self.nodes[a].title.as_str())
            .collect::<Vec<_>>();
        titles.reverse();
        titles.push(node.title.as_str());
        titles.join(PATH_SEPARATOR)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn topic(id: &str, title: &str, children: Vec<Topic>) -> Topic {
        Topic {
            id: id.to_string(),
            title: title.to_string(),
            notes: None,
            hyperlink: None,
            children,
            collapsed: false,
        }
    }

    /// `R -> [A "Apple", B "Banana" -> [C "Grape"]]`
    pub(crate) fn fruit_tree() -> TopicTree {
        TopicTree::from_topic(&topic(
            "r",
            "R",
            vec![
                topic("a", "Apple", vec![]),
                topic("b", "Banana", vec![topic("c", "Grape", vec![])]),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_parse_rejects_empty_sheet_list() {
        let err = parse_json(r#"{"sheets": []}"#).expect_err("no sheets should fail");
        assert_eq!(err.kind, ViewerErrorKind::InvalidDocument);
    }

    #[test]
    fn test_parse_rejects_missing_sheets_field() {
        let err = parse_json("{}").expect_err("missing sheets should fail");
        assert_eq!(err.kind, ViewerErrorKind::InvalidDocument);
    }

    #[test]
    fn test_parse_rejects_missing_root_topic() {
        let err = parse_json(r#"{"sheets": [{"title": "S"}]}"#).expect_err("no root should fail");
        assert_eq!(err.kind, ViewerErrorKind::InvalidDocument);
    }

    #[test]
    fn test_parse_blank_text_is_missing_data() {
        let err = parse_json("  \n ").expect_err("blank should fail");
        assert_eq!(err.kind, ViewerErrorKind::MissingData);
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_json("{\"sheets\": [").expect_err("malformed should fail");
        assert_eq!(err.kind, ViewerErrorKind::Parse);
        assert!(err.to_string().starts_with("Mindmap data could not be read"));
    }

    #[test]
    fn test_parse_defaults_and_fold_flag() {
        let json = r#"{
            "sheets": [{
                "title": "Plan",
                "root_topic": {
                    "id": "root",
                    "title": "Root",
                    "branch_folded": true,
                    "children": [
                        {"id": "x", "title": "  ", "notes": "   ", "hyperlink": ""},
                        {"id": "y", "notes": "n1\nn2", "hyperlink": " https://example.com ", "children": null}
                    ]
                }
            }]
        }"#;
        let sheets = parse_json(json).expect("should parse");
        assert_eq!(sheets.len(), 1);
        let root = &sheets[0].root_topic;
        assert_eq!(sheets[0].title, "Plan");
        assert!(root.collapsed);
        assert_eq!(root.children[0].title, UNTITLED_TOPIC);
        assert!(root.children[0].notes.is_none());
        assert!(root.children[0].hyperlink.is_none());
        assert_eq!(root.children[1].title, UNTITLED_TOPIC);
        assert_eq!(root.children[1].notes.as_deref(), Some("n1\nn2"));
        assert_eq!(root.children[1].hyperlink.as_deref(), Some("https://example.com"));
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn test_parse_sheet_title_fallback_and_extra_sheets() {
        let json = r#"{
            "sheets": [
                {"root_topic": {"id": "a", "title": "A"}},
                {"title": "dropped"},
                {"title": "Second", "root_topic": {"id": "b", "title": "B"}}
            ]
        }"#;
        let sheets = parse_json(json).expect("should parse");
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].title, UNTITLED_SHEET);
        assert_eq!(sheets[1].title, "Second");
    }

    #[test]
    fn test_parse_assigns_unique_keys() {
        let json = r#"{
            "sheets": [{"root_topic": {"id": "dup", "title": "R", "children": [
                {"id": "dup", "title": "A"},
                {"title": "B"}
            ]}}]
        }"#;
        let sheets = parse_json(json).expect("should parse");
        let tree = TopicTree::from_topic(&sheets[0].root_topic);
        let keys = tree.iter().map(|(_, n)| n.key.clone()).collect::<HashSet<_>>();
        assert_eq!(keys.len(), tree.len());
        assert_eq!(tree.get(0).map(|n| n.key.as_str()), Some("dup"));
    }

    #[test]
    fn test_tree_is_preorder() {
        let tree = fruit_tree();
        let titles = tree.iter().map(|(_, n)| n.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["R", "Apple", "Banana", "Grape"]);
        assert_eq!(tree.get(3).map(|n| n.depth), Some(2));
        assert_eq!(tree.get(2).map(|n| n.children.clone()), Some(vec![3]));
    }

    #[test]
    fn test_ancestors_and_path() {
        let tree = fruit_tree();
        assert!(tree.ancestors(0).is_empty());
        assert_eq!(tree.ancestors(3), vec![2, 0]);
        assert_eq!(tree.path(2), "R > Banana");
        assert_eq!(tree.path(3), "R > Banana > Grape");
        assert_eq!(tree.path(0), "R");
        assert_eq!(tree.path(99), "");
    }

    #[test]
    fn test_has_children_and_find_key() {
        let tree = fruit_tree();
        assert!(tree.has_children(0));
        assert!(!tree.has_children(1));
        assert_eq!(tree.find_key("c"), Some(3));
        assert_eq!(tree.find_key("zzz"), None);
    }
}
