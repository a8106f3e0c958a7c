//! Mutable MEI element tree
//!
//! roxmltree documents are read-only, so the parsed tree is copied into an
//! arena of elements with parent links. Detached elements stay in the arena
//! but are unreachable from the root; id lookups only find attached ones.
//! Serialisation goes through quick-xml.

use std::collections::HashMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::MeiError;
use crate::models::ElementId;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Attribute holding element ids
pub const XML_ID: &str = "xml:id";

/// Handle to an element in a [`MeiDocument`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug, PartialEq)]
enum Content {
    Element(NodeId),
    Text(String),
}

#[derive(Clone, Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
    parent: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct MeiDocument {
    nodes: Vec<Element>,
    root: NodeId,
    ids: HashMap<String, NodeId>,
}

impl MeiDocument {
    /// Document with a single empty root element
    pub fn new(root: &str) -> Self {
        Self {
            nodes: vec![Element {
                name: root.to_string(),
                attributes: Vec::new(),
                content: Vec::new(),
                parent: None,
            }],
            root: NodeId(0),
            ids: HashMap::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, MeiError> {
        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = true;
        let xml = roxmltree::Document::parse_with_options(text, options)
            .map_err(|e| MeiError::InvalidXml(e.to_string()))?;

        let root = xml.root_element();
        let mut doc = MeiDocument::new(root.tag_name().name());
        for ns in root.namespaces() {
            let name = match ns.name() {
                Some(prefix) if prefix == "xml" => continue,
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            doc.nodes[0].attributes.push((name, ns.uri().to_string()));
        }
        let root_id = doc.root;
        doc.copy_attributes(root_id, root);
        doc.copy_children(root_id, root);
        Ok(doc)
    }

    fn copy_attributes(&mut self, id: NodeId, node: roxmltree::Node) {
        for attr in node.attributes() {
            let name = match attr.namespace() {
                Some(XML_NS) => format!("xml:{}", attr.name()),
                Some(XLINK_NS) => format!("xlink:{}", attr.name()),
                _ => attr.name().to_string(),
            };
            self.set_attribute(id, &name, attr.value());
        }
    }

    fn copy_children(&mut self, parent: NodeId, node: roxmltree::Node) {
        for child in node.children() {
            if child.is_element() {
                let id = self.alloc(child.tag_name().name());
                self.copy_attributes(id, child);
                self.attach(parent, id, None);
                self.copy_children(id, child);
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                if !text.trim().is_empty() {
                    self.nodes[parent.0].content.push(Content::Text(text.to_string()));
                }
            }
        }
    }

    fn alloc(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element {
            name: name.to_string(),
            attributes: Vec::new(),
            content: Vec::new(),
            parent: None,
        });
        id
    }

    /// New detached element with a generated `m-<uuid>` id
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let id = self.alloc(name);
        self.set_attribute(id, XML_ID, ElementId::generate().as_str());
        id
    }

    // --- navigation ---

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// True when the element is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn get_element_by_id(&self, xml_id: &str) -> Option<NodeId> {
        self.ids
            .get(xml_id)
            .copied()
            .filter(|id| self.attribute(*id, XML_ID) == Some(xml_id) && self.is_attached(*id))
    }

    /// Like [`get_element_by_id`](Self::get_element_by_id) but an error when
    /// the id is unknown
    pub fn require(&self, xml_id: &str) -> Result<NodeId, MeiError> {
        self.get_element_by_id(xml_id)
            .ok_or_else(|| MeiError::ElementNotFound(xml_id.to_string()))
    }

    /// Element children in order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Element(child) => Some(*child),
                Content::Text(_) => None,
            })
            .collect()
    }

    pub fn children_by_name(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|c| self.name(*c) == name)
            .collect()
    }

    /// Descendants of `id` with the given name, in document order
    pub fn descendants_by_name(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            if self.name(current) == name {
                found.push(current);
            }
            stack.extend(self.children(current).into_iter().rev());
        }
        found
    }

    /// Every attached element with the given name, root included
    pub fn elements_by_name(&self, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        if self.name(self.root) == name {
            found.push(self.root);
        }
        found.extend(self.descendants_by_name(self.root, name));
        found
    }

    /// Element children of the parent, the element itself included
    pub fn peers(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => vec![id],
        }
    }

    /// Concatenated direct text content
    pub fn text(&self, id: NodeId) -> String {
        self.nodes[id.0]
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    // --- attributes ---

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.nodes[id.0].attributes
    }

    pub fn xml_id(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, XML_ID)
    }

    /// Add or overwrite an attribute
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if name == XML_ID {
            if let Some(old) = self.attribute(id, XML_ID).map(str::to_string) {
                self.ids.remove(&old);
            }
            self.ids.insert(value.to_string(), id);
        }
        let attributes = &mut self.nodes[id.0].attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attributes = &mut self.nodes[id.0].attributes;
        let index = attributes.iter().position(|(k, _)| k == name)?;
        let (_, value) = attributes.remove(index);
        if name == XML_ID {
            self.ids.remove(&value);
        }
        Some(value)
    }

    /// Replace every attribute except the element id
    pub fn set_attributes(&mut self, id: NodeId, attributes: &[(&str, &str)]) {
        self.nodes[id.0].attributes.retain(|(k, _)| k == XML_ID);
        for (name, value) in attributes {
            self.set_attribute(id, name, value);
        }
    }

    // --- structure ---

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.nodes[child.0].parent = Some(parent);
        let content = &mut self.nodes[parent.0].content;
        match index {
            Some(i) => content.insert(i, Content::Element(child)),
            None => content.push(Content::Element(child)),
        }
    }

    /// Detach an element from wherever it currently sits
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0]
                .content
                .retain(|c| *c != Content::Element(child));
        }
    }

    /// Append `child` to `parent`, moving it if it is attached elsewhere
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.attach(parent, child, None);
    }

    /// Insert `child` into `parent` right before `before`
    pub fn add_child_before(&mut self, parent: NodeId, before: NodeId, child: NodeId) -> Result<(), MeiError> {
        if child == before {
            return Ok(());
        }
        self.detach(child);
        let index = self.nodes[parent.0]
            .content
            .iter()
            .position(|c| *c == Content::Element(before))
            .ok_or_else(|| {
                MeiError::MissingElement(format!(
                    "<{}> is not a child of <{}>",
                    self.name(before),
                    self.name(parent)
                ))
            })?;
        self.attach(parent, child, Some(index));
        Ok(())
    }

    /// Remove `child` from `parent`; false when it was not a child
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Replace the children of `parent`
    pub fn set_children(&mut self, parent: NodeId, children: &[NodeId]) {
        for old in self.children(parent) {
            self.nodes[old.0].parent = None;
        }
        self.nodes[parent.0].content.clear();
        for child in children {
            self.add_child(parent, *child);
        }
    }

    // --- output ---

    pub fn to_xml_string(&self) -> Result<String, MeiError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_element(&mut writer, self.root)?;
        String::from_utf8(writer.into_inner()).map_err(|e| MeiError::Write(e.to_string()))
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), MeiError> {
        let element = &self.nodes[id.0];
        let mut start = BytesStart::new(element.name.as_str());
        for (k, v) in &element.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if element.content.is_empty() {
            return emit(writer, Event::Empty(start));
        }
        emit(writer, Event::Start(start))?;
        for content in &element.content {
            match content {
                Content::Element(child) => self.write_element(writer, *child)?,
                Content::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
            }
        }
        emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), MeiError> {
    writer
        .write_event(event)
        .map_err(|e| MeiError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mei xmlns="http://www.music-encoding.org/ns/mei" xmlns:xlink="http://www.w3.org/1999/xlink">
  <music>
    <layer xml:id="l1">
      <neume xml:id="n1" name="punctum"/>
      <neume xml:id="n2" name="clivis"><nc><note pname="c" oct="4"/><note pname="b" oct="3"/></nc></neume>
      <syl>Al</syl>
    </layer>
  </music>
</mei>"#;

    #[test]
    fn test_parse_and_lookup() {
        let doc = MeiDocument::parse(SAMPLE).unwrap();
        let n2 = doc.get_element_by_id("n2").unwrap();
        assert_eq!(doc.name(n2), "neume");
        assert_eq!(doc.attribute(n2, "name"), Some("clivis"));
        assert_eq!(doc.descendants_by_name(n2, "note").len(), 2);
        assert_eq!(doc.elements_by_name("neume").len(), 2);
        assert_eq!(doc.attribute(doc.root(), "xmlns"), Some("http://www.music-encoding.org/ns/mei"));

        let syl = doc.elements_by_name("syl")[0];
        assert_eq!(doc.text(syl), "Al");
    }

    #[test]
    fn test_invalid_xml() {
        assert!(matches!(MeiDocument::parse("<mei><oops></mei>"), Err(MeiError::InvalidXml(_))));
    }

    #[test]
    fn test_move_and_remove() {
        let mut doc = MeiDocument::parse(SAMPLE).unwrap();
        let layer = doc.get_element_by_id("l1").unwrap();
        let n1 = doc.get_element_by_id("n1").unwrap();
        let n2 = doc.get_element_by_id("n2").unwrap();

        doc.add_child_before(layer, n1, n2).unwrap();
        let order: Vec<&str> = doc.children(layer).iter().filter_map(|c| doc.xml_id(*c)).collect();
        assert_eq!(order, vec!["n2", "n1"]);
        assert_eq!(doc.peers(n1).len(), 3);

        assert!(doc.remove_child(layer, n1));
        assert!(!doc.remove_child(layer, n1));
        assert!(doc.get_element_by_id("n1").is_none());
    }

    #[test]
    fn test_created_elements_get_ids() {
        let mut doc = MeiDocument::new("mei");
        let zone = doc.create_element("zone");
        let xml_id = doc.xml_id(zone).unwrap().to_string();
        assert!(xml_id.starts_with("m-"));
        // not attached yet
        assert!(doc.get_element_by_id(&xml_id).is_none());
        let root = doc.root();
        doc.add_child(root, zone);
        assert_eq!(doc.get_element_by_id(&xml_id), Some(zone));
    }

    #[test]
    fn test_set_attributes_keeps_id() {
        let mut doc = MeiDocument::parse(SAMPLE).unwrap();
        let nc = doc.elements_by_name("nc")[0];
        doc.set_attribute(nc, XML_ID, "nc1");
        doc.set_attribute(nc, "inclinatum", "true");
        doc.set_attributes(nc, &[("quilisma", "true")]);
        assert_eq!(doc.attribute(nc, "inclinatum"), None);
        assert_eq!(doc.attribute(nc, "quilisma"), Some("true"));
        assert_eq!(doc.get_element_by_id("nc1"), Some(nc));
    }

    #[test]
    fn test_serialise_roundtrips_structure() {
        let doc = MeiDocument::parse(SAMPLE).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xml:id=\"n1\""));
        assert!(xml.contains("<syl>Al</syl>"));

        let again = MeiDocument::parse(&xml).unwrap();
        assert_eq!(again.elements_by_name("note").len(), 2);
        assert!(again.get_element_by_id("l1").is_some());
    }
}
