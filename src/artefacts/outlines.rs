//! The document outline (bookmark) tree.
//!
//! Outline nodes live in a flat arena and relate to each other through
//! indices, built incrementally by a push/pop stack: a push adds a child
//! under the current top of stack (or a new root), a pop must name the
//! node on top. Serialization writes each node as an open dictionary so
//! the following sibling's reference can be injected as /Next before the
//! dictionary closes; children render first so /First, /Last and /Count
//! are known while the parent is still open.

use super::{ArtefactToken, Color};
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::writer::PdfWriter;
use std::io::Write;

/// One outline item as supplied by the content producer.
#[derive(Debug, Clone)]
pub struct OutlineItem {
    /// Title shown in the bookmark panel
    pub title: String,
    /// Named destination the item jumps to
    pub destination: String,
    /// Optional text color
    pub color: Option<Color>,
    /// Render the title italic
    pub italic: bool,
    /// Render the title bold
    pub bold: bool,
    /// Whether the item's children start expanded
    pub open: bool,
}

impl OutlineItem {
    /// Create an item with default appearance, open by default.
    pub fn new(title: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination: destination.into(),
            color: None,
            italic: false,
            bold: false,
            open: true,
        }
    }

    /// Collapse the item's children by default.
    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    /// Set the title color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Render the title bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Render the title italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

#[derive(Debug)]
struct OutlineNode {
    item: OutlineItem,
    children: Vec<usize>,
}

/// The outline collection: an arena of nodes plus the build stack.
#[derive(Debug)]
pub struct OutlineStack {
    name: &'static str,
    nodes: Vec<OutlineNode>,
    roots: Vec<usize>,
    stack: Vec<usize>,
}

impl OutlineStack {
    /// Create an empty outline stack.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            nodes: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// True when no items have been pushed.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Push an item under the current top of stack, or as a new root.
    pub fn push(&mut self, item: OutlineItem) -> ArtefactToken {
        let index = self.nodes.len();
        self.nodes.push(OutlineNode {
            item,
            children: Vec::new(),
        });
        match self.stack.last() {
            Some(&parent) => self.nodes[parent].children.push(index),
            None => self.roots.push(index),
        }
        self.stack.push(index);
        ArtefactToken(index)
    }

    /// Pop the item on top of the stack; the token must match it.
    pub fn pop(&mut self, token: ArtefactToken) -> Result<()> {
        match self.stack.pop() {
            Some(top) if top == token.0 => Ok(()),
            _ => Err(Error::UnbalancedArtefact(self.name.to_string())),
        }
    }

    /// Serialize the outline tree.
    ///
    /// Returns the reference of the /Outlines root, or `None` when no
    /// items were registered. Fails when pushes were never balanced by
    /// pops.
    pub fn write_to<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        if self.roots.is_empty() {
            return Ok(None);
        }
        if !self.stack.is_empty() {
            return Err(Error::UnbalancedArtefact(self.name.to_string()));
        }

        let outlines = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.write_dictionary_name_entry("Type", "Outlines")?;

        let roots = self.roots.clone();
        let (first, last, count) = self.render_nodes(&roots, outlines, writer)?;
        writer.write_dictionary_object_ref_entry("First", first)?;
        writer.write_dictionary_object_ref_entry("Last", last)?;
        if count > 0 {
            writer.write_dictionary_number_entry("Count", count)?;
        }

        writer.end_dictionary()?;
        writer.end_object()?;
        log::debug!(
            "Rendered outline tree {} with first {}, last {} and count {}",
            outlines,
            first,
            last,
            count
        );
        Ok(Some(outlines))
    }

    /// Render a run of siblings, leaving every dictionary open, then
    /// close them in reverse order injecting each /Next reference.
    fn render_nodes<W: Write>(
        &self,
        nodes: &[usize],
        parent: ObjectRef,
        writer: &mut PdfWriter<W>,
    ) -> Result<(ObjectRef, ObjectRef, i64)> {
        let mut refs: Vec<ObjectRef> = Vec::with_capacity(nodes.len());
        let mut count = 0i64;
        for &index in nodes {
            let prev = refs.last().copied();
            let (oref, visible) = self.render_node(index, parent, prev, writer)?;
            refs.push(oref);
            count += visible;
        }

        for position in (0..refs.len()).rev() {
            if position < refs.len() - 1 {
                writer.write_dictionary_object_ref_entry("Next", refs[position + 1])?;
            }
            writer.end_dictionary()?;
            writer.end_object()?;
        }

        let first = refs[0];
        let last = *refs.last().expect("nodes is non-empty");
        Ok((first, last, count))
    }

    /// Render one node's dictionary, leaving it open for /Next.
    fn render_node<W: Write>(
        &self,
        index: usize,
        parent: ObjectRef,
        prev: Option<ObjectRef>,
        writer: &mut PdfWriter<W>,
    ) -> Result<(ObjectRef, i64)> {
        let node = &self.nodes[index];
        let item = &node.item;

        let oref = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.write_dictionary_object_ref_entry("Parent", parent)?;
        writer.write_dictionary_string_entry("Title", &item.title)?;
        writer.write_dictionary_string_entry("Dest", &item.destination)?;

        if let Some(color) = item.color {
            writer.begin_dictionary_entry("C")?;
            super::write_color_array(writer, color)?;
            writer.end_dictionary_entry()?;
        }

        let mut style = 0i64;
        if item.italic {
            style |= 1;
        }
        if item.bold {
            style |= 2;
        }
        if style != 0 {
            writer.write_dictionary_number_entry("F", style)?;
        }

        if let Some(prev) = prev {
            writer.write_dictionary_object_ref_entry("Prev", prev)?;
        }

        let mut visible = 1i64;
        if !node.children.is_empty() {
            let (first, last, inner) = self.render_nodes(&node.children, oref, writer)?;
            writer.write_dictionary_object_ref_entry("First", first)?;
            writer.write_dictionary_object_ref_entry("Last", last)?;
            if inner > 0 {
                if item.open {
                    writer.write_dictionary_number_entry("Count", inner)?;
                    visible += inner;
                } else {
                    writer.write_dictionary_number_entry("Count", -inner)?;
                }
            }
        }

        // dictionary stays open: the caller injects /Next and closes it
        Ok((oref, visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;

    fn writer() -> PdfWriter<Vec<u8>> {
        PdfWriter::new(Vec::new(), WriterConfig::default())
    }

    #[test]
    fn test_empty_stack_writes_nothing() {
        let mut stack = OutlineStack::new("Outlines");
        let mut w = writer();
        assert!(stack.write_to(&mut w).unwrap().is_none());
        assert!(w.into_inner().is_empty());
    }

    #[test]
    fn test_unbalanced_pop_fails() {
        let mut stack = OutlineStack::new("Outlines");
        let a = stack.push(OutlineItem::new("A", "dest-a"));
        let b = stack.push(OutlineItem::new("B", "dest-b"));
        assert!(stack.pop(a).is_err());
        stack.pop(b).unwrap();
        stack.pop(a).unwrap();
    }

    #[test]
    fn test_dangling_push_blocks_output() {
        let mut stack = OutlineStack::new("Outlines");
        let _a = stack.push(OutlineItem::new("A", "dest-a"));
        let mut w = writer();
        assert!(matches!(
            stack.write_to(&mut w).unwrap_err(),
            Error::UnbalancedArtefact(_)
        ));
    }

    #[test]
    fn test_sibling_linkage() {
        let mut stack = OutlineStack::new("Outlines");
        for title in ["A", "B", "C"] {
            let token = stack.push(OutlineItem::new(title, format!("dest-{}", title)));
            stack.pop(token).unwrap();
        }

        let mut w = writer();
        let root = stack.write_to(&mut w).unwrap().unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();

        // A=2, B=3, C=4 follow the root object 1
        assert_eq!(root, ObjectRef::new(1, 0));
        assert!(text.contains("/First 2 0 R /Last 4 0 R /Count 3"));
        // every child points back at the root
        assert_eq!(text.matches("/Parent 1 0 R").count(), 3);
        // A -> B -> C sibling chain with back links
        let a = text.split("2 0 obj").nth(1).unwrap().split("endobj").next().unwrap();
        assert!(a.contains("/Next 3 0 R"));
        assert!(!a.contains("/Prev"));
        let b = text.split("3 0 obj").nth(1).unwrap().split("endobj").next().unwrap();
        assert!(b.contains("/Prev 2 0 R"));
        assert!(b.contains("/Next 4 0 R"));
        let c = text.split("4 0 obj").nth(1).unwrap().split("endobj").next().unwrap();
        assert!(c.contains("/Prev 3 0 R"));
        assert!(!c.contains("/Next"));
    }

    #[test]
    fn test_closed_item_has_negative_count() {
        let mut stack = OutlineStack::new("Outlines");
        let chapter = stack.push(OutlineItem::new("Chapter", "ch").closed());
        for section in ["1", "2", "3"] {
            let token = stack.push(OutlineItem::new(section, section));
            stack.pop(token).unwrap();
        }
        stack.pop(chapter).unwrap();

        let mut w = writer();
        stack.write_to(&mut w).unwrap().unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();
        assert!(text.contains("/Count -3"));
        // the collapsed children do not count toward the root
        assert!(text.contains("/Type /Outlines"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn test_nested_children_render_before_parent_closes() {
        let mut stack = OutlineStack::new("Outlines");
        let parent = stack.push(OutlineItem::new("Parent", "p"));
        let child = stack.push(OutlineItem::new("Child", "c"));
        stack.pop(child).unwrap();
        stack.pop(parent).unwrap();

        let mut w = writer();
        stack.write_to(&mut w).unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();
        // the child object's bytes land before the parent's
        assert!(text.find("3 0 obj").unwrap() < text.find("2 0 obj").unwrap());
        assert!(text.contains("/First 3 0 R"));
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn test_style_flags() {
        let mut stack = OutlineStack::new("Outlines");
        let token = stack.push(OutlineItem::new("Styled", "s").bold().italic());
        stack.pop(token).unwrap();
        let mut w = writer();
        stack.write_to(&mut w).unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();
        assert!(text.contains("/F 3"));
    }
}
