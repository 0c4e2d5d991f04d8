//! Owned XML document model built on `quick-xml`.
//!
//! The model keeps element names, nesting and text and discards everything
//! else (attributes, comments, processing instructions). Lookups mirror the
//! DOM's `getElementsByTagName`: descendants are matched on their qualified
//! name and returned in document order.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

/// Errors produced while parsing an XML document.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The underlying reader rejected the input.
    #[error("malformed XML: {source}")]
    Syntax {
        /// Reader error describing the fault.
        #[source]
        source: quick_xml::Error,
    },
    /// A closing tag appeared with no element open.
    #[error("closing tag has no matching opening tag")]
    UnexpectedEnd,
    /// The input ended while an element was still open.
    #[error("element <{name}> was never closed")]
    Unclosed {
        /// Name of the innermost open element.
        name: String,
    },
    /// A second top-level element followed the root.
    #[error("document has more than one root element (found <{name}>)")]
    MultipleRoots {
        /// Name of the extra top-level element.
        name: String,
    },
    /// The input contained no elements at all.
    #[error("document has no root element")]
    MissingRoot,
}

impl From<quick_xml::Error> for XmlError {
    fn from(source: quick_xml::Error) -> Self {
        Self::Syntax { source }
    }
}

/// A child of an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// A nested element.
    Element(XmlElement),
    /// Unescaped character data, including CDATA sections.
    Text(String),
}

/// An element with its qualified name and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Append a child element, returning `self` for chaining.
    #[must_use]
    pub fn with_element(mut self, child: Self) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Append a text node, returning `self` for chaining.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Qualified element name, including any namespace prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct children in document order.
    #[must_use]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Descendant elements named `name`, excluding `self`, in document order.
    pub fn descendants_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Self> + use<'a, 'n> {
        Descendants::below(self).filter(move |element| element.name == name)
    }

    /// First descendant element named `name`.
    #[must_use]
    pub fn first_descendant_named(&self, name: &str) -> Option<&Self> {
        self.descendants_named(name).next()
    }

    /// Concatenated text of every descendant text node.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.push_text(out),
            }
        }
    }
}

/// Pre-order walk over elements.
struct Descendants<'a> {
    pending_root: Option<&'a XmlElement>,
    stack: Vec<std::slice::Iter<'a, XmlNode>>,
}

impl<'a> Descendants<'a> {
    fn including(root: &'a XmlElement) -> Self {
        Self {
            pending_root: Some(root),
            stack: Vec::new(),
        }
    }

    fn below(root: &'a XmlElement) -> Self {
        Self {
            pending_root: None,
            stack: vec![root.children.iter()],
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.pending_root.take() {
            self.stack.push(root.children.iter());
            return Some(root);
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(XmlNode::Element(element)) => {
                    self.stack.push(element.children.iter());
                    return Some(element);
                }
                Some(XmlNode::Text(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// A parsed XML document with a single root element.
///
/// # Examples
///
/// ```
/// use hygiene_core::XmlDocument;
///
/// let doc = XmlDocument::parse("<a><b>one</b><c><b>two</b></c></a>")?;
/// let texts: Vec<String> = doc.elements_named("b").map(|b| b.text_content()).collect();
/// assert_eq!(texts, ["one", "two"]);
/// # Ok::<(), hygiene_core::XmlError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Wrap an already-built element tree.
    #[must_use]
    pub const fn from_root(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse `input` into a document.
    ///
    /// Text outside the root element is ignored. Entity and character
    /// references inside text are resolved.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] when the input is not well-formed or has no
    /// single root element.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(input);
        let mut open: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => open.push(XmlElement::new(decode_name(start.name().as_ref()))),
                Event::Empty(start) => {
                    let element = XmlElement::new(decode_name(start.name().as_ref()));
                    attach(&mut open, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = open.pop().ok_or(XmlError::UnexpectedEnd)?;
                    attach(&mut open, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = open.last_mut() {
                        let unescaped = text.unescape().map_err(quick_xml::Error::from)?;
                        parent.children.push(XmlNode::Text(unescaped.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = open.last_mut() {
                        let raw = String::from_utf8_lossy(&data).into_owned();
                        parent.children.push(XmlNode::Text(raw));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes.
                _ => {}
            }
        }

        if let Some(unclosed) = open.pop() {
            return Err(XmlError::Unclosed {
                name: unclosed.name,
            });
        }
        root.map(Self::from_root).ok_or(XmlError::MissingRoot)
    }

    /// The root element.
    #[must_use]
    pub const fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Every element named `name`, including the root, in document order.
    pub fn elements_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a XmlElement> + use<'a, 'n> {
        Descendants::including(&self.root).filter(move |element| element.name == name)
    }
}

fn decode_name(raw: &[u8]) -> String {
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(name) => name.to_owned(),
        Cow::Owned(name) => name,
    }
}

/// Attach a closed element to its parent, or make it the root.
fn attach(
    open: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::MultipleRoots { name: element.name });
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_nested_elements_and_text() {
        let doc = XmlDocument::parse("<root><a>hello</a><b><c>world</c></b></root>")
            .expect("document should parse");

        assert_eq!(doc.root().name(), "root");
        assert_eq!(doc.root().text_content(), "helloworld");
        assert_eq!(doc.root().children().len(), 2);
    }

    #[rstest]
    fn resolves_entities_and_cdata() {
        let doc = XmlDocument::parse("<n>Fish &amp; Chips<![CDATA[ <Ltd> ]]></n>")
            .expect("document should parse");

        assert_eq!(doc.root().text_content(), "Fish & Chips <Ltd> ");
    }

    #[rstest]
    fn elements_named_includes_root_and_keeps_document_order() {
        let doc = XmlDocument::parse("<x><x id='1'/><y><x/></y></x>").expect("document should parse");

        assert_eq!(doc.elements_named("x").count(), 3);
        assert_eq!(doc.root().descendants_named("x").count(), 2);
    }

    #[rstest]
    fn found_element_outlives_the_queried_name() {
        let doc = XmlDocument::parse("<r><a>1</a><b><a>2</a></b></r>").expect("document should parse");

        let found = {
            let name = String::from("a");
            doc.root().first_descendant_named(&name)
        };

        assert_eq!(found.map(XmlElement::text_content).as_deref(), Some("1"));
    }

    #[rstest]
    fn descendants_walk_is_pre_order() {
        let doc = XmlDocument::parse("<r><a><b/></a><c/></r>").expect("document should parse");

        let names: Vec<&str> = Descendants::including(doc.root())
            .map(XmlElement::name)
            .collect();

        assert_eq!(names, ["r", "a", "b", "c"]);
    }

    #[rstest]
    fn skips_declaration_and_comments() {
        let doc = XmlDocument::parse(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- listing -->\n<r>ok</r>\n",
        )
        .expect("document should parse");

        assert_eq!(doc.root().text_content(), "ok");
    }

    #[rstest]
    fn builder_matches_parsed_tree() {
        let built = XmlDocument::from_root(
            XmlElement::new("r").with_element(XmlElement::new("a").with_text("1")),
        );
        let parsed = XmlDocument::parse("<r><a>1</a></r>").expect("document should parse");

        assert_eq!(built, parsed);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("<!-- nothing here -->")]
    fn rejects_documents_without_root(#[case] input: &str) {
        let err = XmlDocument::parse(input).expect_err("should fail");
        assert!(matches!(err, XmlError::MissingRoot), "got {err:?}");
    }

    #[rstest]
    fn rejects_unclosed_elements() {
        let err = XmlDocument::parse("<r><a>").expect_err("should fail");
        assert!(
            matches!(err, XmlError::Unclosed { .. } | XmlError::Syntax { .. }),
            "got {err:?}"
        );
    }

    #[rstest]
    fn rejects_multiple_roots() {
        let err = XmlDocument::parse("<a/><b/>").expect_err("should fail");
        assert!(matches!(err, XmlError::MultipleRoots { ref name } if name == "b"), "got {err:?}");
    }

    #[rstest]
    fn rejects_mismatched_end_tag() {
        let err = XmlDocument::parse("<a><b></a>").expect_err("should fail");
        assert!(matches!(err, XmlError::Syntax { .. }), "got {err:?}");
    }
}
