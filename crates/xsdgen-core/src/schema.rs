//! Schema object model handed over by the XSD parser
//!
//! The parser itself lives outside this workspace. What it produces is a
//! [`SchemaGraph`]: an arena of [`SchemaNode`]s addressed by [`NodeId`], plus the
//! [`Schema`] root describing namespaces and the top-level components. Nodes refer
//! to each other only through ids, so side tables in the generator are keyed by
//! `NodeId` and never by address.
//!
//! The graph is serde-serializable; JSON is the exchange format between the
//! parser and the `xsdgen` command line.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::naming::to_snake_case;

/// Namespace URI of the XML Schema vocabulary itself.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Stable identifier of a schema node, assigned by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upper bound of a particle's occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MaxOccursRepr", into = "MaxOccursRepr")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl MaxOccurs {
    /// Whether more than one occurrence is allowed.
    pub fn is_multiple(self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MaxOccursRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<MaxOccursRepr> for MaxOccurs {
    type Error = String;

    fn try_from(repr: MaxOccursRepr) -> Result<Self, Self::Error> {
        match repr {
            MaxOccursRepr::Count(n) => Ok(MaxOccurs::Bounded(n)),
            MaxOccursRepr::Keyword(k) if k == "unbounded" => Ok(MaxOccurs::Unbounded),
            MaxOccursRepr::Keyword(k) => k
                .parse()
                .map(MaxOccurs::Bounded)
                .map_err(|_| format!("invalid maxOccurs value '{}'", k)),
        }
    }
}

impl From<MaxOccurs> for MaxOccursRepr {
    fn from(value: MaxOccurs) -> Self {
        match value {
            MaxOccurs::Bounded(n) => MaxOccursRepr::Count(n),
            MaxOccurs::Unbounded => MaxOccursRepr::Keyword("unbounded".to_string()),
        }
    }
}

fn one() -> u32 {
    1
}

/// `use` attribute of a local attribute declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeUse {
    #[default]
    Optional,
    Required,
    Prohibited,
}

/// `<xs:annotation>`: only the documentation strings matter to the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub simple_type: Option<NodeId>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub fixed: Option<String>,
    #[serde(default, rename = "use")]
    pub usage: AttributeUse,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub attributes: Vec<NodeId>,
    #[serde(default)]
    pub attribute_groups: Vec<NodeId>,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default = "one")]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccurs,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub fixed: Option<String>,
    #[serde(default)]
    pub complex_type: Option<NodeId>,
    #[serde(default)]
    pub simple_type: Option<NodeId>,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            name: None,
            reference: None,
            type_name: None,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            default: None,
            fixed: None,
            complex_type: None,
            simple_type: None,
            annotation: None,
        }
    }
}

/// Named model group (`<xs:group name=..>`) or a reference to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub content: Option<NodeId>,
    #[serde(default = "one")]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccurs,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            name: None,
            reference: None,
            content: None,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            annotation: None,
        }
    }
}

/// Body shared by `<xs:sequence>` and `<xs:choice>`.
///
/// Particles are elements, group references, or nested sequences/choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGroup {
    #[serde(default)]
    pub particles: Vec<NodeId>,
    #[serde(default = "one")]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccurs,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

impl Default for ModelGroup {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mixed: bool,
    /// Base of `<xs:extension>` / `<xs:restriction>` in complex or simple content.
    #[serde(default)]
    pub base: Option<String>,
    /// `<xs:simpleContent>`: the type carries character data.
    #[serde(default)]
    pub simple_content: bool,
    /// Content model particle: sequence, choice or group reference.
    #[serde(default)]
    pub content: Option<NodeId>,
    #[serde(default)]
    pub attributes: Vec<NodeId>,
    #[serde(default)]
    pub attribute_groups: Vec<NodeId>,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "derivation", rename_all = "snake_case")]
pub enum SimpleDerivation {
    Restriction {
        #[serde(default)]
        base: Option<String>,
        #[serde(default)]
        simple_type: Option<NodeId>,
        #[serde(default)]
        enumerations: Vec<String>,
    },
    List {
        #[serde(default)]
        item_type: Option<String>,
        #[serde(default)]
        simple_type: Option<NodeId>,
    },
    Union {
        #[serde(default)]
        member_types: Vec<String>,
    },
}

impl Default for SimpleDerivation {
    fn default() -> Self {
        SimpleDerivation::Restriction {
            base: None,
            simple_type: None,
            enumerations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub derivation: SimpleDerivation,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notation {
    pub name: String,
    #[serde(default)]
    pub public: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub annotation: Option<NodeId>,
}

/// One component of the schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    Annotation(Annotation),
    Attribute(Attribute),
    AttributeGroup(AttributeGroup),
    Element(Element),
    Group(Group),
    Sequence(ModelGroup),
    Choice(ModelGroup),
    ComplexType(ComplexType),
    SimpleType(SimpleType),
    Notation(Notation),
}

impl SchemaNode {
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Annotation(_) => "annotation",
            SchemaNode::Attribute(_) => "attribute",
            SchemaNode::AttributeGroup(_) => "attribute_group",
            SchemaNode::Element(_) => "element",
            SchemaNode::Group(_) => "group",
            SchemaNode::Sequence(_) => "sequence",
            SchemaNode::Choice(_) => "choice",
            SchemaNode::ComplexType(_) => "complex_type",
            SchemaNode::SimpleType(_) => "simple_type",
            SchemaNode::Notation(_) => "notation",
        }
    }

    /// Ids of every node this node points at.
    pub fn children(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        match self {
            SchemaNode::Annotation(_) => {}
            SchemaNode::Attribute(a) => {
                ids.extend(a.simple_type);
                ids.extend(a.annotation);
            }
            SchemaNode::AttributeGroup(g) => {
                ids.extend(&g.attributes);
                ids.extend(&g.attribute_groups);
                ids.extend(g.annotation);
            }
            SchemaNode::Element(e) => {
                ids.extend(e.complex_type);
                ids.extend(e.simple_type);
                ids.extend(e.annotation);
            }
            SchemaNode::Group(g) => {
                ids.extend(g.content);
                ids.extend(g.annotation);
            }
            SchemaNode::Sequence(m) | SchemaNode::Choice(m) => {
                ids.extend(&m.particles);
                ids.extend(m.annotation);
            }
            SchemaNode::ComplexType(c) => {
                ids.extend(c.content);
                ids.extend(&c.attributes);
                ids.extend(&c.attribute_groups);
                ids.extend(c.annotation);
            }
            SchemaNode::SimpleType(s) => {
                match &s.derivation {
                    SimpleDerivation::Restriction { simple_type, .. }
                    | SimpleDerivation::List { simple_type, .. } => ids.extend(*simple_type),
                    SimpleDerivation::Union { .. } => {}
                }
                ids.extend(s.annotation);
            }
            SchemaNode::Notation(n) => ids.extend(n.annotation),
        }
        ids
    }
}

/// `<xs:import>` of another namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaImport {
    pub namespace: String,
    #[serde(default)]
    pub schema_location: String,
}

/// Root of one schema document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Where the schema document was loaded from.
    pub load_uri: String,
    #[serde(default)]
    pub target_namespace: String,
    /// Namespace prefix -> URI. The empty prefix is the default namespace.
    #[serde(default)]
    pub xml_namespaces: BTreeMap<String, String>,
    #[serde(default)]
    pub imports: Vec<SchemaImport>,

    #[serde(default)]
    pub attributes: Vec<NodeId>,
    #[serde(default)]
    pub attribute_groups: Vec<NodeId>,
    #[serde(default)]
    pub elements: Vec<NodeId>,
    #[serde(default)]
    pub groups: Vec<NodeId>,
    #[serde(default)]
    pub complex_types: Vec<NodeId>,
    #[serde(default)]
    pub simple_types: Vec<NodeId>,
    #[serde(default)]
    pub notations: Vec<NodeId>,
}

impl Schema {
    pub fn new(load_uri: impl Into<String>, target_namespace: impl Into<String>) -> Self {
        Self {
            load_uri: load_uri.into(),
            target_namespace: target_namespace.into(),
            ..Default::default()
        }
    }

    /// Namespace URI bound to `prefix` (`""` for the default namespace).
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.xml_namespaces.get(prefix).map(String::as_str)
    }

    /// Prefix under which the XML Schema namespace is bound, if any.
    pub fn xsd_prefix(&self) -> Option<&str> {
        self.xml_namespaces
            .iter()
            .find(|(prefix, uri)| !prefix.is_empty() && uri.as_str() == XSD_NAMESPACE)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// `prefix:local` reference to a built-in type, in this schema's own prefixes.
    pub fn xsd_type_ref(&self, local: &str) -> String {
        match self.xsd_prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Module name for the generated code, derived from the schema file name.
    ///
    /// `xsd` and `schema` are removed from the file stem: `rss-2.0.xsd` becomes
    /// `xsd_rss_2_0`, `kml22schema.xsd` becomes `xsd_kml22`.
    pub fn module_name(&self) -> String {
        module_name_for(&self.load_uri)
    }
}

/// Module name derived from a schema location, see [`Schema::module_name`].
pub fn module_name_for(location: &str) -> String {
    let file = Path::new(location)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(location);
    let stem = file.replace("xsd", "").replace("schema", "");
    let snake = to_snake_case(&stem);
    if snake.is_empty() {
        "xsd".to_string()
    } else {
        format!("xsd_{}", snake)
    }
}

/// Arena of schema nodes plus the schema root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub schema: Schema,
    #[serde(default)]
    pub nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
        }
    }

    /// Parse a JSON dump and check that every node id resolves.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let graph: SchemaGraph = serde_json::from_str(json)?;
        debug!(
            "Parsed schema graph for {} with {} nodes",
            graph.schema.load_uri,
            graph.nodes.len()
        );
        graph.validate()?;
        Ok(graph)
    }

    /// Append a node, returning its id.
    pub fn add(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&SchemaNode, CoreError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(CoreError::UnknownNode(id))
    }

    /// Documentation strings of an optional annotation node.
    pub fn documentation(&self, annotation: Option<NodeId>) -> Vec<String> {
        match annotation.and_then(|id| self.nodes.get(id.0 as usize)) {
            Some(SchemaNode::Annotation(a)) => a.documentation.clone(),
            _ => Vec::new(),
        }
    }

    /// Check that every id mentioned by the root or by a node is in range.
    pub fn validate(&self) -> Result<(), CoreError> {
        let roots = [
            ("attributes", &self.schema.attributes),
            ("attribute_groups", &self.schema.attribute_groups),
            ("elements", &self.schema.elements),
            ("groups", &self.schema.groups),
            ("complex_types", &self.schema.complex_types),
            ("simple_types", &self.schema.simple_types),
            ("notations", &self.schema.notations),
        ];
        for (list, ids) in roots {
            if let Some(id) = ids.iter().find(|id| id.0 as usize >= self.nodes.len()) {
                return Err(CoreError::InvalidGraph(format!(
                    "schema.{} refers to missing node {}",
                    list, id
                )));
            }
        }
        for (index, node) in self.nodes.iter().enumerate() {
            trace!("Checking {} node #{}", node.kind(), index);
            if let Some(id) = node
                .children()
                .into_iter()
                .find(|id| id.0 as usize >= self.nodes.len())
            {
                return Err(CoreError::InvalidGraph(format!(
                    "{} node #{} refers to missing node {}",
                    node.kind(),
                    index,
                    id
                )));
            }
        }
        Ok(())
    }
}
