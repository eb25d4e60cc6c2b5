//! `Document.xml` parsing: document properties and the object registry.
//!
//! The primary metadata file declares objects in two places. `Objects`
//! lists identities and types in declaration order; `ObjectData` holds each
//! object's property block. Registration uses the first, everything else
//! comes from the second.

use std::collections::BTreeMap;

use lens_math::Vec3;
use thiserror::Error;

use super::container::Container;
use super::options::{NamingScheme, BREP_EXTENSIONS};
use super::registry::{
    FileRef, ObjectRecord, RecordId, Registry, ASSEMBLY_TYPE, IMAGE_PLANE_TYPE, LINK_TYPE,
    PROPERTY_BAG_NAME,
};
use super::xml::{parse_document, XmlElement, XmlError};
use crate::property::{Placement, Property, PropertyGroup, PropertyValue};

/// Name of the primary metadata file inside the container.
pub const DOCUMENT_XML: &str = "Document.xml";

/// Structural placeholder types that are never imported.
pub const EXCLUDED_TYPES: [&str; 3] = ["App::Plane", "App::Origin", "App::Line"];

/// Errors raised while reading `Document.xml`.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("container has no {DOCUMENT_XML}")]
    NoDocumentMetadata,

    #[error("malformed {DOCUMENT_XML}: {0}")]
    Xml(#[from] XmlError),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Everything `Document.xml` contributes to an import.
#[derive(Clone, Debug, Default)]
pub struct ParsedDocument {
    /// Document-level properties
    pub properties: PropertyGroup,

    /// Registered objects in declaration order
    pub registry: Registry,

    /// External files referenced by `App::Link` objects
    pub linked_files: BTreeMap<String, String>,
}

impl ParsedDocument {
    /// Properties of the `PropertyBag` object, if the document has one.
    pub fn property_bag(&self) -> Option<&PropertyGroup> {
        self.registry
            .by_name(PROPERTY_BAG_NAME)
            .map(|record| &record.properties)
    }
}

/// True if `type_name` belongs to a category the viewer knows how to show.
pub fn is_supported_type(type_name: &str, object_name: &str) -> bool {
    if object_name == PROPERTY_BAG_NAME {
        return true;
    }
    if type_name == ASSEMBLY_TYPE || type_name == IMAGE_PLANE_TYPE {
        return true;
    }
    if !type_name.starts_with("Part::") && !type_name.starts_with("PartDesign::") {
        return false;
    }
    !type_name.contains("Part2D")
}

/// True if the file name ends in a boundary-representation extension.
pub fn has_brep_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| BREP_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Reads `Document.xml` out of a container.
pub struct MetadataParser<'a> {
    container: &'a Container,
    schemes: &'a [NamingScheme],
}

impl<'a> MetadataParser<'a> {
    pub fn new(container: &'a Container, schemes: &'a [NamingScheme]) -> Self {
        Self { container, schemes }
    }

    /// Parse document properties and build the registry.
    pub fn parse(&self) -> MetadataResult<ParsedDocument> {
        let bytes = self
            .container
            .get(DOCUMENT_XML)
            .ok_or(MetadataError::NoDocumentMetadata)?;
        let root = parse_document(bytes)?;

        let mut document = ParsedDocument {
            properties: PropertyGroup::new("Properties"),
            ..Default::default()
        };

        for doc in document_elements(&root) {
            for block in doc.children_named("Properties") {
                decode_properties(block, &mut document.properties);
            }
        }

        self.register_objects(&root, &mut document.registry);

        for data in root.descendants("ObjectData") {
            for element in data.descendants("Object") {
                let Some(id) = element.attr("name").and_then(|n| document.registry.id_of(n)) else {
                    continue;
                };
                self.read_object_data(element, id, &mut document.registry);
            }
        }

        document.linked_files = collect_linked_files(&root);

        log::debug!(
            "Parsed {}: {} document properties, {} registered objects",
            DOCUMENT_XML,
            document.properties.len(),
            document.registry.len()
        );
        Ok(document)
    }

    /// First pass: decide which declared objects enter the registry.
    fn register_objects(&self, root: &XmlElement, registry: &mut Registry) {
        for objects in root.descendants("Objects") {
            for element in objects.descendants("Object") {
                let (Some(name), Some(type_name)) = (element.attr("name"), element.attr("type"))
                else {
                    continue;
                };

                if EXCLUDED_TYPES.contains(&type_name) {
                    log::debug!("Skipping placeholder object '{name}' ({type_name})");
                    continue;
                }
                if !is_supported_type(type_name, name) && self.scheme_file(name).is_none() {
                    continue;
                }

                registry.insert(ObjectRecord::new(name, type_name));
            }
        }
    }

    /// Second pass: fill a registered record from its `ObjectData` block.
    fn read_object_data(&self, element: &XmlElement, id: RecordId, registry: &mut Registry) {
        let mut properties = PropertyGroup::new("Properties");
        for block in element.children_named("Properties") {
            decode_properties(block, &mut properties);
        }

        let is_assembly = registry.get(id).is_some_and(ObjectRecord::is_assembly);
        let mut label = None;
        let mut visible = None;
        let mut file = FileRef::None;
        let mut has_shape = false;

        for property in element.descendants("Property") {
            let prop_type = property.attr("type").unwrap_or_default();
            match property.attr("name").unwrap_or_default() {
                "Label" => {
                    label = property.first_descendant_attr("String", "value").map(str::to_string);
                }
                "Visibility" | "Visible" => {
                    visible = Some(property.first_descendant_attr("Bool", "value") == Some("true"));
                }
                "Group" if is_assembly && prop_type == "App::PropertyLinkList" => {
                    for link in property.descendants("Link") {
                        if let Some(child) = link.attr("value").and_then(|v| registry.id_of(v)) {
                            registry.adopt(id, child);
                        }
                    }
                }
                "Shape" => {
                    let Some(file_name) = property.first_descendant_attr("Part", "file") else {
                        continue;
                    };
                    if self.container.contains(file_name) && has_brep_extension(file_name) {
                        file = FileRef::Shape(file_name.to_string());
                        has_shape = true;
                    }
                }
                "ImageFile" => {
                    let Some(file_name) = property.first_descendant_attr("FileIncluded", "file")
                    else {
                        continue;
                    };
                    if self.container.contains(file_name) {
                        file = FileRef::Image(file_name.to_string());
                    }
                }
                _ => {}
            }
        }

        if !has_shape {
            let name = registry.get(id).map(|r| r.name.clone()).unwrap_or_default();
            if let Some(file_name) = self.scheme_file(&name).filter(|f| has_brep_extension(f)) {
                file = FileRef::Shape(file_name);
            }
        }

        // Every Link in the block counts, not just assembly members.
        for link in element.descendants("Link") {
            let Some(target) = link.attr("value") else {
                continue;
            };
            if let Some(record) = registry.by_name_mut(target) {
                record.inbound_links += 1;
            }
        }

        if let Some(record) = registry.get_mut(id) {
            record.properties = properties;
            if label.is_some() {
                record.label = label;
            }
            if let Some(visible) = visible {
                record.visible = visible;
            }
            record.file = file;
        }
    }

    /// First shape file that exists under the configured naming schemes.
    fn scheme_file(&self, object_name: &str) -> Option<String> {
        self.schemes
            .iter()
            .map(|scheme| scheme.file_name(object_name))
            .find(|file_name| self.container.contains(file_name))
    }
}

fn document_elements(root: &XmlElement) -> Vec<&XmlElement> {
    let mut docs = root.descendants("Document");
    if root.name == "Document" {
        docs.insert(0, root);
    }
    docs
}

/// External files referenced through `App::Link` objects.
fn collect_linked_files(root: &XmlElement) -> BTreeMap<String, String> {
    let link_objects: Vec<&str> = root
        .descendants("Objects")
        .into_iter()
        .flat_map(|objects| objects.descendants("Object"))
        .filter(|object| object.attr("type") == Some(LINK_TYPE))
        .filter_map(|object| object.attr("name"))
        .collect();

    let mut linked = BTreeMap::new();
    for data in root.descendants("ObjectData") {
        for object in data.descendants("Object") {
            let Some(name) = object.attr("name").filter(|n| link_objects.contains(n)) else {
                continue;
            };
            for property in object.descendants("Property") {
                if property.attr("name") != Some("LinkedObject") {
                    continue;
                }
                if let Some(file) = property.first_descendant_attr("XLink", "file") {
                    linked.insert(name.to_string(), file.to_string());
                }
            }
        }
    }

    linked.retain(|_, file| !file.is_empty());
    linked
}

/// Decode every recognized `Property` under a `Properties` block into `group`.
pub fn decode_properties(block: &XmlElement, group: &mut PropertyGroup) {
    for element in block.descendants("Property") {
        if let Some(property) = decode_property(element) {
            group.push(property);
        }
    }
}

/// Decode one `Property` element. Unknown types and empty values yield `None`.
pub fn decode_property(element: &XmlElement) -> Option<Property> {
    let name = element.attr("name")?;
    let prop_type = element.attr("type")?;

    let scalar = |tag: &str| {
        element
            .first_descendant_attr(tag, "value")
            .filter(|v| !v.is_empty())
    };

    let value = match prop_type {
        "App::PropertyBool" => PropertyValue::Boolean(scalar("Bool")? == "true"),
        "App::PropertyInteger" => PropertyValue::Integer(parse_number(name, scalar("Integer")?)?),
        "App::PropertyAngle" => PropertyValue::Angle(parse_number(name, scalar("Float")?)?),
        "App::PropertyString" => PropertyValue::Text(scalar("String")?.to_string()),
        "App::PropertyUUID" => PropertyValue::Text(scalar("Uuid")?.to_string()),
        "App::PropertyFloat"
        | "App::PropertyLength"
        | "App::PropertyDistance"
        | "App::PropertyArea"
        | "App::PropertyVolume" => PropertyValue::Number(parse_number(name, scalar("Float")?)?),
        "App::PropertyPlacement" => {
            PropertyValue::Placement(decode_placement(element.first_descendant("PropertyPlacement")?))
        }
        _ => return None,
    };

    Some(Property::new(name, value))
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::debug!("Property '{name}' has unparsable value '{raw}'");
            None
        }
    }
}

/// Read a `PropertyPlacement` element. Missing components are 0.
fn decode_placement(element: &XmlElement) -> Placement {
    let component = |attr: &str| -> f32 {
        element
            .attr(attr)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0.0)
    };

    Placement {
        axis: Vec3::new(component("Ox"), component("Oy"), component("Oz")),
        angle: component("A"),
        translation: Vec3::new(component("Px"), component("Py"), component("Pz")),
    }
}
