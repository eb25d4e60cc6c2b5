//! `GuiDocument.xml` overlay: visibility and color.
//!
//! Presentation data is optional. A missing or unreadable file leaves the
//! registry as `Document.xml` described it.

use super::appearance::{parse_packed_color, read_material_list};
use super::container::Container;
use super::registry::{ObjectRecord, Registry};
use super::xml::{parse_document, XmlElement};
use crate::scene::Color;

/// Name of the presentation file inside the container.
pub const GUI_DOCUMENT_XML: &str = "GuiDocument.xml";

/// Overlay presentation properties onto matching registry records.
///
/// Returns the number of view providers applied. Properties are applied in
/// the order the file lists them, so a later color source replaces an
/// earlier one regardless of kind.
pub fn apply(container: &Container, registry: &mut Registry) -> usize {
    let Some(bytes) = container.get(GUI_DOCUMENT_XML) else {
        return 0;
    };
    let root = match parse_document(bytes) {
        Ok(root) => root,
        Err(e) => {
            log::warn!("Ignoring unreadable {GUI_DOCUMENT_XML}: {e}");
            return 0;
        }
    };

    let mut applied = 0;
    for provider in root.descendants("ViewProvider") {
        let Some(name) = provider.attr("name") else {
            continue;
        };
        let Some(record) = registry.by_name_mut(name) else {
            continue;
        };
        for property in provider.descendants("Property") {
            apply_property(container, record, property);
        }
        applied += 1;
    }

    log::debug!("Applied {applied} view providers from {GUI_DOCUMENT_XML}");
    applied
}

fn apply_property(container: &Container, record: &mut ObjectRecord, property: &XmlElement) {
    match property.attr("name").unwrap_or_default() {
        "Visibility" => {
            record.visible = property.first_descendant_attr("Bool", "value") == Some("true");
        }
        "ShapeColor" => {
            if let Some(color) = packed_attr(record, property, "PropertyColor", "value") {
                record.color = Some(color);
            }
        }
        "ShapeAppearance" => {
            if let Some(color) = appearance_color(container, record, property) {
                record.color = Some(color);
            }
        }
        "ShapeMaterial" => {
            if let Some(color) = packed_attr(record, property, "PropertyMaterial", "diffuseColor") {
                record.color = Some(color);
            }
        }
        _ => {}
    }
}

fn packed_attr(record: &ObjectRecord, property: &XmlElement, tag: &str, attr: &str) -> Option<Color> {
    let value = property.first_descendant_attr(tag, attr)?;
    match parse_packed_color(value) {
        Ok(color) => Some(color),
        Err(e) => {
            log::debug!("'{}': {e}", record.name);
            None
        }
    }
}

/// Specular channel of the first material in the referenced blob.
fn appearance_color(container: &Container, record: &ObjectRecord, property: &XmlElement) -> Option<Color> {
    let list = property.first_descendant("MaterialList")?;
    let file = list.attr("file")?;
    let version = list
        .attr("version")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    let Some(blob) = container.get(file) else {
        log::debug!("'{}': material list '{file}' not in container", record.name);
        return None;
    };
    match read_material_list(blob, version) {
        Ok(materials) => materials.first().map(|m| m.specular_color()),
        Err(e) => {
            log::debug!("'{}': material list '{file}': {e}", record.name);
            None
        }
    }
}
