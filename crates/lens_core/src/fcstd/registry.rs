//! The object registry: every document object the importer cares about,
//! in declaration order.
//!
//! Records live in an arena and refer to each other by `RecordId`. A child
//! knows its assembly through `parent`, but never owns it.

use std::collections::HashMap;

use crate::property::PropertyGroup;
use crate::scene::Color;

pub const ASSEMBLY_TYPE: &str = "Assembly::AssemblyObject";
pub const IMAGE_PLANE_TYPE: &str = "Image::ImagePlane";
pub const LINK_TYPE: &str = "App::Link";
pub const PROPERTY_BAG_NAME: &str = "PropertyBag";

/// Index of a record in its `Registry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

/// The single file an object can be converted from.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FileRef {
    #[default]
    None,
    /// A `.brp`/`.brep` boundary-representation file
    Shape(String),
    /// An embedded raster image
    Image(String),
}

impl FileRef {
    pub fn file_name(&self) -> Option<&str> {
        match self {
            FileRef::None => None,
            FileRef::Shape(name) | FileRef::Image(name) => Some(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FileRef::None)
    }
}

/// One document object, as seen by the importer.
#[derive(Clone, Debug)]
pub struct ObjectRecord {
    /// Stable identity (`Object@name`)
    pub name: String,

    /// `Label` property, if any
    pub label: Option<String>,

    /// Type tag such as `Part::Box`
    pub type_name: String,

    pub visible: bool,

    pub file: FileRef,

    /// Color from the presentation file, if any
    pub color: Option<Color>,

    /// Number of `Link` elements in the document that point here
    pub inbound_links: u32,

    /// Assembly members in link order (assemblies only)
    pub children: Vec<RecordId>,

    /// The assembly that claimed this object
    pub parent: Option<RecordId>,

    pub properties: PropertyGroup,
}

impl ObjectRecord {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            type_name: type_name.into(),
            visible: false,
            file: FileRef::None,
            color: None,
            inbound_links: 0,
            children: Vec::new(),
            parent: None,
            properties: PropertyGroup::new("Properties"),
        }
    }

    pub fn is_assembly(&self) -> bool {
        self.type_name == ASSEMBLY_TYPE
    }

    pub fn is_image_plane(&self) -> bool {
        self.type_name == IMAGE_PLANE_TYPE
    }

    pub fn shape_file(&self) -> Option<&str> {
        match &self.file {
            FileRef::Shape(name) => Some(name),
            _ => None,
        }
    }

    pub fn image_file(&self) -> Option<&str> {
        match &self.file {
            FileRef::Image(name) => Some(name),
            _ => None,
        }
    }

    /// The record's color, or `fallback` if the document set none.
    pub fn color_or(&self, fallback: Color) -> Color {
        self.color.unwrap_or(fallback)
    }
}

/// Arena of records plus a name index.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    records: Vec<ObjectRecord>,
    by_name: HashMap<String, RecordId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record. A name that is already registered keeps its
    /// first record and returns that id.
    pub fn insert(&mut self, record: ObjectRecord) -> RecordId {
        if let Some(&id) = self.by_name.get(&record.name) {
            log::debug!("Object '{}' declared twice, keeping the first", record.name);
            return id;
        }
        let id = RecordId(self.records.len());
        self.by_name.insert(record.name.clone(), id);
        self.records.push(record);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<RecordId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: RecordId) -> Option<&ObjectRecord> {
        self.records.get(id.0)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut ObjectRecord> {
        self.records.get_mut(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&ObjectRecord> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut ObjectRecord> {
        let id = self.id_of(name)?;
        self.get_mut(id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The record's assembly, if it has one.
    pub fn parent_of(&self, record: &ObjectRecord) -> Option<&ObjectRecord> {
        record.parent.and_then(|id| self.get(id))
    }

    /// Make `parent` claim `child`: append to the parent's children list and
    /// point the child back at it.
    pub fn adopt(&mut self, parent: RecordId, child: RecordId) {
        if parent == child || parent.0 >= self.records.len() || child.0 >= self.records.len() {
            return;
        }
        self.records[parent.0].children.push(child);
        self.records[child.0].parent = Some(parent);
    }

    /// Records in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &ObjectRecord)> {
        self.records.iter().enumerate().map(|(i, r)| (RecordId(i), r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order_and_dedups() {
        let mut registry = Registry::new();
        let a = registry.insert(ObjectRecord::new("A", "Part::Box"));
        let b = registry.insert(ObjectRecord::new("B", "Part::Box"));
        let again = registry.insert(ObjectRecord::new("A", "Part::Cylinder"));

        assert_eq!(a, again);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_name("A").unwrap().type_name, "Part::Box");
        let names: Vec<_> = registry.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(registry.id_of("B"), Some(b));
    }

    #[test]
    fn test_adopt_links_both_ways() {
        let mut registry = Registry::new();
        let asm = registry.insert(ObjectRecord::new("Assembly", ASSEMBLY_TYPE));
        let part = registry.insert(ObjectRecord::new("Part", "Part::Box"));

        registry.adopt(asm, part);

        assert_eq!(registry.get(asm).unwrap().children, vec![part]);
        let child = registry.get(part).unwrap();
        assert_eq!(registry.parent_of(child).unwrap().name, "Assembly");
    }

    #[test]
    fn test_adopt_self_is_ignored() {
        let mut registry = Registry::new();
        let asm = registry.insert(ObjectRecord::new("Assembly", ASSEMBLY_TYPE));
        registry.adopt(asm, asm);

        assert!(registry.get(asm).unwrap().children.is_empty());
        assert!(registry.get(asm).unwrap().parent.is_none());
    }

    #[test]
    fn test_file_ref_accessors() {
        let mut record = ObjectRecord::new("Img", IMAGE_PLANE_TYPE);
        assert!(record.file.is_none());

        record.file = FileRef::Image("photo.png".into());
        assert_eq!(record.image_file(), Some("photo.png"));
        assert_eq!(record.shape_file(), None);
        assert_eq!(record.file.file_name(), Some("photo.png"));
    }
}
