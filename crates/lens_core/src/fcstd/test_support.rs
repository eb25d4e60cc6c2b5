//! Builders for in-memory documents used by the importer tests.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use lens_math::Vec3;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::container::Container;
use super::geometry::{DecodedShape, GeometryKernel, KernelError};
use crate::mesh::Mesh;

/// Zip the given entries into an archive held in memory.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Shape file content the fake kernel decodes into one fragment of
/// `vertices` vertices.
pub fn shape_bytes(vertices: usize) -> Vec<u8> {
    format!("mesh:{vertices}").into_bytes()
}

/// Material-list blob with one material per specular color.
pub fn material_list_blob(version: u32, speculars: &[u32]) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&(speculars.len() as u32).to_le_bytes());
    for &specular in speculars {
        for color in [0x333333ffu32, 0xccccccff, specular, 0x000000ff] {
            blob.extend_from_slice(&color.to_le_bytes());
        }
        blob.extend_from_slice(&0.2f32.to_le_bytes());
        blob.extend_from_slice(&0.0f32.to_le_bytes());
        if version >= 3 {
            for text in ["", "", "uuid"] {
                blob.extend_from_slice(&(text.len() as u32).to_le_bytes());
                blob.extend_from_slice(text.as_bytes());
            }
        }
    }
    blob
}

/// Property XML for one object's data block.
#[derive(Default)]
pub struct ObjectBuilder {
    properties: Vec<String>,
}

impl ObjectBuilder {
    pub fn property(mut self, xml: &str) -> Self {
        self.properties.push(xml.to_string());
        self
    }

    pub fn label(self, label: &str) -> Self {
        self.property(&format!(
            r#"<Property name="Label" type="App::PropertyString"><String value="{label}"/></Property>"#
        ))
    }

    pub fn visible(self, visible: bool) -> Self {
        self.property(&format!(
            r#"<Property name="Visibility" type="App::PropertyBool"><Bool value="{visible}"/></Property>"#
        ))
    }

    pub fn shape(self, file: &str) -> Self {
        self.property(&format!(
            r#"<Property name="Shape" type="Part::PropertyPartShape"><Part file="{file}"/></Property>"#
        ))
    }

    pub fn image(self, file: &str) -> Self {
        self.property(&format!(
            r#"<Property name="ImageFile" type="App::PropertyFileIncluded"><FileIncluded file="{file}"/></Property>"#
        ))
    }

    pub fn group(self, members: &[&str]) -> Self {
        self.property(&link_list("Group", members))
    }

    pub fn links(self, targets: &[&str]) -> Self {
        self.property(&link_list("Base", targets))
    }

    pub fn size(self, x: f32, y: f32) -> Self {
        self.property(&format!(
            r#"<Property name="XSize" type="App::PropertyDistance"><Float value="{x}"/></Property>"#
        ))
        .property(&format!(
            r#"<Property name="YSize" type="App::PropertyDistance"><Float value="{y}"/></Property>"#
        ))
    }

    pub fn placement(self, axis: Vec3, angle: f32, translation: Vec3) -> Self {
        self.property(&format!(
            r#"<Property name="Placement" type="App::PropertyPlacement"><PropertyPlacement Px="{}" Py="{}" Pz="{}" A="{angle}" Ox="{}" Oy="{}" Oz="{}"/></Property>"#,
            translation.x, translation.y, translation.z, axis.x, axis.y, axis.z
        ))
    }
}

fn link_list(name: &str, targets: &[&str]) -> String {
    let links: String = targets
        .iter()
        .map(|t| format!(r#"<Link value="{t}"/>"#))
        .collect();
    format!(
        r#"<Property name="{name}" type="App::PropertyLinkList"><LinkList count="{}">{links}</LinkList></Property>"#,
        targets.len()
    )
}

/// Presentation properties for one view provider.
#[derive(Default)]
pub struct ViewProviderBuilder {
    properties: Vec<String>,
}

impl ViewProviderBuilder {
    pub fn visibility(mut self, visible: bool) -> Self {
        self.properties.push(format!(
            r#"<Property name="Visibility" type="App::PropertyBool"><Bool value="{visible}"/></Property>"#
        ));
        self
    }

    pub fn shape_color(mut self, packed: u32) -> Self {
        self.properties.push(format!(
            r#"<Property name="ShapeColor" type="App::PropertyColor"><PropertyColor value="{packed}"/></Property>"#
        ));
        self
    }

    pub fn shape_appearance(mut self, file: &str, version: u32) -> Self {
        self.properties.push(format!(
            r#"<Property name="ShapeAppearance" type="App::PropertyMaterialList"><MaterialList file="{file}" version="{version}"/></Property>"#
        ));
        self
    }

    pub fn shape_material(mut self, diffuse: u32) -> Self {
        self.properties.push(format!(
            r#"<Property name="ShapeMaterial" type="App::PropertyMaterial"><PropertyMaterial ambientColor="0" diffuseColor="{diffuse}" specularColor="0" emissiveColor="0" shininess="0.2" transparency="0"/></Property>"#
        ));
        self
    }
}

/// Assembles `Document.xml`, `GuiDocument.xml` and extra files.
#[derive(Default)]
pub struct DocumentBuilder {
    document_properties: Vec<String>,
    objects: Vec<(String, String, ObjectBuilder)>,
    view_providers: Vec<(String, ViewProviderBuilder)>,
    files: Vec<(String, Vec<u8>)>,
    without_document: bool,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_property(mut self, xml: &str) -> Self {
        self.document_properties.push(xml.to_string());
        self
    }

    pub fn object(
        mut self,
        name: &str,
        type_name: &str,
        build: impl FnOnce(ObjectBuilder) -> ObjectBuilder,
    ) -> Self {
        self.objects
            .push((name.to_string(), type_name.to_string(), build(ObjectBuilder::default())));
        self
    }

    pub fn view_provider(
        mut self,
        name: &str,
        build: impl FnOnce(ViewProviderBuilder) -> ViewProviderBuilder,
    ) -> Self {
        self.view_providers
            .push((name.to_string(), build(ViewProviderBuilder::default())));
        self
    }

    pub fn file(mut self, name: &str, content: Vec<u8>) -> Self {
        self.files.push((name.to_string(), content));
        self
    }

    /// Leave `Document.xml` out of the container.
    pub fn without_document(mut self) -> Self {
        self.without_document = true;
        self
    }

    fn document_xml(&self) -> String {
        let declared: String = self
            .objects
            .iter()
            .map(|(name, type_name, _)| format!(r#"<Object type="{type_name}" name="{name}" id="0"/>"#))
            .collect();
        let data: String = self
            .objects
            .iter()
            .map(|(name, _, object)| {
                format!(
                    r#"<Object name="{name}"><Properties Count="{}">{}</Properties></Object>"#,
                    object.properties.len(),
                    object.properties.concat()
                )
            })
            .collect();

        format!(
            r#"<?xml version='1.0' encoding='utf-8'?>
<Document SchemaVersion="4" ProgramVersion="1.0">
<Properties Count="{}">{}</Properties>
<Objects Count="{}">{declared}</Objects>
<ObjectData Count="{}">{data}</ObjectData>
</Document>"#,
            self.document_properties.len(),
            self.document_properties.concat(),
            self.objects.len(),
            self.objects.len()
        )
    }

    fn gui_document_xml(&self) -> String {
        let providers: String = self
            .view_providers
            .iter()
            .map(|(name, vp)| {
                format!(
                    r#"<ViewProvider name="{name}" expanded="0"><Properties Count="{}">{}</Properties></ViewProvider>"#,
                    vp.properties.len(),
                    vp.properties.concat()
                )
            })
            .collect();

        format!(
            r#"<?xml version='1.0' encoding='utf-8'?>
<Document SchemaVersion="1"><ViewProviderData Count="{}">{providers}</ViewProviderData></Document>"#,
            self.view_providers.len()
        )
    }

    fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries = Vec::new();
        if !self.without_document {
            entries.push(("Document.xml".to_string(), self.document_xml().into_bytes()));
        }
        if !self.view_providers.is_empty() {
            entries.push(("GuiDocument.xml".to_string(), self.gui_document_xml().into_bytes()));
        }
        entries.extend(self.files.iter().cloned());
        entries
    }

    pub fn build(&self) -> Container {
        Container::from_files(self.entries())
    }

    pub fn build_zip(&self) -> Vec<u8> {
        let entries = self.entries();
        let borrowed: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_slice()))
            .collect();
        zip_bytes(&borrowed)
    }
}

/// Kernel double. Decodes `mesh:<n>` into one fragment of `n` vertices,
/// `empty` into a successful decode with no fragments, and anything else
/// into a failed decode.
#[derive(Default)]
pub struct FakeKernel {
    pub fail_init: bool,
    pub init_calls: AtomicUsize,
    pub decode_calls: AtomicUsize,
}

impl FakeKernel {
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Default::default()
        }
    }
}

impl GeometryKernel for FakeKernel {
    fn initialize(&self) -> Result<(), KernelError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(KernelError::Initialization("fake kernel refused".into()));
        }
        Ok(())
    }

    fn decode_brep(&self, bytes: &[u8]) -> DecodedShape {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        let text = String::from_utf8_lossy(bytes);
        if text == "empty" {
            return DecodedShape::success(Vec::new());
        }
        let Some(count) = text.strip_prefix("mesh:").and_then(|n| n.parse::<usize>().ok()) else {
            return DecodedShape::failure();
        };

        let positions: Vec<Vec3> = (0..count).map(|i| Vec3::new(i as f32, (i % 3) as f32, 0.0)).collect();
        let indices: Vec<u32> = (0..count as u32).collect();
        DecodedShape::success(vec![Mesh::new(positions, indices, None)])
    }
}
