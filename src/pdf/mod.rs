//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The page model only has three
//! kinds of marks: single lines of text, straight rules and images. The
//! subset of PDF needed is small. It covers fonts, image XObjects, one
//! content stream per page, and the page tree.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! ## Coordinates
//!
//! Layout positions are millimetres from the top-left corner. PDF user space
//! is points from the bottom-left, so every coordinate is scaled by
//! `72 / 25.4` and Y is flipped against the page height.
//!
//! ## Font Embedding
//!
//! Standard PDF fonts (Helvetica, Courier) use simple Type1 references with
//! WinAnsi encoding. Custom TrueType fonts are embedded whole as
//! CIDFontType2 with Identity-H encoding, producing 5 PDF objects per font:
//! FontFile2, FontDescriptor, CIDFont, ToUnicode CMap, and the root Type0
//! dictionary.
//!
//! ## Images
//!
//! Each distinct image is written once as an XObject and named `/Im{i}` in
//! the resources of every page that shows it. JPEG data is embedded as is
//! with DCTDecode. Decoded pixels are FlateDecode RGB with an optional
//! alpha SMask.
//!
//! Output is deterministic: fonts and glyph tables are emitted in sorted
//! order and the info dictionary carries no timestamps.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::ExamError;
use crate::font::{FontContext, FontData, FontKey};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};

/// Millimetres to points.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// Document info dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

pub struct PdfWriter;

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Embedding data for a custom TrueType font.
struct CustomFontEmbedData {
    /// Maps characters to glyph IDs in the embedded font.
    char_to_gid: BTreeMap<char, u16>,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Resource index `/F{i}` is the position in this list.
    font_objects: Vec<(FontKey, usize)>,
    /// Embedding data for custom fonts, keyed by FontKey.
    custom_font_data: BTreeMap<FontKey, CustomFontEmbedData>,
    /// XObject IDs of images, named `/Im{i}` by position.
    image_objects: Vec<usize>,
    /// (page index, element index) to position in `image_objects`.
    image_index_map: BTreeMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        font_context: &FontContext,
    ) -> Result<Vec<u8>, ExamError> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            custom_font_data: BTreeMap::new(),
            image_objects: Vec::new(),
            image_index_map: BTreeMap::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, then page objects, then content streams
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder, pages, font_context)?;
        self.register_images(&mut builder, pages);

        let font_resources = self.build_font_resource_dict(&builder.font_objects);
        let mut page_obj_ids: Vec<usize> = Vec::new();

        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream_for_page(page, page_idx, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let page_obj_id = builder.objects.len();
            let xobject_resources = self.build_xobject_resource_dict(page_idx, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobject_resources)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width * MM_TO_PT,
                page.height * MM_TO_PT,
                content_obj_id,
                resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_pdf_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (forme-exam {}) /Creator (forme-exam) >>",
            env!("CARGO_PKG_VERSION")
        );
        builder.objects.push(PdfObject {
            data: info.into_bytes(),
        });

        log::debug!(
            "Serialized {} pages with {} fonts and {} images",
            pages.len(),
            builder.font_objects.len(),
            builder.image_objects.len()
        );
        Ok(self.serialize(&builder, info_obj_id))
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream_for_page(
        &self,
        page: &LayoutPage,
        page_idx: usize,
        builder: &PdfBuilder,
    ) -> String {
        let mut stream = String::new();
        for (elem_idx, element) in page.elements.iter().enumerate() {
            let image = builder.image_index_map.get(&(page_idx, elem_idx)).copied();
            self.write_element(&mut stream, element, page.height, builder, image);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        image_index: Option<usize>,
    ) {
        match &element.draw {
            DrawCommand::Image { .. } => {
                let Some(index) = image_index else {
                    return;
                };
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    element.width * MM_TO_PT,
                    element.height * MM_TO_PT,
                    element.x * MM_TO_PT,
                    (page_height - element.y - element.height) * MM_TO_PT,
                    index
                );
            }

            DrawCommand::Line { color, thickness } => {
                let x1 = element.x * MM_TO_PT;
                let y1 = (page_height - element.y) * MM_TO_PT;
                let x2 = (element.x + element.width) * MM_TO_PT;
                let y2 = (page_height - element.y - element.height) * MM_TO_PT;
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    color.r,
                    color.g,
                    color.b,
                    thickness * MM_TO_PT,
                    x1,
                    y1,
                    x2,
                    y2
                );
            }

            DrawCommand::Text { text, font, color } => {
                let key = FontKey::new(font.family, font.weight(), font.italic);
                let font_index = self.font_index(&key, &builder.font_objects);

                // Vertically centre the line in its box
                let size_mm = font.size / MM_TO_PT;
                let baseline = element.y + element.height / 2.0 + 0.3 * size_mm;
                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n",
                    color.r,
                    color.g,
                    color.b,
                    font_index,
                    font.size,
                    element.x * MM_TO_PT,
                    (page_height - baseline) * MM_TO_PT
                );

                if let Some(embed_data) = builder.custom_font_data.get(&key) {
                    let mut hex = String::new();
                    for ch in text.chars() {
                        let gid = embed_data.char_to_gid.get(&ch).copied().unwrap_or(0);
                        let _ = write!(hex, "{:04X}", gid);
                    }
                    let _ = write!(stream, "<{}> Tj\n", hex);
                } else {
                    let _ = write!(stream, "({}) Tj\n", Self::encode_winansi(text));
                }

                stream.push_str("ET\n");
            }
        }
    }

    /// Write every distinct image once and map each image element to it.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut seen: HashMap<*const LoadedImage, usize> = HashMap::new();
        for (page_idx, page) in pages.iter().enumerate() {
            for (elem_idx, element) in page.elements.iter().enumerate() {
                let DrawCommand::Image { image } = &element.draw else {
                    continue;
                };
                let img_idx = match seen.get(&Arc::as_ptr(image)) {
                    Some(&idx) => idx,
                    None => {
                        let idx = builder.image_objects.len();
                        let obj_id = Self::write_image_xobject(builder, image);
                        builder.image_objects.push(obj_id);
                        seen.insert(Arc::as_ptr(image), idx);
                        idx
                    }
                };
                builder.image_index_map.insert((page_idx, elem_idx), img_idx);
            }
        }
    }

    /// Write one image as one or two XObjects. Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                Self::push_image_object(builder, image, color_space, "/DCTDecode", data, "")
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, 6);
                    Self::push_image_object(builder, image, "/DeviceGray", "/FlateDecode", &compressed, "")
                });
                let smask_ref = smask
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let compressed = compress_to_vec_zlib(rgb, 6);
                Self::push_image_object(builder, image, "/DeviceRGB", "/FlateDecode", &compressed, &smask_ref)
            }
        }
    }

    fn push_image_object(
        builder: &mut PdfBuilder,
        image: &LoadedImage,
        color_space: &str,
        filter: &str,
        stream: &[u8],
        extra: &str,
    ) -> usize {
        let obj_id = builder.objects.len();
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace {} /BitsPerComponent 8 /Filter {} /Length {}{} >>\nstream\n",
            image.width_px,
            image.height_px,
            color_space,
            filter,
            stream.len(),
            extra
        );
        data.extend_from_slice(stream);
        data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject { data });
        obj_id
    }

    /// `/Im{i}` entries for the images shown on one page.
    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        let used: BTreeSet<usize> = builder
            .image_index_map
            .range((page_idx, 0)..(page_idx + 1, 0))
            .map(|(_, &idx)| idx)
            .collect();
        used.into_iter()
            .map(|idx| format!("/Im{} {} 0 R", idx, builder.image_objects[idx]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        font_context: &FontContext,
    ) -> Result<(), ExamError> {
        // Ordered map, so resource numbering is deterministic
        let mut font_chars: BTreeMap<FontKey, BTreeSet<char>> = BTreeMap::new();
        for page in pages {
            Self::collect_font_keys_and_chars(&page.elements, &mut font_chars);
        }

        // Always have at least Helvetica
        if font_chars.is_empty() {
            font_chars.insert(FontKey::new("Helvetica", 400, false), BTreeSet::new());
        }

        for (key, used_chars) in &font_chars {
            match font_context.resolve(&key.family, key.weight, key.italic) {
                FontData::Standard(std_font) => {
                    let obj_id = builder.objects.len();
                    let font_dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    builder.objects.push(PdfObject {
                        data: font_dict.into_bytes(),
                    });
                    builder.font_objects.push((key.clone(), obj_id));
                }
                FontData::Custom { data, metrics } => {
                    let char_to_gid: BTreeMap<char, u16> = used_chars
                        .iter()
                        .filter_map(|ch| metrics.glyph_ids.get(ch).map(|&gid| (*ch, gid)))
                        .collect();
                    let type0_obj_id = Self::write_custom_font_objects(builder, key, data, char_to_gid)?;
                    builder.font_objects.push((key.clone(), type0_obj_id));
                }
            }
        }

        Ok(())
    }

    /// Collect unique FontKey tuples and used characters from layout elements.
    fn collect_font_keys_and_chars(
        elements: &[LayoutElement],
        font_chars: &mut BTreeMap<FontKey, BTreeSet<char>>,
    ) {
        for element in elements {
            if let DrawCommand::Text { text, font, .. } = &element.draw {
                let key = FontKey::new(font.family, font.weight(), font.italic);
                font_chars.entry(key).or_default().extend(text.chars());
            }
        }
    }

    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        key: &FontKey,
        ttf_data: &[u8],
        char_to_gid: BTreeMap<char, u16>,
    ) -> Result<usize, ExamError> {
        let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
            ExamError::Font(format!(
                "Failed to parse TTF data for font '{}': {}",
                key.family, e
            ))
        })?;

        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();

        let pdf_font_name = Self::sanitize_font_name(&key.family, key.weight, key.italic);

        // 1. FontFile2 stream
        let compressed_ttf = compress_to_vec_zlib(ttf_data, 6);
        let fontfile2_id = builder.objects.len();
        let mut fontfile2_data: Vec<u8> = Vec::new();
        let _ = write!(
            fontfile2_data,
            "<< /Length {} /Length1 {} /Filter /FlateDecode >>\nstream\n",
            compressed_ttf.len(),
            ttf_data.len()
        );
        fontfile2_data.extend_from_slice(&compressed_ttf);
        fontfile2_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject {
            data: fontfile2_data,
        });

        // 2. FontDescriptor
        let font_descriptor_id = builder.objects.len();
        let bbox = face.global_bounding_box();
        let scale = 1000.0 / units_per_em as f64;
        let bbox_str = format!(
            "[{} {} {} {}]",
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
        );
        let cap_height = face.capital_height().unwrap_or(ascender) as f64 * scale;
        let stem_v = if key.weight >= 700 { 120 } else { 80 };
        let font_descriptor_dict = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox {} /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            bbox_str,
            if key.italic { -12 } else { 0 },
            (ascender as f64 * scale) as i32,
            (descender as f64 * scale) as i32,
            cap_height as i32,
            stem_v,
            fontfile2_id,
        );
        builder.objects.push(PdfObject {
            data: font_descriptor_dict.into_bytes(),
        });

        // 3. CIDFont dictionary (DescendantFont)
        let cidfont_id = builder.objects.len();
        let w_array = Self::build_w_array(&char_to_gid, &face, units_per_em);
        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont_dict = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            pdf_font_name, font_descriptor_id, default_width, w_array,
        );
        builder.objects.push(PdfObject {
            data: cidfont_dict.into_bytes(),
        });

        // 4. ToUnicode CMap
        let tounicode_id = builder.objects.len();
        let cmap_content = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let compressed_cmap = compress_to_vec_zlib(cmap_content.as_bytes(), 6);
        let mut tounicode_data: Vec<u8> = Vec::new();
        let _ = write!(
            tounicode_data,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed_cmap.len()
        );
        tounicode_data.extend_from_slice(&compressed_cmap);
        tounicode_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject {
            data: tounicode_data,
        });

        // 5. Type0 font dictionary (the root, referenced by /Resources)
        let type0_id = builder.objects.len();
        let type0_dict = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} \
             /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] \
             /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        builder.objects.push(PdfObject {
            data: type0_dict.into_bytes(),
        });

        builder
            .custom_font_data
            .insert(key.clone(), CustomFontEmbedData { char_to_gid });

        Ok(type0_id)
    }

    /// Build the /W array for per-glyph widths in CIDFont.
    /// Format: [gid [width] gid [width] ...]
    fn build_w_array(
        char_to_gid: &BTreeMap<char, u16>,
        face: &ttf_parser::Face,
        units_per_em: u16,
    ) -> String {
        let scale = 1000.0 / units_per_em as f64;
        let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();

        let mut result = String::from("[");
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        result.push_str(" ]");
        result
    }

    /// Build a ToUnicode CMap for text extraction/copy-paste support.
    fn build_tounicode_cmap(char_to_gid: &BTreeMap<char, u16>, font_name: &str) -> String {
        // Invert the mapping: gid → unicode codepoint
        let mut gid_to_unicode: Vec<(u16, u32)> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, ch as u32))
            .collect();
        gid_to_unicode.sort();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo\n");
        cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // beginbfchar blocks hold at most 100 entries
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                let _ = writeln!(cmap, "<{:04X}> <{:04X}>", gid, unicode);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");
        cmap
    }

    /// Sanitize a font name for use as a PDF name object.
    /// Strips spaces and special characters, appends weight/style suffixes.
    fn sanitize_font_name(family: &str, weight: u32, italic: bool) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect();

        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if weight >= 700 {
            name.push_str("-Bold");
        }
        if italic {
            name.push_str("-Italic");
        }
        name
    }

    fn build_font_resource_dict(&self, font_objects: &[(FontKey, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resource index of `key`, or the first font.
    fn font_index(&self, key: &FontKey, font_objects: &[(FontKey, usize)]) -> usize {
        font_objects
            .iter()
            .position(|(k, _)| k == key)
            .unwrap_or(0)
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Encode text as a WinAnsi PDF string body, escaping delimiters and
    /// writing bytes outside printable ASCII as octal.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::new();
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ContentRef;
    use crate::style::{Color, FontSpec, BODY_FAMILY};

    fn text_element(text: &str, font: FontSpec) -> LayoutElement {
        LayoutElement {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 5.0,
            draw: DrawCommand::Text {
                text: text.to_string(),
                font,
                color: Color::BLACK,
            },
            source: Some(ContentRef::Question(1)),
        }
    }

    fn page(elements: Vec<LayoutElement>) -> LayoutPage {
        LayoutPage {
            width: 210.0,
            height: 297.0,
            elements,
        }
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(
            PdfWriter::escape_pdf_string("Hello (World)"),
            "Hello \\(World\\)"
        );
        assert_eq!(PdfWriter::escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new()
            .write(&[page(vec![])], &Metadata::default(), &FontContext::new())
            .unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
    }

    #[test]
    fn test_a4_media_box_in_points() {
        let bytes = PdfWriter::new()
            .write(&[page(vec![])], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 595.28 841.89]"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Unit Test (Set A)".to_string()),
            author: Some("Springfield High".to_string()),
            subject: None,
        };
        let bytes = PdfWriter::new()
            .write(&[page(vec![])], &metadata, &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/Title (Unit Test \\(Set A\\))"));
        assert!(text.contains("/Author (Springfield High)"));
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let pages = vec![page(vec![
            text_element("A", FontSpec::regular(BODY_FAMILY, 12.0)),
            text_element("A", FontSpec::bold(BODY_FAMILY, 12.0)),
        ])];
        let bytes = PdfWriter::new()
            .write(&pages, &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
        assert!(text.contains("/Type1"));
        assert!(!text.contains("CIDFontType2"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let pages = vec![page(vec![
            text_element("Zebra", FontSpec::italic(BODY_FAMILY, 12.0)),
            text_element("Apple", FontSpec::bold("ArialUni", 12.0)),
            text_element("Mango", FontSpec::regular("Stinger", 12.0)),
        ])];
        let writer = PdfWriter::new();
        let first = writer.write(&pages, &Metadata::default(), &FontContext::new()).unwrap();
        let second = writer.write(&pages, &Metadata::default(), &FontContext::new()).unwrap();
        assert_eq!(first, second);
    }

    fn image_element(image: &Arc<LoadedImage>, y: f64) -> LayoutElement {
        LayoutElement {
            x: 21.0,
            y,
            width: 79.0,
            height: 40.0,
            draw: DrawCommand::Image {
                image: Arc::clone(image),
            },
            source: Some(ContentRef::Question(1)),
        }
    }

    #[test]
    fn test_shared_image_written_once() {
        let image = Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![255; 2 * 2 * 3],
                alpha: Some(vec![0, 255, 255, 0]),
            },
            width_px: 2,
            height_px: 2,
        });
        let pages = vec![
            page(vec![image_element(&image, 30.0), image_element(&image, 90.0)]),
            page(vec![]),
            page(vec![image_element(&image, 30.0)]),
        ];
        let bytes = PdfWriter::new()
            .write(&pages, &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);

        // One RGB XObject plus its SMask
        assert_eq!(text.matches("/Subtype /Image").count(), 2);
        assert_eq!(text.matches("/SMask").count(), 1);
        assert_eq!(text.matches("/XObject << /Im0").count(), 2);
    }

    #[test]
    fn test_jpeg_passes_through() {
        let image = Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Jpeg {
                data: vec![0xFF, 0xD8, 0xFF, 0xD9],
                color_space: JpegColorSpace::DeviceGray,
            },
            width_px: 1,
            height_px: 1,
        });
        let bytes = PdfWriter::new()
            .write(&[page(vec![image_element(&image, 30.0)])], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /DCTDecode /Length 4"));
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(PdfWriter::sanitize_font_name("Noto", 400, false), "Noto");
        assert_eq!(PdfWriter::sanitize_font_name("Noto", 700, false), "Noto-Bold");
        assert_eq!(PdfWriter::sanitize_font_name("Noto", 400, true), "Noto-Italic");
        assert_eq!(PdfWriter::sanitize_font_name("Noto", 700, true), "Noto-Bold-Italic");
        assert_eq!(PdfWriter::sanitize_font_name("Arial Unicode", 400, false), "ArialUnicode");
        assert_eq!(PdfWriter::sanitize_font_name("()", 700, false), "CustomFont-Bold");
    }

    #[test]
    fn test_tounicode_cmap_format() {
        let mut char_to_gid = BTreeMap::new();
        char_to_gid.insert('A', 36u16);
        char_to_gid.insert('B', 37u16);

        let cmap = PdfWriter::build_tounicode_cmap(&char_to_gid, "TestFont");

        assert!(cmap.contains("begincmap"));
        assert!(cmap.contains("endcmap"));
        assert!(cmap.contains("1 begincodespacerange"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<0025> <0042>"));
    }

    #[test]
    fn test_winansi_encoding() {
        assert_eq!(PdfWriter::encode_winansi("a(b)"), "a\\(b\\)");
        assert_eq!(PdfWriter::encode_winansi("\u{2022}"), "\\225");
        assert_eq!(PdfWriter::encode_winansi("\u{4E2D}"), "?");
    }
}
