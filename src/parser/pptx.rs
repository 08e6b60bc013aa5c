//! Slide-deck text extraction.
//!
//! A PPTX file is a ZIP archive. Slide order comes from the slide id list
//! in `ppt/presentation.xml`, resolved through its relationships file;
//! decks missing either part fall back to the numeric `slideN.xml` order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::ExtractionError;

const PRESENTATION_XML: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

fn failure(e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::ExtractionFailure(format!("Error processing PPTX: {}", e))
}

/// Text of every slide, each headed by a `--- Slide N ---` marker, plus the
/// slide count.
pub(crate) fn extract_pptx(path: &Path) -> Result<(String, usize), ExtractionError> {
    let file = File::open(path).map_err(failure)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(failure)?;

    let slides = slide_order(&mut archive)?;
    let mut text = String::new();

    for (idx, slide_path) in slides.iter().enumerate() {
        let xml = read_entry(&mut archive, slide_path)?;
        text.push_str(&format!("--- Slide {} ---\n", idx + 1));
        for shape in shape_texts(&xml)? {
            text.push_str(&shape);
            text.push('\n');
        }
        text.push_str("\n\n");
    }

    Ok((text, slides.len()))
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut entry = archive.by_name(name).map_err(failure)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(failure)?;
    Ok(xml)
}

fn has_entry<R: Read + Seek>(archive: &ZipArchive<R>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, ExtractionError> {
    if has_entry(&*archive, PRESENTATION_XML) && has_entry(&*archive, PRESENTATION_RELS) {
        let presentation = read_entry(archive, PRESENTATION_XML)?;
        let rels = read_entry(archive, PRESENTATION_RELS)?;
        let targets = relationship_targets(&rels)?;

        let ordered: Vec<String> = slide_ids(&presentation)?
            .into_iter()
            .filter_map(|rel_id| targets.get(&rel_id).cloned())
            .filter(|name| has_entry(&*archive, name))
            .collect();
        if !ordered.is_empty() {
            return Ok(ordered);
        }
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            number.parse::<u32>().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn attribute(element: &BytesStart, key: &[u8]) -> Result<Option<String>, ExtractionError> {
    for attr in element.attributes() {
        let attr = attr.map_err(failure)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value().map_err(failure)?.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship id -> archive path, for relationships pointing at slides.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event().map_err(failure)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let id = attribute(&e, b"Id")?;
                let target = attribute(&e, b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    if path.starts_with(SLIDE_PREFIX) {
                        targets.insert(id, path);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn slide_ids(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event().map_err(failure)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldId" => {
                if let Some(id) = attribute(&e, b"r:id")? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Text of each `p:sp` shape that carries any, paragraphs joined by `\n`.
fn shape_texts(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();

    let mut shape_depth = 0usize;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(failure)? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:sp" => {
                    shape_depth += 1;
                    if shape_depth == 1 {
                        paragraphs.clear();
                    }
                }
                b"a:p" if shape_depth > 0 => current.clear(),
                b"a:t" if shape_depth > 0 => in_text = true,
                _ => {}
            },
            Event::Empty(e) if shape_depth > 0 && e.name().as_ref() == b"a:br" => {
                current.push('\n');
            }
            Event::Text(e) if in_text => {
                current.push_str(&e.unescape().map_err(failure)?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" if shape_depth > 0 => paragraphs.push(std::mem::take(&mut current)),
                b"p:sp" if shape_depth > 0 => {
                    shape_depth -= 1;
                    if shape_depth == 0 {
                        let text = paragraphs.join("\n");
                        if !text.trim().is_empty() {
                            shapes.push(text);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}
