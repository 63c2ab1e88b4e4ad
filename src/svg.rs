//! Final rewrite pass applied to every SVG before it leaves the pipeline.
//!
//! The document is streamed through quick-xml so only attributes change:
//! every `fill`/`stroke` becomes the brand colour, `style` disappears and the
//! root `<svg>` gets a fixed size, a viewBox and an aspect-ratio rule.

use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::config::{BrandColor, OUTPUT_SIZE};
use crate::{LogoError, LogoResult};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const PRESERVE_ASPECT_RATIO: &str = "xMidYMid meet";

/// Root attributes that are dropped and re-appended in this order.
const ROOT_MANAGED: [&[u8]; 5] = [b"width", b"height", b"viewBox", b"preserveAspectRatio", b"fill"];

/// Rewrite `svg` so its colours, size and coordinate space are fixed.
///
/// `view_box` is the coordinate space the content was drawn in. Running the
/// function on its own output returns the same string.
pub fn normalize_svg(svg: &str, view_box: (u32, u32), brand: BrandColor) -> LogoResult<String> {
    let brand = brand.to_string();
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(svg.len() + 128)));
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            LogoError::Vectorization(format!(
                "invalid SVG at position {}: {e}",
                reader.error_position()
            ))
        })?;
        match event {
            Event::Start(elem) => {
                reject_second_root(seen_root, depth)?;
                let rewritten = rewrite_element(&elem, !seen_root, view_box, &brand)?;
                seen_root = true;
                depth += 1;
                write(&mut writer, Event::Start(rewritten))?;
            }
            Event::Empty(elem) => {
                reject_second_root(seen_root, depth)?;
                let rewritten = rewrite_element(&elem, !seen_root, view_box, &brand)?;
                seen_root = true;
                write(&mut writer, Event::Empty(rewritten))?;
            }
            Event::End(elem) => {
                depth = depth.saturating_sub(1);
                write(&mut writer, Event::End(elem))?;
            }
            Event::Eof => break,
            other => write(&mut writer, other)?,
        }
    }

    if !seen_root {
        return Err(LogoError::Vectorization("SVG document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(LogoError::Vectorization("SVG document has unclosed elements".to_string()));
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| LogoError::Vectorization(format!("normalized SVG is not UTF-8: {e}")))
}

fn reject_second_root(seen_root: bool, depth: usize) -> LogoResult<()> {
    if seen_root && depth == 0 {
        return Err(LogoError::Vectorization(
            "SVG document has more than one root element".to_string(),
        ));
    }
    Ok(())
}

fn rewrite_element(
    elem: &BytesStart<'_>,
    is_root: bool,
    view_box: (u32, u32),
    brand: &str,
) -> LogoResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    if is_root && elem.local_name().as_ref() != b"svg" {
        return Err(LogoError::Vectorization(format!(
            "expected an <svg> root element, found <{name}>"
        )));
    }

    let mut out = BytesStart::new(name);
    let mut has_xmlns = false;
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| LogoError::Vectorization(format!("invalid SVG attribute: {e}")))?;
        match attr.key.as_ref() {
            b"style" => {}
            key if is_root && ROOT_MANAGED.iter().any(|managed| *managed == key) => {}
            b"fill" => out.push_attribute(("fill", brand)),
            b"stroke" => out.push_attribute(("stroke", brand)),
            key => {
                has_xmlns |= key == b"xmlns";
                out.push_attribute(attr);
            }
        }
    }

    if is_root {
        if !has_xmlns {
            out.push_attribute(("xmlns", SVG_NAMESPACE));
        }
        let size = OUTPUT_SIZE.to_string();
        let (w, h) = view_box;
        out.push_attribute(("width", size.as_str()));
        out.push_attribute(("height", size.as_str()));
        out.push_attribute(("viewBox", format!("0 0 {w} {h}").as_str()));
        out.push_attribute(("preserveAspectRatio", PRESERVE_ASPECT_RATIO));
        out.push_attribute(("fill", brand));
    }

    Ok(out)
}

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> LogoResult<()> {
    writer
        .write_event(event)
        .map_err(|e| LogoError::Vectorization(format!("failed to write SVG: {e}")))
}
