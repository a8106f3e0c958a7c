//! Build the page model from an MEI document
//!
//! Every `sb` (system break) opens a system. Its `systemref` names a
//! `system` element whose `facs` points at the zone the system covers on the
//! facsimile. Everything that follows the break in reading order, up to the
//! next break, is mounted on that system. Elements are already in reading
//! order in the document, so they are appended without a sorted insert.

use crate::config::Notation;
use crate::error::{MeiError, Result};
use crate::models::{
    AddOptions, Clef, ClefShape, Custos, Division, DivisionForm, ElementId, HeadShape, Neume,
    NeumeComponent, Page, Pitch, SystemId, SystemOptions, Zone,
};

use super::document::{MeiDocument, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub notation: Notation,
    pub num_lines: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            notation: Notation::Square,
            num_lines: 4,
        }
    }
}

/// What a load produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    pub systems: usize,
    pub glyphs: usize,
    /// Zone of the first system; the glyph scale is taken from it
    pub first_system_zone: Option<Zone>,
}

/// Describe an element for error messages: `neume m-1234` or just `neume`
fn describe(doc: &MeiDocument, node: NodeId) -> String {
    match doc.xml_id(node) {
        Some(id) => format!("{} {}", doc.name(node), id),
        None => doc.name(node).to_string(),
    }
}

fn required<'d>(doc: &'d MeiDocument, node: NodeId, attribute: &str) -> std::result::Result<&'d str, MeiError> {
    doc.attribute(node, attribute).ok_or_else(|| MeiError::MissingAttribute {
        element: describe(doc, node),
        attribute: attribute.to_string(),
    })
}

fn invalid(doc: &MeiDocument, node: NodeId, attribute: &str, value: &str) -> MeiError {
    MeiError::InvalidValue {
        element: describe(doc, node),
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

/// Bounding box of a `zone` element
pub fn parse_zone(doc: &MeiDocument, zone: NodeId) -> std::result::Result<Zone, MeiError> {
    let coord = |name: &str| -> std::result::Result<i32, MeiError> {
        let value = required(doc, zone, name)?;
        // some exports write coordinates as floats
        value
            .trim()
            .parse::<i32>()
            .or_else(|_| value.trim().parse::<f64>().map(|v| v.round() as i32))
            .map_err(|_| invalid(doc, zone, name, value))
    };
    Ok(Zone::new(coord("ulx")?, coord("uly")?, coord("lrx")?, coord("lry")?))
}

/// Resolve the `facs` reference of an element to its zone
pub fn facs_zone(doc: &MeiDocument, node: NodeId) -> std::result::Result<Zone, MeiError> {
    let facs = required(doc, node, "facs")?;
    let zone = doc
        .get_element_by_id(facs.trim_start_matches('#'))
        .filter(|z| doc.name(*z) == "zone")
        .ok_or_else(|| MeiError::ElementNotFound(format!("zone {} of {}", facs, describe(doc, node))))?;
    parse_zone(doc, zone)
}

fn element_id(doc: &MeiDocument, node: NodeId) -> ElementId {
    doc.xml_id(node)
        .map(ElementId::from)
        .unwrap_or_else(ElementId::generate)
}

fn pitch_of(doc: &MeiDocument, node: NodeId) -> std::result::Result<Option<Pitch>, MeiError> {
    match (doc.attribute(node, "pname"), doc.attribute(node, "oct")) {
        (Some(pname), Some(oct)) => Pitch::from_mei(pname, oct)
            .map(Some)
            .map_err(|_| invalid(doc, node, "pname", &format!("{}{}", pname, oct))),
        _ => Ok(None),
    }
}

fn is_true(doc: &MeiDocument, node: NodeId, attribute: &str) -> bool {
    doc.attribute(node, attribute) == Some("true")
}

/// Neume model from a `neume` element: root pitch from the first note,
/// every component stored relative to it
pub fn neume_from_mei(doc: &MeiDocument, node: NodeId, zone: Zone) -> std::result::Result<Neume, MeiError> {
    let mut neume = Neume::new(element_id(doc, node), zone);
    neume.name = doc.attribute(node, "name").unwrap_or("punctum").to_string();
    neume.variant = doc.attribute(node, "variant").map(str::to_string);

    for nc in doc.children_by_name(node, "nc") {
        let head = HeadShape::from_nc(
            is_true(doc, nc, "inclinatum"),
            is_true(doc, nc, "deminutus"),
            is_true(doc, nc, "quilisma"),
            &neume.name,
        );
        for note in doc.children_by_name(nc, "note") {
            let pitch = pitch_of(doc, note)?;
            if neume.components.is_empty() {
                neume.root_pitch = pitch;
            }
            let pitch_diff = match (neume.root_pitch, pitch) {
                (Some(root), Some(p)) => root.steps_to(&p),
                _ => 0,
            };

            let mut component = NeumeComponent::new(head, pitch_diff);
            component.dot = doc
                .children_by_name(note, "dot")
                .first()
                .map(|dot| doc.attribute(*dot, "form").unwrap_or_default().to_string());
            neume.add_component(component);
        }
    }

    if neume.components.is_empty() {
        return Err(MeiError::MissingElement(format!("note in {}", describe(doc, node))));
    }
    Ok(neume)
}

/// Children of every layer, in document order
fn reading_order(doc: &MeiDocument) -> Vec<NodeId> {
    doc.elements_by_name("layer")
        .into_iter()
        .flat_map(|layer| doc.children(layer))
        .collect()
}

/// Size the page to the extent of every zone in the facsimile
pub fn calc_page_dimensions(doc: &MeiDocument, page: &mut Page) -> std::result::Result<(), MeiError> {
    let zones = doc
        .elements_by_name("zone")
        .into_iter()
        .map(|z| parse_zone(doc, z))
        .collect::<std::result::Result<Vec<Zone>, MeiError>>()?;
    page.calc_dimensions(zones.iter());
    Ok(())
}

/// Populate `page` from `doc`
pub fn load_page(doc: &MeiDocument, page: &mut Page, options: &LoadOptions) -> Result<LoadSummary> {
    calc_page_dimensions(doc, page)?;

    let mut summary = LoadSummary::default();
    let mut current: Option<SystemId> = None;

    for node in reading_order(doc) {
        let name = doc.name(node);
        if name == "sb" {
            let system = open_system(doc, node, page, options)?;
            if summary.first_system_zone.is_none() {
                summary.first_system_zone = Some(page.system(system)?.zone);
            }
            summary.systems += 1;
            current = Some(system);
            continue;
        }

        let Some(system) = current else {
            log::warn!("{} appears before the first system break, skipped", describe(doc, node));
            continue;
        };

        let just_push = AddOptions::just_push();
        match name {
            "clef" => {
                if options.notation == Notation::Cheironomic {
                    log::warn!("{} ignored on a staffless system", describe(doc, node));
                    continue;
                }
                let shape_text = required(doc, node, "shape")?;
                let shape: ClefShape = shape_text.parse().map_err(|_| invalid(doc, node, "shape", shape_text))?;
                let line_text = required(doc, node, "line")?;
                let line: i32 = line_text.trim().parse().map_err(|_| invalid(doc, node, "line", line_text))?;
                let clef = Clef::new(element_id(doc, node), shape, line, facs_zone(doc, node)?);
                page.add_clef(system, clef, just_push)?;
            }
            "neume" => {
                let neume = neume_from_mei(doc, node, facs_zone(doc, node)?)?;
                log::debug!("neume type: {}", neume.derive_name());
                page.add_neume(system, neume, just_push)?;
            }
            "custos" => {
                let custos = Custos::new(element_id(doc, node), facs_zone(doc, node)?, pitch_of(doc, node)?);
                page.add_custos(system, custos, just_push)?;
            }
            "division" => {
                let form_text = required(doc, node, "form")?;
                let form: DivisionForm = form_text.parse().map_err(|_| invalid(doc, node, "form", form_text))?;
                let division = Division::new(element_id(doc, node), facs_zone(doc, node)?, form);
                page.add_division(system, division, just_push)?;
            }
            _ => continue,
        }
        summary.glyphs += 1;
    }

    log::info!("loaded {} systems, {} glyphs", summary.systems, summary.glyphs);
    Ok(summary)
}

fn open_system(doc: &MeiDocument, sb: NodeId, page: &mut Page, options: &LoadOptions) -> Result<SystemId> {
    let systemref = required(doc, sb, "systemref")?;
    let system_el = doc
        .get_element_by_id(systemref.trim_start_matches('#'))
        .filter(|s| doc.name(*s) == "system")
        .ok_or_else(|| MeiError::ElementNotFound(format!("system {} of {}", systemref, describe(doc, sb))))?;
    let zone = facs_zone(doc, system_el)?;

    let system_options = match options.notation {
        Notation::Square => SystemOptions::staff(options.num_lines),
        Notation::Cheironomic => SystemOptions::cheironomic(),
    };
    let id = page.add_system(zone, system_options);
    let system = page.system_mut(id)?;
    system.mei_system_id = Some(systemref.trim_start_matches('#').to_string());
    system.mei_sb_id = doc.xml_id(sb).map(str::to_string);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Glyph, PitchName};

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mei xmlns="http://www.music-encoding.org/ns/mei" meiversion="2013">
  <music>
    <facsimile>
      <surface xml:id="surface1">
        <zone xml:id="z-sys1" ulx="100" uly="200" lrx="900" lry="260"/>
        <zone xml:id="z-clef1" ulx="105" uly="195" lrx="120" lry="225"/>
        <zone xml:id="z-n1" ulx="200" uly="215" lrx="215" lry="235"/>
        <zone xml:id="z-n2" ulx="300" uly="205" lrx="330" lry="235"/>
        <zone xml:id="z-div1" ulx="400" uly="200" lrx="403" lry="260"/>
        <zone xml:id="z-cu1" ulx="880" uly="215" lrx="888" lry="235"/>
      </surface>
    </facsimile>
    <pages>
      <page xml:id="page1">
        <system xml:id="sys1" facs="z-sys1"/>
      </page>
    </pages>
    <body>
      <mdiv>
        <score>
          <scoreDef><staffGrp><staffDef n="1"/></staffGrp></scoreDef>
          <section>
            <staff n="1">
              <layer n="1">
                <sb xml:id="sb1" n="1" systemref="sys1"/>
                <clef xml:id="clef1" shape="C" line="4" facs="z-clef1"/>
                <neume xml:id="n1" name="punctum" facs="z-n1">
                  <nc><note pname="a" oct="3"/></nc>
                </neume>
                <neume xml:id="n2" name="clivis" facs="z-n2">
                  <nc><note pname="b" oct="3"/><note pname="a" oct="3"><dot form="1"/></note></nc>
                </neume>
                <division xml:id="div1" form="major" facs="z-div1"/>
                <custos xml:id="cu1" pname="a" oct="3" facs="z-cu1"/>
              </layer>
            </staff>
          </section>
        </score>
      </mdiv>
    </body>
  </music>
</mei>"#;

    #[test]
    fn test_load_sample_page() {
        let doc = MeiDocument::parse(PAGE).unwrap();
        let mut page = Page::new();
        let summary = load_page(&doc, &mut page, &LoadOptions::default()).unwrap();

        assert_eq!(summary.systems, 1);
        assert_eq!(summary.glyphs, 5);
        assert_eq!(summary.first_system_zone, Some(Zone::new(100, 200, 900, 260)));
        assert_eq!(page.dimensions(), Some((900, 260)));

        let system = &page.systems()[0];
        assert_eq!(system.mei_system_id.as_deref(), Some("sys1"));
        assert_eq!(system.len(), 5);

        let n2 = page.neume(&ElementId::from("n2")).unwrap();
        assert_eq!(n2.root_pitch, Some(Pitch::new(PitchName::B, 3)));
        assert_eq!(n2.components[1].pitch_diff, -1);
        assert_eq!(n2.components[1].dot.as_deref(), Some("1"));
        // c clef on the top line: b3 is one step below it
        assert_eq!(n2.root_system_pos, -1);
        assert_eq!(n2.derive_name().name, "clivis");

        assert!(matches!(page.glyph(&ElementId::from("div1")), Some(Glyph::Division(_))));
    }

    #[test]
    fn test_missing_zone_names_the_element() {
        let broken = PAGE.replace(r#"facs="z-n1""#, r#"facs="z-missing""#);
        let doc = MeiDocument::parse(&broken).unwrap();
        let err = load_page(&doc, &mut Page::new(), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("neume n1"));
    }

    #[test]
    fn test_malformed_coordinates() {
        let broken = PAGE.replace(r#"ulx="200""#, r#"ulx="left""#);
        let doc = MeiDocument::parse(&broken).unwrap();
        let err = load_page(&doc, &mut Page::new(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, crate::error::NeonError::Mei(MeiError::InvalidValue { .. })));
    }

    #[test]
    fn test_cheironomic_load_skips_clefs() {
        let doc = MeiDocument::parse(PAGE).unwrap();
        let mut page = Page::new();
        let options = LoadOptions {
            notation: Notation::Cheironomic,
            ..LoadOptions::default()
        };
        let summary = load_page(&doc, &mut page, &options).unwrap();
        assert_eq!(summary.glyphs, 4);
        assert!(!page.systems()[0].is_staff());
    }

    #[test]
    fn test_float_coordinates_are_rounded() {
        let mut doc = MeiDocument::new("zone");
        let root = doc.root();
        for (k, v) in [("ulx", "1.6"), ("uly", "2"), ("lrx", "10"), ("lry", "20.2")] {
            doc.set_attribute(root, k, v);
        }
        assert_eq!(parse_zone(&doc, root).unwrap(), Zone::new(2, 2, 10, 20));
    }
}
