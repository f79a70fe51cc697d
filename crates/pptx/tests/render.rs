use slidegen_core::{extract_outline, Error, FlatOutline, RichOutline, RichSlide, StructuredOutline};
use slidegen_pptx::{Deck, DeckArtifact, DeckRenderer, DeckTemplate, OutputTarget, Package};

fn flat(titles: &[&str], bullets: Vec<Vec<&str>>) -> StructuredOutline {
    StructuredOutline::Flat(FlatOutline {
        titles: titles.iter().map(|t| t.to_string()).collect(),
        bullets: bullets
            .into_iter()
            .map(|list| list.into_iter().map(String::from).collect())
            .collect(),
    })
}

fn rich_outline() -> StructuredOutline {
    StructuredOutline::Rich(RichOutline {
        title: "Rust in Production".into(),
        subtitle: Some("Lessons learned".into()),
        slides: vec![
            RichSlide {
                title: "Why Rust".into(),
                content: "• Safety\n• Speed\n\n- Tooling".into(),
                notes: Some("Open with the outage story".into()),
            },
            RichSlide {
                title: "Adoption".into(),
                content: "* Start small\n   \n* Measure".into(),
                notes: None,
            },
            RichSlide {
                title: "Questions".into(),
                content: String::new(),
                notes: Some("   ".into()),
            },
        ],
    })
}

fn render(outline: &StructuredOutline, title: &str) -> Deck {
    DeckRenderer::new()
        .render(outline, &DeckTemplate::builtin(), title)
        .unwrap()
}

#[test]
fn flat_outline_renders_title_plus_one_slide_per_title() {
    let outline = flat(&["A", "B", "C", "D"], vec![vec!["a1", "a2"], vec![], vec!["c1"]]);
    let slides = render(&outline, "Deck").slides().unwrap();

    assert_eq!(slides.len(), 5);
    assert_eq!(slides[0].title, "Deck");
    let titles: Vec<&str> = slides[1..].iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C", "D"]);

    assert_eq!(slides[1].bullets, vec!["a1", "a2"]);
    assert!(slides[2].bullets.is_empty());
    assert_eq!(slides[3].bullets, vec!["c1"]);
    assert!(slides[4].bullets.is_empty());
}

#[test]
fn extracted_reply_renders_three_slides() {
    let reply = "Intro\n```json\n{\"titles\":[\"A\",\"B\"],\"bullets\":[[\"x\"],[]]}\n```";
    let outline = extract_outline(reply).unwrap();
    let slides = render(&outline, outline.deck_title()).slides().unwrap();

    assert_eq!(slides.len(), 3);
    assert_eq!(slides[1].title, "A");
    assert_eq!(slides[1].bullets, vec!["x"]);
    assert_eq!(slides[2].title, "B");
    assert!(slides[2].bullets.is_empty());
}

#[test]
fn rich_outline_bullet_counts_follow_content_lines() {
    let outline = rich_outline();
    let slides = render(&outline, outline.deck_title()).slides().unwrap();

    assert_eq!(slides.len(), 4);
    assert_eq!(slides[0].title, "Rust in Production");
    assert_eq!(slides[0].bullets, vec!["Lessons learned"]);

    assert_eq!(slides[1].bullets, vec!["Safety", "Speed", "Tooling"]);
    assert_eq!(slides[2].bullets, vec!["Start small", "Measure"]);
    assert!(slides[3].bullets.is_empty());
}

#[test]
fn notes_attach_only_to_slides_that_have_them() {
    let outline = rich_outline();
    let deck = render(&outline, "Deck");
    let slides = deck.slides().unwrap();

    assert_eq!(slides[0].notes, None);
    assert_eq!(slides[1].notes.as_deref(), Some("Open with the outage story"));
    assert_eq!(slides[2].notes, None);
    assert_eq!(slides[3].notes, None);

    let package = deck.package();
    assert!(package.contains("ppt/notesMasters/notesMaster1.xml"));
    assert!(package.contains("ppt/theme/theme2.xml"));
    assert!(package.contains("ppt/notesSlides/notesSlide1.xml"));
    assert!(!package.contains("ppt/notesSlides/notesSlide2.xml"));

    let presentation = package.xml_part("ppt/presentation.xml").unwrap();
    assert!(presentation.contains("<p:notesMasterIdLst>"));
}

#[test]
fn deck_without_notes_gets_no_notes_master() {
    let deck = render(&flat(&["A"], vec![]), "Deck");
    assert!(!deck.package().contains("ppt/notesMasters/notesMaster1.xml"));
    assert!(deck.slides().unwrap().iter().all(|s| s.notes.is_none()));
}

#[test]
fn base64_round_trip_preserves_slide_text() {
    let outline = rich_outline();
    let deck = render(&outline, "Round trip & back");

    let encoded = deck.to_base64().unwrap();
    let decoded = Deck::from_base64(&encoded).unwrap();

    assert_eq!(decoded.slides().unwrap(), deck.slides().unwrap());
    assert_eq!(decoded.slides().unwrap()[0].title, "Round trip & back");
}

#[test]
fn rendered_deck_is_usable_as_template() {
    let first = render(&flat(&["Old 1", "Old 2", "Old 3"], vec![]), "Old deck");
    let template = DeckTemplate::from_bytes(&first.to_bytes().unwrap()).unwrap();

    let second = DeckRenderer::new()
        .render(&flat(&["New"], vec![vec!["fresh"]]), &template, "New deck")
        .unwrap();
    let slides = second.slides().unwrap();

    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].title, "New deck");
    assert_eq!(slides[1].title, "New");
    assert!(!second.package().contains("ppt/slides/slide3.xml"));
    assert!(!second.package().contains("ppt/slides/slide4.xml"));
}

#[test]
fn template_with_notes_master_is_reused() {
    let first = render(&rich_outline(), "With notes");
    let template = DeckTemplate::from_bytes(&first.to_bytes().unwrap()).unwrap();

    let second = DeckRenderer::new()
        .render(&rich_outline(), &template, "Again")
        .unwrap();

    assert!(!second.package().contains("ppt/notesMasters/notesMaster2.xml"));
    assert!(!second.package().contains("ppt/theme/theme3.xml"));
    assert_eq!(
        second.slides().unwrap()[1].notes.as_deref(),
        Some("Open with the outage story")
    );
}

#[test]
fn missing_title_placeholder_is_render_error() {
    let mut package: Package = DeckTemplate::builtin().into_package();
    let layout = "ppt/slideLayouts/slideLayout1.xml";
    let xml = package
        .xml_part(layout)
        .unwrap()
        .replace(r#"<p:ph type="ctrTitle"/>"#, r#"<p:ph type="pic" idx="7"/>"#);
    package.set_part(layout, xml);
    let template = DeckTemplate::from_package(package).unwrap();

    let err = DeckRenderer::new()
        .render(&flat(&["A"], vec![]), &template, "Deck")
        .unwrap_err();
    assert!(matches!(err, Error::RenderError(_)));
    assert!(!err.is_retryable());
}

#[test]
fn subtitle_is_skipped_when_title_layout_has_no_slot() {
    let mut package = DeckTemplate::builtin().into_package();
    let layout = "ppt/slideLayouts/slideLayout1.xml";
    let xml = package
        .xml_part(layout)
        .unwrap()
        .replace(r#"<p:ph type="subTitle" idx="1"/>"#, r#"<p:ph type="dt" idx="10"/>"#);
    package.set_part(layout, xml);
    let template = DeckTemplate::from_package(package).unwrap();

    let deck = DeckRenderer::new()
        .render(&rich_outline(), &template, "Deck")
        .unwrap();
    let slides = deck.slides().unwrap();
    assert_eq!(slides.len(), 4);
    assert!(slides[0].bullets.is_empty());
}

#[test]
fn core_properties_carry_title_and_subtitle() {
    let deck = render(&rich_outline(), "Rust in Production");
    let core = deck.package().xml_part("docProps/core.xml").unwrap();

    assert!(core.contains("<dc:title>Rust in Production</dc:title>"));
    assert!(core.contains("<dc:description>Lessons learned</dc:description>"));
}

#[test]
fn rich_outline_with_no_slides_renders_title_only() {
    let outline = extract_outline(r#"{"title": "Just a title", "slides": []}"#).unwrap();
    let slides = render(&outline, outline.deck_title()).slides().unwrap();

    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title, "Just a title");
}

#[test]
fn save_to_dir_uses_unique_pptx_names() {
    let dir = tempfile::tempdir().unwrap();
    let deck = render(&flat(&["A"], vec![]), "Deck");

    let first = deck.save_to_dir(dir.path().join("outputs")).unwrap();
    let second = deck.save_to_dir(dir.path().join("outputs")).unwrap();

    assert_ne!(first, second);
    assert_eq!(first.extension().and_then(|e| e.to_str()), Some("pptx"));
    let stem = first.file_stem().and_then(|s| s.to_str()).unwrap();
    assert_eq!(stem.len(), 36);

    let reread = Deck::from_bytes(&std::fs::read(&first).unwrap()).unwrap();
    assert_eq!(reread.slide_count().unwrap(), 2);
}

#[test]
fn into_artifact_forms() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.pptx");

    let artifact = render(&flat(&["A"], vec![]), "Deck")
        .into_artifact(OutputTarget::File(path.clone()))
        .unwrap();
    assert_eq!(artifact, DeckArtifact::File(path.clone()));
    assert!(path.exists());

    let artifact = render(&flat(&["A"], vec![]), "Deck")
        .into_artifact(OutputTarget::Encoded)
        .unwrap();
    match artifact {
        DeckArtifact::Encoded { bytes, base64 } => {
            assert!(!bytes.is_empty());
            let decoded = Deck::from_base64(&base64).unwrap();
            assert_eq!(decoded.slide_count().unwrap(), 2);
        }
        other => panic!("expected encoded artifact, got {:?}", other),
    }
}

fn assert_parts_are_well_formed(deck: &Deck) {
    let package = deck.package();
    let names: Vec<&str> = package
        .part_names()
        .filter(|name| name.ends_with(".xml") || name.ends_with(".rels"))
        .collect();
    assert!(!names.is_empty());

    for name in names {
        let xml = package
            .xml_part(name)
            .unwrap_or_else(|| panic!("{} is not UTF-8", name));
        let bad = xml
            .chars()
            .find(|c| matches!(*c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'));
        assert_eq!(bad, None, "{} carries a character XML forbids", name);

        let mut reader = quick_xml::Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("{} does not parse: {}", name, e),
            }
        }
    }
}

#[test]
fn control_characters_in_model_text_are_dropped() {
    let outline = extract_outline(r#"{"titles":["Ti\u0001tle"],"bullets":[["tab\u000bbed"]]}"#).unwrap();
    let deck = render(&outline, outline.deck_title());
    assert_parts_are_well_formed(&deck);

    let slides = Deck::from_bytes(&deck.to_bytes().unwrap())
        .unwrap()
        .slides()
        .unwrap();
    assert_eq!(slides[0].title, "Title");
    assert_eq!(slides[1].title, "Title");
    assert_eq!(slides[1].bullets, vec!["tabbed"]);
}

#[test]
fn control_characters_in_subtitle_and_notes_are_dropped() {
    let outline = extract_outline(
        r#"{"title":"Deck\u0002","subtitle":"Sub\u001ftitle","slides":[{"title":"One","content":"- a\u0007","notes":"Say\u0000 hi"}]}"#,
    )
    .unwrap();
    let deck = render(&outline, outline.deck_title());
    assert_parts_are_well_formed(&deck);

    let slides = deck.slides().unwrap();
    assert_eq!(slides[0].title, "Deck");
    assert_eq!(slides[0].bullets, vec!["Subtitle"]);
    assert_eq!(slides[1].bullets, vec!["a"]);
    assert_eq!(slides[1].notes.as_deref(), Some("Say hi"));
}
