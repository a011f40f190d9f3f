//! End-to-end tests over synthetic run reports
//!
//! Exercises the full pipeline (chunked input, tokenizer, array
//! extraction, event stream) against generated documents large enough
//! to cross many chunk boundaries.

use std::fmt::Write as _;
use std::io::Read;

use dftxml::prelude::*;

/// Reader adapter that returns at most `chunk` bytes per read call,
/// forcing refills at arbitrary offsets.
struct Trickle<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.len().min(self.chunk).min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Build a vasprun-style report with `steps` ionic steps of `atoms`
/// force rows each.
fn generate_report(steps: usize, atoms: usize) -> String {
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n");
    doc.push_str("<modeling>\n <generator>\n");
    doc.push_str("  <i name=\"program\" type=\"string\">prog</i>\n");
    doc.push_str(" </generator>\n");
    for step in 0..steps {
        doc.push_str(" <calculation>\n");
        writeln!(doc, "  <varray name=\"forces\">").unwrap();
        for atom in 0..atoms {
            let base = (step * atoms + atom) as f64;
            writeln!(
                doc,
                "   <v> {:>14.8} {:>14.8} {:>14.8} </v>",
                base * 0.5,
                -base * 0.25,
                base * 0.0078125
            )
            .unwrap();
        }
        doc.push_str("  </varray>\n");
        writeln!(doc, "  <i name=\"e_fr_energy\"> -{}.12345678 </i>", step + 10).unwrap();
        doc.push_str(" </calculation>\n");
    }
    doc.push_str("</modeling>\n");
    doc
}

fn collect_events(mut reader: Reader<impl Read>) -> Result<Vec<Event>, ParseError> {
    let _ = env_logger::builder().is_test(true).try_init();
    reader.declare_array(|name, _| name == "v", ArrayKind::Float);
    reader.declare_text(|name, attrs| {
        name == "i" && attrs.get("name") == Some("e_fr_energy")
    });
    let mut events = Vec::new();
    while let Some(event) = reader.next_event()? {
        events.push(event);
    }
    Ok(events)
}

#[test]
fn test_extracts_every_force_row() {
    let doc = generate_report(5, 8);
    let events = collect_events(Reader::from_slice(doc.as_bytes())).unwrap();

    let arrays: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Array(a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(arrays.len(), 5 * 8);
    for array in &arrays {
        assert_eq!(array.values.len(), 3);
        assert_eq!(array.path, vec!["modeling", "calculation", "varray"]);
        assert_eq!(array.attributes.len(), 0);
    }
    // Spot-check an exact value against the generator.
    let row = &arrays[13];
    assert_eq!(row.values.as_floats().unwrap()[0], 6.5);
    assert_eq!(row.values.as_floats().unwrap()[1], -3.25);

    let energies: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            Event::Text(t) => Some(t.as_float().unwrap()),
            _ => None,
        })
        .collect();
    assert_eq!(energies.len(), 5);
    assert_eq!(energies[0], -10.12345678);
}

#[test]
fn test_chunk_size_does_not_change_results() {
    let doc = generate_report(2, 3);
    let reference = collect_events(Reader::from_slice(doc.as_bytes())).unwrap();
    assert!(!reference.is_empty());

    for chunk in [1, 2, 3, 7, 64, 1024, doc.len()] {
        let trickled = collect_events(Reader::from_reader(Trickle {
            data: doc.as_bytes(),
            chunk,
        }))
        .unwrap();
        assert_eq!(trickled, reference, "chunk size {chunk}");
    }
}

#[test]
fn test_reparse_is_idempotent() {
    let doc = generate_report(3, 4);
    let first = collect_events(Reader::from_slice(doc.as_bytes())).unwrap();
    let second = collect_events(Reader::from_slice(doc.as_bytes())).unwrap();
    assert_eq!(first, second);
}

/// Re-serialize the event stream as a skeleton document and parse that
/// again: element structure and array contents must survive.
#[test]
fn test_structure_survives_round_trip() {
    let doc = generate_report(2, 2);
    let events = collect_events(Reader::from_slice(doc.as_bytes())).unwrap();

    let mut reserialized = String::new();
    for event in &events {
        match event {
            Event::ElementStart { name } => {
                write!(reserialized, "<{name}>").unwrap()
            }
            Event::ElementEnd { name } => {
                write!(reserialized, "</{name}>").unwrap()
            }
            Event::Array(array) => {
                for v in array.values.as_floats().unwrap() {
                    write!(reserialized, " {v:e} ").unwrap();
                }
            }
            Event::Text(text) => write!(reserialized, "{}", text.content).unwrap(),
        }
    }

    let again = collect_events(Reader::from_slice(reserialized.as_bytes())).unwrap();
    let structure = |events: &[Event]| -> Vec<Event> {
        events
            .iter()
            .filter(|e| {
                matches!(e, Event::ElementStart { .. } | Event::ElementEnd { .. })
            })
            .cloned()
            .collect()
    };
    assert_eq!(structure(&again), structure(&events));

    let values = |events: &[Event]| -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Array(a) => Some(a.values.as_floats().unwrap().to_vec()),
                _ => None,
            })
            .flatten()
            .collect()
    };
    assert_eq!(values(&again), values(&events));
}

#[test]
fn test_mismatched_end_tag_is_rejected() {
    let result = collect_events(Reader::from_slice(b"<a><b></a></b>"));
    match result {
        Err(ParseError::TagMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, "b");
            assert_eq!(found, "a");
        }
        other => panic!("expected tag mismatch, got {other:?}"),
    }
}

#[test]
fn test_truncated_report_is_rejected() {
    let doc = generate_report(1, 2);
    // Cut the document mid-attribute, mid-tag, and mid-text; every
    // truncation point must fail, never succeed with partial data.
    for cut in [doc.len() / 4, doc.len() / 2, doc.len() - 3] {
        let result = collect_events(Reader::from_slice(&doc.as_bytes()[..cut]));
        assert!(result.is_err(), "truncation at byte {cut} was accepted");
    }
}

#[test]
fn test_error_position_points_at_the_bad_literal() {
    let doc = b"<varray>\n<v>1.0 2.0</v>\n<v>3.0 bogus</v>\n</varray>";
    let result = collect_events(Reader::from_slice(doc));
    match result {
        Err(ParseError::MalformedArrayElement {
            element,
            index,
            position,
            ..
        }) => {
            assert_eq!(element, "v");
            assert_eq!(index, 1);
            assert_eq!(position.line, 3);
            assert_eq!(position.column, 8);
        }
        other => panic!("expected malformed array element, got {other:?}"),
    }
}

#[test]
fn test_comments_and_declarations_are_skipped() {
    let doc = b"<!DOCTYPE modeling>\n<!-- generated -->\n<modeling>\n\
        <!-- <v>9.9</v> inside a comment is not data -->\n\
        <v>1.5 2.5</v>\n</modeling>";
    let events = collect_events(Reader::from_slice(doc)).unwrap();
    let arrays: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Array(a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(arrays.len(), 1);
    assert_eq!(arrays[0].values.as_floats(), Some(&[1.5, 2.5][..]));
}

mod random_chunking {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chunked_parse_matches_whole_buffer(
            chunk in 1usize..256,
            steps in 1usize..4,
            atoms in 1usize..6,
        ) {
            let doc = generate_report(steps, atoms);
            let whole = collect_events(Reader::from_slice(doc.as_bytes())).unwrap();
            let trickled = collect_events(Reader::from_reader(Trickle {
                data: doc.as_bytes(),
                chunk,
            }))
            .unwrap();
            prop_assert_eq!(whole, trickled);
        }
    }
}
