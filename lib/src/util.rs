use anyhow::{anyhow, Result};

use std::io::{BufReader, Cursor, Write};
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::graph::Graph as OxigraphGraph;
use oxigraph::model::Triple;

use crate::namespaces::NamespaceTable;

use log::{debug, info};

/// Guesses the serialization of an ontology file from its extension.
pub fn format_for_path(path: &Path) -> Option<RdfFormat> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    match ext.to_ascii_lowercase().as_str() {
        "owl" | "rdf" | "xml" => Some(RdfFormat::RdfXml),
        "ttl" | "n3" => Some(RdfFormat::Turtle),
        "nt" => Some(RdfFormat::NTriples),
        _ => None,
    }
}

fn parse_with_format(bytes: &[u8], format: RdfFormat) -> Result<OxigraphGraph> {
    let parser = RdfParser::from_format(format).for_reader(BufReader::new(Cursor::new(bytes)));
    let mut graph = OxigraphGraph::new();
    for quad in parser {
        let quad = quad?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }
    Ok(graph)
}

/// Parses RDF bytes, trying the preferred format first and then the others.
/// Returns the graph together with the format that succeeded.
pub fn parse_graph(bytes: &[u8], preferred: Option<RdfFormat>) -> Result<(OxigraphGraph, RdfFormat)> {
    let mut candidates = vec![RdfFormat::RdfXml, RdfFormat::Turtle, RdfFormat::NTriples];
    if let Some(p) = preferred {
        candidates.retain(|f| *f != p);
        candidates.insert(0, p);
    }
    let mut first_empty = None;
    let mut last_error = None;
    for format in candidates {
        match parse_with_format(bytes, format) {
            // a lenient parser may accept foreign syntax without yielding anything
            Ok(graph) if graph.is_empty() => {
                debug!("Parsing as {} produced no triples", format);
                first_empty.get_or_insert((graph, format));
            }
            Ok(graph) => {
                debug!("Parsed {} triples as {}", graph.len(), format);
                return Ok((graph, format));
            }
            Err(e) => {
                debug!("Could not parse as {}: {}", format, e);
                last_error = Some(e);
            }
        }
    }
    if let Some((graph, format)) = first_empty {
        return Ok((graph, format));
    }
    Err(match last_error {
        Some(e) => e.context("Failed to parse RDF bytes in any supported format"),
        None => anyhow!("Failed to parse RDF bytes in any supported format"),
    })
}

pub fn read_file(file: &Path) -> Result<(OxigraphGraph, RdfFormat)> {
    debug!("Reading file: {}", file.display());
    let bytes = std::fs::read(file)?;
    parse_graph(&bytes, format_for_path(file))
}

/// Serializes `graph`, declaring the namespace table's prefixes where the
/// format supports them.
pub fn write_graph<W: Write>(
    graph: &OxigraphGraph,
    format: RdfFormat,
    namespaces: &NamespaceTable,
    writer: W,
) -> Result<W> {
    let mut serializer = RdfSerializer::from_format(format);
    for ns in namespaces.entries() {
        serializer = serializer.with_prefix(ns.prefix.as_str(), ns.base.as_str())?;
    }
    let mut serializer = serializer.for_writer(writer);
    for triple in graph.iter() {
        serializer.serialize_triple(triple)?;
    }
    Ok(serializer.finish()?)
}

pub fn write_graph_to_file(
    graph: &OxigraphGraph,
    file: &Path,
    format: RdfFormat,
    namespaces: &NamespaceTable,
) -> Result<()> {
    info!(
        "Writing graph to file: {} with length {}",
        file.display(),
        graph.len()
    );
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(file)?;
    let mut writer = write_graph(graph, format, namespaces, std::io::BufWriter::new(file))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:p ex:b .
        ex:b ex:p "literal" .
    "#;

    #[test]
    fn test_format_for_path() {
        assert_eq!(format_for_path(Path::new("o3po.owl")), Some(RdfFormat::RdfXml));
        assert_eq!(format_for_path(Path::new("model.TTL")), Some(RdfFormat::Turtle));
        assert_eq!(format_for_path(Path::new("model.nt")), Some(RdfFormat::NTriples));
        assert_eq!(format_for_path(Path::new("model")), None);
    }

    #[test]
    fn test_parse_graph_falls_back() {
        // the extension claims RDF/XML but the content is Turtle
        let (graph, format) = parse_graph(TTL.as_bytes(), Some(RdfFormat::RdfXml)).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(format, RdfFormat::Turtle);

        assert!(parse_graph(b"<<< not rdf", None).is_err());
    }

    #[test]
    fn test_parse_graph_accepts_empty_documents() {
        let prefixes_only = "@prefix ex: <http://example.org/> .\n@prefix o3po: <http://example.org/o3po#> .\n";
        let (graph, format) = parse_graph(prefixes_only.as_bytes(), Some(RdfFormat::Turtle)).unwrap();
        assert!(graph.is_empty());
        assert_eq!(format, RdfFormat::Turtle);

        let empty_rdf_xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/>"#;
        let (graph, format) = parse_graph(empty_rdf_xml.as_bytes(), None).unwrap();
        assert!(graph.is_empty());
        assert_eq!(format, RdfFormat::RdfXml);
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, _) = parse_graph(TTL.as_bytes(), Some(RdfFormat::Turtle)).unwrap();
        let path = dir.path().join("out/model.owl");
        write_graph_to_file(&graph, &path, RdfFormat::RdfXml, &NamespaceTable::builtin()).unwrap();
        let (back, format) = read_file(&path).unwrap();
        assert_eq!(format, RdfFormat::RdfXml);
        assert_eq!(back, graph);

        assert!(read_file(Path::new("does/not/exist.ttl")).is_err());
    }
}
