#![cfg(feature = "xml-export")]

mod common;

use common::{Builder, Node};
use tdc_datacenter::{DataCenter, XmlExporter};
use tracing_test::traced_test;

fn sample() -> DataCenter {
    let root = Node::new("Root")
        .child(
            Node::new("ItemData")
                .attr("id", 1)
                .child(Node::new("Item").attr("name", "Sword").attr("weight", 2.5f32)),
        )
        .child(Node::new("StrSheet").attr("lang", "en"))
        .child(Node::new("ItemData").attr("id", 2));
    DataCenter::from_unpacked(Builder::new(root).elements_per_bucket(3).build()).unwrap()
}

#[test]
fn element_to_xml() {
    let dc = sample();
    let item_data = dc.root().unwrap().child("ItemData").unwrap().unwrap();

    let xml = XmlExporter::new(&dc).export_element(&item_data).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(xml.contains("<ItemData id=\"1\">"));
    assert!(xml.contains("<Item name=\"Sword\" weight=\"2.5\"/>"));
    assert!(xml.trim_end().ends_with("</ItemData>"));
}

#[test]
fn groups_follow_first_appearance() {
    let dc = sample();
    let groups = XmlExporter::new(&dc).groups().unwrap();

    let summary: Vec<(&str, usize)> = groups.iter().map(|g| (g.name.as_str(), g.elements.len())).collect();
    assert_eq!(summary, vec![("ItemData", 2), ("StrSheet", 1)]);
}

#[traced_test]
#[test]
fn export_all_layout() {
    let dc = sample();
    let dir = tempfile::tempdir().unwrap();

    let mut last = (0, 0);
    let stats = XmlExporter::new(&dc)
        .export_all(dir.path(), |done, total| last = (done, total))
        .unwrap();

    assert!(stats.is_complete());
    assert_eq!(stats.total, 3);
    assert_eq!(last, (3, 3));

    let single = std::fs::read_to_string(dir.path().join("StrSheet.xml")).unwrap();
    assert!(single.contains("<StrSheet lang=\"en\"/>"));

    let first = std::fs::read_to_string(dir.path().join("ItemData").join("ItemData_0.xml")).unwrap();
    let second = std::fs::read_to_string(dir.path().join("ItemData").join("ItemData_1.xml")).unwrap();
    assert!(first.contains("id=\"1\""));
    assert!(second.contains("id=\"2\""));
    assert!(!dir.path().join("ItemData.xml").exists());
}
