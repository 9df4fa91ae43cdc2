//! Reading and writing the document outline (`/Root/Outlines`).

use crate::bookmark_file::BookmarkEntry;
use crate::pdf::document::{catalog_id, decode_text_string, encode_text_string, page_ids};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("Bookmark {row} ('{title}'): the first bookmark must be level 1, not level {level}")]
    BadFirstLevel { row: usize, title: String, level: u32 },
    #[error("Bookmark {row} ('{title}'): level {level} cannot directly follow level {previous}")]
    BadHierarchy {
        row: usize,
        title: String,
        level: u32,
        previous: u32,
    },
    #[error("Bookmark '{title}' points to page {page}, but the document has {page_count} pages")]
    PageOutOfRange {
        title: String,
        page: u32,
        page_count: u32,
    },
    #[error("Document has no catalog")]
    MissingCatalog,
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub level: u32,
    pub title: String,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineListing {
    /// The document carries no outline, or an outline without items.
    Missing,
    Entries(Vec<OutlineItem>),
}

impl OutlineListing {
    pub fn entries(&self) -> &[OutlineItem] {
        match self {
            OutlineListing::Missing => &[],
            OutlineListing::Entries(entries) => entries,
        }
    }
}

/// Read the outline as a flat list in document order, levels starting at 1.
pub fn read_outline(doc: &Document) -> OutlineListing {
    let Ok(catalog) = doc.catalog() else {
        return OutlineListing::Missing;
    };

    let outlines = match catalog.get(b"Outlines") {
        Ok(Object::Reference(r)) => doc.get_dictionary(*r).ok(),
        Ok(Object::Dictionary(d)) => Some(d),
        _ => None,
    };
    let first_ref = match outlines.map(|o| o.get(b"First")) {
        Some(Ok(Object::Reference(r))) => *r,
        _ => return OutlineListing::Missing,
    };

    let page_map = build_page_map(doc);
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    collect_items(doc, first_ref, &page_map, 1, &mut visited, &mut items);

    if items.is_empty() {
        OutlineListing::Missing
    } else {
        OutlineListing::Entries(items)
    }
}

fn collect_items(
    doc: &Document,
    first_id: ObjectId,
    page_map: &[(ObjectId, u32)],
    level: u32,
    visited: &mut HashSet<ObjectId>,
    items: &mut Vec<OutlineItem>,
) {
    let mut current_id = Some(first_id);

    while let Some(id) = current_id {
        // A malformed outline can link back to an earlier item
        if !visited.insert(id) {
            break;
        }
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };

        let title = match dict.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_text_string(bytes),
            _ => "Untitled".to_string(),
        };
        items.push(OutlineItem {
            level,
            title,
            page: get_destination_page(doc, dict, page_map),
        });

        if let Ok(Object::Reference(child_ref)) = dict.get(b"First") {
            collect_items(doc, *child_ref, page_map, level + 1, visited, items);
        }

        current_id = match dict.get(b"Next") {
            Ok(Object::Reference(r)) => Some(*r),
            _ => None,
        };
    }
}

fn get_destination_page(
    doc: &Document,
    dict: &Dictionary,
    page_map: &[(ObjectId, u32)],
) -> Option<u32> {
    if let Ok(dest) = dict.get(b"Dest") {
        return resolve_destination(doc, dest, page_map, 0);
    }

    let action = match dict.get(b"A") {
        Ok(Object::Reference(action_ref)) => doc.get_dictionary(*action_ref).ok(),
        Ok(Object::Dictionary(action_dict)) => Some(action_dict),
        _ => None,
    }?;

    match action.get(b"S") {
        Ok(Object::Name(action_type)) if action_type == b"GoTo" => {
            resolve_destination(doc, action.get(b"D").ok()?, page_map, 0)
        }
        _ => None,
    }
}

// Guards against reference and name-tree loops
const MAX_DEPTH: u32 = 32;

fn resolve_destination(
    doc: &Document,
    dest: &Object,
    page_map: &[(ObjectId, u32)],
    depth: u32,
) -> Option<u32> {
    if depth > MAX_DEPTH {
        return None;
    }
    match dest {
        Object::String(name, _) | Object::Name(name) => {
            resolve_named_destination(doc, name, page_map, depth + 1)
        }
        Object::Array(arr) => get_page_from_dest_array(arr, page_map),
        // Named destinations may map to a dictionary holding the array in /D
        Object::Dictionary(d) => resolve_destination(doc, d.get(b"D").ok()?, page_map, depth + 1),
        Object::Reference(r) => {
            resolve_destination(doc, doc.get_object(*r).ok()?, page_map, depth + 1)
        }
        _ => None,
    }
}

fn resolve_named_destination(
    doc: &Document,
    name: &[u8],
    page_map: &[(ObjectId, u32)],
    depth: u32,
) -> Option<u32> {
    let catalog = doc.catalog().ok()?;

    if let Ok(Object::Reference(names_ref)) = catalog.get(b"Names") {
        if let Ok(names_dict) = doc.get_dictionary(*names_ref) {
            if let Ok(Object::Reference(dests_ref)) = names_dict.get(b"Dests") {
                if let Some(page) = search_name_tree(doc, *dests_ref, name, page_map, depth) {
                    return Some(page);
                }
            }
        }
    }

    // Older documents keep a plain /Dests dictionary in the catalog
    if let Ok(Object::Reference(dests_ref)) = catalog.get(b"Dests") {
        if let Ok(dests_dict) = doc.get_dictionary(*dests_ref) {
            if let Ok(dest) = dests_dict.get(name) {
                return resolve_destination(doc, dest, page_map, depth + 1);
            }
        }
    }

    None
}

fn search_name_tree(
    doc: &Document,
    node_id: ObjectId,
    name: &[u8],
    page_map: &[(ObjectId, u32)],
    depth: u32,
) -> Option<u32> {
    if depth > MAX_DEPTH {
        return None;
    }
    let dict = doc.get_dictionary(node_id).ok()?;

    if let Ok(Object::Array(names)) = dict.get(b"Names") {
        for pair in names.chunks_exact(2) {
            if let Object::String(key, _) = &pair[0] {
                if key == name {
                    return resolve_destination(doc, &pair[1], page_map, depth + 1);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = dict.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_ref) = kid {
                if let Some(page) = search_name_tree(doc, *kid_ref, name, page_map, depth + 1) {
                    return Some(page);
                }
            }
        }
    }

    None
}

fn get_page_from_dest_array(arr: &[Object], page_map: &[(ObjectId, u32)]) -> Option<u32> {
    // [page_ref /XYZ left top zoom] and friends
    let Some(Object::Reference(page_ref)) = arr.first() else {
        return None;
    };
    page_map
        .iter()
        .find(|(id, _)| id == page_ref)
        .map(|(_, num)| *num)
}

fn build_page_map(doc: &Document) -> Vec<(ObjectId, u32)> {
    page_ids(doc).into_iter().map(|(num, id)| (id, num)).collect()
}

/// Check that a flat list describes a well-formed tree: it starts at level 1
/// and never skips a level on the way down.
pub fn validate_hierarchy(entries: &[BookmarkEntry]) -> Result<(), OutlineError> {
    let mut previous = 0;
    for (idx, entry) in entries.iter().enumerate() {
        if idx == 0 && entry.level != 1 {
            return Err(OutlineError::BadFirstLevel {
                row: 1,
                title: entry.title.clone(),
                level: entry.level,
            });
        }
        if entry.level == 0 || entry.level > previous + 1 {
            return Err(OutlineError::BadHierarchy {
                row: idx + 1,
                title: entry.title.clone(),
                level: entry.level,
                previous,
            });
        }
        previous = entry.level;
    }
    Ok(())
}

struct Node {
    id: ObjectId,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Replace the outline of `doc` with `entries`.
///
/// `pages` holds the 1-based page number to object id mapping of the
/// document the outline points into. For an incremental update this is the
/// previous revision, while `doc` is the update section that must already
/// contain a copy of the catalog.
pub fn write_outline(
    doc: &mut Document,
    root_id: ObjectId,
    pages: &[(u32, ObjectId)],
    entries: &[BookmarkEntry],
) -> Result<(), OutlineError> {
    validate_hierarchy(entries)?;

    let page_count = pages.len() as u32;
    let mut page_refs = Vec::with_capacity(entries.len());
    for entry in entries {
        let page_ref = pages
            .iter()
            .find(|(num, _)| *num == entry.page)
            .map(|(_, id)| *id)
            .ok_or_else(|| OutlineError::PageOutOfRange {
                title: entry.title.clone(),
                page: entry.page,
                page_count,
            })?;
        page_refs.push(page_ref);
    }

    let outlines_id = doc.new_object_id();

    // Parent links follow from the level sequence: each entry hangs under
    // the closest preceding entry with a smaller level.
    let mut nodes: Vec<Node> = Vec::with_capacity(entries.len());
    let mut top_level = Vec::new();
    let mut stack: Vec<(u32, usize)> = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        while stack.last().is_some_and(|(level, _)| *level >= entry.level) {
            stack.pop();
        }
        let parent = stack.last().map(|(_, parent_idx)| *parent_idx);
        match parent {
            Some(p) => nodes[p].children.push(idx),
            None => top_level.push(idx),
        }
        nodes.push(Node {
            id: doc.new_object_id(),
            parent,
            children: Vec::new(),
        });
        stack.push((entry.level, idx));
    }

    for (idx, entry) in entries.iter().enumerate() {
        let node = &nodes[idx];
        let siblings = match node.parent {
            Some(p) => &nodes[p].children,
            None => &top_level,
        };
        let position = siblings.iter().position(|&s| s == idx).unwrap_or(0);

        let mut item = dictionary! {
            "Title" => encode_text_string(&entry.title),
            "Parent" => node.parent.map_or(outlines_id, |p| nodes[p].id),
            "Dest" => vec![Object::Reference(page_refs[idx]), Object::Name(b"Fit".to_vec())],
        };
        if position > 0 {
            item.set("Prev", nodes[siblings[position - 1]].id);
        }
        if let Some(&next) = siblings.get(position + 1) {
            item.set("Next", nodes[next].id);
        }
        if let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) {
            item.set("First", nodes[first].id);
            item.set("Last", nodes[last].id);
            item.set("Count", descendant_count(&nodes, idx) as i64);
        }
        doc.objects.insert(node.id, Object::Dictionary(item));
    }

    let mut outlines = dictionary! {
        "Type" => "Outlines",
        "Count" => entries.len() as i64,
    };
    if let (Some(&first), Some(&last)) = (top_level.first(), top_level.last()) {
        outlines.set("First", nodes[first].id);
        outlines.set("Last", nodes[last].id);
    }
    doc.objects.insert(outlines_id, Object::Dictionary(outlines));

    doc.get_dictionary_mut(root_id)
        .map_err(|_| OutlineError::MissingCatalog)?
        .set("Outlines", outlines_id);

    debug!(count = entries.len(), "wrote outline");
    Ok(())
}

fn descendant_count(nodes: &[Node], idx: usize) -> usize {
    nodes[idx]
        .children
        .iter()
        .map(|&child| 1 + descendant_count(nodes, child))
        .sum()
}

/// Replace the outline of a fully loaded document.
pub fn set_outline(doc: &mut Document, entries: &[BookmarkEntry]) -> Result<(), OutlineError> {
    let root_id = catalog_id(doc).map_err(|_| OutlineError::MissingCatalog)?;
    let pages = page_ids(doc);
    write_outline(doc, root_id, &pages, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::testing::blank_document;
    use pretty_assertions::assert_eq;

    fn entry(level: u32, title: &str, page: u32) -> BookmarkEntry {
        BookmarkEntry::new(level, title, page)
    }

    fn item(level: u32, title: &str, page: u32) -> OutlineItem {
        OutlineItem {
            level,
            title: title.to_string(),
            page: Some(page),
        }
    }

    #[test]
    fn test_no_outline_is_missing() {
        let doc = blank_document(3);
        assert_eq!(read_outline(&doc), OutlineListing::Missing);
        assert!(read_outline(&doc).entries().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let mut doc = blank_document(10);
        let entries = vec![
            entry(1, "第一章 引言", 1),
            entry(1, "Chapter 2", 5),
            entry(2, "2.1 Basics", 5),
            entry(3, "2.1.1 Detail", 6),
            entry(2, "2.2 Theorems", 8),
            entry(1, "Summary", 10),
        ];
        set_outline(&mut doc, &entries).unwrap();

        let listing = read_outline(&doc);
        assert_eq!(
            listing,
            OutlineListing::Entries(vec![
                item(1, "第一章 引言", 1),
                item(1, "Chapter 2", 5),
                item(2, "2.1 Basics", 5),
                item(3, "2.1.1 Detail", 6),
                item(2, "2.2 Theorems", 8),
                item(1, "Summary", 10),
            ])
        );
    }

    #[test]
    fn test_counts_and_links() {
        let mut doc = blank_document(3);
        let entries = vec![entry(1, "A", 1), entry(2, "A.1", 2), entry(2, "A.2", 3)];
        set_outline(&mut doc, &entries).unwrap();

        let catalog = doc.catalog().unwrap();
        let outlines_id = catalog.get(b"Outlines").unwrap().as_reference().unwrap();
        let outlines = doc.get_dictionary(outlines_id).unwrap();
        assert_eq!(outlines.get(b"Count").unwrap().as_i64().unwrap(), 3);

        let a_id = outlines.get(b"First").unwrap().as_reference().unwrap();
        assert_eq!(outlines.get(b"Last").unwrap().as_reference().unwrap(), a_id);
        let a = doc.get_dictionary(a_id).unwrap();
        assert_eq!(a.get(b"Count").unwrap().as_i64().unwrap(), 2);
        let first_child = a.get(b"First").unwrap().as_reference().unwrap();
        let child = doc.get_dictionary(first_child).unwrap();
        assert_eq!(child.get(b"Parent").unwrap().as_reference().unwrap(), a_id);
        assert!(child.get(b"Prev").is_err());
        assert!(child.get(b"Next").is_ok());
    }

    #[test]
    fn test_rewrite_replaces_previous_outline() {
        let mut doc = blank_document(4);
        set_outline(&mut doc, &[entry(1, "Old", 1)]).unwrap();
        set_outline(&mut doc, &[entry(1, "New", 4)]).unwrap();
        assert_eq!(
            read_outline(&doc),
            OutlineListing::Entries(vec![item(1, "New", 4)])
        );
    }

    #[test]
    fn test_hierarchy_validation() {
        assert!(matches!(
            validate_hierarchy(&[entry(2, "Orphan", 1)]),
            Err(OutlineError::BadFirstLevel { level: 2, .. })
        ));
        assert!(matches!(
            validate_hierarchy(&[entry(1, "A", 1), entry(3, "Skip", 1)]),
            Err(OutlineError::BadHierarchy { row: 2, level: 3, previous: 1, .. })
        ));
        assert!(validate_hierarchy(&[entry(1, "A", 1), entry(2, "B", 1), entry(1, "C", 1)]).is_ok());
    }

    #[test]
    fn test_page_beyond_document_is_rejected() {
        let mut doc = blank_document(2);
        assert!(matches!(
            set_outline(&mut doc, &[entry(1, "Far", 3)]),
            Err(OutlineError::PageOutOfRange { page: 3, page_count: 2, .. })
        ));
    }

    #[test]
    fn test_cyclic_outline_terminates() {
        let mut doc = blank_document(1);
        let outlines_id = doc.new_object_id();
        let item_id = doc.new_object_id();
        doc.objects.insert(
            item_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::string_literal("Loop"),
                "Parent" => outlines_id,
                "Next" => item_id,
            }),
        );
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => item_id,
                "Last" => item_id,
            }),
        );
        let root_id = catalog_id(&doc).unwrap();
        doc.get_dictionary_mut(root_id)
            .unwrap()
            .set("Outlines", outlines_id);

        let listing = read_outline(&doc);
        assert_eq!(
            listing,
            OutlineListing::Entries(vec![OutlineItem {
                level: 1,
                title: "Loop".to_string(),
                page: None,
            }])
        );
    }
}
