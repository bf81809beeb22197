//! Page-subset retention
//!
//! Rebuilds the page tree so only the chosen pages remain, then prunes
//! the named-destinations tree to entries that still point at a
//! retained page. Runs before the sweep so everything dropped here
//! becomes unreachable.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Array, Dict, Name, Object, PdfString};
use log::warn;
use std::collections::HashSet;

/// Parse 1-based page range specs: `a`, `a-b`, `-b`, `a-`, comma
/// separated, clamped to [1, page_count], reversed ranges swapped.
/// `-b` seeds both ends with the page count before reading `b`, so it
/// selects b..=count.
pub fn parse_page_ranges(specs: &[String], page_count: usize) -> Vec<usize> {
    let mut pages = Vec::new();
    for arg in specs {
        for spec in arg.split(',') {
            let spec = spec.trim();
            if spec.is_empty() {
                continue;
            }
            let dash = spec.find('-');

            let (mut spage, mut epage) = if dash == Some(0) {
                (page_count as i64, page_count as i64)
            } else {
                let lead = leading_int(spec);
                (lead, lead)
            };

            if let Some(d) = dash {
                let rest = &spec[d + 1..];
                epage = if rest.is_empty() {
                    page_count as i64
                } else {
                    leading_int(rest)
                };
            }

            if spage > epage {
                std::mem::swap(&mut spage, &mut epage);
            }
            spage = spage.max(1);
            epage = epage.min(page_count as i64);

            for page in spage..=epage {
                pages.push(page as usize);
            }
        }
    }
    pages
}

/// atoi: parse leading digits, zero when there are none
fn leading_int(s: &str) -> i64 {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Keep only the pages named by `specs`
pub(crate) fn retain_pages(doc: &mut Document, specs: &[String]) -> Result<()> {
    let page_count = doc.page_count()?;
    let page_refs = doc.page_refs()?;
    let keep = parse_page_ranges(specs, page_count);

    let root_ref = doc
        .trailer
        .get(&Name::new("Root"))
        .and_then(|o| o.as_ref_id())
        .ok_or_else(|| Error::syntax("trailer Root is not a reference"))?;
    let root = doc.resolve_ref(root_ref)?;
    let pages_val = root
        .get("Pages")
        .cloned()
        .ok_or_else(|| Error::syntax("catalog has no Pages"))?;
    let pages_ref = pages_val
        .as_ref_id()
        .ok_or_else(|| Error::syntax("catalog Pages is not a reference"))?;

    // The destination tree hangs off the old root; read it before the
    // root is stripped.
    let old_dests = load_name_tree(doc, "Dests")?;

    // Keep only Pages and Type in the root so nothing else keeps
    // unretained pages alive
    let mut new_root = Dict::new();
    if let Some(t) = root.get("Type") {
        new_root.insert(Name::new("Type"), t.clone());
    }
    new_root.insert(Name::new("Pages"), pages_val);
    doc.update_object(root_ref.num, Object::Dict(new_root));

    // New kids array with only the pages we want to keep
    let parent = Object::Ref(pages_ref);
    let mut kids = Array::new();
    for page_1based in keep {
        let Some(&page_ref) = page_refs.get(page_1based - 1) else {
            continue;
        };
        // Re-point the page at the surviving tree root
        let _ = doc.resolve_ref(page_ref);
        if let Some(Object::Dict(page_dict)) = doc.xref.cached_mut(page_ref.num) {
            page_dict.insert(Name::new("Parent"), parent.clone());
        }
        kids.push(Object::Ref(page_ref));
    }

    // Update page count and kids array
    let _ = doc.resolve_ref(pages_ref);
    let kid_count = kids.len() as i64;
    if let Some(Object::Dict(pages_dict)) = doc.xref.cached_mut(pages_ref.num) {
        pages_dict.insert(Name::new("Count"), Object::Int(kid_count));
        pages_dict.insert(Name::new("Kids"), Object::Array(kids.clone()));
    }

    // Preserve the partial Dests name tree
    if !old_dests.is_empty() {
        let mut names_list = Array::new();
        for (key, value) in old_dests {
            if retains_target(doc, &value, &kids)? {
                names_list.push(Object::String(key));
                names_list.push(value);
            }
        }

        let mut dests = Dict::new();
        dests.insert(Name::new("Names"), Object::Array(names_list));
        let mut names = Dict::new();
        names.insert(Name::new("Dests"), Object::Dict(dests));
        if let Some(Object::Dict(root_dict)) = doc.xref.cached_mut(root_ref.num) {
            root_dict.insert(Name::new("Names"), Object::Dict(names));
        }
    }

    // The flat page list no longer matches the rebuilt tree
    doc.pages = None;
    Ok(())
}

/// Does this destination point at one of the retained pages?
fn retains_target(doc: &mut Document, value: &Object, kids: &Array) -> Result<bool> {
    let resolved = doc.resolve_obj(value)?;
    // A destination is an array, or a dictionary whose D entry is one
    let dest = match resolved.get("D") {
        Some(d) => doc.resolve_obj(d)?,
        None => resolved,
    };
    let Some(target) = dest.as_array().and_then(|a| a.first()) else {
        return Ok(false);
    };
    Ok(kids.contains(target))
}

/// Flatten a name tree (e.g. Dests) into key/value pairs. Handles both
/// the tree under Root/Names and the old-style dictionary directly
/// under Root.
pub(crate) fn load_name_tree(doc: &mut Document, which: &str) -> Result<Vec<(PdfString, Object)>> {
    let mut out = Vec::new();

    let root_val = doc
        .trailer
        .get(&Name::new("Root"))
        .cloned()
        .unwrap_or(Object::Null);
    let root = doc.resolve_obj(&root_val)?;

    let names = doc.resolve_obj(root.get("Names").unwrap_or(&Object::Null))?;
    if let Some(tree) = names.get(which) {
        let tree = tree.clone();
        let mut visited = HashSet::new();
        collect_name_tree_node(doc, &tree, &mut out, &mut visited)?;
    }

    // PDF 1.1 style: a plain dictionary of name -> destination
    let old_style = doc.resolve_obj(root.get(which).unwrap_or(&Object::Null))?;
    if let Some(dict) = old_style.as_dict() {
        for (key, value) in dict {
            out.push((PdfString::from(key.as_str()), value.clone()));
        }
    }

    Ok(out)
}

fn collect_name_tree_node(
    doc: &mut Document,
    node: &Object,
    out: &mut Vec<(PdfString, Object)>,
    visited: &mut HashSet<i32>,
) -> Result<()> {
    if let Some(r) = node.as_ref_id() {
        if !visited.insert(r.num) {
            warn!("name tree cycle at object {}", r.num);
            return Ok(());
        }
    }
    let node = doc.resolve_obj(node)?;

    if let Some(pairs) = node.get("Names").and_then(|o| o.as_array()) {
        for pair in pairs.chunks(2) {
            if let [key, value] = pair {
                match key.as_string() {
                    Some(s) => out.push((s.clone(), value.clone())),
                    None => warn!("name tree key is not a string"),
                }
            }
        }
    }

    if let Some(kids) = node.get("Kids").and_then(|o| o.as_array()) {
        let kids = kids.clone();
        for kid in kids {
            collect_name_tree_node(doc, &kid, out, visited)?;
        }
    }

    Ok(())
}
