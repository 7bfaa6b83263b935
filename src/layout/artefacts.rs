//! # Artefacts
//!
//! Page and document level collections derived from the arrangements: link
//! annotations per page (`Annots`), the document outline (`Outlines`) and
//! the named destinations links point at (`Dests`).
//!
//! Link targets are resolved here, once every component has its final
//! page. A target that doesn't exist, or never got laid out, is logged and
//! leaves the link without a destination rather than failing the document.

use super::{Arrangement, ComponentRef, ComponentRegistry, LayoutPage, NodeId};
use crate::model::{DestinationFit, LinkAction};
use crate::units::Rect;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageArtefacts {
    #[serde(rename = "Annots")]
    pub annots: Vec<LinkAnnotation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentArtefacts {
    #[serde(rename = "Outlines")]
    pub outlines: Vec<OutlineItem>,
    #[serde(rename = "Dests")]
    pub dests: BTreeMap<String, NamedDestination>,
}

/// A clickable area on a page.
#[derive(Debug, Clone, Serialize)]
pub struct LinkAnnotation {
    pub owner: ComponentRef,
    pub bounds: Rect,
    pub action: ResolvedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum ResolvedAction {
    Uri {
        uri: String,
    },
    /// Jump to a page by index.
    Page {
        page_index: usize,
    },
    /// Jump to a named destination. `target` is None when the name
    /// doesn't resolve to a laid-out component.
    Destination {
        name: String,
        target: Option<NodeId>,
        page_index: Option<usize>,
        fit: DestinationFit,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineItem {
    pub title: String,
    pub open: bool,
    pub owner: ComponentRef,
    pub page_index: usize,
    pub bounds: Rect,
    pub children: Vec<OutlineItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedDestination {
    pub owner: ComponentRef,
    pub page_index: usize,
    pub bounds: Rect,
    pub fit: DestinationFit,
}

/// Build every artefact, filling in each page's annotations.
pub fn build(
    pages: &mut [LayoutPage],
    arrangements: &BTreeMap<NodeId, Vec<Arrangement>>,
    registry: &ComponentRegistry,
) -> DocumentArtefacts {
    let mut artefacts = DocumentArtefacts {
        outlines: build_outlines(arrangements, registry),
        dests: BTreeMap::new(),
    };

    let page_count = pages.len();
    for info in registry.iter() {
        let Some(action) = &info.link else {
            continue;
        };
        let Some(placed) = arrangements.get(&info.component.id) else {
            log::debug!("Link {:?} was not laid out", info.component.name);
            continue;
        };
        for arrangement in placed {
            let resolved = resolve_action(
                action,
                arrangement.page_index,
                page_count,
                arrangements,
                registry,
                &mut artefacts.dests,
            );
            if let Some(page) = pages.get_mut(arrangement.page_index) {
                page.artefacts.annots.push(LinkAnnotation {
                    owner: info.component.clone(),
                    bounds: arrangement.render_bounds,
                    action: resolved,
                });
            }
        }
    }
    artefacts
}

fn resolve_action(
    action: &LinkAction,
    current_page: usize,
    page_count: usize,
    arrangements: &BTreeMap<NodeId, Vec<Arrangement>>,
    registry: &ComponentRegistry,
    dests: &mut BTreeMap<String, NamedDestination>,
) -> ResolvedAction {
    let last_page = page_count.saturating_sub(1);
    match action {
        LinkAction::Uri { uri } => ResolvedAction::Uri { uri: uri.clone() },
        LinkAction::FirstPage => ResolvedAction::Page { page_index: 0 },
        LinkAction::LastPage => ResolvedAction::Page {
            page_index: last_page,
        },
        LinkAction::PrevPage => ResolvedAction::Page {
            page_index: current_page.saturating_sub(1),
        },
        LinkAction::NextPage => ResolvedAction::Page {
            page_index: (current_page + 1).min(last_page),
        },
        LinkAction::Destination { target, fit } => {
            let name = target.trim_start_matches('#').to_string();
            let found = registry.lookup(&name).and_then(|id| {
                arrangements
                    .get(&id)
                    .and_then(|list| list.first())
                    .map(|a| (id, a))
            });
            match found {
                Some((id, arrangement)) => {
                    if let Some(info) = registry.info(id) {
                        dests.entry(name.clone()).or_insert_with(|| NamedDestination {
                            owner: info.component.clone(),
                            page_index: arrangement.page_index,
                            bounds: arrangement.render_bounds,
                            fit: *fit,
                        });
                    }
                    ResolvedAction::Destination {
                        name,
                        target: Some(id),
                        page_index: Some(arrangement.page_index),
                        fit: *fit,
                    }
                }
                None => {
                    log::warn!("Link target '{}' not found; link has no destination", name);
                    ResolvedAction::Destination {
                        name,
                        target: None,
                        page_index: None,
                        fit: *fit,
                    }
                }
            }
        }
    }
}

/// Outline entries nest under the nearest ancestor that has one.
fn build_outlines(
    arrangements: &BTreeMap<NodeId, Vec<Arrangement>>,
    registry: &ComponentRegistry,
) -> Vec<OutlineItem> {
    let entries: Vec<(NodeId, Option<NodeId>, OutlineItem)> = registry
        .iter()
        .filter_map(|info| {
            let outline = info.outline.as_ref()?;
            let Some(first) = arrangements.get(&info.component.id).and_then(|l| l.first()) else {
                log::debug!("Outline entry '{}' was not laid out", outline.title);
                return None;
            };
            Some((
                info.component.id,
                info.parent,
                OutlineItem {
                    title: outline.title.clone(),
                    open: outline.open,
                    owner: info.component.clone(),
                    page_index: first.page_index,
                    bounds: first.render_bounds,
                    children: Vec::new(),
                },
            ))
        })
        .collect();

    let included: HashSet<NodeId> = entries.iter().map(|(id, _, _)| *id).collect();
    let outline_parent = |mut parent: Option<NodeId>| {
        while let Some(id) = parent {
            if included.contains(&id) {
                return Some(id);
            }
            parent = registry.info(id).and_then(|info| info.parent);
        }
        None
    };

    let mut nodes: Vec<(NodeId, Option<NodeId>, OutlineItem)> = entries
        .into_iter()
        .map(|(id, parent, item)| (id, outline_parent(parent), item))
        .collect();

    // Pre-order means children follow their parents; attach from the end.
    while let Some(pos) = nodes.iter().rposition(|(_, parent, _)| parent.is_some()) {
        let (_, parent, item) = nodes.remove(pos);
        if let Some(target) = nodes.iter_mut().find(|(id, _, _)| Some(*id) == parent) {
            target.2.children.insert(0, item);
        }
    }
    nodes.into_iter().map(|(_, _, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::layout::{LayoutDocument, LayoutEngine};
    use crate::model::{Document, Node, PageConfig};
    use crate::style::Style;
    use crate::units::Dimension;

    fn run(children: Vec<Node>) -> LayoutDocument {
        let section = Node::section(Some(PageConfig::custom(200.0, 300.0)), Style::default(), children);
        LayoutEngine::new()
            .layout(&Document::new(vec![section]), &FontContext::new())
            .unwrap()
    }

    fn link(action: LinkAction, text: &str) -> Node {
        Node::link(action, Style::default(), vec![Node::text(text)])
    }

    fn sized(height: f64) -> Style {
        Style {
            height: Some(Dimension::Pt(height)),
            ..Default::default()
        }
    }

    #[test]
    fn destination_resolves_to_target_page() {
        let doc = run(vec![
            link(
                LinkAction::Destination {
                    target: "#target".to_string(),
                    fit: DestinationFit::FullPage,
                },
                "Go",
            ),
            Node::page_break(),
            Node::div(sized(20.0), vec![]).with_id("target"),
        ]);
        assert_eq!(doc.pages.len(), 2);
        let annots = &doc.pages[0].artefacts.annots;
        assert_eq!(annots.len(), 1);
        match &annots[0].action {
            ResolvedAction::Destination { page_index, target, .. } => {
                assert_eq!(*page_index, Some(1));
                assert_eq!(*target, doc.component("target"));
            }
            other => panic!("expected destination, got {:?}", other),
        }
        assert_eq!(doc.artefacts.dests["target"].page_index, 1);
    }

    #[test]
    fn missing_target_leaves_link_empty() {
        let doc = run(vec![link(
            LinkAction::Destination {
                target: "nowhere".to_string(),
                fit: DestinationFit::FullPage,
            },
            "Lost",
        )]);
        match &doc.pages[0].artefacts.annots[0].action {
            ResolvedAction::Destination { target, page_index, .. } => {
                assert!(target.is_none());
                assert!(page_index.is_none());
            }
            other => panic!("expected destination, got {:?}", other),
        }
        assert!(doc.artefacts.dests.is_empty());
    }

    #[test]
    fn page_actions_are_clamped() {
        let doc = run(vec![
            link(LinkAction::PrevPage, "Back"),
            link(LinkAction::NextPage, "On"),
        ]);
        let annots = &doc.pages[0].artefacts.annots;
        assert_eq!(annots.len(), 2);
        assert!(annots
            .iter()
            .all(|a| a.action == ResolvedAction::Page { page_index: 0 }));
    }

    #[test]
    fn uri_links_cover_their_text() {
        let doc = run(vec![link(
            LinkAction::Uri {
                uri: "https://example.com".to_string(),
            },
            "aaa",
        )]);
        let annot = &doc.pages[0].artefacts.annots[0];
        assert!((annot.bounds.width - 20.016).abs() < 1e-9);
        assert!((annot.bounds.height - 14.4).abs() < 1e-9);
    }

    #[test]
    fn outlines_nest_under_nearest_outlined_ancestor() {
        let chapter = Node::div(
            Style::default(),
            vec![Node::div(
                Style::default(),
                vec![Node::div(sized(10.0), vec![]).with_outline("Section 1.1")],
            )],
        )
        .with_outline("Chapter 1");
        let doc = run(vec![chapter, Node::div(sized(10.0), vec![]).with_outline("Chapter 2")]);

        let outlines = &doc.artefacts.outlines;
        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines[0].title, "Chapter 1");
        assert_eq!(outlines[0].children.len(), 1);
        assert_eq!(outlines[0].children[0].title, "Section 1.1");
        assert_eq!(outlines[1].title, "Chapter 2");
        assert!(outlines[1].children.is_empty());
    }
}
