use std::collections::BTreeMap;

use weft_core::{DependencyGraph, FieldRef, SchemaError, child_path};

use super::{CompiledNamespace, Node, NodeId, NodeKind, Reference};

/// Resolves `same_as` targets, rejects cycles and fixes the sampling order of
/// every scope so targets are sampled before the nodes copying them.
pub(super) fn link(
    compiled: &mut CompiledNamespace,
    pending: Vec<(NodeId, FieldRef)>,
) -> Result<(), SchemaError> {
    let mut references = Vec::with_capacity(pending.len());
    for (source, target) in pending {
        let resolved = lookup(compiled, &target).ok_or_else(|| SchemaError::UnresolvedReference {
            path: compiled.nodes[source].path.clone(),
            target: target.to_string(),
        })?;
        references.push(Reference {
            source,
            target: resolved,
            through_array: false,
            buffer: Vec::new(),
            cursor: 0,
        });
    }

    check_reference_chains(compiled, &references)?;

    let mut scope_edges: BTreeMap<Option<NodeId>, Vec<(usize, usize)>> = BTreeMap::new();
    for (index, reference) in references.iter_mut().enumerate() {
        let split = Split::between(&compiled.nodes, reference.source, reference.target)?;
        let edge = scope_edge(compiled, &split)?;
        if let Some(edge) = edge {
            scope_edges.entry(split.scope).or_default().push(edge);
        }
        reference.through_array = split.through_array;
        compiled.nodes[split.target_child].clears.push(index);
        compiled.nodes[split.source_child].rewinds.push(index);
        compiled.nodes[reference.target].records.push(index);
    }
    compiled.references = references;

    let root_edges = scope_edges.remove(&None).unwrap_or_default();
    let root_labels: Vec<String> = compiled.roots.iter().map(|(name, _)| name.clone()).collect();
    compiled.root_order = scope_order(&root_labels, &root_edges)?;

    for (scope, edges) in scope_edges {
        let Some(scope) = scope else { continue };
        let children = children_of(&compiled.nodes[scope]);
        let labels: Vec<String> = children
            .iter()
            .map(|child| compiled.nodes[*child].path.clone())
            .collect();
        let order = scope_order(&labels, &edges)?;
        match &mut compiled.nodes[scope].kind {
            NodeKind::Object { order: slot, .. } | NodeKind::Composite { order: slot, .. } => {
                *slot = order.into();
            }
            _ => {}
        }
    }
    Ok(())
}

/// Chains of `same_as` nodes pointing at each other can never be sampled.
fn check_reference_chains(
    compiled: &mut CompiledNamespace,
    references: &[Reference],
) -> Result<(), SchemaError> {
    let mut graph = DependencyGraph::new();
    let mut slots: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut slot = |graph: &mut DependencyGraph, node: NodeId| -> usize {
        *slots
            .entry(node)
            .or_insert_with(|| graph.add_node(compiled.nodes[node].path.clone()))
    };
    for reference in references {
        let target = slot(&mut graph, reference.target);
        let source = slot(&mut graph, reference.source);
        graph.add_edge(target, source);
    }
    let report = graph.report();
    let cycle = report.cycle.clone();
    compiled.reference_report = report;
    match cycle {
        Some(cycle) => Err(SchemaError::CyclicReference { cycle }),
        None => Ok(()),
    }
}

/// Where the lineages of a source and its target part ways.
struct Split {
    /// Lowest common ancestor; `None` is the namespace itself.
    scope: Option<NodeId>,
    /// Child of `scope` on the way to the target.
    target_child: NodeId,
    /// Child of `scope` on the way to the source.
    source_child: NodeId,
    through_array: bool,
}

impl Split {
    fn between(nodes: &[Node], source: NodeId, target: NodeId) -> Result<Self, SchemaError> {
        let source_line = lineage(nodes, source);
        let target_line = lineage(nodes, target);
        if source_line.contains(&target) {
            let mut cycle = vec![nodes[source].path.clone()];
            if source != target {
                cycle.push(nodes[target].path.clone());
            }
            cycle.push(nodes[source].path.clone());
            return Err(SchemaError::CyclicReference { cycle });
        }

        let common = source_line
            .iter()
            .zip(&target_line)
            .take_while(|(left, right)| left == right)
            .count();
        let scope = common.checked_sub(1).map(|index| target_line[index]);
        let through_array = target_line[common..]
            .windows(2)
            .any(|pair| matches!(nodes[pair[0]].kind, NodeKind::Array { content, .. } if content == pair[1]));

        Ok(Self {
            scope,
            target_child: target_line[common],
            source_child: source_line[common],
            through_array,
        })
    }
}

/// Ordering constraint inside the split scope, as child positions.
fn scope_edge(
    compiled: &CompiledNamespace,
    split: &Split,
) -> Result<Option<(usize, usize)>, SchemaError> {
    let position = |children: &[NodeId], child: NodeId| children.iter().position(|c| *c == child);
    let Some(scope) = split.scope else {
        let roots: Vec<NodeId> = compiled.roots.iter().map(|(_, root)| *root).collect();
        return Ok(position(&roots, split.target_child).zip(position(&roots, split.source_child)));
    };
    let node = &compiled.nodes[scope];
    match &node.kind {
        NodeKind::Object { .. } | NodeKind::Composite { .. } => {
            let children = children_of(node);
            Ok(position(&children, split.target_child).zip(position(&children, split.source_child)))
        }
        NodeKind::Array { length, content }
            if *length == split.target_child && *content == split.source_child =>
        {
            Ok(None)
        }
        NodeKind::Array { .. } => Err(SchemaError::invalid(
            &node.path,
            "an array length cannot copy values from its own content",
        )),
        NodeKind::OneOf { .. } => Err(SchemaError::invalid(
            &node.path,
            "references cannot cross one_of variants",
        )),
        _ => Ok(None),
    }
}

fn scope_order(labels: &[String], edges: &[(usize, usize)]) -> Result<Vec<usize>, SchemaError> {
    let mut graph = DependencyGraph::new();
    for label in labels {
        graph.add_node(label.clone());
    }
    for (before, after) in edges {
        graph.add_edge(*before, *after);
    }
    graph.toposort().map_err(|cycle| SchemaError::CyclicReference {
        cycle: cycle.into_iter().map(|node| labels[node].clone()).collect(),
    })
}

fn children_of(node: &Node) -> Vec<NodeId> {
    match &node.kind {
        NodeKind::Object { fields, .. } => fields.iter().map(|(_, child)| *child).collect(),
        NodeKind::Composite { arguments, .. } => arguments.to_vec(),
        NodeKind::Array { length, content } => vec![*length, *content],
        NodeKind::OneOf { variants, .. } => variants.to_vec(),
        _ => Vec::new(),
    }
}

/// Ancestors of `node`, root first, `node` last.
fn lineage(nodes: &[Node], node: NodeId) -> Vec<NodeId> {
    let mut line = vec![node];
    let mut current = node;
    while let Some(parent) = nodes[current].parent {
        line.push(parent);
        current = parent;
    }
    line.reverse();
    line
}

fn lookup(compiled: &CompiledNamespace, reference: &FieldRef) -> Option<NodeId> {
    let mut current = compiled
        .roots
        .iter()
        .find(|(name, _)| name == reference.collection())
        .map(|(_, root)| *root)?;
    for segment in reference.fields() {
        current = child_named(&compiled.nodes, current, segment)?;
    }
    Some(current)
}

/// Arrays are transparent: a segment that is neither `length` nor `content`
/// is looked up in the array's element.
fn child_named(nodes: &[Node], node: NodeId, segment: &str) -> Option<NodeId> {
    match &nodes[node].kind {
        NodeKind::Object { fields, .. } => fields
            .iter()
            .find(|(name, _)| name == segment)
            .map(|(_, child)| *child),
        NodeKind::Composite { arguments, .. } => {
            let path = child_path(&nodes[node].path, segment);
            arguments.iter().copied().find(|child| nodes[*child].path == path)
        }
        NodeKind::Array { length, content } => match segment {
            "length" => Some(*length),
            "content" => Some(*content),
            _ => child_named(nodes, *content, segment),
        },
        NodeKind::OneOf { variants, .. } => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| variants.get(index).copied()),
        _ => None,
    }
}
