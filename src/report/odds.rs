//! Gene odds ratios computed from the stored model networks
//!
//! For a gene `g` and an edge observed in a set of model features, summed
//! over every model network:
//!
//! ```text
//! OR(g) = (features with g containing the edge / features with g)
//!       / (features containing the edge / features per model)
//! ```

use super::{ReportError, ReportResult};
use crate::model::{EdgeSide, NetworkNode, PathwayId};
use crate::store::PathcoreStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Features per model (eADAGE models are built with k = 300)
pub const MODEL_NODES: usize = 300;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneOddsRatio {
    pub gene: String,
    pub odds_ratio: f64,
}

/// Odds ratio of one gene, or `None` when the gene never appears
///
/// `edge_nodes` maps each network to the features containing the edge;
/// `network_nodes` holds every feature of those networks.
pub fn gene_odds_ratio(
    gene: &str,
    edge_nodes: &BTreeMap<u32, BTreeSet<u32>>,
    network_nodes: &HashMap<u32, Vec<NetworkNode>>,
    side: Option<EdgeSide>,
) -> Option<f64> {
    let mut in_edge_nodes = 0usize;
    let mut in_all_nodes = 0usize;
    let mut total_edge_nodes = 0usize;
    let mut total_nodes = 0usize;

    for (network, nodes_with_edge) in edge_nodes {
        let nodes = network_nodes.get(network).map(Vec::as_slice).unwrap_or_default();
        for node in nodes.iter().filter(|n| n.has_gene(gene, side)) {
            in_all_nodes += 1;
            if nodes_with_edge.contains(&node.node) {
                in_edge_nodes += 1;
            }
        }
        total_edge_nodes += nodes_with_edge.len();
        total_nodes += MODEL_NODES;
    }

    if in_all_nodes == 0 || total_edge_nodes == 0 {
        return None;
    }
    let gene_fraction = in_edge_nodes as f64 / in_all_nodes as f64;
    let edge_fraction = total_edge_nodes as f64 / total_nodes as f64;
    Some(gene_fraction / edge_fraction)
}

fn pathway_id(store: &dyn PathcoreStore, name: &str) -> ReportResult<PathwayId> {
    store
        .find_pathway(name)?
        .map(|p| p.id)
        .ok_or_else(|| ReportError::PathwayNotFound(name.to_string()))
}

/// Genes over-represented in the features where an edge appears.
///
/// Both orientations of the edge are gathered; only genes with an odds
/// ratio above 1 are returned, highest first.
pub fn edge_gene_odds_ratios(
    store: &dyn PathcoreStore,
    pw0: &str,
    pw1: &str,
    side: Option<EdgeSide>,
) -> ReportResult<Vec<GeneOddsRatio>> {
    let id0 = pathway_id(store, pw0)?;
    let id1 = pathway_id(store, pw1)?;

    let mut edge_nodes: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    let mut edges = store.find_network_edges(id0, id1, side)?;
    if id0 != id1 {
        edges.extend(store.find_network_edges(id1, id0, side)?);
    }
    for edge in edges {
        edge_nodes.entry(edge.network).or_default().extend(edge.nodes);
    }

    let mut network_nodes = HashMap::new();
    for &network in edge_nodes.keys() {
        network_nodes.insert(network, store.find_network_nodes(network)?);
    }

    let genes: BTreeSet<&String> = edge_nodes
        .iter()
        .flat_map(|(network, with_edge)| {
            network_nodes[network]
                .iter()
                .filter(move |n| with_edge.contains(&n.node))
                .flat_map(NetworkNode::genes)
        })
        .collect();
    debug!("Edge {} & {}: {} candidate genes", pw0, pw1, genes.len());

    let mut ranked: Vec<GeneOddsRatio> = genes
        .into_iter()
        .filter_map(|gene| {
            gene_odds_ratio(gene, &edge_nodes, &network_nodes, None)
                .filter(|&odds_ratio| odds_ratio > 1.0)
                .map(|odds_ratio| GeneOddsRatio {
                    gene: gene.clone(),
                    odds_ratio,
                })
        })
        .collect();
    ranked.sort_by(|a, b| a.odds_ratio.total_cmp(&b.odds_ratio));
    ranked.reverse();
    Ok(ranked)
}
