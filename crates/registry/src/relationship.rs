//! Relationship operations. The directed graph of each relationship type
//! must stay acyclic; the check runs a DFS over the committed edges before
//! every insert.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use atlas_model::{EventType, NewRelationship, Page, PageRequest, Relationship, RelationshipFilter};

use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// Would adding `from -> to` close a cycle, given the existing edges of the
/// same type? Equivalent to: is `from` reachable from `to`.
pub(crate) fn creates_cycle(edges: &[(Uuid, Uuid)], from: Uuid, to: Uuid) -> bool {
    if from == to {
        return true;
    }
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (edge_from, edge_to) in edges {
        adjacency.entry(*edge_from).or_default().push(*edge_to);
    }

    let mut stack = vec![to];
    let mut visited = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == from {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

impl Registry {
    pub async fn create_relationship(&self, input: NewRelationship) -> Result<Relationship> {
        if input.from_asset_id == input.to_asset_id {
            return Err(RegistryError::invalid(
                "to_asset_id",
                "relationship cannot reference the asset itself",
            ));
        }
        if let Some(rate) = input.conversion_rate {
            if rate <= rust_decimal::Decimal::ZERO {
                return Err(RegistryError::invalid(
                    "conversion_rate",
                    "must be positive",
                ));
            }
        }

        self.get_asset(input.from_asset_id).await?;
        self.get_asset(input.to_asset_id).await?;

        let edges = self
            .stores
            .relationships
            .edges_of_type(input.relationship_type)
            .await?;
        if creates_cycle(&edges, input.from_asset_id, input.to_asset_id) {
            return Err(RegistryError::FailedPrecondition(format!(
                "relationship would create a {} cycle",
                input.relationship_type
            )));
        }

        let relationship = self
            .stores
            .relationships
            .insert(Uuid::new_v4(), &input)
            .await?;
        self.publish(EventType::RelationshipEstablished, &relationship);
        Ok(relationship)
    }

    pub async fn list_relationships(
        &self,
        filter: RelationshipFilter,
        page: PageRequest,
    ) -> Result<Page<Relationship>> {
        let items = self
            .stores
            .relationships
            .list(&filter, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let a = Uuid::new_v4();
        assert!(creates_cycle(&[], a, a));
    }

    #[test]
    fn empty_graph_has_no_cycles() {
        let v = ids(2);
        assert!(!creates_cycle(&[], v[0], v[1]));
    }

    #[test]
    fn direct_back_edge_detected() {
        // weth -wraps-> eth exists; adding eth -wraps-> weth closes the loop.
        let (eth, weth) = (Uuid::new_v4(), Uuid::new_v4());
        let edges = vec![(weth, eth)];
        assert!(creates_cycle(&edges, eth, weth));
    }

    #[test]
    fn sibling_edges_are_fine() {
        // weth -wraps-> eth and steth -stakes-> eth share a target; adding
        // another edge into eth is not a cycle.
        let v = ids(4);
        let (eth, weth, steth, reth) = (v[0], v[1], v[2], v[3]);
        let edges = vec![(weth, eth), (steth, eth)];
        assert!(!creates_cycle(&edges, reth, eth));
    }

    #[test]
    fn transitive_cycle_detected() {
        let v = ids(3);
        let (a, b, c) = (v[0], v[1], v[2]);
        let edges = vec![(a, b), (b, c)];
        assert!(creates_cycle(&edges, c, a));
        assert!(!creates_cycle(&edges, a, c));
    }

    #[test]
    fn long_chain_no_false_positive() {
        let v = ids(6);
        let edges: Vec<_> = v.windows(2).map(|w| (w[0], w[1])).collect();
        // Extending the chain is fine; closing it is not.
        assert!(!creates_cycle(&edges, v[5], Uuid::new_v4()));
        assert!(creates_cycle(&edges, v[5], v[0]));
    }
}
