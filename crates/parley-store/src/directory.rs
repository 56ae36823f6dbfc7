//! Peer list backing the conversation sidebar.

use parley_shared::Peer;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Directory {
    peers: Vec<Peer>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory with a freshly fetched list, keeping server order.
    pub fn replace(&mut self, peers: Vec<Peer>) {
        self.peers = peers;
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Case-insensitive display-name filter used by the sidebar search box.
    pub fn search(&self, query: &str) -> Vec<&Peer> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.peers.iter().collect();
        }
        self.peers
            .iter()
            .filter(|p| p.display_name.to_lowercase().contains(&query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        let mut dir = Directory::new();
        dir.replace(vec![
            Peer::new("u1", "Alice Martin"),
            Peer::new("u2", "Bob Stone"),
            Peer::new("u3", "alicia keys"),
        ]);
        dir
    }

    #[test]
    fn test_replace_keeps_server_order() {
        let mut dir = directory();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.peers()[1].display_name, "Bob Stone");

        dir.replace(vec![Peer::new("u9", "Zoe")]);
        assert_eq!(dir.len(), 1);
        assert!(!dir.is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = directory();
        let hits: Vec<_> = dir.search("ALI").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(hits, ["u1", "u3"]);
        assert_eq!(dir.search("  ").len(), 3);
    }
}
